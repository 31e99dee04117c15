//! Transitions and the trigger-keyed table used during bubbling.

use super::action::Action;
use super::error::ConfigError;
use super::guard::Guard;
use super::tree::{StateTree, VertexId};
use std::collections::HashMap;

/// How a transition moves the machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransitionKind {
    /// Leave the source branch and enter `dest`, running exit and entry
    /// actions along the way.
    External,
    /// Run the action only; no state is exited or entered and the current
    /// state stays where it is.
    Internal,
}

/// A transition fired by `trigger` while `source` is active.
pub struct Transition<C, P> {
    pub trigger: String,
    pub source: VertexId,
    /// Destination; equal to `source` for internal transitions.
    pub dest: VertexId,
    pub kind: TransitionKind,
    pub action: Option<Action<C, P>>,
    pub guard: Option<Guard<C, P>>,
}

impl<C, P> Transition<C, P> {
    /// An external transition from `source` to `dest`.
    pub fn new(trigger: impl Into<String>, source: VertexId, dest: VertexId) -> Self {
        Self {
            trigger: trigger.into(),
            source,
            dest,
            kind: TransitionKind::External,
            action: None,
            guard: None,
        }
    }

    /// An action-only transition on `source`.
    pub fn internal(trigger: impl Into<String>, source: VertexId, action: Action<C, P>) -> Self {
        Self {
            trigger: trigger.into(),
            source,
            dest: source,
            kind: TransitionKind::Internal,
            action: Some(action),
            guard: None,
        }
    }

    pub fn with_action(mut self, action: Action<C, P>) -> Self {
        self.action = Some(action);
        self
    }

    pub fn with_guard(mut self, guard: Guard<C, P>) -> Self {
        self.guard = Some(guard);
        self
    }

    pub fn is_internal(&self) -> bool {
        self.kind == TransitionKind::Internal
    }

    /// Whether the guard, if any, lets this transition fire.
    pub fn can_fire(&self, context: &C, payload: Option<&P>) -> bool {
        self.guard
            .as_ref()
            .map_or(true, |guard| guard.check(context, payload))
    }
}

impl<C, P> Clone for Transition<C, P> {
    fn clone(&self) -> Self {
        Self {
            trigger: self.trigger.clone(),
            source: self.source,
            dest: self.dest,
            kind: self.kind,
            action: self.action.clone(),
            guard: self.guard.clone(),
        }
    }
}

/// One transition per (trigger, source) pair.
///
/// Lookups are exact; walking to ancestors is left to the caller.
pub struct TransitionTable<C, P> {
    by_trigger: HashMap<String, HashMap<VertexId, Transition<C, P>>>,
    len: usize,
}

impl<C, P> TransitionTable<C, P> {
    pub fn new() -> Self {
        Self {
            by_trigger: HashMap::new(),
            len: 0,
        }
    }

    /// Insert a transition. `tree` is only used to name the source state
    /// when the (trigger, source) pair is already taken.
    pub fn register(
        &mut self,
        tree: &StateTree,
        transition: Transition<C, P>,
    ) -> Result<(), ConfigError> {
        let by_source = self
            .by_trigger
            .entry(transition.trigger.clone())
            .or_default();
        if by_source.contains_key(&transition.source) {
            return Err(ConfigError::DuplicateTransition {
                trigger: transition.trigger,
                state: tree.name(transition.source).to_string(),
            });
        }
        by_source.insert(transition.source, transition);
        self.len += 1;
        Ok(())
    }

    pub fn lookup(&self, trigger: &str, vertex: VertexId) -> Option<&Transition<C, P>> {
        self.by_trigger.get(trigger)?.get(&vertex)
    }

    /// Every trigger with at least one registered transition.
    pub fn triggers(&self) -> impl Iterator<Item = &str> {
        self.by_trigger.keys().map(String::as_str)
    }

    /// Transitions declared on `vertex`, in no particular order.
    pub fn declared_on(&self, vertex: VertexId) -> impl Iterator<Item = &Transition<C, P>> {
        self.by_trigger
            .values()
            .filter_map(move |by_source| by_source.get(&vertex))
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl<C, P> Default for TransitionTable<C, P> {
    fn default() -> Self {
        Self::new()
    }
}
