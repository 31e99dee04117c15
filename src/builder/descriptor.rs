//! Normalized state descriptors consumed by the build phase.

use crate::core::{Action, Guard, Signal, ROOT};
use std::sync::Arc;

/// What one trigger does while its state is active.
pub struct TransitionSpec<C, P = ()> {
    pub trigger: String,
    /// Destination state; `None` makes this an internal, action-only
    /// transition.
    pub target: Option<String>,
    pub action: Option<Action<C, P>>,
    pub guard: Option<Guard<C, P>>,
}

impl<C, P> TransitionSpec<C, P> {
    /// Move to `target` when `trigger` arrives.
    pub fn to(trigger: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            trigger: trigger.into(),
            target: Some(target.into()),
            action: None,
            guard: None,
        }
    }

    /// Run `action` when `trigger` arrives without leaving the state.
    pub fn internal<F>(trigger: impl Into<String>, action: F) -> Self
    where
        F: Fn(&mut C, &Signal<'_, P>) + Send + Sync + 'static,
    {
        Self {
            trigger: trigger.into(),
            target: None,
            action: Some(Arc::new(action)),
            guard: None,
        }
    }

    /// Attach an action run between the exit and entry phases.
    pub fn action<F>(mut self, action: F) -> Self
    where
        F: Fn(&mut C, &Signal<'_, P>) + Send + Sync + 'static,
    {
        self.action = Some(Arc::new(action));
        self
    }

    /// Only fire while `predicate` holds.
    pub fn when<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&C, Option<&P>) -> bool + Send + Sync + 'static,
    {
        self.guard = Some(Guard::new(predicate));
        self
    }

    pub fn guard(mut self, guard: Guard<C, P>) -> Self {
        self.guard = Some(guard);
        self
    }
}

/// One state as declared by a chart.
///
/// Descriptors can be handed to the builder in any order; a child may be
/// described before its parent.
///
/// # Example
///
/// ```rust
/// use nested::builder::StateDescriptor;
///
/// struct Toaster {
///     heater_on: bool,
/// }
///
/// let heating: StateDescriptor<Toaster> = StateDescriptor::new("heating")
///     .initial()
///     .on_entry(|t: &mut Toaster, _| t.heater_on = true)
///     .on_exit(|t: &mut Toaster, _| t.heater_on = false)
///     .on("DOOR_OPEN", "door_open");
///
/// assert_eq!(heating.parent, "ROOT");
/// assert!(heating.is_default);
/// ```
pub struct StateDescriptor<C, P = ()> {
    pub name: String,
    pub parent: String,
    pub is_default: bool,
    pub on_entry: Option<Action<C, P>>,
    pub on_exit: Option<Action<C, P>>,
    pub transitions: Vec<TransitionSpec<C, P>>,
}

impl<C, P> StateDescriptor<C, P> {
    /// A top-level state with no actions or transitions.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: ROOT.to_string(),
            is_default: false,
            on_entry: None,
            on_exit: None,
            transitions: Vec::new(),
        }
    }

    pub fn parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = parent.into();
        self
    }

    /// Mark this state as its parent's default substate.
    pub fn initial(mut self) -> Self {
        self.is_default = true;
        self
    }

    pub fn on_entry<F>(mut self, action: F) -> Self
    where
        F: Fn(&mut C, &Signal<'_, P>) + Send + Sync + 'static,
    {
        self.on_entry = Some(Arc::new(action));
        self
    }

    pub fn on_exit<F>(mut self, action: F) -> Self
    where
        F: Fn(&mut C, &Signal<'_, P>) + Send + Sync + 'static,
    {
        self.on_exit = Some(Arc::new(action));
        self
    }

    /// Transition to `target` on `trigger`.
    pub fn on(self, trigger: impl Into<String>, target: impl Into<String>) -> Self {
        self.transition(TransitionSpec::to(trigger, target))
    }

    /// Run `action` on `trigger` without changing state.
    pub fn on_action<F>(self, trigger: impl Into<String>, action: F) -> Self
    where
        F: Fn(&mut C, &Signal<'_, P>) + Send + Sync + 'static,
    {
        self.transition(TransitionSpec::internal(trigger, action))
    }

    pub fn transition(mut self, spec: TransitionSpec<C, P>) -> Self {
        self.transitions.push(spec);
        self
    }
}
