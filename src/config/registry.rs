//! Named actions and guards a chart document may refer to.

use crate::core::{Action, Guard, Signal};
use std::collections::HashMap;
use std::sync::Arc;

/// Binds the callback names used in a [`ChartConfig`](super::ChartConfig)
/// to closures.
///
/// Names are looked up once, while the chart is compiled; the compiled
/// definition holds the closures themselves.
pub struct ActionRegistry<C, P = ()> {
    actions: HashMap<String, Action<C, P>>,
    guards: HashMap<String, Guard<C, P>>,
}

impl<C, P> ActionRegistry<C, P> {
    pub fn new() -> Self {
        Self {
            actions: HashMap::new(),
            guards: HashMap::new(),
        }
    }

    pub fn with_action<F>(mut self, name: impl Into<String>, action: F) -> Self
    where
        F: Fn(&mut C, &Signal<'_, P>) + Send + Sync + 'static,
    {
        self.register_action(name, action);
        self
    }

    pub fn with_guard<F>(mut self, name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&C, Option<&P>) -> bool + Send + Sync + 'static,
    {
        self.register_guard(name, predicate);
        self
    }

    /// Register `action` under `name`, replacing any earlier binding.
    pub fn register_action<F>(&mut self, name: impl Into<String>, action: F)
    where
        F: Fn(&mut C, &Signal<'_, P>) + Send + Sync + 'static,
    {
        self.actions.insert(name.into(), Arc::new(action));
    }

    /// Register `predicate` under `name`, replacing any earlier binding.
    pub fn register_guard<F>(&mut self, name: impl Into<String>, predicate: F)
    where
        F: Fn(&C, Option<&P>) -> bool + Send + Sync + 'static,
    {
        self.guards.insert(name.into(), Guard::new(predicate));
    }

    pub fn action(&self, name: &str) -> Option<&Action<C, P>> {
        self.actions.get(name)
    }

    pub fn guard(&self, name: &str) -> Option<&Guard<C, P>> {
        self.guards.get(name)
    }
}

impl<C, P> Default for ActionRegistry<C, P> {
    fn default() -> Self {
        Self::new()
    }
}
