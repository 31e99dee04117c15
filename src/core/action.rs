//! Callbacks the engine invokes on entry, exit and transition.
//!
//! Actions are bound once, when a chart is built, and stored next to the
//! vertex or transition they belong to. During dispatch the engine hands each
//! action the host context together with a [`Signal`] describing why it is
//! being called.

use std::fmt;
use std::sync::Arc;

/// Why an action is being invoked.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SignalKind {
    /// A state is being entered.
    Entry,
    /// A state is being left.
    Exit,
    /// A transition's own action.
    Action,
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Entry => f.write_str("ENTRY"),
            Self::Exit => f.write_str("EXIT"),
            Self::Action => f.write_str("ACTION"),
        }
    }
}

/// Everything an action learns about the event that caused it.
#[derive(Debug)]
pub struct Signal<'a, P> {
    pub kind: SignalKind,
    /// The state being entered or exited, or the state whose transition
    /// carries the action.
    pub state: &'a str,
    /// The trigger being handled; `None` while the machine is starting.
    pub trigger: Option<&'a str>,
    pub payload: Option<&'a P>,
}

impl<P> Clone for Signal<'_, P> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<P> Copy for Signal<'_, P> {}

/// Capability required from the host: run a callback against its context.
///
/// Implemented for every `Fn(&mut C, &Signal<'_, P>)` closure, so most
/// charts never name this trait. The return value of a callback is not
/// interpreted.
///
/// A callback receives the context, never the machine, which makes
/// re-entrant dispatch from inside an action impossible to express.
pub trait ActionInvoker<C, P>: Send + Sync {
    fn invoke(&self, context: &mut C, signal: &Signal<'_, P>);
}

impl<C, P, F> ActionInvoker<C, P> for F
where
    F: Fn(&mut C, &Signal<'_, P>) + Send + Sync,
{
    fn invoke(&self, context: &mut C, signal: &Signal<'_, P>) {
        self(context, signal)
    }
}

/// Shared handle to a bound action.
pub type Action<C, P> = Arc<dyn ActionInvoker<C, P>>;

/// Wrap a closure into an [`Action`].
pub fn action<C, P, F>(f: F) -> Action<C, P>
where
    F: Fn(&mut C, &Signal<'_, P>) + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Entry and exit actions attached to one state.
pub struct StateActions<C, P> {
    pub on_entry: Option<Action<C, P>>,
    pub on_exit: Option<Action<C, P>>,
}

impl<C, P> Default for StateActions<C, P> {
    fn default() -> Self {
        Self {
            on_entry: None,
            on_exit: None,
        }
    }
}

impl<C, P> Clone for StateActions<C, P> {
    fn clone(&self) -> Self {
        Self {
            on_entry: self.on_entry.clone(),
            on_exit: self.on_exit.clone(),
        }
    }
}

impl<C, P> StateActions<C, P> {
    /// The action fired for `kind`, if any. Transition actions are not
    /// stored here.
    pub fn get(&self, kind: SignalKind) -> Option<&Action<C, P>> {
        match kind {
            SignalKind::Entry => self.on_entry.as_ref(),
            SignalKind::Exit => self.on_exit.as_ref(),
            SignalKind::Action => None,
        }
    }
}
