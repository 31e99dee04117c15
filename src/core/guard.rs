//! Guard predicates for controlling transitions.
//!
//! A guard decides whether a matching transition may fire. A transition
//! whose guard rejects the event is treated as if it were not declared, so
//! the event keeps bubbling toward the root.

use std::fmt;
use std::sync::Arc;

/// Pure predicate over the host context and the dispatch payload.
///
/// # Example
///
/// ```rust
/// use nested::core::Guard;
///
/// struct Oven {
///     door_locked: bool,
/// }
///
/// let locked = Guard::new(|oven: &Oven, _payload: Option<&()>| oven.door_locked);
///
/// assert!(locked.check(&Oven { door_locked: true }, None));
/// assert!(!locked.check(&Oven { door_locked: false }, None));
/// ```
pub struct Guard<C, P> {
    predicate: Arc<dyn Fn(&C, Option<&P>) -> bool + Send + Sync>,
}

impl<C, P> Guard<C, P> {
    /// Create a guard from a predicate.
    ///
    /// The predicate should be deterministic and free of side effects; it
    /// may be evaluated for every dispatch that reaches its state.
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&C, Option<&P>) -> bool + Send + Sync + 'static,
    {
        Guard {
            predicate: Arc::new(predicate),
        }
    }

    /// Check whether the guard lets the transition fire.
    pub fn check(&self, context: &C, payload: Option<&P>) -> bool {
        (self.predicate)(context, payload)
    }
}

impl<C, P> Clone for Guard<C, P> {
    fn clone(&self) -> Self {
        Self {
            predicate: Arc::clone(&self.predicate),
        }
    }
}

impl<C, P> fmt::Debug for Guard<C, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Guard").finish_non_exhaustive()
    }
}
