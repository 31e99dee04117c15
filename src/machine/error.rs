//! Runtime errors raised by a state machine.

use crate::core::PathError;
use thiserror::Error;

/// Misuse of a machine, or an internal inconsistency.
///
/// An event nobody handles is not an error: `dispatch` simply returns
/// `Ok(false)`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MachineError {
    #[error("State machine has not been started")]
    NotStarted,

    #[error("State machine is already started")]
    AlreadyStarted,

    /// The tree answered an LCA that is not an ancestor of both ends.
    #[error("Inconsistent state tree: {0}")]
    Path(#[from] PathError),
}
