//! Errors raised while assembling and querying a state tree.

use thiserror::Error;

/// Problems found while compiling a chart.
///
/// Every variant is fatal to construction: a chart that produces any of
/// these never yields a usable [`Definition`](crate::builder::Definition).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("State '{name}' is declared more than once")]
    DuplicateState { name: String },

    #[error("State name '{name}' is reserved for the root of the tree")]
    ReservedName { name: String },

    #[error("State '{parent}' already has default child '{existing}', cannot also mark '{candidate}'")]
    DuplicateDefault {
        parent: String,
        existing: String,
        candidate: String,
    },

    #[error("State '{name}' is referenced by '{referenced_by}' but never declared")]
    UnknownState { name: String, referenced_by: String },

    #[error("State '{name}' is part of a parent cycle and cannot reach the root")]
    Cycle { name: String },

    #[error("Trigger '{trigger}' is registered twice on state '{state}'")]
    DuplicateTransition { trigger: String, state: String },

    #[error("Action '{name}' used by state '{state}' is not registered")]
    UnknownAction { name: String, state: String },

    #[error("Guard '{name}' used by state '{state}' is not registered")]
    UnknownGuard { name: String, state: String },

    #[error("Trigger '{trigger}' on state '{state}' has neither a target nor an action")]
    MissingTarget { trigger: String, state: String },

    /// The chart document could not be read or written.
    #[error("Invalid chart document: {0}")]
    Document(String),
}

/// A path was requested between two vertices on different branches.
///
/// The dispatch algorithm only asks for paths between a vertex and one of
/// its ancestors, so seeing this at runtime points at a bug in the engine.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PathError {
    #[error("No ancestor path between '{from}' and '{to}'")]
    Unrelated { from: String, to: String },
}
