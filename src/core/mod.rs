//! Core engine types.
//!
//! This module contains the structural half of the engine:
//! - The state tree with its LCA and ancestor-path queries
//! - Transitions and the table they are looked up in
//! - The action and guard capabilities the engine calls into
//! - The optional journal of handled transitions
//!
//! Everything here is immutable once built, except the journal, and can be
//! shared freely between machines.

mod action;
mod error;
mod guard;
mod journal;
mod transition;
mod tree;

pub use action::{action, Action, ActionInvoker, Signal, SignalKind, StateActions};
pub use error::{ConfigError, PathError};
pub use guard::Guard;
pub use journal::{Journal, TransitionRecord};
pub use transition::{Transition, TransitionKind, TransitionTable};
pub use tree::{Ancestors, StateTree, StateTreeBuilder, Vertex, VertexId, ROOT};
