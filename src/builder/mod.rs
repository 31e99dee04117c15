//! Builder API for compiling state charts.
//!
//! A chart is described as a list of [`StateDescriptor`]s, in any order,
//! and compiled once by [`DefinitionBuilder::build`] into an immutable
//! [`Definition`]. Callbacks are captured as closures when the descriptors
//! are written; nothing is resolved by name at runtime.

pub mod definition;
pub mod descriptor;
pub mod error;

pub use definition::{Definition, DefinitionBuilder};
pub use descriptor::{StateDescriptor, TransitionSpec};
pub use error::BuildError;

pub use crate::core::ConfigError;
