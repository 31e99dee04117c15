//! Nested: a hierarchical state machine engine
//!
//! A chart is a tree of named states rooted at [`ROOT`]. Each state may
//! declare a default substate, entry and exit actions, and transitions keyed
//! by trigger name. Charts are compiled once into an immutable
//! [`Definition`] and shared, through an `Arc`, by any number of
//! [`StateMachine`]s, each owning its own host context.
//!
//! # Core Concepts
//!
//! - **Bubbling**: an event is offered to the active leaf first, then to each
//!   ancestor in turn, until some state handles it
//! - **LCA**: an external transition exits up to, and enters down from, the
//!   lowest common ancestor of the source leaf and the destination
//! - **Cascading entry**: entering a composite state keeps entering default
//!   substates until a state without one is reached
//!
//! # Example
//!
//! ```rust
//! use nested::{DefinitionBuilder, Signal, StateDescriptor, StateMachine};
//! use std::sync::Arc;
//!
//! #[derive(Default)]
//! struct Toaster {
//!     heater_on: bool,
//! }
//!
//! let definition = DefinitionBuilder::new()
//!     .state(
//!         StateDescriptor::new("heating")
//!             .initial()
//!             .on_entry(|t: &mut Toaster, _: &Signal<'_, ()>| t.heater_on = true)
//!             .on_exit(|t: &mut Toaster, _: &Signal<'_, ()>| t.heater_on = false)
//!             .on("DOOR_OPEN", "door_open"),
//!     )
//!     .state(StateDescriptor::new("toasting").parent("heating").initial())
//!     .state(StateDescriptor::new("door_open").on("DOOR_CLOSE", "heating"))
//!     .build()
//!     .unwrap();
//!
//! let mut machine = StateMachine::new(Arc::new(definition), Toaster::default());
//! machine.start().unwrap();
//! assert_eq!(machine.current_state(), Some("toasting"));
//! assert!(machine.isin("heating"));
//!
//! assert_eq!(machine.dispatch("DOOR_OPEN"), Ok(true));
//! assert_eq!(machine.current_state(), Some("door_open"));
//! assert!(!machine.context().heater_on);
//! ```

pub mod builder;
pub mod config;
pub mod core;
pub mod machine;

// Re-export commonly used types
pub use builder::{BuildError, Definition, DefinitionBuilder, StateDescriptor, TransitionSpec};
pub use config::{ActionRegistry, ChartConfig};
pub use self::core::{ConfigError, Guard, PathError, Signal, SignalKind, ROOT};
pub use machine::{MachineError, StateMachine};
