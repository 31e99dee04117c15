//! Chart documents.
//!
//! A chart can also be written as JSON and compiled against an
//! [`ActionRegistry`] that binds the callback names it mentions:
//!
//! ```rust
//! use nested::config::{ActionRegistry, ChartConfig};
//! use nested::core::Signal;
//!
//! let chart = ChartConfig::from_json(r#"{
//!     "states": {
//!         "off": { "initial": true, "on": { "FLIP": "on" } },
//!         "on":  { "on_entry": "count", "on": { "FLIP": "off" } }
//!     }
//! }"#).unwrap();
//!
//! let registry = ActionRegistry::<u32>::new()
//!     .with_action("count", |n: &mut u32, _: &Signal<'_, ()>| *n += 1);
//!
//! let definition = chart.compile(&registry).unwrap();
//! assert_eq!(definition.transitions().len(), 2);
//! ```

mod chart;
mod registry;

pub use chart::{ChartConfig, StateConfig, TargetConfig, TransitionConfig};
pub use registry::ActionRegistry;
