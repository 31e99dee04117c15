//! Running instances of compiled charts.
//!
//! A [`StateMachine`] pairs a shared [`Definition`](crate::builder::Definition)
//! with one host context and the pointer to its active state. Dispatch is
//! synchronous and runs to completion: bubbling, exit actions, the
//! transition action, entry actions and the default-substate cascade all
//! happen before `dispatch` returns.
//!
//! Definitions are immutable, so many machines on many threads can share
//! one `Arc<Definition>`. A single machine is driven by `&mut self` and is
//! never shared between threads without external synchronization.

mod error;
mod state_machine;

pub use error::MachineError;
pub use state_machine::StateMachine;
