//! Event system for the shard coordinator
//!
//! Carries fulfillment hook invocations and task lifecycle notifications
//! between the coordinator and whoever listens (the local fulfiller, logs,
//! tests).

mod bus;
mod types;

pub use bus::EventBus;
pub use types::*;
