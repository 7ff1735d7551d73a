//! Dispatch-and-await coordination of sharded resource creation.
//!
//! A create request goes through the [`DuplicateGuard`], is handed to the
//! [`TaskDispatcher`] as a background wait, and the fulfillment hook is
//! fired once the wait exists. The wait itself is a [`CompletionPoller`]
//! reading the resource's status record until it turns terminal or the
//! budget runs out.

pub mod config;
pub mod coordinator;
pub mod dispatcher;
pub mod error;
pub mod guard;
pub mod hook;
pub mod outcome;
pub mod poller;
pub mod state_machine;

pub use config::{CoordinatorConfig, MAX_TIMEOUT, MIN_POLL_INTERVAL};
pub use coordinator::ResourceCoordinator;
pub use dispatcher::{TaskContext, TaskDispatcher, TaskHandle};
pub use error::{CoordinatorError, Result};
pub use guard::{DuplicateGuard, GuardVerdict};
pub use hook::{FulfillmentHook, HookEvent, SHARD_HOOK};
pub use outcome::{CoordinatorResult, Outcome};
pub use poller::{CompletionPoller, PollOutcome};
pub use state_machine::{PollState, PollStateMachine};
