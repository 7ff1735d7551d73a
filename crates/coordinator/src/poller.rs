//! Bounded wait for a resource's status record to turn terminal.
//!
//! The status store has no notification primitive, so completion is
//! observed by re-reading the record every poll interval. A record that is
//! absent, has no `status` field, or can not be decoded counts as
//! `processing`; the first terminal record ends the wait.
//!
//! A poller that knows its wait task id only accepts records written for
//! that task. A success owned by another task means someone else created
//! the resource first, and a failure owned by another task is ignored.

use db::StatusStore;
use shard_core::{ResourceStatus, StatusKey, StatusRecord};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::config::MIN_POLL_INTERVAL;
use crate::error::{CoordinatorError, Result};
use crate::state_machine::{PollState, PollStateMachine};

/// Terminal result of a [`CompletionPoller`] run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollOutcome {
    pub state: PollState,
    /// `result` of the terminal record; empty for timeouts and cancellations.
    pub payload: String,
    /// Number of status reads performed.
    pub attempts: u32,
    pub elapsed: Duration,
}

pub struct CompletionPoller {
    store: Arc<dyn StatusStore>,
    key: StatusKey,
    timeout: Duration,
    interval: Duration,
    cancel: CancellationToken,
    owner: Option<String>,
}

impl CompletionPoller {
    pub fn new(
        store: Arc<dyn StatusStore>,
        resource_name: &str,
        timeout: Duration,
        interval: Duration,
    ) -> Self {
        Self {
            store,
            key: StatusKey::for_resource(resource_name),
            timeout,
            interval: interval.max(MIN_POLL_INTERVAL),
            cancel: CancellationToken::new(),
            owner: None,
        }
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Only accept records written for the wait task `owner`.
    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    pub fn key(&self) -> &StatusKey {
        &self.key
    }

    /// Poll until a terminal state is reached.
    ///
    /// Errors only when the store itself fails; timeouts and cancellation
    /// are terminal states, not errors.
    pub async fn run(self) -> Result<PollOutcome> {
        let started = Instant::now();
        // None when the budget does not fit in an Instant: wait until cancelled.
        let deadline = started.checked_add(self.timeout);
        let mut state = PollState::Waiting;
        let mut attempts = 0u32;

        debug!(
            key = %self.key,
            timeout_ms = self.timeout.as_millis() as u64,
            interval_ms = self.interval.as_millis() as u64,
            "Waiting for status record"
        );

        let payload = loop {
            if self.cancel.is_cancelled() {
                Self::advance(&mut state, PollState::Cancelled)?;
                break String::new();
            }

            attempts += 1;
            let raw = self.store.get(self.key.as_str()).await.map_err(|e| {
                error!(key = %self.key, attempt = attempts, error = %e, "Status read failed");
                e
            })?;
            let record = StatusRecord::from_stored(raw.as_deref());

            debug!(
                key = %self.key,
                attempt = attempts,
                status = record.status.as_str(),
                "Status record read"
            );

            let foreign = self
                .owner
                .as_deref()
                .is_some_and(|owner| record.is_foreign_to(owner));

            match (record.status, foreign) {
                (ResourceStatus::Succeeded, false) => {
                    Self::advance(&mut state, PollState::Succeeded)?;
                    break record.result;
                }
                (ResourceStatus::Succeeded, true) => {
                    debug!(
                        key = %self.key,
                        owner = record.owner.as_deref().unwrap_or(""),
                        "Resource created by another wait task"
                    );
                    Self::advance(&mut state, PollState::Failed)?;
                    break CoordinatorError::duplicate(self.key.resource_name()).to_string();
                }
                (ResourceStatus::Failed, false) => {
                    Self::advance(&mut state, PollState::Failed)?;
                    break record.result;
                }
                (ResourceStatus::Failed, true) | (ResourceStatus::Processing, _) => {}
            }

            if deadline.is_some_and(|deadline| Instant::now() > deadline) {
                Self::advance(&mut state, PollState::TimedOut)?;
                break String::new();
            }

            tokio::select! {
                _ = sleep(self.interval) => {}
                _ = self.cancel.cancelled() => {
                    Self::advance(&mut state, PollState::Cancelled)?;
                    break String::new();
                }
            }
        };

        let elapsed = started.elapsed();
        info!(
            key = %self.key,
            state = state.as_str(),
            attempts,
            elapsed_ms = elapsed.as_millis() as u64,
            "Status wait finished"
        );

        Ok(PollOutcome {
            state,
            payload,
            attempts,
            elapsed,
        })
    }

    fn advance(state: &mut PollState, to: PollState) -> Result<()> {
        PollStateMachine::validate_transition(state, &to)?;
        *state = to;
        Ok(())
    }
}
