use serde::Serialize;

use crate::error::CoordinatorError;
use crate::poller::PollOutcome;
use crate::state_machine::PollState;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "message", rename_all = "snake_case")]
pub enum Outcome {
    Success(String),
    Failure(String),
}

/// The only value handed back to the protocol layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoordinatorResult {
    pub outcome: Outcome,
}

impl CoordinatorResult {
    pub fn success(payload: impl Into<String>) -> Self {
        Self {
            outcome: Outcome::Success(payload.into()),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            outcome: Outcome::Failure(message.into()),
        }
    }

    /// Translate a finished wait into the caller-facing result.
    pub fn from_poll(poll: PollOutcome) -> Self {
        match poll.state {
            PollState::Succeeded => Self::success(poll.payload),
            PollState::Failed => CoordinatorError::Fulfillment(poll.payload).into(),
            PollState::TimedOut => CoordinatorError::Timeout.into(),
            PollState::Cancelled => CoordinatorError::Cancelled.into(),
            PollState::Waiting => CoordinatorError::InvalidTransition {
                from: PollState::Waiting.as_str().to_string(),
                to: "result".to_string(),
            }
            .into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Success(_))
    }

    /// Payload on success, message on failure.
    pub fn message(&self) -> &str {
        match &self.outcome {
            Outcome::Success(payload) | Outcome::Failure(payload) => payload,
        }
    }

    pub fn into_result(self) -> std::result::Result<String, String> {
        match self.outcome {
            Outcome::Success(payload) => Ok(payload),
            Outcome::Failure(message) => Err(message),
        }
    }
}

impl From<CoordinatorError> for CoordinatorResult {
    fn from(err: CoordinatorError) -> Self {
        Self::failure(err.to_string())
    }
}
