use crate::error::{CoordinatorError, Result};

/// States of a completion wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PollState {
    #[default]
    Waiting,
    Succeeded,
    Failed,
    TimedOut,
    Cancelled,
}

impl PollState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::TimedOut => "timed_out",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Waiting)
    }
}

/// Transition table of the completion wait: every terminal state is
/// reachable from `Waiting` and nothing leaves a terminal state.
pub struct PollStateMachine;

impl PollStateMachine {
    pub fn validate_transition(from: &PollState, to: &PollState) -> Result<()> {
        if Self::allowed_transitions(from).contains(to) {
            Ok(())
        } else {
            Err(CoordinatorError::InvalidTransition {
                from: from.as_str().to_string(),
                to: to.as_str().to_string(),
            })
        }
    }

    fn allowed_transitions(from: &PollState) -> Vec<PollState> {
        match from {
            PollState::Waiting => vec![
                PollState::Succeeded,
                PollState::Failed,
                PollState::TimedOut,
                PollState::Cancelled,
            ],
            PollState::Succeeded
            | PollState::Failed
            | PollState::TimedOut
            | PollState::Cancelled => vec![],
        }
    }

    pub fn can_transition(from: &PollState, to: &PollState) -> bool {
        Self::validate_transition(from, to).is_ok()
    }
}
