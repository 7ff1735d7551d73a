use std::time::Duration;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);
/// Shortest pause between two status reads.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);
/// Longest accepted wait budget.
pub const MAX_TIMEOUT: Duration = Duration::from_secs(24 * 60 * 60);

/// Tunables and capability flags of a [`crate::ResourceCoordinator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatorConfig {
    /// Budget for observing a terminal status record.
    pub timeout: Duration,
    /// Pause between two status reads.
    pub poll_interval: Duration,
    /// Look the resource up in the catalog before dispatching.
    pub duplicate_check: bool,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            duplicate_check: true,
        }
    }
}

impl CoordinatorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the wait budget, capped at [`MAX_TIMEOUT`].
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout.min(MAX_TIMEOUT);
        self
    }

    /// Set the poll interval, raised to at least [`MIN_POLL_INTERVAL`].
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval.max(MIN_POLL_INTERVAL);
        self
    }

    pub fn with_duplicate_check(mut self, enabled: bool) -> Self {
        self.duplicate_check = enabled;
        self
    }
}
