use std::time::Duration;

const DEFAULT_BASE_DELAY_MS: u64 = 200;
const DEFAULT_MAX_DELAY_MS: u64 = 5_000;

/// How often and how patiently the client reconnects to a node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// `None` retries forever
    pub max_retries: Option<u32>,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// Map a `num_retries` setting onto a policy: any negative value means
    /// unlimited retries, zero means fail on the first error.
    pub fn from_num_retries(num_retries: i64) -> Self {
        let max_retries = if num_retries < 0 {
            None
        } else {
            Some(u32::try_from(num_retries).unwrap_or(u32::MAX))
        };
        Self {
            max_retries,
            ..Self::default()
        }
    }

    pub fn unlimited() -> Self {
        Self::from_num_retries(-1)
    }

    pub fn never() -> Self {
        Self::from_num_retries(0)
    }

    pub fn with_delays(mut self, base_delay: Duration, max_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self.max_delay = max_delay;
        self
    }

    /// Whether retry number `attempt` (1-based) is still allowed
    pub fn allows(&self, attempt: u32) -> bool {
        match self.max_retries {
            Some(max) => attempt <= max,
            None => true,
        }
    }

    /// Linear backoff capped at `max_delay`
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(attempt.max(1))
            .min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: None,
            base_delay: Duration::from_millis(DEFAULT_BASE_DELAY_MS),
            max_delay: Duration::from_millis(DEFAULT_MAX_DELAY_MS),
        }
    }
}
