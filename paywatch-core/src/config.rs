//! Polling configuration.

use std::time::Duration;

use crate::utils::backoff::{BackoffStrategy, delay_for_attempt, with_jitter};

/// Tuning knobs for one polling session.
///
/// The defaults reproduce the historical behavior: a fixed 30 second
/// interval with a hard cap of 20 ticks, bounding a session at ten
/// minutes of wall-clock waiting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollConfig {
    /// Base wait between ticks.
    pub interval: Duration,
    /// Hard cap on ticks before the session reports a timeout.
    pub max_attempts: u32,
    /// How the wait evolves across ticks.
    pub backoff: BackoffStrategy,
    /// Jitter fraction applied to every wait; zero disables jitter.
    pub jitter: f64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            max_attempts: 20,
            backoff: BackoffStrategy::Fixed,
            jitter: 0.0,
        }
    }
}

impl PollConfig {
    /// The wait before the tick following `completed_ticks`.
    pub(crate) fn delay(&self, completed_ticks: u32) -> Duration {
        let delay = delay_for_attempt(self.interval, completed_ticks, self.backoff);
        with_jitter(delay, self.jitter)
    }
}
