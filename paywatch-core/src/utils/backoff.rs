//! Delay calculation between poll ticks.

use std::time::Duration;

/// How the gap between poll ticks evolves over a session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BackoffStrategy {
    /// Every tick waits the base interval.
    Fixed,
    /// The wait grows by `factor` per completed tick, capped at `max`.
    Exponential { factor: f64, max: Duration },
}

/// Returns the wait before the tick following `completed_ticks`.
pub fn delay_for_attempt(
    base: Duration,
    completed_ticks: u32,
    strategy: BackoffStrategy,
) -> Duration {
    match strategy {
        BackoffStrategy::Fixed => base,
        BackoffStrategy::Exponential { factor, max } => {
            let scaled = base.as_secs_f64() * factor.powi(completed_ticks as i32);
            Duration::from_secs_f64(scaled.min(max.as_secs_f64()))
        }
    }
}

/// Spread `delay` uniformly across `[1 - fraction, 1 + fraction]`.
///
/// `fraction` is clamped to `[0, 1]`; zero returns the delay unchanged.
pub fn with_jitter(delay: Duration, fraction: f64) -> Duration {
    let fraction = fraction.clamp(0.0, 1.0);
    if fraction == 0.0 {
        return delay;
    }
    let scale = rand::random_range((1.0 - fraction)..=(1.0 + fraction));
    Duration::from_secs_f64(delay.as_secs_f64() * scale)
}
