use bluf_common::{BlufError, Result};
use std::time::Duration;

/// Exponential backoff policy for provider calls
///
/// `max_retries` counts provider attempts. After failed attempt `n`
/// (0-based) that is not the last one, the caller waits
/// `base_delay * 2^n`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    max_retries: u32,
    base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Result<Self> {
        if max_retries == 0 {
            return Err(BlufError::invalid_input("max_retries must be at least 1"));
        }
        Ok(Self {
            max_retries,
            base_delay,
        })
    }

    /// Policy from a base delay in seconds
    pub fn from_secs_f64(max_retries: u32, base_delay_secs: f64) -> Result<Self> {
        let base_delay = Duration::try_from_secs_f64(base_delay_secs)
            .map_err(|e| BlufError::invalid_input(format!("invalid retry delay {}: {}", base_delay_secs, e)))?;
        Self::new(max_retries, base_delay)
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    /// Delay after failed attempt `attempt` (0-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let mut delay = self.base_delay;
        let mut remaining = attempt;
        // double in chunks of at most 2^31 until saturated
        while remaining > 0 && !delay.is_zero() && delay != Duration::MAX {
            let step = remaining.min(31);
            delay = delay.saturating_mul(1u32 << step);
            remaining -= step;
        }
        delay
    }

    /// Whether another attempt follows attempt `attempt`
    pub fn has_next(&self, attempt: u32) -> bool {
        attempt + 1 < self.max_retries
    }
}
