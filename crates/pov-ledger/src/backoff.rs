use std::time::Duration;

use rand::Rng;

/// Capped exponential backoff with jitter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Backoff {
    initial: Duration,
    max: Duration,
}

impl Backoff {
    pub fn new(initial: Duration, max: Duration) -> Self {
        Self {
            initial,
            max: max.max(initial),
        }
    }

    /// Un-jittered delay before retry number `retry` (0-based): the initial
    /// delay doubled `retry` times, capped at the maximum.
    pub fn delay(&self, retry: u32) -> Duration {
        let factor = 1u32.checked_shl(retry.min(31)).unwrap_or(u32::MAX);
        self.initial.saturating_mul(factor).min(self.max)
    }

    /// A delay drawn uniformly from the upper half of [`Backoff::delay`].
    ///
    /// Writers that collided on the same index would otherwise wake up
    /// together and collide again.
    pub fn jittered(&self, retry: u32) -> Duration {
        let full = self.delay(retry);
        let half = full / 2;
        let spread = (full - half).as_micros() as u64;
        if spread == 0 {
            return full;
        }
        half + Duration::from_micros(rand::thread_rng().gen_range(0..=spread))
    }
}
