//! Shared exponential-backoff-with-jitter schedule (spec §5 "Backpressure":
//! 3 attempts, 1→2→4 s base delays), used by both the LM and sandbox
//! clients instead of being duplicated in each.

use std::time::Duration;

use rand::Rng;

pub const MAX_ATTEMPTS: u32 = 3;

/// The base delay before attempt `attempt` (0-indexed), before jitter.
#[must_use]
pub fn base_delay(attempt: u32) -> Duration {
    Duration::from_secs(1u64.saturating_mul(1 << attempt.min(2)))
}

/// Base delay plus up to 25% random jitter, so concurrent retries across
/// interviews don't all land on the same instant.
#[must_use]
pub fn jittered_delay(attempt: u32) -> Duration {
    let base = base_delay(attempt);
    let jitter_ms = rand::rng().random_range(0..=(base.as_millis() as u64 / 4).max(1));
    base + Duration::from_millis(jitter_ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delays_follow_one_two_four_schedule() {
        assert_eq!(base_delay(0), Duration::from_secs(1));
        assert_eq!(base_delay(1), Duration::from_secs(2));
        assert_eq!(base_delay(2), Duration::from_secs(4));
    }

    #[test]
    fn jitter_never_undershoots_base() {
        for attempt in 0..MAX_ATTEMPTS {
            assert!(jittered_delay(attempt) >= base_delay(attempt));
        }
    }
}
