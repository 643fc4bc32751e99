//! Backoff delay between fetch attempts.
//!
//! `delay = min(base * growth^(attempt - 1) + jitter, cap)`
//!
//! Suspected anti-bot blocks use a longer base and steeper growth than
//! ordinary HTTP or transport errors, since mitigation layers penalise fast
//! retries harder.
//!
//! | Attempt | Block (4.0 × 1.9ⁿ) | Error (2.5 × 1.5ⁿ) |
//! |---------|--------------------|--------------------|
//! | 1       | 4.0 s              | 2.5 s              |
//! | 2       | 7.6 s              | 3.75 s             |
//! | 3       | 14.44 s            | 5.63 s             |
//! | 4       | 27.44 s            | 8.44 s             |
//! | 5       | 45 s (capped)      | 12.66 s            |
//!
//! plus up to 1.2 s of uniform jitter, never exceeding the cap.

use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackoffCurve {
    pub base_secs: f64,
    pub growth: f64,
}

impl BackoffCurve {
    fn raw_secs(self, attempt: u32) -> f64 {
        let exponent = i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX);
        self.base_secs * self.growth.powi(exponent)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackoffPolicy {
    pub block: BackoffCurve,
    pub error: BackoffCurve,
    /// Jitter is drawn uniformly from `[0, jitter_secs)`.
    pub jitter_secs: f64,
    pub cap_secs: f64,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            block: BackoffCurve {
                base_secs: 4.0,
                growth: 1.9,
            },
            error: BackoffCurve {
                base_secs: 2.5,
                growth: 1.5,
            },
            jitter_secs: 1.2,
            cap_secs: 45.0,
        }
    }
}

impl BackoffPolicy {
    /// A policy that never waits; for tests and local mock servers.
    #[must_use]
    pub fn immediate() -> Self {
        let zero = BackoffCurve {
            base_secs: 0.0,
            growth: 1.0,
        };
        Self {
            block: zero,
            error: zero,
            jitter_secs: 0.0,
            cap_secs: 0.0,
        }
    }

    /// Delay before retrying after failed `attempt` (1-based), with fresh
    /// random jitter.
    #[must_use]
    pub fn delay(&self, attempt: u32, is_block_retry: bool) -> Duration {
        let jitter = rand::random::<f64>() * self.jitter_secs;
        self.delay_with_jitter(attempt, is_block_retry, jitter)
    }

    /// Deterministic form of [`BackoffPolicy::delay`] with the jitter supplied.
    #[must_use]
    pub fn delay_with_jitter(
        &self,
        attempt: u32,
        is_block_retry: bool,
        jitter_secs: f64,
    ) -> Duration {
        let curve = if is_block_retry { self.block } else { self.error };
        let secs = (curve.raw_secs(attempt) + jitter_secs)
            .min(self.cap_secs)
            .max(0.0);
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(d: Duration) -> f64 {
        d.as_secs_f64()
    }

    #[test]
    fn first_attempt_uses_base_delay() {
        let p = BackoffPolicy::default();
        assert!((secs(p.delay_with_jitter(1, true, 0.0)) - 4.0).abs() < 1e-6);
        assert!((secs(p.delay_with_jitter(1, false, 0.0)) - 2.5).abs() < 1e-6);
    }

    #[test]
    fn growth_matches_curve() {
        let p = BackoffPolicy::default();
        assert!((secs(p.delay_with_jitter(2, true, 0.0)) - 7.6).abs() < 1e-6);
        assert!((secs(p.delay_with_jitter(3, false, 0.0)) - 5.625).abs() < 1e-6);
    }

    #[test]
    fn block_retries_wait_at_least_as_long_as_error_retries() {
        let p = BackoffPolicy::default();
        for attempt in 1..=12 {
            assert!(
                p.delay_with_jitter(attempt, true, 0.0) >= p.delay_with_jitter(attempt, false, 0.0)
            );
        }
    }

    #[test]
    fn cap_is_absolute() {
        let p = BackoffPolicy::default();
        for attempt in [1, 5, 6, 20, 1_000, u32::MAX] {
            for block in [true, false] {
                assert!(secs(p.delay(attempt, block)) <= 45.0);
                assert!(secs(p.delay_with_jitter(attempt, block, 1.199)) <= 45.0);
            }
        }
        assert!((secs(p.delay_with_jitter(5, true, 0.0)) - 45.0).abs() < 1e-6);
    }

    #[test]
    fn jitter_free_delay_is_monotonic_in_attempt() {
        let p = BackoffPolicy::default();
        for block in [true, false] {
            for attempt in 1..30 {
                assert!(
                    p.delay_with_jitter(attempt + 1, block, 0.0)
                        >= p.delay_with_jitter(attempt, block, 0.0)
                );
            }
        }
    }

    #[test]
    fn random_delay_stays_within_jitter_band() {
        let p = BackoffPolicy::default();
        for _ in 0..200 {
            let d = secs(p.delay(1, false));
            assert!((2.5..=3.7 + 1e-9).contains(&d), "delay {d} out of band");
        }
    }

    #[test]
    fn consecutive_random_delays_drop_by_less_than_jitter() {
        let p = BackoffPolicy::default();
        for block in [true, false] {
            for attempt in 1..10 {
                let now = secs(p.delay(attempt, block));
                let next = secs(p.delay(attempt + 1, block));
                assert!(next >= now - 1.2 - 1e-9, "attempt {attempt}: {next} < {now} - 1.2");
            }
        }
    }

    #[test]
    fn immediate_policy_never_waits() {
        let p = BackoffPolicy::immediate();
        assert_eq!(p.delay(1, true), Duration::ZERO);
        assert_eq!(p.delay(7, false), Duration::ZERO);
    }
}
