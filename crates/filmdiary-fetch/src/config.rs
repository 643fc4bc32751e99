//! Tunables for the retrying fetcher, gathered into one value.
//!
//! Everything the retry loop, the block detector and the backoff policy need
//! is carried here and handed to [`crate::RetryingFetcher::new`], so tests can
//! swap constants without touching global state.

use std::time::Duration;

use filmdiary_core::{AppConfig, BrowserProfile};

use crate::backoff::BackoffPolicy;
use crate::block::BlockDetector;
use crate::error::FetchError;
use crate::types::FetchRequest;

pub const DEFAULT_REFERER: &str = "https://letterboxd.com/";

/// Connect and total timeouts for one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptTimeouts {
    pub connect: Duration,
    pub total: Duration,
}

/// Linear timeout growth: later attempts get more patience, since challenge
/// pages tend to add latency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutSchedule {
    pub connect_base: Duration,
    pub connect_step: Duration,
    pub total_base: Duration,
    pub total_step: Duration,
}

impl Default for TimeoutSchedule {
    fn default() -> Self {
        Self {
            connect_base: Duration::from_secs(10),
            connect_step: Duration::from_secs(2),
            total_base: Duration::from_secs(30),
            total_step: Duration::from_secs(5),
        }
    }
}

impl TimeoutSchedule {
    /// `attempt` is 1-based.
    #[must_use]
    pub fn for_attempt(&self, attempt: u32) -> AttemptTimeouts {
        AttemptTimeouts {
            connect: self
                .connect_base
                .saturating_add(self.connect_step.saturating_mul(attempt)),
            total: self
                .total_base
                .saturating_add(self.total_step.saturating_mul(attempt)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Browser-like headers sent with every attempt, in addition to the
    /// profile's identity headers.
    pub headers: Vec<(String, String)>,
    pub profile: BrowserProfile,
    pub timeouts: TimeoutSchedule,
    pub detector: BlockDetector,
    pub backoff: BackoffPolicy,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            headers: browser_headers(DEFAULT_REFERER),
            profile: BrowserProfile::default(),
            timeouts: TimeoutSchedule::default(),
            detector: BlockDetector::default(),
            backoff: BackoffPolicy::default(),
        }
    }
}

impl FetchConfig {
    /// Applies the environment-driven settings on top of the defaults.
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        let mut backoff = BackoffPolicy::default();
        backoff.cap_secs = config.backoff_cap_secs;
        Self {
            headers: browser_headers(&config.referer),
            profile: config.impersonate,
            timeouts: TimeoutSchedule {
                connect_base: Duration::from_secs(config.connect_timeout_base_secs),
                connect_step: Duration::from_secs(config.connect_timeout_step_secs),
                total_base: Duration::from_secs(config.total_timeout_base_secs),
                total_step: Duration::from_secs(config.total_timeout_step_secs),
            },
            detector: BlockDetector::default(),
            backoff,
        }
    }

    /// Builds a request for `url` carrying this config's headers and profile.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidHeader`] if a configured header is not
    /// valid HTTP syntax (e.g. a referer containing a newline).
    pub fn request(&self, url: &str, max_attempts: u32) -> Result<FetchRequest, FetchError> {
        FetchRequest::new(
            url,
            self.headers
                .iter()
                .map(|(name, value)| (name.as_str(), value.as_str())),
            self.profile,
            max_attempts,
        )
    }
}

/// The fixed header set a browser sends when navigating from `referer`.
#[must_use]
pub fn browser_headers(referer: &str) -> Vec<(String, String)> {
    [
        ("referer", referer),
        (
            "accept",
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8",
        ),
        ("accept-encoding", "gzip, deflate, br"),
        ("accept-language", "en-US,en;q=0.9"),
        ("cache-control", "no-cache"),
        ("pragma", "no-cache"),
        ("upgrade-insecure-requests", "1"),
    ]
    .into_iter()
    .map(|(name, value)| (name.to_owned(), value.to_owned()))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeouts_grow_linearly_with_attempt() {
        let schedule = TimeoutSchedule::default();
        assert_eq!(
            schedule.for_attempt(1),
            AttemptTimeouts {
                connect: Duration::from_secs(12),
                total: Duration::from_secs(35),
            }
        );
        assert_eq!(
            schedule.for_attempt(3),
            AttemptTimeouts {
                connect: Duration::from_secs(16),
                total: Duration::from_secs(45),
            }
        );
    }

    #[test]
    fn later_attempts_never_get_less_patience() {
        let schedule = TimeoutSchedule::default();
        for attempt in 1..10 {
            let now = schedule.for_attempt(attempt);
            let next = schedule.for_attempt(attempt + 1);
            assert!(next.connect > now.connect);
            assert!(next.total > now.total);
        }
    }

    #[test]
    fn browser_headers_carry_referer_and_fixed_set() {
        let headers = browser_headers("https://example.com/");
        let names: Vec<&str> = headers.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(
            names,
            [
                "referer",
                "accept",
                "accept-encoding",
                "accept-language",
                "cache-control",
                "pragma",
                "upgrade-insecure-requests"
            ]
        );
        assert_eq!(headers[0].1, "https://example.com/");
    }

    #[test]
    fn from_app_config_maps_every_field() {
        let app = AppConfig {
            impersonate: BrowserProfile::Safari,
            referer: "https://example.org/".to_owned(),
            connect_timeout_base_secs: 1,
            connect_timeout_step_secs: 1,
            total_timeout_base_secs: 2,
            total_timeout_step_secs: 2,
            backoff_cap_secs: 3.0,
            ..AppConfig::default()
        };
        let config = FetchConfig::from_app_config(&app);
        assert_eq!(config.profile, BrowserProfile::Safari);
        assert_eq!(config.headers[0].1, "https://example.org/");
        assert_eq!(config.timeouts.for_attempt(2).connect, Duration::from_secs(3));
        assert_eq!(config.timeouts.for_attempt(2).total, Duration::from_secs(6));
        assert!((config.backoff.cap_secs - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn request_uses_configured_headers_and_profile() {
        let config = FetchConfig::default();
        let request = config.request("https://letterboxd.com/x/", 3).unwrap();
        assert_eq!(request.max_attempts, 3);
        assert_eq!(request.profile, BrowserProfile::Chrome);
        assert_eq!(
            request.headers.get("referer").unwrap(),
            "https://letterboxd.com/"
        );
        assert_eq!(request.headers.get("pragma").unwrap(), "no-cache");
    }

    #[test]
    fn request_rejects_referer_with_newline() {
        let config = FetchConfig {
            headers: browser_headers("https://a.example/\nx"),
            ..FetchConfig::default()
        };
        assert!(matches!(
            config.request("https://a.example/", 1),
            Err(FetchError::InvalidHeader { .. })
        ));
    }
}
