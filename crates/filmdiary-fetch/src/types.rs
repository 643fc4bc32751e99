use std::fmt;
use std::time::Duration;

use filmdiary_core::BrowserProfile;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::error::FetchError;

/// One fetch operation: what to get, how to present ourselves, and how many
/// attempts the retry loop may spend on it.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub url: String,
    pub headers: HeaderMap,
    pub profile: BrowserProfile,
    /// Total attempts including the first. Zero attempts yields
    /// [`FetchResult::ExhaustedNoOutcome`].
    pub max_attempts: u32,
}

impl FetchRequest {
    /// Builds a request, validating every header name and value.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidHeader`] if a name or value is not valid
    /// HTTP header syntax.
    pub fn new<'a, I>(
        url: &str,
        headers: I,
        profile: BrowserProfile,
        max_attempts: u32,
    ) -> Result<Self, FetchError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut map = HeaderMap::new();
        for (name, value) in headers {
            let header_name =
                HeaderName::from_bytes(name.as_bytes()).map_err(|e| FetchError::InvalidHeader {
                    name: name.to_owned(),
                    reason: e.to_string(),
                })?;
            let header_value =
                HeaderValue::from_str(value).map_err(|e| FetchError::InvalidHeader {
                    name: name.to_owned(),
                    reason: e.to_string(),
                })?;
            map.insert(header_name, header_value);
        }
        Ok(Self {
            url: url.to_owned(),
            headers: map,
            profile,
            max_attempts,
        })
    }
}

/// A response as seen by the retry loop: status, headers, decoded body.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: String,
}

impl HttpResponse {
    #[must_use]
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: String::new(),
        }
    }

    #[cfg(test)]
    #[must_use]
    pub(crate) fn with_header(mut self, name: &'static str, value: &'static str) -> Self {
        self.headers.insert(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        );
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Header value as text, if present and visible ASCII.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Finite classification of transport-level failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Connect or total timeout elapsed.
    Timeout,
    /// DNS failure, refused or reset connection.
    ConnectionFailed,
    /// TLS handshake or certificate failure.
    TlsError,
    Other,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Timeout => "Timeout",
            ErrorKind::ConnectionFailed => "ConnectionFailed",
            ErrorKind::TlsError => "TlsError",
            ErrorKind::Other => "Other",
        };
        f.write_str(name)
    }
}

/// A request that never produced a usable response.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct TransportError {
    pub kind: ErrorKind,
    pub message: String,
}

impl TransportError {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Classification of a single attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success { body: String },
    BlockedRetryable { status_code: u16, reason: String },
    HttpErrorRetryable { status_code: u16 },
    TransportError(TransportError),
}

impl AttemptOutcome {
    /// Short human-readable cause used in retry notices.
    #[must_use]
    pub fn reason(&self) -> String {
        match self {
            AttemptOutcome::Success { .. } => "success".to_owned(),
            AttemptOutcome::BlockedRetryable { .. } => "Cloudflare challenge".to_owned(),
            AttemptOutcome::HttpErrorRetryable { status_code } => format!("HTTP {status_code}"),
            AttemptOutcome::TransportError(err) => err.kind.to_string(),
        }
    }
}

/// Terminal result of a fetch, returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchResult {
    Ok {
        body: String,
    },
    CloudflareBlocked {
        url: String,
        status_code: u16,
    },
    HttpError {
        url: String,
        status_code: u16,
    },
    NetworkError {
        url: String,
        error_kind: ErrorKind,
        message: String,
    },
    ExhaustedNoOutcome {
        url: String,
    },
    Cancelled {
        url: String,
    },
}

impl FetchResult {
    #[must_use]
    pub fn is_ok(&self) -> bool {
        matches!(self, FetchResult::Ok { .. })
    }
}

/// Emitted before the loop sleeps ahead of the next attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryNotice {
    /// The attempt that just failed (1-based).
    pub attempt: u32,
    pub reason: String,
    pub delay: Duration,
}

impl fmt::Display for RetryNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Attempt {} failed ({}), retrying in {}s...",
            self.attempt,
            self.reason,
            self.delay.as_secs_f64().round_ties_even()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_rejects_invalid_header_name() {
        let result = FetchRequest::new(
            "https://example.com",
            [("bad header", "x")],
            BrowserProfile::Chrome,
            1,
        );
        assert!(
            matches!(result, Err(FetchError::InvalidHeader { ref name, .. }) if name == "bad header"),
            "expected InvalidHeader, got: {result:?}"
        );
    }

    #[test]
    fn request_rejects_invalid_header_value() {
        let result = FetchRequest::new(
            "https://example.com",
            [("referer", "line\nbreak")],
            BrowserProfile::Chrome,
            1,
        );
        assert!(matches!(result, Err(FetchError::InvalidHeader { .. })));
    }

    #[test]
    fn response_header_lookup_is_case_insensitive() {
        let response = HttpResponse::new(403).with_header("server", "cloudflare");
        assert_eq!(response.header("Server"), Some("cloudflare"));
        assert_eq!(response.header("cf-ray"), None);
    }

    #[test]
    fn retry_notice_rounds_half_to_even() {
        let notice = |secs: f64| RetryNotice {
            attempt: 1,
            reason: "HTTP 500".to_owned(),
            delay: Duration::from_secs_f64(secs),
        };
        assert_eq!(
            notice(2.5).to_string(),
            "Attempt 1 failed (HTTP 500), retrying in 2s..."
        );
        assert_eq!(
            notice(3.5).to_string(),
            "Attempt 1 failed (HTTP 500), retrying in 4s..."
        );
        assert_eq!(
            notice(4.49).to_string(),
            "Attempt 1 failed (HTTP 500), retrying in 4s..."
        );
    }

    #[test]
    fn outcome_reasons() {
        assert_eq!(
            AttemptOutcome::BlockedRetryable {
                status_code: 403,
                reason: "forbidden status".to_owned()
            }
            .reason(),
            "Cloudflare challenge"
        );
        assert_eq!(
            AttemptOutcome::HttpErrorRetryable { status_code: 502 }.reason(),
            "HTTP 502"
        );
        assert_eq!(
            AttemptOutcome::TransportError(TransportError::new(ErrorKind::Timeout, "slow"))
                .reason(),
            "Timeout"
        );
    }

    #[test]
    fn transport_error_display() {
        let err = TransportError::new(ErrorKind::ConnectionFailed, "dns error");
        assert_eq!(err.to_string(), "ConnectionFailed: dns error");
    }
}
