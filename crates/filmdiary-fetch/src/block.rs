//! Anti-bot block detection.
//!
//! Distinguishes a bot-mitigation response (challenge page, CAPTCHA,
//! vendor-issued 403/429/503) from an ordinary HTTP error. Pure: looks only at
//! the status, headers and body of a response already in memory.

use crate::types::HttpResponse;

/// Which rule flagged a response as blocked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockReason {
    /// A mitigation vendor's own header (e.g. `cf-ray`) is present.
    VendorHeader,
    /// The `Server` header names a mitigation vendor.
    ServerHeader,
    /// Plain 403 on a retryable status with no other evidence.
    ForbiddenStatus,
    /// 403 body contains challenge or verification phrasing.
    BodyKeyword,
}

impl BlockReason {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            BlockReason::VendorHeader => "vendor header",
            BlockReason::ServerHeader => "server header",
            BlockReason::ForbiddenStatus => "forbidden status",
            BlockReason::BodyKeyword => "body keyword",
        }
    }
}

#[derive(Debug, Clone)]
pub struct BlockDetector {
    /// Statuses a mitigation layer answers with.
    pub retryable_statuses: Vec<u16>,
    /// Header names whose mere presence identifies the vendor. Matched
    /// against lowercase header names.
    pub vendor_headers: Vec<String>,
    /// Lowercase substrings looked for in the `Server` header value.
    pub server_markers: Vec<String>,
    /// Lowercase phrases looked for in the body of a 403.
    pub body_keywords: Vec<String>,
}

impl Default for BlockDetector {
    fn default() -> Self {
        let owned =
            |items: &[&str]| -> Vec<String> { items.iter().map(|s| (*s).to_owned()).collect() };
        Self {
            retryable_statuses: vec![403, 429, 503],
            vendor_headers: owned(&["cf-ray", "cf-cache-status", "cf-mitigated"]),
            server_markers: owned(&["cloudflare"]),
            body_keywords: owned(&[
                "cloudflare",
                "security challenge",
                "checking your browser",
                "verify you are human",
                "captcha",
                "access denied",
                "permission denied",
                "ddos protection",
            ]),
        }
    }
}

impl BlockDetector {
    #[must_use]
    pub fn is_blocked(&self, response: &HttpResponse) -> bool {
        self.classify(response).is_some()
    }

    /// Returns the first matching rule, or `None` for an ordinary response.
    #[must_use]
    pub fn classify(&self, response: &HttpResponse) -> Option<BlockReason> {
        let status = response.status;

        if self.retryable_statuses.contains(&status) {
            if self
                .vendor_headers
                .iter()
                .any(|name| response.headers.contains_key(name.as_str()))
            {
                return Some(BlockReason::VendorHeader);
            }
            let server = response.header("server").unwrap_or_default();
            if self
                .server_markers
                .iter()
                .any(|marker| contains_ignore_ascii_case(server, marker))
            {
                return Some(BlockReason::ServerHeader);
            }
            if status == 403 {
                return Some(BlockReason::ForbiddenStatus);
            }
        }

        if status == 403
            && self
                .body_keywords
                .iter()
                .any(|keyword| contains_ignore_ascii_case(&response.body, keyword))
        {
            return Some(BlockReason::BodyKeyword);
        }

        None
    }
}

/// ASCII case-insensitive substring search without allocating.
fn contains_ignore_ascii_case(haystack: &str, needle: &str) -> bool {
    let needle = needle.as_bytes();
    if needle.is_empty() {
        return true;
    }
    haystack
        .as_bytes()
        .windows(needle.len())
        .any(|window| window.eq_ignore_ascii_case(needle))
}
