//! Named browser impersonation profiles.
//!
//! A profile selects the browser-identifying headers sent with every request:
//! the `User-Agent` string plus the client-hint and fetch-metadata headers the
//! real browser attaches to a top-level navigation.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BrowserProfile {
    #[default]
    Chrome,
    Edge,
    Firefox,
    Safari,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown impersonation profile \"{0}\" (expected chrome, edge, firefox or safari)")]
pub struct UnknownProfile(pub String);

const CHROME_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
(KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";
const EDGE_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
(KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36 Edg/124.0.0.0";
const FIREFOX_UA: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0";
const SAFARI_UA: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 \
(KHTML, like Gecko) Version/17.4 Safari/605.1.15";

const NAVIGATION_HEADERS: [(&str, &str); 4] = [
    ("sec-fetch-dest", "document"),
    ("sec-fetch-mode", "navigate"),
    ("sec-fetch-site", "none"),
    ("sec-fetch-user", "?1"),
];

impl BrowserProfile {
    pub const ALL: [BrowserProfile; 4] = [
        BrowserProfile::Chrome,
        BrowserProfile::Edge,
        BrowserProfile::Firefox,
        BrowserProfile::Safari,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            BrowserProfile::Chrome => "chrome",
            BrowserProfile::Edge => "edge",
            BrowserProfile::Firefox => "firefox",
            BrowserProfile::Safari => "safari",
        }
    }

    #[must_use]
    pub fn user_agent(self) -> &'static str {
        match self {
            BrowserProfile::Chrome => CHROME_UA,
            BrowserProfile::Edge => EDGE_UA,
            BrowserProfile::Firefox => FIREFOX_UA,
            BrowserProfile::Safari => SAFARI_UA,
        }
    }

    /// Headers the browser sends alongside its `User-Agent` on a navigation.
    ///
    /// Chromium-based profiles add `sec-ch-ua*` client hints; Firefox and
    /// Safari never send them.
    #[must_use]
    pub fn identity_headers(self) -> Vec<(&'static str, &'static str)> {
        let mut headers = match self {
            BrowserProfile::Chrome => vec![
                (
                    "sec-ch-ua",
                    "\"Chromium\";v=\"124\", \"Google Chrome\";v=\"124\", \"Not-A.Brand\";v=\"99\"",
                ),
                ("sec-ch-ua-mobile", "?0"),
                ("sec-ch-ua-platform", "\"Windows\""),
            ],
            BrowserProfile::Edge => vec![
                (
                    "sec-ch-ua",
                    "\"Chromium\";v=\"124\", \"Microsoft Edge\";v=\"124\", \"Not-A.Brand\";v=\"99\"",
                ),
                ("sec-ch-ua-mobile", "?0"),
                ("sec-ch-ua-platform", "\"Windows\""),
            ],
            BrowserProfile::Firefox | BrowserProfile::Safari => Vec::new(),
        };
        headers.extend(NAVIGATION_HEADERS);
        headers
    }
}

impl fmt::Display for BrowserProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BrowserProfile {
    type Err = UnknownProfile;

    /// Case-insensitive; trailing version suffixes such as `chrome124` or
    /// `safari_17.4` select the base profile.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        let family = normalized
            .trim_end_matches(|c: char| c.is_ascii_digit() || c == '_' || c == '.' || c == '-');
        BrowserProfile::ALL
            .into_iter()
            .find(|profile| profile.name() == family)
            .ok_or_else(|| UnknownProfile(s.to_owned()))
    }
}
