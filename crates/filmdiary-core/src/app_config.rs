use crate::profile::BrowserProfile;

/// Runtime settings for the page fetcher, read from `FILMDIARY_*` env vars.
///
/// Timeout and backoff fields are in whole seconds; the fetch engine turns
/// them into its own schedule types.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub log_level: String,
    pub impersonate: BrowserProfile,
    pub referer: String,
    pub connect_timeout_base_secs: u64,
    pub connect_timeout_step_secs: u64,
    pub total_timeout_base_secs: u64,
    pub total_timeout_step_secs: u64,
    pub backoff_cap_secs: f64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_owned(),
            impersonate: BrowserProfile::Chrome,
            referer: "https://letterboxd.com/".to_owned(),
            connect_timeout_base_secs: 10,
            connect_timeout_step_secs: 2,
            total_timeout_base_secs: 30,
            total_timeout_step_secs: 5,
            backoff_cap_secs: 45.0,
        }
    }
}
