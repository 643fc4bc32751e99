use crate::app_config::AppConfig;
use crate::profile::BrowserProfile;
use crate::ConfigError;

/// Load fetcher configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a variable is set to an invalid value.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load fetcher configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a variable is set to an invalid value.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build configuration using the provided env-var lookup function.
///
/// Every variable is optional; unset variables fall back to
/// [`AppConfig::default`].
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let defaults = AppConfig::default();

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u64 = |var: &str, default: u64| -> Result<u64, ConfigError> {
        match lookup(var) {
            Ok(raw) => raw.parse::<u64>().map_err(|e| invalid(var, e.to_string())),
            Err(_) => Ok(default),
        }
    };

    let log_level = lookup("FILMDIARY_LOG_LEVEL").unwrap_or(defaults.log_level);

    let impersonate = match lookup("FILMDIARY_IMPERSONATE") {
        Ok(raw) => raw
            .parse::<BrowserProfile>()
            .map_err(|e| invalid("FILMDIARY_IMPERSONATE", e.to_string()))?,
        Err(_) => defaults.impersonate,
    };

    let referer = lookup("FILMDIARY_REFERER").unwrap_or(defaults.referer);
    if !referer.starts_with("http://") && !referer.starts_with("https://") {
        return Err(invalid(
            "FILMDIARY_REFERER",
            format!("\"{referer}\" is not an http(s) URL"),
        ));
    }

    let connect_timeout_base_secs = parse_u64(
        "FILMDIARY_CONNECT_TIMEOUT_BASE_SECS",
        defaults.connect_timeout_base_secs,
    )?;
    let connect_timeout_step_secs = parse_u64(
        "FILMDIARY_CONNECT_TIMEOUT_STEP_SECS",
        defaults.connect_timeout_step_secs,
    )?;
    let total_timeout_base_secs = parse_u64(
        "FILMDIARY_TOTAL_TIMEOUT_BASE_SECS",
        defaults.total_timeout_base_secs,
    )?;
    let total_timeout_step_secs = parse_u64(
        "FILMDIARY_TOTAL_TIMEOUT_STEP_SECS",
        defaults.total_timeout_step_secs,
    )?;

    let backoff_cap_secs = match lookup("FILMDIARY_BACKOFF_CAP_SECS") {
        Ok(raw) => {
            let secs = raw
                .parse::<f64>()
                .map_err(|e| invalid("FILMDIARY_BACKOFF_CAP_SECS", e.to_string()))?;
            if !secs.is_finite() || secs < 0.0 {
                return Err(invalid(
                    "FILMDIARY_BACKOFF_CAP_SECS",
                    format!("{secs} is not a non-negative number of seconds"),
                ));
            }
            secs
        }
        Err(_) => defaults.backoff_cap_secs,
    };

    Ok(AppConfig {
        log_level,
        impersonate,
        referer,
        connect_timeout_base_secs,
        connect_timeout_step_secs,
        total_timeout_base_secs,
        total_timeout_step_secs,
        backoff_cap_secs,
    })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
