use std::path::PathBuf;
use std::str::FromStr;

use crate::app_config::{AppConfig, Environment, ProviderKind, SearchConfig};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let defaults = SearchConfig::default();

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u32 = |var: &str, default: u32| -> Result<u32, ConfigError> {
        match lookup(var) {
            Ok(raw) => raw.trim().parse::<u32>().map_err(|e| invalid(var, e)),
            Err(_) => Ok(default),
        }
    };

    let parse_u64 = |var: &str, default: u64| -> Result<u64, ConfigError> {
        match lookup(var) {
            Ok(raw) => raw.trim().parse::<u64>().map_err(|e| invalid(var, e)),
            Err(_) => Ok(default),
        }
    };

    let parse_usize = |var: &str, default: usize| -> Result<usize, ConfigError> {
        match lookup(var) {
            Ok(raw) => raw.trim().parse::<usize>().map_err(|e| invalid(var, e)),
            Err(_) => Ok(default),
        }
    };

    let env = parse_environment(&or_default("COACHFINDER_ENV", "development"));
    let log_level = or_default("COACHFINDER_LOG_LEVEL", "info");
    let store_path = PathBuf::from(or_default(
        "COACHFINDER_STORE_PATH",
        "./.coachfinder/store.json",
    ));

    let primary_provider = match lookup("COACHFINDER_GEOCODE_PRIMARY") {
        Ok(raw) => ProviderKind::from_str(&raw)
            .map_err(|reason| invalid("COACHFINDER_GEOCODE_PRIMARY", reason))?,
        Err(_) => defaults.primary_provider,
    };

    // An explicit "none" turns the fallback off.
    let fallback_provider = match lookup("COACHFINDER_GEOCODE_FALLBACK") {
        Ok(raw) if raw.trim().eq_ignore_ascii_case("none") => None,
        Ok(raw) => Some(
            ProviderKind::from_str(&raw)
                .map_err(|reason| invalid("COACHFINDER_GEOCODE_FALLBACK", reason))?,
        ),
        Err(_) => defaults.fallback_provider,
    };

    if fallback_provider == Some(primary_provider) {
        return Err(invalid(
            "COACHFINDER_GEOCODE_FALLBACK",
            format!("fallback provider must differ from primary ({primary_provider})"),
        ));
    }

    let api_key = lookup("COACHFINDER_PLACES_API_KEY")
        .ok()
        .map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty());

    let nominatim_url = or_default("COACHFINDER_NOMINATIM_URL", &defaults.nominatim_url);
    let places_url = or_default("COACHFINDER_PLACES_URL", &defaults.places_url);
    let user_agent = or_default("COACHFINDER_USER_AGENT", &defaults.user_agent);

    let request_timeout_secs =
        parse_u64("COACHFINDER_REQUEST_TIMEOUT_SECS", defaults.request_timeout_secs)?;
    if request_timeout_secs == 0 {
        return Err(invalid(
            "COACHFINDER_REQUEST_TIMEOUT_SECS",
            "timeout must be at least 1 second",
        ));
    }

    let min_search_length =
        parse_usize("COACHFINDER_MIN_SEARCH_LENGTH", defaults.min_search_length)?;
    let debounce_ms = parse_u64("COACHFINDER_DEBOUNCE_MS", defaults.debounce_ms)?;
    let max_retries = parse_u32("COACHFINDER_MAX_RETRIES", defaults.max_retries)?;
    let retry_delay_ms = parse_u64("COACHFINDER_RETRY_DELAY_MS", defaults.retry_delay_ms)?;

    let nearby_radius_km = match lookup("COACHFINDER_NEARBY_RADIUS_KM") {
        Ok(raw) => {
            let value = raw
                .trim()
                .parse::<f64>()
                .map_err(|e| invalid("COACHFINDER_NEARBY_RADIUS_KM", e))?;
            if !value.is_finite() || value <= 0.0 {
                return Err(invalid(
                    "COACHFINDER_NEARBY_RADIUS_KM",
                    "radius must be a positive number of kilometres",
                ));
            }
            value
        }
        Err(_) => defaults.nearby_radius_km,
    };

    Ok(AppConfig {
        env,
        log_level,
        store_path,
        search: SearchConfig {
            primary_provider,
            fallback_provider,
            api_key,
            nominatim_url,
            places_url,
            user_agent,
            request_timeout_secs,
            min_search_length,
            debounce_ms,
            max_retries,
            retry_delay_ms,
            nearby_radius_km,
            ..defaults
        },
    })
}

fn invalid(var: &str, reason: impl std::fmt::Display) -> ConfigError {
    ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason: reason.to_string(),
    }
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
