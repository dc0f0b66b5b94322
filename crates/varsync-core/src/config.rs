use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
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
/// Returns `ConfigError` if required env vars are missing or values are invalid.
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
    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let database_url = require("DATABASE_URL")?;
    let catalog_base_url = require("VARSYNC_CATALOG_BASE_URL")?;
    let catalog_api_token = lookup("VARSYNC_CATALOG_API_TOKEN")
        .ok()
        .filter(|t| !t.is_empty());

    let env = parse_environment(&or_default("VARSYNC_ENV", "development"))?;
    let log_level = or_default("VARSYNC_LOG_LEVEL", "info");

    let db_max_connections = parse_u32("VARSYNC_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("VARSYNC_DB_MIN_CONNECTIONS", "1")?;
    if db_min_connections > db_max_connections {
        return Err(invalid(
            "VARSYNC_DB_MIN_CONNECTIONS",
            format!("{db_min_connections} exceeds VARSYNC_DB_MAX_CONNECTIONS ({db_max_connections})"),
        ));
    }
    let db_acquire_timeout_secs = parse_u64("VARSYNC_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let catalog_request_timeout_secs = parse_u64("VARSYNC_CATALOG_REQUEST_TIMEOUT_SECS", "30")?;
    let catalog_user_agent = or_default("VARSYNC_CATALOG_USER_AGENT", "varsync/0.1 (catalog-sync)");
    let catalog_max_retries = parse_u32("VARSYNC_CATALOG_MAX_RETRIES", "2")?;
    let catalog_retry_backoff_base_ms = parse_u64("VARSYNC_CATALOG_RETRY_BACKOFF_BASE_MS", "500")?;

    let price_scale = or_default("VARSYNC_PRICE_SCALE", "1000")
        .parse::<i64>()
        .map_err(|e| invalid("VARSYNC_PRICE_SCALE", e.to_string()))?;
    if price_scale <= 0 {
        return Err(invalid("VARSYNC_PRICE_SCALE", "must be positive".to_string()));
    }

    let tracker_initial_interval_ms = parse_u64("VARSYNC_TRACKER_INITIAL_INTERVAL_MS", "500")?;
    let tracker_growth_factor = or_default("VARSYNC_TRACKER_GROWTH_FACTOR", "1.2")
        .parse::<f64>()
        .map_err(|e| invalid("VARSYNC_TRACKER_GROWTH_FACTOR", e.to_string()))?;
    if !tracker_growth_factor.is_finite() || tracker_growth_factor < 1.0 {
        return Err(invalid(
            "VARSYNC_TRACKER_GROWTH_FACTOR",
            format!("{tracker_growth_factor} must be a finite number >= 1.0"),
        ));
    }
    let tracker_max_interval_ms = parse_u64("VARSYNC_TRACKER_MAX_INTERVAL_MS", "3000")?;
    let tracker_max_polls = parse_u32("VARSYNC_TRACKER_MAX_POLLS", "60")?;
    if tracker_max_polls == 0 {
        return Err(invalid(
            "VARSYNC_TRACKER_MAX_POLLS",
            "must be at least 1".to_string(),
        ));
    }
    let batch_max_concurrent = parse_usize("VARSYNC_BATCH_MAX_CONCURRENT", "3")?;

    Ok(AppConfig {
        database_url,
        env,
        log_level,
        catalog_base_url,
        catalog_api_token,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        catalog_request_timeout_secs,
        catalog_user_agent,
        catalog_max_retries,
        catalog_retry_backoff_base_ms,
        price_scale,
        tracker_initial_interval_ms,
        tracker_growth_factor,
        tracker_max_interval_ms,
        tracker_max_polls,
        batch_max_concurrent,
    })
}

/// Parse a string into an `Environment` variant.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidEnvVar`] for anything other than
/// `development`, `test` or `production`.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "VARSYNC_ENV".to_string(),
            reason: format!("unknown environment \"{other}\""),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
