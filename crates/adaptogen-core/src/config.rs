use crate::app_config::AppConfig;
use crate::ConfigError;

pub const DEFAULT_PORT: &str = "245";
pub const DEFAULT_REDIS_URL: &str = "redis://redis:6379";
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 1024 * 1024;

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
    use std::net::{IpAddr, SocketAddr};

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let host = or_default("ADAPTOGEN_BIND_HOST", "0.0.0.0")
        .parse::<IpAddr>()
        .map_err(|e| invalid("ADAPTOGEN_BIND_HOST", e.to_string()))?;
    let port = or_default("PORT", DEFAULT_PORT)
        .parse::<u16>()
        .map_err(|e| invalid("PORT", e.to_string()))?;

    let redis_url = or_default("REDIS_URL", DEFAULT_REDIS_URL);
    if redis_url.trim().is_empty() {
        return Err(invalid("REDIS_URL", "must not be empty".to_string()));
    }

    let log_level = or_default("ADAPTOGEN_LOG_LEVEL", "info");

    let max_output_bytes = or_default(
        "ADAPTOGEN_MAX_OUTPUT_BYTES",
        &DEFAULT_MAX_OUTPUT_BYTES.to_string(),
    )
    .parse::<usize>()
    .map_err(|e| invalid("ADAPTOGEN_MAX_OUTPUT_BYTES", e.to_string()))?;
    if max_output_bytes == 0 {
        return Err(invalid(
            "ADAPTOGEN_MAX_OUTPUT_BYTES",
            "must be greater than zero".to_string(),
        ));
    }

    let shell = or_default("ADAPTOGEN_SHELL", "/bin/sh");

    Ok(AppConfig {
        redis_url,
        bind_addr: SocketAddr::new(host, port),
        log_level,
        max_output_bytes,
        shell,
    })
}
