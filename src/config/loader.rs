//! Configuration loading from environment variables.
//!
//! Backends are declared as indexed variable groups
//! (`GATEWAY_BACKEND_1_URL`, `GATEWAY_BACKEND_1_PRIORITY`, ...); the key set
//! is merged from a single value, a comma-delimited list, and indexed
//! entries. Every value is trimmed before use.

use std::collections::HashMap;

use thiserror::Error;

use crate::config::schema::{BackendConfig, GatewayConfig};

/// Prefix shared by every gateway environment variable.
pub const ENV_PREFIX: &str = "GATEWAY";

/// Highest backend ordinal scanned. Indices may be sparse below this.
const MAX_BACKEND_INDEX: usize = 64;

/// Highest indexed API-key ordinal scanned.
const MAX_KEY_INDEX: usize = 32;

/// Error type for configuration loading. Every variant is fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no upstream backends configured (set {ENV_PREFIX}_BACKEND_1_URL)")]
    NoBackends,

    #[error("backend {index} declares settings but no {ENV_PREFIX}_BACKEND_{index}_URL")]
    MissingUrl { index: usize },

    #[error("invalid value {value:?} for {key}")]
    InvalidValue { key: String, value: String },

    #[error("invalid URL {url:?} for backend {name}: {source}")]
    InvalidUrl {
        name: String,
        url: String,
        source: url::ParseError,
    },

    #[error("duplicate backend identity {name:?}")]
    DuplicateBackend { name: String },
}

/// Load and validate gateway configuration from the process environment.
pub fn load_from_env() -> Result<GatewayConfig, ConfigError> {
    load_from_vars(std::env::vars())
}

/// Load configuration from an explicit set of key/value pairs.
///
/// Split out from [`load_from_env`] so tests can inject environments
/// without mutating process state.
pub fn load_from_vars<I>(vars: I) -> Result<GatewayConfig, ConfigError>
where
    I: IntoIterator<Item = (String, String)>,
{
    let vars: HashMap<String, String> = vars.into_iter().collect();
    let mut config = GatewayConfig::default();

    if let Some(addr) = get(&vars, "BIND_ADDRESS") {
        config.listener.bind_address = addr;
    }

    config.backends = parse_backends(&vars)?;
    config.auth.keys = parse_keys(&vars);

    if let Some(raw) = get(&vars, "AUTH_MAX_FAILURES") {
        config.auth.max_failures = parse_num(key("AUTH_MAX_FAILURES"), &raw)?;
    }
    if let Some(raw) = get(&vars, "AUTH_LOCKOUT_SECS") {
        config.auth.lockout_secs = parse_num(key("AUTH_LOCKOUT_SECS"), &raw)?;
    }
    if let Some(raw) = get(&vars, "COOLDOWN_SECS") {
        config.health.default_cooldown_secs = parse_num(key("COOLDOWN_SECS"), &raw)?;
    }
    if let Some(raw) = get(&vars, "REQUEST_TIMEOUT_SECS") {
        config.timeouts.request_secs = parse_num(key("REQUEST_TIMEOUT_SECS"), &raw)?;
    }
    if let Some(raw) = get(&vars, "MAX_BODY_BYTES") {
        config.http.max_body_bytes = parse_num(key("MAX_BODY_BYTES"), &raw)?;
    }
    if let Some(path) = get(&vars, "HEALTH_PATH") {
        config.http.health_path = path;
    }
    if let Some(level) = get(&vars, "LOG_LEVEL") {
        config.observability.log_level = level;
    }
    if let Some(raw) = get(&vars, "METRICS_ENABLED") {
        config.observability.metrics_enabled = parse_bool(key("METRICS_ENABLED"), &raw)?;
    }
    if let Some(addr) = get(&vars, "METRICS_ADDRESS") {
        config.observability.metrics_address = addr;
    }

    Ok(config)
}

fn key(suffix: &str) -> String {
    format!("{ENV_PREFIX}_{suffix}")
}

/// Fetch a trimmed, non-empty variable value.
fn get(vars: &HashMap<String, String>, suffix: &str) -> Option<String> {
    vars.get(&key(suffix))
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_num<T: std::str::FromStr>(key: String, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: value.to_string(),
    })
}

fn parse_bool(key: String, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: value.to_string(),
        }),
    }
}

/// Scan indexed backend variable groups in ordinal order.
///
/// A group with any variable set but no URL is a configuration error rather
/// than a silently dropped backend.
fn parse_backends(vars: &HashMap<String, String>) -> Result<Vec<BackendConfig>, ConfigError> {
    let mut backends = Vec::new();

    for index in 1..=MAX_BACKEND_INDEX {
        let url = get(vars, &format!("BACKEND_{index}_URL"));
        let priority = get(vars, &format!("BACKEND_{index}_PRIORITY"));
        let api_key = get(vars, &format!("BACKEND_{index}_APIKEY"));
        let deployment = get(vars, &format!("BACKEND_{index}_DEPLOYMENT_NAME"));

        let Some(url) = url else {
            if priority.is_some() || api_key.is_some() || deployment.is_some() {
                return Err(ConfigError::MissingUrl { index });
            }
            continue;
        };

        let priority = match priority {
            Some(raw) => parse_num(key(&format!("BACKEND_{index}_PRIORITY")), &raw)?,
            None => 1,
        };

        backends.push(BackendConfig {
            name: format!("backend-{index}"),
            url,
            priority,
            api_key,
            deployment,
        });
    }

    Ok(backends)
}

/// Merge the three key sources into one deduplicated set, preserving first
/// occurrence order.
fn parse_keys(vars: &HashMap<String, String>) -> Vec<String> {
    let mut keys: Vec<String> = Vec::new();

    let mut push = |raw: &str| {
        let trimmed = raw.trim();
        if !trimmed.is_empty() && !keys.iter().any(|k| k == trimmed) {
            keys.push(trimmed.to_string());
        }
    };

    if let Some(single) = vars.get(&key("API_KEY")) {
        push(single);
    }
    if let Some(list) = vars.get(&key("API_KEYS")) {
        for part in list.split(',') {
            push(part);
        }
    }
    for index in 1..=MAX_KEY_INDEX {
        if let Some(indexed) = vars.get(&key(&format!("API_KEY_{index}"))) {
            push(indexed);
        }
    }

    keys
}
