//! Configuration loading and resolution.

use serde_json::{Map, Value};

use hyperform::ClientConfig;

/// Environment variable consulted when `--base-url` is absent.
pub const BASE_URL_ENV: &str = "HYPERFORM_BASE_URL";

/// Environment variable consulted when `--token` is absent.
pub const TOKEN_ENV: &str = "HYPERFORM_TOKEN";

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("no base URL: pass --base-url or set {BASE_URL_ENV}")]
    MissingBaseUrl,

    #[error("invalid header {0:?}: expected NAME:VALUE")]
    InvalidHeader(String),

    #[error("invalid parameter {0:?}: expected KEY=VALUE")]
    InvalidParam(String),

    #[error("invalid --data: {0}")]
    InvalidData(String),
}

/// Resolve the API base URL: flag > env var.
pub fn resolve_base_url(explicit: Option<&str>) -> Result<String, ConfigError> {
    resolve_base_url_from(explicit, std::env::var(BASE_URL_ENV).ok())
}

fn resolve_base_url_from(explicit: Option<&str>, env: Option<String>) -> Result<String, ConfigError> {
    explicit
        .map(str::to_string)
        .or(env)
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty())
        .ok_or(ConfigError::MissingBaseUrl)
}

/// Resolve the bearer token: flag > env var.
pub fn resolve_token(explicit: Option<&str>) -> Option<String> {
    explicit
        .map(str::to_string)
        .or_else(|| std::env::var(TOKEN_ENV).ok())
        .filter(|t| !t.is_empty())
}

/// Parse `NAME:VALUE`. Whitespace around both parts is dropped.
pub fn parse_header(raw: &str) -> Result<(String, String), ConfigError> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| ConfigError::InvalidHeader(raw.to_string()))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(ConfigError::InvalidHeader(raw.to_string()));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

/// Parse `KEY=VALUE`. The value is read as JSON when it parses, else as a string.
pub fn parse_param(raw: &str) -> Result<(String, Value), ConfigError> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| ConfigError::InvalidParam(raw.to_string()))?;
    if key.is_empty() {
        return Err(ConfigError::InvalidParam(raw.to_string()));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

/// Parse the `--data` argument. Absent means an empty object.
pub fn parse_data(raw: Option<&str>) -> Result<Map<String, Value>, ConfigError> {
    let Some(raw) = raw else {
        return Ok(Map::new());
    };
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(ConfigError::InvalidData("expected a JSON object".to_string())),
        Err(e) => Err(ConfigError::InvalidData(e.to_string())),
    }
}

/// Build the client configuration from resolved CLI inputs.
pub fn build_client_config(
    base_url: String,
    headers: &[String],
    timeout_ms: Option<u64>,
    token: Option<String>,
) -> Result<ClientConfig, ConfigError> {
    let mut config = ClientConfig::new(base_url);
    if let Some(timeout_ms) = timeout_ms {
        config = config.with_timeout_ms(timeout_ms);
    }
    if let Some(token) = token {
        config = config.with_header("Authorization", format!("Bearer {token}"));
    }
    for raw in headers {
        let (name, value) = parse_header(raw)?;
        config = config.with_header(name, value);
    }
    Ok(config)
}
