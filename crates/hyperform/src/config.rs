//! Construction-time client configuration.
//!
//! The host application builds a [`ClientConfig`] (by hand or by deserializing
//! its own settings file). Nothing in this crate reads the environment.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Default request timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Whether cookies are stored and sent with requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Credentials {
    #[default]
    Include,
    Omit,
}

/// Settings for a [`Transport`](crate::transport::Transport).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Prefix for relative request paths.
    pub base_url: String,
    pub timeout_ms: u64,
    /// Headers sent with every request; per-call headers win on conflict.
    pub default_headers: BTreeMap<String, String>,
    pub credentials: Credentials,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            default_headers: BTreeMap::new(),
            credentials: Credentials::Include,
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.insert(name.into(), value.into());
        self
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }
}
