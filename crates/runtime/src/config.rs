//! Runtime configuration.
//!
//! Every field has a default, so an empty file (or no file at all) yields
//! the stock behavior: three `api` attempts two seconds apart, a two second
//! pause between `sequence` steps, and relative endpoints joined against the
//! iTunes Search API.
//!
//! # Example
//!
//! ```toml
//! [endpoint]
//! base_url = "https://itunes.apple.com"
//! timeout_secs = 30
//!
//! [documents]
//! root = "resources"
//!
//! [dispatch]
//! max_attempts = 3
//! retry_backoff_ms = 2000
//! sequence_delay_ms = 2000
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const AUTH_TOKEN_ENV: &str = "TESSERA_ENDPOINT_AUTH_TOKEN";
pub const BASE_URL_ENV: &str = "TESSERA_ENDPOINT_BASE_URL";

// ── Types ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub endpoint: EndpointSettings,
    pub documents: DocumentSettings,
    pub dispatch: DispatchSettings,
}

/// `[endpoint]` section, consumed by [`HttpEndpoint`](crate::endpoint::HttpEndpoint).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointSettings {
    /// Prefix for relative endpoint paths such as `/search`.
    pub base_url: String,
    pub timeout_secs: u64,
    /// Sent as a bearer token. Falls back to `TESSERA_ENDPOINT_AUTH_TOKEN`.
    pub auth_token: Option<String>,
}

/// `[documents]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentSettings {
    /// Directory holding `<name>.json` screen, theme and component files.
    pub root: PathBuf,
}

/// `[dispatch]` section, consumed by [`ActionDispatcher`](crate::ActionDispatcher).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchSettings {
    pub max_attempts: u32,
    pub retry_backoff_ms: u64,
    pub sequence_delay_ms: u64,
}

impl Default for EndpointSettings {
    fn default() -> Self {
        EndpointSettings {
            base_url: "https://itunes.apple.com".to_string(),
            timeout_secs: 30,
            auth_token: None,
        }
    }
}

impl Default for DocumentSettings {
    fn default() -> Self {
        DocumentSettings {
            root: PathBuf::from("."),
        }
    }
}

impl Default for DispatchSettings {
    fn default() -> Self {
        DispatchSettings {
            max_attempts: 3,
            retry_backoff_ms: 2000,
            sequence_delay_ms: 2000,
        }
    }
}

// ── Functions ─────────────────────────────────────────────────────────────────

impl RuntimeConfig {
    /// Read and parse a TOML config file. Missing sections take defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply `TESSERA_ENDPOINT_BASE_URL` and, when no token is configured,
    /// `TESSERA_ENDPOINT_AUTH_TOKEN`.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(base_url) = std::env::var(BASE_URL_ENV) {
            if !base_url.is_empty() {
                self.endpoint.base_url = base_url;
            }
        }
        if self.endpoint.auth_token.is_none() {
            self.endpoint.auth_token = std::env::var(AUTH_TOKEN_ENV).ok();
        }
        self
    }
}

impl EndpointSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl DispatchSettings {
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    pub fn sequence_delay(&self) -> Duration {
        Duration::from_millis(self.sequence_delay_ms)
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
