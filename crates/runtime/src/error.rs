//! Host and infrastructure errors.
//!
//! Author mistakes inside documents never reach these types; they degrade to
//! no-ops in the dispatcher and to absent values in the core. What remains
//! is what the host environment can get wrong: transport, files, config.

use std::path::PathBuf;

// ──────────────────────────────────────────────
// EndpointError
// ──────────────────────────────────────────────

/// A failed call through an [`Endpoint`](crate::endpoint::Endpoint).
///
/// Every variant is treated as transient by the `api` action: the dispatcher
/// retries regardless of which one it sees.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EndpointError {
    /// The endpoint could not be turned into a request URL.
    #[error("invalid endpoint url '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    /// The request failed on the wire or returned an error status.
    #[error("request to '{endpoint}' failed: {message}")]
    Transport { endpoint: String, message: String },

    /// The response body was not JSON.
    #[error("response from '{endpoint}' is not valid JSON: {message}")]
    Decode { endpoint: String, message: String },

    /// No canned response is registered for this endpoint.
    #[error("no response registered for endpoint '{endpoint}'")]
    NotFound { endpoint: String },

    /// The blocking worker running the request panicked or was cancelled.
    #[error("endpoint task failed: {message}")]
    Join { message: String },
}

// ──────────────────────────────────────────────
// DocumentError
// ──────────────────────────────────────────────

/// A failure loading a named document from a
/// [`DocumentSource`](crate::source::DocumentSource).
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// No document with this name exists. Recoverable: callers usually
    /// treat it as "feature not present".
    #[error("document '{name}' not found")]
    NotFound { name: String },

    #[error("failed to read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("document '{name}' is malformed: {source}")]
    Decode {
        name: String,
        #[source]
        source: serde_json::Error,
    },
}

impl DocumentError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, DocumentError::NotFound { .. })
    }
}

// ──────────────────────────────────────────────
// ConfigError
// ──────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
