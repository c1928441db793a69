//! HTTP endpoint: issues GET requests and decodes the body as JSON.
//!
//! Uses `ureq` (sync) wrapped in `tokio::task::spawn_blocking` so the
//! dispatcher's async flow is never blocked on the network.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use super::Endpoint;
use crate::config::EndpointSettings;
use crate::error::EndpointError;

/// Endpoint backed by real HTTP requests.
///
/// - Absolute endpoints (`http…`) are used as-is.
/// - Relative endpoints are appended to `base_url`: `/search` becomes
///   `{base_url}/search`.
/// - Params are sent as query items in both cases.
pub struct HttpEndpoint {
    base_url: String,
    auth_token: Option<String>,
    timeout: Duration,
}

impl HttpEndpoint {
    pub fn new(base_url: impl Into<String>) -> Self {
        HttpEndpoint {
            base_url: base_url.into(),
            auth_token: None,
            timeout: Duration::from_secs(30),
        }
    }

    pub fn from_settings(settings: &EndpointSettings) -> Self {
        HttpEndpoint {
            base_url: settings.base_url.clone(),
            auth_token: settings.auth_token.clone(),
            timeout: settings.timeout(),
        }
    }

    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The request URL for an endpoint, before query params are added.
    ///
    /// `/search` → `{base_url}/search`, `search` → `{base_url}/search`.
    pub fn target_url(&self, endpoint: &str) -> Result<String, EndpointError> {
        if endpoint.starts_with("http") {
            return Ok(endpoint.to_string());
        }
        if self.base_url.is_empty() {
            return Err(EndpointError::InvalidUrl {
                url: endpoint.to_string(),
                message: "relative endpoint with no base_url configured".to_string(),
            });
        }
        let base = self.base_url.trim_end_matches('/');
        let path = endpoint.trim_start_matches('/');
        Ok(format!("{}/{}", base, path))
    }
}

#[async_trait]
impl Endpoint for HttpEndpoint {
    async fn call(
        &self,
        endpoint: &str,
        params: &BTreeMap<String, String>,
    ) -> Result<serde_json::Value, EndpointError> {
        let url = self.target_url(endpoint)?;
        debug!(url = %url, params = params.len(), "http endpoint request");

        let params = params.clone();
        let auth_token = self.auth_token.clone();
        let timeout = self.timeout;
        let endpoint_name = endpoint.to_string();

        let result = tokio::task::spawn_blocking(move || {
            let config = ureq::Agent::config_builder()
                .timeout_global(Some(timeout))
                .build();
            let agent = ureq::Agent::new_with_config(config);
            let mut request = agent.get(&url);

            for (key, value) in &params {
                request = request.query(key, value);
            }
            if let Some(ref token) = auth_token {
                request = request.header("Authorization", &format!("Bearer {}", token));
            }

            let response = request.call().map_err(|e| EndpointError::Transport {
                endpoint: endpoint_name.clone(),
                message: e.to_string(),
            })?;

            let value: serde_json::Value =
                response
                    .into_body()
                    .read_json()
                    .map_err(|e| EndpointError::Decode {
                        endpoint: endpoint_name,
                        message: e.to_string(),
                    })?;

            Ok(value)
        })
        .await
        .map_err(|e| EndpointError::Join {
            message: e.to_string(),
        })?;

        result
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
