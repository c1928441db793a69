//! Canned-response endpoint.
//!
//! Responses are keyed by the endpoint string exactly as authored. Params
//! are ignored. Every call is counted, including failures, so callers can
//! observe retry behavior.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use super::Endpoint;
use crate::error::EndpointError;

#[derive(Default)]
pub struct StaticEndpoint {
    responses: HashMap<String, serde_json::Value>,
    /// endpoint → number of calls that fail before responses are served
    failures: HashMap<String, usize>,
    calls: Mutex<HashMap<String, usize>>,
}

impl StaticEndpoint {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a JSON object mapping endpoint → response.
    /// Anything other than an object yields an empty endpoint.
    pub fn from_fixtures(fixtures: serde_json::Value) -> Self {
        let mut endpoint = StaticEndpoint::new();
        if let serde_json::Value::Object(map) = fixtures {
            for (name, response) in map {
                endpoint.responses.insert(name, response);
            }
        }
        endpoint
    }

    pub fn with_response(mut self, endpoint: impl Into<String>, response: serde_json::Value) -> Self {
        self.responses.insert(endpoint.into(), response);
        self
    }

    /// Make the first `count` calls to `endpoint` fail with a transport error.
    pub fn fail_first(mut self, endpoint: impl Into<String>, count: usize) -> Self {
        self.failures.insert(endpoint.into(), count);
        self
    }

    pub fn call_count(&self, endpoint: &str) -> usize {
        let calls = self.calls.lock().unwrap_or_else(PoisonError::into_inner);
        calls.get(endpoint).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        let calls = self.calls.lock().unwrap_or_else(PoisonError::into_inner);
        calls.values().sum()
    }
}

#[async_trait]
impl Endpoint for StaticEndpoint {
    async fn call(
        &self,
        endpoint: &str,
        _params: &BTreeMap<String, String>,
    ) -> Result<serde_json::Value, EndpointError> {
        let attempt = {
            let mut calls = self.calls.lock().unwrap_or_else(PoisonError::into_inner);
            let count = calls.entry(endpoint.to_string()).or_insert(0);
            *count += 1;
            *count
        };

        if attempt <= self.failures.get(endpoint).copied().unwrap_or(0) {
            return Err(EndpointError::Transport {
                endpoint: endpoint.to_string(),
                message: format!("simulated failure on call {}", attempt),
            });
        }

        self.responses
            .get(endpoint)
            .cloned()
            .ok_or_else(|| EndpointError::NotFound {
                endpoint: endpoint.to_string(),
            })
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn serves_registered_response() {
        let endpoint = StaticEndpoint::new().with_response("/search", json!({ "results": [] }));
        let value = endpoint.call("/search", &BTreeMap::new()).await.unwrap();
        assert_eq!(value, json!({ "results": [] }));
        assert_eq!(endpoint.call_count("/search"), 1);
    }

    #[tokio::test]
    async fn unknown_endpoint_is_not_found_and_counted() {
        let endpoint = StaticEndpoint::new();
        let result = endpoint.call("/missing", &BTreeMap::new()).await;
        assert!(matches!(result, Err(EndpointError::NotFound { .. })));
        assert_eq!(endpoint.call_count("/missing"), 1);
        assert_eq!(endpoint.call_count("/other"), 0);
    }

    #[tokio::test]
    async fn scripted_failures_precede_success() {
        let endpoint = StaticEndpoint::new()
            .with_response("/flaky", json!(1))
            .fail_first("/flaky", 2);
        let params = BTreeMap::new();
        assert!(endpoint.call("/flaky", &params).await.is_err());
        assert!(endpoint.call("/flaky", &params).await.is_err());
        assert_eq!(endpoint.call("/flaky", &params).await.unwrap(), json!(1));
        assert_eq!(endpoint.total_calls(), 3);
    }

    #[test]
    fn fixtures_from_json_object() {
        let endpoint = StaticEndpoint::from_fixtures(json!({ "/a": 1, "/b": { "x": true } }));
        assert_eq!(endpoint.responses.len(), 2);
        assert!(StaticEndpoint::from_fixtures(json!([1, 2])).responses.is_empty());
    }
}
