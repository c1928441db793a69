//! Endpoint collaborator for `api` actions.
//!
//! The dispatcher only knows the contract "named endpoint plus string-keyed
//! params in, arbitrary JSON out". [`HttpEndpoint`] fulfils it over the
//! network; [`StaticEndpoint`] serves canned responses for tests and
//! fixture-driven CLI runs.

pub mod http;
pub mod static_endpoint;

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::error::EndpointError;

pub use http::HttpEndpoint;
pub use static_endpoint::StaticEndpoint;

/// Calls a named endpoint and returns its decoded JSON body.
///
/// `endpoint` is either an absolute `http…` URL or a path relative to an
/// implementation-owned base. Any error is treated as transient by the
/// caller and may be retried, so implementations must be re-entrant.
#[async_trait]
pub trait Endpoint: Send + Sync {
    async fn call(
        &self,
        endpoint: &str,
        params: &BTreeMap<String, String>,
    ) -> Result<serde_json::Value, EndpointError>;
}
