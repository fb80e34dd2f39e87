//! # Core Logic - RPC Manager
//!
//! Picks the first responsive RPC endpoint of a network profile. Probing is
//! chain-agnostic: any node answering `web3_clientVersion` counts as alive.

use crate::config::NetworkProfile;
use crate::error::NetworkError;
use crate::traits::EndpointProbe;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Probes endpoints in profile order and stops at the first healthy one.
pub struct RpcManager<'a> {
    profile: &'a NetworkProfile,
    probe: &'a dyn EndpointProbe,
}

impl<'a> RpcManager<'a> {
    pub fn new(profile: &'a NetworkProfile, probe: &'a dyn EndpointProbe) -> Self {
        Self { profile, probe }
    }

    /// Get the first healthy endpoint URL, without probing past it.
    pub async fn select_endpoint(&self) -> Result<String, NetworkError> {
        let mut tried = 0;

        for url in &self.profile.rpc_urls {
            tried += 1;
            if self.check_endpoint(url).await {
                return Ok(url.clone());
            }
        }

        warn!("No working RPC found for {} ({} tried)", self.profile.id, tried);
        Err(NetworkError::NoHealthyEndpoint {
            network: self.profile.id.clone(),
            tried,
        })
    }

    async fn check_endpoint(&self, url: &str) -> bool {
        let start = Instant::now();
        let result = self.probe.probe(url).await;
        let latency_ms = start.elapsed().as_millis();

        match result {
            Ok(version) => {
                info!("RPC {} is working ({}, {}ms)", url, version, latency_ms);
                true
            }
            Err(e) => {
                warn!("RPC {} is unhealthy ({}ms): {}", url, latency_ms, e);
                false
            }
        }
    }
}

/// Shorthand for a one-off selection.
pub async fn select_endpoint(
    profile: &NetworkProfile,
    probe: &dyn EndpointProbe,
) -> Result<String, NetworkError> {
    RpcManager::new(profile, probe).select_endpoint().await
}

/// `web3_clientVersion` probe over HTTP with a per-request timeout.
pub struct JsonRpcProbe {
    client: Client,
    request_timeout: Duration,
}

impl JsonRpcProbe {
    pub fn new(timeout_ms: u64) -> Self {
        Self::with_client(Client::new(), timeout_ms)
    }

    pub fn with_client(client: Client, timeout_ms: u64) -> Self {
        Self {
            client,
            request_timeout: Duration::from_millis(timeout_ms),
        }
    }

    /// Get the request timeout
    pub fn timeout(&self) -> Duration {
        self.request_timeout
    }
}

impl Default for JsonRpcProbe {
    fn default() -> Self {
        Self::new(10_000)
    }
}

#[async_trait]
impl EndpointProbe for JsonRpcProbe {
    async fn probe(&self, url: &str) -> Result<String, NetworkError> {
        let payload = json!({
            "jsonrpc": "2.0",
            "method": "web3_clientVersion",
            "params": [],
            "id": 1
        });

        let response = self
            .client
            .post(url)
            .timeout(self.request_timeout)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    NetworkError::Timeout {
                        timeout_ms: self.request_timeout.as_millis() as u64,
                        endpoint: url.to_string(),
                    }
                } else {
                    NetworkError::ConnectionFailed {
                        endpoint: url.to_string(),
                        reason: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(NetworkError::HttpError {
                status_code: status.as_u16(),
                endpoint: url.to_string(),
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| NetworkError::InvalidResponse {
                endpoint: url.to_string(),
                reason: e.to_string(),
            })?;

        parse_client_version(url, &body)
    }
}

/// Extract `result` from a JSON-RPC reply, rejecting `error` members.
pub fn parse_client_version(url: &str, body: &Value) -> Result<String, NetworkError> {
    if let Some(err) = body.get("error") {
        return Err(NetworkError::InvalidResponse {
            endpoint: url.to_string(),
            reason: format!("RPC error: {}", err),
        });
    }

    match body.get("result") {
        Some(Value::String(version)) => Ok(version.clone()),
        Some(other) => Ok(other.to_string()),
        None => Err(NetworkError::InvalidResponse {
            endpoint: url.to_string(),
            reason: format!("missing result field: {}", body),
        }),
    }
}
