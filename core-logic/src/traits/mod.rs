use crate::error::NetworkError;
use async_trait::async_trait;

/// Liveness check for a single RPC endpoint.
#[async_trait]
pub trait EndpointProbe: Send + Sync {
    /// Returns the client version reported by the node.
    async fn probe(&self, url: &str) -> Result<String, NetworkError>;
}
