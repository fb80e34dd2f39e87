//! Error taxonomy of a bridge campaign.
//!
//! Run-level variants (`InvalidConfig`, `CredentialMismatch`, `Network`,
//! `Config`) abort the campaign before any wallet is processed. The rest are
//! caught per wallet by the campaign driver.

use core_logic::{ConfigError, CoreError, NetworkError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Invalid swap configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("Insufficient balance on wallet. Required: {required} ETH, Available: {available} ETH")]
    InsufficientBalance { required: f64, available: f64 },

    #[error("Number of private keys ({wallets}) does not match number of addresses ({addresses})")]
    CredentialMismatch { wallets: usize, addresses: usize },

    #[error("Invalid wallet credential: {reason}")]
    InvalidCredential { reason: String },

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("Swap transaction {hash} failed on-chain or was not found")]
    SwapFailed { hash: String },

    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Chain(#[from] anyhow::Error),
}

impl BridgeError {
    /// Whether this error aborts the whole campaign.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            BridgeError::InvalidConfig { .. }
                | BridgeError::CredentialMismatch { .. }
                | BridgeError::Network(NetworkError::NoHealthyEndpoint { .. })
                | BridgeError::Config(_)
                | BridgeError::Core(_)
        )
    }
}

/// Failures calling the bridging provider. All of them are retryable.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    #[error("Request error: {0}")]
    Request(String),

    #[error("HTTP error {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Unexpected response structure: {0}")]
    MalformedResponse(String),
}
