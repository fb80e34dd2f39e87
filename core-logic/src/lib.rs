//! # Core Logic - Shared Utilities for Bridge Runners
//!
//! This crate provides the chain-agnostic pieces used by the bridge runners
//! under `chains/`.
//!
//! ## Modules
//!
//! - [`config`] - Network profiles and shortcut resolution
//! - [`error`] - Typed error handling with thiserror
//! - [`security`] - Key encryption and decryption
//! - [`traits`] - Core trait definitions
//! - `utils` - Logger, retry, RPC selection, key-file loading

pub mod config;
pub mod error;
pub mod security;
pub mod traits;
pub(crate) mod utils;

pub use config::{NetworkOverride, NetworkProfile, NetworkTable};
pub use error::{ConfigError, CoreError, NetworkError, SecurityError, WalletError};
pub use security::SecurityUtils;
pub use traits::EndpointProbe;

// Utils are pub(crate) - only export specific public utilities
pub use utils::{
    select_endpoint, setup_logger, DecryptedKey, JsonRpcProbe, RpcManager,
    WalletManager, SWAP_RESULT_TARGET,
};

pub use utils::retry::{with_retry, RetryConfig};
