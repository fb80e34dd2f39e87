//! # Utilities Module
//!
//! Internal utility modules for the core-logic crate.
//! These modules are marked as `pub(crate)` to enforce API boundaries.

pub(crate) mod logger;
pub(crate) mod retry;
pub(crate) mod rpc_manager;
pub(crate) mod wallet_manager;

// Selective exports - only public utilities
pub use logger::{setup_logger, SWAP_RESULT_TARGET};
pub use rpc_manager::{select_endpoint, JsonRpcProbe, RpcManager};
pub use wallet_manager::{DecryptedKey, WalletManager};
