//! Builds, signs, submits and confirms one bridging deposit.

use crate::chain::ChainClient;
use crate::error::BridgeError;
use crate::provider::{request_call_data, BridgeApi, SwapRequest};
use anyhow::Context;
use core_logic::{with_retry, DecryptedKey, NetworkProfile, RetryConfig, SWAP_RESULT_TARGET};
use ethers::prelude::*;
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::utils::{format_ether, parse_ether};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Signing key of one source wallet.
#[derive(Clone)]
pub struct WalletCredential {
    pub wallet: LocalWallet,
    pub address: Address,
}

impl WalletCredential {
    pub fn from_private_key(key: &str) -> Result<Self, BridgeError> {
        let wallet = key
            .trim()
            .trim_start_matches("0x")
            .parse::<LocalWallet>()
            .map_err(|e| BridgeError::InvalidCredential {
                reason: e.to_string(),
            })?;
        let address = wallet.address();
        Ok(Self { wallet, address })
    }

    pub fn from_decrypted(key: &DecryptedKey) -> Result<Self, BridgeError> {
        Self::from_private_key(&key.private_key)
    }
}

impl std::fmt::Debug for WalletCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletCredential")
            .field("address", &self.address)
            .finish()
    }
}

/// Unsigned EIP-1559 deposit, priced from pending chain state.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionIntent {
    pub from: Address,
    pub to: Address,
    pub value: U256,
    pub data: Bytes,
    pub nonce: U256,
    pub max_fee_per_gas: U256,
    pub max_priority_fee_per_gas: U256,
    pub chain_id: u64,
    pub gas_limit: Option<U256>,
}

impl TransactionIntent {
    pub fn to_typed(&self) -> TypedTransaction {
        let mut tx = Eip1559TransactionRequest::new()
            .from(self.from)
            .to(self.to)
            .value(self.value)
            .data(self.data.clone())
            .nonce(self.nonce)
            .max_fee_per_gas(self.max_fee_per_gas)
            .max_priority_fee_per_gas(self.max_priority_fee_per_gas)
            .chain_id(self.chain_id);
        if let Some(gas) = self.gas_limit {
            tx = tx.gas(gas);
        }
        tx.into()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransactionOutcome {
    pub hash: TxHash,
    pub confirmed: bool,
    pub explorer_url: String,
}

/// Scale priority fee and fee cap by `multiplier`.
///
/// Returns `(max_fee_per_gas, max_priority_fee_per_gas)`. The multiplier is
/// applied in permille so the arithmetic stays in integers.
pub fn bump_fees(base_fee: U256, priority_fee: U256, multiplier: f64) -> (U256, U256) {
    let permille = U256::from((multiplier * 1000.0).round().max(0.0) as u64);
    let thousand = U256::from(1000u64);

    let priority = priority_fee * permille / thousand;
    let max_fee = (base_fee + priority_fee) * permille / thousand;
    (max_fee.max(priority), priority)
}

/// Wei value of `amount` as written in decimal, the same text the provider
/// receives in its JSON body.
pub fn eth_to_wei(amount: f64) -> Result<U256, BridgeError> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(BridgeError::InvalidConfig {
            reason: format!("amount {} is not a valid ETH value", amount),
        });
    }
    parse_ether(amount.to_string())
        .with_context(|| format!("Failed to convert {} ETH to wei", amount))
        .map_err(BridgeError::from)
}

pub fn wei_to_eth(wei: U256) -> f64 {
    format_ether(wei).parse().unwrap_or_default()
}

pub struct SwapExecutor {
    chain: Arc<dyn ChainClient>,
    api: Arc<dyn BridgeApi>,
    profile: NetworkProfile,
    deposit_contract: Address,
    fee_multiplier: f64,
    cooldown: Duration,
    retry: RetryConfig,
}

impl SwapExecutor {
    pub fn new(
        chain: Arc<dyn ChainClient>,
        api: Arc<dyn BridgeApi>,
        profile: NetworkProfile,
        deposit_contract: Address,
    ) -> Self {
        Self {
            chain,
            api,
            profile,
            deposit_contract,
            fee_multiplier: 1.2,
            cooldown: Duration::from_secs(30),
            retry: RetryConfig::default(),
        }
    }

    pub fn with_fee_multiplier(mut self, multiplier: f64) -> Self {
        self.fee_multiplier = multiplier;
        self
    }

    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Run the whole swap under the retry policy.
    ///
    /// `Ok(None)` means the provider never produced call data and the wallet
    /// was skipped.
    pub async fn execute_swap(
        &self,
        wallet: &WalletCredential,
        request: &SwapRequest,
    ) -> Result<Option<TransactionOutcome>, BridgeError> {
        with_retry(&self.retry, "swap", move || self.try_swap(wallet, request)).await
    }

    async fn try_swap(
        &self,
        wallet: &WalletCredential,
        request: &SwapRequest,
    ) -> Result<Option<TransactionOutcome>, BridgeError> {
        let call = match request_call_data(self.api.as_ref(), &self.retry, request).await {
            Ok(call) => call,
            Err(e) => {
                error!(
                    "Failed to get call data for {:?}, skipping wallet: {}",
                    wallet.address, e
                );
                return Ok(None);
            }
        };
        if let Some(to) = call.to {
            if to != self.deposit_contract {
                warn!(
                    "Provider targets {:?}, sending to configured deposit contract {:?}",
                    to, self.deposit_contract
                );
            }
        }

        let intent = self.build_intent(wallet, request.amount, call.data).await?;
        let raw = Self::sign(wallet, &intent).await?;
        let hash = self.chain.send_raw_and_wait(raw).await?;

        tokio::time::sleep(self.cooldown).await;
        let confirmed = self.confirm(hash).await;
        let explorer_url = self.profile.explorer_url(&format!("{:?}", hash));

        if confirmed {
            info!(
                target: SWAP_RESULT_TARGET,
                "SUCCESS {:?} bridged {} ETH: {}", wallet.address, request.amount, explorer_url
            );
            Ok(Some(TransactionOutcome {
                hash,
                confirmed,
                explorer_url,
            }))
        } else {
            error!(
                target: SWAP_RESULT_TARGET,
                "FAILED {:?} swap of {} ETH: {}", wallet.address, request.amount, explorer_url
            );
            Err(BridgeError::SwapFailed {
                hash: format!("{:?}", hash),
            })
        }
    }

    async fn build_intent(
        &self,
        wallet: &WalletCredential,
        amount: f64,
        data: Bytes,
    ) -> Result<TransactionIntent, BridgeError> {
        let nonce = self.chain.pending_nonce(wallet.address).await?;
        let base_fee = self.chain.gas_price().await?;
        let priority_fee = self.chain.max_priority_fee().await?;
        let chain_id = self.chain.chain_id().await?;
        let (max_fee_per_gas, max_priority_fee_per_gas) =
            bump_fees(base_fee, priority_fee, self.fee_multiplier);

        let mut intent = TransactionIntent {
            from: wallet.address,
            to: self.deposit_contract,
            value: eth_to_wei(amount)?,
            data,
            nonce,
            max_fee_per_gas,
            max_priority_fee_per_gas,
            chain_id,
            gas_limit: None,
        };
        let gas = self.chain.estimate_gas(&intent.to_typed()).await?;
        intent.gas_limit = Some(gas);
        Ok(intent)
    }

    async fn sign(wallet: &WalletCredential, intent: &TransactionIntent) -> Result<Bytes, BridgeError> {
        let signer = wallet.wallet.clone().with_chain_id(intent.chain_id);
        let tx = intent.to_typed();
        let signature = signer
            .sign_transaction(&tx)
            .await
            .context("Failed to sign transaction")?;
        Ok(tx.rlp_signed(&signature))
    }

    async fn confirm(&self, hash: TxHash) -> bool {
        match self.chain.receipt_status(hash).await {
            Ok(Some(status)) => status,
            Ok(None) => {
                warn!("Transaction {:?} not found after cooldown", hash);
                false
            }
            Err(e) => {
                error!("Receipt lookup for {:?} failed: {:#}", hash, e);
                false
            }
        }
    }
}
