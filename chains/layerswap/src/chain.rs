//! On-chain access for the source network.

use anyhow::{Context, Result};
use async_trait::async_trait;
use ethers::prelude::*;
use ethers::types::transaction::eip2718::TypedTransaction;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Everything the swap flow reads from or writes to the source chain.
#[async_trait]
pub trait ChainClient: Send + Sync {
    async fn chain_id(&self) -> Result<u64>;

    /// Balance in wei
    async fn balance(&self, address: Address) -> Result<U256>;

    async fn pending_nonce(&self, address: Address) -> Result<U256>;

    /// Current base fee, taken from `eth_gasPrice`
    async fn gas_price(&self) -> Result<U256>;

    async fn max_priority_fee(&self) -> Result<U256>;

    async fn estimate_gas(&self, tx: &TypedTransaction) -> Result<U256>;

    /// Submit a signed transaction and block until its first receipt shows up.
    async fn send_raw_and_wait(&self, raw: Bytes) -> Result<TxHash>;

    /// `None` when the node does not know the transaction.
    async fn receipt_status(&self, hash: TxHash) -> Result<Option<bool>>;
}

/// Opens a [`ChainClient`] for a selected RPC URL.
#[async_trait]
pub trait ChainConnector: Send + Sync {
    async fn connect(&self, url: &str) -> Result<Arc<dyn ChainClient>>;
}

pub struct EthersChain {
    provider: Arc<Provider<Http>>,
}

impl EthersChain {
    pub fn new(provider: Arc<Provider<Http>>) -> Self {
        Self { provider }
    }

    pub fn connect(url: &str, request_timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .context("Failed to build RPC HTTP client")?;
        let parsed = reqwest::Url::parse(url).with_context(|| format!("Invalid RPC URL {}", url))?;
        let provider = Provider::new(Http::new_with_client(parsed, client));
        Ok(Self::new(Arc::new(provider)))
    }
}

#[async_trait]
impl ChainClient for EthersChain {
    async fn chain_id(&self) -> Result<u64> {
        let id = self
            .provider
            .get_chainid()
            .await
            .context("eth_chainId failed")?;
        Ok(id.as_u64())
    }

    async fn balance(&self, address: Address) -> Result<U256> {
        self.provider
            .get_balance(address, None)
            .await
            .with_context(|| format!("eth_getBalance failed for {:?}", address))
    }

    async fn pending_nonce(&self, address: Address) -> Result<U256> {
        self.provider
            .get_transaction_count(address, Some(BlockNumber::Pending.into()))
            .await
            .with_context(|| format!("eth_getTransactionCount failed for {:?}", address))
    }

    async fn gas_price(&self) -> Result<U256> {
        self.provider
            .get_gas_price()
            .await
            .context("eth_gasPrice failed")
    }

    async fn max_priority_fee(&self) -> Result<U256> {
        self.provider
            .request::<_, U256>("eth_maxPriorityFeePerGas", ())
            .await
            .context("eth_maxPriorityFeePerGas failed")
    }

    async fn estimate_gas(&self, tx: &TypedTransaction) -> Result<U256> {
        self.provider
            .estimate_gas(tx, None)
            .await
            .context("eth_estimateGas failed")
    }

    async fn send_raw_and_wait(&self, raw: Bytes) -> Result<TxHash> {
        let pending = self
            .provider
            .send_raw_transaction(raw)
            .await
            .context("eth_sendRawTransaction failed")?;
        let hash = pending.tx_hash();
        debug!("Submitted {:?}, waiting for receipt", hash);

        match pending.await.context("Waiting for receipt failed")? {
            Some(receipt) => debug!(
                "Receipt for {:?} in block {:?}",
                hash, receipt.block_number
            ),
            None => warn!("Transaction {:?} dropped before a receipt was seen", hash),
        }
        Ok(hash)
    }

    async fn receipt_status(&self, hash: TxHash) -> Result<Option<bool>> {
        let receipt = self
            .provider
            .get_transaction_receipt(hash)
            .await
            .with_context(|| format!("eth_getTransactionReceipt failed for {:?}", hash))?;
        Ok(receipt.map(|r| r.status == Some(U64::from(1))))
    }
}

/// [`ChainConnector`] backed by [`EthersChain`].
pub struct EthersConnector {
    request_timeout: Duration,
}

impl EthersConnector {
    pub fn new(request_timeout: Duration) -> Self {
        Self { request_timeout }
    }
}

#[async_trait]
impl ChainConnector for EthersConnector {
    async fn connect(&self, url: &str) -> Result<Arc<dyn ChainClient>> {
        let chain: Arc<dyn ChainClient> =
            Arc::new(EthersChain::connect(url, self.request_timeout)?);
        info!("Connected to {}", url);
        Ok(chain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_rejects_bad_url() {
        assert!(EthersChain::connect("not a url", Duration::from_secs(1)).is_err());
    }

    #[tokio::test]
    async fn test_connector_builds_client() {
        let connector = EthersConnector::new(Duration::from_secs(5));
        assert!(connector.connect("http://127.0.0.1:8545").await.is_ok());
    }
}
