//! Campaign driver: one pass over every wallet/destination pair.

use crate::amount::{compute_with_mode, AmountConfig, AmountMode};
use crate::chain::{ChainClient, ChainConnector};
use crate::config::BridgeConfig;
use crate::error::BridgeError;
use crate::provider::{BridgeApi, SwapRequest};
use crate::swap::{wei_to_eth, SwapExecutor, TransactionOutcome, WalletCredential};
use core_logic::{select_endpoint, EndpointProbe, NetworkTable, RetryConfig};
use ethers::types::Address;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, Instrument};

/// Run parameters, resolved from [`BridgeConfig`].
#[derive(Debug, Clone)]
pub struct CampaignSettings {
    pub network_from: String,
    pub shuffle_wallets: bool,
    pub amount: AmountConfig,
    pub sleep_between_swaps: (Duration, Duration),
    pub retry: RetryConfig,
    pub deposit_contract: Address,
    pub fee_multiplier: f64,
    pub confirmation_cooldown: Duration,
}

impl CampaignSettings {
    pub fn from_config(config: &BridgeConfig) -> Result<Self, BridgeError> {
        config.validate()?;
        Ok(Self {
            network_from: config.network_from.clone(),
            shuffle_wallets: config.shuffle_wallets,
            amount: config.amount.clone(),
            sleep_between_swaps: config.sleep_between_swaps(),
            retry: config.retry_config(),
            deposit_contract: config.deposit_contract()?,
            fee_multiplier: config.transaction.fee_multiplier,
            confirmation_cooldown: config.confirmation_cooldown(),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CampaignReport {
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub explorer_links: Vec<String>,
}

impl CampaignReport {
    pub fn total(&self) -> usize {
        self.succeeded + self.failed + self.skipped
    }

    pub fn success_rate(&self) -> f64 {
        let total = self.total();
        if total > 0 {
            (self.succeeded as f64 / total as f64) * 100.0
        } else {
            0.0
        }
    }
}

enum WalletResult {
    Swapped(TransactionOutcome),
    Skipped,
}

/// A wallet that errored, with the amount it was about to bridge once drawn.
#[derive(Debug)]
struct WalletFailure {
    amount: Option<f64>,
    error: BridgeError,
}

impl From<BridgeError> for WalletFailure {
    fn from(error: BridgeError) -> Self {
        Self {
            amount: None,
            error,
        }
    }
}

fn describe_failure(address: Address, failure: &WalletFailure) -> String {
    match failure.amount {
        Some(amount) => format!(
            "Wallet {:?} failed bridging {} ETH: {}",
            address, amount, failure.error
        ),
        None => format!("Wallet {:?} failed: {}", address, failure.error),
    }
}

/// Zip credentials with destinations, refusing uneven inputs.
pub fn pair_up(
    credentials: Vec<WalletCredential>,
    destinations: Vec<String>,
) -> Result<Vec<(WalletCredential, String)>, BridgeError> {
    if credentials.len() != destinations.len() {
        return Err(BridgeError::CredentialMismatch {
            wallets: credentials.len(),
            addresses: destinations.len(),
        });
    }
    Ok(credentials.into_iter().zip(destinations).collect())
}

pub struct Campaign {
    settings: CampaignSettings,
    networks: NetworkTable,
    probe: Arc<dyn EndpointProbe>,
    connector: Arc<dyn ChainConnector>,
    api: Arc<dyn BridgeApi>,
    rng: StdRng,
}

impl Campaign {
    pub fn new(
        settings: CampaignSettings,
        networks: NetworkTable,
        probe: Arc<dyn EndpointProbe>,
        connector: Arc<dyn ChainConnector>,
        api: Arc<dyn BridgeApi>,
    ) -> Self {
        Self {
            settings,
            networks,
            probe,
            connector,
            api,
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    pub async fn run(
        &mut self,
        credentials: Vec<WalletCredential>,
        destinations: Vec<String>,
    ) -> Result<CampaignReport, BridgeError> {
        let mut pairs = pair_up(credentials, destinations)?;
        let mode = self.settings.amount.mode()?;

        if self.settings.shuffle_wallets {
            pairs.shuffle(&mut self.rng);
        }

        let profile = self.networks.resolve(&self.settings.network_from)?.clone();
        info!("Source network: {}", profile.id);
        let url = select_endpoint(&profile, self.probe.as_ref()).await?;
        let chain = self.connector.connect(&url).await?;

        let executor = SwapExecutor::new(
            chain.clone(),
            self.api.clone(),
            profile.clone(),
            self.settings.deposit_contract,
        )
        .with_fee_multiplier(self.settings.fee_multiplier)
        .with_cooldown(self.settings.confirmation_cooldown)
        .with_retry(self.settings.retry.clone());

        let start_time = Instant::now();
        let mut report = CampaignReport::default();
        info!("Starting campaign over {} wallets", pairs.len());

        for (i, (credential, destination)) in pairs.iter().enumerate() {
            let span = tracing::info_span!("wallet", idx = format!("{:03}", i + 1));
            let result = process_wallet(
                chain.as_ref(),
                &executor,
                &mode,
                &profile.id,
                &mut self.rng,
                credential,
                destination,
            )
            .instrument(span.clone())
            .await;

            match result {
                Ok(WalletResult::Swapped(outcome)) => {
                    report.succeeded += 1;
                    report.explorer_links.push(outcome.explorer_url);
                }
                Ok(WalletResult::Skipped) => report.skipped += 1,
                Err(failure) => {
                    let line = describe_failure(credential.address, &failure);
                    span.in_scope(|| error!("{}", line));
                    report.failed += 1;
                }
            }

            if i + 1 < pairs.len() {
                let pause = draw_pause(&mut self.rng, self.settings.sleep_between_swaps);
                info!("Sleeping {:.1}s before next wallet", pause.as_secs_f64());
                tokio::time::sleep(pause).await;
            }
        }

        info!(
            "Total Time: {:.1}s | Success: {} | Fail: {} | Skipped: {} | Success Rate: {:.2}%",
            start_time.elapsed().as_secs_f64(),
            report.succeeded,
            report.failed,
            report.skipped,
            report.success_rate()
        );
        for link in &report.explorer_links {
            info!("{}", link);
        }

        Ok(report)
    }
}

async fn process_wallet(
    chain: &dyn ChainClient,
    executor: &SwapExecutor,
    mode: &AmountMode,
    network_id: &str,
    rng: &mut StdRng,
    credential: &WalletCredential,
    destination: &str,
) -> Result<WalletResult, WalletFailure> {
    let balance = chain
        .balance(credential.address)
        .await
        .map_err(BridgeError::from)?;
    let balance = wei_to_eth(balance);
    let amount = compute_with_mode(balance, mode, rng)?;
    info!(
        "Bridging {} ETH from {:?} (balance {:.6}) to {}",
        amount, credential.address, balance, destination
    );

    let request = SwapRequest {
        source_network: network_id.to_string(),
        source_address: credential.address,
        destination_address: destination.to_string(),
        amount,
    };

    match executor.execute_swap(credential, &request).await {
        Ok(Some(outcome)) => Ok(WalletResult::Swapped(outcome)),
        Ok(None) => Ok(WalletResult::Skipped),
        Err(error) => Err(WalletFailure {
            amount: Some(amount),
            error,
        }),
    }
}

fn draw_pause(rng: &mut StdRng, (min, max): (Duration, Duration)) -> Duration {
    if max <= min {
        return min;
    }
    Duration::from_millis(rng.gen_range(min.as_millis() as u64..=max.as_millis() as u64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;
    use crate::provider::CallData;
    use async_trait::async_trait;
    use core_logic::NetworkProfile;
    use ethers::types::transaction::eip2718::TypedTransaction;
    use ethers::types::{Bytes, TxHash, U256};

    const KEYS: [&str; 3] = [
        "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
        "59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d",
        "5de4111afa1a4b94908f83103eb1f1706367c2e68ca870fc3fb9a804cdab365a",
    ];

    fn credentials(n: usize) -> Vec<WalletCredential> {
        KEYS[..n]
            .iter()
            .map(|k| WalletCredential::from_private_key(k).unwrap())
            .collect()
    }

    #[test]
    fn test_pair_up_mismatch() {
        let err = pair_up(credentials(3), vec!["a".into(), "b".into()]).unwrap_err();
        assert!(matches!(
            err,
            BridgeError::CredentialMismatch {
                wallets: 3,
                addresses: 2
            }
        ));
    }

    #[test]
    fn test_pair_up_keeps_order() {
        let creds = credentials(2);
        let pairs = pair_up(creds.clone(), vec!["a".into(), "b".into()]).unwrap();
        assert_eq!(pairs[0].0.address, creds[0].address);
        assert_eq!(pairs[1].1, "b");
    }

    #[test]
    fn test_draw_pause_bounds() {
        let mut rng = StdRng::seed_from_u64(9);
        let bounds = (Duration::from_millis(100), Duration::from_millis(200));
        for _ in 0..100 {
            let pause = draw_pause(&mut rng, bounds);
            assert!(pause >= bounds.0 && pause <= bounds.1);
        }
        assert_eq!(
            draw_pause(&mut rng, (Duration::ZERO, Duration::ZERO)),
            Duration::ZERO
        );
    }

    #[test]
    fn test_report_rate() {
        let report = CampaignReport {
            succeeded: 3,
            failed: 1,
            skipped: 0,
            explorer_links: vec![],
        };
        assert_eq!(report.total(), 4);
        assert_eq!(report.success_rate(), 75.0);
        assert_eq!(CampaignReport::default().success_rate(), 0.0);
    }

    /// Funded chain whose node stops answering once the swap starts.
    struct StallingChain;

    #[async_trait]
    impl ChainClient for StallingChain {
        async fn chain_id(&self) -> anyhow::Result<u64> {
            Ok(10)
        }
        async fn balance(&self, _address: Address) -> anyhow::Result<U256> {
            Ok(U256::exp10(18))
        }
        async fn pending_nonce(&self, _address: Address) -> anyhow::Result<U256> {
            Err(anyhow::anyhow!("connection reset"))
        }
        async fn gas_price(&self) -> anyhow::Result<U256> {
            Ok(U256::one())
        }
        async fn max_priority_fee(&self) -> anyhow::Result<U256> {
            Ok(U256::one())
        }
        async fn estimate_gas(&self, _tx: &TypedTransaction) -> anyhow::Result<U256> {
            Ok(U256::from(21_000u64))
        }
        async fn send_raw_and_wait(&self, _raw: Bytes) -> anyhow::Result<TxHash> {
            Err(anyhow::anyhow!("not reached"))
        }
        async fn receipt_status(&self, _hash: TxHash) -> anyhow::Result<Option<bool>> {
            Ok(None)
        }
    }

    struct ReadyApi;

    #[async_trait]
    impl BridgeApi for ReadyApi {
        async fn create_swap(&self, _request: &SwapRequest) -> Result<CallData, ProviderError> {
            Ok(CallData {
                data: Bytes::from(vec![0x01]),
                to: None,
            })
        }
    }

    #[tokio::test]
    async fn test_swap_failure_keeps_drawn_amount() {
        let chain: Arc<dyn ChainClient> = Arc::new(StallingChain);
        let profile = NetworkProfile::new("OPTIMISM_MAINNET", &["http://rpc"], "https://x/tx/");
        let executor = SwapExecutor::new(chain.clone(), Arc::new(ReadyApi), profile, Address::zero())
            .with_cooldown(Duration::ZERO)
            .with_retry(RetryConfig::immediate(1));
        let mode = AmountMode::AbsoluteRange {
            min: 0.01,
            max: 0.02,
        };
        let credential = credentials(1).remove(0);
        let mut rng = StdRng::seed_from_u64(4);

        let failure = match process_wallet(
            chain.as_ref(),
            &executor,
            &mode,
            "OPTIMISM_MAINNET",
            &mut rng,
            &credential,
            "fuel1dest",
        )
        .await
        {
            Err(failure) => failure,
            Ok(_) => panic!("swap should fail"),
        };

        let amount = failure.amount.unwrap();
        assert!((0.01..=0.02).contains(&amount));
        assert!(matches!(failure.error, BridgeError::Chain(_)));

        let line = describe_failure(credential.address, &failure);
        assert!(line.contains(&format!("{:?}", credential.address)));
        assert!(line.contains(&amount.to_string()));
    }

    #[test]
    fn test_describe_failure_without_amount() {
        let failure = WalletFailure::from(BridgeError::InsufficientBalance {
            required: 0.02,
            available: 0.001,
        });
        let line = describe_failure(Address::zero(), &failure);
        assert!(line.contains("0.02"));
        assert!(line.contains("0.001"));
    }
}
