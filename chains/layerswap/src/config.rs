use crate::amount::AmountConfig;
use crate::error::BridgeError;
use config::{Config, Environment, File, FileFormat};
use core_logic::{NetworkOverride, NetworkTable, RetryConfig};
use ethers::types::Address;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// Layerswap deposit contract on the supported EVM source networks.
pub const DEFAULT_DEPOSIT_CONTRACT: &str = "0x2Fc617E933a52713247CE25730f6695920B3befe";
pub const DEFAULT_API_URL: &str = "https://api.layerswap.io/api/v2";

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct BridgeConfig {
    /// Shortcut (`arb`, `op`, `base`, `scroll`) or canonical network id
    pub network_from: String,
    pub wallets_file: String,
    pub addresses_file: String,
    pub log_dir: String,
    pub shuffle_wallets: bool,
    pub sleep_between_swaps_secs: [u64; 2],
    pub amount: AmountConfig,
    pub retry: RetrySettings,
    pub provider: ProviderSettings,
    pub transaction: TransactionSettings,
    pub rpc: RpcSettings,
    pub networks: BTreeMap<String, NetworkOverride>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            network_from: "arb".to_string(),
            wallets_file: "data/wallets.txt".to_string(),
            addresses_file: "data/fuel_addresses.txt".to_string(),
            log_dir: "logs".to_string(),
            shuffle_wallets: true,
            sleep_between_swaps_secs: [1, 5],
            amount: AmountConfig::default(),
            retry: RetrySettings::default(),
            provider: ProviderSettings::default(),
            transaction: TransactionSettings::default(),
            rpc: RpcSettings::default(),
            networks: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RetrySettings {
    pub attempts: u32,
    pub delay_secs: [u64; 2],
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay_secs: [1, 5],
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ProviderSettings {
    pub api_url: String,
    pub api_key: Option<String>,
    pub destination_network: String,
    pub source_token: String,
    pub destination_token: String,
    pub refuel: bool,
    pub use_deposit_address: bool,
    pub timeout_secs: u64,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: None,
            destination_network: "FUEL_MAINNET".to_string(),
            source_token: "ETH".to_string(),
            destination_token: "ETH".to_string(),
            refuel: false,
            use_deposit_address: false,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct TransactionSettings {
    pub deposit_contract: String,
    /// Applied to both the priority fee and the fee cap
    pub fee_multiplier: f64,
    pub confirmation_cooldown_secs: u64,
}

impl Default for TransactionSettings {
    fn default() -> Self {
        Self {
            deposit_contract: DEFAULT_DEPOSIT_CONTRACT.to_string(),
            fee_multiplier: 1.2,
            confirmation_cooldown_secs: 30,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RpcSettings {
    pub probe_timeout_ms: u64,
    pub request_timeout_secs: u64,
}

impl Default for RpcSettings {
    fn default() -> Self {
        Self {
            probe_timeout_ms: 10_000,
            request_timeout_secs: 60,
        }
    }
}

impl BridgeConfig {
    /// Load a TOML file, then apply `BRIDGE__SECTION__KEY` env overrides.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let settings = Config::builder()
            .add_source(File::with_name(path))
            .add_source(
                Environment::with_prefix("BRIDGE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize().map_err(|e| anyhow::anyhow!(e))
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let settings = Config::builder()
            .add_source(File::from_str(content, FileFormat::Toml))
            .build()?;

        settings.try_deserialize().map_err(|e| anyhow::anyhow!(e))
    }

    /// Run-level checks that do not need the network.
    pub fn validate(&self) -> Result<(), BridgeError> {
        self.amount.mode()?;

        let [lo, hi] = self.sleep_between_swaps_secs;
        if lo > hi {
            return Err(BridgeError::InvalidConfig {
                reason: format!("sleep_between_swaps_secs [{}, {}] is inverted", lo, hi),
            });
        }
        if !(self.transaction.fee_multiplier.is_finite() && self.transaction.fee_multiplier > 0.0)
        {
            return Err(BridgeError::InvalidConfig {
                reason: format!(
                    "fee_multiplier must be positive, got {}",
                    self.transaction.fee_multiplier
                ),
            });
        }
        self.deposit_contract()?;
        Ok(())
    }

    pub fn deposit_contract(&self) -> Result<Address, BridgeError> {
        self.transaction
            .deposit_contract
            .parse::<Address>()
            .map_err(|e| BridgeError::InvalidConfig {
                reason: format!(
                    "deposit_contract '{}' is not an address: {}",
                    self.transaction.deposit_contract, e
                ),
            })
    }

    pub fn retry_config(&self) -> RetryConfig {
        let [lo, hi] = self.retry.delay_secs;
        RetryConfig::immediate(self.retry.attempts).with_delay_secs(lo, hi)
    }

    pub fn sleep_between_swaps(&self) -> (Duration, Duration) {
        let [lo, hi] = self.sleep_between_swaps_secs;
        (Duration::from_secs(lo), Duration::from_secs(hi.max(lo)))
    }

    pub fn confirmation_cooldown(&self) -> Duration {
        Duration::from_secs(self.transaction.confirmation_cooldown_secs)
    }

    pub fn network_table(&self) -> Result<NetworkTable, BridgeError> {
        Ok(NetworkTable::builtin().apply_overrides(&self.networks)?)
    }
}
