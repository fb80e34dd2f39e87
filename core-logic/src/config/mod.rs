//! Static network configuration shared by every chain integration.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Placeholder replaced by the transaction hash in explorer templates.
pub const HASH_PLACEHOLDER: &str = "{hash}";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkProfile {
    /// Canonical network id, e.g. `ARBITRUM_MAINNET`
    pub id: String,
    /// Candidate RPC endpoints, probed in order
    pub rpc_urls: Vec<String>,
    /// Explorer URL with a `{hash}` placeholder
    pub explorer_tx_url: String,
}

impl NetworkProfile {
    pub fn new(id: &str, rpc_urls: &[&str], explorer_tx_url: &str) -> Self {
        Self {
            id: id.to_string(),
            rpc_urls: rpc_urls.iter().map(|u| u.to_string()).collect(),
            explorer_tx_url: explorer_tx_url.to_string(),
        }
    }

    /// Render the explorer link for a transaction hash (`0x`-prefixed hex).
    pub fn explorer_url(&self, tx_hash: &str) -> String {
        if self.explorer_tx_url.contains(HASH_PLACEHOLDER) {
            self.explorer_tx_url.replace(HASH_PLACEHOLDER, tx_hash)
        } else {
            format!("{}{}", self.explorer_tx_url, tx_hash)
        }
    }
}

/// Partial profile read from the user config.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NetworkOverride {
    pub rpc_urls: Option<Vec<String>>,
    pub explorer_tx_url: Option<String>,
}

/// Shortcut → canonical id → profile lookup.
#[derive(Debug, Clone)]
pub struct NetworkTable {
    shortcuts: BTreeMap<String, String>,
    profiles: BTreeMap<String, NetworkProfile>,
}

impl NetworkTable {
    pub fn empty() -> Self {
        Self {
            shortcuts: BTreeMap::new(),
            profiles: BTreeMap::new(),
        }
    }

    /// Networks supported by the Layerswap source side out of the box.
    pub fn builtin() -> Self {
        Self::empty()
            .with_profile(
                "arb",
                NetworkProfile::new(
                    "ARBITRUM_MAINNET",
                    &[
                        "https://arb1.arbitrum.io/rpc",
                        "https://api.zan.top/arb-one",
                        "https://arbitrum.drpc.org",
                    ],
                    "https://arbiscan.io/tx/{hash}",
                ),
            )
            .with_profile(
                "op",
                NetworkProfile::new(
                    "OPTIMISM_MAINNET",
                    &[
                        "https://mainnet.optimism.io",
                        "https://optimism.llamarpc.com",
                        "https://op-pokt.nodies.app",
                    ],
                    "https://optimistic.etherscan.io/tx/{hash}",
                ),
            )
            .with_profile(
                "base",
                NetworkProfile::new(
                    "BASE_MAINNET",
                    &[
                        "https://mainnet.base.org",
                        "https://developer-access-mainnet.base.org",
                        "https://base.llamarpc.com",
                    ],
                    "https://basescan.org/tx/{hash}",
                ),
            )
            .with_profile(
                "scroll",
                NetworkProfile::new(
                    "SCROLL_MAINNET",
                    &[
                        "https://rpc.scroll.io",
                        "https://rpc.ankr.com/scroll",
                        "https://scroll.drpc.org",
                    ],
                    "https://scrollscan.com/tx/{hash}",
                ),
            )
    }

    pub fn with_profile(mut self, shortcut: &str, profile: NetworkProfile) -> Self {
        self.shortcuts
            .insert(shortcut.to_lowercase(), profile.id.clone());
        self.profiles.insert(profile.id.clone(), profile);
        self
    }

    /// Merge user overrides keyed by canonical id. Unknown ids become new
    /// profiles and then need both fields.
    pub fn apply_overrides(
        mut self,
        overrides: &BTreeMap<String, NetworkOverride>,
    ) -> Result<Self, ConfigError> {
        for (id, ov) in overrides {
            let id = id.to_uppercase();
            match self.profiles.get_mut(&id) {
                Some(profile) => {
                    if let Some(urls) = &ov.rpc_urls {
                        profile.rpc_urls = urls.clone();
                    }
                    if let Some(explorer) = &ov.explorer_tx_url {
                        profile.explorer_tx_url = explorer.clone();
                    }
                }
                None => {
                    let (Some(urls), Some(explorer)) = (&ov.rpc_urls, &ov.explorer_tx_url) else {
                        return Err(ConfigError::InvalidValue {
                            field: format!("networks.{}", id),
                            reason: "new networks need both rpc_urls and explorer_tx_url"
                                .to_string(),
                        });
                    };
                    self.profiles.insert(
                        id.clone(),
                        NetworkProfile {
                            id,
                            rpc_urls: urls.clone(),
                            explorer_tx_url: explorer.clone(),
                        },
                    );
                }
            }
        }
        Ok(self)
    }

    /// Resolve a shortcut (`arb`) or canonical id (`arbitrum_mainnet`).
    pub fn resolve(&self, name: &str) -> Result<&NetworkProfile, ConfigError> {
        let id = self
            .shortcuts
            .get(&name.to_lowercase())
            .cloned()
            .unwrap_or_else(|| name.to_uppercase());

        self.profiles
            .get(&id)
            .ok_or_else(|| ConfigError::UnknownNetwork {
                name: name.to_string(),
                known: self
                    .shortcuts
                    .keys()
                    .cloned()
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }
}

impl Default for NetworkTable {
    fn default() -> Self {
        Self::builtin()
    }
}
