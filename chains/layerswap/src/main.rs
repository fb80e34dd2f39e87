use layerswap_bridge::campaign::{Campaign, CampaignSettings};
use layerswap_bridge::chain::EthersConnector;
use layerswap_bridge::config::BridgeConfig;
use layerswap_bridge::provider::LayerswapClient;
use layerswap_bridge::swap::WalletCredential;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use core_logic::{setup_logger, JsonRpcProbe, WalletManager};
use dialoguer::{theme::ColorfulTheme, Password};
use dotenv::dotenv;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "config.toml")]
    config: String,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Bridge from every wallet in the key file (default)
    Run,
    /// Encrypt a plaintext key file line by line
    Encrypt {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let args = Args::parse();

    match args.command.unwrap_or(Command::Run) {
        Command::Run => run(&args.config).await,
        Command::Encrypt { input, output } => encrypt(&input, &output),
    }
}

async fn run(config_path: &str) -> Result<()> {
    let config = BridgeConfig::load(config_path)
        .with_context(|| format!("Failed to load config from {}", config_path))?;
    // Keep guard alive for file logging
    let _log_guard = setup_logger(&config.log_dir)?;
    info!("Loaded config from {}", config_path);

    let settings = CampaignSettings::from_config(&config)?;
    let networks = config.network_table()?;

    let wallets_path = Path::new(&config.wallets_file);
    let password = if WalletManager::has_encrypted_keys(wallets_path)? {
        Some(obtain_password(false)?)
    } else {
        None
    };
    let keys = WalletManager::load_keys(wallets_path, password.as_deref())?;
    let destinations = WalletManager::load_addresses(Path::new(&config.addresses_file))?;
    let credentials = keys
        .iter()
        .map(WalletCredential::from_decrypted)
        .collect::<Result<Vec<_>, _>>()?;
    info!(
        "Loaded {} wallets and {} destination addresses",
        credentials.len(),
        destinations.len()
    );

    let probe = Arc::new(JsonRpcProbe::new(config.rpc.probe_timeout_ms));
    let connector = Arc::new(EthersConnector::new(Duration::from_secs(
        config.rpc.request_timeout_secs,
    )));
    let api = Arc::new(LayerswapClient::new(config.provider.clone())?);

    let mut campaign = Campaign::new(settings, networks, probe, connector, api);
    match campaign.run(credentials, destinations).await {
        Ok(report) => {
            info!(
                "Campaign finished: {} succeeded, {} failed, {} skipped",
                report.succeeded, report.failed, report.skipped
            );
            Ok(())
        }
        Err(e) if e.is_fatal() => {
            error!("Campaign aborted before processing wallets: {}", e);
            Err(e.into())
        }
        Err(e) => {
            error!("Campaign stopped: {}", e);
            Err(e.into())
        }
    }
}

fn encrypt(input: &Path, output: &Path) -> Result<()> {
    let _log_guard = setup_logger("logs")?;
    let password = obtain_password(true)?;
    let count = WalletManager::encrypt_key_file(input, output, &password)?;
    info!("Encrypted {} keys into {}", count, output.display());
    Ok(())
}

/// `WALLET_PASSWORD` first, then an interactive prompt.
fn obtain_password(confirm: bool) -> Result<String> {
    if let Ok(password) = env::var("WALLET_PASSWORD") {
        if !password.is_empty() {
            return Ok(password);
        }
    }

    let theme = ColorfulTheme::default();
    let mut prompt = Password::with_theme(&theme).with_prompt("Enter wallet password");
    if confirm {
        prompt = prompt.with_confirmation("Confirm password", "Passwords do not match");
    }
    prompt
        .interact()
        .context("Cannot prompt for password (not a terminal). Set WALLET_PASSWORD instead")
}
