//! Layerswap API client.
//!
//! `POST {api_url}/swaps` creates a swap and returns the deposit actions the
//! source wallet must execute. Only the first action's call data is used.

use crate::config::ProviderSettings;
use crate::error::ProviderError;
use async_trait::async_trait;
use core_logic::{with_retry, RetryConfig};
use ethers::types::{Address, Bytes};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// One wallet's bridging intent.
#[derive(Debug, Clone, PartialEq)]
pub struct SwapRequest {
    pub source_network: String,
    pub source_address: Address,
    pub destination_address: String,
    /// In ETH
    pub amount: f64,
}

/// Deposit payload authorised by the provider for a single swap.
#[derive(Debug, Clone, PartialEq)]
pub struct CallData {
    pub data: Bytes,
    /// Contract the provider expects the deposit to hit, when it says so
    pub to: Option<Address>,
}

#[derive(Debug, Serialize)]
struct CreateSwapBody<'a> {
    amount: f64,
    source_network: &'a str,
    destination_network: &'a str,
    source_token: &'a str,
    destination_token: &'a str,
    destination_address: &'a str,
    refuel: bool,
    use_deposit_address: bool,
    source_address: String,
}

impl<'a> CreateSwapBody<'a> {
    fn new(request: &'a SwapRequest, settings: &'a ProviderSettings) -> Self {
        Self {
            amount: request.amount,
            source_network: &request.source_network,
            destination_network: &settings.destination_network,
            source_token: &settings.source_token,
            destination_token: &settings.destination_token,
            destination_address: &request.destination_address,
            refuel: settings.refuel,
            use_deposit_address: settings.use_deposit_address,
            source_address: format!("{:?}", request.source_address),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SwapEnvelope {
    data: SwapData,
}

#[derive(Debug, Deserialize)]
struct SwapData {
    deposit_actions: Vec<DepositAction>,
}

#[derive(Debug, Deserialize)]
struct DepositAction {
    call_data: Option<String>,
    #[serde(default)]
    to_address: Option<String>,
}

/// Seam for the bridging provider, one attempt per call.
#[async_trait]
pub trait BridgeApi: Send + Sync {
    async fn create_swap(&self, request: &SwapRequest) -> Result<CallData, ProviderError>;
}

pub struct LayerswapClient {
    client: Client,
    settings: ProviderSettings,
}

impl LayerswapClient {
    pub fn new(settings: ProviderSettings) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| ProviderError::Request(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client, settings })
    }

    fn swaps_url(&self) -> String {
        format!("{}/swaps", self.settings.api_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl BridgeApi for LayerswapClient {
    async fn create_swap(&self, request: &SwapRequest) -> Result<CallData, ProviderError> {
        let body = CreateSwapBody::new(request, &self.settings);

        let mut builder = self
            .client
            .post(self.swaps_url())
            .header("accept", "application/json")
            .json(&body);
        if let Some(key) = &self.settings.api_key {
            builder = builder.header("X-LS-APIKEY", key);
        }

        debug!("POST {} amount={}", self.swaps_url(), request.amount);
        let response = builder
            .send()
            .await
            .map_err(|e| ProviderError::Request(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ProviderError::Request(e.to_string()))?;

        parse_swap_response(status, &text)
    }
}

/// Classify a `/swaps` reply. Any shape other than a non-empty
/// `data.deposit_actions[0].call_data` hex string is an error.
pub fn parse_swap_response(status: StatusCode, body: &str) -> Result<CallData, ProviderError> {
    if !status.is_success() {
        return Err(ProviderError::Status {
            status: status.as_u16(),
            body: body.chars().take(500).collect(),
        });
    }

    let envelope: SwapEnvelope = serde_json::from_str(body)
        .map_err(|e| ProviderError::MalformedResponse(format!("{}: {}", e, body)))?;

    let action = envelope
        .data
        .deposit_actions
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::MalformedResponse("empty deposit_actions".to_string()))?;

    let raw = action
        .call_data
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| ProviderError::MalformedResponse("missing call_data".to_string()))?;

    let data = raw
        .trim()
        .parse::<Bytes>()
        .map_err(|e| ProviderError::MalformedResponse(format!("call_data is not hex: {}", e)))?;

    let to = match action.to_address {
        Some(addr) => match addr.parse::<Address>() {
            Ok(a) => Some(a),
            Err(_) => {
                warn!("Ignoring unparsable deposit to_address {}", addr);
                None
            }
        },
        None => None,
    };

    Ok(CallData { data, to })
}

/// Fetch call data for `request`, retrying the whole HTTP call per `retry`.
pub async fn request_call_data(
    api: &dyn BridgeApi,
    retry: &RetryConfig,
    request: &SwapRequest,
) -> Result<CallData, ProviderError> {
    with_retry(retry, "layerswap create_swap", move || api.create_swap(request)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const OK_BODY: &str = r#"{
        "data": {
            "swap": {"id": "8b7b"},
            "deposit_actions": [
                {"type": "transfer", "to_address": "0x2Fc617E933a52713247CE25730f6695920B3befe", "call_data": "0xdeadbeef"},
                {"type": "transfer", "call_data": "0x00"}
            ]
        }
    }"#;

    #[test]
    fn test_parse_first_deposit_action() {
        let call = parse_swap_response(StatusCode::OK, OK_BODY).unwrap();
        assert_eq!(call.data, Bytes::from(vec![0xde, 0xad, 0xbe, 0xef]));
        assert_eq!(
            call.to,
            Some(
                "0x2Fc617E933a52713247CE25730f6695920B3befe"
                    .parse::<Address>()
                    .unwrap()
            )
        );
    }

    #[test]
    fn test_non_success_status() {
        let err = parse_swap_response(StatusCode::BAD_REQUEST, "{\"error\":\"bad\"}").unwrap_err();
        assert!(matches!(err, ProviderError::Status { status: 400, .. }));
    }

    #[test]
    fn test_malformed_shapes() {
        let cases = [
            "not json",
            r#"{"error": null}"#,
            r#"{"data": {}}"#,
            r#"{"data": {"deposit_actions": []}}"#,
            r#"{"data": {"deposit_actions": [{"call_data": ""}]}}"#,
            r#"{"data": {"deposit_actions": [{"call_data": "0xzz"}]}}"#,
        ];
        for body in cases {
            assert!(
                matches!(
                    parse_swap_response(StatusCode::OK, body),
                    Err(ProviderError::MalformedResponse(_))
                ),
                "body {} should be malformed",
                body
            );
        }
    }

    #[test]
    fn test_request_body_maps_request_and_settings() {
        let request = SwapRequest {
            source_network: "ARBITRUM_MAINNET".to_string(),
            source_address: "0x2Fc617E933a52713247CE25730f6695920B3befe"
                .parse()
                .unwrap(),
            destination_address: "fuel1xyz".to_string(),
            amount: 0.015,
        };
        let settings = ProviderSettings {
            destination_network: "FUEL_TESTNET".to_string(),
            refuel: true,
            use_deposit_address: true,
            ..ProviderSettings::default()
        };

        let json = serde_json::to_value(CreateSwapBody::new(&request, &settings)).unwrap();
        assert_eq!(json["amount"], 0.015);
        assert_eq!(json["source_network"], "ARBITRUM_MAINNET");
        assert_eq!(json["destination_network"], "FUEL_TESTNET");
        assert_eq!(json["source_token"], "ETH");
        assert_eq!(json["destination_token"], "ETH");
        assert_eq!(json["destination_address"], "fuel1xyz");
        assert_eq!(json["refuel"], true);
        assert_eq!(json["use_deposit_address"], true);
        assert_eq!(
            json["source_address"],
            "0x2fc617e933a52713247ce25730f6695920b3befe"
        );
    }

    #[test]
    fn test_body_amount_matches_transfer_value() {
        let settings = ProviderSettings::default();
        for amount in [0.015, 0.0123, 0.019999, 0.5, 1.25] {
            let request = SwapRequest {
                source_network: "ARBITRUM_MAINNET".to_string(),
                source_address: Address::zero(),
                destination_address: "fuel1xyz".to_string(),
                amount,
            };
            let json = serde_json::to_value(CreateSwapBody::new(&request, &settings)).unwrap();
            let sent = ethers::utils::parse_ether(json["amount"].to_string()).unwrap();
            assert_eq!(crate::swap::eth_to_wei(request.amount).unwrap(), sent);
        }
    }

    #[test]
    fn test_swaps_url_trailing_slash() {
        for api_url in ["https://api.layerswap.io/api/v2", "https://api.layerswap.io/api/v2/"] {
            let client = LayerswapClient::new(ProviderSettings {
                api_url: api_url.to_string(),
                ..ProviderSettings::default()
            })
            .unwrap();
            assert_eq!(client.swaps_url(), "https://api.layerswap.io/api/v2/swaps");
        }
    }

    struct FlakyApi {
        calls: AtomicUsize,
        fail_first: usize,
    }

    #[async_trait]
    impl BridgeApi for FlakyApi {
        async fn create_swap(&self, _request: &SwapRequest) -> Result<CallData, ProviderError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.fail_first {
                Err(ProviderError::Status {
                    status: 503,
                    body: "busy".to_string(),
                })
            } else {
                Ok(CallData {
                    data: Bytes::from(vec![1, 2, 3]),
                    to: None,
                })
            }
        }
    }

    fn request() -> SwapRequest {
        SwapRequest {
            source_network: "ARBITRUM_MAINNET".to_string(),
            source_address: Address::zero(),
            destination_address: "fuel1xyz".to_string(),
            amount: 0.01,
        }
    }

    #[tokio::test]
    async fn test_request_call_data_retries() {
        let api = FlakyApi {
            calls: AtomicUsize::new(0),
            fail_first: 2,
        };
        let call = request_call_data(&api, &RetryConfig::immediate(3), &request())
            .await
            .unwrap();
        assert_eq!(call.data.len(), 3);
        assert_eq!(api.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_request_call_data_gives_up() {
        let api = FlakyApi {
            calls: AtomicUsize::new(0),
            fail_first: 10,
        };
        let err = request_call_data(&api, &RetryConfig::immediate(3), &request())
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Status { status: 503, .. }));
        assert_eq!(api.calls.load(Ordering::SeqCst), 3);
    }
}
