use async_trait::async_trait;
use core_logic::{select_endpoint, EndpointProbe, NetworkError, NetworkProfile};
use std::collections::HashSet;
use std::sync::Mutex;

struct ScriptedProbe {
    healthy: HashSet<String>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedProbe {
    fn new(healthy: &[&str]) -> Self {
        Self {
            healthy: healthy.iter().map(|s| s.to_string()).collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl EndpointProbe for ScriptedProbe {
    async fn probe(&self, url: &str) -> Result<String, NetworkError> {
        self.calls.lock().unwrap().push(url.to_string());
        if self.healthy.contains(url) {
            Ok("TestNode/v1.0".to_string())
        } else {
            Err(NetworkError::Timeout {
                timeout_ms: 10,
                endpoint: url.to_string(),
            })
        }
    }
}

fn profile(urls: &[&str]) -> NetworkProfile {
    NetworkProfile::new("ARBITRUM_MAINNET", urls, "https://arbiscan.io/tx/{hash}")
}

#[tokio::test]
async fn test_returns_first_healthy_and_stops_probing() {
    let probe = ScriptedProbe::new(&["http://b", "http://c"]);
    let profile = profile(&["http://a", "http://b", "http://c"]);

    let selected = select_endpoint(&profile, &probe).await.unwrap();

    assert_eq!(selected, "http://b");
    assert_eq!(probe.calls(), vec!["http://a", "http://b"]);
}

#[tokio::test]
async fn test_first_candidate_healthy() {
    let probe = ScriptedProbe::new(&["http://a", "http://b"]);
    let profile = profile(&["http://a", "http://b"]);

    assert_eq!(select_endpoint(&profile, &probe).await.unwrap(), "http://a");
    assert_eq!(probe.calls().len(), 1);
}

#[tokio::test]
async fn test_all_candidates_fail() {
    let probe = ScriptedProbe::new(&[]);
    let profile = profile(&["http://a", "http://b", "http://c"]);

    let result = select_endpoint(&profile, &probe).await;

    assert_eq!(
        result,
        Err(NetworkError::NoHealthyEndpoint {
            network: "ARBITRUM_MAINNET".to_string(),
            tried: 3,
        })
    );
    assert_eq!(probe.calls().len(), 3);
}

#[tokio::test]
async fn test_empty_candidate_list() {
    let probe = ScriptedProbe::new(&["http://a"]);
    let profile = profile(&[]);

    assert!(matches!(
        select_endpoint(&profile, &probe).await,
        Err(NetworkError::NoHealthyEndpoint { tried: 0, .. })
    ));
    assert!(probe.calls().is_empty());
}
