use std::time::Duration;

use gate_limit::GateConfig;
use gate_limit::human_duration;
use serde::Deserialize;
use serde::Serialize;

pub const DEFAULT_ENDPOINT: &str = "https://ismp.crpt.ru/api/v3/lk/documents/create";

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Everything needed to build an HTTP [`DocumentClient`](crate::DocumentClient).
///
/// ```json
/// { "endpoint": "https://...", "limit": 10, "window": "1s", "request_timeout": "30s" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(flatten)]
    pub gate: GateConfig,
    #[serde(default = "default_request_timeout", with = "human_duration")]
    pub request_timeout: Duration,
}

impl ClientConfig {
    pub fn new(gate: GateConfig) -> Self {
        Self {
            endpoint: default_endpoint(),
            gate,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_request_timeout() -> Duration {
    DEFAULT_REQUEST_TIMEOUT
}
