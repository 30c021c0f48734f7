use std::time::Duration;

use poolwarden_core::DaemonEndpoint;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::{ChainSync, DaemonStatus};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// One-shot authenticated JSON-RPC health check. No retries.
#[derive(Debug, Clone)]
pub struct DaemonProbe {
    client: reqwest::Client,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct RpcReply<T> {
    result: Option<T>,
    #[serde(default)]
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct BlockchainInfo {
    chain: String,
    blocks: u64,
    headers: u64,
    #[serde(default)]
    verificationprogress: Option<f64>,
}

impl Default for DaemonProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl DaemonProbe {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self { client: reqwest::Client::new(), timeout }
    }

    /// Probe `getblockchaininfo` on `endpoint`.
    pub async fn blockchain_info(&self, endpoint: &DaemonEndpoint) -> DaemonStatus {
        match self.call::<BlockchainInfo>(endpoint, "getblockchaininfo").await {
            Ok(info) => DaemonStatus::online(ChainSync::new(
                info.chain,
                info.blocks,
                info.headers,
                info.verificationprogress,
            )),
            Err(error) => {
                debug!(host = %endpoint.host, port = endpoint.port, %error, "daemon probe failed");
                DaemonStatus::offline(error)
            }
        }
    }

    async fn call<T>(&self, endpoint: &DaemonEndpoint, method: &str) -> Result<T, String>
    where
        T: for<'de> Deserialize<'de>,
    {
        let body = json!({ "jsonrpc": "1.0", "id": "probe", "method": method, "params": [] });
        let request = self
            .client
            .post(endpoint.url())
            .basic_auth(&endpoint.username, Some(&endpoint.password))
            .header(CONTENT_TYPE, "text/plain")
            .body(body.to_string());

        let exchange = async {
            let response = request.send().await.map_err(|e| e.to_string())?;
            response.bytes().await.map_err(|e| e.to_string())
        };
        let bytes = match tokio::time::timeout(self.timeout, exchange).await {
            Ok(r) => r?,
            Err(_) => return Err("timeout".to_string()),
        };

        let reply: RpcReply<T> = serde_json::from_slice(&bytes).map_err(|_| "parse error".to_string())?;
        match (reply.result, reply.error) {
            (_, Some(err)) => Err(err.message),
            (Some(result), None) => Ok(result),
            (None, None) => Err("empty result".to_string()),
        }
    }
}
