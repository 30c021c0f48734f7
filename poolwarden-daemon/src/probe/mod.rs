//! Health probes for the coin daemons and the shared cache.
//!
//! Probes never fail: every problem is folded into an offline status so a
//! snapshot can always be assembled.

use async_trait::async_trait;
use poolwarden_core::{Coin, Endpoints};
use serde::Serialize;

mod cache;
mod daemon;

pub use cache::CacheProbe;
pub use daemon::DaemonProbe;

/// Reachability and sync state of one coin daemon.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DaemonStatus {
    pub online: bool,
    #[serde(flatten)]
    pub sync: Option<ChainSync>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DaemonStatus {
    pub fn online(sync: ChainSync) -> Self {
        Self { online: true, sync: Some(sync), error: None }
    }

    pub fn offline(error: impl Into<String>) -> Self {
        Self { online: false, sync: None, error: Some(error.into()) }
    }
}

/// Fields reported by `getblockchaininfo`, reduced to what the status view needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChainSync {
    pub chain: String,
    pub blocks: u64,
    pub headers: u64,
    /// Verification progress in percent, one decimal.
    pub progress: String,
    pub synced: bool,
}

impl ChainSync {
    pub fn new(chain: String, blocks: u64, headers: u64, verification: Option<f64>) -> Self {
        let progress = match verification {
            Some(v) if v != 0.0 => format!("{:.1}", v * 100.0),
            // A zero or missing progress reads as complete.
            _ => "100.0".to_string(),
        };
        // Within two blocks of the best header counts as synced.
        let synced = blocks.saturating_add(2) >= headers;
        Self { chain, blocks, headers, progress, synced }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStatus {
    pub online: bool,
}

/// The probe seam used by the aggregator.
#[async_trait]
pub trait StatusProbes: Send + Sync {
    async fn daemon(&self, coin: Coin) -> DaemonStatus;
    async fn cache(&self) -> CacheStatus;
}

/// Probes against the real endpoints.
#[derive(Debug, Clone)]
pub struct NetworkProbes {
    endpoints: Endpoints,
    daemon: DaemonProbe,
    cache: CacheProbe,
}

impl NetworkProbes {
    pub fn new(endpoints: Endpoints) -> Self {
        Self { endpoints, daemon: DaemonProbe::new(), cache: CacheProbe::new() }
    }
}

#[async_trait]
impl StatusProbes for NetworkProbes {
    async fn daemon(&self, coin: Coin) -> DaemonStatus {
        self.daemon.blockchain_info(self.endpoints.daemon(coin)).await
    }

    async fn cache(&self) -> CacheStatus {
        self.cache.ping(&self.endpoints.cache).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_and_sync_rules() {
        let s = ChainSync::new("main".into(), 100, 102, Some(0.99951));
        assert_eq!(s.progress, "100.0");
        assert!(s.synced);

        let s = ChainSync::new("main".into(), 100, 103, Some(0.4567));
        assert_eq!(s.progress, "45.7");
        assert!(!s.synced);

        let s = ChainSync::new("test".into(), 0, 0, None);
        assert_eq!(s.progress, "100.0");
        assert!(s.synced);

        let s = ChainSync::new("regtest".into(), 0, 50, Some(0.0));
        assert_eq!(s.progress, "100.0");
        assert!(!s.synced);
    }

    #[test]
    fn online_and_offline_shapes() {
        let on = serde_json::to_value(DaemonStatus::online(ChainSync::new("main".into(), 5, 5, Some(1.0)))).unwrap();
        assert_eq!(on["online"], true);
        assert_eq!(on["chain"], "main");
        assert_eq!(on["blocks"], 5);
        assert!(on.get("error").is_none());

        let off = serde_json::to_value(DaemonStatus::offline("timeout")).unwrap();
        assert_eq!(off, serde_json::json!({"online": false, "error": "timeout"}));
    }
}
