use std::collections::BTreeMap;
use std::sync::Arc;

use futures::future::join_all;
use poolwarden_core::{Coin, PoolSettings, RedactedSettings};
use serde::Serialize;

use crate::probe::{CacheStatus, DaemonStatus, StatusProbes};
use crate::supervisor::ExitRecord;

/// Everything the status view shows, assembled in one pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    pub configured: bool,
    pub pool_running: bool,
    pub config: Option<RedactedSettings>,
    pub daemons: BTreeMap<Coin, DaemonStatus>,
    #[serde(rename = "redis")]
    pub cache: CacheStatus,
    pub last_exit: Option<ExitRecord>,
}

/// Fans out every probe concurrently and waits for all of them.
pub struct StatusAggregator<P> {
    probes: Arc<P>,
}

impl<P> Clone for StatusAggregator<P> {
    fn clone(&self) -> Self {
        Self { probes: Arc::clone(&self.probes) }
    }
}

impl<P: StatusProbes> StatusAggregator<P> {
    pub fn new(probes: P) -> Self {
        Self { probes: Arc::new(probes) }
    }

    pub async fn snapshot(
        &self,
        settings: Option<&PoolSettings>,
        pool_running: bool,
        last_exit: Option<ExitRecord>,
    ) -> StatusSnapshot {
        let daemons = join_all(Coin::ALL.iter().map(|&coin| async move { (coin, self.probes.daemon(coin).await) }));
        let (daemons, cache) = tokio::join!(daemons, self.probes.cache());
        StatusSnapshot {
            configured: settings.is_some(),
            pool_running,
            config: settings.map(RedactedSettings::from),
            daemons: daemons.into_iter().collect(),
            cache,
            last_exit,
        }
    }
}
