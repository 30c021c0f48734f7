#![forbid(unsafe_code)]

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::BoxFuture;
use poolwarden_core::{Coin, ConfigGenerator, Endpoints, GeneratorOptions, PoolSettings};
use poolwarden_daemon::probe::{CacheStatus, ChainSync, DaemonStatus, StatusProbes};
use poolwarden_daemon::settings_store::SettingsStore;
use poolwarden_daemon::supervisor::{ProcessHandle, ProcessSupervisor, Spawner};
use poolwarden_daemon::{OrchestrationController, StatusAggregator};

/// Children that run until terminated.
#[derive(Default)]
struct RecordingSpawner {
    spawns: AtomicUsize,
    fail: AtomicBool,
}

struct IdleChild {
    pid: u32,
    killed: bool,
}

impl ProcessHandle for IdleChild {
    fn pid(&self) -> Option<u32> {
        Some(self.pid)
    }

    fn terminate(&mut self) -> io::Result<()> {
        self.killed = true;
        Ok(())
    }

    fn wait(&mut self) -> BoxFuture<'_, io::Result<Option<i32>>> {
        let killed = self.killed;
        Box::pin(async move {
            if killed {
                Ok(None)
            } else {
                futures::future::pending().await
            }
        })
    }
}

impl Spawner for RecordingSpawner {
    fn spawn(&self) -> io::Result<Box<dyn ProcessHandle>> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::NotFound, "mono: No such file or directory"));
        }
        let n = self.spawns.fetch_add(1, Ordering::SeqCst) as u32;
        Ok(Box::new(IdleChild { pid: 4000 + n, killed: false }))
    }
}

struct StubProbes;

#[async_trait]
impl StatusProbes for StubProbes {
    async fn daemon(&self, coin: Coin) -> DaemonStatus {
        match coin {
            Coin::Btc => DaemonStatus::online(ChainSync::new("main".into(), 100, 100, Some(1.0))),
            _ => DaemonStatus::offline("connect ECONNREFUSED"),
        }
    }

    async fn cache(&self) -> CacheStatus {
        CacheStatus { online: true }
    }
}

struct Harness {
    _dir: tempfile::TempDir,
    settings_path: PathBuf,
    artifacts: PathBuf,
    spawner: Arc<RecordingSpawner>,
    controller: OrchestrationController<StubProbes>,
}

fn harness() -> Harness {
    let dir = tempfile::tempdir().unwrap();
    harness_at(dir, None)
}

fn harness_at(dir: tempfile::TempDir, artifacts: Option<PathBuf>) -> Harness {
    let settings_path = dir.path().join("data").join("pool-config.json");
    let artifacts = artifacts.unwrap_or_else(|| dir.path().join("pool").join("config"));
    let endpoints = Endpoints::from_lookup(|_| None).unwrap();
    let spawner = Arc::new(RecordingSpawner::default());
    let controller = OrchestrationController::new(
        SettingsStore::new(&settings_path),
        ConfigGenerator::new(&artifacts, endpoints, GeneratorOptions::default()),
        ProcessSupervisor::new(spawner.clone(), Duration::from_secs(2)),
        StatusAggregator::new(StubProbes),
    );
    Harness { _dir: dir, settings_path, artifacts, spawner, controller }
}

fn btc_only() -> PoolSettings {
    PoolSettings { enable_btc: true, btc_address: "bc1qexamplewalletaddress".into(), ..Default::default() }
}

fn exists(p: &Path) -> bool {
    p.exists()
}

#[tokio::test]
async fn invalid_setup_touches_nothing() {
    let h = harness();
    let outcome = h
        .controller
        .setup(PoolSettings { enable_merge_mining: true, ..Default::default() })
        .await
        .unwrap();
    assert!(!outcome.ok);
    assert_eq!(
        outcome.errors,
        vec!["Dogecoin wallet address is required for merge mining", "Enable at least one pool"]
    );
    assert!(!exists(&h.settings_path));
    assert!(!exists(&h.artifacts));
    assert_eq!(h.spawner.spawns.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn setup_persists_generates_and_starts() {
    let h = harness();
    let outcome = h.controller.setup(btc_only()).await.unwrap();
    assert!(outcome.ok);
    assert_eq!(outcome.pool_started, Some(true));
    assert!(exists(&h.settings_path));
    assert!(exists(&h.artifacts.join("pools/bitcoin-pool.json")));
    assert!(exists(&h.artifacts.join("stack.json")));
    assert_eq!(h.spawner.spawns.load(Ordering::SeqCst), 1);

    let snap = h.controller.status().await;
    assert!(snap.configured);
    assert!(snap.pool_running);
    assert_eq!(snap.config.as_ref().unwrap().btc_address, "bc1qexam...");
    assert!(snap.daemons[&Coin::Btc].online);
    assert!(!snap.daemons[&Coin::Ltc].online);
    assert!(snap.cache.online);
}

#[tokio::test]
async fn restart_without_settings_is_refused() {
    let h = harness();
    let outcome = h.controller.restart().await.unwrap();
    assert!(!outcome.ok);
    assert_eq!(outcome.errors, vec!["Not configured yet"]);
    assert!(!exists(&h.artifacts));
    assert_eq!(h.spawner.spawns.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn restart_replaces_the_process() {
    let h = harness();
    h.controller.setup(btc_only()).await.unwrap();
    let first = h.controller.supervisor().pid();
    let outcome = h.controller.restart().await.unwrap();
    assert_eq!(outcome.pool_started, Some(true));
    assert_eq!(h.spawner.spawns.load(Ordering::SeqCst), 2);
    assert_ne!(h.controller.supervisor().pid(), first);
    assert!(h.controller.supervisor().is_running());
    // The retired instance was reaped.
    assert_eq!(h.controller.supervisor().last_exit().map(|e| e.code), Some(None));
}

#[tokio::test]
async fn stop_always_succeeds() {
    let h = harness();
    assert!(h.controller.stop().await.ok);
    h.controller.setup(btc_only()).await.unwrap();
    assert!(h.controller.stop().await.ok);
    assert!(!h.controller.supervisor().is_running());
    let snap = h.controller.status().await;
    assert!(snap.configured);
    assert!(!snap.pool_running);
}

#[tokio::test]
async fn spawn_failure_still_saves_and_reports_not_started() {
    let h = harness();
    h.spawner.fail.store(true, Ordering::SeqCst);
    let outcome = h.controller.setup(btc_only()).await.unwrap();
    assert!(outcome.ok);
    assert_eq!(outcome.pool_started, Some(false));
    assert!(exists(&h.settings_path));
    assert!(!h.controller.supervisor().is_running());
}

#[tokio::test]
async fn generation_failure_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let blocked = dir.path().join("blocked");
    std::fs::write(&blocked, b"file in the way").unwrap();
    let h = harness_at(dir, Some(blocked.join("config")));
    let err = h.controller.setup(btc_only()).await.unwrap_err();
    assert!(err.to_string().contains("writing"), "{err}");
    assert_eq!(h.spawner.spawns.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn auto_start_follows_saved_settings() {
    let h = harness();
    assert!(!h.controller.auto_start().await.unwrap());
    assert_eq!(h.spawner.spawns.load(Ordering::SeqCst), 0);

    h.controller.store().save(&btc_only()).await.unwrap();
    assert!(h.controller.auto_start().await.unwrap());
    assert!(h.controller.supervisor().is_running());
    assert!(exists(&h.artifacts.join("pools/bitcoin-pool.json")));
}

#[tokio::test]
async fn reconfiguring_drops_the_disabled_pool() {
    let h = harness();
    h.controller.setup(btc_only()).await.unwrap();
    let outcome = h
        .controller
        .setup(PoolSettings {
            enable_ltc_doge: true,
            enable_merge_mining: true,
            ltc_address: "ltc1qexample".into(),
            doge_address: "DExampleDoge".into(),
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(outcome.ok);
    assert!(!exists(&h.artifacts.join("pools/bitcoin-pool.json")));
    assert!(exists(&h.artifacts.join("pools/litecoin-pool.json")));
    assert_eq!(h.spawner.spawns.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn setup_with_merge_mining_wires_dogecoin_into_litecoin_pool() {
    let h = harness();
    let outcome = h
        .controller
        .setup(PoolSettings {
            enable_btc: true,
            enable_ltc_doge: true,
            enable_merge_mining: true,
            btc_address: "bc1qexamplewalletaddress".into(),
            ltc_address: "ltc1qexamplewallet".into(),
            doge_address: "DExampleDogeWallet".into(),
        })
        .await
        .unwrap();
    assert!(outcome.ok);
    assert!(exists(&h.artifacts.join("pools/bitcoin-pool.json")));

    let raw = std::fs::read(h.artifacts.join("pools/litecoin-pool.json")).unwrap();
    let ltc: serde_json::Value = serde_json::from_slice(&raw).unwrap();
    let aux = &ltc["mergedMining"]["auxiliaries"][0];
    assert_eq!(ltc["mergedMining"]["enabled"], true);
    assert_eq!(aux["coin"], "dogecoin.json");
    assert_eq!(aux["wallet"]["address"], "DExampleDogeWallet");
    assert_eq!(ltc["wallet"]["address"], "ltc1qexamplewallet");
}
