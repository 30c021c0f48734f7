//! Composition root: validation, persistence, generation and supervision.

use std::sync::Arc;
use std::time::Duration;

use poolwarden_core::{ConfigGenerator, Endpoints, GeneratorOptions, PoolSettings, RuntimeConfig, ValidatedSettings};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::Result;
use crate::probe::{NetworkProbes, StatusProbes};
use crate::settings_store::SettingsStore;
use crate::status::{StatusAggregator, StatusSnapshot};
use crate::supervisor::{CommandSpawner, ProcessSupervisor};

pub const NOT_CONFIGURED: &str = "Not configured yet";

/// Result of a setup / restart / stop request.
///
/// `ok == false` means the request was refused (bad settings, nothing saved);
/// failures while carrying it out come back as `Err` instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationOutcome {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pool_started: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl OperationOutcome {
    pub fn started(pool_started: bool) -> Self {
        Self { ok: true, pool_started: Some(pool_started), errors: Vec::new() }
    }

    pub fn done() -> Self {
        Self { ok: true, pool_started: None, errors: Vec::new() }
    }

    pub fn rejected(errors: Vec<String>) -> Self {
        Self { ok: false, pool_started: None, errors }
    }
}

pub struct OrchestrationController<P> {
    store: SettingsStore,
    generator: ConfigGenerator,
    supervisor: ProcessSupervisor,
    aggregator: StatusAggregator<P>,
    // setup / restart / stop / auto-start are mutually exclusive; status never takes this.
    ops: tokio::sync::Mutex<()>,
}

impl OrchestrationController<NetworkProbes> {
    /// Production wiring from the runtime configuration.
    pub fn from_config(cfg: &RuntimeConfig, endpoints: Endpoints) -> Self {
        let generator = ConfigGenerator::new(cfg.artifact_dir(), endpoints.clone(), GeneratorOptions::from(cfg));
        let supervisor = ProcessSupervisor::new(
            Arc::new(CommandSpawner::from_config(cfg)),
            Duration::from_secs(cfg.stop_timeout_secs),
        );
        Self::new(
            SettingsStore::new(cfg.settings_path()),
            generator,
            supervisor,
            StatusAggregator::new(NetworkProbes::new(endpoints)),
        )
    }
}

impl<P: StatusProbes> OrchestrationController<P> {
    pub fn new(
        store: SettingsStore,
        generator: ConfigGenerator,
        supervisor: ProcessSupervisor,
        aggregator: StatusAggregator<P>,
    ) -> Self {
        Self { store, generator, supervisor, aggregator, ops: tokio::sync::Mutex::new(()) }
    }

    pub fn supervisor(&self) -> &ProcessSupervisor {
        &self.supervisor
    }

    pub fn store(&self) -> &SettingsStore {
        &self.store
    }

    /// Validate, persist, regenerate artifacts and (re)start the pool.
    pub async fn setup(&self, settings: PoolSettings) -> Result<OperationOutcome> {
        let validated = match settings.validate() {
            Ok(v) => v,
            Err(errors) => {
                info!(%errors, "setup rejected");
                return Ok(OperationOutcome::rejected(errors.into_messages()));
            }
        };
        let _guard = self.ops.lock().await;
        self.store.save(validated.settings()).await?;
        self.apply(&validated).await.map(OperationOutcome::started)
    }

    /// Regenerate from the saved settings and restart the pool.
    pub async fn restart(&self) -> Result<OperationOutcome> {
        let _guard = self.ops.lock().await;
        let Some(settings) = self.store.load().await? else {
            return Ok(OperationOutcome::rejected(vec![NOT_CONFIGURED.to_string()]));
        };
        match settings.validate() {
            Ok(validated) => self.apply(&validated).await.map(OperationOutcome::started),
            Err(errors) => {
                warn!(%errors, "saved settings no longer validate");
                Ok(OperationOutcome::rejected(errors.into_messages()))
            }
        }
    }

    pub async fn stop(&self) -> OperationOutcome {
        let _guard = self.ops.lock().await;
        self.supervisor.stop().await;
        OperationOutcome::done()
    }

    pub async fn status(&self) -> StatusSnapshot {
        let settings = match self.store.load().await {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, "saved settings unreadable; reporting unconfigured");
                None
            }
        };
        self.aggregator
            .snapshot(settings.as_ref(), self.supervisor.is_running(), self.supervisor.last_exit())
            .await
    }

    /// Boot-time start from saved settings. Returns whether the pool was started.
    pub async fn auto_start(&self) -> Result<bool> {
        let _guard = self.ops.lock().await;
        let Some(settings) = self.store.load().await? else {
            info!("no saved settings; waiting for setup");
            return Ok(false);
        };
        match settings.validate() {
            Ok(validated) => {
                info!("saved settings found; starting pool");
                self.apply(&validated).await
            }
            Err(errors) => {
                warn!(%errors, "saved settings invalid; not starting pool");
                Ok(false)
            }
        }
    }

    /// Generate artifacts and start the process. Spawn failure is reported, not raised.
    async fn apply(&self, validated: &ValidatedSettings) -> Result<bool> {
        self.generator.generate(validated)?;
        match self.supervisor.start().await {
            Ok(_) => Ok(true),
            Err(e) => {
                warn!(error = %e, "pool not started");
                Ok(false)
            }
        }
    }
}
