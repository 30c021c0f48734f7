use std::io::ErrorKind;
use std::path::PathBuf;

use poolwarden_core::PoolSettings;
use tracing::debug;

use crate::errors::{DaemonError, Result};

/// Persisted operator settings (a single JSON document).
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `Ok(None)` when nothing has been saved yet.
    pub async fn load(&self) -> Result<Option<PoolSettings>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(b) => b,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| DaemonError::settings(format!("{}: {e}", self.path.display())))
    }

    /// Replace the stored document. Written to a sibling temp file first, then renamed.
    pub async fn save(&self, settings: &PoolSettings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, serde_json::to_vec_pretty(settings)?).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        debug!(path = %self.path.display(), "settings saved");
        Ok(())
    }
}
