/// Error types for the poolwarden daemon
use thiserror::Error;

pub type Result<T, E = DaemonError> = core::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Core(#[from] poolwarden_core::Error),
    #[error("serde: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("settings: {0}")]
    Settings(String),
    #[error("failed to start pool process: {0}")]
    Spawn(String),
}

impl DaemonError {
    pub fn settings(msg: impl Into<String>) -> Self {
        Self::Settings(msg.into())
    }

    pub fn spawn(msg: impl Into<String>) -> Self {
        Self::Spawn(msg.into())
    }
}
