use std::path::PathBuf;

use thiserror::Error;

pub type Result<T, E = Error> = core::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
	#[error("io: {0}")]
	Io(#[from] std::io::Error),
	#[error("serde: {0}")]
	Serde(#[from] serde_json::Error),
	#[error("config: {0}")]
	Config(String),
	/// Two pools would share a port or a cache namespace.
	#[error("conflict: {0}")]
	Conflict(String),
	#[error("writing {}: {source}", path.display())]
	Write {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
}

impl Error {
	pub fn config(msg: impl Into<String>) -> Self { Self::Config(msg.into()) }
	pub fn conflict(msg: impl Into<String>) -> Self { Self::Conflict(msg.into()) }
	pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
		Self::Write { path: path.into(), source }
	}
}
