use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{
	fs,
	net::SocketAddr,
	path::{Path, PathBuf},
};

/// File name of the persisted settings inside `data_dir`.
pub const SETTINGS_FILE: &str = "pool-config.json";

/// Runtime configuration of the shim itself (not of the pool engine).
///
/// Sources, lowest precedence first: built-in defaults, an optional TOML file,
/// environment variables.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RuntimeConfig {
	/// Where the settings document is persisted.
	pub data_dir: PathBuf,
	/// Install directory of the pool engine; artifacts go to `<pool_dir>/config`.
	pub pool_dir: PathBuf,
	/// Bind address of the JSON status/control API.
	pub listen: SocketAddr,
	pub log_level: String,
	pub pool_program: String,
	pub pool_args: Vec<String>,
	pub website_port: u16,
	pub btc_stratum_port: u16,
	pub ltc_stratum_port: u16,
	/// How long to wait for a terminated pool process to exit before moving on.
	pub stop_timeout_secs: u64,
}

impl Default for RuntimeConfig {
	fn default() -> Self {
		Self {
			data_dir: PathBuf::from("/app/data"),
			pool_dir: PathBuf::from("/app/coiniumserv"),
			listen: SocketAddr::from(([0, 0, 0, 0], 8080)),
			log_level: "info".into(),
			pool_program: "mono".into(),
			pool_args: vec!["CoiniumServ.exe".into()],
			website_port: 9999,
			btc_stratum_port: 3333,
			ltc_stratum_port: 3334,
			stop_timeout_secs: 10,
		}
	}
}

impl RuntimeConfig {
	pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
		let data = fs::read_to_string(path)?;
		let cfg: Self = toml::from_str(&data).map_err(|e| Error::config(format!("toml parse error: {e}")))?;
		cfg.validate()?;
		Ok(cfg)
	}

	/// File (when given) plus environment overrides, validated.
	pub fn load(path: Option<&Path>) -> Result<Self> {
		let mut cfg = match path {
			Some(p) => {
				let data = fs::read_to_string(p)?;
				toml::from_str(&data).map_err(|e| Error::config(format!("toml parse error: {e}")))?
			}
			None => Self::default(),
		};
		cfg.apply_env(|key| std::env::var(key).ok())?;
		cfg.validate()?;
		Ok(cfg)
	}

	/// Apply `DATA_DIR`, `POOL_DIR`, `POOLWARDEN_LISTEN` and `POOLWARDEN_LOG_LEVEL`.
	pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
	where
		F: Fn(&str) -> Option<String>,
	{
		let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
		if let Some(v) = get("DATA_DIR") { self.data_dir = PathBuf::from(v); }
		if let Some(v) = get("POOL_DIR") { self.pool_dir = PathBuf::from(v); }
		if let Some(v) = get("POOLWARDEN_LISTEN") {
			self.listen = v.parse().map_err(|e| Error::config(format!("invalid POOLWARDEN_LISTEN {v}: {e}")))?;
		}
		if let Some(v) = get("POOLWARDEN_LOG_LEVEL") { self.log_level = v; }
		Ok(())
	}

	pub fn validate(&self) -> Result<()> {
		let allowed = ["trace", "debug", "info", "warn", "error"];
		if !allowed.contains(&self.log_level.as_str()) {
			return Err(Error::config(format!("invalid log_level: {}", self.log_level)));
		}
		if self.pool_program.trim().is_empty() {
			return Err(Error::config("pool_program must not be empty"));
		}
		for (name, port) in [
			("website_port", self.website_port),
			("btc_stratum_port", self.btc_stratum_port),
			("ltc_stratum_port", self.ltc_stratum_port),
		] {
			if port == 0 {
				return Err(Error::config(format!("{name} must be non-zero")));
			}
		}
		if self.btc_stratum_port == self.ltc_stratum_port {
			return Err(Error::conflict(format!("btc and ltc pools share stratum port {}", self.btc_stratum_port)));
		}
		if self.website_port == self.btc_stratum_port || self.website_port == self.ltc_stratum_port {
			return Err(Error::conflict(format!("website_port {} collides with a stratum port", self.website_port)));
		}
		if !(1..=300).contains(&self.stop_timeout_secs) {
			return Err(Error::config("stop_timeout_secs must be 1..=300"));
		}
		Ok(())
	}

	pub fn write_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
		let text = toml::to_string_pretty(self).map_err(|e| Error::config(format!("toml encode error: {e}")))?;
		fs::write(path, text)?;
		Ok(())
	}

	pub fn settings_path(&self) -> PathBuf { self.data_dir.join(SETTINGS_FILE) }

	/// Root of the artifact tree consumed by the pool engine.
	pub fn artifact_dir(&self) -> PathBuf { self.pool_dir.join("config") }
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn default_is_valid() {
		let cfg = RuntimeConfig::default();
		assert!(cfg.validate().is_ok());
		assert_eq!(cfg.settings_path(), PathBuf::from("/app/data/pool-config.json"));
		assert_eq!(cfg.artifact_dir(), PathBuf::from("/app/coiniumserv/config"));
	}

	#[test]
	fn env_overrides_apply() {
		let mut cfg = RuntimeConfig::default();
		cfg.apply_env(|k| match k {
			"DATA_DIR" => Some("/srv/data".into()),
			"POOLWARDEN_LISTEN" => Some("127.0.0.1:9000".into()),
			"POOLWARDEN_LOG_LEVEL" => Some("".into()),
			_ => None,
		})
		.unwrap();
		assert_eq!(cfg.data_dir, PathBuf::from("/srv/data"));
		assert_eq!(cfg.listen, "127.0.0.1:9000".parse::<SocketAddr>().unwrap());
		assert_eq!(cfg.log_level, "info");
	}

	#[test]
	fn colliding_stratum_ports_rejected() {
		let cfg = RuntimeConfig { ltc_stratum_port: 3333, ..Default::default() };
		let err = cfg.validate().unwrap_err();
		assert!(matches!(err, Error::Conflict(_)), "{err}");
	}
}
