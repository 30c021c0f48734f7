//! Daemon and cache endpoints resolved from the environment.
//!
//! Resolution happens once at startup and the result is treated as immutable
//! for the lifetime of the process. Empty variables count as unset.

use std::fmt;

use crate::coin::Coin;
use crate::error::{Error, Result};

const DEFAULT_RPC_USER: &str = "umbrel";
const DEFAULT_RPC_PASSWORD: &str = "umbrel";
const DEFAULT_CACHE_HOST: &str = "redis";
const DEFAULT_CACHE_PORT: u16 = 6379;

/// RPC endpoint of one coin daemon.
#[derive(Clone, PartialEq, Eq)]
pub struct DaemonEndpoint {
	pub host: String,
	pub port: u16,
	pub username: String,
	pub password: String,
}

impl DaemonEndpoint {
	pub fn url(&self) -> String { format!("http://{}:{}/", self.host, self.port) }
}

// Keep credentials out of logs.
impl fmt::Debug for DaemonEndpoint {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("DaemonEndpoint")
			.field("host", &self.host)
			.field("port", &self.port)
			.field("username", &self.username)
			.field("password", &"***")
			.finish()
	}
}

/// The shared cache/store service (Redis) used by every pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEndpoint {
	pub host: String,
	pub port: u16,
}

/// Every endpoint the shim needs, one daemon per known coin plus the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
	pub btc: DaemonEndpoint,
	pub ltc: DaemonEndpoint,
	pub doge: DaemonEndpoint,
	pub cache: CacheEndpoint,
}

impl Endpoints {
	/// Resolve from the process environment.
	pub fn from_env() -> Result<Self> { Self::from_lookup(|key| std::env::var(key).ok()) }

	/// Resolve through an arbitrary variable lookup.
	///
	/// `<SYM>_DAEMON_PASS` falls back to `APP_PASSWORD`, then to the stock default.
	pub fn from_lookup<F>(lookup: F) -> Result<Self>
	where
		F: Fn(&str) -> Option<String>,
	{
		let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
		let daemon = |coin: Coin| -> Result<DaemonEndpoint> {
			let prefix = coin.env_prefix();
			let port_key = format!("{prefix}_DAEMON_PORT");
			Ok(DaemonEndpoint {
				host: get(&format!("{prefix}_DAEMON_HOST")).unwrap_or_else(|| coin.default_daemon_host().to_string()),
				port: parse_port(&port_key, get(&port_key), coin.default_rpc_port())?,
				username: get(&format!("{prefix}_DAEMON_USER")).unwrap_or_else(|| DEFAULT_RPC_USER.to_string()),
				password: get(&format!("{prefix}_DAEMON_PASS"))
					.or_else(|| get("APP_PASSWORD"))
					.unwrap_or_else(|| DEFAULT_RPC_PASSWORD.to_string()),
			})
		};
		Ok(Self {
			btc: daemon(Coin::Btc)?,
			ltc: daemon(Coin::Ltc)?,
			doge: daemon(Coin::Doge)?,
			cache: CacheEndpoint {
				host: get("REDIS_HOST").unwrap_or_else(|| DEFAULT_CACHE_HOST.to_string()),
				port: parse_port("REDIS_PORT", get("REDIS_PORT"), DEFAULT_CACHE_PORT)?,
			},
		})
	}

	pub fn daemon(&self, coin: Coin) -> &DaemonEndpoint {
		match coin {
			Coin::Btc => &self.btc,
			Coin::Ltc => &self.ltc,
			Coin::Doge => &self.doge,
		}
	}
}

fn parse_port(key: &str, raw: Option<String>, default: u16) -> Result<u16> {
	match raw {
		None => Ok(default),
		Some(v) => match v.parse::<u16>() {
			Ok(p) if p != 0 => Ok(p),
			_ => Err(Error::config(format!("invalid {key}: {v}"))),
		},
	}
}
