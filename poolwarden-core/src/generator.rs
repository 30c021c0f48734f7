//! Settings → pool engine artifacts.
//!
//! [`ArtifactSet::build`] is pure. [`ArtifactSet::write_to`] lays the set out
//! on disk, overwriting whatever a previous generation left. Writes are
//! independent: the first failure is returned and earlier files stay written.

use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::artifact::*;
use crate::coin::Coin;
use crate::config::RuntimeConfig;
use crate::endpoint::{DaemonEndpoint, Endpoints};
use crate::error::{Error, Result};
use crate::settings::ValidatedSettings;

const STRATUM_BIND: &str = "0.0.0.0";
const FRONT_END: &str = "embedded";

/// A pool the engine can run. Each kind owns one stratum port and one cache namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PoolKind {
	Bitcoin,
	Litecoin,
}

impl PoolKind {
	pub const ALL: [PoolKind; 2] = [PoolKind::Bitcoin, PoolKind::Litecoin];

	pub fn coin(self) -> Coin {
		match self {
			PoolKind::Bitcoin => Coin::Btc,
			PoolKind::Litecoin => Coin::Ltc,
		}
	}

	pub fn file_name(self) -> &'static str {
		match self {
			PoolKind::Bitcoin => "bitcoin-pool.json",
			PoolKind::Litecoin => "litecoin-pool.json",
		}
	}

	/// Redis database id isolating this pool's counters.
	pub fn database_id(self) -> u8 {
		match self {
			PoolKind::Bitcoin => 0,
			PoolKind::Litecoin => 1,
		}
	}

	fn profile(self) -> PoolProfile {
		match self {
			PoolKind::Bitcoin => PoolProfile {
				title: "Bitcoin Pool",
				tx_message: "umbrelOS/CoiniumServ",
				payment_interval: 240,
				payment_minimum: 0.001,
				diff: 65_536,
				min_diff: 16_384,
				max_diff: 2_147_483_648,
			},
			PoolKind::Litecoin => PoolProfile {
				title: "Litecoin + Dogecoin Pool",
				tx_message: "umbrelOS/CoiniumServ merge-mined",
				payment_interval: 120,
				payment_minimum: 0.01,
				diff: 32,
				min_diff: 8,
				max_diff: 524_288,
			},
		}
	}
}

struct PoolProfile {
	title: &'static str,
	tx_message: &'static str,
	payment_interval: u32,
	payment_minimum: f64,
	diff: u64,
	min_diff: u64,
	max_diff: u64,
}

/// Knobs taken from the runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorOptions {
	pub log_level: String,
	pub website_port: u16,
	pub btc_stratum_port: u16,
	pub ltc_stratum_port: u16,
}

impl Default for GeneratorOptions {
	fn default() -> Self { Self::from(&RuntimeConfig::default()) }
}

impl From<&RuntimeConfig> for GeneratorOptions {
	fn from(cfg: &RuntimeConfig) -> Self {
		Self {
			log_level: cfg.log_level.clone(),
			website_port: cfg.website_port,
			btc_stratum_port: cfg.btc_stratum_port,
			ltc_stratum_port: cfg.ltc_stratum_port,
		}
	}
}

impl GeneratorOptions {
	fn stratum_port(&self, kind: PoolKind) -> u16 {
		match kind {
			PoolKind::Bitcoin => self.btc_stratum_port,
			PoolKind::Litecoin => self.ltc_stratum_port,
		}
	}
}

/// The complete set of documents for one generation.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactSet {
	pub coins: Vec<(Coin, CoinDefinition)>,
	pub pools: Vec<(PoolKind, PoolDefinition)>,
	pub stack: StackConfig,
}

impl ArtifactSet {
	pub fn build(settings: &ValidatedSettings, endpoints: &Endpoints, options: &GeneratorOptions) -> Result<Self> {
		let coins = Coin::ALL.iter().map(|&c| (c, coin_definition(c))).collect();

		let mut pools = Vec::with_capacity(PoolKind::ALL.len());
		if let Some(wallet) = settings.bitcoin() {
			pools.push((PoolKind::Bitcoin, pool_definition(PoolKind::Bitcoin, wallet.as_str(), endpoints, options)));
		}
		if let Some(ltc) = settings.litecoin() {
			let mut pool = pool_definition(PoolKind::Litecoin, ltc.wallet.as_str(), endpoints, options);
			if let Some(doge_wallet) = &ltc.merge_mining {
				pool.merged_mining = Some(MergedMining {
					enabled: true,
					auxiliaries: vec![AuxiliaryPool {
						enabled: true,
						coin: Coin::Doge.definition_file().to_string(),
						daemon: daemon_section(&endpoints.doge),
						wallet: Wallet { address: doge_wallet.as_str().to_string() },
						payment: Payment { enabled: true, interval: 120, minimum: 10.0 },
					}],
				});
			}
			pools.push((PoolKind::Litecoin, pool));
		}

		let set = Self { coins, pools, stack: stack_config(options) };
		set.check_isolation()?;
		Ok(set)
	}

	pub fn pool(&self, kind: PoolKind) -> Option<&PoolDefinition> {
		self.pools.iter().find(|(k, _)| *k == kind).map(|(_, p)| p)
	}

	/// Pools never share a listening port or a cache namespace.
	fn check_isolation(&self) -> Result<()> {
		let mut ports = HashSet::new();
		let mut namespaces = HashSet::new();
		for (kind, pool) in &self.pools {
			if !ports.insert(pool.stratum.port) {
				return Err(Error::conflict(format!("{kind:?} pool reuses stratum port {}", pool.stratum.port)));
			}
			let db = pool.storage.hybrid.redis.database_id;
			if !namespaces.insert(db) {
				return Err(Error::conflict(format!("{kind:?} pool reuses cache database id {db}")));
			}
		}
		Ok(())
	}

	/// Write every document under `dir` and drop pool files of pools that are
	/// no longer enabled. Returns the written paths.
	pub fn write_to(&self, dir: &Path) -> Result<Vec<PathBuf>> {
		let coins_dir = dir.join("coins");
		let pools_dir = dir.join("pools");
		for d in [&coins_dir, &pools_dir] {
			fs::create_dir_all(d).map_err(|e| Error::write(d, e))?;
		}

		let mut written = Vec::with_capacity(self.coins.len() + self.pools.len() + 1);
		for (coin, def) in &self.coins {
			written.push(write_json(&coins_dir.join(coin.definition_file()), def)?);
		}
		for (kind, def) in &self.pools {
			written.push(write_json(&pools_dir.join(kind.file_name()), def)?);
		}
		for kind in PoolKind::ALL {
			if self.pool(kind).is_some() {
				continue;
			}
			let stale = pools_dir.join(kind.file_name());
			match fs::remove_file(&stale) {
				Ok(()) => info!("removed stale pool definition {}", stale.display()),
				Err(e) if e.kind() == ErrorKind::NotFound => {}
				Err(e) => return Err(Error::write(stale, e)),
			}
		}
		written.push(write_json(&dir.join("stack.json"), &self.stack)?);
		Ok(written)
	}
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<PathBuf> {
	let bytes = serde_json::to_vec_pretty(value)?;
	fs::write(path, bytes).map_err(|e| Error::write(path, e))?;
	debug!("wrote {}", path.display());
	Ok(path.to_path_buf())
}

/// Builds and writes artifacts for a fixed output directory and endpoint set.
#[derive(Debug, Clone)]
pub struct ConfigGenerator {
	dir: PathBuf,
	endpoints: Endpoints,
	options: GeneratorOptions,
}

impl ConfigGenerator {
	pub fn new(dir: impl Into<PathBuf>, endpoints: Endpoints, options: GeneratorOptions) -> Self {
		Self { dir: dir.into(), endpoints, options }
	}

	pub fn generate(&self, settings: &ValidatedSettings) -> Result<ArtifactSet> {
		let set = ArtifactSet::build(settings, &self.endpoints, &self.options)?;
		let written = set.write_to(&self.dir)?;
		info!(files = written.len(), pools = set.pools.len(), "pool configuration generated in {}", self.dir.display());
		Ok(set)
	}
}

fn coin_definition(coin: Coin) -> CoinDefinition {
	let explorer = coin.explorer();
	CoinDefinition {
		name: coin.name().to_string(),
		symbol: coin.symbol().to_string(),
		algorithm: coin.algorithm().to_string(),
		site: coin.site().to_string(),
		block_explorer: BlockExplorer {
			block: explorer.block.to_string(),
			tx: explorer.tx.to_string(),
			address: explorer.address.to_string(),
		},
	}
}

fn daemon_section(ep: &DaemonEndpoint) -> DaemonSection {
	DaemonSection {
		host: ep.host.clone(),
		port: ep.port,
		username: ep.username.clone(),
		password: ep.password.clone(),
	}
}

fn pool_definition(kind: PoolKind, wallet: &str, endpoints: &Endpoints, options: &GeneratorOptions) -> PoolDefinition {
	let profile = kind.profile();
	let coin = kind.coin();
	PoolDefinition {
		enabled: true,
		coin: coin.definition_file().to_string(),
		daemon: daemon_section(endpoints.daemon(coin)),
		meta: Meta {
			title: profile.title.to_string(),
			front_end: FRONT_END.to_string(),
			tx_message: profile.tx_message.to_string(),
		},
		wallet: Wallet { address: wallet.to_string() },
		rewards: Vec::new(),
		payment: Payment { enabled: true, interval: profile.payment_interval, minimum: profile.payment_minimum },
		miner: Miner { validate_username: true },
		job: Job { block_refresh_interval: 500, rebroadcast_timeout: 55 },
		stratum: Stratum {
			enabled: true,
			bind: STRATUM_BIND.to_string(),
			port: options.stratum_port(kind),
			diff: profile.diff,
			vardiff: Vardiff {
				enabled: true,
				min_diff: profile.min_diff,
				max_diff: profile.max_diff,
				target_time: 15,
				retarget_time: 90,
				variance_percent: 30,
			},
		},
		banning: Banning { enabled: true, duration: 600, invalid_percent: 50, check_threshold: 100, purge_interval: 300 },
		storage: Storage {
			hybrid: HybridStorage {
				enabled: true,
				redis: RedisStorage {
					host: endpoints.cache.host.clone(),
					port: endpoints.cache.port,
					password: String::new(),
					database_id: kind.database_id(),
				},
			},
		},
		merged_mining: None,
	}
}

fn stack_config(options: &GeneratorOptions) -> StackConfig {
	StackConfig {
		log_manager: LogManager { enabled: true, log_level: options.log_level.clone() },
		website: Website { enabled: true, bind: STRATUM_BIND.to_string(), port: options.website_port },
		metrics: Toggle { enabled: true },
		statistics: Statistics { update_interval: 60, hashrate_window: 600 },
	}
}
