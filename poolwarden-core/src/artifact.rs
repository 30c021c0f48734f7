//! Typed schemas of the documents the pool engine reads.
//!
//! Field names are a stable external contract and serialize in camelCase
//! exactly as the engine expects. Nothing outside this module builds raw JSON.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoinDefinition {
	pub name: String,
	pub symbol: String,
	pub algorithm: String,
	pub site: String,
	pub block_explorer: BlockExplorer,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockExplorer {
	pub block: String,
	pub tx: String,
	pub address: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolDefinition {
	pub enabled: bool,
	/// File name of the referenced coin definition.
	pub coin: String,
	pub daemon: DaemonSection,
	pub meta: Meta,
	pub wallet: Wallet,
	pub rewards: Vec<Reward>,
	pub payment: Payment,
	pub miner: Miner,
	pub job: Job,
	pub stratum: Stratum,
	pub banning: Banning,
	pub storage: Storage,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub merged_mining: Option<MergedMining>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaemonSection {
	pub host: String,
	pub port: u16,
	pub username: String,
	pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
	pub title: String,
	pub front_end: String,
	pub tx_message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
	pub address: String,
}

/// Fixed reward split entry; no pool currently emits any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reward {
	pub address: String,
	pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
	pub enabled: bool,
	/// Seconds between payment rounds.
	pub interval: u32,
	pub minimum: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Miner {
	pub validate_username: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
	pub block_refresh_interval: u32,
	pub rebroadcast_timeout: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stratum {
	pub enabled: bool,
	pub bind: String,
	pub port: u16,
	pub diff: u64,
	pub vardiff: Vardiff,
}

/// Per-connection difficulty retargeting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vardiff {
	pub enabled: bool,
	pub min_diff: u64,
	pub max_diff: u64,
	/// Desired seconds between shares.
	pub target_time: u32,
	pub retarget_time: u32,
	pub variance_percent: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Banning {
	pub enabled: bool,
	pub duration: u32,
	pub invalid_percent: u32,
	pub check_threshold: u32,
	pub purge_interval: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Storage {
	pub hybrid: HybridStorage,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HybridStorage {
	pub enabled: bool,
	pub redis: RedisStorage,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedisStorage {
	pub host: String,
	pub port: u16,
	pub password: String,
	/// Cache namespace; unique per pool.
	pub database_id: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedMining {
	pub enabled: bool,
	pub auxiliaries: Vec<AuxiliaryPool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuxiliaryPool {
	pub enabled: bool,
	pub coin: String,
	pub daemon: DaemonSection,
	pub wallet: Wallet,
	pub payment: Payment,
}

/// Global engine settings (`stack.json`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackConfig {
	pub log_manager: LogManager,
	pub website: Website,
	pub metrics: Toggle,
	pub statistics: Statistics,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogManager {
	pub enabled: bool,
	pub log_level: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Website {
	pub enabled: bool,
	pub bind: String,
	pub port: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toggle {
	pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
	pub update_interval: u32,
	pub hashrate_window: u32,
}
