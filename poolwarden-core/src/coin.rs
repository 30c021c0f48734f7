//! Static catalogue of the coins the pool stack knows about.

use serde::{Deserialize, Serialize};

/// A coin with a daemon the shim talks to.
///
/// Serializes as the lowercase ticker (`"btc"`), which is also the key used in
/// status snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Coin {
	Btc,
	Ltc,
	Doge,
}

/// Block explorer URL templates; `{0}` is replaced by the downstream engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Explorer {
	pub block: &'static str,
	pub tx: &'static str,
	pub address: &'static str,
}

impl Coin {
	pub const ALL: [Coin; 3] = [Coin::Btc, Coin::Ltc, Coin::Doge];

	pub fn name(self) -> &'static str {
		match self {
			Coin::Btc => "Bitcoin",
			Coin::Ltc => "Litecoin",
			Coin::Doge => "Dogecoin",
		}
	}

	pub fn symbol(self) -> &'static str {
		match self {
			Coin::Btc => "BTC",
			Coin::Ltc => "LTC",
			Coin::Doge => "DOGE",
		}
	}

	pub fn algorithm(self) -> &'static str {
		match self {
			Coin::Btc => "sha256d",
			Coin::Ltc | Coin::Doge => "scrypt",
		}
	}

	pub fn site(self) -> &'static str {
		match self {
			Coin::Btc => "https://bitcoin.org",
			Coin::Ltc => "https://litecoin.org",
			Coin::Doge => "https://dogecoin.com",
		}
	}

	pub fn explorer(self) -> Explorer {
		match self {
			Coin::Btc => Explorer {
				block: "https://mempool.space/block/{0}",
				tx: "https://mempool.space/tx/{0}",
				address: "https://mempool.space/address/{0}",
			},
			Coin::Ltc => Explorer {
				block: "https://blockchair.com/litecoin/block/{0}",
				tx: "https://blockchair.com/litecoin/transaction/{0}",
				address: "https://blockchair.com/litecoin/address/{0}",
			},
			Coin::Doge => Explorer {
				block: "https://blockchair.com/dogecoin/block/{0}",
				tx: "https://blockchair.com/dogecoin/transaction/{0}",
				address: "https://blockchair.com/dogecoin/address/{0}",
			},
		}
	}

	/// File name of the coin definition, referenced by pool definitions.
	pub fn definition_file(self) -> &'static str {
		match self {
			Coin::Btc => "bitcoin.json",
			Coin::Ltc => "litecoin.json",
			Coin::Doge => "dogecoin.json",
		}
	}

	/// Prefix of the `<PREFIX>_DAEMON_*` environment variables.
	pub fn env_prefix(self) -> &'static str { self.symbol() }

	pub fn default_daemon_host(self) -> &'static str {
		match self {
			Coin::Btc => "bitcoind",
			Coin::Ltc => "litecoind",
			Coin::Doge => "dogecoind",
		}
	}

	pub fn default_rpc_port(self) -> u16 {
		match self {
			Coin::Btc => 8332,
			Coin::Ltc => 9332,
			Coin::Doge => 22555,
		}
	}
}
