//! User pool settings, their validation, and the redacted status view.

use serde::{Deserialize, Serialize};
use thiserror::Error;

const REDACTED_PREFIX_CHARS: usize = 8;

/// Settings as submitted by the operator and persisted between runs.
///
/// Missing fields default to disabled / empty so partial payloads still parse;
/// validation decides whether they are usable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PoolSettings {
	pub enable_btc: bool,
	pub enable_ltc_doge: bool,
	pub enable_merge_mining: bool,
	pub btc_address: String,
	pub ltc_address: String,
	pub doge_address: String,
}

/// Every problem found in a settings payload, in a stable order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", .0.join("; "))]
pub struct ValidationErrors(Vec<String>);

impl ValidationErrors {
	pub fn messages(&self) -> &[String] { &self.0 }
	pub fn into_messages(self) -> Vec<String> { self.0 }
}

/// A wallet address known to be non-empty after trimming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletAddress(String);

impl WalletAddress {
	pub fn new(raw: &str) -> Option<Self> {
		let trimmed = raw.trim();
		(!trimmed.is_empty()).then(|| Self(trimmed.to_string()))
	}

	pub fn as_str(&self) -> &str { &self.0 }
}

/// Litecoin pool, optionally merge-mining Dogecoin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LitecoinPool {
	pub wallet: WalletAddress,
	pub merge_mining: Option<WalletAddress>,
}

/// Settings that passed validation. Only [`PoolSettings::validate`] builds one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedSettings {
	settings: PoolSettings,
	bitcoin: Option<WalletAddress>,
	litecoin: Option<LitecoinPool>,
}

impl ValidatedSettings {
	/// The normalized settings (addresses trimmed) to persist.
	pub fn settings(&self) -> &PoolSettings { &self.settings }
	pub fn bitcoin(&self) -> Option<&WalletAddress> { self.bitcoin.as_ref() }
	pub fn litecoin(&self) -> Option<&LitecoinPool> { self.litecoin.as_ref() }
}

impl PoolSettings {
	/// Copy with surrounding whitespace removed from every address.
	pub fn normalized(&self) -> Self {
		Self {
			btc_address: self.btc_address.trim().to_string(),
			ltc_address: self.ltc_address.trim().to_string(),
			doge_address: self.doge_address.trim().to_string(),
			..self.clone()
		}
	}

	/// Check every rule and report all failures at once.
	///
	/// Merge mining without a Dogecoin address is rejected outright rather than
	/// silently dropped.
	pub fn validate(&self) -> Result<ValidatedSettings, ValidationErrors> {
		let settings = self.normalized();
		let btc = WalletAddress::new(&settings.btc_address);
		let ltc = WalletAddress::new(&settings.ltc_address);
		let doge = WalletAddress::new(&settings.doge_address);

		let mut errors = Vec::new();
		if settings.enable_btc && btc.is_none() {
			errors.push("Bitcoin wallet address is required".to_string());
		}
		if settings.enable_ltc_doge && ltc.is_none() {
			errors.push("Litecoin wallet address is required".to_string());
		}
		if settings.enable_merge_mining && doge.is_none() {
			errors.push("Dogecoin wallet address is required for merge mining".to_string());
		}
		if !settings.enable_btc && !settings.enable_ltc_doge {
			errors.push("Enable at least one pool".to_string());
		}
		if !errors.is_empty() {
			return Err(ValidationErrors(errors));
		}

		let bitcoin = if settings.enable_btc { btc } else { None };
		let litecoin = match (settings.enable_ltc_doge, ltc) {
			(true, Some(wallet)) => Some(LitecoinPool {
				wallet,
				merge_mining: if settings.enable_merge_mining { doge } else { None },
			}),
			_ => None,
		};
		Ok(ValidatedSettings { settings, bitcoin, litecoin })
	}
}

/// Settings as shown in status output: flags intact, addresses cut to a prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RedactedSettings {
	pub enable_btc: bool,
	pub enable_ltc_doge: bool,
	pub enable_merge_mining: bool,
	pub btc_address: String,
	pub ltc_address: String,
	pub doge_address: String,
}

impl From<&PoolSettings> for RedactedSettings {
	fn from(s: &PoolSettings) -> Self {
		Self {
			enable_btc: s.enable_btc,
			enable_ltc_doge: s.enable_ltc_doge,
			enable_merge_mining: s.enable_merge_mining,
			btc_address: redact_address(&s.btc_address),
			ltc_address: redact_address(&s.ltc_address),
			doge_address: redact_address(&s.doge_address),
		}
	}
}

/// At most the first eight characters followed by `...`, and never more than
/// half of the address. Empty input stays empty.
pub fn redact_address(address: &str) -> String {
	let address = address.trim();
	if address.is_empty() {
		return String::new();
	}
	let keep = REDACTED_PREFIX_CHARS.min(address.chars().count() / 2);
	let prefix: String = address.chars().take(keep).collect();
	format!("{prefix}...")
}
