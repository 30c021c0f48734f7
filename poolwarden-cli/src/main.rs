#![forbid(unsafe_code)]

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use poolwarden_core::{ConfigGenerator, Endpoints, GeneratorOptions, PoolSettings, RuntimeConfig};
use serde_json::{json, Value};

mod client;

use client::ControlClient;

/// Exit code when the daemon refused the request.
const EXIT_REFUSED: i32 = 1;
/// Exit code when settings fail validation locally.
const EXIT_INVALID: i32 = 2;

#[derive(Debug, Parser)]
#[command(name = "poolwarden-cli", version, about = "Control the poolwarden daemon and render pool configuration")]
struct Cli {
	/// Control API base URL
	#[arg(long, global = true, env = "POOLWARDEN_URL", default_value = "http://127.0.0.1:8080")]
	endpoint: String,
	/// Request timeout; status probes alone may take several seconds
	#[arg(long, global = true, env = "POOLWARDEN_TIMEOUT_MS", default_value_t = 15_000)]
	timeout_ms: u64,
	/// Runtime configuration (TOML) used by offline commands
	#[arg(long, global = true, env = "POOLWARDEN_CONFIG")]
	config: Option<PathBuf>,
	#[command(subcommand)]
	command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
	/// Pool, daemon and cache status
	Status,
	/// Save settings and (re)start the pool; pools without an address stay disabled
	Setup {
		#[arg(long)]
		btc: Option<String>,
		#[arg(long)]
		ltc: Option<String>,
		/// Dogecoin address, merge-mined into the Litecoin pool
		#[arg(long)]
		doge: Option<String>,
		#[arg(long)]
		no_merge_mining: bool,
	},
	/// Regenerate from saved settings and restart the pool
	Restart,
	/// Stop the pool process
	Stop,
	/// Render pool configuration offline from a settings JSON file
	Generate {
		#[arg(long)]
		settings: PathBuf,
		/// Output directory (defaults to the configured artifact directory)
		#[arg(long)]
		out: Option<PathBuf>,
	},
	/// Runtime configuration helpers
	Config {
		#[command(subcommand)]
		action: ConfigAction,
	},
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
	/// Print the resolved runtime configuration
	Show,
}

fn setup_settings(btc: Option<String>, ltc: Option<String>, doge: Option<String>, no_merge_mining: bool) -> PoolSettings {
	PoolSettings {
		enable_btc: btc.is_some(),
		enable_ltc_doge: ltc.is_some(),
		enable_merge_mining: doge.is_some() && !no_merge_mining,
		btc_address: btc.unwrap_or_default(),
		ltc_address: ltc.unwrap_or_default(),
		doge_address: doge.unwrap_or_default(),
	}
}

fn print_json(v: &Value) -> Result<()> {
	println!("{}", serde_json::to_string_pretty(v)?);
	Ok(())
}

/// Print an operation outcome; refused requests become exit code 1.
fn finish(outcome: Value) -> Result<i32> {
	print_json(&outcome)?;
	Ok(if outcome["ok"].as_bool() == Some(true) { 0 } else { EXIT_REFUSED })
}

fn generate(cfg_path: Option<&std::path::Path>, settings: PathBuf, out: Option<PathBuf>) -> Result<i32> {
	let cfg = RuntimeConfig::load(cfg_path).context("loading runtime configuration")?;
	let raw = std::fs::read(&settings).with_context(|| format!("reading {}", settings.display()))?;
	let settings: PoolSettings = serde_json::from_slice(&raw).context("parsing settings")?;
	let validated = match settings.validate() {
		Ok(v) => v,
		Err(errors) => {
			for e in errors.messages() {
				eprintln!("error: {e}");
			}
			return Ok(EXIT_INVALID);
		}
	};
	let dir = out.unwrap_or_else(|| cfg.artifact_dir());
	let endpoints = Endpoints::from_env().context("resolving daemon endpoints")?;
	let set = ConfigGenerator::new(&dir, endpoints, GeneratorOptions::from(&cfg))
		.generate(&validated)
		.context("generating pool configuration")?;
	let pools: Vec<&str> = set.pools.iter().map(|(kind, _)| kind.file_name()).collect();
	print_json(&json!({ "dir": dir, "pools": pools }))?;
	Ok(0)
}

#[tokio::main]
async fn main() -> Result<()> {
	let cli = Cli::parse();
	let client = ControlClient::new(&cli.endpoint, Duration::from_millis(cli.timeout_ms));

	let code = match cli.command {
		Commands::Status => {
			print_json(&client.get("/api/status").await?)?;
			0
		}
		Commands::Setup { btc, ltc, doge, no_merge_mining } => {
			let body = serde_json::to_value(setup_settings(btc, ltc, doge, no_merge_mining))?;
			finish(client.post("/api/setup", Some(body)).await?)?
		}
		Commands::Restart => finish(client.post("/api/restart", None).await?)?,
		Commands::Stop => finish(client.post("/api/stop", None).await?)?,
		Commands::Generate { settings, out } => generate(cli.config.as_deref(), settings, out)?,
		Commands::Config { action: ConfigAction::Show } => {
			let cfg = RuntimeConfig::load(cli.config.as_deref()).context("loading runtime configuration")?;
			print_json(&json!({
				"runtime": cfg,
				"endpoint": cli.endpoint,
				"timeout_ms": cli.timeout_ms,
			}))?;
			0
		}
	};
	if code != 0 {
		std::process::exit(code);
	}
	Ok(())
}
