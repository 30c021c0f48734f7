#![forbid(unsafe_code)]

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use poolwarden_core::{Endpoints, RuntimeConfig};
use poolwarden_daemon::{api, OrchestrationController};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "poolwarden-daemon", version, about = "Configures and supervises the CoiniumServ pool engine")]
struct Args {
	/// TOML runtime configuration
	#[arg(long, env = "POOLWARDEN_CONFIG")]
	config: Option<PathBuf>,
	/// Override the control API bind address
	#[arg(long)]
	listen: Option<SocketAddr>,
	/// Do not start the pool from saved settings at boot
	#[arg(long)]
	no_auto_start: bool,
}

fn init_tracing(default_level: &str) {
	// RUST_LOG wins over the configured level.
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
	tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main(worker_threads = 4)]
async fn main() -> anyhow::Result<()> {
	let args = Args::parse();
	let mut cfg = RuntimeConfig::load(args.config.as_deref()).context("loading runtime configuration")?;
	if let Some(listen) = args.listen {
		cfg.listen = listen;
	}
	init_tracing(&cfg.log_level);

	let endpoints = Endpoints::from_env().context("resolving daemon endpoints")?;
	info!(
		btc = %endpoints.btc.url(),
		ltc = %endpoints.ltc.url(),
		doge = %endpoints.doge.url(),
		cache = %format!("{}:{}", endpoints.cache.host, endpoints.cache.port),
		"endpoints resolved"
	);
	let controller = Arc::new(OrchestrationController::from_config(&cfg, endpoints));

	if args.no_auto_start {
		info!("auto-start disabled");
	} else {
		match controller.auto_start().await {
			Ok(true) => info!("pool auto-started"),
			Ok(false) => {}
			Err(e) => warn!(error = %e, "auto-start failed"),
		}
	}

	let listener = tokio::net::TcpListener::bind(cfg.listen)
		.await
		.with_context(|| format!("binding control API on {}", cfg.listen))?;
	info!("control API listening on {}", cfg.listen);
	axum::serve(listener, api::router(Arc::clone(&controller)))
		.with_graceful_shutdown(async {
			let _ = tokio::signal::ctrl_c().await;
			info!("shutdown requested");
		})
		.await
		.context("control API server")?;

	controller.stop().await;
	info!("poolwarden daemon exited");
	Ok(())
}
