#![forbid(unsafe_code)]

use std::time::Duration;

use anyhow::{Context, Result};
use serde_json::Value;

/// Blocking HTTP client for the daemon's control API, driven from async code.
#[derive(Debug, Clone)]
pub struct ControlClient {
	base_url: String,
	agent: ureq::Agent,
}

impl ControlClient {
	pub fn new(endpoint: &str, timeout: Duration) -> Self {
		let agent = ureq::AgentBuilder::new()
			.timeout_connect(Duration::from_secs(3).min(timeout))
			.timeout(timeout)
			.build();
		Self { base_url: endpoint.trim_end_matches('/').to_string(), agent }
	}

	pub async fn get(&self, path: &str) -> Result<Value> {
		let url = format!("{}{}", self.base_url, path);
		let agent = self.agent.clone();
		// ureq is blocking; keep it off the runtime threads
		tokio::task::spawn_blocking(move || read_json(agent.get(&url).call()))
			.await
			.map_err(|e| anyhow::anyhow!("join error: {e}"))?
	}

	pub async fn post(&self, path: &str, body: Option<Value>) -> Result<Value> {
		let url = format!("{}{}", self.base_url, path);
		let agent = self.agent.clone();
		tokio::task::spawn_blocking(move || {
			let request = agent.post(&url);
			read_json(match body {
				Some(b) => request.send_json(b),
				None => request.call(),
			})
		})
		.await
		.map_err(|e| anyhow::anyhow!("join error: {e}"))?
	}
}

/// Error statuses still carry a JSON body (`{ok:false, errors}`); surface it.
fn read_json(result: Result<ureq::Response, ureq::Error>) -> Result<Value> {
	let response = match result {
		Ok(r) => r,
		Err(ureq::Error::Status(_, r)) => r,
		Err(e) => return Err(anyhow::Error::new(e).context("daemon unreachable")),
	};
	let text = response.into_string()?;
	serde_json::from_str(&text).with_context(|| format!("unexpected response: {text}"))
}
