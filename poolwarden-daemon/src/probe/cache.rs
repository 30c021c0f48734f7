use std::time::Duration;

use poolwarden_core::CacheEndpoint;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;

use super::CacheStatus;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3);

/// `PING` over a fresh TCP connection; online only on a `PONG` reply.
#[derive(Debug, Clone)]
pub struct CacheProbe {
    timeout: Duration,
}

impl Default for CacheProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheProbe {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub async fn ping(&self, endpoint: &CacheEndpoint) -> CacheStatus {
        let online = match tokio::time::timeout(self.timeout, exchange(endpoint)).await {
            Ok(Ok(reply)) => memchr::memmem::find(&reply, b"PONG").is_some(),
            Ok(Err(e)) => {
                debug!(host = %endpoint.host, port = endpoint.port, error = %e, "cache probe failed");
                false
            }
            Err(_) => {
                debug!(host = %endpoint.host, port = endpoint.port, "cache probe timed out");
                false
            }
        };
        CacheStatus { online }
    }
}

/// First chunk the server sends back after `PING`.
async fn exchange(endpoint: &CacheEndpoint) -> std::io::Result<Vec<u8>> {
    let mut stream = TcpStream::connect((endpoint.host.as_str(), endpoint.port)).await?;
    stream.write_all(b"PING\r\n").await?;
    let mut buf = vec![0u8; 64];
    let n = stream.read(&mut buf).await?;
    buf.truncate(n);
    Ok(buf)
}
