#![forbid(unsafe_code)]

use std::time::Duration;

use poolwarden_core::{CacheEndpoint, DaemonEndpoint};
use poolwarden_daemon::probe::{CacheProbe, DaemonProbe};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;

fn daemon_endpoint(port: u16) -> DaemonEndpoint {
    DaemonEndpoint { host: "127.0.0.1".into(), port, username: "user".into(), password: "pass".into() }
}

async fn read_http_request(stream: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = stream.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        let text = String::from_utf8_lossy(&buf).to_string();
        if let Some(head_end) = text.find("\r\n\r\n") {
            let content_length = text[..head_end]
                .lines()
                .find_map(|l| {
                    let l = l.to_ascii_lowercase();
                    l.strip_prefix("content-length:").map(|v| v.trim().parse::<usize>().unwrap())
                })
                .unwrap_or(0);
            if buf.len() >= head_end + 4 + content_length {
                return text;
            }
        }
    }
    String::from_utf8_lossy(&buf).to_string()
}

/// One-shot HTTP server answering `body`; hands the raw request back.
async fn fake_rpc(body: &'static str) -> (u16, oneshot::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let request = read_http_request(&mut stream).await;
        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            body.len(),
            body
        );
        stream.write_all(response.as_bytes()).await.unwrap();
        let _ = stream.shutdown().await;
        let _ = tx.send(request);
    });
    (port, rx)
}

async fn silent_server() -> (u16, tokio::task::JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let task = tokio::spawn(async move {
        let (_stream, _) = listener.accept().await.unwrap();
        tokio::time::sleep(Duration::from_secs(30)).await;
    });
    (port, task)
}

async fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

#[tokio::test]
async fn online_daemon_reports_sync_state() {
    let (port, request) = fake_rpc(
        r#"{"result":{"chain":"main","blocks":840000,"headers":840001,"verificationprogress":0.99999},"error":null,"id":"probe"}"#,
    )
    .await;
    let status = DaemonProbe::new().blockchain_info(&daemon_endpoint(port)).await;
    assert!(status.online, "{status:?}");
    let sync = status.sync.clone().unwrap();
    assert_eq!(sync.chain, "main");
    assert_eq!(sync.blocks, 840000);
    assert_eq!(sync.progress, "100.0");
    assert!(sync.synced);
    assert!(status.error.is_none());

    let raw = request.await.unwrap();
    let lower = raw.to_ascii_lowercase();
    assert!(raw.starts_with("POST / HTTP/1.1"), "{raw}");
    assert!(lower.contains("authorization: basic dxnlcjpwyxnz"), "{raw}");
    assert!(lower.contains("content-type: text/plain"), "{raw}");
    assert!(raw.contains(r#""method":"getblockchaininfo""#), "{raw}");
    assert!(raw.contains(r#""jsonrpc":"1.0""#), "{raw}");
    assert!(raw.contains(r#""id":"probe""#), "{raw}");
}

#[tokio::test]
async fn missing_progress_reads_as_complete() {
    let (port, _) = fake_rpc(r#"{"result":{"chain":"regtest","blocks":10,"headers":20},"error":null,"id":"probe"}"#).await;
    let status = DaemonProbe::new().blockchain_info(&daemon_endpoint(port)).await;
    let sync = status.sync.unwrap();
    assert_eq!(sync.progress, "100.0");
    assert!(!sync.synced);
}

#[tokio::test]
async fn rpc_error_message_is_reported() {
    let (port, _) = fake_rpc(r#"{"result":null,"error":{"code":-28,"message":"Loading block index..."},"id":"probe"}"#).await;
    let status = DaemonProbe::new().blockchain_info(&daemon_endpoint(port)).await;
    assert!(!status.online);
    assert_eq!(status.error.as_deref(), Some("Loading block index..."));
}

#[tokio::test]
async fn unparseable_body_is_parse_error() {
    let (port, _) = fake_rpc("<html>401 Unauthorized</html>").await;
    let status = DaemonProbe::new().blockchain_info(&daemon_endpoint(port)).await;
    assert!(!status.online);
    assert_eq!(status.error.as_deref(), Some("parse error"));
}

#[tokio::test]
async fn silent_daemon_times_out() {
    let (port, task) = silent_server().await;
    let probe = DaemonProbe::with_timeout(Duration::from_millis(200));
    let status = probe.blockchain_info(&daemon_endpoint(port)).await;
    assert!(!status.online);
    assert_eq!(status.error.as_deref(), Some("timeout"));
    task.abort();
}

#[tokio::test]
async fn refused_connection_is_offline_with_transport_error() {
    let port = closed_port().await;
    let status = DaemonProbe::new().blockchain_info(&daemon_endpoint(port)).await;
    assert!(!status.online);
    let error = status.error.unwrap();
    assert!(!error.is_empty());
    assert_ne!(error, "timeout");
    assert_ne!(error, "parse error");
}

async fn fake_cache(reply: &'static [u8]) -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; 16];
        let n = stream.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"PING\r\n");
        stream.write_all(reply).await.unwrap();
    });
    port
}

fn cache_endpoint(port: u16) -> CacheEndpoint {
    CacheEndpoint { host: "127.0.0.1".into(), port }
}

#[tokio::test]
async fn cache_pong_is_online() {
    let port = fake_cache(b"+PONG\r\n").await;
    assert!(CacheProbe::new().ping(&cache_endpoint(port)).await.online);
}

#[tokio::test]
async fn cache_error_reply_is_offline() {
    let port = fake_cache(b"-NOAUTH Authentication required.\r\n").await;
    assert!(!CacheProbe::new().ping(&cache_endpoint(port)).await.online);
}

#[tokio::test]
async fn cache_silence_and_refusal_are_offline() {
    let (port, task) = silent_server().await;
    let probe = CacheProbe::with_timeout(Duration::from_millis(200));
    assert!(!probe.ping(&cache_endpoint(port)).await.online);
    task.abort();

    let port = closed_port().await;
    assert!(!CacheProbe::new().ping(&cache_endpoint(port)).await.online);
}
