//! TCP-level test harness.
//!
//! Provides `FixtureTestServer` (binds to port 0, spawns the real server) and
//! `raw_request` (writes an HTTP/1.1 request by hand and reads the reply).

use fixtured_api::{AppState, FixtureServer};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tokio::time::{Duration, timeout};

const READ_TIMEOUT: Duration = Duration::from_secs(5);

/// A test server bound to a random OS-assigned port.
pub struct FixtureTestServer {
    port: u16,
    shutdown_tx: broadcast::Sender<()>,
}

impl FixtureTestServer {
    pub async fn start_with_state(state: AppState) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let (shutdown_tx, shutdown_rx) = broadcast::channel::<()>(1);
        let server = FixtureServer::with_state(format!("127.0.0.1:{port}"), state, shutdown_rx);

        tokio::spawn(async move {
            let _ = server.run_with_listener(listener).await;
        });

        Self { port, shutdown_tx }
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl Drop for FixtureTestServer {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(());
    }
}

/// Status code and body of one request sent over a fresh connection
pub async fn raw_request(port: u16, method: &str, path: &str, authorization: Option<&str>) -> (u16, String) {
    let mut stream = TcpStream::connect(("127.0.0.1", port)).await.unwrap();

    let mut request = format!("{method} {path} HTTP/1.1\r\nHost: 127.0.0.1\r\nConnection: close\r\n");
    if let Some(value) = authorization {
        request.push_str(&format!("Authorization: {value}\r\n"));
    }
    request.push_str("Content-Length: 0\r\n\r\n");
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut raw = Vec::new();
    timeout(READ_TIMEOUT, stream.read_to_end(&mut raw))
        .await
        .expect("timed out reading response")
        .unwrap();
    let text = String::from_utf8(raw).unwrap();

    let status = text
        .split_whitespace()
        .nth(1)
        .and_then(|code| code.parse().ok())
        .expect("missing status line");
    let body = text
        .split_once("\r\n\r\n")
        .map(|(_, body)| body.to_string())
        .unwrap_or_default();
    (status, body)
}
