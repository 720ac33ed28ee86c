use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use base64::{engine::general_purpose, Engine as _};

/// A gateway process bound to its own port, killed on drop
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    child: Child,
}

impl TestServer {
    pub async fn start(auth_enabled: bool) -> Result<Self> {
        let server = Self::spawn(auth_enabled)?;
        server.wait_ready(Duration::from_secs(10)).await?;
        Ok(server)
    }

    fn spawn(auth_enabled: bool) -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let mut cmd = Command::new(env!("CARGO_BIN_EXE_tsdb-gateway"));
        cmd.env("GATEWAY_ENV", "development")
            .env("GATEWAY_HOST", "127.0.0.1")
            .env("GATEWAY_PORT", port.to_string())
            .env("GATEWAY_AUTH_ENABLED", auth_enabled.to_string())
            .env("GATEWAY_VERSION", "test")
            .env("GATEWAY_REQUEST_LOGGING", "false")
            .env("RUST_LOG", "warn")
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self { port, base_url, child })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            // Any HTTP answer means the listener is up
            if client.get(self.url("/ping")).send().await.is_ok() {
                return Ok(());
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `/query` URL with `q` form-encoded
    pub fn query_url(&self, text: &str) -> String {
        let encoded: String = url::form_urlencoded::byte_serialize(text.as_bytes()).collect();
        self.url(&format!("/query?q={}", encoded))
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

pub fn basic_auth(username: &str, password: &str) -> String {
    let pair = format!("{}:{}", username, password);
    format!("Basic {}", general_purpose::STANDARD.encode(pair))
}
