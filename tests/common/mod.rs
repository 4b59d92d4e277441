use std::process::{Child, Command, Stdio};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;

static SERVER: OnceLock<TestServer> = OnceLock::new();

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    #[allow(dead_code)]
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        // Spawn the already-built binary to keep start fast during tests
        let mut cmd = Command::new("target/debug/ledgerdesk-api");
        cmd.env("LEDGERDESK_PORT", port.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        // Inherit environment so the server can see DATABASE_URL from .env
        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self {
            port,
            base_url,
            child,
        })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                // The server is up even when the database is not; a degraded
                // 503 still means the process answered.
                if resp.status() == StatusCode::OK
                    || resp.status() == StatusCode::SERVICE_UNAVAILABLE
                {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!(
            "server did not become ready on {} within {:?}",
            self.base_url,
            timeout
        )
    }
}

pub async fn ensure_server() -> Result<&'static TestServer> {
    let server = SERVER.get_or_init(|| TestServer::spawn().expect("failed to spawn server binary"));
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}

/// True when /health reports a reachable database. Tests that need real
/// data skip themselves when this is false.
#[allow(dead_code)]
pub async fn database_available(server: &TestServer) -> bool {
    let client = reqwest::Client::new();
    match client
        .get(format!("{}/health", server.base_url))
        .send()
        .await
    {
        Ok(resp) => resp.status() == StatusCode::OK,
        Err(_) => false,
    }
}

/// Unique suffix for test emails so runs never collide.
#[allow(dead_code)]
pub fn nonce() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    format!(
        "{:x}",
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    )
}

/// Mint an admin bearer token: create a fresh admin through the CLI
/// binary, then log in over HTTP. Returns None when no database is
/// configured so callers can skip.
#[allow(dead_code)]
pub async fn admin_token(server: &TestServer) -> Result<Option<String>> {
    if !database_available(server).await {
        return Ok(None);
    }

    let email = format!("admin-{}@example.com", nonce());
    let password = "admin test password";

    let output = Command::new("target/debug/ledgerdesk")
        .args(["create-admin", "--email", &email, "--password", password])
        .output()
        .context("failed to run ledgerdesk create-admin")?;
    if !output.status.success() {
        anyhow::bail!(
            "create-admin failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
    }

    let client = reqwest::Client::new();
    let res = client
        .post(format!("{}/auth/login", server.base_url))
        .json(&serde_json::json!({ "email": email, "password": password }))
        .send()
        .await?;
    anyhow::ensure!(res.status() == StatusCode::OK, "admin login failed");
    let body = res.json::<serde_json::Value>().await?;
    let token = body["data"]["token"]
        .as_str()
        .context("login response carries a token")?
        .to_string();
    Ok(Some(token))
}
