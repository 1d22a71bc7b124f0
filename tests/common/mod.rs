use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use sqlx::postgres::{PgPool, PgPoolOptions};

/// A server process owned by one test, killed when the test drops it.
pub struct TestServer {
    pub base_url: String,
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        // Migrations run at startup so the seeding below finds the table
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_watchme"));
        cmd.env("PORT", port.to_string())
            .env("HOST", "127.0.0.1")
            .env("DB_SYNCHRONIZE", "1")
            .env("SSL_ENABLED", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self { base_url, child })
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
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// Connection string for the test database, or None when the suite should
/// be skipped.
pub fn database_url() -> Option<String> {
    dotenvy::dotenv().ok();
    std::env::var("DATABASE_URL").ok().filter(|url| !url.is_empty())
}

pub async fn spawn_server() -> Result<TestServer> {
    let server = TestServer::spawn()?;
    server.wait_ready(Duration::from_secs(15)).await?;
    Ok(server)
}

pub async fn connect(database_url: &str) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(2)
        .connect(database_url)
        .await
        .context("failed to connect to test database")
}

/// A device row created for one test, with a token nobody else uses.
pub struct SeededDevice {
    pub id: i32,
    pub token: String,
}

pub async fn seed_device(pool: &PgPool, name: &str, status: i32) -> Result<SeededDevice> {
    let token = uuid::Uuid::new_v4().to_string();
    let id: i32 = sqlx::query_scalar("INSERT INTO device (name, token, status) VALUES ($1, $2, $3) RETURNING id")
        .bind(name)
        .bind(&token)
        .bind(status)
        .fetch_one(pool)
        .await
        .context("failed to seed device")?;
    Ok(SeededDevice { id, token })
}
