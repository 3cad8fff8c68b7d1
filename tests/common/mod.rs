//! Common utilities for integration tests.

use adbc_core::{Database, Driver, Optionable};
use taos_sql::{TaosConnection, TaosDriver};

/// Test configuration loaded from environment.
pub struct TestConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: Option<String>,
}

impl TestConfig {
    /// Loads test configuration from environment variables.
    ///
    /// Falls back to defaults if variables are not set.
    pub fn from_env() -> Self {
        // Try to load .env file first
        let _ = dotenvy::dotenv();

        Self {
            host: std::env::var("TAOS_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: std::env::var("TAOS_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(6030),
            user: std::env::var("TAOS_USER").unwrap_or_else(|_| "root".to_string()),
            password: std::env::var("TAOS_PASSWORD").unwrap_or_else(|_| "taosdata".to_string()),
            database: std::env::var("TAOS_DATABASE").ok(),
        }
    }

    /// Builds the DSN in driver form, `user:pass@/tcp(host:port)/db`.
    pub fn dsn(&self) -> String {
        format!(
            "{}:{}@/tcp({}:{})/{}",
            self.user,
            self.password,
            self.host,
            self.port,
            self.database.as_deref().unwrap_or("")
        )
    }
}

impl Default for TestConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Returns a database name unique to this process and call.
pub fn unique_db_name(prefix: &str) -> String {
    format!(
        "{}_{}_{}",
        prefix,
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    )
}

/// Opens a connection through the ADBC driver.
pub fn connect() -> TaosConnection {
    let config = TestConfig::default();
    let mut driver = TaosDriver::default();

    let mut db = driver.new_database().expect("Failed to create database");
    db.set_option(
        adbc_core::options::OptionDatabase::Uri,
        adbc_core::options::OptionValue::String(config.dsn()),
    )
    .expect("Failed to set URI");

    db.new_connection().expect("Failed to create connection")
}

/// Scratch database dropped when the guard goes away. It keeps a
/// connection of its own so tests are free to borrow theirs mutably.
pub struct ScratchDb {
    conn: TaosConnection,
    pub name: String,
}

impl ScratchDb {
    pub fn create(prefix: &str) -> Self {
        let conn = connect();
        let name = unique_db_name(prefix);
        conn.exec(&format!("CREATE DATABASE IF NOT EXISTS {} KEEP 36500 DAYS 30", name))
            .expect("CREATE DATABASE failed");
        Self { conn, name }
    }
}

impl Drop for ScratchDb {
    fn drop(&mut self) {
        let _ = self.conn.exec(&format!("DROP DATABASE IF EXISTS {}", self.name));
    }
}
