//! Basic connection example for the taos-sql driver.
//!
//! This example demonstrates how to establish a connection to TDengine
//! using the ADBC API and run a first query with the row API.

use adbc_core::{Database, Driver, options::OptionDatabase};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Load environment variables from .env file if present
    dotenvy::dotenv().ok();

    let host = std::env::var("TAOS_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = std::env::var("TAOS_PORT").unwrap_or_else(|_| "6030".to_string());
    let user = std::env::var("TAOS_USER").unwrap_or_else(|_| "root".to_string());
    let password = std::env::var("TAOS_PASSWORD").unwrap_or_else(|_| "taosdata".to_string());

    println!("Connecting to TDengine at {}:{}", host, port);

    let mut driver = taos_sql::TaosDriver::default();

    // Credentials come from the options; the URI only names the endpoint.
    let database = driver.new_database_with_opts([
        (OptionDatabase::Uri, format!("taos://{}:{}", host, port).into()),
        (OptionDatabase::Username, user.into()),
        (OptionDatabase::Password, password.into()),
    ])?;

    let connection = database.new_connection()?;

    println!("Connected successfully!");
    println!("Server version: {}", connection.server_version());

    let mut rows = connection.query("SHOW DATABASES")?;
    while rows.next()? {
        let name: String = rows.get_as(0)?;
        println!("  database: {}", name);
    }

    Ok(())
}
