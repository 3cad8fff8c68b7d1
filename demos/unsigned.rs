//! Unsigned integer round trip against a live TDengine server.
//!
//! Creates a scratch database, writes ten descending values just below the
//! maximum of every unsigned width and reads the last row back. Every
//! statement is echoed; the first failure is reported with its SQL and ends
//! the program.
//!
//! Configure with `TAOS_HOST`, `TAOS_PORT`, `TAOS_USER`, `TAOS_PASSWORD` and
//! `TAOS_DATABASE` (default `taosuint`).

use adbc_core::{Database, Driver, options::OptionDatabase};
use anyhow::{Context, ensure};
use taos_sql::{ExecResult, TaosConnection, Timestamp};

/// Jan 2 2020 15:04:05 UTC in milliseconds.
const START_MS: i64 = 1_577_977_445_000;

struct Config {
    host: String,
    port: u16,
    user: String,
    password: String,
    database: String,
}

impl Config {
    fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let var = |key: &str, default: &str| std::env::var(key).unwrap_or_else(|_| default.to_string());
        Ok(Self {
            host: var("TAOS_HOST", "127.0.0.1"),
            port: var("TAOS_PORT", "6030").parse().context("TAOS_PORT is not a port number")?,
            user: var("TAOS_USER", "root"),
            password: var("TAOS_PASSWORD", "taosdata"),
            database: var("TAOS_DATABASE", "taosuint"),
        })
    }
}

fn exec(conn: &TaosConnection, sql: &str) -> anyhow::Result<ExecResult> {
    println!("- {}", sql);
    conn.exec(sql).with_context(|| format!("ERROR: {}", sql))
}

fn unsigned_type(conn: &TaosConnection, db: &str, table: &str, ty: &str, type_max: u64) -> anyhow::Result<()> {
    exec(conn, &format!("create table if not exists {}.{} (ts timestamp, n {})", db, table, ty))?;

    println!("\n# Case: {}", ty);
    let max = type_max - 1;
    for i in 0..10u64 {
        exec(
            conn,
            &format!("insert into {}.{} values({},{})", db, table, START_MS + i as i64 * 1000, max - i),
        )?;
    }

    let sql = format!("select last(*) from {}.{}", db, table);
    println!("- {}", sql);
    let mut rows = conn.query(&sql).with_context(|| format!("ERROR: {}", sql))?;
    while rows.next().context("ERROR: rows next fail")? {
        let ts: Timestamp = rows.get_as(0).context("ERROR: rows scan fail")?;
        let n: u64 = rows.get_as(1).context("ERROR: rows scan fail")?;
        println!("** last row: ({}, {})", ts, n);
        println!("** last n for *{}* is {}", ty, n);
        ensure!(n == max - 9, "last n for {} is {}, expected {}", ty, n, max - 9);
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::from_env()?;
    println!("============= args parse result: =============");
    println!("hostName:             {}", config.host);
    println!("serverPort:           {}", config.port);
    println!("usr:                  {}", config.user);
    println!("password:             {}", config.password);
    println!("dbName:               {}", config.database);
    println!("================================================");

    let mut driver = taos_sql::TaosDriver::default();
    let database = driver.new_database_with_opts([
        (
            OptionDatabase::Uri,
            format!("{}:{}@/tcp({}:{})/", config.user, config.password, config.host, config.port).into(),
        ),
    ])?;
    let conn = database.new_connection().context("Open database error")?;

    let db = &config.database;
    // keep 36500 allows timestamps before 1970
    exec(&conn, &format!("create database if not exists {} keep 36500 days 30", db))?;

    unsigned_type(&conn, db, "uint8", "tinyint unsigned", u8::MAX.into())?;
    unsigned_type(&conn, db, "uint16", "smallint unsigned", u16::MAX.into())?;
    unsigned_type(&conn, db, "uint32", "int unsigned", u32::MAX.into())?;
    unsigned_type(&conn, db, "uint64", "bigint unsigned", u64::MAX)?;

    exec(&conn, &format!("drop database {}", db))?;
    Ok(())
}
