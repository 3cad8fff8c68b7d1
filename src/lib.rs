//! taos-sql: row cursor and ADBC driver for TDengine.
//!
//! This crate wraps the native TDengine client library (libtaos) behind a
//! safe, handle-based API. It offers two surfaces over the same native
//! session:
//!
//! - a row-at-a-time API ([`TaosConnection::exec`], [`TaosConnection::query`]
//!   and [`Rows`]), converting each cell into a [`Value`];
//! - the ADBC Core API ([`TaosDriver`], [`TaosDatabase`], [`TaosConnection`],
//!   [`TaosStatement`]), streaming results as Arrow record batches.
//!
//! Unsigned columns are never narrowed: `BIGINT UNSIGNED` values above
//! `i64::MAX` are returned as [`Value::UBigInt`] and as `UInt64` arrays.
//!
//! # Features
//!
//! - `native`: link against libtaos and enable `TaosDriver::default()`
//!
//! # Quick Start
//!
//! ```ignore
//! use adbc_core::{Database, Driver};
//! use adbc_core::options::{OptionDatabase, OptionValue};
//!
//! let mut driver = taos_sql::TaosDriver::default();
//! let mut db = driver.new_database()?;
//! db.set_option(
//!     OptionDatabase::Uri,
//!     OptionValue::String("root:taosdata@/tcp(127.0.0.1:6030)/power".to_string()),
//! )?;
//!
//! let conn = db.new_connection()?;
//! let mut rows = conn.query("SELECT ts, current FROM meters")?;
//! while rows.next()? {
//!     let current: Option<u64> = rows.get_as(1)?;
//!     println!("{:?}", current);
//! }
//! ```
//!
//! # Module Structure
//!
//! - [`driver`]: Entry point for creating database instances
//! - [`database`]: Connection configuration and database creation
//! - [`connection`]: Active database connection for queries
//! - [`statement`]: ADBC statement execution
//! - [`reader`]: Arrow RecordBatch streaming
//! - [`dsn`]: Data source name parsing
//! - [`convert`]: Native cell to [`Value`] conversion
//! - [`native`]: Native client call surface
//! - [`error`]: Error types

pub mod connection;
pub mod convert;
mod cursor;
pub mod database;
pub mod driver;
pub mod dsn;
pub mod error;
pub mod native;
pub mod reader;
mod rows;
mod session;
pub mod statement;
pub mod types;
pub mod value;

// Re-export main types for convenience
pub use connection::TaosConnection;
pub use database::TaosDatabase;
pub use driver::TaosDriver;
pub use dsn::Dsn;
pub use error::TaosError;
pub use native::NativeClient;
pub use rows::{ExecResult, Rows};
pub use statement::TaosStatement;
pub use types::{ColumnDescriptor, ColumnType, TimestampPrecision};
pub use value::{FromValue, Timestamp, Value};
