//! Database implementation for the taos-sql driver.
//!
//! The `TaosDatabase` holds connection configuration and opens native
//! connections to TDengine.

use std::sync::Arc;

use adbc_core::{Database, Optionable, options::{OptionDatabase, OptionValue}};
use tracing::debug;

use crate::connection::TaosConnection;
use crate::dsn::Dsn;
use crate::error::TaosError;
use crate::native::{ConnectParams, NativeClient};

/// Key of the database option naming the default TDengine database.
pub const OPTION_DATABASE: &str = "taos.database";

/// Database configuration holder.
///
/// Stores connection parameters (URI, user, password, database name) and
/// creates one native connection per [`Database::new_connection`] call.
pub struct TaosDatabase {
    client: Arc<dyn NativeClient>,
    /// DSN in either `taos://` or `user:pass@proto(host:port)/db` form
    pub uri: String,
    /// Username used when the URI carries none
    pub user: String,
    /// Password used when the URI carries none
    pub password: String,
    /// Default database used when the URI names none
    pub database: Option<String>,
}

impl std::fmt::Debug for TaosDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaosDatabase")
            .field("uri", &self.uri)
            .field("user", &self.user)
            .field("database", &self.database)
            .finish_non_exhaustive()
    }
}

impl TaosDatabase {
    pub(crate) fn new(client: Arc<dyn NativeClient>) -> Self {
        Self {
            client,
            uri: "taos://127.0.0.1:6030".to_string(),
            user: "root".to_string(),
            password: "taosdata".to_string(),
            database: None,
        }
    }

    /// Resolves the configured URI and credentials into native connect
    /// parameters.
    pub fn connect_params(&self) -> Result<ConnectParams, TaosError> {
        let mut params = Dsn::parse(&self.uri)?.connect_params(&self.user, &self.password);
        if params.database.is_empty() {
            if let Some(db) = &self.database {
                params.database = db.clone();
            }
        }
        Ok(params)
    }

    /// Opens a connection without going through the ADBC trait.
    ///
    /// # Example
    /// ```ignore
    /// let db = TaosDriver::default().new_database()?;
    /// let conn = db.open()?;
    /// let mut rows = conn.query("SELECT server_version()")?;
    /// ```
    pub fn open(&self) -> Result<TaosConnection, TaosError> {
        let params = self.connect_params()?;
        debug!(
            host = params.host.as_deref().unwrap_or("<default>"),
            port = params.port,
            user = %params.user,
            database = %params.database,
            "opening connection"
        );
        TaosConnection::open(Arc::clone(&self.client), &params)
    }
}

fn unsupported<T>() -> adbc_core::error::Result<T> {
    Err(adbc_core::error::Error::with_message_and_status(
        "Unsupported database option",
        adbc_core::error::Status::NotImplemented,
    ))
}

impl Optionable for TaosDatabase {
    type Option = OptionDatabase;

    fn set_option(&mut self, key: Self::Option, value: OptionValue) -> adbc_core::error::Result<()> {
        let value = match value {
            OptionValue::String(value) => value,
            _ => {
                return Err(adbc_core::error::Error::with_message_and_status(
                    "Expected string value for database option",
                    adbc_core::error::Status::InvalidArguments,
                ));
            }
        };
        match key {
            OptionDatabase::Uri => self.uri = value,
            OptionDatabase::Username => self.user = value,
            OptionDatabase::Password => self.password = value,
            OptionDatabase::Other(ref name) if name == OPTION_DATABASE => {
                self.database = Some(value).filter(|db| !db.is_empty());
            }
            _ => return unsupported(),
        }
        Ok(())
    }

    fn get_option_string(&self, key: Self::Option) -> adbc_core::error::Result<String> {
        match key {
            OptionDatabase::Uri => Ok(self.uri.clone()),
            OptionDatabase::Username => Ok(self.user.clone()),
            OptionDatabase::Password => Ok(self.password.clone()),
            OptionDatabase::Other(ref name) if name == OPTION_DATABASE => {
                Ok(self.database.clone().unwrap_or_default())
            }
            _ => unsupported(),
        }
    }

    fn get_option_bytes(&self, _key: Self::Option) -> adbc_core::error::Result<Vec<u8>> {
        unsupported()
    }

    fn get_option_double(&self, _key: Self::Option) -> adbc_core::error::Result<f64> {
        unsupported()
    }

    fn get_option_int(&self, _key: Self::Option) -> adbc_core::error::Result<i64> {
        unsupported()
    }
}

impl Database for TaosDatabase {
    type ConnectionType = TaosConnection;

    fn new_connection(&self) -> adbc_core::error::Result<Self::ConnectionType> {
        self.new_connection_with_opts(std::iter::empty())
    }

    fn new_connection_with_opts(
        &self,
        opts: impl IntoIterator<Item = (adbc_core::options::OptionConnection, OptionValue)>,
    ) -> adbc_core::error::Result<Self::ConnectionType> {
        let mut conn = self.open()?;
        for (key, value) in opts {
            conn.set_option(key, value)?;
        }
        Ok(conn)
    }
}
