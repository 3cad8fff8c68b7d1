use std::sync::Arc;

use adbc_core::{Driver, Optionable, error::Result, options::OptionValue};

use super::database::TaosDatabase;
use super::native::NativeClient;

/// Entry point of the driver. Every database it creates shares the same
/// native client.
pub struct TaosDriver {
    client: Arc<dyn NativeClient>,
}

impl TaosDriver {
    /// Creates a driver on top of an explicit native client.
    pub fn with_client(client: Arc<dyn NativeClient>) -> Self {
        Self { client }
    }
}

/// Uses the linked libtaos client library.
#[cfg(feature = "native")]
impl Default for TaosDriver {
    fn default() -> Self {
        Self::with_client(Arc::new(super::native::ffi::LibTaos::new()))
    }
}

impl Driver for TaosDriver {
    type DatabaseType = TaosDatabase;

    fn new_database(&mut self) -> Result<Self::DatabaseType> {
        Ok(TaosDatabase::new(Arc::clone(&self.client)))
    }

    fn new_database_with_opts(
        &mut self,
        opts: impl IntoIterator<Item = (<Self::DatabaseType as Optionable>::Option, OptionValue)>,
    ) -> Result<Self::DatabaseType> {
        let mut database = self.new_database()?;
        for (key, value) in opts {
            database.set_option(key, value)?;
        }
        Ok(database)
    }
}

#[cfg(test)]
mod tests {
    use adbc_core::options::OptionDatabase;

    use super::*;
    use crate::native::fake::FakeClient;

    #[test]
    fn test_new_database_with_opts() {
        let mut driver = TaosDriver::with_client(Arc::new(FakeClient::new()));
        let db = driver
            .new_database_with_opts([
                (OptionDatabase::Uri, OptionValue::String("taos://10.0.0.1:6030".to_string())),
                (OptionDatabase::Username, OptionValue::String("admin".to_string())),
            ])
            .unwrap();
        assert_eq!(db.uri, "taos://10.0.0.1:6030");
        assert_eq!(db.user, "admin");
    }

    #[test]
    fn test_new_database_rejects_unknown_option() {
        let mut driver = TaosDriver::with_client(Arc::new(FakeClient::new()));
        let err = driver
            .new_database_with_opts([(
                OptionDatabase::Other("taos.unknown".to_string()),
                OptionValue::String("x".to_string()),
            )])
            .unwrap_err();
        assert_eq!(err.status, adbc_core::error::Status::NotImplemented);
    }
}
