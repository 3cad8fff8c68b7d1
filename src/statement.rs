//! Statement implementation for the taos-sql driver.
//!
//! The `TaosStatement` executes SQL text on the session of the connection
//! that created it. Query results are streamed as Arrow record batches.

#![allow(refining_impl_trait)]

use adbc_core::{Optionable, Statement, options::{OptionStatement, OptionValue}};
use arrow_array::RecordBatch;
use arrow_schema::Schema;
use tracing::debug;

use crate::connection::{run_exec, run_query};
use crate::reader::{TaosRecordBatchReader, result_schema};
use crate::session::SharedSession;

/// Statement option controlling the number of rows per Arrow batch.
pub const OPTION_BATCH_SIZE: &str = "taos.batch_size";

/// SQL statement for TDengine.
///
/// Statements share their connection's session. Executing a statement
/// releases any result still open on that connection, including readers
/// returned by other statements of the same connection.
pub struct TaosStatement {
    session: SharedSession,
    query: Option<String>,
    batch_size: usize,
}

impl TaosStatement {
    /// Creates a new statement.
    ///
    /// # Arguments
    /// * `session` - Session of the owning connection
    pub(crate) fn new(session: SharedSession) -> Self {
        Self {
            session,
            query: None,
            batch_size: TaosRecordBatchReader::DEFAULT_BATCH_SIZE,
        }
    }

    /// Returns the current query string.
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    fn require_query(&self) -> adbc_core::error::Result<String> {
        self.query.clone().ok_or_else(|| {
            adbc_core::error::Error::with_message_and_status(
                "No query set",
                adbc_core::error::Status::InvalidState,
            )
        })
    }

    fn set_batch_size(&mut self, value: i64) -> adbc_core::error::Result<()> {
        let size = usize::try_from(value).ok().filter(|&s| s > 0).ok_or_else(|| {
            adbc_core::error::Error::with_message_and_status(
                format!("Batch size must be positive, got {}", value),
                adbc_core::error::Status::InvalidArguments,
            )
        })?;
        self.batch_size = size;
        Ok(())
    }
}

fn unsupported<T>() -> adbc_core::error::Result<T> {
    Err(adbc_core::error::Error::with_message_and_status(
        "Unsupported statement option",
        adbc_core::error::Status::NotImplemented,
    ))
}

impl Optionable for TaosStatement {
    type Option = OptionStatement;

    fn set_option(
        &mut self,
        key: Self::Option,
        value: OptionValue,
    ) -> adbc_core::error::Result<()> {
        match key {
            OptionStatement::Other(ref name) if name == OPTION_BATCH_SIZE => match value {
                OptionValue::Int(v) => self.set_batch_size(v),
                OptionValue::String(s) => {
                    let v = s.trim().parse::<i64>().map_err(|_| {
                        adbc_core::error::Error::with_message_and_status(
                            format!("Invalid batch size '{}'", s),
                            adbc_core::error::Status::InvalidArguments,
                        )
                    })?;
                    self.set_batch_size(v)
                }
                _ => Err(adbc_core::error::Error::with_message_and_status(
                    "Expected integer value for batch size",
                    adbc_core::error::Status::InvalidArguments,
                )),
            },
            _ => unsupported(),
        }
    }

    fn get_option_string(&self, key: Self::Option) -> adbc_core::error::Result<String> {
        match key {
            OptionStatement::Other(ref name) if name == OPTION_BATCH_SIZE => {
                Ok(self.batch_size.to_string())
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

    fn get_option_int(&self, key: Self::Option) -> adbc_core::error::Result<i64> {
        match key {
            OptionStatement::Other(ref name) if name == OPTION_BATCH_SIZE => {
                Ok(self.batch_size as i64)
            }
            _ => unsupported(),
        }
    }
}

impl Statement for TaosStatement {
    fn bind(&mut self, _batch: RecordBatch) -> adbc_core::error::Result<()> {
        Err(adbc_core::error::Error::with_message_and_status(
            "Parameter binding not supported",
            adbc_core::error::Status::NotImplemented,
        ))
    }

    fn bind_stream(
        &mut self,
        _reader: Box<dyn arrow_array::RecordBatchReader + Send>,
    ) -> adbc_core::error::Result<()> {
        Err(adbc_core::error::Error::with_message_and_status(
            "Stream bind not implemented",
            adbc_core::error::Status::NotImplemented,
        ))
    }

    fn execute(&mut self) -> adbc_core::error::Result<Box<dyn arrow_array::RecordBatchReader + Send>> {
        let query = self.require_query()?;
        debug!(sql = %query, batch_size = self.batch_size, "execute");
        let rows = run_query(&self.session, &query)?;
        let reader = TaosRecordBatchReader::new(rows)?.with_batch_size(self.batch_size);
        Ok(Box::new(reader))
    }

    fn execute_update(&mut self) -> adbc_core::error::Result<Option<i64>> {
        let query = self.require_query()?;
        debug!(sql = %query, "execute_update");
        let result = run_exec(&self.session, &query)?;
        Ok(Some(result.rows_affected()))
    }

    fn execute_schema(&mut self) -> adbc_core::error::Result<Schema> {
        let query = self.require_query()?;
        let mut rows = run_query(&self.session, &query)?;
        let schema = result_schema(&rows)?;
        rows.close();
        Ok(schema)
    }

    fn execute_partitions(&mut self) -> adbc_core::error::Result<adbc_core::PartitionedResult> {
        Err(adbc_core::error::Error::with_message_and_status(
            "Partitioned execution not supported",
            adbc_core::error::Status::NotImplemented,
        ))
    }

    fn get_parameter_schema(&self) -> adbc_core::error::Result<Schema> {
        Ok(Schema::new(Vec::<arrow_schema::Field>::new()))
    }

    fn prepare(&mut self) -> adbc_core::error::Result<()> {
        Err(adbc_core::error::Error::with_message_and_status(
            "Prepared statements not supported",
            adbc_core::error::Status::NotImplemented,
        ))
    }

    fn set_sql_query(&mut self, query: impl AsRef<str>) -> adbc_core::error::Result<()> {
        self.query = Some(query.as_ref().to_string());
        Ok(())
    }

    fn set_substrait_plan(
        &mut self,
        _plan: impl AsRef<[u8]>,
    ) -> adbc_core::error::Result<()> {
        Err(adbc_core::error::Error::with_message_and_status(
            "Substrait not supported",
            adbc_core::error::Status::NotImplemented,
        ))
    }

    fn cancel(&mut self) -> adbc_core::error::Result<()> {
        Err(adbc_core::error::Error::with_message_and_status(
            "Query cancellation not supported",
            adbc_core::error::Status::NotImplemented,
        ))
    }
}
