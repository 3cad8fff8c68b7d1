//! Row-at-a-time result API.
//!
//! [`Rows`] follows the usual driver contract: call [`Rows::next`] until it
//! returns `false`, reading the current row with [`Rows::get`],
//! [`Rows::get_as`] or [`Rows::scan`] in between. Reading outside a row
//! (before the first `next`, after exhaustion or after `close`) is an
//! invalid-state error.
//!
//! # Example
//! ```ignore
//! let mut rows = conn.query("SELECT ts, v FROM t")?;
//! while rows.next()? {
//!     let v: Option<u64> = rows.get_as(1)?;
//!     println!("{:?}", v);
//! }
//! ```

use crate::cursor::ResultCursor;
use crate::error::{Result, TaosError};
use crate::types::{ColumnDescriptor, TimestampPrecision};
use crate::value::{FromValue, Value};

/// Outcome of a statement executed for its side effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecResult {
    rows_affected: i64,
}

impl ExecResult {
    pub(crate) fn new(rows_affected: i64) -> Self {
        Self { rows_affected }
    }

    pub fn rows_affected(&self) -> i64 {
        self.rows_affected
    }

    /// Always zero: TDengine tables have no auto-increment identity.
    pub fn last_insert_id(&self) -> i64 {
        0
    }
}

/// Rows of a query result, streamed block by block from the server.
///
/// Dropping `Rows` releases the native result.
#[derive(Debug)]
pub struct Rows {
    cursor: ResultCursor,
}

impl Rows {
    pub(crate) fn new(cursor: ResultCursor) -> Self {
        Self { cursor }
    }

    /// Column descriptors of the result.
    pub fn columns(&self) -> &[ColumnDescriptor] {
        self.cursor.fields()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns().iter().map(ColumnDescriptor::name).collect()
    }

    /// Timestamp precision the server reported for this result.
    pub fn precision(&self) -> TimestampPrecision {
        self.cursor.precision()
    }

    /// Advances to the next row. Returns `false` at end of data.
    pub fn next(&mut self) -> Result<bool> {
        self.cursor.next()
    }

    /// Returns the value at column `idx` of the current row.
    pub fn get(&self, idx: usize) -> Result<Value> {
        self.cursor.value(idx)
    }

    /// Returns the value at column `idx` converted to `T`.
    ///
    /// # Example
    /// ```ignore
    /// let v: u64 = rows.get_as(1)?;
    /// let maybe: Option<u8> = rows.get_as(2)?;
    /// ```
    pub fn get_as<T: FromValue>(&self, idx: usize) -> Result<T> {
        self.get(idx)?.get()
    }

    /// Copies every column of the current row into `dest`.
    ///
    /// `dest` must hold exactly one slot per column.
    pub fn scan(&self, dest: &mut [Value]) -> Result<()> {
        let columns = self.columns().len();
        if dest.len() != columns {
            return Err(TaosError::conversion(format!(
                "expected {} destination values, got {}",
                columns,
                dest.len()
            )));
        }
        for (idx, slot) in dest.iter_mut().enumerate() {
            *slot = self.get(idx)?;
        }
        Ok(())
    }

    /// Reads the current row into a freshly allocated vector.
    pub fn values(&self) -> Result<Vec<Value>> {
        (0..self.columns().len()).map(|idx| self.get(idx)).collect()
    }

    /// Releases the native result. Later calls to `next` return `false`.
    pub fn close(&mut self) {
        self.cursor.release();
    }
}
