//! Handle-based native client call surface.
//!
//! [`NativeClient`] mirrors the libtaos C API one call at a time. Handles are
//! opaque, move-only tokens: [`NativeClient::free_result`] and
//! [`NativeClient::close`] consume them, so a handle cannot be released twice
//! and cannot be used after release.

use std::borrow::Cow;

use crate::types::ColumnDescriptor;

#[cfg(feature = "native")]
pub mod ffi;

#[cfg(test)]
pub(crate) mod fake;

/// Opaque native connection handle.
#[derive(Debug)]
pub struct ConnHandle {
    token: usize,
}

impl ConnHandle {
    /// Wraps a raw token. For [`NativeClient`] implementations only; the
    /// driver never hands handles to its callers.
    #[doc(hidden)]
    pub fn from_raw(token: usize) -> Self {
        Self { token }
    }

    #[doc(hidden)]
    pub fn as_raw(&self) -> usize {
        self.token
    }
}

/// Opaque native result handle.
#[derive(Debug)]
pub struct ResultHandle {
    token: usize,
}

impl ResultHandle {
    /// Wraps a raw token. For [`NativeClient`] implementations only; the
    /// driver never hands handles to its callers.
    #[doc(hidden)]
    pub fn from_raw(token: usize) -> Self {
        Self { token }
    }

    #[doc(hidden)]
    pub fn as_raw(&self) -> usize {
        self.token
    }
}

/// Connection parameters handed to [`NativeClient::connect`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectParams {
    /// Server host; `None` lets the native library use its configured default.
    pub host: Option<String>,
    pub port: u16,
    pub user: String,
    pub password: String,
    /// Default database; empty selects none.
    pub database: String,
}

/// One column of a fetch block.
#[derive(Debug, Clone)]
pub struct RawColumn<'r> {
    /// Column-major cell data, `rows * stride` bytes.
    pub data: Cow<'r, [u8]>,
    /// Bytes reserved per row.
    pub stride: usize,
}

/// A batch of rows returned by one fetch call.
///
/// Borrows from the result handle it was fetched from, so the next fetch
/// or the release of the result ends its lifetime.
#[derive(Debug, Clone)]
pub struct RawBlock<'r> {
    pub rows: usize,
    /// One entry per field; `None` when the native column pointer is null,
    /// which marks every cell of the column as null.
    pub columns: Vec<Option<RawColumn<'r>>>,
}

impl RawBlock<'_> {
    /// An empty block, signalling end of data or a fetch failure.
    pub fn empty() -> Self {
        Self {
            rows: 0,
            columns: Vec::new(),
        }
    }
}

/// The native client library, reached through handle-based calls.
///
/// Every call blocks for the duration of a network round trip where the
/// native library needs one. Implementations are not required to make a
/// single connection usable from several threads at once; callers serialize
/// access per connection.
pub trait NativeClient: Send + Sync {
    /// Opens a connection. `None` means the native layer returned a null handle.
    fn connect(&self, params: &ConnectParams) -> Option<ConnHandle>;

    /// Issues a statement. A result handle is always returned; failures are
    /// reported through [`NativeClient::errno`].
    fn query(&self, conn: &ConnHandle, sql: &str) -> ResultHandle;

    /// Raw 32-bit status of a result; zero on success.
    fn errno(&self, result: &ResultHandle) -> i32;

    /// Status message of a result.
    fn errstr(&self, result: &ResultHandle) -> String;

    fn field_count(&self, result: &ResultHandle) -> usize;

    fn fetch_fields(&self, result: &ResultHandle) -> Vec<ColumnDescriptor>;

    fn affected_rows(&self, result: &ResultHandle) -> i64;

    /// Native timestamp precision code (0 ms, 1 µs, 2 ns).
    fn result_precision(&self, result: &ResultHandle) -> i32;

    /// Fetches the next block. Zero rows means end of data, or a failure when
    /// [`NativeClient::errno`] is nonzero afterwards.
    fn fetch_block<'r>(&self, result: &'r mut ResultHandle) -> RawBlock<'r>;

    fn free_result(&self, result: ResultHandle);

    fn close(&self, conn: ConnHandle);

    /// Server version string, if the native layer can report it.
    fn server_info(&self, conn: &ConnHandle) -> Option<String>;
}
