//! Error types for the taos-sql driver.
//!
//! Native status codes are 32-bit, but only the low 16 bits identify the
//! error; the upper bits carry unrelated flags and are masked off before a
//! code is stored in a [`TaosError`].

use std::backtrace::Backtrace;
use std::fmt::{Display, Formatter};

/// Mask applied to every native status code.
pub const CODE_MASK: i32 = 0xffff;

/// Code reported when the native layer refuses to hand out a connection.
pub const INVALID_CONNECTION: i32 = 0x020b;

/// Error type for taos-sql operations.
///
/// Contains contextual information about the error including a backtrace
/// captured at the point where the native failure was observed.
#[derive(Debug)]
pub struct TaosError {
    kind: ErrorKind,
    backtrace: Backtrace,
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, TaosError>;

impl TaosError {
    fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            backtrace: Backtrace::capture(),
        }
    }

    /// Creates the error returned when a connection handle cannot be acquired.
    pub(crate) fn invalid_connection() -> Self {
        Self::new(ErrorKind::Connection {
            code: INVALID_CONNECTION,
            message: "invalid connection".to_string(),
        })
    }

    /// Creates a query error from a raw native status code.
    pub(crate) fn query(code: i32, msg: String) -> Self {
        Self::new(ErrorKind::Query {
            code: code & CODE_MASK,
            message: msg,
        })
    }

    /// Creates a fetch error from a raw native status code.
    pub(crate) fn fetch(code: i32, msg: String) -> Self {
        Self::new(ErrorKind::Fetch {
            code: code & CODE_MASK,
            message: msg,
        })
    }

    /// Creates a scan error. These indicate the converter and the native
    /// library disagree about the type catalog or the block layout.
    pub(crate) fn scan(msg: String) -> Self {
        Self::new(ErrorKind::Scan(msg))
    }

    /// Creates the error returned when rows are requested from a statement
    /// that produced no result fields.
    pub(crate) fn no_result_set(sql: &str) -> Self {
        Self::new(ErrorKind::NoResultSet(sql.to_string()))
    }

    /// Creates an error for an operation issued in the wrong cursor state.
    pub(crate) fn invalid_state(msg: String) -> Self {
        Self::new(ErrorKind::InvalidState(msg))
    }

    /// Creates a new type conversion error.
    pub(crate) fn conversion(msg: String) -> Self {
        Self::new(ErrorKind::Conversion(msg))
    }

    /// Creates a new invalid option error.
    pub(crate) fn invalid_option(msg: String) -> Self {
        Self::new(ErrorKind::InvalidOption(msg))
    }

    /// Returns the backtrace captured when this error was created.
    pub fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }

    /// Returns the masked native code, if the error came from the native layer.
    pub fn code(&self) -> Option<i32> {
        match &self.kind {
            ErrorKind::Connection { code, .. }
            | ErrorKind::Query { code, .. }
            | ErrorKind::Fetch { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Returns the error message without the kind prefix.
    pub fn message(&self) -> &str {
        match &self.kind {
            ErrorKind::Connection { message, .. }
            | ErrorKind::Query { message, .. }
            | ErrorKind::Fetch { message, .. } => message,
            ErrorKind::Scan(msg)
            | ErrorKind::NoResultSet(msg)
            | ErrorKind::InvalidState(msg)
            | ErrorKind::Conversion(msg)
            | ErrorKind::InvalidOption(msg) => msg,
        }
    }

    /// Returns true if this is a connection error.
    pub fn is_connection(&self) -> bool {
        matches!(self.kind, ErrorKind::Connection { .. })
    }

    /// Returns true if this is a query error.
    pub fn is_query(&self) -> bool {
        matches!(self.kind, ErrorKind::Query { .. })
    }

    /// Returns true if this is a fetch error.
    pub fn is_fetch(&self) -> bool {
        matches!(self.kind, ErrorKind::Fetch { .. })
    }

    /// Returns true if this is a scan error (converter out of sync).
    pub fn is_scan(&self) -> bool {
        matches!(self.kind, ErrorKind::Scan(_))
    }

    /// Returns true if rows were requested from a statement without fields.
    pub fn is_no_result_set(&self) -> bool {
        matches!(self.kind, ErrorKind::NoResultSet(_))
    }

    /// Returns true if the operation was issued in the wrong cursor state.
    pub fn is_invalid_state(&self) -> bool {
        matches!(self.kind, ErrorKind::InvalidState(_))
    }

    /// Returns true if this is a conversion error.
    pub fn is_conversion(&self) -> bool {
        matches!(self.kind, ErrorKind::Conversion(_))
    }

    /// Returns true if a DSN or option value was rejected.
    pub fn is_invalid_option(&self) -> bool {
        matches!(self.kind, ErrorKind::InvalidOption(_))
    }

    /// Returns the corresponding ADBC status code.
    pub fn adbc_status(&self) -> adbc_core::error::Status {
        use adbc_core::error::Status;

        match &self.kind {
            ErrorKind::Connection { .. } => Status::IO,
            ErrorKind::Query { .. } => Status::Unknown,
            ErrorKind::Fetch { .. } => Status::IO,
            ErrorKind::Scan(_) => Status::Internal,
            ErrorKind::NoResultSet(_) => Status::InvalidState,
            ErrorKind::InvalidState(_) => Status::InvalidState,
            ErrorKind::Conversion(_) => Status::InvalidArguments,
            ErrorKind::InvalidOption(_) => Status::InvalidArguments,
        }
    }
}

impl Display for TaosError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            ErrorKind::Connection { code, message } => {
                write!(f, "Connection error [0x{:04x}]: {}", code, message)
            }
            ErrorKind::Query { code, message } => {
                write!(f, "Query error [0x{:04x}]: {}", code, message)
            }
            ErrorKind::Fetch { code, message } => {
                write!(f, "Fetch error [0x{:04x}]: {}", code, message)
            }
            ErrorKind::Scan(msg) => write!(f, "Scan error (driver bug): {}", msg),
            ErrorKind::NoResultSet(sql) => {
                write!(f, "Statement produced no result set: {}", sql)
            }
            ErrorKind::InvalidState(msg) => write!(f, "Invalid state: {}", msg),
            ErrorKind::Conversion(msg) => write!(f, "Type conversion error: {}", msg),
            ErrorKind::InvalidOption(msg) => write!(f, "Invalid option: {}", msg),
        }
    }
}

impl std::error::Error for TaosError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}

#[derive(Debug)]
enum ErrorKind {
    Connection { code: i32, message: String },
    Query { code: i32, message: String },
    Fetch { code: i32, message: String },
    Scan(String),
    NoResultSet(String),
    InvalidState(String),
    Conversion(String),
    InvalidOption(String),
}

/// Converts `TaosError` to ADBC `Error`.
impl From<TaosError> for adbc_core::error::Error {
    fn from(err: TaosError) -> Self {
        let status = err.adbc_status();
        let mut adbc = adbc_core::error::Error::with_message_and_status(err.to_string(), status);
        if let Some(code) = err.code() {
            adbc.vendor_code = code;
        }
        adbc
    }
}
