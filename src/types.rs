//! Native TDengine type catalog and its mapping to Apache Arrow.
//!
//! Tags, widths and null sentinels follow the libtaos 2.x block layout.

use arrow_schema::{DataType, TimeUnit};

use crate::error::TaosError;

/// Null sentinel for BOOL cells.
pub const BOOL_NULL: u8 = 0x02;
/// Null sentinel for TINYINT cells.
pub const TINYINT_NULL: i8 = i8::MIN;
/// Null sentinel for SMALLINT cells.
pub const SMALLINT_NULL: i16 = i16::MIN;
/// Null sentinel for INT cells.
pub const INT_NULL: i32 = i32::MIN;
/// Null sentinel for BIGINT and TIMESTAMP cells.
pub const BIGINT_NULL: i64 = i64::MIN;
/// Null sentinel for TINYINT UNSIGNED cells.
pub const UTINYINT_NULL: u8 = u8::MAX;
/// Null sentinel for SMALLINT UNSIGNED cells.
pub const USMALLINT_NULL: u16 = u16::MAX;
/// Null sentinel for INT UNSIGNED cells.
pub const UINT_NULL: u32 = u32::MAX;
/// Null sentinel for BIGINT UNSIGNED cells.
pub const UBIGINT_NULL: u64 = u64::MAX;
/// Bit pattern of a null FLOAT cell.
pub const FLOAT_NULL_BITS: u32 = 0x7ff0_0000;
/// Bit pattern of a null DOUBLE cell.
pub const DOUBLE_NULL_BITS: u64 = 0x7fff_ff00_0000_0000;
/// First payload byte of a null BINARY cell.
pub const BINARY_NULL: u8 = 0xff;
/// First four payload bytes of a null NCHAR or JSON cell.
pub const NCHAR_NULL: u32 = 0xffff_ffff;

/// Size of the length prefix in front of every variable-length cell.
pub const VAR_HEADER_SIZE: usize = 2;

/// TDengine column data type, keyed by native type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    Null,
    Bool,
    TinyInt,
    SmallInt,
    Int,
    BigInt,
    Float,
    Double,
    Binary,
    Timestamp,
    NChar,
    TinyIntUnsigned,
    SmallIntUnsigned,
    IntUnsigned,
    BigIntUnsigned,
    Json,
}

impl ColumnType {
    /// Returns the native type tag.
    pub fn tag(self) -> u8 {
        match self {
            ColumnType::Null => 0,
            ColumnType::Bool => 1,
            ColumnType::TinyInt => 2,
            ColumnType::SmallInt => 3,
            ColumnType::Int => 4,
            ColumnType::BigInt => 5,
            ColumnType::Float => 6,
            ColumnType::Double => 7,
            ColumnType::Binary => 8,
            ColumnType::Timestamp => 9,
            ColumnType::NChar => 10,
            ColumnType::TinyIntUnsigned => 11,
            ColumnType::SmallIntUnsigned => 12,
            ColumnType::IntUnsigned => 13,
            ColumnType::BigIntUnsigned => 14,
            ColumnType::Json => 15,
        }
    }

    /// Returns the cell width of fixed-size types, `None` for
    /// variable-length ones (whose width is the declared column width).
    pub fn fixed_width(self) -> Option<usize> {
        match self {
            ColumnType::Null => Some(0),
            ColumnType::Bool | ColumnType::TinyInt | ColumnType::TinyIntUnsigned => Some(1),
            ColumnType::SmallInt | ColumnType::SmallIntUnsigned => Some(2),
            ColumnType::Int | ColumnType::IntUnsigned | ColumnType::Float => Some(4),
            ColumnType::BigInt
            | ColumnType::BigIntUnsigned
            | ColumnType::Double
            | ColumnType::Timestamp => Some(8),
            ColumnType::Binary | ColumnType::NChar | ColumnType::Json => None,
        }
    }

    /// Returns true for the unsigned integer types.
    pub fn is_unsigned(self) -> bool {
        matches!(
            self,
            ColumnType::TinyIntUnsigned
                | ColumnType::SmallIntUnsigned
                | ColumnType::IntUnsigned
                | ColumnType::BigIntUnsigned
        )
    }

    /// Returns the SQL spelling used by `DESCRIBE` and DDL.
    pub fn sql_name(self) -> &'static str {
        match self {
            ColumnType::Null => "NULL",
            ColumnType::Bool => "BOOL",
            ColumnType::TinyInt => "TINYINT",
            ColumnType::SmallInt => "SMALLINT",
            ColumnType::Int => "INT",
            ColumnType::BigInt => "BIGINT",
            ColumnType::Float => "FLOAT",
            ColumnType::Double => "DOUBLE",
            ColumnType::Binary => "BINARY",
            ColumnType::Timestamp => "TIMESTAMP",
            ColumnType::NChar => "NCHAR",
            ColumnType::TinyIntUnsigned => "TINYINT UNSIGNED",
            ColumnType::SmallIntUnsigned => "SMALLINT UNSIGNED",
            ColumnType::IntUnsigned => "INT UNSIGNED",
            ColumnType::BigIntUnsigned => "BIGINT UNSIGNED",
            ColumnType::Json => "JSON",
        }
    }

    /// Parses the type name printed in the `type` column of `DESCRIBE`.
    pub fn from_sql_name(name: &str) -> Option<Self> {
        let upper = name.trim().to_ascii_uppercase();
        let ty = match upper.as_str() {
            "NULL" => ColumnType::Null,
            "BOOL" => ColumnType::Bool,
            "TINYINT" => ColumnType::TinyInt,
            "SMALLINT" => ColumnType::SmallInt,
            "INT" => ColumnType::Int,
            "BIGINT" => ColumnType::BigInt,
            "FLOAT" => ColumnType::Float,
            "DOUBLE" => ColumnType::Double,
            "BINARY" | "VARCHAR" => ColumnType::Binary,
            "TIMESTAMP" => ColumnType::Timestamp,
            "NCHAR" => ColumnType::NChar,
            "TINYINT UNSIGNED" => ColumnType::TinyIntUnsigned,
            "SMALLINT UNSIGNED" => ColumnType::SmallIntUnsigned,
            "INT UNSIGNED" => ColumnType::IntUnsigned,
            "BIGINT UNSIGNED" => ColumnType::BigIntUnsigned,
            "JSON" => ColumnType::Json,
            _ => return None,
        };
        Some(ty)
    }

    /// Converts this type to the Arrow data type used by the record batch reader.
    ///
    /// # Arguments
    /// * `precision` - Timestamp precision of the result set
    pub fn arrow_type(self, precision: TimestampPrecision) -> DataType {
        match self {
            ColumnType::Null => DataType::Null,
            ColumnType::Bool => DataType::Boolean,
            ColumnType::TinyInt => DataType::Int8,
            ColumnType::SmallInt => DataType::Int16,
            ColumnType::Int => DataType::Int32,
            ColumnType::BigInt => DataType::Int64,
            ColumnType::Float => DataType::Float32,
            ColumnType::Double => DataType::Float64,
            ColumnType::Binary => DataType::Binary,
            ColumnType::NChar | ColumnType::Json => DataType::Utf8,
            ColumnType::Timestamp => DataType::Timestamp(precision.time_unit(), None),
            ColumnType::TinyIntUnsigned => DataType::UInt8,
            ColumnType::SmallIntUnsigned => DataType::UInt16,
            ColumnType::IntUnsigned => DataType::UInt32,
            ColumnType::BigIntUnsigned => DataType::UInt64,
        }
    }
}

impl TryFrom<u8> for ColumnType {
    type Error = TaosError;

    fn try_from(tag: u8) -> std::result::Result<Self, Self::Error> {
        let ty = match tag {
            0 => ColumnType::Null,
            1 => ColumnType::Bool,
            2 => ColumnType::TinyInt,
            3 => ColumnType::SmallInt,
            4 => ColumnType::Int,
            5 => ColumnType::BigInt,
            6 => ColumnType::Float,
            7 => ColumnType::Double,
            8 => ColumnType::Binary,
            9 => ColumnType::Timestamp,
            10 => ColumnType::NChar,
            11 => ColumnType::TinyIntUnsigned,
            12 => ColumnType::SmallIntUnsigned,
            13 => ColumnType::IntUnsigned,
            14 => ColumnType::BigIntUnsigned,
            15 => ColumnType::Json,
            _ => {
                return Err(TaosError::scan(format!(
                    "unknown native type tag {}",
                    tag
                )));
            }
        };
        Ok(ty)
    }
}

/// Timestamp precision for TDengine TIMESTAMP columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TimestampPrecision {
    #[default]
    Millisecond,
    Microsecond,
    Nanosecond,
}

impl TimestampPrecision {
    /// Number of ticks of this precision in one second.
    pub fn ticks_per_second(self) -> i64 {
        match self {
            TimestampPrecision::Millisecond => 1_000,
            TimestampPrecision::Microsecond => 1_000_000,
            TimestampPrecision::Nanosecond => 1_000_000_000,
        }
    }

    /// Returns the matching Arrow time unit.
    pub fn time_unit(self) -> TimeUnit {
        match self {
            TimestampPrecision::Millisecond => TimeUnit::Millisecond,
            TimestampPrecision::Microsecond => TimeUnit::Microsecond,
            TimestampPrecision::Nanosecond => TimeUnit::Nanosecond,
        }
    }
}

impl TryFrom<i32> for TimestampPrecision {
    type Error = TaosError;

    fn try_from(value: i32) -> std::result::Result<Self, Self::Error> {
        match value {
            0 => Ok(TimestampPrecision::Millisecond),
            1 => Ok(TimestampPrecision::Microsecond),
            2 => Ok(TimestampPrecision::Nanosecond),
            _ => Err(TaosError::scan(format!(
                "Invalid timestamp precision: {}",
                value
            ))),
        }
    }
}

/// Per-field metadata of a result set, fixed for the lifetime of the result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    name: String,
    type_tag: u8,
    bytes: usize,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>, type_tag: u8, bytes: usize) -> Self {
        Self {
            name: name.into(),
            type_tag,
            bytes,
        }
    }

    /// Column name as reported by the server.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw native type tag.
    pub fn type_tag(&self) -> u8 {
        self.type_tag
    }

    /// Declared byte width. For BINARY/NCHAR/JSON this includes the length prefix.
    pub fn bytes(&self) -> usize {
        self.bytes
    }

    /// Resolves the native tag against the type catalog.
    pub fn column_type(&self) -> Result<ColumnType, TaosError> {
        ColumnType::try_from(self.type_tag)
    }
}
