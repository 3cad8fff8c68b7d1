//! Column type converter: native cell bytes to [`Value`].
//!
//! A cell is the byte span a column reserves for one row inside a fetch
//! block. Fixed-size cells hold the value in native byte order. Variable
//! cells (BINARY, NCHAR, JSON) hold a 2-byte length followed by the payload,
//! padded to the declared width. Null sentinels are checked before any
//! widening, since an unsigned sentinel is an in-range bit pattern.

use crate::error::{Result, TaosError};
use crate::types::{
    BIGINT_NULL, BINARY_NULL, BOOL_NULL, ColumnType, DOUBLE_NULL_BITS, FLOAT_NULL_BITS, INT_NULL,
    NCHAR_NULL, SMALLINT_NULL, TINYINT_NULL, TimestampPrecision, UBIGINT_NULL, UINT_NULL,
    USMALLINT_NULL, UTINYINT_NULL, VAR_HEADER_SIZE,
};
use crate::value::{Timestamp, Value};

/// Converts one native cell to a [`Value`].
///
/// # Arguments
/// * `ty` - Column type resolved from the native tag
/// * `cell` - The cell's declared byte span
/// * `precision` - Timestamp precision of the result set
pub fn convert_cell(ty: ColumnType, cell: &[u8], precision: TimestampPrecision) -> Result<Value> {
    let value = match ty {
        ColumnType::Null => Value::Null,
        ColumnType::Bool => {
            let [b] = fixed::<1>(ty, cell)?;
            if b == BOOL_NULL {
                Value::Null
            } else {
                Value::Bool(b != 0)
            }
        }
        ColumnType::TinyInt => {
            let v = i8::from_ne_bytes(fixed(ty, cell)?);
            if v == TINYINT_NULL {
                Value::Null
            } else {
                Value::BigInt(i64::from(v))
            }
        }
        ColumnType::SmallInt => {
            let v = i16::from_ne_bytes(fixed(ty, cell)?);
            if v == SMALLINT_NULL {
                Value::Null
            } else {
                Value::BigInt(i64::from(v))
            }
        }
        ColumnType::Int => {
            let v = i32::from_ne_bytes(fixed(ty, cell)?);
            if v == INT_NULL {
                Value::Null
            } else {
                Value::BigInt(i64::from(v))
            }
        }
        ColumnType::BigInt => {
            let v = i64::from_ne_bytes(fixed(ty, cell)?);
            if v == BIGINT_NULL {
                Value::Null
            } else {
                Value::BigInt(v)
            }
        }
        ColumnType::TinyIntUnsigned => {
            let v = u8::from_ne_bytes(fixed(ty, cell)?);
            if v == UTINYINT_NULL {
                Value::Null
            } else {
                Value::BigInt(i64::from(v))
            }
        }
        ColumnType::SmallIntUnsigned => {
            let v = u16::from_ne_bytes(fixed(ty, cell)?);
            if v == USMALLINT_NULL {
                Value::Null
            } else {
                Value::BigInt(i64::from(v))
            }
        }
        ColumnType::IntUnsigned => {
            let v = u32::from_ne_bytes(fixed(ty, cell)?);
            if v == UINT_NULL {
                Value::Null
            } else {
                Value::BigInt(i64::from(v))
            }
        }
        ColumnType::BigIntUnsigned => {
            let v = u64::from_ne_bytes(fixed(ty, cell)?);
            if v == UBIGINT_NULL {
                Value::Null
            } else {
                Value::UBigInt(v)
            }
        }
        ColumnType::Float => {
            let bits = u32::from_ne_bytes(fixed(ty, cell)?);
            if bits == FLOAT_NULL_BITS {
                Value::Null
            } else {
                Value::Double(f64::from(f32::from_bits(bits)))
            }
        }
        ColumnType::Double => {
            let bits = u64::from_ne_bytes(fixed(ty, cell)?);
            if bits == DOUBLE_NULL_BITS {
                Value::Null
            } else {
                Value::Double(f64::from_bits(bits))
            }
        }
        ColumnType::Timestamp => {
            let v = i64::from_ne_bytes(fixed(ty, cell)?);
            if v == BIGINT_NULL {
                Value::Null
            } else {
                Value::Timestamp(Timestamp::new(v, precision))
            }
        }
        ColumnType::Binary => match var_payload(ty, cell)? {
            Some(payload) if payload.first() == Some(&BINARY_NULL) => Value::Null,
            Some(payload) => Value::Bytes(payload.to_vec()),
            None => Value::Null,
        },
        ColumnType::NChar | ColumnType::Json => match var_payload(ty, cell)? {
            Some(payload) if is_nchar_null(payload) => Value::Null,
            Some(payload) => match String::from_utf8(payload.to_vec()) {
                Ok(text) => Value::Text(text),
                Err(e) => Value::Bytes(e.into_bytes()),
            },
            None => Value::Null,
        },
    };
    Ok(value)
}

/// Reads the leading `N` bytes of a fixed-size cell.
fn fixed<const N: usize>(ty: ColumnType, cell: &[u8]) -> Result<[u8; N]> {
    cell.get(..N)
        .and_then(|bytes| <[u8; N]>::try_from(bytes).ok())
        .ok_or_else(|| {
            TaosError::scan(format!(
                "{} cell has {} bytes, expected {}",
                ty.sql_name(),
                cell.len(),
                N
            ))
        })
}

/// Extracts the payload of a variable-length cell. The length prefix is
/// clamped to the declared span. `None` marks an empty cell span.
fn var_payload(ty: ColumnType, cell: &[u8]) -> Result<Option<&[u8]>> {
    if cell.is_empty() {
        return Ok(None);
    }
    let header: [u8; VAR_HEADER_SIZE] = fixed(ty, cell)?;
    let len = usize::from(u16::from_ne_bytes(header));
    let body = &cell[VAR_HEADER_SIZE..];
    Ok(Some(&body[..len.min(body.len())]))
}

fn is_nchar_null(payload: &[u8]) -> bool {
    payload
        .get(..4)
        .is_some_and(|head| head == NCHAR_NULL.to_ne_bytes())
}
