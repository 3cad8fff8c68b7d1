//! RecordBatchReader implementations for streaming query results.
//!
//! `TaosRecordBatchReader` drains a [`Rows`] cursor into Arrow record
//! batches. Each cell goes through the column converter, so the Arrow
//! arrays carry the values the row API would return; unsigned columns keep
//! their unsigned Arrow types. NCHAR and JSON cells that are not valid UTF-8
//! (`Value::Bytes` in the row API) are decoded lossily.

use std::sync::Arc;

use arrow_array::RecordBatch;
use arrow_array::builder::{
    BinaryBuilder, BooleanBuilder, Float32Builder, Float64Builder, Int8Builder, Int16Builder,
    Int32Builder, Int64Builder, NullBuilder, StringBuilder, TimestampMicrosecondBuilder,
    TimestampMillisecondBuilder, TimestampNanosecondBuilder, UInt8Builder, UInt16Builder,
    UInt32Builder, UInt64Builder,
};
use arrow_array::ArrayRef;
use arrow_schema::{ArrowError, Field, Schema, SchemaRef};

use crate::error::TaosError;
use crate::rows::Rows;
use crate::types::{ColumnType, TimestampPrecision};
use crate::value::{Timestamp, Value};

/// Iterator-based RecordBatchReader for pre-loaded record batches.
pub struct VecRecordBatchReader {
    batches: std::vec::IntoIter<RecordBatch>,
    schema: SchemaRef,
}

impl VecRecordBatchReader {
    pub fn new(batches: Vec<RecordBatch>, schema: Schema) -> Self {
        Self {
            batches: batches.into_iter(),
            schema: Arc::new(schema),
        }
    }

    pub fn empty(schema: Schema) -> Self {
        Self {
            batches: vec![].into_iter(),
            schema: Arc::new(schema),
        }
    }
}

impl arrow_array::RecordBatchReader for VecRecordBatchReader {
    fn schema(&self) -> SchemaRef {
        Arc::clone(&self.schema)
    }
}

impl Iterator for VecRecordBatchReader {
    type Item = std::result::Result<RecordBatch, ArrowError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.batches.next().map(Ok)
    }
}

/// Builds the Arrow schema of a result set.
///
/// # Arguments
/// * `rows` - Open result whose column descriptors are mapped
pub fn result_schema(rows: &Rows) -> Result<Schema, TaosError> {
    let precision = rows.precision();
    let fields = rows
        .columns()
        .iter()
        .map(|c| Ok(Field::new(c.name(), c.column_type()?.arrow_type(precision), true)))
        .collect::<Result<Vec<_>, TaosError>>()?;
    Ok(Schema::new(fields))
}

enum ColumnBuilder {
    Null(NullBuilder),
    Bool(BooleanBuilder),
    Int8(Int8Builder),
    Int16(Int16Builder),
    Int32(Int32Builder),
    Int64(Int64Builder),
    UInt8(UInt8Builder),
    UInt16(UInt16Builder),
    UInt32(UInt32Builder),
    UInt64(UInt64Builder),
    Float32(Float32Builder),
    Float64(Float64Builder),
    Binary(BinaryBuilder),
    Utf8(StringBuilder),
    TimestampMs(TimestampMillisecondBuilder),
    TimestampUs(TimestampMicrosecondBuilder),
    TimestampNs(TimestampNanosecondBuilder),
}

impl ColumnBuilder {
    fn new(ty: ColumnType, precision: TimestampPrecision, capacity: usize) -> Self {
        match ty {
            ColumnType::Null => Self::Null(NullBuilder::new()),
            ColumnType::Bool => Self::Bool(BooleanBuilder::with_capacity(capacity)),
            ColumnType::TinyInt => Self::Int8(Int8Builder::with_capacity(capacity)),
            ColumnType::SmallInt => Self::Int16(Int16Builder::with_capacity(capacity)),
            ColumnType::Int => Self::Int32(Int32Builder::with_capacity(capacity)),
            ColumnType::BigInt => Self::Int64(Int64Builder::with_capacity(capacity)),
            ColumnType::TinyIntUnsigned => Self::UInt8(UInt8Builder::with_capacity(capacity)),
            ColumnType::SmallIntUnsigned => Self::UInt16(UInt16Builder::with_capacity(capacity)),
            ColumnType::IntUnsigned => Self::UInt32(UInt32Builder::with_capacity(capacity)),
            ColumnType::BigIntUnsigned => Self::UInt64(UInt64Builder::with_capacity(capacity)),
            ColumnType::Float => Self::Float32(Float32Builder::with_capacity(capacity)),
            ColumnType::Double => Self::Float64(Float64Builder::with_capacity(capacity)),
            ColumnType::Binary => Self::Binary(BinaryBuilder::new()),
            ColumnType::NChar | ColumnType::Json => Self::Utf8(StringBuilder::new()),
            ColumnType::Timestamp => match precision {
                TimestampPrecision::Millisecond => {
                    Self::TimestampMs(TimestampMillisecondBuilder::with_capacity(capacity))
                }
                TimestampPrecision::Microsecond => {
                    Self::TimestampUs(TimestampMicrosecondBuilder::with_capacity(capacity))
                }
                TimestampPrecision::Nanosecond => {
                    Self::TimestampNs(TimestampNanosecondBuilder::with_capacity(capacity))
                }
            },
        }
    }

    fn append(&mut self, value: &Value) -> Result<(), TaosError> {
        match self {
            Self::Null(b) => b.append_null(),
            Self::Bool(b) => b.append_option(value.get::<Option<bool>>()?),
            Self::Int8(b) => b.append_option(value.get::<Option<i8>>()?),
            Self::Int16(b) => b.append_option(value.get::<Option<i16>>()?),
            Self::Int32(b) => b.append_option(value.get::<Option<i32>>()?),
            Self::Int64(b) => b.append_option(value.get::<Option<i64>>()?),
            Self::UInt8(b) => b.append_option(value.get::<Option<u8>>()?),
            Self::UInt16(b) => b.append_option(value.get::<Option<u16>>()?),
            Self::UInt32(b) => b.append_option(value.get::<Option<u32>>()?),
            Self::UInt64(b) => b.append_option(value.get::<Option<u64>>()?),
            Self::Float32(b) => b.append_option(value.get::<Option<f32>>()?),
            Self::Float64(b) => b.append_option(value.get::<Option<f64>>()?),
            Self::Binary(b) => b.append_option(value.get::<Option<Vec<u8>>>()?),
            Self::Utf8(b) => match value {
                Value::Bytes(bytes) => b.append_value(String::from_utf8_lossy(bytes)),
                other => b.append_option(other.get::<Option<String>>()?),
            },
            Self::TimestampMs(b) => b.append_option(raw_ticks(value)?),
            Self::TimestampUs(b) => b.append_option(raw_ticks(value)?),
            Self::TimestampNs(b) => b.append_option(raw_ticks(value)?),
        }
        Ok(())
    }

    fn finish(&mut self) -> ArrayRef {
        match self {
            Self::Null(b) => Arc::new(b.finish()),
            Self::Bool(b) => Arc::new(b.finish()),
            Self::Int8(b) => Arc::new(b.finish()),
            Self::Int16(b) => Arc::new(b.finish()),
            Self::Int32(b) => Arc::new(b.finish()),
            Self::Int64(b) => Arc::new(b.finish()),
            Self::UInt8(b) => Arc::new(b.finish()),
            Self::UInt16(b) => Arc::new(b.finish()),
            Self::UInt32(b) => Arc::new(b.finish()),
            Self::UInt64(b) => Arc::new(b.finish()),
            Self::Float32(b) => Arc::new(b.finish()),
            Self::Float64(b) => Arc::new(b.finish()),
            Self::Binary(b) => Arc::new(b.finish()),
            Self::Utf8(b) => Arc::new(b.finish()),
            Self::TimestampMs(b) => Arc::new(b.finish()),
            Self::TimestampUs(b) => Arc::new(b.finish()),
            Self::TimestampNs(b) => Arc::new(b.finish()),
        }
    }
}

fn raw_ticks(value: &Value) -> Result<Option<i64>, TaosError> {
    Ok(value.get::<Option<Timestamp>>()?.map(|ts| ts.as_raw_i64()))
}

/// TDengine result set reader that streams data in Arrow format.
///
/// Rows are pulled from the cursor until a batch holds `batch_size` rows or
/// the result is exhausted. The native result is released when the reader
/// reaches the end or is dropped.
pub struct TaosRecordBatchReader {
    rows: Option<Rows>,
    schema: SchemaRef,
    types: Vec<ColumnType>,
    batch_size: usize,
}

impl TaosRecordBatchReader {
    pub const DEFAULT_BATCH_SIZE: usize = 8192;

    /// Wraps an open result. Fails if a column has an unknown native type.
    pub fn new(rows: Rows) -> Result<Self, TaosError> {
        let schema = result_schema(&rows)?;
        let types = rows
            .columns()
            .iter()
            .map(|c| c.column_type())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            rows: Some(rows),
            schema: Arc::new(schema),
            types,
            batch_size: Self::DEFAULT_BATCH_SIZE,
        })
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    fn read_batch(&mut self) -> Result<Option<RecordBatch>, TaosError> {
        let Some(rows) = self.rows.as_mut() else {
            return Ok(None);
        };
        let precision = rows.precision();
        let mut builders: Vec<ColumnBuilder> = self
            .types
            .iter()
            .map(|ty| ColumnBuilder::new(*ty, precision, self.batch_size))
            .collect();

        let mut count = 0;
        while count < self.batch_size {
            if !rows.next()? {
                self.rows = None;
                break;
            }
            for (idx, builder) in builders.iter_mut().enumerate() {
                builder.append(&rows.get(idx)?)?;
            }
            count += 1;
        }

        if count == 0 {
            return Ok(None);
        }
        let arrays = builders.iter_mut().map(ColumnBuilder::finish).collect();
        RecordBatch::try_new(Arc::clone(&self.schema), arrays)
            .map(Some)
            .map_err(|e| TaosError::conversion(format!("Failed to build record batch: {}", e)))
    }
}

impl arrow_array::RecordBatchReader for TaosRecordBatchReader {
    fn schema(&self) -> SchemaRef {
        Arc::clone(&self.schema)
    }
}

impl Iterator for TaosRecordBatchReader {
    type Item = std::result::Result<RecordBatch, ArrowError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.read_batch() {
            Ok(batch) => batch.map(Ok),
            Err(e) => {
                self.rows = None;
                Some(Err(ArrowError::from_external_error(Box::new(e))))
            }
        }
    }
}


// Rust guideline compliant 2026-10-19
