//! Pull-based cursor over the blocks of one result set.
//!
//! The cursor copies each native block into a [`BlockBuffer`] it owns and
//! reuses, so reading a cell never touches memory the native library may
//! already have recycled. State transitions:
//!
//! ```text
//! Idle -> InBlock -> ... -> Exhausted -> Released
//!   \________\__________________________/
//!               release() / supersede
//! ```

use tracing::trace;

use crate::convert::convert_cell;
use crate::error::{Result, TaosError};
use crate::native::RawBlock;
use crate::session::{ResultMeta, SharedSession, lock};
use crate::types::{ColumnDescriptor, TimestampPrecision};
use crate::value::Value;

#[derive(Debug, Default)]
struct ColumnBuffer {
    data: Vec<u8>,
    stride: usize,
}

/// Owned copy of one fetch block, reused across fetches.
#[derive(Debug, Default)]
pub(crate) struct BlockBuffer {
    rows: usize,
    columns: Vec<Option<ColumnBuffer>>,
}

impl BlockBuffer {
    /// Replaces the buffer contents with `block`, keeping allocations.
    pub(crate) fn fill(&mut self, block: &RawBlock<'_>) {
        self.rows = block.rows;
        self.columns.resize_with(block.columns.len(), || None);
        for (slot, column) in self.columns.iter_mut().zip(&block.columns) {
            match column {
                Some(raw) => {
                    let buf = slot.get_or_insert_with(ColumnBuffer::default);
                    buf.data.clear();
                    buf.data.extend_from_slice(&raw.data);
                    buf.stride = raw.stride;
                }
                None => *slot = None,
            }
        }
    }

    pub(crate) fn rows(&self) -> usize {
        self.rows
    }

    /// Cell bytes at (`row`, `col`).
    ///
    /// `Ok(None)` means the whole column is null. The span is clipped to the
    /// bytes actually present so a short column cannot be over-read.
    fn cell(&self, row: usize, col: usize) -> Result<Option<&[u8]>> {
        let column = self.columns.get(col).ok_or_else(|| {
            TaosError::scan(format!(
                "block has {} columns, column {} requested",
                self.columns.len(),
                col
            ))
        })?;
        let Some(column) = column else {
            return Ok(None);
        };
        let start = row.saturating_mul(column.stride).min(column.data.len());
        let end = start.saturating_add(column.stride).min(column.data.len());
        Ok(Some(&column.data[start..end]))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CursorState {
    Idle,
    InBlock,
    Exhausted,
    Released,
}

/// Row cursor over a result set owned by a session.
#[derive(Debug)]
pub(crate) struct ResultCursor {
    session: SharedSession,
    id: u64,
    fields: Vec<ColumnDescriptor>,
    precision: TimestampPrecision,
    block: BlockBuffer,
    offset: usize,
    state: CursorState,
    superseded: bool,
}

impl ResultCursor {
    pub(crate) fn new(session: SharedSession, meta: ResultMeta) -> Self {
        Self {
            session,
            id: meta.id,
            fields: meta.fields,
            precision: meta.precision,
            block: BlockBuffer::default(),
            offset: 0,
            state: CursorState::Idle,
            superseded: false,
        }
    }

    pub(crate) fn fields(&self) -> &[ColumnDescriptor] {
        &self.fields
    }

    pub(crate) fn precision(&self) -> TimestampPrecision {
        self.precision
    }

    /// Advances to the next row, fetching a new block when the current one
    /// is used up.
    ///
    /// Returns `Ok(false)` once the result is exhausted, and keeps doing so
    /// on every later call. A cursor whose result was replaced by a later
    /// statement on the same connection fails with an invalid-state error.
    pub(crate) fn next(&mut self) -> Result<bool> {
        match self.state {
            CursorState::Exhausted => return Ok(false),
            CursorState::Released if self.superseded => return Err(superseded()),
            CursorState::Released => return Ok(false),
            CursorState::Idle | CursorState::InBlock => {}
        }

        let mut session = lock(&self.session);
        if !session.is_current(self.id) {
            drop(session);
            self.superseded = true;
            self.state = CursorState::Released;
            return Err(superseded());
        }

        if self.state == CursorState::InBlock && self.offset + 1 < self.block.rows() {
            self.offset += 1;
            return Ok(true);
        }

        match session.fetch(self.id, &mut self.block) {
            Ok(0) => {
                trace!(result = self.id, "result exhausted");
                self.state = CursorState::Exhausted;
                Ok(false)
            }
            Ok(_) => {
                self.offset = 0;
                self.state = CursorState::InBlock;
                Ok(true)
            }
            Err(e) => {
                // The session released the result before reporting the failure.
                self.state = CursorState::Released;
                Err(e)
            }
        }
    }

    /// Converts the cell at column `col` of the current row.
    pub(crate) fn value(&self, col: usize) -> Result<Value> {
        if self.state != CursorState::InBlock {
            return Err(TaosError::invalid_state(
                "no current row; call next() first".to_string(),
            ));
        }
        let field = self.fields.get(col).ok_or_else(|| {
            TaosError::conversion(format!(
                "column index {} out of range for {} columns",
                col,
                self.fields.len()
            ))
        })?;
        let ty = field.column_type()?;
        match self.block.cell(self.offset, col)? {
            Some(cell) => convert_cell(ty, cell, self.precision),
            None => Ok(Value::Null),
        }
    }

    /// Frees the native result if this cursor still owns it. Idempotent.
    pub(crate) fn release(&mut self) {
        if matches!(self.state, CursorState::Released | CursorState::Exhausted) {
            self.state = CursorState::Released;
            return;
        }
        lock(&self.session).release(self.id);
        self.state = CursorState::Released;
    }
}

fn superseded() -> TaosError {
    TaosError::invalid_state("result set was superseded by a later statement".to_string())
}

impl Drop for ResultCursor {
    fn drop(&mut self) {
        self.release();
    }
}
