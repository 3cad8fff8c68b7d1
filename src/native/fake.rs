//! Scripted in-memory [`NativeClient`] for unit tests.
//!
//! Responses are keyed by exact SQL text. Blocks are encoded in the same
//! column-major layout libtaos hands out, so the converter and cursor run
//! against realistic bytes. Freeing an unknown result or closing an unknown
//! connection panics, which turns any double release into a test failure.

use std::borrow::Cow;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard};

use super::{ConnHandle, ConnectParams, NativeClient, RawBlock, RawColumn, ResultHandle};
use crate::types::{
    BINARY_NULL, BIGINT_NULL, ColumnDescriptor, ColumnType, DOUBLE_NULL_BITS, INT_NULL,
    UBIGINT_NULL, UINT_NULL, USMALLINT_NULL, UTINYINT_NULL, VAR_HEADER_SIZE,
};

/// Raw status the fake reports for SQL it has no response for.
pub(crate) const UNKNOWN_SQL_CODE: i32 = 0x8000_0216_u32 as i32;

/// Builds a column descriptor.
pub(crate) fn field(name: &str, ty: ColumnType, bytes: usize) -> ColumnDescriptor {
    ColumnDescriptor::new(name, ty.tag(), bytes)
}

/// One fetch block under construction.
#[derive(Debug, Clone, Default)]
pub(crate) struct FakeBlock {
    rows: usize,
    columns: Vec<Option<(Vec<u8>, usize)>>,
}

impl FakeBlock {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn push<const N: usize>(mut self, cells: impl IntoIterator<Item = [u8; N]>) -> Self {
        let mut data = Vec::new();
        let mut rows = 0;
        for cell in cells {
            data.extend_from_slice(&cell);
            rows += 1;
        }
        self.rows = self.rows.max(rows);
        self.columns.push(Some((data, N)));
        self
    }

    pub(crate) fn timestamps(self, values: &[Option<i64>]) -> Self {
        self.push(values.iter().map(|v| v.unwrap_or(BIGINT_NULL).to_ne_bytes()))
    }

    pub(crate) fn ints(self, values: &[Option<i32>]) -> Self {
        self.push(values.iter().map(|v| v.unwrap_or(INT_NULL).to_ne_bytes()))
    }

    pub(crate) fn utinyints(self, values: &[Option<u8>]) -> Self {
        self.push(values.iter().map(|v| [v.unwrap_or(UTINYINT_NULL)]))
    }

    pub(crate) fn usmallints(self, values: &[Option<u16>]) -> Self {
        self.push(values.iter().map(|v| v.unwrap_or(USMALLINT_NULL).to_ne_bytes()))
    }

    pub(crate) fn uints(self, values: &[Option<u32>]) -> Self {
        self.push(values.iter().map(|v| v.unwrap_or(UINT_NULL).to_ne_bytes()))
    }

    pub(crate) fn ubigints(self, values: &[Option<u64>]) -> Self {
        self.push(values.iter().map(|v| v.unwrap_or(UBIGINT_NULL).to_ne_bytes()))
    }

    pub(crate) fn doubles(self, values: &[Option<f64>]) -> Self {
        self.push(
            values
                .iter()
                .map(|v| v.map_or(DOUBLE_NULL_BITS, f64::to_bits).to_ne_bytes()),
        )
    }

    /// Variable-length cells of `width` bytes including the length prefix.
    pub(crate) fn binaries(mut self, width: usize, values: &[Option<&str>]) -> Self {
        let mut data = Vec::with_capacity(width * values.len());
        for value in values {
            let payload: &[u8] = match value {
                Some(s) => s.as_bytes(),
                None => &[BINARY_NULL],
            };
            let mut cell = (payload.len() as u16).to_ne_bytes().to_vec();
            cell.extend_from_slice(payload);
            assert!(cell.len() <= width, "payload wider than declared column");
            cell.resize(width, 0);
            data.extend_from_slice(&cell);
        }
        debug_assert!(width >= VAR_HEADER_SIZE);
        self.rows = self.rows.max(values.len());
        self.columns.push(Some((data, width)));
        self
    }

    /// A column whose native pointer is null.
    pub(crate) fn null_column(mut self) -> Self {
        self.columns.push(None);
        self
    }

    /// Overrides the row count reported for the block.
    pub(crate) fn with_rows(mut self, rows: usize) -> Self {
        self.rows = rows;
        self
    }

    /// A raw column with caller-chosen bytes and stride.
    pub(crate) fn raw(mut self, data: Vec<u8>, stride: usize) -> Self {
        if stride > 0 {
            self.rows = self.rows.max(data.len() / stride);
        }
        self.columns.push(Some((data, stride)));
        self
    }
}

/// A scripted result set with one or more blocks.
#[derive(Debug, Clone)]
pub(crate) struct FakeResultSet {
    fields: Vec<ColumnDescriptor>,
    blocks: Vec<FakeBlock>,
    precision: i32,
    fetch_error: Option<(i32, String)>,
}

impl FakeResultSet {
    pub(crate) fn new(fields: Vec<ColumnDescriptor>) -> Self {
        Self {
            fields,
            blocks: Vec::new(),
            precision: 0,
            fetch_error: None,
        }
    }

    pub(crate) fn block(mut self, block: FakeBlock) -> Self {
        self.blocks.push(block);
        self
    }

    pub(crate) fn precision(mut self, precision: i32) -> Self {
        self.precision = precision;
        self
    }

    /// Fails the fetch that follows the last scripted block.
    pub(crate) fn fetch_error(mut self, code: i32, message: &str) -> Self {
        self.fetch_error = Some((code, message.to_string()));
        self
    }
}

/// Scripted reply to one SQL text.
#[derive(Debug, Clone)]
pub(crate) enum Response {
    Error { code: i32, message: String },
    Affected(i64),
    Rows(FakeResultSet),
}

#[derive(Debug)]
struct LiveResult {
    code: i32,
    message: String,
    fields: Vec<ColumnDescriptor>,
    affected: i64,
    blocks: VecDeque<FakeBlock>,
    precision: i32,
    fetch_error: Option<(i32, String)>,
}

#[derive(Debug, Default)]
struct FakeState {
    refuse_connect: bool,
    responses: HashMap<String, Response>,
    next_token: usize,
    open_conns: HashSet<usize>,
    live: HashMap<usize, LiveResult>,
    freed_results: usize,
    closed_conns: usize,
    queries: Vec<String>,
    last_connect: Option<ConnectParams>,
}

/// Scripted native client.
#[derive(Debug, Default)]
pub(crate) struct FakeClient {
    state: Mutex<FakeState>,
}

impl FakeClient {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub(crate) fn respond(&self, sql: &str, response: Response) -> &Self {
        self.state().responses.insert(sql.to_string(), response);
        self
    }

    pub(crate) fn respond_rows(&self, sql: &str, rows: FakeResultSet) -> &Self {
        self.respond(sql, Response::Rows(rows))
    }

    pub(crate) fn respond_affected(&self, sql: &str, affected: i64) -> &Self {
        self.respond(sql, Response::Affected(affected))
    }

    pub(crate) fn respond_error(&self, sql: &str, code: i32, message: &str) -> &Self {
        self.respond(
            sql,
            Response::Error {
                code,
                message: message.to_string(),
            },
        )
    }

    pub(crate) fn refuse_connections(&self) {
        self.state().refuse_connect = true;
    }

    /// Results handed out and not yet freed.
    pub(crate) fn live_results(&self) -> usize {
        self.state().live.len()
    }

    pub(crate) fn freed_results(&self) -> usize {
        self.state().freed_results
    }

    pub(crate) fn open_connections(&self) -> usize {
        self.state().open_conns.len()
    }

    pub(crate) fn closed_connections(&self) -> usize {
        self.state().closed_conns
    }

    pub(crate) fn queries(&self) -> Vec<String> {
        self.state().queries.clone()
    }

    pub(crate) fn last_connect(&self) -> Option<ConnectParams> {
        self.state().last_connect.clone()
    }

    fn with_live<T>(&self, result: &ResultHandle, f: impl FnOnce(&mut LiveResult) -> T) -> T {
        let mut state = self.state();
        let live = state
            .live
            .get_mut(&result.as_raw())
            .unwrap_or_else(|| panic!("result {} used after free", result.as_raw()));
        f(live)
    }
}

impl NativeClient for FakeClient {
    fn connect(&self, params: &ConnectParams) -> Option<ConnHandle> {
        let mut state = self.state();
        state.last_connect = Some(params.clone());
        if state.refuse_connect {
            return None;
        }
        state.next_token += 1;
        let token = state.next_token;
        state.open_conns.insert(token);
        Some(ConnHandle::from_raw(token))
    }

    fn query(&self, conn: &ConnHandle, sql: &str) -> ResultHandle {
        let mut state = self.state();
        assert!(
            state.open_conns.contains(&conn.as_raw()),
            "query on closed connection"
        );
        state.queries.push(sql.to_string());
        let response = state.responses.get(sql).cloned().unwrap_or(Response::Error {
            code: UNKNOWN_SQL_CODE,
            message: format!("syntax error near \"{}\"", sql),
        });
        let live = match response {
            Response::Error { code, message } => LiveResult {
                code,
                message,
                fields: Vec::new(),
                affected: 0,
                blocks: VecDeque::new(),
                precision: 0,
                fetch_error: None,
            },
            Response::Affected(affected) => LiveResult {
                code: 0,
                message: String::new(),
                fields: Vec::new(),
                affected,
                blocks: VecDeque::new(),
                precision: 0,
                fetch_error: None,
            },
            Response::Rows(set) => LiveResult {
                code: 0,
                message: String::new(),
                fields: set.fields,
                affected: 0,
                blocks: set.blocks.into(),
                precision: set.precision,
                fetch_error: set.fetch_error,
            },
        };
        state.next_token += 1;
        let token = state.next_token;
        state.live.insert(token, live);
        ResultHandle::from_raw(token)
    }

    fn errno(&self, result: &ResultHandle) -> i32 {
        self.with_live(result, |live| live.code)
    }

    fn errstr(&self, result: &ResultHandle) -> String {
        self.with_live(result, |live| live.message.clone())
    }

    fn field_count(&self, result: &ResultHandle) -> usize {
        self.with_live(result, |live| live.fields.len())
    }

    fn fetch_fields(&self, result: &ResultHandle) -> Vec<ColumnDescriptor> {
        self.with_live(result, |live| live.fields.clone())
    }

    fn affected_rows(&self, result: &ResultHandle) -> i64 {
        self.with_live(result, |live| live.affected)
    }

    fn result_precision(&self, result: &ResultHandle) -> i32 {
        self.with_live(result, |live| live.precision)
    }

    fn fetch_block<'r>(&self, result: &'r mut ResultHandle) -> RawBlock<'r> {
        self.with_live(result, |live| match live.blocks.pop_front() {
            Some(block) => RawBlock {
                rows: block.rows,
                columns: block
                    .columns
                    .into_iter()
                    .map(|c| {
                        c.map(|(data, stride)| RawColumn {
                            data: Cow::Owned(data),
                            stride,
                        })
                    })
                    .collect(),
            },
            None => {
                if let Some((code, message)) = live.fetch_error.take() {
                    live.code = code;
                    live.message = message;
                }
                RawBlock::empty()
            }
        })
    }

    fn free_result(&self, result: ResultHandle) {
        let mut state = self.state();
        if state.live.remove(&result.as_raw()).is_none() {
            panic!("result {} freed twice", result.as_raw());
        }
        state.freed_results += 1;
    }

    fn close(&self, conn: ConnHandle) {
        let mut state = self.state();
        if !state.open_conns.remove(&conn.as_raw()) {
            panic!("connection {} closed twice", conn.as_raw());
        }
        state.closed_conns += 1;
    }

    fn server_info(&self, _conn: &ConnHandle) -> Option<String> {
        Some("2.4.0.16".to_string())
    }
}
