//! Owning wrapper around one native connection handle.
//!
//! A [`Session`] holds at most one live result. Issuing a new statement
//! releases the previous result first, so cursors that still refer to it are
//! superseded and must not touch the native handle again. Results are
//! identified by a per-session id for that reason: a cursor only ever frees
//! the result whose id is still current.

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, trace, warn};

use crate::cursor::BlockBuffer;
use crate::error::{Result, TaosError};
use crate::native::{ConnHandle, ConnectParams, NativeClient, ResultHandle};
use crate::types::{ColumnDescriptor, TimestampPrecision};

/// Session shared between a connection, its statements and its cursors.
pub(crate) type SharedSession = Arc<Mutex<Session>>;

/// Locks a shared session, recovering the guard if a holder panicked.
pub(crate) fn lock(session: &SharedSession) -> MutexGuard<'_, Session> {
    session.lock().unwrap_or_else(|e| e.into_inner())
}

/// Outcome of [`Session::execute`].
#[derive(Debug)]
pub(crate) enum Execution {
    /// The statement produced no result fields.
    Affected(i64),
    /// The statement produced a result set, now current on the session.
    Rows(ResultMeta),
}

/// Metadata of a result set, fixed for its lifetime.
#[derive(Debug, Clone)]
pub(crate) struct ResultMeta {
    pub(crate) id: u64,
    pub(crate) fields: Vec<ColumnDescriptor>,
    pub(crate) precision: TimestampPrecision,
}

#[derive(Debug)]
struct ActiveResult {
    id: u64,
    handle: ResultHandle,
}

/// Frees a result handle unless it is explicitly kept.
struct PendingResult<'a> {
    client: &'a dyn NativeClient,
    handle: Option<ResultHandle>,
}

impl<'a> PendingResult<'a> {
    fn new(client: &'a dyn NativeClient, handle: ResultHandle) -> Self {
        Self {
            client,
            handle: Some(handle),
        }
    }

    fn handle(&self) -> &ResultHandle {
        // Only `keep` takes the handle, and it consumes the guard.
        match &self.handle {
            Some(handle) => handle,
            None => unreachable!("pending result already taken"),
        }
    }

    fn keep(mut self) -> ResultHandle {
        match self.handle.take() {
            Some(handle) => handle,
            None => unreachable!("pending result already taken"),
        }
    }
}

impl Drop for PendingResult<'_> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.client.free_result(handle);
        }
    }
}

/// One native connection and its current result.
pub struct Session {
    client: Arc<dyn NativeClient>,
    conn: Option<ConnHandle>,
    current: Option<ActiveResult>,
    next_id: u64,
    affected_rows: i64,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("conn", &self.conn)
            .field("current", &self.current)
            .field("affected_rows", &self.affected_rows)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Opens a connection through `client`.
    ///
    /// A null native handle is reported as [`TaosError::invalid_connection`];
    /// libtaos gives no finer detail at this point.
    pub(crate) fn open(client: Arc<dyn NativeClient>, params: &ConnectParams) -> Result<Self> {
        debug!(
            host = params.host.as_deref().unwrap_or("<default>"),
            port = params.port,
            user = %params.user,
            database = %params.database,
            "connecting"
        );
        let conn = match client.connect(params) {
            Some(conn) => conn,
            None => {
                warn!(host = ?params.host, port = params.port, "native connect returned null");
                return Err(TaosError::invalid_connection());
            }
        };
        Ok(Self {
            client,
            conn: Some(conn),
            current: None,
            next_id: 0,
            affected_rows: 0,
        })
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.conn.is_none()
    }

    /// Rows affected by the last statement without result fields.
    pub(crate) fn affected_rows(&self) -> i64 {
        self.affected_rows
    }

    pub(crate) fn server_version(&self) -> Option<String> {
        self.conn.as_ref().and_then(|c| self.client.server_info(c))
    }

    /// Issues a statement, replacing any previous result.
    pub(crate) fn execute(&mut self, sql: &str) -> Result<Execution> {
        if let Some(pos) = sql.find('\0') {
            return Err(TaosError::invalid_option(format!(
                "SQL contains a NUL byte at offset {}",
                pos
            )));
        }
        self.release_current();
        let conn = self.conn.as_ref().ok_or_else(TaosError::invalid_connection)?;

        debug!(sql = %sql, "executing");
        let client = self.client.as_ref();
        let result = PendingResult::new(client, client.query(conn, sql));

        let code = client.errno(result.handle());
        if code != 0 {
            let message = client.errstr(result.handle());
            warn!(sql = %sql, code, message = %message, "query failed");
            return Err(TaosError::query(code, message));
        }

        if client.field_count(result.handle()) == 0 {
            let affected = client.affected_rows(result.handle());
            self.affected_rows = affected;
            debug!(sql = %sql, rows = affected, "statement completed");
            return Ok(Execution::Affected(affected));
        }

        let fields = client.fetch_fields(result.handle());
        let precision = TimestampPrecision::try_from(client.result_precision(result.handle()))?;

        let handle = result.keep();
        self.next_id += 1;
        let id = self.next_id;
        self.current = Some(ActiveResult { id, handle });
        debug!(sql = %sql, fields = fields.len(), result = id, "result set opened");
        Ok(Execution::Rows(ResultMeta {
            id,
            fields,
            precision,
        }))
    }

    /// Returns whether `id` is still the session's live result.
    pub(crate) fn is_current(&self, id: u64) -> bool {
        self.current.as_ref().is_some_and(|r| r.id == id)
    }

    /// Fetches the next block of result `id` into `buffer`.
    ///
    /// Returns the number of rows copied; zero means end of data, after which
    /// the result has been released. A fetch failure also releases the result.
    pub(crate) fn fetch(&mut self, id: u64, buffer: &mut BlockBuffer) -> Result<usize> {
        let client = self.client.as_ref();
        let Some(current) = self.current.as_mut().filter(|r| r.id == id) else {
            return Err(TaosError::invalid_state(
                "result set was superseded by a later statement".to_string(),
            ));
        };

        let rows = {
            let block = client.fetch_block(&mut current.handle);
            if block.rows > 0 {
                buffer.fill(&block);
            }
            block.rows
        };
        trace!(result = id, rows, "fetched block");
        if rows > 0 {
            return Ok(rows);
        }

        let code = client.errno(&current.handle);
        let failure = (code != 0).then(|| client.errstr(&current.handle));
        self.release(id);
        match failure {
            Some(message) => {
                warn!(result = id, code, message = %message, "fetch failed");
                Err(TaosError::fetch(code, message))
            }
            None => Ok(0),
        }
    }

    /// Frees result `id` if it is still current. Any other id is a no-op.
    pub(crate) fn release(&mut self, id: u64) {
        if self.is_current(id) {
            self.release_current();
        }
    }

    fn release_current(&mut self) {
        if let Some(active) = self.current.take() {
            trace!(result = active.id, "releasing result");
            self.client.free_result(active.handle);
        }
    }

    /// Releases the current result and the connection. Repeated calls are no-ops.
    pub(crate) fn close(&mut self) {
        self.release_current();
        if let Some(conn) = self.conn.take() {
            debug!("closing connection");
            self.client.close(conn);
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::native::fake::{FakeBlock, FakeClient, FakeResultSet, UNKNOWN_SQL_CODE, field};
    use crate::types::ColumnType;

    fn params() -> ConnectParams {
        ConnectParams {
            host: Some("localhost".to_string()),
            port: 6030,
            user: "root".to_string(),
            password: "taosdata".to_string(),
            database: "test".to_string(),
        }
    }

    fn open(fake: &Arc<FakeClient>) -> Session {
        Session::open(fake.clone(), &params()).unwrap()
    }

    fn one_row_set() -> FakeResultSet {
        FakeResultSet::new(vec![field("v", ColumnType::Int, 4)])
            .block(FakeBlock::new().ints(&[Some(1)]))
    }

    #[test]
    fn test_open_null_handle() {
        let fake = Arc::new(FakeClient::new());
        fake.refuse_connections();
        let err = Session::open(fake.clone(), &params()).unwrap_err();
        assert!(err.is_connection());
        assert_eq!(err.code(), Some(crate::error::INVALID_CONNECTION));
        assert_eq!(err.message(), "invalid connection");
        assert_eq!(fake.last_connect(), Some(params()));
    }

    #[test]
    fn test_execute_zero_fields_records_affected_rows() {
        let fake = Arc::new(FakeClient::new());
        fake.respond_affected("insert into t values (now, 1)", 1);
        let mut session = open(&fake);

        match session.execute("insert into t values (now, 1)").unwrap() {
            Execution::Affected(n) => assert_eq!(n, 1),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(session.affected_rows(), 1);
        assert_eq!(fake.live_results(), 0);
    }

    #[test]
    fn test_execute_error_masks_code_and_frees() {
        let fake = Arc::new(FakeClient::new());
        let mut session = open(&fake);

        let err = session.execute("selec 1").unwrap_err();
        assert!(err.is_query());
        assert_eq!(err.code(), Some(UNKNOWN_SQL_CODE & 0xffff));
        assert!(err.message().contains("syntax error"));
        assert_eq!(fake.live_results(), 0);
    }

    #[test]
    fn test_new_statement_releases_previous_result() {
        let fake = Arc::new(FakeClient::new());
        fake.respond_rows("select * from a", one_row_set());
        fake.respond_rows("select * from b", one_row_set());
        let mut session = open(&fake);

        let first = match session.execute("select * from a").unwrap() {
            Execution::Rows(meta) => meta.id,
            other => panic!("unexpected {:?}", other),
        };
        assert_eq!(fake.live_results(), 1);
        let second = match session.execute("select * from b").unwrap() {
            Execution::Rows(meta) => meta.id,
            other => panic!("unexpected {:?}", other),
        };
        assert_eq!(fake.live_results(), 1);
        assert!(!session.is_current(first));
        assert!(session.is_current(second));

        // Releasing the stale id must leave the live result alone.
        session.release(first);
        assert_eq!(fake.live_results(), 1);
    }

    #[test]
    fn test_fetch_superseded_result() {
        let fake = Arc::new(FakeClient::new());
        fake.respond_rows("select * from a", one_row_set());
        fake.respond_affected("drop table a", 0);
        let mut session = open(&fake);
        let Execution::Rows(meta) = session.execute("select * from a").unwrap() else {
            panic!("expected rows");
        };
        session.execute("drop table a").unwrap();

        let mut buffer = BlockBuffer::default();
        let err = session.fetch(meta.id, &mut buffer).unwrap_err();
        assert!(err.is_invalid_state());
    }

    #[test]
    fn test_fetch_error_releases_result() {
        let fake = Arc::new(FakeClient::new());
        fake.respond_rows(
            "select * from t",
            one_row_set().fetch_error(0x8000_000b_u32 as i32, "unable to establish connection"),
        );
        let mut session = open(&fake);
        let Execution::Rows(meta) = session.execute("select * from t").unwrap() else {
            panic!("expected rows");
        };

        let mut buffer = BlockBuffer::default();
        assert_eq!(session.fetch(meta.id, &mut buffer).unwrap(), 1);
        let err = session.fetch(meta.id, &mut buffer).unwrap_err();
        assert!(err.is_fetch());
        assert_eq!(err.code(), Some(0x000b));
        assert_eq!(fake.live_results(), 0);
        assert!(!session.is_current(meta.id));
    }

    #[test]
    fn test_unknown_precision_frees_result() {
        let fake = Arc::new(FakeClient::new());
        fake.respond_rows("select * from t", one_row_set().precision(7));
        let mut session = open(&fake);

        let err = session.execute("select * from t").unwrap_err();
        assert!(err.is_scan());
        assert_eq!(fake.live_results(), 0);
    }

    #[test]
    fn test_close_idempotent() {
        let fake = Arc::new(FakeClient::new());
        fake.respond_rows("select * from t", one_row_set());
        let mut session = open(&fake);
        session.execute("select * from t").unwrap();

        session.close();
        session.close();
        drop(session);

        assert_eq!(fake.live_results(), 0);
        assert_eq!(fake.closed_connections(), 1);
        assert_eq!(fake.open_connections(), 0);
    }

    #[test]
    fn test_execute_after_close() {
        let fake = Arc::new(FakeClient::new());
        let mut session = open(&fake);
        session.close();
        assert!(session.is_closed());
        assert!(session.execute("select 1").unwrap_err().is_connection());
    }

    #[test]
    fn test_execute_rejects_nul_byte() {
        let fake = Arc::new(FakeClient::new());
        fake.respond_rows("select * from t", one_row_set());
        let mut session = open(&fake);
        let meta = match session.execute("select * from t").unwrap() {
            Execution::Rows(meta) => meta,
            other => panic!("unexpected {:?}", other),
        };

        let err = session.execute("DROP DATABASE prod\0_tmp").unwrap_err();
        assert!(err.is_invalid_option());
        assert_eq!(fake.queries(), vec!["select * from t".to_string()]);

        let mut buffer = BlockBuffer::default();
        assert!(session.fetch(meta.id, &mut buffer).is_ok());
        assert_eq!(fake.live_results(), 1);
    }
}
