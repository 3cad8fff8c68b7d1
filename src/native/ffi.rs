//! Bindings to the vendor libtaos client library.
//!
//! Only the calls the driver needs are declared. The block layout assumed by
//! [`crate::convert`] is the one `taos_fetch_block` produces in libtaos 2.x.

#![allow(non_camel_case_types)]
#![allow(unsafe_code)]

use std::borrow::Cow;
use std::ffi::{CStr, CString, c_char, c_int, c_void};
use std::ptr;
use std::sync::Once;

use super::{ConnHandle, ConnectParams, NativeClient, RawBlock, RawColumn, ResultHandle};
use crate::types::ColumnDescriptor;

/// Opaque `TAOS` connection.
pub type TAOS = c_void;
/// Opaque `TAOS_RES` result.
pub type TAOS_RES = c_void;
/// Array of column pointers filled by `taos_fetch_block`.
pub type TAOS_ROW = *mut *mut c_void;

/// `TAOS_FIELD` as laid out by libtaos.
#[repr(C)]
pub struct TAOS_FIELD {
    pub name: [c_char; 65],
    pub type_: u8,
    pub bytes: i16,
}

#[link(name = "taos")]
unsafe extern "C" {
    pub fn taos_init();
    pub fn taos_connect(
        ip: *const c_char,
        user: *const c_char,
        pass: *const c_char,
        db: *const c_char,
        port: u16,
    ) -> *mut TAOS;
    pub fn taos_close(taos: *mut TAOS);
    pub fn taos_query(taos: *mut TAOS, sql: *const c_char) -> *mut TAOS_RES;
    pub fn taos_errno(res: *mut TAOS_RES) -> c_int;
    pub fn taos_errstr(res: *mut TAOS_RES) -> *const c_char;
    pub fn taos_field_count(res: *mut TAOS_RES) -> c_int;
    pub fn taos_affected_rows(res: *mut TAOS_RES) -> c_int;
    pub fn taos_fetch_fields(res: *mut TAOS_RES) -> *mut TAOS_FIELD;
    pub fn taos_fetch_lengths(res: *mut TAOS_RES) -> *mut c_int;
    pub fn taos_fetch_block(res: *mut TAOS_RES, rows: *mut TAOS_ROW) -> c_int;
    pub fn taos_result_precision(res: *mut TAOS_RES) -> c_int;
    pub fn taos_free_result(res: *mut TAOS_RES);
    pub fn taos_get_server_info(taos: *mut TAOS) -> *const c_char;
}

static INIT: Once = Once::new();

/// [`NativeClient`] backed by libtaos.
#[derive(Debug)]
pub struct LibTaos {
    _private: (),
}

impl LibTaos {
    /// Initializes the client library once per process.
    pub fn new() -> Self {
        // SAFETY: taos_init takes no arguments and is guarded by `INIT`.
        INIT.call_once(|| unsafe { taos_init() });
        Self { _private: () }
    }
}

impl Default for LibTaos {
    fn default() -> Self {
        Self::new()
    }
}

fn conn_ptr(conn: &ConnHandle) -> *mut TAOS {
    conn.as_raw() as *mut TAOS
}

fn res_ptr(result: &ResultHandle) -> *mut TAOS_RES {
    result.as_raw() as *mut TAOS_RES
}

/// Copies a possibly-null C string.
///
/// # Safety
/// `s` must be null or point to a NUL-terminated string.
unsafe fn string_from(s: *const c_char) -> String {
    if s.is_null() {
        return String::new();
    }
    // SAFETY: non-null and NUL-terminated per the caller's contract.
    unsafe { CStr::from_ptr(s) }.to_string_lossy().into_owned()
}

impl NativeClient for LibTaos {
    fn connect(&self, params: &ConnectParams) -> Option<ConnHandle> {
        let user = CString::new(params.user.as_str()).ok()?;
        let pass = CString::new(params.password.as_str()).ok()?;
        let db = CString::new(params.database.as_str()).ok()?;
        let host = match &params.host {
            Some(host) if !host.is_empty() => Some(CString::new(host.as_str()).ok()?),
            _ => None,
        };
        let (ip, port) = match &host {
            Some(h) => (h.as_ptr(), params.port),
            None => (ptr::null(), 0),
        };

        // SAFETY: every pointer is either null or a live CString.
        let taos = unsafe { taos_connect(ip, user.as_ptr(), pass.as_ptr(), db.as_ptr(), port) };
        if taos.is_null() {
            None
        } else {
            Some(ConnHandle::from_raw(taos as usize))
        }
    }

    fn query(&self, conn: &ConnHandle, sql: &str) -> ResultHandle {
        // Sessions reject interior NULs before this point; never send a prefix.
        let sql = CString::new(sql).unwrap_or_default();
        // SAFETY: the connection handle is live while borrowed.
        let res = unsafe { taos_query(conn_ptr(conn), sql.as_ptr()) };
        ResultHandle::from_raw(res as usize)
    }

    fn errno(&self, result: &ResultHandle) -> i32 {
        // SAFETY: libtaos accepts a null result and reports the thread error.
        unsafe { taos_errno(res_ptr(result)) }
    }

    fn errstr(&self, result: &ResultHandle) -> String {
        // SAFETY: taos_errstr returns a static or result-owned C string.
        unsafe { string_from(taos_errstr(res_ptr(result))) }
    }

    fn field_count(&self, result: &ResultHandle) -> usize {
        // SAFETY: the result handle is live while borrowed.
        let n = unsafe { taos_field_count(res_ptr(result)) };
        usize::try_from(n).unwrap_or(0)
    }

    fn fetch_fields(&self, result: &ResultHandle) -> Vec<ColumnDescriptor> {
        let count = self.field_count(result);
        // SAFETY: the result handle is live while borrowed.
        let fields = unsafe { taos_fetch_fields(res_ptr(result)) };
        if fields.is_null() {
            return Vec::new();
        }
        // SAFETY: libtaos returns `field_count` contiguous fields owned by the result.
        let fields = unsafe { std::slice::from_raw_parts(fields, count) };
        fields
            .iter()
            .map(|f| {
                // SAFETY: `name` is a NUL-terminated fixed buffer.
                let name = unsafe { string_from(f.name.as_ptr()) };
                ColumnDescriptor::new(name, f.type_, usize::try_from(f.bytes).unwrap_or(0))
            })
            .collect()
    }

    fn affected_rows(&self, result: &ResultHandle) -> i64 {
        // SAFETY: the result handle is live while borrowed.
        i64::from(unsafe { taos_affected_rows(res_ptr(result)) })
    }

    fn result_precision(&self, result: &ResultHandle) -> i32 {
        // SAFETY: the result handle is live while borrowed.
        unsafe { taos_result_precision(res_ptr(result)) }
    }

    fn fetch_block<'r>(&self, result: &'r mut ResultHandle) -> RawBlock<'r> {
        let res = res_ptr(result);
        let mut row: TAOS_ROW = ptr::null_mut();
        // SAFETY: `row` receives an array of column pointers owned by `res`.
        let n = unsafe { taos_fetch_block(res, &mut row) };
        let rows = usize::try_from(n).unwrap_or(0);
        if rows == 0 || row.is_null() {
            return RawBlock::empty();
        }

        let count = self.field_count(result);
        // SAFETY: lengths has `field_count` entries owned by `res`.
        let lengths = unsafe { taos_fetch_lengths(res) };
        if lengths.is_null() {
            return RawBlock::empty();
        }
        // SAFETY: non-null and `field_count` entries long.
        let lengths = unsafe { std::slice::from_raw_parts(lengths, count) };
        // SAFETY: the row array has `field_count` column pointers.
        let pointers = unsafe { std::slice::from_raw_parts(row, count) };

        let columns = pointers
            .iter()
            .zip(lengths)
            .map(|(&column, &len)| {
                if column.is_null() {
                    return None;
                }
                let stride = usize::try_from(len).unwrap_or(0);
                // SAFETY: each column holds `rows * stride` bytes that stay valid
                // until the next fetch or free on `res`, both of which need the
                // handle borrowed for 'r.
                let data = unsafe { std::slice::from_raw_parts(column as *const u8, rows * stride) };
                Some(RawColumn {
                    data: Cow::Borrowed(data),
                    stride,
                })
            })
            .collect();

        RawBlock { rows, columns }
    }

    fn free_result(&self, result: ResultHandle) {
        // SAFETY: the handle is consumed, so this is the only free.
        unsafe { taos_free_result(res_ptr(&result)) }
    }

    fn close(&self, conn: ConnHandle) {
        // SAFETY: the handle is consumed, so this is the only close.
        unsafe { taos_close(conn_ptr(&conn)) }
    }

    fn server_info(&self, conn: &ConnHandle) -> Option<String> {
        // SAFETY: the connection handle is live while borrowed.
        let info = unsafe { taos_get_server_info(conn_ptr(conn)) };
        if info.is_null() {
            None
        } else {
            // SAFETY: non-null NUL-terminated string owned by the connection.
            Some(unsafe { string_from(info) })
        }
    }
}
