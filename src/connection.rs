//! Connection implementation for the taos-sql driver.
//!
//! `TaosConnection` owns one native session. It offers the row API
//! ([`TaosConnection::exec`], [`TaosConnection::query`]) directly and the
//! ADBC `Connection` trait on top of it.

#![allow(refining_impl_trait)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use adbc_core::{Connection, Optionable, options::{InfoCode, ObjectDepth, OptionConnection, OptionValue}};
use arrow_array::{ArrayRef, RecordBatch, StringArray, UInt32Array};
use arrow_schema::{DataType, Field, Schema};
use tracing::debug;

use crate::cursor::ResultCursor;
use crate::error::TaosError;
use crate::native::{ConnectParams, NativeClient};
use crate::reader::VecRecordBatchReader;
use crate::rows::{ExecResult, Rows};
use crate::session::{Execution, Session, SharedSession, lock};
use crate::statement::TaosStatement;
use crate::types::{ColumnType, TimestampPrecision};

/// Runs a statement for its side effects on `session`.
///
/// A statement that returns rows is accepted too; its result is released
/// immediately and no rows are reported as affected.
pub(crate) fn run_exec(session: &SharedSession, sql: &str) -> Result<ExecResult, TaosError> {
    let mut guard = lock(session);
    match guard.execute(sql)? {
        Execution::Affected(n) => Ok(ExecResult::new(n)),
        Execution::Rows(meta) => {
            guard.release(meta.id);
            Ok(ExecResult::new(0))
        }
    }
}

/// Runs a statement that must produce rows.
pub(crate) fn run_query(session: &SharedSession, sql: &str) -> Result<Rows, TaosError> {
    let execution = lock(session).execute(sql)?;
    match execution {
        Execution::Rows(meta) => Ok(Rows::new(ResultCursor::new(Arc::clone(session), meta))),
        Execution::Affected(_) => Err(TaosError::no_result_set(sql)),
    }
}

/// Connection to a TDengine server.
///
/// One connection runs one statement at a time; starting a new statement
/// releases the result of the previous one. Access is serialized internally,
/// so a connection can be shared across threads, but rows from an earlier
/// query stop working as soon as another query runs.
pub struct TaosConnection {
    session: SharedSession,
    version: String,
    catalog: Option<String>,
}

impl std::fmt::Debug for TaosConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaosConnection")
            .field("version", &self.version)
            .field("catalog", &self.catalog)
            .finish_non_exhaustive()
    }
}

impl TaosConnection {
    /// Opens a connection.
    ///
    /// # Arguments
    /// * `client` - Native client used for every call on this connection
    /// * `params` - Host, port, credentials and default database
    pub fn open(client: Arc<dyn NativeClient>, params: &ConnectParams) -> Result<Self, TaosError> {
        let session = Session::open(client, params)?;
        let version = session
            .server_version()
            .unwrap_or_else(|| "unknown".to_string());
        debug!(version = %version, "connected");
        let catalog = (!params.database.is_empty()).then(|| params.database.clone());
        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            version,
            catalog,
        })
    }

    /// Returns the TDengine server version.
    pub fn server_version(&self) -> &str {
        &self.version
    }

    /// Executes a statement that does not return rows.
    ///
    /// # Example
    /// ```ignore
    /// let result = conn.exec("INSERT INTO t VALUES (now, 1)")?;
    /// assert_eq!(result.rows_affected(), 1);
    /// ```
    pub fn exec(&self, sql: &str) -> Result<ExecResult, TaosError> {
        run_exec(&self.session, sql)
    }

    /// Executes a query and returns a cursor over its rows.
    ///
    /// Fails with a no-result-set error when the statement produces no
    /// result fields, e.g. DDL or INSERT.
    pub fn query(&self, sql: &str) -> Result<Rows, TaosError> {
        run_query(&self.session, sql)
    }

    /// Rows affected by the last statement that returned no result set.
    pub fn affected_rows(&self) -> i64 {
        lock(&self.session).affected_rows()
    }

    /// Closes the native connection. Further statements fail; repeated calls
    /// are no-ops.
    pub fn close(&self) {
        lock(&self.session).close();
    }

    /// Switches the default database.
    pub fn use_database(&mut self, database: &str) -> Result<(), TaosError> {
        self.exec(&format!("USE {}", database))?;
        self.catalog = Some(database.to_string());
        Ok(())
    }

    fn qualify(&self, catalog: Option<&str>, name: &str) -> String {
        match catalog.or(self.catalog.as_deref()) {
            Some(db) => format!("{}.{}", db, name),
            None => name.to_string(),
        }
    }

    /// Reads the first column of every row as a string.
    fn first_column(&self, sql: &str) -> Result<Vec<String>, TaosError> {
        let mut rows = self.query(sql)?;
        let mut names = Vec::new();
        while rows.next()? {
            names.push(rows.get_as::<String>(0)?);
        }
        Ok(names)
    }

    fn list_databases(&self) -> Result<Vec<String>, TaosError> {
        self.first_column("SHOW DATABASES")
    }

    /// Lists `(table_name, table_type)` pairs of a database.
    fn list_tables(&self, db: &str) -> Result<Vec<(String, String)>, TaosError> {
        let mut tables: Vec<(String, String)> = self
            .first_column(&format!("SHOW {}.STABLES", db))?
            .into_iter()
            .map(|name| (name, "SUPER TABLE".to_string()))
            .collect();
        tables.extend(
            self.first_column(&format!("SHOW {}.TABLES", db))?
                .into_iter()
                .map(|name| (name, "TABLE".to_string())),
        );
        Ok(tables)
    }

    /// Runs `DESCRIBE` and returns `(field, type, note)` triples.
    fn describe(
        &self,
        catalog: Option<&str>,
        table_name: &str,
    ) -> Result<Vec<(String, String, String)>, TaosError> {
        let mut rows = self.query(&format!("DESCRIBE {}", self.qualify(catalog, table_name)))?;
        let mut columns = Vec::new();
        while rows.next()? {
            let name = rows.get_as::<String>(0)?;
            let ty = rows.get_as::<String>(1)?;
            let note = match rows.columns().len() {
                n if n > 3 => rows.get_as::<Option<String>>(3)?.unwrap_or_default(),
                _ => String::new(),
            };
            columns.push((name, ty, note));
        }
        Ok(columns)
    }

    /// Gets TAGS metadata for a TDengine supertable.
    ///
    /// # Arguments
    /// * `catalog` - Database name (catalog in ADBC terms)
    /// * `table_name` - Supertable name
    ///
    /// # Returns
    /// RecordBatchReader containing tag names and types
    ///
    /// # Example
    /// ```ignore
    /// let tags_reader = conn.get_table_tags(Some("power"), "meters")?;
    /// ```
    pub fn get_table_tags(
        &self,
        catalog: Option<&str>,
        table_name: &str,
    ) -> adbc_core::error::Result<VecRecordBatchReader> {
        let (names, types): (Vec<String>, Vec<String>) = self
            .describe(catalog, table_name)?
            .into_iter()
            .filter(|(_, _, note)| note.eq_ignore_ascii_case("TAG"))
            .map(|(name, ty, _)| (name, ty))
            .unzip();

        let schema = Schema::new(vec![
            Field::new("tag_name", DataType::Utf8, false),
            Field::new("tag_type", DataType::Utf8, false),
        ]);
        let batch = RecordBatch::try_new(
            Arc::new(schema.clone()),
            vec![
                Arc::new(StringArray::from(names)) as ArrayRef,
                Arc::new(StringArray::from(types)) as ArrayRef,
            ],
        )
        .map_err(|e| adbc_core::error::Error::with_message_and_status(
            format!("Failed to create tags batch: {}", e),
            adbc_core::error::Status::Internal,
        ))?;
        Ok(VecRecordBatchReader::new(vec![batch], schema))
    }

    /// Checks if a table is a supertable.
    ///
    /// # Arguments
    /// * `catalog` - Database name; the connection's current database if `None`
    /// * `table_name` - Table name
    pub fn is_supertable(&self, catalog: Option<&str>, table_name: &str) -> Result<bool, TaosError> {
        let db = catalog.or(self.catalog.as_deref()).ok_or_else(|| {
            TaosError::invalid_option("No database selected".to_string())
        })?;
        Ok(self
            .first_column(&format!("SHOW {}.STABLES", db))?
            .iter()
            .any(|name| name == table_name))
    }
}

fn not_implemented<T>(message: &str) -> adbc_core::error::Result<T> {
    Err(adbc_core::error::Error::with_message_and_status(
        message,
        adbc_core::error::Status::NotImplemented,
    ))
}

impl Optionable for TaosConnection {
    type Option = OptionConnection;

    fn set_option(&mut self, key: Self::Option, value: OptionValue) -> adbc_core::error::Result<()> {
        match (key, value) {
            (OptionConnection::CurrentCatalog, OptionValue::String(db)) => {
                self.use_database(&db)?;
                Ok(())
            }
            // TDengine has no transactions, so autocommit is always on.
            (OptionConnection::AutoCommit, OptionValue::String(v)) if v == "true" => Ok(()),
            (OptionConnection::AutoCommit, _) => {
                not_implemented("Disabling autocommit is not supported")
            }
            _ => not_implemented("Unsupported connection option"),
        }
    }

    fn get_option_string(&self, key: Self::Option) -> adbc_core::error::Result<String> {
        match key {
            OptionConnection::CurrentCatalog => self.catalog.clone().ok_or_else(|| {
                adbc_core::error::Error::with_message_and_status(
                    "No database selected",
                    adbc_core::error::Status::NotFound,
                )
            }),
            OptionConnection::AutoCommit => Ok("true".to_string()),
            _ => not_implemented("Unsupported connection option"),
        }
    }

    fn get_option_bytes(&self, _key: Self::Option) -> adbc_core::error::Result<Vec<u8>> {
        not_implemented("Unsupported connection option")
    }

    fn get_option_double(&self, _key: Self::Option) -> adbc_core::error::Result<f64> {
        not_implemented("Unsupported connection option")
    }

    fn get_option_int(&self, _key: Self::Option) -> adbc_core::error::Result<i64> {
        not_implemented("Unsupported connection option")
    }
}

impl Connection for TaosConnection {
    type StatementType = TaosStatement;

    fn new_statement(&mut self) -> adbc_core::error::Result<Self::StatementType> {
        Ok(TaosStatement::new(Arc::clone(&self.session)))
    }

    fn cancel(&mut self) -> adbc_core::error::Result<()> {
        not_implemented("Query cancellation not supported")
    }

    fn get_info(
        &self,
        codes: Option<HashSet<InfoCode>>,
    ) -> adbc_core::error::Result<impl arrow_array::RecordBatchReader + Send> {
        let entries = [
            (InfoCode::VendorName, "TDengine".to_string()),
            (InfoCode::VendorVersion, self.version.clone()),
            (InfoCode::DriverName, "taos-sql".to_string()),
            (InfoCode::DriverVersion, env!("CARGO_PKG_VERSION").to_string()),
        ];
        let (info_codes, info_values): (Vec<u32>, Vec<String>) = entries
            .into_iter()
            .filter(|(code, _)| codes.as_ref().is_none_or(|c| c.contains(code)))
            .map(|(code, value)| (code as u32, value))
            .unzip();

        let schema = Schema::new(vec![
            Field::new("info_code", DataType::UInt32, false),
            Field::new("info_value", DataType::Utf8, false),
        ]);
        let batch = RecordBatch::try_new(
            Arc::new(schema.clone()),
            vec![
                Arc::new(UInt32Array::from(info_codes)) as ArrayRef,
                Arc::new(StringArray::from(info_values)) as ArrayRef,
            ],
        )
        .map_err(|e| adbc_core::error::Error::with_message_and_status(
            format!("Failed to create info batch: {}", e),
            adbc_core::error::Status::Internal,
        ))?;

        Ok(VecRecordBatchReader::new(vec![batch], schema))
    }

    fn get_objects(
        &self,
        depth: ObjectDepth,
        catalog: Option<&str>,
        _db_schema: Option<&str>,
        table_name: Option<&str>,
        table_type: Option<Vec<&str>>,
        column_name: Option<&str>,
    ) -> adbc_core::error::Result<Box<dyn arrow_array::RecordBatchReader + Send>> {
        let databases: Vec<String> = self
            .list_databases()?
            .into_iter()
            .filter(|db| catalog.is_none_or(|c| c == db))
            .collect();

        if matches!(depth, ObjectDepth::Catalogs) {
            let schema = Schema::new(vec![Field::new("catalog_name", DataType::Utf8, true)]);
            let batch = RecordBatch::try_new(
                Arc::new(schema.clone()),
                vec![Arc::new(StringArray::from(databases)) as ArrayRef],
            )
            .map_err(|e| adbc_core::error::Error::with_message_and_status(
                format!("Failed to create batch: {}", e),
                adbc_core::error::Status::Internal,
            ))?;
            return Ok(Box::new(VecRecordBatchReader::new(vec![batch], schema)));
        }

        let mut catalog_names: Vec<String> = Vec::new();
        let mut table_names: Vec<Option<String>> = Vec::new();
        let mut table_types: Vec<Option<String>> = Vec::new();
        let mut column_names: Vec<Option<String>> = Vec::new();
        let mut column_types: Vec<Option<String>> = Vec::new();

        for db in &databases {
            if matches!(depth, ObjectDepth::Schemas) {
                catalog_names.push(db.clone());
                table_names.push(None);
                table_types.push(None);
                column_names.push(None);
                column_types.push(None);
                continue;
            }

            let tables = self.list_tables(db)?.into_iter().filter(|(tbl, ttype)| {
                table_name.is_none_or(|t| t == tbl)
                    && table_type.as_ref().is_none_or(|types| types.contains(&ttype.as_str()))
            });

            for (tbl, ttype) in tables {
                let columns = if matches!(depth, ObjectDepth::Tables) {
                    Vec::new()
                } else {
                    self.describe(Some(db), &tbl)?
                        .into_iter()
                        .filter(|(col, _, _)| column_name.is_none_or(|c| c == col))
                        .collect()
                };

                if columns.is_empty() {
                    catalog_names.push(db.clone());
                    table_names.push(Some(tbl));
                    table_types.push(Some(ttype));
                    column_names.push(None);
                    column_types.push(None);
                    continue;
                }
                for (col, ctype, _) in columns {
                    catalog_names.push(db.clone());
                    table_names.push(Some(tbl.clone()));
                    table_types.push(Some(ttype.clone()));
                    column_names.push(Some(col));
                    column_types.push(Some(ctype));
                }
            }
        }

        // TDengine has no schema level; the database doubles as the schema.
        let db_schema_names: Vec<Option<String>> =
            catalog_names.iter().cloned().map(Some).collect();
        let schema = Schema::new(vec![
            Field::new("catalog_name", DataType::Utf8, true),
            Field::new("db_schema_name", DataType::Utf8, true),
            Field::new("table_name", DataType::Utf8, true),
            Field::new("table_type", DataType::Utf8, true),
            Field::new("column_name", DataType::Utf8, true),
            Field::new("column_type", DataType::Utf8, true),
        ]);
        let batch = RecordBatch::try_new(
            Arc::new(schema.clone()),
            vec![
                Arc::new(StringArray::from(catalog_names)) as ArrayRef,
                Arc::new(StringArray::from(db_schema_names)) as ArrayRef,
                Arc::new(StringArray::from(table_names)) as ArrayRef,
                Arc::new(StringArray::from(table_types)) as ArrayRef,
                Arc::new(StringArray::from(column_names)) as ArrayRef,
                Arc::new(StringArray::from(column_types)) as ArrayRef,
            ],
        )
        .map_err(|e| adbc_core::error::Error::with_message_and_status(
            format!("Failed to create objects batch: {}", e),
            adbc_core::error::Status::Internal,
        ))?;

        Ok(Box::new(VecRecordBatchReader::new(vec![batch], schema)))
    }

    fn get_table_schema(
        &self,
        catalog: Option<&str>,
        db_schema: Option<&str>,
        table_name: &str,
    ) -> adbc_core::error::Result<Schema> {
        let db = db_schema.or(catalog);
        let columns = self.describe(db, table_name).map_err(|e| {
            adbc_core::error::Error::with_message_and_status(
                format!("Failed to describe table '{}': {}", table_name, e),
                adbc_core::error::Status::NotFound,
            )
        })?;

        // DESCRIBE does not report the database precision.
        let fields = columns
            .into_iter()
            .map(|(name, ty, _)| {
                let data_type = ColumnType::from_sql_name(&ty)
                    .map_or(DataType::Utf8, |t| t.arrow_type(TimestampPrecision::default()));
                Field::new(name, data_type, true)
            })
            .collect::<Vec<_>>();
        Ok(Schema::new(fields))
    }

    fn get_table_types(&self) -> adbc_core::error::Result<impl arrow_array::RecordBatchReader + Send> {
        let schema = Schema::new(vec![Field::new("table_type", DataType::Utf8, false)]);
        let batch = RecordBatch::try_new(
            Arc::new(schema.clone()),
            vec![Arc::new(StringArray::from(vec!["TABLE", "SUPER TABLE"])) as ArrayRef],
        )
        .map_err(|e| adbc_core::error::Error::with_message_and_status(
            format!("Failed to create table types batch: {}", e),
            adbc_core::error::Status::Internal,
        ))?;
        Ok(VecRecordBatchReader::new(vec![batch], schema))
    }

    fn get_statistic_names(&self) -> adbc_core::error::Result<impl arrow_array::RecordBatchReader + Send> {
        let schema = Schema::new(vec![
            Field::new("statistic_name", DataType::Utf8, false),
            Field::new("statistic_key", DataType::Int16, false),
        ]);
        Ok(VecRecordBatchReader::empty(schema))
    }

    fn get_statistics(
        &self,
        _catalog: Option<&str>,
        _db_schema: Option<&str>,
        _table_name: Option<&str>,
        _approximate: bool,
    ) -> adbc_core::error::Result<impl arrow_array::RecordBatchReader + Send> {
        Ok(VecRecordBatchReader::empty(Schema::empty()))
    }

    fn commit(&mut self) -> adbc_core::error::Result<()> {
        not_implemented("Transaction commit not supported")
    }

    fn rollback(&mut self) -> adbc_core::error::Result<()> {
        not_implemented("Transaction rollback not supported")
    }

    fn read_partition(
        &self,
        _partition: impl AsRef<[u8]>,
    ) -> adbc_core::error::Result<Box<dyn arrow_array::RecordBatchReader + Send>> {
        not_implemented("Partitioned reads not supported")
    }
}

#[cfg(test)]
mod tests {
    use arrow_array::cast::AsArray;
    use arrow_array::RecordBatchReader;

    use super::*;
    use crate::native::fake::{FakeBlock, FakeClient, FakeResultSet, field};
    use crate::value::Value;

    fn params() -> ConnectParams {
        ConnectParams {
            host: Some("localhost".to_string()),
            port: 6030,
            user: "root".to_string(),
            password: "taosdata".to_string(),
            database: "power".to_string(),
        }
    }

    fn names(values: &[&str]) -> FakeResultSet {
        FakeResultSet::new(vec![field("name", ColumnType::Binary, 34)])
            .block(FakeBlock::new().binaries(34, &values.iter().map(|v| Some(*v)).collect::<Vec<_>>()))
    }

    fn describe(rows: &[(&str, &str, &str)]) -> FakeResultSet {
        let fields: Vec<Option<&str>> = rows.iter().map(|r| Some(r.0)).collect();
        let types: Vec<Option<&str>> = rows.iter().map(|r| Some(r.1)).collect();
        let notes: Vec<Option<&str>> = rows.iter().map(|r| Some(r.2)).collect();
        FakeResultSet::new(vec![
            field("Field", ColumnType::Binary, 66),
            field("Type", ColumnType::Binary, 22),
            field("Length", ColumnType::Int, 4),
            field("Note", ColumnType::Binary, 58),
        ])
        .block(
            FakeBlock::new()
                .binaries(66, &fields)
                .binaries(22, &types)
                .ints(&vec![Some(8); rows.len()])
                .binaries(58, &notes),
        )
    }

    fn catalog_fixture() -> Arc<FakeClient> {
        let fake = Arc::new(FakeClient::new());
        fake.respond_rows("SHOW DATABASES", names(&["power"]));
        fake.respond_rows("SHOW power.STABLES", names(&["meters"]));
        fake.respond_rows("SHOW power.TABLES", names(&["d1001"]));
        fake.respond_rows(
            "DESCRIBE power.meters",
            describe(&[
                ("ts", "TIMESTAMP", ""),
                ("current", "BIGINT UNSIGNED", ""),
                ("location", "BINARY", "TAG"),
            ]),
        );
        fake.respond_rows("DESCRIBE power.d1001", describe(&[("ts", "TIMESTAMP", "")]));
        fake
    }

    fn connect(fake: &Arc<FakeClient>) -> TaosConnection {
        TaosConnection::open(fake.clone(), &params()).unwrap()
    }

    #[test]
    fn test_open_reads_server_version() {
        let fake = Arc::new(FakeClient::new());
        let conn = connect(&fake);
        assert_eq!(conn.server_version(), "2.4.0.16");
        assert_eq!(
            conn.get_option_string(OptionConnection::CurrentCatalog).unwrap(),
            "power"
        );
    }

    #[test]
    fn test_exec_and_query() {
        let fake = Arc::new(FakeClient::new());
        fake.respond_affected("create table t (ts timestamp, v int)", 0);
        fake.respond_affected("insert into t values (now, 1)", 1);
        fake.respond_rows(
            "select * from t",
            FakeResultSet::new(vec![field("v", ColumnType::Int, 4)])
                .block(FakeBlock::new().ints(&[Some(1)])),
        );
        let conn = connect(&fake);

        assert_eq!(conn.exec("create table t (ts timestamp, v int)").unwrap().rows_affected(), 0);
        let inserted = conn.exec("insert into t values (now, 1)").unwrap();
        assert_eq!(inserted.rows_affected(), 1);
        assert_eq!(inserted.last_insert_id(), 0);
        assert_eq!(conn.affected_rows(), 1);

        let mut rows = conn.query("select * from t").unwrap();
        assert!(rows.next().unwrap());
        assert_eq!(rows.get(0).unwrap(), Value::BigInt(1));
        assert!(!rows.next().unwrap());
    }

    #[test]
    fn test_query_without_result_set() {
        let fake = Arc::new(FakeClient::new());
        fake.respond_affected("drop table t", 0);
        let conn = connect(&fake);

        let err = conn.query("drop table t").unwrap_err();
        assert!(err.is_no_result_set());
        assert_eq!(fake.live_results(), 0);
    }

    #[test]
    fn test_exec_on_select_releases_result() {
        let fake = Arc::new(FakeClient::new());
        fake.respond_rows("select 1", names(&["x"]));
        let conn = connect(&fake);
        assert_eq!(conn.exec("select 1").unwrap().rows_affected(), 0);
        assert_eq!(fake.live_results(), 0);
    }

    #[test]
    fn test_close_then_exec() {
        let fake = Arc::new(FakeClient::new());
        let conn = connect(&fake);
        conn.close();
        conn.close();
        assert!(conn.exec("select 1").unwrap_err().is_connection());
        assert_eq!(fake.closed_connections(), 1);
    }

    #[test]
    fn test_get_info_filters_codes() {
        let fake = Arc::new(FakeClient::new());
        let conn = connect(&fake);
        let codes: HashSet<InfoCode> = [InfoCode::VendorName].into_iter().collect();
        let batches: Vec<RecordBatch> = conn.get_info(Some(codes)).unwrap().map(|b| b.unwrap()).collect();
        assert_eq!(batches[0].num_rows(), 1);
        assert_eq!(batches[0].column(1).as_string::<i32>().value(0), "TDengine");
    }

    #[test]
    fn test_get_table_schema() {
        let fake = catalog_fixture();
        let conn = connect(&fake);
        let schema = conn.get_table_schema(None, Some("power"), "meters").unwrap();
        assert_eq!(schema.fields().len(), 3);
        assert_eq!(schema.field(1).data_type(), &DataType::UInt64);
        assert_eq!(schema.field(2).data_type(), &DataType::Binary);

        let err = conn.get_table_schema(None, Some("power"), "missing").unwrap_err();
        assert_eq!(err.status, adbc_core::error::Status::NotFound);
    }

    #[test]
    fn test_get_table_tags() {
        let fake = catalog_fixture();
        let conn = connect(&fake);
        let mut reader = conn.get_table_tags(Some("power"), "meters").unwrap();
        let batch = reader.next().unwrap().unwrap();
        assert_eq!(batch.num_rows(), 1);
        assert_eq!(batch.column(0).as_string::<i32>().value(0), "location");
        assert!(conn.is_supertable(None, "meters").unwrap());
        assert!(!conn.is_supertable(None, "d1001").unwrap());
    }

    #[test]
    fn test_get_objects_tables() {
        let fake = catalog_fixture();
        let conn = connect(&fake);
        let reader = conn
            .get_objects(ObjectDepth::Tables, None, None, None, Some(vec!["SUPER TABLE"]), None)
            .unwrap();
        assert_eq!(reader.schema().fields().len(), 6);
        let batches: Vec<RecordBatch> = reader.map(|b| b.unwrap()).collect();
        let tables = batches[0].column(2).as_string::<i32>();
        assert_eq!(batches[0].num_rows(), 1);
        assert_eq!(tables.value(0), "meters");
    }

    #[test]
    fn test_get_objects_columns() {
        let fake = catalog_fixture();
        let conn = connect(&fake);
        let batches: Vec<RecordBatch> = conn
            .get_objects(ObjectDepth::All, Some("power"), None, None, None, Some("ts"))
            .unwrap()
            .map(|b| b.unwrap())
            .collect();
        assert_eq!(batches[0].num_rows(), 2);
        let types = batches[0].column(5).as_string::<i32>();
        assert_eq!(types.value(0), "TIMESTAMP");
    }
}

// Rust guideline compliant 2026-10-19
