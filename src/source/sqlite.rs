//! SQLite-backed data source with a one-shot bootstrap from the source
//! workbook.
//!
//! The store holds one table per ingested identity, named after the identity
//! itself ("1.1", "3.1"), with columns equal to the normalized spreadsheet
//! header. There is no metadata table yet, so metadata retrieval fails with
//! an explicit "not supported" signal instead of pretending the block is
//! merely absent.

use std::path::{Path, PathBuf};

use rusqlite::Connection;
use rusqlite::types::ValueRef;
use tracing::{info, warn};

use crate::config::SqliteConfig;
use crate::error::{DataSourceError, SourceResult};
use crate::model::{ColumnType, DataTable, Value};
use crate::source::{DataLevel, DataSource, ExcelDataSource, MetadataBlock};

/// Table identities loaded by the bootstrap. The workbook holds many more
/// sheets; only these two are served relationally.
const INGEST_TABLES: &[&str] = &["1.1", "3.1"];

/// Data source that queries a SQLite database.
#[derive(Debug)]
pub struct SqliteDataSource {
    db_path: PathBuf,
}

impl SqliteDataSource {
    /// Open a SQLite-backed source.
    ///
    /// When `create_tables_from_excel` is set and no database file exists at
    /// `db_path` yet, the source workbook is ingested first (see
    /// [`ingest_workbook`]). An existing store is never re-ingested.
    pub fn open(config: &SqliteConfig) -> SourceResult<Self> {
        let source = Self {
            db_path: PathBuf::from(&config.db_path),
        };
        if config.create_tables_from_excel && !source.db_path.exists() {
            source.bootstrap(Path::new(&config.excel_file))?;
        }
        Ok(source)
    }

    fn bootstrap(&self, excel_file: &Path) -> SourceResult<()> {
        let excel = ExcelDataSource::open(excel_file)?;
        let mut conn = Connection::open(&self.db_path).map_err(|e| {
            DataSourceError::backend(format!(
                "cannot create database {}: {e}",
                self.db_path.display()
            ))
        })?;
        ingest_workbook(&mut conn, &excel);
        Ok(())
    }
}

impl DataSource for SqliteDataSource {
    fn get_data(&self, table: &str, level: DataLevel) -> SourceResult<DataTable> {
        // Connection is scoped to this call and released on drop, success or not.
        let conn = Connection::open(&self.db_path).map_err(|e| {
            DataSourceError::data_not_found(format!(
                "cannot open database {}: {e}",
                self.db_path.display()
            ))
        })?;
        query_level(&conn, table, level)
    }

    /// Not implemented: the relational store has no header/metadata
    /// convention yet. A metadata table is a separate, explicit extension.
    fn get_metadata(&self, table: &str) -> SourceResult<MetadataBlock> {
        Err(DataSourceError::unsupported(format!(
            "metadata retrieval is not implemented for the sqlite backend (table '{table}')"
        )))
    }
}

/// Load the allow-listed workbook sheets into `conn`, one relational table
/// per identity.
///
/// This is a best-effort bootstrap, not a transaction: a failure on one
/// identity is logged and that identity is skipped; ingestion continues with
/// the remaining ones. Metadata is not ingested (no metadata-table design
/// exists yet).
fn ingest_workbook(conn: &mut Connection, excel: &ExcelDataSource) {
    for &table in INGEST_TABLES {
        let outcome = excel
            .normalized_table(table)
            .and_then(|data| load_table(conn, table, &data));
        match outcome {
            Ok(rows) => info!(table, rows, "ingested sheet into sqlite store"),
            Err(e) => warn!(table, error = %e, "skipping sheet during ingestion"),
        }
    }
}

/// Create the destination table for `data` (replacing any existing table of
/// the same name) and bulk-load all rows. Returns the number of rows loaded.
fn load_table(conn: &mut Connection, name: &str, data: &DataTable) -> SourceResult<usize> {
    if data.is_empty() {
        return Err(DataSourceError::data_not_found(format!(
            "no data found for sheet '{name}'"
        )));
    }

    let wrap = |e: rusqlite::Error| {
        DataSourceError::backend(format!("cannot load table '{name}': {e}"))
    };

    let tx = conn.transaction().map_err(wrap)?;
    tx.execute_batch(&format!(
        "DROP TABLE IF EXISTS {};\n{};",
        quote_ident(name),
        create_table_sql(name, data)
    ))
    .map_err(wrap)?;

    let placeholders: Vec<String> = (1..=data.columns().len()).map(|i| format!("?{i}")).collect();
    let insert = format!(
        "INSERT INTO {} VALUES ({})",
        quote_ident(name),
        placeholders.join(", ")
    );
    {
        let mut stmt = tx.prepare(&insert).map_err(wrap)?;
        for row in data.rows() {
            stmt.execute(rusqlite::params_from_iter(row.iter().map(value_to_sql)))
                .map_err(wrap)?;
        }
    }
    tx.commit().map_err(wrap)?;
    Ok(data.row_count())
}

/// Map the table's column types onto SQLite storage classes when defining
/// the destination schema.
fn create_table_sql(name: &str, data: &DataTable) -> String {
    let columns: Vec<String> = data
        .columns()
        .iter()
        .map(|c| format!("{} {}", quote_ident(&c.name), sql_type(c.column_type)))
        .collect();
    format!("CREATE TABLE {} ({})", quote_ident(name), columns.join(", "))
}

fn sql_type(column_type: ColumnType) -> &'static str {
    match column_type {
        ColumnType::Integer => "INTEGER",
        ColumnType::Float => "REAL",
        ColumnType::Text => "TEXT",
    }
}

/// Table identities like "1.1" and columns like "NUTS 1" are not bare SQL
/// identifiers; quote everything.
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn value_to_sql(value: &Value) -> rusqlite::types::Value {
    match value {
        Value::Null => rusqlite::types::Value::Null,
        Value::Integer(i) => rusqlite::types::Value::Integer(*i),
        Value::Float(f) => rusqlite::types::Value::Real(*f),
        Value::Text(s) => rusqlite::types::Value::Text(s.clone()),
    }
}

/// Issue the equality-filtered query for one level and materialize all
/// matching rows.
fn query_level(conn: &Connection, table: &str, level: DataLevel) -> SourceResult<DataTable> {
    let wrap = |e: rusqlite::Error| {
        DataSourceError::data_not_found(format!("error retrieving data from '{table}': {e}"))
    };

    let sql = format!(
        "SELECT * FROM {} WHERE {} = ?1",
        quote_ident(table),
        quote_ident(level.column_name())
    );
    let mut stmt = conn.prepare(&sql).map_err(wrap)?;
    let names: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();

    let mut result = stmt.query([level.as_str()]).map_err(wrap)?;
    let mut rows: Vec<Vec<Value>> = Vec::new();
    while let Some(row) = result.next().map_err(wrap)? {
        let cells: Result<Vec<Value>, rusqlite::Error> = (0..names.len())
            .map(|i| row.get_ref(i).map(value_from_sql))
            .collect();
        rows.push(cells.map_err(wrap)?);
    }

    if rows.is_empty() {
        return Err(DataSourceError::data_not_found(format!(
            "no data found for table '{table}' with data level {}",
            level.as_str()
        )));
    }
    Ok(DataTable::with_inferred_types(names, rows))
}

fn value_from_sql(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Integer(i),
        ValueRef::Real(f) => Value::Float(f),
        ValueRef::Text(bytes) => Value::Text(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::Text(String::from_utf8_lossy(bytes).into_owned()),
    }
}
