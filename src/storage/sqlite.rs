//! SQLite storage backend for filelink

use super::references::LinkRow;
use super::traits::{
    validate_identifier, ColumnValue, MatchPredicate, OpenStore, RecordStore, Row, StorageResult,
};
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;
use tracing::debug;

/// SQLite-backed record store
///
/// Owns the `sys_file_reference` link table. Owning record tables are
/// created by whoever owns them; this store only inserts into and updates
/// them. Thread-safe via internal mutex on the connection.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Initialize the link table schema
    fn init_schema(conn: &Connection) -> StorageResult<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS sys_file_reference (
                uid INTEGER PRIMARY KEY AUTOINCREMENT,
                pid INTEGER NOT NULL DEFAULT 0,
                tstamp INTEGER NOT NULL DEFAULT 0,
                crdate INTEGER NOT NULL DEFAULT 0,
                uid_local INTEGER NOT NULL,
                uid_foreign INTEGER NOT NULL,
                tablenames TEXT NOT NULL,
                fieldname TEXT NOT NULL,
                sorting_foreign INTEGER NOT NULL DEFAULT 0
            );

            -- Lookup of a record's references per field
            CREATE INDEX IF NOT EXISTS idx_file_reference_foreign
                ON sys_file_reference(tablenames, uid_foreign, fieldname);

            PRAGMA journal_mode = WAL;
            "#,
        )?;
        Ok(())
    }

    fn from_connection(conn: Connection) -> StorageResult<Self> {
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run raw SQL, e.g. to create owning record tables
    pub fn execute_batch(&self, sql: &str) -> StorageResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(sql)?;
        Ok(())
    }

    /// Read one integer column of an owning record
    pub fn load_int_column(&self, table: &str, uid: i64, column: &str) -> StorageResult<Option<i64>> {
        let sql = format!(
            "SELECT \"{}\" FROM \"{}\" WHERE uid = ?1",
            validate_identifier(column)?,
            validate_identifier(table)?
        );
        let conn = self.conn.lock().unwrap();
        let value = conn
            .query_row(&sql, params![uid], |row| row.get::<_, Option<i64>>(0))
            .optional()?;
        Ok(value.flatten())
    }

    /// Link rows pointing at one owning record, ordered by field and rank
    pub fn load_file_references(&self, table: &str, record_uid: i64) -> StorageResult<Vec<LinkRow>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT pid, crdate, tstamp, uid_local, tablenames, uid_foreign, fieldname, sorting_foreign
             FROM sys_file_reference
             WHERE tablenames = ?1 AND uid_foreign = ?2
             ORDER BY fieldname, sorting_foreign, uid",
        )?;
        let links = stmt
            .query_map(params![table, record_uid], |row| {
                Ok(LinkRow {
                    location_id: row.get(0)?,
                    created_at: row.get(1)?,
                    updated_at: row.get(2)?,
                    source_identifier: row.get(3)?,
                    target_table: row.get(4)?,
                    target_record_id: row.get(5)?,
                    target_field: row.get(6)?,
                    rank: row.get(7)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(links)
    }

    fn to_sql(value: &ColumnValue) -> SqlValue {
        match value {
            ColumnValue::Int(v) => SqlValue::Integer(*v),
            ColumnValue::Text(s) => SqlValue::Text(s.clone()),
        }
    }

    /// Quote every column name after validating it
    fn quoted_columns(row: &Row) -> StorageResult<Vec<String>> {
        row.keys()
            .map(|column| validate_identifier(column).map(|c| format!("\"{}\"", c)))
            .collect()
    }
}

impl OpenStore for SqliteStore {
    fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }

        Self::from_connection(Connection::open(path)?)
    }

    fn open_in_memory() -> StorageResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }
}

impl RecordStore for SqliteStore {
    fn insert(&self, table: &str, row: &Row) -> StorageResult<()> {
        let columns = Self::quoted_columns(row)?;
        let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{}", i)).collect();
        let sql = format!(
            "INSERT INTO \"{}\" ({}) VALUES ({})",
            validate_identifier(table)?,
            columns.join(", "),
            placeholders.join(", ")
        );

        let conn = self.conn.lock().unwrap();
        conn.execute(&sql, params_from_iter(row.values().map(Self::to_sql)))?;
        Ok(())
    }

    fn update(&self, table: &str, columns: &Row, predicate: &MatchPredicate) -> StorageResult<usize> {
        if columns.is_empty() {
            return Ok(0);
        }

        let assignments: Vec<String> = Self::quoted_columns(columns)?
            .into_iter()
            .enumerate()
            .map(|(i, column)| format!("{} = ?{}", column, i + 1))
            .collect();
        let sql = format!(
            "UPDATE \"{}\" SET {} WHERE \"{}\" = ?{}",
            validate_identifier(table)?,
            assignments.join(", "),
            validate_identifier(&predicate.column)?,
            columns.len() + 1
        );

        let values: Vec<SqlValue> = columns
            .values()
            .chain(std::iter::once(&predicate.value))
            .map(Self::to_sql)
            .collect();

        let conn = self.conn.lock().unwrap();
        let affected = conn.execute(&sql, params_from_iter(values))?;
        debug!(table, affected, "sqlite update");
        Ok(affected)
    }
}
