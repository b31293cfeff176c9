//! SQLite dialect and driver.

use std::path::Path;

use parking_lot::Mutex;
use rusqlite::types::{ToSqlOutput, Value, ValueRef};
use rusqlite::{params_from_iter, Connection, ErrorCode, OptionalExtension, ToSql};
use tracing::info;

use super::{Dialect, SqlDriver, SqlValue, StoredRow};
use crate::error::{CacheError, Result};

pub static SQLITE: Dialect = Dialect {
    name: "sqlite",
    schema: "CREATE TABLE IF NOT EXISTS cache (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL,
        created_at INTEGER NOT NULL,
        ttl INTEGER
    )",
    upsert: "INSERT OR REPLACE INTO cache (key, value, created_at, ttl) VALUES (?, ?, ?, ?)",
    key_column: "key",
    as_integer: "CAST(value AS INTEGER)",
    text_type: "TEXT",
    integer_guard: "CAST(CAST(value AS INTEGER) AS TEXT) = value",
};

impl From<rusqlite::Error> for CacheError {
    fn from(err: rusqlite::Error) -> Self {
        match err.sqlite_error_code() {
            Some(ErrorCode::CannotOpen) | Some(ErrorCode::NotADatabase) => {
                CacheError::ConnectionClosed(err.to_string())
            }
            _ => CacheError::Backend(err.to_string()),
        }
    }
}

impl ToSql for SqlValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            SqlValue::Text(text) => ToSqlOutput::Borrowed(ValueRef::Text(text.as_bytes())),
            SqlValue::Int(int) => ToSqlOutput::Owned(Value::Integer(*int)),
            SqlValue::Null => ToSqlOutput::Owned(Value::Null),
        })
    }
}

/// SQLite connection, serialized behind a mutex.
pub struct SqliteDriver {
    conn: Mutex<Connection>,
}

impl std::fmt::Debug for SqliteDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteDriver").finish_non_exhaustive()
    }
}

impl SqliteDriver {
    /// Opens the database at `path`; `:memory:` gives a private in-memory one.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)
            .map_err(|e| CacheError::ConnectionClosed(format!("Failed to open {path:?}: {e}")))?;

        if path != Path::new(":memory:") {
            conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        }

        info!(path = %path.display(), "Opened SQLite cache database");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Opens a private in-memory database (tests).
    pub fn open_memory() -> Result<Self> {
        Ok(Self {
            conn: Mutex::new(Connection::open_in_memory()?),
        })
    }
}

impl SqlDriver for SqliteDriver {
    fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<u64> {
        let conn = self.conn.lock();
        let affected = conn
            .prepare_cached(sql)?
            .execute(params_from_iter(params.iter()))?;
        Ok(affected as u64)
    }

    fn fetch(&self, sql: &str, params: &[SqlValue]) -> Result<Option<StoredRow>> {
        let conn = self.conn.lock();
        let row = conn
            .prepare_cached(sql)?
            .query_row(params_from_iter(params.iter()), |row| {
                Ok(StoredRow {
                    value: row.get(0)?,
                    created_at: row.get(1)?,
                    ttl: row.get(2)?,
                })
            })
            .optional()?;
        Ok(row)
    }
}
