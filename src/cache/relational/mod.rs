//! Relational Store
//!
//! Logic shared by the SQL backends. Entries live in one `cache` table with
//! `(key, value, created_at, ttl)` columns; a NULL `ttl` never expires.
//!
//! Every statement carries the liveness predicate, so expired rows are
//! invisible to reads, deletes and arithmetic. A read that misses issues a
//! best-effort purge of the key's expired row.

mod mysql;
mod sqlite;

use std::time::Duration;

use tracing::debug;

use crate::cache::entry::{now_secs, remaining};
use crate::cache::store::{apply_delta, purge_outcome, Store};
use crate::error::{CacheError, Result};

pub use self::mysql::{MySqlDriver, MYSQL};
pub use self::sqlite::{SqliteDriver, SQLITE};

/// Liveness predicate; binds the current Unix second once.
pub const LIVE_PREDICATE: &str = "(ttl IS NULL OR created_at + ttl >= ?)";

/// Largest TTL written to a row; keeps `created_at + ttl` inside BIGINT.
const MAX_STORED_TTL: i64 = i64::MAX / 2;

// == SQL Values ==
/// Positional statement parameter, converted by each driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlValue {
    Text(String),
    Int(i64),
    Null,
}

/// A row as fetched by the select statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRow {
    pub value: String,
    pub created_at: i64,
    pub ttl: Option<i64>,
}

// == Driver Trait ==
/// Minimal synchronous SQL access a dialect driver provides.
pub trait SqlDriver: Send + Sync {
    /// Runs a statement and returns the number of affected rows.
    fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<u64>;

    /// Runs a `SELECT value, created_at, ttl` query and returns the first row.
    fn fetch(&self, sql: &str, params: &[SqlValue]) -> Result<Option<StoredRow>>;
}

// == Dialect ==
/// Statement syntax that differs between SQL engines.
#[derive(Debug)]
pub struct Dialect {
    /// Backend name used in logs
    pub name: &'static str,
    /// Idempotent table bootstrap
    pub schema: &'static str,
    /// Insert-or-replace taking `(key, value, created_at, ttl)`
    pub upsert: &'static str,
    /// The quoted key column
    pub key_column: &'static str,
    /// `value` cast to a 64-bit integer
    pub as_integer: &'static str,
    /// Target type when casting the arithmetic result back to text
    pub text_type: &'static str,
    /// True iff `value` holds a canonical integer
    pub integer_guard: &'static str,
}

/// Statements rendered once per store from its dialect.
#[derive(Debug, Clone)]
pub(crate) struct Statements {
    pub select: String,
    pub delete_live: String,
    pub purge_expired: String,
    pub delete_all: String,
    pub adjust: String,
}

impl Statements {
    pub(crate) fn render(dialect: &Dialect) -> Self {
        let key = dialect.key_column;
        Self {
            select: format!(
                "SELECT value, created_at, ttl FROM cache WHERE {key} = ? AND {LIVE_PREDICATE}"
            ),
            delete_live: format!("DELETE FROM cache WHERE {key} = ? AND {LIVE_PREDICATE}"),
            purge_expired: format!("DELETE FROM cache WHERE {key} = ? AND NOT {LIVE_PREDICATE}"),
            delete_all: "DELETE FROM cache".to_string(),
            // Params: delta, key, now, lower bound, upper bound
            adjust: format!(
                "UPDATE cache SET value = CAST({int} + ? AS {text}) \
                 WHERE {key} = ? AND {LIVE_PREDICATE} AND {guard} AND {int} BETWEEN ? AND ?",
                int = dialect.as_integer,
                text = dialect.text_type,
                guard = dialect.integer_guard,
            ),
        }
    }
}

/// Range a value may hold so that adding `delta` cannot overflow.
fn safe_range(delta: i64) -> (i64, i64) {
    if delta >= 0 {
        (i64::MIN, i64::MAX - delta)
    } else {
        (i64::MIN - delta, i64::MAX)
    }
}

fn stored_ttl(ttl: Option<Duration>) -> SqlValue {
    match ttl {
        Some(ttl) => SqlValue::Int(i64::try_from(ttl.as_secs()).map_or(MAX_STORED_TTL, |secs| {
            secs.min(MAX_STORED_TTL)
        })),
        None => SqlValue::Null,
    }
}

// == Relational Store ==
/// SQL-backed store, generic over the dialect driver.
pub struct RelationalStore<D> {
    driver: D,
    dialect: &'static Dialect,
    statements: Statements,
}

impl<D: SqlDriver> RelationalStore<D> {
    // == Constructor ==
    /// Wraps a driver and bootstraps the table.
    pub fn new(driver: D, dialect: &'static Dialect) -> Result<Self> {
        driver.execute(dialect.schema, &[])?;
        Ok(Self {
            driver,
            dialect,
            statements: Statements::render(dialect),
        })
    }

    fn fetch_live(&self, key: &str, now: i64) -> Result<Option<StoredRow>> {
        self.driver.fetch(
            &self.statements.select,
            &[SqlValue::Text(key.to_string()), SqlValue::Int(now)],
        )
    }

    /// Best-effort removal of the key's row if it is expired.
    fn purge(&self, key: &str, now: i64) {
        let outcome = self
            .driver
            .execute(
                &self.statements.purge_expired,
                &[SqlValue::Text(key.to_string()), SqlValue::Int(now)],
            )
            .map(|purged| {
                if purged > 0 {
                    debug!(backend = self.dialect.name, key, "Purged expired row");
                }
            });
        purge_outcome(self.dialect.name, key, outcome);
    }

    fn live_row(&self, key: &str) -> Result<StoredRow> {
        let now = now_secs();
        match self.fetch_live(key, now)? {
            Some(row) => Ok(row),
            None => {
                self.purge(key, now);
                Err(CacheError::NotFound(key.to_string()))
            }
        }
    }
}

impl<D: SqlDriver> Store for RelationalStore<D> {
    fn name(&self) -> &'static str {
        self.dialect.name
    }

    fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()> {
        self.driver.execute(
            self.dialect.upsert,
            &[
                SqlValue::Text(key.to_string()),
                SqlValue::Text(value.to_string()),
                SqlValue::Int(now_secs()),
                stored_ttl(ttl),
            ],
        )?;
        Ok(())
    }

    fn get(&self, key: &str) -> Result<String> {
        self.live_row(key).map(|row| row.value)
    }

    fn delete(&self, key: &str) -> Result<()> {
        let now = now_secs();
        let deleted = self.driver.execute(
            &self.statements.delete_live,
            &[SqlValue::Text(key.to_string()), SqlValue::Int(now)],
        )?;

        if deleted == 0 {
            self.purge(key, now);
            return Err(CacheError::NotFound(key.to_string()));
        }
        Ok(())
    }

    fn delete_all(&self) -> Result<()> {
        self.driver.execute(&self.statements.delete_all, &[])?;
        Ok(())
    }

    fn adjust(&self, key: &str, delta: i64) -> Result<()> {
        let now = now_secs();
        let (lower, upper) = safe_range(delta);
        let updated = self.driver.execute(
            &self.statements.adjust,
            &[
                SqlValue::Int(delta),
                SqlValue::Text(key.to_string()),
                SqlValue::Int(now),
                SqlValue::Int(lower),
                SqlValue::Int(upper),
            ],
        )?;

        if updated > 0 {
            return Ok(());
        }

        // Nothing matched: tell a missing row from a non-numeric one.
        let row = self.live_row(key)?;
        apply_delta(key, &row.value, delta)?;
        if delta == 0 {
            // MySQL reports changed rows, so a zero delta matches nothing.
            return Ok(());
        }
        Err(CacheError::Backend(format!(
            "Row for key '{key}' changed while being updated"
        )))
    }

    fn ttl(&self, key: &str) -> Result<Option<Duration>> {
        let row = self.live_row(key)?;
        let ttl = row.ttl.map(|ttl| u64::try_from(ttl).unwrap_or(0));
        Ok(remaining(row.created_at, ttl, now_secs()))
    }
}
