//! Repository layer abstractions and SQLite implementations.
//!
//! # Responsibility
//! - Define the category and item store contracts consumed by callers.
//! - Isolate SQLite query details from catalog orchestration.
//!
//! # Invariants
//! - Write paths validate records before SQL mutations.
//! - Missing rows are reported as typed `*NotFound` errors, not logged as
//!   failures.
//! - Every operation honors the caller's [`Cancellation`] handle.

pub mod category_repo;
pub mod item_repo;

use crate::cancel::{CancelReason, Cancellation};
use crate::db::DbError;
use crate::model::category::CategoryId;
use crate::model::item::ItemId;
use crate::model::ValidationError;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Error shared by the category and item stores.
#[derive(Debug)]
pub enum RepoError {
    /// Record failed field validation before any SQL ran.
    Validation(ValidationError),
    /// Underlying SQLite failure (connectivity, constraint, malformed query).
    Db(DbError),
    ItemNotFound(ItemId),
    CategoryNotFound(CategoryId),
    /// The caller's handle fired; nothing was committed.
    Cancelled(CancelReason),
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Required column is missing from expected table.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Persisted data cannot be converted to a valid read model.
    InvalidData(String),
}

impl RepoError {
    /// Returns whether this is an expected "row absent" outcome.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ItemNotFound(_) | Self::CategoryNotFound(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::ItemNotFound(id) => write!(f, "item not found: {id}"),
            Self::CategoryNotFound(id) => write!(f, "category not found: {id}"),
            Self::Cancelled(reason) => write!(f, "{reason}"),
            Self::MissingRequiredTable(table) => {
                write!(f, "catalog store requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "catalog store requires column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted catalog data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Cancelled(reason) => Some(reason),
            Self::ItemNotFound(_)
            | Self::CategoryNotFound(_)
            | Self::MissingRequiredTable(_)
            | Self::MissingRequiredColumn { .. }
            | Self::InvalidData(_) => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<CancelReason> for RepoError {
    fn from(value: CancelReason) -> Self {
        Self::Cancelled(value)
    }
}

/// Runs one store operation under the caller's cancellation handle.
///
/// Fails fast when the handle already fired, interrupts SQLite while it is
/// running, and reports an interrupted statement as `Cancelled`.
pub(crate) fn run_guarded<T>(
    conn: &Connection,
    cancel: &Cancellation,
    op: impl FnOnce() -> RepoResult<T>,
) -> RepoResult<T> {
    cancel.check()?;
    match cancel.guard_sqlite(conn, op) {
        Err(RepoError::Db(err)) if err.is_interrupted() => Err(RepoError::Cancelled(
            cancel.reason().unwrap_or(CancelReason::Cancelled),
        )),
        other => other,
    }
}

/// Verifies `table` exists with every column in `columns`.
pub(crate) fn require_table(
    conn: &Connection,
    table: &'static str,
    columns: &[&'static str],
) -> RepoResult<()> {
    if !table_exists(conn, table)? {
        return Err(RepoError::MissingRequiredTable(table));
    }
    for column in columns {
        if !table_has_column(conn, table, column)? {
            return Err(RepoError::MissingRequiredColumn { table, column });
        }
    }
    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
