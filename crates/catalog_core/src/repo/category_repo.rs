//! Category store contract and SQLite implementation.
//!
//! # Responsibility
//! - Map category names to stable integer identities.
//! - Guarantee one identity per distinct name under concurrent writers.
//!
//! # Invariants
//! - `categories.name` carries a `UNIQUE` constraint; at most one insert per
//!   name ever succeeds.
//! - A losing concurrent insert re-reads the winner's row instead of
//!   surfacing the constraint violation.
//! - Name matching is exact (no case folding, no trimming).

use super::{require_table, run_guarded, RepoError, RepoResult};
use crate::cancel::Cancellation;
use crate::db::DbError;
use crate::model::category::{validate_category_name, Category, CategoryId};
use log::{debug, info, warn};
use rusqlite::{Connection, OptionalExtension};

/// Repository interface for category lookups and lazy creation.
pub trait CategoryStore {
    /// Returns the id of the category named `name`, creating it on first use.
    fn get_or_create(&self, cancel: &Cancellation, name: &str) -> RepoResult<CategoryId>;
    /// Loads one category; `CategoryNotFound` when absent.
    fn get_by_id(&self, cancel: &Cancellation, id: CategoryId) -> RepoResult<Category>;
    /// Lists all categories ordered by id.
    fn list(&self, cancel: &Cancellation) -> RepoResult<Vec<Category>>;
}

/// SQLite-backed category store.
pub struct SqliteCategoryStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCategoryStore<'conn> {
    /// Creates a store from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        require_table(conn, "categories", &["id", "name"])?;
        Ok(Self { conn })
    }
}

impl CategoryStore for SqliteCategoryStore<'_> {
    fn get_or_create(&self, cancel: &Cancellation, name: &str) -> RepoResult<CategoryId> {
        validate_category_name(name)?;

        run_guarded(self.conn, cancel, || {
            if let Some(id) = find_id_by_name(self.conn, name)? {
                debug!("event=category_get_or_create module=repo status=ok outcome=existing id={id}");
                return Ok(id);
            }

            match self
                .conn
                .execute("INSERT INTO categories (name) VALUES (?1);", [name])
            {
                Ok(_) => {
                    let id = self.conn.last_insert_rowid();
                    info!("event=category_get_or_create module=repo status=ok outcome=created id={id}");
                    Ok(id)
                }
                Err(err) => {
                    let err = DbError::from(err);
                    if !err.is_unique_violation() {
                        return Err(err.into());
                    }
                    // Another writer inserted the same name between our lookup and insert.
                    let id = find_id_by_name(self.conn, name)?.ok_or_else(|| {
                        RepoError::InvalidData(format!(
                            "category `{name}` missing after unique conflict"
                        ))
                    })?;
                    warn!("event=category_get_or_create module=repo status=ok outcome=conflict_resolved id={id}");
                    Ok(id)
                }
            }
        })
    }

    fn get_by_id(&self, cancel: &Cancellation, id: CategoryId) -> RepoResult<Category> {
        run_guarded(self.conn, cancel, || {
            self.conn
                .query_row(
                    "SELECT id, name FROM categories WHERE id = ?1;",
                    [id],
                    |row| {
                        Ok(Category {
                            id: row.get("id")?,
                            name: row.get("name")?,
                        })
                    },
                )
                .optional()?
                .ok_or(RepoError::CategoryNotFound(id))
        })
    }

    fn list(&self, cancel: &Cancellation) -> RepoResult<Vec<Category>> {
        run_guarded(self.conn, cancel, || {
            let mut stmt = self
                .conn
                .prepare("SELECT id, name FROM categories ORDER BY id ASC;")?;
            let mut rows = stmt.query([])?;
            let mut categories = Vec::new();
            while let Some(row) = rows.next()? {
                categories.push(Category {
                    id: row.get("id")?,
                    name: row.get("name")?,
                });
            }
            Ok(categories)
        })
    }
}

fn find_id_by_name(conn: &Connection, name: &str) -> RepoResult<Option<CategoryId>> {
    let id = conn
        .query_row(
            "SELECT id FROM categories WHERE name = ?1;",
            [name],
            |row| row.get(0),
        )
        .optional()?;
    Ok(id)
}
