//! Item store contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist item rows that reference a category id and an image name.
//! - Serve list, point lookup, and keyword search with the category name
//!   joined into each [`ItemView`].
//!
//! # Invariants
//! - Inserts commit only while the caller's handle has not fired; a cancelled
//!   insert leaves no row behind.
//! - List and search results follow insertion order (`items.id ASC`).
//! - Keyword search treats `%`, `_` and `\` in the keyword literally.

use super::{require_table, run_guarded, RepoError, RepoResult};
use crate::cancel::Cancellation;
use crate::model::item::{Item, ItemId, ItemView};
use log::debug;
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};

const ITEM_VIEW_SELECT_SQL: &str = "SELECT
    items.id AS id,
    items.name AS name,
    items.category_id AS category_id,
    categories.name AS category,
    items.image_name AS image_name
FROM items
INNER JOIN categories ON categories.id = items.category_id";

/// Repository interface for item persistence and reads.
pub trait ItemStore {
    /// Inserts `item` and writes the assigned identity back into `item.id`.
    ///
    /// The referenced category must already exist; callers normally resolve
    /// it through `CategoryStore::get_or_create` first.
    fn insert(&self, cancel: &Cancellation, item: &mut Item) -> RepoResult<ItemId>;
    /// Lists every item in insertion order.
    fn list(&self, cancel: &Cancellation) -> RepoResult<Vec<ItemView>>;
    /// Loads one item; `ItemNotFound` when absent.
    fn select(&self, cancel: &Cancellation, id: ItemId) -> RepoResult<ItemView>;
    /// Lists items whose name contains `keyword`. An empty keyword matches all.
    fn search_by_keyword(&self, cancel: &Cancellation, keyword: &str)
        -> RepoResult<Vec<ItemView>>;
}

/// SQLite-backed item store.
pub struct SqliteItemStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteItemStore<'conn> {
    /// Creates a store from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        require_table(conn, "categories", &["id", "name"])?;
        require_table(conn, "items", &["id", "name", "category_id", "image_name"])?;
        Ok(Self { conn })
    }

    fn query_views(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> RepoResult<Vec<ItemView>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params)?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_item_view_row(row)?);
        }
        Ok(items)
    }
}

impl ItemStore for SqliteItemStore<'_> {
    fn insert(&self, cancel: &Cancellation, item: &mut Item) -> RepoResult<ItemId> {
        item.validate()?;

        let id = run_guarded(self.conn, cancel, || {
            let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
            tx.execute(
                "INSERT INTO items (name, category_id, image_name) VALUES (?1, ?2, ?3);",
                params![item.name.as_str(), item.category_id, item.image_name.as_str()],
            )?;
            let id = tx.last_insert_rowid();
            // Dropping `tx` without commit rolls the row back.
            cancel.check()?;
            tx.commit()?;
            Ok(id)
        })?;

        item.id = id;
        debug!(
            "event=item_insert module=repo status=ok id={} category_id={}",
            id, item.category_id
        );
        Ok(id)
    }

    fn list(&self, cancel: &Cancellation) -> RepoResult<Vec<ItemView>> {
        run_guarded(self.conn, cancel, || {
            self.query_views(&format!("{ITEM_VIEW_SELECT_SQL} ORDER BY items.id ASC;"), [])
        })
    }

    fn select(&self, cancel: &Cancellation, id: ItemId) -> RepoResult<ItemView> {
        run_guarded(self.conn, cancel, || {
            let sql = format!("{ITEM_VIEW_SELECT_SQL} WHERE items.id = ?1;");
            let mut stmt = self.conn.prepare(&sql)?;
            let mut rows = stmt.query([id])?;
            match rows.next()? {
                Some(row) => parse_item_view_row(row),
                None => Err(RepoError::ItemNotFound(id)),
            }
        })
    }

    fn search_by_keyword(
        &self,
        cancel: &Cancellation,
        keyword: &str,
    ) -> RepoResult<Vec<ItemView>> {
        let pattern = format!("%{}%", escape_like(keyword));
        run_guarded(self.conn, cancel, || {
            self.query_views(
                &format!(
                    "{ITEM_VIEW_SELECT_SQL}
                     WHERE items.name LIKE ?1 ESCAPE '\\'
                     ORDER BY items.id ASC;"
                ),
                [pattern.as_str()],
            )
        })
    }
}

fn parse_item_view_row(row: &Row<'_>) -> RepoResult<ItemView> {
    let id: ItemId = row.get("id")?;
    let image_name = row
        .get::<_, Option<String>>("image_name")?
        .ok_or_else(|| RepoError::InvalidData(format!("null image_name for item {id}")))?;

    Ok(ItemView {
        id,
        name: row.get("name")?,
        category_id: row.get("category_id")?,
        category: row.get("category")?,
        image_name,
    })
}

fn escape_like(keyword: &str) -> String {
    let mut escaped = String::with_capacity(keyword.len());
    for ch in keyword.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
