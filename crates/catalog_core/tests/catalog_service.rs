use catalog_core::db::open_db_in_memory;
use catalog_core::{
    AddItemRequest, Cancellation, CatalogError, CatalogService, CategoryStore, FsImageStore,
    ImageStore, Item, ItemId, ItemStore, ItemView, RepoError, RepoResult, SqliteCategoryStore,
    SqliteItemStore, ValidationError,
};
use rusqlite::Connection;
use std::path::Path;

const IMAGE: &[u8] = b"test image data";

/// Item store whose inserts always fail, for exercising the orphan path.
struct RejectingItemStore;

impl ItemStore for RejectingItemStore {
    fn insert(&self, _cancel: &Cancellation, _item: &mut Item) -> RepoResult<ItemId> {
        Err(RepoError::InvalidData("insert rejected".to_string()))
    }

    fn list(&self, _cancel: &Cancellation) -> RepoResult<Vec<ItemView>> {
        Ok(Vec::new())
    }

    fn select(&self, _cancel: &Cancellation, id: ItemId) -> RepoResult<ItemView> {
        Err(RepoError::ItemNotFound(id))
    }

    fn search_by_keyword(
        &self,
        _cancel: &Cancellation,
        _keyword: &str,
    ) -> RepoResult<Vec<ItemView>> {
        Ok(Vec::new())
    }
}

fn image_files(dir: &Path) -> usize {
    match std::fs::read_dir(dir) {
        Ok(entries) => entries.count(),
        Err(_) => 0,
    }
}

fn row_count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })
    .unwrap()
}

#[test]
fn add_item_end_to_end_round_trips_through_select() {
    let conn = open_db_in_memory().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let images = FsImageStore::new(dir.path());
    let service = CatalogService::new(
        SqliteCategoryStore::try_new(&conn).unwrap(),
        SqliteItemStore::try_new(&conn).unwrap(),
        images.clone(),
    );
    let cancel = Cancellation::new();

    let added = service
        .add_item(&cancel, &AddItemRequest::new("used iPhone 16e", "phone", IMAGE))
        .unwrap();

    assert!(added.id > 0);
    assert_eq!(added.name, "used iPhone 16e");
    assert_eq!(added.category, "phone");
    assert!(images.exists(&added.image_name).unwrap());
    assert_eq!(service.read_image(&cancel, &added.image_name).unwrap(), IMAGE);

    let selected = service.get_item(&cancel, added.id).unwrap();
    assert_eq!(selected, added);

    let category = service.get_category(&cancel, added.category_id).unwrap();
    assert_eq!(category.name, "phone");
}

#[test]
fn add_item_reuses_category_and_image_for_repeat_input() {
    let conn = open_db_in_memory().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let service = CatalogService::new(
        SqliteCategoryStore::try_new(&conn).unwrap(),
        SqliteItemStore::try_new(&conn).unwrap(),
        FsImageStore::new(dir.path()),
    );
    let cancel = Cancellation::new();

    let first = service
        .add_item(&cancel, &AddItemRequest::new("jacket", "fashion", IMAGE))
        .unwrap();
    let second = service
        .add_item(&cancel, &AddItemRequest::new("coat", "fashion", IMAGE))
        .unwrap();

    assert_ne!(first.id, second.id);
    assert_eq!(first.category_id, second.category_id);
    assert_eq!(first.image_name, second.image_name);
    assert_eq!(row_count(&conn, "categories"), 1);
    assert_eq!(image_files(dir.path()), 1);

    let listed = service.list_items(&cancel).unwrap();
    assert_eq!(listed, vec![first, second]);
    assert_eq!(service.search_items(&cancel, "coat").unwrap().len(), 1);
    assert_eq!(service.list_categories(&cancel).unwrap().len(), 1);
}

#[test]
fn add_item_with_empty_name_mutates_nothing() {
    let conn = open_db_in_memory().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let service = CatalogService::new(
        SqliteCategoryStore::try_new(&conn).unwrap(),
        SqliteItemStore::try_new(&conn).unwrap(),
        FsImageStore::new(dir.path()),
    );

    let err = service
        .add_item(&Cancellation::new(), &AddItemRequest::new("", "phone", IMAGE))
        .unwrap_err();

    assert!(matches!(
        err,
        CatalogError::Validation(ValidationError::EmptyItemName)
    ));
    assert_eq!(row_count(&conn, "categories"), 0);
    assert_eq!(row_count(&conn, "items"), 0);
    assert_eq!(image_files(dir.path()), 0);
}

#[test]
fn add_item_rejects_blank_category_and_empty_image() {
    let request = AddItemRequest::new("jacket", " ", IMAGE);
    assert_eq!(
        request.validate(),
        Err(ValidationError::EmptyCategoryName)
    );

    let request = AddItemRequest::new("jacket", "fashion", Vec::new());
    assert_eq!(request.validate(), Err(ValidationError::EmptyImage));
}

#[test]
fn image_failure_prevents_item_insert() {
    let conn = open_db_in_memory().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, b"file in the way").unwrap();
    let service = CatalogService::new(
        SqliteCategoryStore::try_new(&conn).unwrap(),
        SqliteItemStore::try_new(&conn).unwrap(),
        FsImageStore::new(&blocker),
    );

    let err = service
        .add_item(&Cancellation::new(), &AddItemRequest::new("jacket", "fashion", IMAGE))
        .unwrap_err();

    assert!(matches!(err, CatalogError::Image(_)));
    assert_eq!(row_count(&conn, "items"), 0);
}

#[test]
fn insert_failure_after_image_write_leaves_orphaned_image() {
    let conn = open_db_in_memory().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let images = FsImageStore::new(dir.path());
    let service = CatalogService::new(
        SqliteCategoryStore::try_new(&conn).unwrap(),
        RejectingItemStore,
        images.clone(),
    );

    let err = service
        .add_item(&Cancellation::new(), &AddItemRequest::new("jacket", "fashion", IMAGE))
        .unwrap_err();

    assert!(matches!(err, CatalogError::Item(RepoError::InvalidData(_))));
    assert_eq!(row_count(&conn, "items"), 0);
    let orphan = catalog_core::image::image_name_for(IMAGE);
    assert!(images.exists(&orphan).unwrap());
}

#[test]
fn cancelled_add_item_creates_nothing() {
    let conn = open_db_in_memory().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let service = CatalogService::new(
        SqliteCategoryStore::try_new(&conn).unwrap(),
        SqliteItemStore::try_new(&conn).unwrap(),
        FsImageStore::new(dir.path()),
    );
    let cancel = Cancellation::new();
    cancel.cancel();

    let err = service
        .add_item(&cancel, &AddItemRequest::new("jacket", "fashion", IMAGE))
        .unwrap_err();

    assert!(matches!(err, CatalogError::Category(RepoError::Cancelled(_))));
    assert_eq!(row_count(&conn, "categories"), 0);
    assert_eq!(image_files(dir.path()), 0);
}

#[test]
fn missing_item_is_reported_as_not_found() {
    let conn = open_db_in_memory().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let categories = SqliteCategoryStore::try_new(&conn).unwrap();
    categories
        .get_or_create(&Cancellation::new(), "phone")
        .unwrap();
    let service = CatalogService::new(
        categories,
        SqliteItemStore::try_new(&conn).unwrap(),
        FsImageStore::new(dir.path()),
    );

    let err = service.get_item(&Cancellation::new(), 1).unwrap_err();
    assert!(err.is_not_found());
    assert!(matches!(err, CatalogError::Item(RepoError::ItemNotFound(1))));
}
