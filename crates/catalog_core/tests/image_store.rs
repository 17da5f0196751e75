use catalog_core::image::image_name_for;
use catalog_core::{CancelReason, Cancellation, FsImageStore, ImageStore, ImageStoreError};
use std::path::Path;

fn file_count(dir: &Path) -> usize {
    std::fs::read_dir(dir).unwrap().count()
}

#[test]
fn put_twice_with_identical_bytes_stores_one_file() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsImageStore::new(dir.path());
    let cancel = Cancellation::new();

    let first = store.put(&cancel, b"test image data").unwrap();
    let second = store.put(&cancel, b"test image data").unwrap();

    assert_eq!(first, second);
    assert_eq!(first, image_name_for(b"test image data"));
    assert_eq!(file_count(dir.path()), 1);
    assert!(dir.path().join(&first).is_file());
}

#[test]
fn stored_bytes_are_readable_by_name() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsImageStore::new(dir.path().join("images"));
    let cancel = Cancellation::new();
    let payload: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();

    let name = store.put(&cancel, &payload).unwrap();

    assert!(store.exists(&name).unwrap());
    assert_eq!(store.get(&cancel, &name).unwrap(), payload);
}

#[test]
fn different_content_gets_different_names() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsImageStore::new(dir.path());
    let cancel = Cancellation::new();

    let a = store.put(&cancel, b"image a").unwrap();
    let b = store.put(&cancel, b"image b").unwrap();

    assert_ne!(a, b);
    assert_eq!(file_count(dir.path()), 2);
}

#[test]
fn missing_and_malformed_names_are_typed_errors() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsImageStore::new(dir.path());
    let cancel = Cancellation::new();

    let absent = image_name_for(b"never stored");
    assert!(!store.exists(&absent).unwrap());
    assert!(matches!(
        store.get(&cancel, &absent),
        Err(ImageStoreError::ImageNotFound(name)) if name == absent
    ));
    assert!(matches!(
        store.get(&cancel, "../secrets.jpg"),
        Err(ImageStoreError::InvalidImageName(_))
    ));
}

#[test]
fn cancelled_put_leaves_no_file() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsImageStore::new(dir.path());
    let cancel = Cancellation::new();
    cancel.cancel();

    let err = store.put(&cancel, b"test image data").unwrap_err();

    assert!(matches!(
        err,
        ImageStoreError::Cancelled(CancelReason::Cancelled)
    ));
    assert_eq!(file_count(dir.path()), 0);
}

#[test]
fn cancel_during_write_discards_temp_file() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsImageStore::new(dir.path());
    let payload = vec![0x5a_u8; 128 * 1024 * 1024];

    let cancel = Cancellation::new();
    let remote = cancel.clone();
    let root = dir.path().to_path_buf();
    let watcher = std::thread::spawn(move || {
        let give_up = std::time::Instant::now() + std::time::Duration::from_secs(30);
        while file_count(&root) == 0 && std::time::Instant::now() < give_up {
            std::thread::yield_now();
        }
        remote.cancel();
    });

    let err = store.put(&cancel, &payload).unwrap_err();
    watcher.join().unwrap();

    assert!(matches!(
        err,
        ImageStoreError::Cancelled(CancelReason::Cancelled)
    ));
    assert_eq!(file_count(dir.path()), 0);
    assert!(!store.exists(&image_name_for(&payload)).unwrap());
}

#[cfg(unix)]
#[test]
fn unwritable_root_reports_write_failed() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, b"file in the way").unwrap();
    let store = FsImageStore::new(&blocker);

    let err = store
        .put(&Cancellation::new(), b"test image data")
        .unwrap_err();
    assert!(matches!(err, ImageStoreError::WriteFailed { .. }));
}
