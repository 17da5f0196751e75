//! Filesystem image store.
//!
//! Files live flat under the root directory, one per distinct content. Writes
//! go to a temp file in the same directory and are renamed into place, so a
//! reader either sees the complete file or nothing.

use super::{ImageResult, ImageStore, ImageStoreError};
use crate::cancel::Cancellation;
use log::{debug, error};
use sha2::{Digest, Sha256};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

const IMAGE_EXTENSION: &str = "jpg";
const HASH_HEX_LEN: usize = 64;
const WRITE_CHUNK_BYTES: usize = 64 * 1024;

/// Returns the content-addressed name for `bytes`.
pub fn image_name_for(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    format!("{}.{IMAGE_EXTENSION}", hex::encode(digest))
}

/// Returns whether `name` has the shape produced by [`image_name_for`].
pub fn is_valid_image_name(name: &str) -> bool {
    let Some(hash) = name.strip_suffix(&format!(".{IMAGE_EXTENSION}")) else {
        return false;
    };
    hash.len() == HASH_HEX_LEN
        && hash
            .as_bytes()
            .iter()
            .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// Image store backed by a flat directory.
#[derive(Debug, Clone)]
pub struct FsImageStore {
    root: PathBuf,
}

impl FsImageStore {
    /// Creates a store rooted at `root`. The directory is created lazily on
    /// first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the file path for a validated image name.
    pub fn path_for(&self, name: &str) -> ImageResult<PathBuf> {
        if !is_valid_image_name(name) {
            return Err(ImageStoreError::InvalidImageName(name.to_string()));
        }
        Ok(self.root.join(name))
    }

    fn write_new(&self, cancel: &Cancellation, path: &Path, bytes: &[u8]) -> ImageResult<()> {
        let write_failed = |source| ImageStoreError::WriteFailed {
            path: path.to_path_buf(),
            source,
        };

        std::fs::create_dir_all(&self.root).map_err(|source| ImageStoreError::WriteFailed {
            path: self.root.clone(),
            source,
        })?;

        // Dropping `tmp` on any early return deletes the partial file.
        let mut tmp = tempfile::Builder::new()
            .prefix(".upload-")
            .suffix(".tmp")
            .tempfile_in(&self.root)
            .map_err(write_failed)?;

        for chunk in bytes.chunks(WRITE_CHUNK_BYTES) {
            cancel.check()?;
            tmp.write_all(chunk).map_err(write_failed)?;
        }
        tmp.as_file().sync_all().map_err(write_failed)?;
        cancel.check()?;

        // Concurrent writers of the same content race here; every candidate
        // holds identical bytes, so whichever rename lands last is fine.
        tmp.persist(path).map_err(|err| write_failed(err.error))?;
        Ok(())
    }
}

impl ImageStore for FsImageStore {
    fn put(&self, cancel: &Cancellation, bytes: &[u8]) -> ImageResult<String> {
        cancel.check()?;
        let name = image_name_for(bytes);
        let path = self.root.join(&name);

        if path.is_file() {
            debug!("event=image_put module=image status=ok outcome=existing name={name}");
            return Ok(name);
        }

        match self.write_new(cancel, &path, bytes) {
            Ok(()) => {
                debug!(
                    "event=image_put module=image status=ok outcome=written name={} bytes={}",
                    name,
                    bytes.len()
                );
                Ok(name)
            }
            Err(err @ ImageStoreError::Cancelled(_)) => Err(err),
            Err(err) => {
                error!(
                    "event=image_put module=image status=error error_code=image_write_failed error={}",
                    err
                );
                Err(err)
            }
        }
    }

    fn get(&self, cancel: &Cancellation, name: &str) -> ImageResult<Vec<u8>> {
        cancel.check()?;
        let path = self.path_for(name)?;
        match std::fs::read(&path) {
            Ok(bytes) => Ok(bytes),
            Err(source) if source.kind() == ErrorKind::NotFound => {
                Err(ImageStoreError::ImageNotFound(name.to_string()))
            }
            Err(source) => Err(ImageStoreError::ReadFailed { path, source }),
        }
    }

    fn exists(&self, name: &str) -> ImageResult<bool> {
        Ok(self.path_for(name)?.is_file())
    }
}
