//! Content-addressed image artifact storage.
//!
//! # Responsibility
//! - Define the image store contract used by the catalog service.
//! - Provide the filesystem implementation rooted at a configured directory.
//!
//! # Invariants
//! - Image names are `<sha256-hex>.jpg` of the stored bytes.
//! - A name never resolves to partially written bytes.

mod fs_store;

pub use fs_store::{image_name_for, is_valid_image_name, FsImageStore};

use crate::cancel::{CancelReason, Cancellation};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub type ImageResult<T> = Result<T, ImageStoreError>;

/// Errors from image store operations.
#[derive(Debug)]
pub enum ImageStoreError {
    /// Name is not a content-addressed image name.
    InvalidImageName(String),
    /// No image is stored under this name.
    ImageNotFound(String),
    /// Storage medium rejected the write; no file was published.
    WriteFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    ReadFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The caller's handle fired; the temp file was discarded.
    Cancelled(CancelReason),
}

impl ImageStoreError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }
}

impl Display for ImageStoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidImageName(name) => write!(f, "invalid image name `{name}`"),
            Self::ImageNotFound(name) => write!(f, "image not found: {name}"),
            Self::WriteFailed { path, source } => {
                write!(f, "failed to write image `{}`: {source}", path.display())
            }
            Self::ReadFailed { path, source } => {
                write!(f, "failed to read image `{}`: {source}", path.display())
            }
            Self::Cancelled(reason) => write!(f, "{reason}"),
        }
    }
}

impl Error for ImageStoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::WriteFailed { source, .. } | Self::ReadFailed { source, .. } => Some(source),
            Self::Cancelled(reason) => Some(reason),
            Self::InvalidImageName(_) | Self::ImageNotFound(_) => None,
        }
    }
}

impl From<CancelReason> for ImageStoreError {
    fn from(value: CancelReason) -> Self {
        Self::Cancelled(value)
    }
}

/// Repository interface for image bytes.
pub trait ImageStore {
    /// Stores `bytes` and returns the name that resolves to them.
    ///
    /// Storing identical bytes again returns the same name and leaves the
    /// existing file untouched.
    fn put(&self, cancel: &Cancellation, bytes: &[u8]) -> ImageResult<String>;
    /// Reads the bytes stored under `name`.
    fn get(&self, cancel: &Cancellation, name: &str) -> ImageResult<Vec<u8>>;
    /// Returns whether `name` resolves to a stored image.
    fn exists(&self, name: &str) -> ImageResult<bool>;
}
