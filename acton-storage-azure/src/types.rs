//! Core types for the storage provider

use std::fmt;

use bytes::Bytes;
use thiserror::Error;

use crate::locator::ContainerKind;
use crate::transfer::TransferError;

/// Prefix applied to a derived thumbnail's hash and blob name.
pub const THUMBNAIL_PREFIX: &str = "thumb-";

/// Errors that can occur during provider operations
#[derive(Debug, Error)]
pub enum StorageError {
    /// A URL handed back for delete/download does not contain the expected
    /// container base. Usually means `is_private` changed between upload and
    /// the later call.
    #[error("container address `{expected}` not found in url `{url}`")]
    LocatorMismatch {
        /// The URL that failed to resolve
        url: String,
        /// The container base URL that was expected as its prefix
        expected: String,
    },

    /// Delete/download called on a record that was never uploaded
    #[error("file `{hash}` has no stored url to resolve")]
    MissingUrl {
        /// Hash of the offending record
        hash: String,
    },

    /// A transfer to or from the blob store failed
    #[error("{phase} failed: {source}")]
    Transfer {
        /// Which step of which operation failed
        phase: Phase,
        /// The underlying transfer failure
        #[source]
        source: TransferError,
    },

    /// Image decode or encode failure while deriving a thumbnail
    #[error("thumbnail processing failed: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error while sniffing the image format
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or unloadable configuration
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type for provider operations
pub type StorageResult<T> = Result<T, StorageError>;

/// The step of an operation a transfer failure belongs to.
///
/// Carried on [`StorageError::Transfer`] so callers can tell a failed
/// thumbnail pass apart from a failed primary pass when diagnosing a
/// rejected operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Uploading the primary blob
    PrimaryUpload,
    /// Uploading the derived thumbnail blob
    ThumbnailUpload,
    /// Deleting the primary blob
    PrimaryDelete,
    /// Deleting the derived thumbnail blob
    ThumbnailDelete,
    /// Downloading the primary blob
    Download,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::PrimaryUpload => "primary upload",
            Self::ThumbnailUpload => "thumbnail upload",
            Self::PrimaryDelete => "primary delete",
            Self::ThumbnailDelete => "thumbnail delete",
            Self::Download => "download",
        };
        f.write_str(label)
    }
}

/// One uploaded file as the host hands it to the provider.
///
/// The host creates a record before calling upload; upload sets `url` as a
/// side effect. Delete and download take the record read-only and use `url`
/// to find the blob again.
///
/// # Examples
///
/// ```rust
/// use acton_storage_azure::FileRecord;
///
/// let file = FileRecord::new("abc123", ".png", "image/png", vec![0x89, 0x50]);
///
/// assert_eq!(file.blob_name(), "abc123.png");
/// assert_eq!(file.size, 2);
/// assert!(file.url.is_none());
/// ```
#[derive(Debug, Clone)]
pub struct FileRecord {
    /// Content-derived unique identifier, opaque to the provider
    pub hash: String,

    /// File extension including the leading dot (e.g. ".png")
    pub ext: String,

    /// MIME content type (e.g. "image/png", "application/pdf")
    pub mime: String,

    /// Raw file content; only read by upload
    pub buffer: Bytes,

    /// Byte length of the stored blob, authoritative for download sizing
    pub size: u64,

    /// Optional logical sub-path under the container
    pub path: Option<String>,

    /// Selects the private container instead of the public one
    pub is_private: bool,

    /// Externally visible locator; `None` until upload sets it
    pub url: Option<String>,
}

impl FileRecord {
    /// Creates a record for upload with the common fields filled in.
    ///
    /// `size` is taken from the buffer length; `path`, `is_private` and
    /// `url` start out unset.
    #[must_use]
    pub fn new(
        hash: impl Into<String>,
        ext: impl Into<String>,
        mime: impl Into<String>,
        buffer: impl Into<Bytes>,
    ) -> Self {
        let buffer = buffer.into();
        let size = buffer.len() as u64;
        Self {
            hash: hash.into(),
            ext: ext.into(),
            mime: mime.into(),
            buffer,
            size,
            path: None,
            is_private: false,
            url: None,
        }
    }

    /// Returns the blob name, always `hash + ext`.
    #[must_use]
    pub fn blob_name(&self) -> String {
        format!("{}{}", self.hash, self.ext)
    }

    /// Returns which container owns this record's blob.
    #[must_use]
    pub fn container(&self) -> ContainerKind {
        if self.is_private {
            ContainerKind::Private
        } else {
            ContainerKind::Public
        }
    }
}
