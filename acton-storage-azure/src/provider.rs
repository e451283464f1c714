//! The upload / delete / download orchestrators
//!
//! [`AzureFileStorage`] is the surface the host calls. Upload addresses the
//! blob, sets the record's URL, streams the buffer, and then derives and
//! uploads a thumbnail for eligible image types. Delete and download invert
//! a previously produced URL back into a locator; delete cascades to the
//! paired thumbnail, download never does.
//!
//! The primary/thumbnail pair is always handled sequentially: the thumbnail
//! transfer is only started after the primary transfer completed. Block
//! parallelism inside one transfer is the transfer layer's business.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use tracing::debug;

use crate::config::AzureStorageConfig;
use crate::locator::{BlobAddressing, BlobLocator};
use crate::processing::ImageProcessor;
use crate::transfer::{BlobTransfer, ObjectStoreTransfer, TransferLimits};
use crate::types::{FileRecord, Phase, StorageError, StorageResult};

/// Azure Blob Storage upload provider
///
/// # Examples
///
/// ```rust,no_run
/// use acton_storage_azure::{AzureFileStorage, AzureStorageConfig, FileRecord};
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = AzureStorageConfig::load()?;
/// let storage = AzureFileStorage::new(&config)?;
///
/// let mut file = FileRecord::new("abc123", ".png", "image/png", vec![/* ... */]);
/// storage.upload(&mut file).await?;
///
/// // The record now carries its public URL; hand it back later to
/// // download or delete the blob (and its thumbnail, for images).
/// let data = storage.download(&file).await?;
/// storage.delete(&file).await?;
/// # Ok(())
/// # }
/// ```
pub struct AzureFileStorage {
    /// Locator/URL mapping, immutable after construction
    addressing: BlobAddressing,

    /// Thumbnail derivation for eligible image types
    images: ImageProcessor,

    /// Storage I/O collaborator
    transfer: Arc<dyn BlobTransfer>,

    /// Per-transfer bounds
    limits: TransferLimits,
}

impl AzureFileStorage {
    /// Creates a provider talking to the configured storage account.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Config` if the configuration is invalid or the
    /// Azure clients cannot be built from it.
    pub fn new(config: &AzureStorageConfig) -> StorageResult<Self> {
        config.validate()?;
        let transfer = Arc::new(ObjectStoreTransfer::for_azure(config)?);
        Ok(Self::with_transfer(config, transfer))
    }

    /// Creates a provider over an explicit transfer implementation.
    ///
    /// Useful for development and tests, where the transfer can be backed by
    /// in-memory or local-filesystem object stores.
    #[must_use]
    pub fn with_transfer(config: &AzureStorageConfig, transfer: Arc<dyn BlobTransfer>) -> Self {
        Self {
            addressing: BlobAddressing::from_config(config),
            images: ImageProcessor::new(config.max_width),
            transfer,
            limits: TransferLimits {
                concurrency: config.max_concurrent,
                ..TransferLimits::default()
            },
        }
    }

    /// Uploads a file, then its derived thumbnail for eligible image types.
    ///
    /// Sets `file.url` to the produced (possibly CDN-rewritten) URL as a
    /// side effect. The URL is set before the transfer starts and stays set
    /// if the transfer fails. Resolves only after every required transfer
    /// completed; there is no rollback of a committed primary blob when the
    /// thumbnail pass fails.
    ///
    /// # Errors
    ///
    /// Returns a phase-tagged `StorageError::Transfer` on transfer failure,
    /// or `StorageError::Image` when a declared image cannot be decoded or
    /// re-encoded.
    pub async fn upload(&self, file: &mut FileRecord) -> StorageResult<()> {
        self.upload_one(file, Phase::PrimaryUpload).await?;

        if let Some(mut thumbnail) = self.images.derive(file)? {
            self.upload_one(&mut thumbnail, Phase::ThumbnailUpload).await?;
        }
        Ok(())
    }

    async fn upload_one(&self, file: &mut FileRecord, phase: Phase) -> StorageResult<()> {
        let locator = self.addressing.locator_for(file);
        file.url = Some(self.addressing.url_for(&locator));

        self.transfer
            .upload(&locator, &file.mime, file.buffer.clone(), &self.limits)
            .await
            .map_err(|source| StorageError::Transfer { phase, source })?;

        debug!(blob = %locator.key(), %phase, "transfer complete");
        Ok(())
    }

    /// Deletes the blob a record's URL points at, then the paired thumbnail
    /// blob for eligible image types.
    ///
    /// The thumbnail delete is only started after the primary delete
    /// resolved; its failure propagates even though the primary blob is
    /// already gone.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::MissingUrl` when the record was never
    /// uploaded, `StorageError::LocatorMismatch` when the URL cannot be
    /// inverted, or a phase-tagged `StorageError::Transfer`.
    pub async fn delete(&self, file: &FileRecord) -> StorageResult<()> {
        let locator = self.locator_from_url(file)?;

        self.transfer
            .delete(&locator)
            .await
            .map_err(|source| StorageError::Transfer {
                phase: Phase::PrimaryDelete,
                source,
            })?;

        if ImageProcessor::is_thumbnailable(&file.mime) {
            self.transfer
                .delete(&locator.thumbnail())
                .await
                .map_err(|source| StorageError::Transfer {
                    phase: Phase::ThumbnailDelete,
                    source,
                })?;
        }

        debug!(blob = %locator.key(), "delete complete");
        Ok(())
    }

    /// Downloads the primary blob a record's URL points at.
    ///
    /// Reads exactly `file.size` bytes from offset 0, so `size` must be the
    /// exact byte length of the stored blob. Never cascades to the
    /// thumbnail.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::MissingUrl`, `StorageError::LocatorMismatch`,
    /// or a `StorageError::Transfer` tagged with the download phase.
    pub async fn download(&self, file: &FileRecord) -> StorageResult<Bytes> {
        let locator = self.locator_from_url(file)?;

        self.transfer
            .download_range(&locator, 0, file.size)
            .await
            .map_err(|source| StorageError::Transfer {
                phase: Phase::Download,
                source,
            })
    }

    fn locator_from_url(&self, file: &FileRecord) -> StorageResult<BlobLocator> {
        let url = file.url.as_deref().ok_or_else(|| StorageError::MissingUrl {
            hash: file.hash.clone(),
        })?;
        self.addressing.resolve(url, file.container())
    }
}

impl fmt::Debug for AzureFileStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AzureFileStorage")
            .field("addressing", &self.addressing)
            .field("limits", &self.limits)
            .finish_non_exhaustive()
    }
}
