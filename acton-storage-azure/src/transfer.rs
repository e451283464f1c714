//! Blob transfer: the storage I/O collaborator
//!
//! The orchestrators in [`crate::provider`] only ever touch the blob store
//! through the [`BlobTransfer`] trait. [`ObjectStoreTransfer`] implements it
//! over a public/private pair of [`object_store`] stores; `for_azure` wires
//! both containers of the configured storage account, while `new` accepts
//! any stores (in-memory or local filesystem for development and tests).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use object_store::azure::MicrosoftAzureBuilder;
use object_store::path::Path;
use object_store::{Attribute, Attributes, ObjectStore, PutMultipartOpts, WriteMultipart};
use thiserror::Error;
use tokio::time::timeout;
use tracing::debug;

use crate::config::AzureStorageConfig;
use crate::locator::{BlobLocator, ContainerKind};
use crate::types::{StorageError, StorageResult};

/// Fixed block size for streamed uploads
pub const BLOCK_SIZE: usize = 4 * 1024 * 1024;

/// Hard ceiling on a single transfer call
pub const TRANSFER_DEADLINE: Duration = Duration::from_secs(60 * 60);

/// Per-call transfer bounds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferLimits {
    /// Size of each uploaded block in bytes
    pub block_size: usize,

    /// Bound on blocks in flight concurrently
    pub concurrency: usize,

    /// Deadline after which the transfer fails instead of hanging
    pub deadline: Duration,
}

impl Default for TransferLimits {
    fn default() -> Self {
        Self {
            block_size: BLOCK_SIZE,
            concurrency: crate::config::DEFAULT_MAX_CONCURRENT,
            deadline: TRANSFER_DEADLINE,
        }
    }
}

/// Errors surfaced by the transfer layer
#[derive(Debug, Error)]
pub enum TransferError {
    /// Failure reported by the object store, propagated verbatim
    #[error("object store error: {0}")]
    Store(#[from] object_store::Error),

    /// The transfer exceeded its deadline
    #[error("transfer exceeded deadline of {0:?}")]
    Timeout(Duration),
}

/// Storage I/O consumed by the orchestrators.
///
/// Implementations are expected to be retried/authenticated internally;
/// the provider performs no retries of its own.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BlobTransfer: Send + Sync {
    /// Uploads a buffer as blocks, honoring `limits` and setting the blob's
    /// content type.
    async fn upload(
        &self,
        locator: &BlobLocator,
        content_type: &str,
        data: Bytes,
        limits: &TransferLimits,
    ) -> Result<(), TransferError>;

    /// Downloads `length` bytes starting at `offset`.
    async fn download_range(
        &self,
        locator: &BlobLocator,
        offset: u64,
        length: u64,
    ) -> Result<Bytes, TransferError>;

    /// Deletes the blob a locator points at.
    async fn delete(&self, locator: &BlobLocator) -> Result<(), TransferError>;
}

/// [`BlobTransfer`] over a public/private pair of object stores
#[derive(Debug, Clone)]
pub struct ObjectStoreTransfer {
    public: Arc<dyn ObjectStore>,
    private: Arc<dyn ObjectStore>,
}

impl ObjectStoreTransfer {
    /// Creates a transfer over explicit stores.
    #[must_use]
    pub fn new(public: Arc<dyn ObjectStore>, private: Arc<dyn ObjectStore>) -> Self {
        Self { public, private }
    }

    /// Creates a transfer addressing both configured containers of the
    /// storage account.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Config` if either client cannot be built from
    /// the configured account, key, and container names.
    pub fn for_azure(config: &AzureStorageConfig) -> StorageResult<Self> {
        let build = |container: &str| {
            MicrosoftAzureBuilder::new()
                .with_account(&config.account)
                .with_access_key(&config.account_key)
                .with_container_name(container)
                .build()
                .map_err(|e| StorageError::Config(e.to_string()))
        };
        Ok(Self {
            public: Arc::new(build(&config.container_name)?),
            private: Arc::new(build(&config.private_container_name)?),
        })
    }

    fn store(&self, container: ContainerKind) -> &Arc<dyn ObjectStore> {
        match container {
            ContainerKind::Public => &self.public,
            ContainerKind::Private => &self.private,
        }
    }
}

#[async_trait]
impl BlobTransfer for ObjectStoreTransfer {
    async fn upload(
        &self,
        locator: &BlobLocator,
        content_type: &str,
        data: Bytes,
        limits: &TransferLimits,
    ) -> Result<(), TransferError> {
        let store = self.store(locator.container);
        let path = Path::from(locator.key());

        let mut attributes = Attributes::new();
        attributes.insert(Attribute::ContentType, content_type.to_string().into());
        let opts = PutMultipartOpts {
            attributes,
            ..Default::default()
        };

        let transfer = async {
            let upload = store.put_multipart_opts(&path, opts).await?;
            let mut writer = WriteMultipart::new_with_chunk_size(upload, limits.block_size);
            for block in data.chunks(limits.block_size) {
                writer.wait_for_capacity(limits.concurrency).await?;
                writer.write(block);
            }
            writer.finish().await?;
            Ok::<(), object_store::Error>(())
        };
        timeout(limits.deadline, transfer)
            .await
            .map_err(|_| TransferError::Timeout(limits.deadline))??;

        debug!(blob = %path, size = data.len(), "uploaded blob");
        Ok(())
    }

    async fn download_range(
        &self,
        locator: &BlobLocator,
        offset: u64,
        length: u64,
    ) -> Result<Bytes, TransferError> {
        let store = self.store(locator.container);
        let path = Path::from(locator.key());

        let data = timeout(TRANSFER_DEADLINE, store.get_range(&path, offset..offset + length))
            .await
            .map_err(|_| TransferError::Timeout(TRANSFER_DEADLINE))??;

        debug!(blob = %path, size = data.len(), "downloaded blob range");
        Ok(data)
    }

    async fn delete(&self, locator: &BlobLocator) -> Result<(), TransferError> {
        let path = Path::from(locator.key());
        self.store(locator.container).delete(&path).await?;

        debug!(blob = %path, "deleted blob");
        Ok(())
    }
}
