//! acton-storage-azure: Azure Blob Storage upload provider
//!
//! Stores a content-management host's uploaded files in Azure Blob Storage
//! instead of local disk. Given a file buffer and its metadata the provider
//! places the blob in the right container and sub-path, derives and stores a
//! thumbnail for raster images, and produces a public (or CDN-rewritten)
//! URL. Later deletes and downloads reverse that URL back into the exact
//! blob locator it was produced from.
//!
//! The interesting part is that round trip: URL production and URL
//! resolution form a lossless bijection across container choice
//! (public/private), optional sub-path, and optional CDN rewriting. A URL
//! that cannot be resolved against the expected container fails fast with a
//! locator-mismatch error instead of silently addressing the wrong blob.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use acton_storage_azure::{AzureFileStorage, AzureStorageConfig, FileRecord};
//!
//! # async fn example() -> anyhow::Result<()> {
//! // azure-storage.toml merged with AZURE_STORAGE_* environment variables
//! let config = AzureStorageConfig::load()?;
//! let storage = AzureFileStorage::new(&config)?;
//!
//! let mut file = FileRecord::new("abc123", ".png", "image/png", vec![/* ... */]);
//! storage.upload(&mut file).await?;
//! println!("served at {}", file.url.as_deref().unwrap_or_default());
//! # Ok(())
//! # }
//! ```
//!
//! # Behavior Notes
//!
//! - Thumbnails are derived only for the fixed set PNG/JPEG/BMP, named
//!   `thumb-{hash}{ext}`, and stored beside the original. Upload and delete
//!   handle the pair strictly sequentially; download only ever touches the
//!   primary blob.
//! - Transfers run with a 4 MiB block size, a configurable concurrency
//!   bound, and a 60-minute deadline. Retries are the storage client's
//!   responsibility, not the provider's.
//! - A failed thumbnail pass surfaces as an error even though the primary
//!   blob is already committed; there is no rollback.

pub mod config;
pub mod locator;
pub mod processing;
pub mod provider;
pub mod transfer;
pub mod types;

pub use config::AzureStorageConfig;
pub use locator::{BlobAddressing, BlobLocator, ContainerKind};
pub use processing::ImageProcessor;
pub use provider::AzureFileStorage;
pub use transfer::{BlobTransfer, ObjectStoreTransfer, TransferError, TransferLimits};
pub use types::{FileRecord, Phase, StorageError, StorageResult};
