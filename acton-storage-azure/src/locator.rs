//! Blob addressing: the locator/URL round trip
//!
//! A [`BlobLocator`] is the (container, sub-path, blob name) tuple needed to
//! address a blob inside the storage account. [`BlobAddressing`] maps
//! locators to the URLs the host hands out and back again. The mapping must
//! be a lossless bijection: every URL produced by an upload is later parsed
//! by delete/download to recover the exact blob it named, across container
//! choice, optional sub-path, and optional CDN host rewriting.
//!
//! Everything in this module is pure string construction over immutable
//! configuration; no I/O and no shared mutable state.

use crate::config::AzureStorageConfig;
use crate::types::{FileRecord, StorageError, StorageResult, THUMBNAIL_PREFIX};

/// Which of the two configured containers owns a blob
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    /// The publicly served container
    Public,
    /// The container for files flagged private
    Private,
}

/// Address of one blob inside the storage account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobLocator {
    /// Owning container
    pub container: ContainerKind,

    /// Logical sub-path under the container, if any
    pub sub_path: Option<String>,

    /// Blob name, `hash + ext` for primary files
    pub blob_name: String,
}

impl BlobLocator {
    /// Returns the object key under the container: `[sub_path/]blob_name`.
    #[must_use]
    pub fn key(&self) -> String {
        match &self.sub_path {
            Some(sub_path) => format!("{sub_path}/{}", self.blob_name),
            None => self.blob_name.clone(),
        }
    }

    /// Returns the locator of the paired thumbnail blob: same container and
    /// sub-path, blob name prefixed with `thumb-`.
    #[must_use]
    pub fn thumbnail(&self) -> Self {
        Self {
            container: self.container,
            sub_path: self.sub_path.clone(),
            blob_name: format!("{THUMBNAIL_PREFIX}{}", self.blob_name),
        }
    }
}

/// Maps blob locators to externally visible URLs and back.
///
/// Holds the service root, both container names, and the optional CDN host
/// and default sub-path. All values are fixed at construction; producing or
/// resolving a URL never mutates shared state.
///
/// # Examples
///
/// ```rust
/// use acton_storage_azure::{AzureStorageConfig, BlobAddressing, FileRecord};
///
/// let config = AzureStorageConfig {
///     account: "myaccount".to_string(),
///     container_name: "files".to_string(),
///     private_container_name: "files-private".to_string(),
///     ..AzureStorageConfig::default()
/// };
/// let addressing = BlobAddressing::from_config(&config);
///
/// let file = FileRecord::new("abc123", ".png", "image/png", vec![]);
/// let locator = addressing.locator_for(&file);
/// let url = addressing.url_for(&locator);
///
/// assert_eq!(url, "https://myaccount.blob.core.windows.net/files/abc123.png");
/// assert_eq!(addressing.resolve(&url, file.container()).unwrap(), locator);
/// ```
#[derive(Debug, Clone)]
pub struct BlobAddressing {
    service_root: String,
    public_container: String,
    private_container: String,
    cdn_host: Option<String>,
    default_path: Option<String>,
}

impl BlobAddressing {
    /// Builds the addressing scheme from provider configuration.
    ///
    /// The service root is derived from the account name. Empty `cdn_name`
    /// and `default_path` strings are treated as unset.
    #[must_use]
    pub fn from_config(config: &AzureStorageConfig) -> Self {
        Self {
            service_root: format!("https://{}.blob.core.windows.net", config.account),
            public_container: config.container_name.clone(),
            private_container: config.private_container_name.clone(),
            cdn_host: config.cdn_name.clone().filter(|s| !s.is_empty()),
            default_path: config.default_path.clone().filter(|s| !s.is_empty()),
        }
    }

    fn container_base(&self, container: ContainerKind) -> String {
        let name = match container {
            ContainerKind::Public => &self.public_container,
            ContainerKind::Private => &self.private_container,
        };
        format!("{}/{name}", self.service_root)
    }

    /// Builds the locator for a record: container from the privacy flag,
    /// sub-path from the record's `path` falling back to the configured
    /// default, blob name `hash + ext`.
    #[must_use]
    pub fn locator_for(&self, file: &FileRecord) -> BlobLocator {
        let sub_path = file
            .path
            .clone()
            .filter(|p| !p.is_empty())
            .or_else(|| self.default_path.clone());
        BlobLocator {
            container: file.container(),
            sub_path,
            blob_name: file.blob_name(),
        }
    }

    /// Produces the externally visible URL for a locator.
    ///
    /// The URL is `container_base [+ "/" + sub_path] + "/" + blob_name`.
    /// With a CDN host configured, the service root (the URL's prefix, which
    /// occurs exactly once) is replaced by the CDN host. Characters that
    /// would need percent-escaping in the sub-path are passed through
    /// unescaped.
    #[must_use]
    pub fn url_for(&self, locator: &BlobLocator) -> String {
        let url = format!("{}/{}", self.container_base(locator.container), locator.key());
        match &self.cdn_host {
            Some(cdn_host) => url.replacen(&self.service_root, cdn_host, 1),
            None => url,
        }
    }

    /// Recovers the locator from a previously produced URL.
    ///
    /// Steps, in order: undo the CDN rewrite (no-op when unset or absent),
    /// strip the selected container's base URL, split the remainder on `/`
    /// discarding empty segments; the last segment is the blob name and the
    /// rest rejoin into the sub-path.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::LocatorMismatch`] when the URL does not start
    /// with the expected container base on a path boundary after the CDN
    /// rewrite is undone, or when no blob name remains. The usual cause is
    /// an `is_private` flag that differs from the one used at upload.
    pub fn resolve(&self, url: &str, container: ContainerKind) -> StorageResult<BlobLocator> {
        let canonical = match &self.cdn_host {
            Some(cdn_host) => url.replacen(cdn_host.as_str(), &self.service_root, 1),
            None => url.to_string(),
        };

        let base = self.container_base(container);
        // The base must match up to a path boundary; a bare prefix match
        // would let `files` claim URLs that live under `files-private`.
        let remainder = match canonical.strip_prefix(&base) {
            Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
            _ => {
                return Err(StorageError::LocatorMismatch {
                    url: url.to_string(),
                    expected: base,
                });
            }
        };

        let mut segments: Vec<&str> = remainder.split('/').filter(|s| !s.is_empty()).collect();
        let Some(blob_name) = segments.pop() else {
            return Err(StorageError::LocatorMismatch {
                url: url.to_string(),
                expected: base,
            });
        };

        let sub_path = if segments.is_empty() {
            None
        } else {
            Some(segments.join("/"))
        };

        Ok(BlobLocator {
            container,
            sub_path,
            blob_name: blob_name.to_string(),
        })
    }
}
