//! End-to-end provider flows against in-memory object stores

use std::io::Cursor;
use std::sync::Arc;

use acton_storage_azure::{
    AzureFileStorage, AzureStorageConfig, ContainerKind, FileRecord, ObjectStoreTransfer,
    StorageError,
};
use bytes::Bytes;
use image::{DynamicImage, ImageBuffer, ImageFormat, ImageReader, Rgb};
use object_store::memory::InMemory;
use object_store::path::Path;
use object_store::ObjectStore;

struct Harness {
    storage: AzureFileStorage,
    public: Arc<InMemory>,
    private: Arc<InMemory>,
}

fn harness(config: AzureStorageConfig) -> Harness {
    let public = Arc::new(InMemory::new());
    let private = Arc::new(InMemory::new());
    let transfer = ObjectStoreTransfer::new(public.clone(), private.clone());
    Harness {
        storage: AzureFileStorage::with_transfer(&config, Arc::new(transfer)),
        public,
        private,
    }
}

fn config() -> AzureStorageConfig {
    AzureStorageConfig {
        account: "testaccount".to_string(),
        account_key: "key==".to_string(),
        container_name: "files".to_string(),
        private_container_name: "files-private".to_string(),
        default_path: Some("uploads".to_string()),
        ..AzureStorageConfig::default()
    }
}

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img: ImageBuffer<Rgb<u8>, Vec<u8>> =
        ImageBuffer::from_fn(width, height, |_, _| Rgb([30, 60, 90]));
    let mut buffer = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .unwrap();
    buffer
}

async fn stored_bytes(store: &InMemory, key: &str) -> Bytes {
    store
        .get(&Path::from(key))
        .await
        .unwrap()
        .bytes()
        .await
        .unwrap()
}

#[tokio::test]
async fn image_upload_stores_primary_and_thumbnail() {
    let h = harness(config());
    let original = png_bytes(100, 50);
    let mut file = FileRecord::new("abc123", ".png", "image/png", original.clone());

    h.storage.upload(&mut file).await.unwrap();

    assert_eq!(
        file.url.as_deref(),
        Some("https://testaccount.blob.core.windows.net/files/uploads/abc123.png")
    );

    let primary = stored_bytes(&h.public, "uploads/abc123.png").await;
    assert_eq!(primary, Bytes::from(original));

    // The stored thumbnail is a real, smaller PNG
    let thumbnail = stored_bytes(&h.public, "uploads/thumb-abc123.png").await;
    let decoded = ImageReader::new(Cursor::new(thumbnail.as_ref()))
        .with_guessed_format()
        .unwrap()
        .decode()
        .unwrap();
    assert_eq!(decoded.width(), 48);
    assert_eq!(decoded.height(), 24);
}

#[tokio::test]
async fn non_image_upload_stores_exactly_one_blob() {
    let h = harness(config());
    let mut file = FileRecord::new("report", ".pdf", "application/pdf", b"%PDF-1.4".to_vec());

    h.storage.upload(&mut file).await.unwrap();

    assert_eq!(
        stored_bytes(&h.public, "uploads/report.pdf").await,
        Bytes::from_static(b"%PDF-1.4")
    );
    assert!(h
        .public
        .get(&Path::from("uploads/thumb-report.pdf"))
        .await
        .is_err());
}

#[tokio::test]
async fn download_round_trips_the_original_buffer() {
    let h = harness(config());
    let mut file = FileRecord::new("report", ".pdf", "application/pdf", b"%PDF-1.4".to_vec());

    h.storage.upload(&mut file).await.unwrap();
    let data = h.storage.download(&file).await.unwrap();

    assert_eq!(data, file.buffer);
}

#[tokio::test]
async fn delete_removes_primary_and_thumbnail() {
    let h = harness(config());
    let mut file = FileRecord::new("abc123", ".png", "image/png", png_bytes(64, 64));

    h.storage.upload(&mut file).await.unwrap();
    assert!(h.public.get(&Path::from("uploads/abc123.png")).await.is_ok());
    assert!(h
        .public
        .get(&Path::from("uploads/thumb-abc123.png"))
        .await
        .is_ok());

    h.storage.delete(&file).await.unwrap();
    assert!(h.public.get(&Path::from("uploads/abc123.png")).await.is_err());
    assert!(h
        .public
        .get(&Path::from("uploads/thumb-abc123.png"))
        .await
        .is_err());
}

#[tokio::test]
async fn private_records_use_the_private_container() {
    let h = harness(config());
    let mut file = FileRecord::new("secret", ".pdf", "application/pdf", b"classified".to_vec());
    file.is_private = true;

    h.storage.upload(&mut file).await.unwrap();

    assert_eq!(
        file.url.as_deref(),
        Some("https://testaccount.blob.core.windows.net/files-private/uploads/secret.pdf")
    );
    assert!(h.private.get(&Path::from("uploads/secret.pdf")).await.is_ok());
    assert!(h.public.get(&Path::from("uploads/secret.pdf")).await.is_err());

    // Round trip through the private container works end to end
    assert_eq!(
        h.storage.download(&file).await.unwrap(),
        Bytes::from_static(b"classified")
    );
    h.storage.delete(&file).await.unwrap();
    assert!(h.private.get(&Path::from("uploads/secret.pdf")).await.is_err());
}

#[tokio::test]
async fn cdn_urls_resolve_back_to_the_same_blob() {
    let mut cfg = config();
    cfg.cdn_name = Some("https://cdn.example.com".to_string());
    let h = harness(cfg);

    let mut file = FileRecord::new("abc123", ".png", "image/png", png_bytes(32, 32));
    h.storage.upload(&mut file).await.unwrap();

    assert_eq!(
        file.url.as_deref(),
        Some("https://cdn.example.com/files/uploads/abc123.png")
    );

    // The CDN-rewritten URL still resolves for download and delete
    assert_eq!(
        h.storage.download(&file).await.unwrap().len() as u64,
        file.size
    );
    h.storage.delete(&file).await.unwrap();
    assert!(h.public.get(&Path::from("uploads/abc123.png")).await.is_err());
    assert!(h
        .public
        .get(&Path::from("uploads/thumb-abc123.png"))
        .await
        .is_err());
}

#[tokio::test]
async fn record_path_overrides_default_path() {
    let h = harness(config());
    let mut file = FileRecord::new("avatar", ".png", "image/png", png_bytes(16, 16));
    file.path = Some("avatars/2026".to_string());

    h.storage.upload(&mut file).await.unwrap();

    assert_eq!(
        file.url.as_deref(),
        Some("https://testaccount.blob.core.windows.net/files/avatars/2026/avatar.png")
    );
    assert!(h
        .public
        .get(&Path::from("avatars/2026/thumb-avatar.png"))
        .await
        .is_ok());
}

#[tokio::test]
async fn flipping_the_privacy_flag_breaks_resolution() {
    let h = harness(config());
    let mut file = FileRecord::new("abc123", ".png", "image/png", png_bytes(16, 16));

    h.storage.upload(&mut file).await.unwrap();
    file.is_private = true;

    let err = h.storage.delete(&file).await.unwrap_err();
    assert!(matches!(err, StorageError::LocatorMismatch { .. }));

    // Nothing was deleted by the failed call
    assert!(h.public.get(&Path::from("uploads/abc123.png")).await.is_ok());
}

#[tokio::test]
async fn flipping_private_to_public_breaks_resolution_despite_name_collision() {
    // `files` is a string prefix of `files-private`, so resolving a private
    // URL against the public container must still miss: the base only
    // matches on a path boundary.
    let h = harness(config());
    let mut file = FileRecord::new("secret", ".png", "image/png", png_bytes(16, 16));
    file.is_private = true;

    h.storage.upload(&mut file).await.unwrap();
    assert_eq!(
        file.url.as_deref(),
        Some("https://testaccount.blob.core.windows.net/files-private/uploads/secret.png")
    );
    file.is_private = false;

    let err = h.storage.delete(&file).await.unwrap_err();
    assert!(matches!(err, StorageError::LocatorMismatch { .. }));

    // The private blobs are untouched by the failed call
    assert!(h.private.get(&Path::from("uploads/secret.png")).await.is_ok());
    assert!(h
        .private
        .get(&Path::from("uploads/thumb-secret.png"))
        .await
        .is_ok());
}

#[tokio::test]
async fn container_kind_matches_record_flag() {
    let mut file = FileRecord::new("x", ".bin", "application/octet-stream", Vec::new());
    assert_eq!(file.container(), ContainerKind::Public);
    file.is_private = true;
    assert_eq!(file.container(), ContainerKind::Private);
}
