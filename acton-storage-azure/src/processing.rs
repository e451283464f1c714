//! Thumbnail derivation for uploaded images
//!
//! Only raster formats in a fixed set are eligible: PNG, JPEG, and BMP.
//! Everything else (GIF, WebP, PDFs, ...) passes through upload untouched.
//! An eligible file is decoded, resized to the configured width keeping its
//! aspect ratio, and re-encoded in its original format; the result is a new
//! [`FileRecord`] whose hash carries the `thumb-` prefix and which is
//! uploaded to the same container and sub-path as the original.

use std::io::Cursor;

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::{imageops::FilterType, DynamicImage, ImageFormat, ImageReader};

use crate::types::{FileRecord, StorageResult, THUMBNAIL_PREFIX};

/// JPEG re-encode quality for derived thumbnails
const THUMBNAIL_QUALITY: u8 = 80;

/// The exact set of MIME types eligible for thumbnailing
const THUMBNAILABLE_TYPES: [mime::Mime; 3] = [mime::IMAGE_PNG, mime::IMAGE_JPEG, mime::IMAGE_BMP];

/// Derives thumbnail records from uploaded images.
///
/// # Examples
///
/// ```rust
/// use acton_storage_azure::ImageProcessor;
///
/// assert!(ImageProcessor::is_thumbnailable("image/png"));
/// assert!(!ImageProcessor::is_thumbnailable("image/gif"));
/// ```
#[derive(Debug, Clone)]
pub struct ImageProcessor {
    /// Thumbnail target width in pixels
    max_width: u32,

    /// Filter for resizing operations
    filter: FilterType,
}

impl ImageProcessor {
    /// Creates a processor targeting the given thumbnail width.
    ///
    /// Uses `FilterType::Lanczos3` for high-quality resizing.
    #[must_use]
    pub const fn new(max_width: u32) -> Self {
        Self {
            max_width,
            filter: FilterType::Lanczos3,
        }
    }

    /// Whether a MIME type belongs to the fixed thumbnail-eligible set.
    #[must_use]
    pub fn is_thumbnailable(mime_type: &str) -> bool {
        THUMBNAILABLE_TYPES.iter().any(|m| m.as_ref() == mime_type)
    }

    /// Derives the thumbnail record for an uploaded file.
    ///
    /// Returns `Ok(None)` when the file's MIME type is not eligible. For an
    /// eligible file, the derived record is a copy of the original with the
    /// hash prefixed by `thumb-`, the re-encoded buffer and its byte length,
    /// and no URL (the subsequent upload pass sets it). The thumbnail keeps
    /// the original's MIME type, container flag, and sub-path.
    ///
    /// # Errors
    ///
    /// Returns an error if decoding or re-encoding fails even though the
    /// declared MIME type is in the eligible set; the caller must fail the
    /// whole upload in that case.
    pub fn derive(&self, file: &FileRecord) -> StorageResult<Option<FileRecord>> {
        if !Self::is_thumbnailable(&file.mime) {
            return Ok(None);
        }
        let Some(format) = ImageFormat::from_mime_type(&file.mime) else {
            return Ok(None);
        };

        let image = Self::load_image(&file.buffer)?;
        let resized = image.resize(self.max_width, u32::MAX, self.filter);
        let data = Self::encode_image(&resized, format)?;

        let mut thumbnail = file.clone();
        thumbnail.hash = format!("{THUMBNAIL_PREFIX}{}", file.hash);
        thumbnail.url = None;
        thumbnail.size = data.len() as u64;
        thumbnail.buffer = Bytes::from(data);
        Ok(Some(thumbnail))
    }

    /// Decodes an image from a raw buffer
    fn load_image(buffer: &[u8]) -> StorageResult<DynamicImage> {
        let reader = ImageReader::new(Cursor::new(buffer)).with_guessed_format()?;
        Ok(reader.decode()?)
    }

    /// Encodes an image to bytes in the given format
    fn encode_image(image: &DynamicImage, format: ImageFormat) -> StorageResult<Vec<u8>> {
        let mut data = Vec::new();
        let mut cursor = Cursor::new(&mut data);
        if format == ImageFormat::Jpeg {
            image.write_with_encoder(JpegEncoder::new_with_quality(&mut cursor, THUMBNAIL_QUALITY))?;
        } else {
            image.write_to(&mut cursor, format)?;
        }
        Ok(data)
    }
}
