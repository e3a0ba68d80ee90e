//! Thumbnail generation
//!
//! Decodes an uploaded image, scales it down to fit a square bound while keeping the
//! aspect ratio, and re-encodes it in the source format. Images already inside the
//! bound are re-encoded at their original size, never upscaled.
//!
//! Decoding and resizing run on the blocking pool via `spawn_blocking`.

use std::io::Cursor;

use bytes::Bytes;
use image::{
    imageops::FilterType, DynamicImage, GenericImageView, ImageError, ImageFormat, ImageReader,
};
use thiserror::Error;
use tracing::debug;

/// Default bound for both thumbnail dimensions, in pixels
pub const DEFAULT_MAX_DIMENSION: u32 = 200;

/// Output format when the source format cannot be identified
const DEFAULT_FORMAT: ImageFormat = ImageFormat::Jpeg;

/// Why no thumbnail was produced
#[derive(Debug, Error)]
pub enum ThumbnailError {
    /// The bytes are not an image in a supported format
    #[error("Failed to decode image: {0}")]
    Decode(#[source] ImageError),

    /// The resized image could not be written back out
    #[error("Failed to encode {format:?} thumbnail: {source}")]
    Encode {
        /// Target format
        format: ImageFormat,
        /// Encoder error
        #[source]
        source: ImageError,
    },

    /// The blocking worker panicked or was cancelled
    #[error("Thumbnail task failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

/// An encoded thumbnail ready to be stored
#[derive(Debug, Clone)]
pub struct Thumbnail {
    /// Encoded image bytes
    pub data: Vec<u8>,
    /// Encoding format, same as the source when known
    pub format: ImageFormat,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl Thumbnail {
    /// MIME type matching the encoding format, e.g. `image/png`
    #[must_use]
    pub fn content_type(&self) -> String {
        self.format.to_mime_type().to_ascii_lowercase()
    }
}

/// Produces bounded-size thumbnails
#[derive(Debug, Clone, Copy)]
pub struct ThumbnailGenerator {
    max_dimension: u32,
}

impl Default for ThumbnailGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DIMENSION)
    }
}

impl ThumbnailGenerator {
    /// Creates a generator bounding both dimensions to `max_dimension` pixels
    #[must_use]
    pub const fn new(max_dimension: u32) -> Self {
        Self { max_dimension }
    }

    /// Maximum width and height of generated thumbnails
    #[must_use]
    pub const fn max_dimension(&self) -> u32 {
        self.max_dimension
    }

    /// Generates a thumbnail on the blocking thread pool
    ///
    /// # Errors
    ///
    /// See [`ThumbnailGenerator::generate`]. Also returns `ThumbnailError::Worker` if
    /// the blocking task does not complete.
    pub async fn generate_async(&self, data: Bytes) -> Result<Thumbnail, ThumbnailError> {
        let generator = *self;
        tokio::task::spawn_blocking(move || generator.generate(&data)).await?
    }

    /// Generates a thumbnail (blocking)
    ///
    /// # Errors
    ///
    /// Returns `ThumbnailError::Decode` if the bytes are not a supported image
    /// Returns `ThumbnailError::Encode` if the thumbnail cannot be re-encoded
    pub fn generate(&self, data: &[u8]) -> Result<Thumbnail, ThumbnailError> {
        let reader = ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(|e| ThumbnailError::Decode(ImageError::IoError(e)))?;
        let format = reader.format().unwrap_or(DEFAULT_FORMAT);
        let image = reader.decode().map_err(ThumbnailError::Decode)?;

        let (orig_w, orig_h) = image.dimensions();
        debug!(
            original_width = orig_w,
            original_height = orig_h,
            ?format,
            "Processing image for thumbnail"
        );

        let image = if orig_w > self.max_dimension || orig_h > self.max_dimension {
            image.resize(self.max_dimension, self.max_dimension, FilterType::Lanczos3)
        } else {
            image
        };
        let image = prepare_for_format(image, format);

        let mut buf = Cursor::new(Vec::new());
        image
            .write_to(&mut buf, format)
            .map_err(|source| ThumbnailError::Encode { format, source })?;

        let (width, height) = image.dimensions();
        Ok(Thumbnail {
            data: buf.into_inner(),
            format,
            width,
            height,
        })
    }
}

/// Drops the alpha channel for encoders that cannot store one
fn prepare_for_format(image: DynamicImage, format: ImageFormat) -> DynamicImage {
    if format == ImageFormat::Jpeg && image.color().has_alpha() {
        DynamicImage::ImageRgb8(image.to_rgb8())
    } else {
        image
    }
}
