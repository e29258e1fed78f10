use std::io::Cursor;
use std::sync::Arc;

use async_trait::async_trait;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{DynamicImage, ImageFormat};
use thiserror::Error;
use tracing::debug;

use crate::config::{CompressConfig, CompressMode};
use crate::consts::CROP_JPEG_QUALITY;

/// Failure reported by a compressor. The message is shown to the user as is.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct CompressError {
    pub message: String,
}

impl CompressError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<image::ImageError> for CompressError {
    fn from(e: image::ImageError) -> Self {
        Self::new(e.to_string())
    }
}

/// Single-attempt compress call, treated as opaque by the coordinator.
#[async_trait]
pub trait Compressor: Send + Sync {
    async fn compress(&self, source: Arc<[u8]>) -> Result<Vec<u8>, CompressError>;
}

/// Compressor that re-encodes locally with the `image` codecs.
///
/// Smart mode writes JPEG at the configured quality for opaque images and
/// maximum-effort PNG for images with alpha. Original mode keeps the source
/// format: PNG is recompressed losslessly, JPEG is rewritten at crop quality,
/// anything else is passed through. Output that is not smaller than the input
/// is discarded in favour of the input.
#[derive(Clone, Debug)]
pub struct ReencodeCompressor {
    mode: CompressMode,
    quality: u8,
}

impl ReencodeCompressor {
    pub fn new(mode: CompressMode, quality: u8) -> Self {
        Self {
            mode,
            quality: quality.clamp(1, 100),
        }
    }

    pub fn from_config(config: &CompressConfig) -> Self {
        Self::new(config.mode, config.quality)
    }

    /// Blocking re-encode of `source`.
    pub fn reencode(&self, source: &[u8]) -> Result<Vec<u8>, CompressError> {
        let format = image::guess_format(source)?;
        let img = image::load_from_memory_with_format(source, format)?;

        let encoded = match (self.mode, format) {
            (CompressMode::Smart, _) if img.color().has_alpha() => encode_png(&img)?,
            (CompressMode::Smart, _) => encode_jpeg(&img, self.quality)?,
            (CompressMode::Original, ImageFormat::Png) => encode_png(&img)?,
            (CompressMode::Original, ImageFormat::Jpeg) => encode_jpeg(&img, CROP_JPEG_QUALITY)?,
            (CompressMode::Original, _) => return Ok(source.to_vec()),
        };

        debug!(
            mode = %self.mode,
            ?format,
            before = source.len(),
            after = encoded.len(),
            "Re-encoded image"
        );

        if encoded.len() < source.len() {
            Ok(encoded)
        } else {
            Ok(source.to_vec())
        }
    }
}

#[async_trait]
impl Compressor for ReencodeCompressor {
    async fn compress(&self, source: Arc<[u8]>) -> Result<Vec<u8>, CompressError> {
        let this = self.clone();
        tokio::task::spawn_blocking(move || this.reencode(&source))
            .await
            .map_err(|e| CompressError::new(format!("Compression task failed: {e}")))?
    }
}

fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, CompressError> {
    let mut buf = Cursor::new(Vec::new());
    let encoder =
        PngEncoder::new_with_quality(&mut buf, CompressionType::Best, FilterType::Adaptive);
    img.write_with_encoder(encoder)?;
    Ok(buf.into_inner())
}

fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, CompressError> {
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
    let mut buf = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buf, quality);
    rgb.write_with_encoder(encoder)?;
    Ok(buf)
}
