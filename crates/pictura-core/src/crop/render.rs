use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbaImage};

use crate::error::Result;

use super::geometry::PixelRect;

/// Final crop, encoded as JPEG.
#[derive(Clone, Debug)]
pub struct CroppedImage {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl CroppedImage {
    pub const EXTENSION: &'static str = "jpg";

    /// Suggested download name, e.g. `cropped-image-1700000000000.jpg`.
    pub fn download_name(timestamp_ms: i64) -> String {
        format!("cropped-image-{timestamp_ms}.{}", Self::EXTENSION)
    }
}

/// Copy `window` out of `source` and scale it to `out_width` x `out_height`.
pub fn render_window(
    source: &DynamicImage,
    window: PixelRect,
    out_width: u32,
    out_height: u32,
) -> RgbaImage {
    let cut = source
        .crop_imm(window.x, window.y, window.width, window.height)
        .to_rgba8();
    if cut.dimensions() == (out_width, out_height) {
        cut
    } else {
        imageops::resize(&cut, out_width, out_height, FilterType::Triangle)
    }
}

/// Encode an RGBA surface as baseline JPEG. Alpha is dropped.
pub fn encode_jpeg(surface: &RgbaImage, quality: u8) -> Result<Vec<u8>> {
    let rgb = DynamicImage::ImageRgba8(surface.clone()).to_rgb8();
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, quality.clamp(1, 100)).encode_image(&rgb)?;
    Ok(bytes)
}
