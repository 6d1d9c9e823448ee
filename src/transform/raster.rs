// src/transform/raster.rs

//! Lossy/lossless recompression of JPEG and PNG images.

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{DynamicImage, ImageFormat};

use super::{AssetFile, Transform, TransformFuture, run_blocking};
use crate::errors::{Result, SitepipeError};

const NAME: &str = "raster";

pub const DEFAULT_JPEG_QUALITY: u8 = 75;

/// Re-encodes JPEGs at a fixed quality and PNGs at maximum compression.
/// The output keeps the input's format and name.
#[derive(Debug, Clone, Copy)]
pub struct RasterOptimizer {
    quality: u8,
}

impl RasterOptimizer {
    pub fn new(quality: Option<u8>) -> Self {
        Self {
            quality: quality.unwrap_or(DEFAULT_JPEG_QUALITY),
        }
    }
}

pub fn recompress(bytes: &[u8], quality: u8) -> std::result::Result<Vec<u8>, String> {
    let format = image::guess_format(bytes).map_err(|e| e.to_string())?;
    let img = image::load_from_memory_with_format(bytes, format).map_err(|e| e.to_string())?;

    let mut out = Vec::new();
    match format {
        ImageFormat::Jpeg => {
            // JPEG has no alpha channel.
            let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
            rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut out, quality))
                .map_err(|e| e.to_string())?;
        }
        ImageFormat::Png => {
            img.write_with_encoder(PngEncoder::new_with_quality(
                &mut out,
                CompressionType::Best,
                FilterType::Adaptive,
            ))
            .map_err(|e| e.to_string())?;
        }
        other => return Err(format!("unsupported image format {other:?}")),
    }
    Ok(out)
}

impl Transform for RasterOptimizer {
    fn name(&self) -> &'static str {
        NAME
    }

    fn apply(&self, file: AssetFile) -> TransformFuture<'_> {
        let quality = self.quality;
        Box::pin(async move {
            let source = file.source.clone();
            run_blocking(NAME, &source, move || -> Result<Vec<AssetFile>> {
                let encoded = recompress(&file.contents, quality)
                    .map_err(|e| SitepipeError::transform(NAME, &file.source, e))?;
                Ok(vec![file.with_contents(encoded)])
            })
            .await
        })
    }
}
