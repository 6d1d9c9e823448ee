// src/transform/webp.rs

use image::DynamicImage;
use image::codecs::webp::WebPEncoder as LosslessWebp;

use super::{AssetFile, Transform, TransformFuture, run_blocking};
use crate::errors::SitepipeError;

const NAME: &str = "webp";

/// Emits a lossless `.webp` sibling for every raster input.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebpEncoder;

pub fn encode_webp(bytes: &[u8]) -> Result<Vec<u8>, String> {
    let img = image::load_from_memory(bytes).map_err(|e| e.to_string())?;
    let rgba = DynamicImage::ImageRgba8(img.to_rgba8());

    let mut out = Vec::new();
    rgba.write_with_encoder(LosslessWebp::new_lossless(&mut out))
        .map_err(|e| e.to_string())?;
    Ok(out)
}

impl Transform for WebpEncoder {
    fn name(&self) -> &'static str {
        NAME
    }

    fn apply(&self, file: AssetFile) -> TransformFuture<'_> {
        Box::pin(async move {
            let source = file.source.clone();
            run_blocking(NAME, &source, move || {
                let encoded = encode_webp(&file.contents)
                    .map_err(|e| SitepipeError::transform(NAME, &file.source, e))?;
                Ok(vec![file.with_contents(encoded).with_extension("webp")])
            })
            .await
        })
    }
}
