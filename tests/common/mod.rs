#![allow(dead_code)]

pub use sitepipe_test_utils::builders;
pub use sitepipe_test_utils::fake_executor::FakeExecutor;
pub use sitepipe_test_utils::fixture::SiteFixture;
pub use sitepipe_test_utils::{init_tracing, with_timeout};

use image::{DynamicImage, ImageFormat, RgbImage};

/// A small gradient, encoded as `format`.
pub fn sample_image(format: ImageFormat) -> Vec<u8> {
    let img = RgbImage::from_fn(16, 16, |x, y| image::Rgb([(x * 16) as u8, (y * 16) as u8, 128]));
    let mut out = std::io::Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut out, format)
        .expect("encode sample image");
    out.into_inner()
}

pub const SAMPLE_SVG: &str = r##"<?xml version="1.0" encoding="UTF-8"?>
<!-- exported -->
<svg xmlns="http://www.w3.org/2000/svg" width="24" height="24" viewBox="0 0 24 24">
  <rect x="2" y="2" width="20" height="20" fill="#ff0000"/>
</svg>
"##;
