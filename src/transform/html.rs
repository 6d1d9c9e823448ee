// src/transform/html.rs

use super::{AssetFile, Transform, TransformFuture, run_blocking};

const NAME: &str = "html";

/// Collapses whitespace in markup. Comments, inline CSS and inline JS are
/// left alone, and optional tags are kept.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlMinifier;

pub fn minify_markup(source: &[u8]) -> Vec<u8> {
    let mut cfg = minify_html::Cfg::new();
    cfg.keep_closing_tags = true;
    cfg.keep_html_and_head_opening_tags = true;
    cfg.keep_comments = true;
    cfg.minify_css = false;
    cfg.minify_js = false;
    minify_html::minify(source, &cfg)
}

impl Transform for HtmlMinifier {
    fn name(&self) -> &'static str {
        NAME
    }

    fn apply(&self, file: AssetFile) -> TransformFuture<'_> {
        Box::pin(async move {
            let source = file.source.clone();
            run_blocking(NAME, &source, move || {
                let minified = minify_markup(&file.contents);
                Ok(vec![file.with_contents(minified)])
            })
            .await
        })
    }
}
