// src/transform/mod.rs

//! File-content transforms.
//!
//! Every compiler, minifier and encoder sits behind the single [`Transform`]
//! trait, so the pipeline never knows which library does the work.
//!
//! - [`less`] shells out to `lessc`.
//! - [`css`] autoprefixes and minifies with lightningcss.
//! - [`html`] collapses markup whitespace with minify-html.
//! - [`js`] minifies and mangles with oxc.
//! - [`raster`] and [`webp`] re-encode bitmaps with `image`.
//! - [`svg`] re-serialises SVG through usvg.
//! - [`sprite`] bundles many SVGs into one `<symbol>` sprite.

pub mod css;
pub mod html;
pub mod js;
pub mod less;
pub mod raster;
pub mod sprite;
pub mod svg;
pub mod webp;

use std::fmt::Debug;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;

use crate::config::{TransformKind, TransformOptions};
use crate::errors::{Result, SitepipeError};

/// A file travelling through a stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetFile {
    /// Output path, relative to the stage's destination.
    pub path: PathBuf,
    /// Absolute path of the source file this was derived from.
    pub source: PathBuf,
    pub contents: Vec<u8>,
    /// Stage destination directory, set when the stage wants source maps.
    /// Map sources are written relative to the output's directory below it.
    pub map_root: Option<PathBuf>,
    /// Source map (JSON) describing `contents`, if a transform produced one.
    pub source_map: Option<String>,
}

impl AssetFile {
    pub fn new(path: impl Into<PathBuf>, source: impl Into<PathBuf>, contents: Vec<u8>) -> Self {
        Self {
            path: path.into(),
            source: source.into(),
            contents,
            map_root: None,
            source_map: None,
        }
    }

    /// Same file with new contents. Any earlier source map no longer
    /// describes them and is dropped.
    pub fn with_contents(self, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            contents: contents.into(),
            source_map: None,
            ..self
        }
    }

    /// Directory the output (and its map) will be written to, when maps are
    /// wanted.
    pub fn map_dir(&self) -> Option<PathBuf> {
        let root = self.map_root.as_ref()?;
        let out = root.join(&self.path);
        Some(out.parent().map(Path::to_path_buf).unwrap_or_else(|| root.clone()))
    }

    pub fn with_extension(mut self, ext: &str) -> Self {
        self.path.set_extension(ext);
        self
    }

    pub fn extension(&self) -> Option<&str> {
        self.path.extension().and_then(|e| e.to_str())
    }

    /// Contents as UTF-8 text, or a transform error naming `transform`.
    pub fn text(&self, transform: &str) -> Result<&str> {
        std::str::from_utf8(&self.contents)
            .map_err(|e| SitepipeError::transform(transform, &self.source, e))
    }
}

pub type TransformFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Vec<AssetFile>>> + Send + 'a>>;

/// One external conversion step: bytes in, zero or more files out.
pub trait Transform: Send + Sync + Debug {
    fn name(&self) -> &'static str;

    /// Transform a single file.
    fn apply(&self, file: AssetFile) -> TransformFuture<'_>;

    /// Transform the whole stream of a stage, in order.
    ///
    /// Per-file transforms keep the default; transforms that merge their
    /// input (sprites) override it.
    fn apply_all(&self, files: Vec<AssetFile>) -> TransformFuture<'_> {
        Box::pin(async move {
            let mut out = Vec::with_capacity(files.len());
            for file in files {
                out.extend(self.apply(file).await?);
            }
            Ok(out)
        })
    }
}

/// Build the transform described by `opts`.
///
/// Fails with a configuration error when the options cannot be honoured
/// (e.g. an unknown browserslist query).
pub fn build_transform(opts: &TransformOptions) -> Result<Arc<dyn Transform>> {
    let transform: Arc<dyn Transform> = match opts.kind {
        TransformKind::Less => Arc::new(less::LessCompiler::new(opts.command.clone())),
        TransformKind::Css => Arc::new(css::CssOptimizer::from_queries(opts.targets.as_deref())?),
        TransformKind::Html => Arc::new(html::HtmlMinifier),
        TransformKind::Js => Arc::new(js::JsMinifier),
        TransformKind::Raster => Arc::new(raster::RasterOptimizer::new(opts.quality)),
        TransformKind::Webp => Arc::new(webp::WebpEncoder),
        TransformKind::Svg => Arc::new(svg::SvgOptimizer),
        TransformKind::Sprite => Arc::new(sprite::SpriteBundler),
    };
    Ok(transform)
}

/// Run CPU-bound encoder work off the async scheduler.
pub(crate) async fn run_blocking<F>(transform: &'static str, path: &Path, f: F) -> Result<Vec<AssetFile>>
where
    F: FnOnce() -> Result<Vec<AssetFile>> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| SitepipeError::transform(transform, path, format!("worker failed: {e}")))?
}
