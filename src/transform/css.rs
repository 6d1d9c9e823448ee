// src/transform/css.rs

//! Vendor prefixing and minification for stylesheets, via lightningcss.

use std::path::Path;

use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};
use parcel_sourcemap::SourceMap;

use super::{AssetFile, Transform, TransformFuture, run_blocking};
use crate::errors::{Result, SitepipeError};

const NAME: &str = "css";

/// Browserslist query used when none is configured.
pub const DEFAULT_QUERIES: [&str; 1] = ["defaults"];

/// Adds the vendor prefixes the target browsers need, then minifies.
#[derive(Debug, Clone)]
pub struct CssOptimizer {
    browsers: Option<Browsers>,
}

impl CssOptimizer {
    /// Resolve browserslist queries once, at configuration time.
    pub fn from_queries(queries: Option<&[String]>) -> Result<Self> {
        let resolved = match queries {
            Some(list) => Browsers::from_browserslist(list.iter().map(String::as_str)),
            None => Browsers::from_browserslist(DEFAULT_QUERIES),
        };
        let browsers = resolved.map_err(|e| {
            SitepipeError::ConfigError(format!("css transform: invalid browser targets: {e}"))
        })?;
        Ok(Self { browsers })
    }

    fn targets(&self) -> Targets {
        self.browsers.clone().map(Targets::from).unwrap_or_default()
    }
}

/// Prefix and minify `source`. `filename` only appears in error messages.
pub fn optimize_css(source: &str, filename: &str, targets: Targets) -> std::result::Result<String, String> {
    print_css(source, filename, targets, None)
}

/// Like [`optimize_css`], also returning a JSON source map whose `sources`
/// are relative to `map_dir`.
///
/// An inline `sourceMappingURL` data URL in `source` (as `lessc` emits) is
/// folded in, so the map points at the original stylesheets.
pub fn optimize_css_with_map(
    source: &str,
    filename: &str,
    targets: Targets,
    map_dir: &Path,
) -> std::result::Result<(String, String), String> {
    let mut map = SourceMap::new(&map_dir.to_string_lossy());
    let index = map.add_source(filename);
    map.set_source_content(index as usize, source)
        .map_err(|e| format!("source map: {e}"))?;

    let code = print_css(source, filename, targets, Some(&mut map))?;
    let json = map.to_json(None).map_err(|e| format!("source map: {e}"))?;
    Ok((code, json))
}

fn print_css(
    source: &str,
    filename: &str,
    targets: Targets,
    source_map: Option<&mut SourceMap>,
) -> std::result::Result<String, String> {
    let mut stylesheet = StyleSheet::parse(
        source,
        ParserOptions {
            filename: filename.to_string(),
            ..ParserOptions::default()
        },
    )
    .map_err(|e| e.to_string())?;

    stylesheet
        .minify(MinifyOptions {
            targets: targets.clone(),
            ..MinifyOptions::default()
        })
        .map_err(|e| e.to_string())?;

    let printed = stylesheet
        .to_css(PrinterOptions {
            minify: true,
            targets,
            source_map,
            ..PrinterOptions::default()
        })
        .map_err(|e| e.to_string())?;

    Ok(printed.code)
}

impl Transform for CssOptimizer {
    fn name(&self) -> &'static str {
        NAME
    }

    fn apply(&self, file: AssetFile) -> TransformFuture<'_> {
        let targets = self.targets();
        Box::pin(async move {
            let source = file.source.clone();
            run_blocking(NAME, &source, move || {
                let filename = file.source.display().to_string();
                let text = file.text(NAME)?;
                match file.map_dir() {
                    Some(map_dir) => {
                        let (code, map) = optimize_css_with_map(text, &filename, targets, &map_dir)
                            .map_err(|e| SitepipeError::transform(NAME, &file.source, e))?;
                        let mut out = file.with_contents(code);
                        out.source_map = Some(map);
                        Ok(vec![out])
                    }
                    None => {
                        let code = optimize_css(text, &filename, targets)
                            .map_err(|e| SitepipeError::transform(NAME, &file.source, e))?;
                        Ok(vec![file.with_contents(code)])
                    }
                }
            })
            .await
        })
    }
}
