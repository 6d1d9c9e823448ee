// src/transform/sprite.rs

//! SVG sprite bundling: every input document becomes a `<symbol>` inside a
//! single inline `<svg>`.

use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};

use super::{AssetFile, Transform, TransformFuture, run_blocking};
use crate::errors::SitepipeError;

const NAME: &str = "sprite";
const SVG_NS: &str = "http://www.w3.org/2000/svg";

/// Bundles all files of a stage into one `sprite.svg` (rename to taste).
///
/// Symbol ids are the input file stems and must be unique within a stage.
/// Each input's `viewBox` is carried over, or derived from its `width` and
/// `height`. The output has no XML declaration so it can be inlined into HTML.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpriteBundler;

/// A source document prepared for bundling.
struct Symbol {
    id: String,
    view_box: Option<String>,
    inner: Vec<u8>,
}

type XmlWriter = Writer<Vec<u8>>;

/// Bundle `(id, svg)` pairs into one sprite document.
pub fn bundle_symbols<'a>(
    inputs: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> Result<String, String> {
    let mut symbols: Vec<Symbol> = Vec::new();
    for (id, svg) in inputs {
        if symbols.iter().any(|s| s.id == id) {
            return Err(format!("{id}: duplicate symbol id; rename one of the files"));
        }
        symbols.push(extract_symbol(id, svg).map_err(|e| format!("{id}: {e}"))?);
    }

    let mut writer = Writer::new(Vec::new());
    let mut root = BytesStart::new("svg");
    root.push_attribute(("xmlns", SVG_NS));
    write(&mut writer, Event::Start(root))?;

    for symbol in symbols {
        let mut start = BytesStart::new("symbol");
        start.push_attribute(("id", symbol.id.as_str()));
        if let Some(view_box) = symbol.view_box.as_deref() {
            start.push_attribute(("viewBox", view_box));
        }
        write(&mut writer, Event::Start(start))?;
        writer.get_mut().extend_from_slice(&symbol.inner);
        write(&mut writer, Event::End(BytesEnd::new("symbol")))?;
    }

    write(&mut writer, Event::End(BytesEnd::new("svg")))?;
    String::from_utf8(writer.into_inner()).map_err(|e| e.to_string())
}

fn write(writer: &mut XmlWriter, event: Event<'_>) -> Result<(), String> {
    writer.write_event(event).map_err(|e| e.to_string())
}

/// Pull the root `viewBox` and the serialised children of the root `<svg>`.
fn extract_symbol(id: &str, svg: &str) -> Result<Symbol, String> {
    let mut reader = Reader::from_str(svg);
    reader.config_mut().trim_text(true);

    let mut inner = Writer::new(Vec::new());
    let mut view_box = None;
    let mut depth = 0usize;
    let mut seen_root = false;

    loop {
        let event = reader.read_event().map_err(|e| e.to_string())?;
        match event {
            Event::Eof => break,
            Event::Start(ref e) if depth == 0 => {
                if e.local_name().as_ref() != b"svg" {
                    return Err("root element is not <svg>".to_string());
                }
                view_box = root_view_box(e);
                seen_root = true;
                depth = 1;
            }
            Event::Empty(ref e) if depth == 0 => {
                if e.local_name().as_ref() != b"svg" {
                    return Err("root element is not <svg>".to_string());
                }
                view_box = root_view_box(e);
                seen_root = true;
            }
            Event::End(_) if depth == 1 => depth = 0,
            // Prolog, doctype and comments outside the root are dropped.
            _ if depth == 0 => {}
            Event::Start(e) => {
                depth += 1;
                write(&mut inner, Event::Start(e))?;
            }
            Event::End(e) => {
                depth -= 1;
                write(&mut inner, Event::End(e))?;
            }
            Event::Comment(_) => {}
            other => write(&mut inner, other)?,
        }
    }

    if !seen_root {
        return Err("no <svg> element found".to_string());
    }

    Ok(Symbol {
        id: id.to_string(),
        view_box,
        inner: inner.into_inner(),
    })
}

/// The root's `viewBox`, else `0 0 width height` when both are plain
/// numbers (an optional `px` suffix is accepted).
fn root_view_box(start: &BytesStart<'_>) -> Option<String> {
    let attr = |name: &[u8]| {
        start
            .attributes()
            .flatten()
            .find(|a| a.key.as_ref() == name)
            .map(|a| String::from_utf8_lossy(&a.value).into_owned())
    };
    if let Some(view_box) = attr(b"viewBox") {
        return Some(view_box);
    }
    let width = length(&attr(b"width")?)?;
    let height = length(&attr(b"height")?)?;
    Some(format!("0 0 {width} {height}"))
}

fn length(value: &str) -> Option<f32> {
    value.trim().trim_end_matches("px").parse().ok()
}

impl Transform for SpriteBundler {
    fn name(&self) -> &'static str {
        NAME
    }

    fn apply(&self, file: AssetFile) -> TransformFuture<'_> {
        self.apply_all(vec![file])
    }

    fn apply_all(&self, files: Vec<AssetFile>) -> TransformFuture<'_> {
        Box::pin(async move {
            let Some(first) = files.first() else {
                return Ok(Vec::new());
            };
            // The bundle lands next to the first input; a stage `rename`
            // gives it its final name.
            let out_path = first.path.with_file_name("sprite.svg");
            let source = first.source.clone();
            let error_path = source.clone();

            run_blocking(NAME, &error_path, move || {
                let mut inputs = Vec::with_capacity(files.len());
                for file in files.iter() {
                    let id = file
                        .path
                        .file_stem()
                        .and_then(|s| s.to_str())
                        .unwrap_or("symbol")
                        .to_string();
                    inputs.push((id, file.text(NAME)?));
                }
                let bundled = bundle_symbols(inputs.iter().map(|(id, svg)| (id.as_str(), *svg)))
                    .map_err(|e| SitepipeError::transform(NAME, &source, e))?;
                Ok(vec![AssetFile::new(out_path, source, bundled.into_bytes())])
            })
            .await
        })
    }
}
