// src/transform/svg.rs

//! SVG clean-up through usvg.
//!
//! usvg folds the input `viewBox` into the root transform and writes only
//! `width`/`height`, so the view box is put back as `0 0 width height`.
//! It also spells out the initial `fill="#000000"` on every shape; those are
//! dropped again so icons inherit `fill`/`currentColor` from a `<use>`.

use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};

use super::{AssetFile, Transform, TransformFuture, run_blocking};
use crate::errors::SitepipeError;

const NAME: &str = "svg";
const INITIAL_FILL: &[u8] = b"#000000";

/// Parses an SVG with usvg and writes back the normalised, unindented tree.
#[derive(Debug, Clone, Copy, Default)]
pub struct SvgOptimizer;

pub fn optimize_svg(content: &[u8]) -> Result<String, String> {
    // usvg is built without its text stack and would drop text silently.
    if has_text(content)? {
        return Err("<text> elements are not supported; convert text to paths".to_string());
    }

    let options = usvg::Options::default();
    let tree = usvg::Tree::from_data(content, &options).map_err(|e| e.to_string())?;

    let write_options = usvg::WriteOptions {
        indent: usvg::Indent::None,
        ..Default::default()
    };
    let size = tree.size();
    restore_view_box(&tree.to_string(&write_options), size.width(), size.height())
}

fn has_text(content: &[u8]) -> Result<bool, String> {
    let mut reader = Reader::from_reader(content);
    loop {
        match reader.read_event().map_err(|e| e.to_string())? {
            Event::Eof => return Ok(false),
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"text" => {
                return Ok(true);
            }
            _ => {}
        }
    }
}

/// Add `viewBox="0 0 w h"` to the root and drop initial-value fills.
fn restore_view_box(svg: &str, width: f32, height: f32) -> Result<String, String> {
    let mut reader = Reader::from_str(svg);
    let mut writer = Writer::new(Vec::new());
    let mut root_done = false;

    loop {
        let event = reader.read_event().map_err(|e| e.to_string())?;
        let event = match event {
            Event::Eof => break,
            Event::Start(e) => Event::Start(rewrite_element(&e, &mut root_done, width, height)),
            Event::Empty(e) => Event::Empty(rewrite_element(&e, &mut root_done, width, height)),
            other => other,
        };
        writer.write_event(event).map_err(|e| e.to_string())?;
    }

    String::from_utf8(writer.into_inner()).map_err(|e| e.to_string())
}

fn rewrite_element(
    start: &BytesStart<'_>,
    root_done: &mut bool,
    width: f32,
    height: f32,
) -> BytesStart<'static> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let is_root = !*root_done;
    *root_done = true;

    let mut out = BytesStart::new(name);
    for attr in start.attributes().flatten() {
        let key = attr.key.as_ref();
        if key == b"fill" && attr.value.as_ref() == INITIAL_FILL {
            continue;
        }
        if is_root && key == b"viewBox" {
            continue;
        }
        out.push_attribute(attr);
    }
    if is_root {
        out.push_attribute(("viewBox", format!("0 0 {width} {height}").as_str()));
    }
    out
}

impl Transform for SvgOptimizer {
    fn name(&self) -> &'static str {
        NAME
    }

    fn apply(&self, file: AssetFile) -> TransformFuture<'_> {
        Box::pin(async move {
            let source = file.source.clone();
            run_blocking(NAME, &source, move || {
                let optimized = optimize_svg(&file.contents)
                    .map_err(|e| SitepipeError::transform(NAME, &file.source, e))?;
                Ok(vec![file.with_contents(optimized)])
            })
            .await
        })
    }
}
