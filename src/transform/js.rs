// src/transform/js.rs

//! Script minification with oxc.

use oxc::allocator::Allocator;
use oxc::codegen::{Codegen, CodegenOptions, CommentOptions};
use oxc::mangler::MangleOptions;
use oxc::minifier::{CompressOptions, Minifier, MinifierOptions};
use oxc::parser::Parser;
use oxc::span::SourceType;

use super::{AssetFile, Transform, TransformFuture, run_blocking};
use crate::errors::SitepipeError;

const NAME: &str = "js";

/// Compresses and mangles classic (non-module) browser scripts.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsMinifier;

/// Minify `source`; on parse errors returns the first diagnostic.
pub fn minify_script(source: &str) -> Result<String, String> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, source, SourceType::cjs()).parse();
    if let Some(err) = ret.errors.first() {
        return Err(err.to_string());
    }
    let mut program = ret.program;
    let options = MinifierOptions {
        mangle: Some(MangleOptions::default()),
        compress: Some(CompressOptions::smallest()),
    };
    let ret = Minifier::new(options).minify(&allocator, &mut program);
    let code = Codegen::new()
        .with_options(CodegenOptions {
            minify: true,
            comments: CommentOptions::disabled(),
            ..CodegenOptions::default()
        })
        .with_scoping(ret.scoping)
        .build(&program)
        .code;
    Ok(code)
}

impl Transform for JsMinifier {
    fn name(&self) -> &'static str {
        NAME
    }

    fn apply(&self, file: AssetFile) -> TransformFuture<'_> {
        Box::pin(async move {
            let source = file.source.clone();
            run_blocking(NAME, &source, move || {
                let code = minify_script(file.text(NAME)?)
                    .map_err(|e| SitepipeError::transform(NAME, &file.source, e))?;
                Ok(vec![file.with_contents(code)])
            })
            .await
        })
    }
}
