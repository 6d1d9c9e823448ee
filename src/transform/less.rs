// src/transform/less.rs

//! LESS compilation through the external `lessc` tool.

use std::process::Stdio;

use tokio::process::Command;
use tracing::debug;

use super::{AssetFile, Transform, TransformFuture};
use crate::errors::SitepipeError;

const NAME: &str = "less";
const DEFAULT_COMMAND: &str = "lessc";

/// Runs `lessc <file>` and takes the compiled CSS from stdout.
///
/// The source path is passed (not piped) so `@import`s resolve relative to
/// the stylesheet. When the stage wants source maps, `lessc` inlines its map
/// as a data URL for the `css` transform to fold into the final one.
#[derive(Debug, Clone)]
pub struct LessCompiler {
    command: String,
}

impl LessCompiler {
    pub fn new(command: Option<String>) -> Self {
        Self {
            command: command.unwrap_or_else(|| DEFAULT_COMMAND.to_string()),
        }
    }
}

impl Transform for LessCompiler {
    fn name(&self) -> &'static str {
        NAME
    }

    fn apply(&self, file: AssetFile) -> TransformFuture<'_> {
        Box::pin(async move {
            debug!(command = %self.command, file = %file.source.display(), "running less compiler");

            let mut command = Command::new(&self.command);
            if file.map_root.is_some() {
                command.args(["--source-map-map-inline", "--source-map-include-source"]);
            }
            let output = command
                .arg(&file.source)
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true)
                .output()
                .await
                .map_err(|e| {
                    SitepipeError::transform(
                        NAME,
                        &file.source,
                        format!("could not run `{}`: {e}", self.command),
                    )
                })?;

            if !output.status.success() {
                let stderr = String::from_utf8_lossy(&output.stderr);
                return Err(SitepipeError::transform(
                    NAME,
                    &file.source,
                    format!(
                        "`{}` exited with {}: {}",
                        self.command,
                        output.status.code().unwrap_or(-1),
                        stderr.trim()
                    ),
                ));
            }

            Ok(vec![file.with_contents(output.stdout).with_extension("css")])
        })
    }
}
