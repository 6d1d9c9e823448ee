// src/pipeline/stage.rs

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::config::StageConfig;
use crate::errors::{IoResultExt, Result};
use crate::pipeline::context::BuildContext;
use crate::select::FileSelector;
use crate::transform::{AssetFile, Transform, build_transform};

/// One `select -> transform* -> write` step of a task.
pub struct PipelineStage {
    selector: FileSelector,
    base: Option<PathBuf>,
    transforms: Vec<Arc<dyn Transform>>,
    rename: Option<String>,
    dest: PathBuf,
    sourcemaps: bool,
}

impl fmt::Debug for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<_> = self.transforms.iter().map(|t| t.name()).collect();
        f.debug_struct("PipelineStage")
            .field("transforms", &names)
            .field("dest", &self.dest)
            .finish_non_exhaustive()
    }
}

impl PipelineStage {
    pub fn from_config(cfg: &StageConfig) -> Result<Self> {
        let transforms = cfg
            .transforms
            .iter()
            .map(|spec| build_transform(&spec.options()))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            selector: FileSelector::new(&cfg.src)?,
            base: cfg.base.clone(),
            transforms,
            rename: cfg.rename.clone(),
            dest: cfg.dest.clone(),
            sourcemaps: cfg.sourcemaps,
        })
    }

    /// Run the stage and return the absolute paths it wrote.
    ///
    /// Every output is on disk before this returns; on error some outputs
    /// may already be written.
    pub async fn run(&self, ctx: &BuildContext) -> Result<Vec<PathBuf>> {
        let selected = self.selector.select(ctx.fs.as_ref(), &ctx.paths.source)?;
        if selected.is_empty() {
            debug!(stage = ?self, "no files selected");
            return Ok(Vec::new());
        }

        let dest_root = ctx.paths.build.join(&self.dest);
        let mut files = Vec::with_capacity(selected.len());
        for sel in selected.iter() {
            let abs = ctx.paths.source.join(&sel.rel_path);
            let contents = tokio::fs::read(&abs).await.at_path(&abs)?;
            let mut file = AssetFile::new(sel.relative_to_base(self.base.as_deref()), abs, contents);
            if self.sourcemaps {
                file.map_root = Some(dest_root.clone());
            }
            files.push(file);
        }

        for transform in self.transforms.iter() {
            files = transform.apply_all(files).await?;
        }

        let mut written = Vec::with_capacity(files.len());
        for mut file in files {
            if let Some(name) = &self.rename {
                file.path.set_file_name(name);
            }
            let out = dest_root.join(&file.path);
            if let Some(parent) = out.parent() {
                tokio::fs::create_dir_all(parent).await.at_path(parent)?;
            }
            if let Some(map) = file.source_map.take() {
                let map_path = map_path_for(&out);
                link_source_map(&mut file.contents, &map_path);
                tokio::fs::write(&map_path, map).await.at_path(&map_path)?;
                debug!(map = ?map_path, "wrote source map");
                written.push(map_path);
            }
            tokio::fs::write(&out, &file.contents).await.at_path(&out)?;
            debug!(from = ?file.source, to = ?out, "wrote output");
            written.push(out);
        }

        Ok(written)
    }
}

/// `style.min.css` -> `style.min.css.map`, in the same directory.
fn map_path_for(out: &Path) -> PathBuf {
    let mut name = out.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".map");
    out.with_file_name(name)
}

/// Append the comment that points a browser at the map file.
fn link_source_map(contents: &mut Vec<u8>, map_path: &Path) {
    let name = map_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    contents.extend_from_slice(format!("\n/*# sourceMappingURL={name} */\n").as_bytes());
}
