// src/config/validate.rs

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::config::model::{ConfigFile, RawConfigFile, TaskConfig, TransformKind};
use crate::errors::{Result, SitepipeError};
use crate::select::FileSelector;
use crate::types::TaskKind;
use crate::watch::patterns::WatchBinding;

/// Pipelines every configuration must define: one per CLI entry command.
pub const REQUIRED_PIPELINES: [&str; 2] = ["build", "dev"];

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = SitepipeError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_tasks(cfg)?;
    validate_names(cfg)?;
    validate_tasks(cfg)?;
    validate_references(cfg)?;
    validate_pipeline_graph(cfg)?;
    validate_bindings(cfg)?;
    Ok(())
}

fn ensure_has_tasks(cfg: &RawConfigFile) -> Result<()> {
    if cfg.task.is_empty() {
        return Err(SitepipeError::ConfigError(
            "config must contain at least one [task.<name>] section".to_string(),
        ));
    }
    for required in REQUIRED_PIPELINES {
        if !cfg.pipeline.contains_key(required) {
            return Err(SitepipeError::ConfigError(format!(
                "[pipeline] must define `{required}`"
            )));
        }
    }
    Ok(())
}

fn validate_names(cfg: &RawConfigFile) -> Result<()> {
    for name in cfg.pipeline.keys() {
        if cfg.task.contains_key(name) {
            return Err(SitepipeError::ConfigError(format!(
                "`{name}` is defined both as a task and as a pipeline"
            )));
        }
    }
    Ok(())
}

fn validate_tasks(cfg: &RawConfigFile) -> Result<()> {
    for (name, task) in cfg.task.iter() {
        validate_task(name, task)?;
    }
    Ok(())
}

fn validate_task(name: &str, task: &TaskConfig) -> Result<()> {
    match task.kind {
        TaskKind::Stage if task.stage.is_empty() => {
            return Err(SitepipeError::ConfigError(format!(
                "task '{name}' has no [[task.{name}.stage]] entries"
            )));
        }
        TaskKind::Clean | TaskKind::Reload if !task.stage.is_empty() => {
            return Err(SitepipeError::ConfigError(format!(
                "task '{name}' is a {:?} task and cannot declare stages",
                task.kind
            )));
        }
        _ => {}
    }

    for stage in task.stage.iter() {
        // Compiling the selector is the syntax check; it is rebuilt when
        // the pipeline is planned.
        FileSelector::new(&stage.src).map_err(|e| {
            SitepipeError::ConfigError(format!("task '{name}': {e}"))
        })?;

        if let Some(rename) = &stage.rename {
            if rename.is_empty() || rename.contains('/') || rename.contains('\\') {
                return Err(SitepipeError::ConfigError(format!(
                    "task '{name}': rename must be a bare file name (got {rename:?})"
                )));
            }
        }

        if stage.dest.is_absolute() || stage.base.as_ref().is_some_and(|b| b.is_absolute()) {
            return Err(SitepipeError::ConfigError(format!(
                "task '{name}': `dest` and `base` must be relative paths"
            )));
        }

        for spec in stage.transforms.iter() {
            let opts = spec.options();
            if let Some(q) = opts.quality {
                if !(1..=100).contains(&q) {
                    return Err(SitepipeError::ConfigError(format!(
                        "task '{name}': transform `{}` quality must be 1..=100 (got {q})",
                        opts.kind.as_str()
                    )));
                }
            }
            if opts.command.is_some() && opts.kind != TransformKind::Less {
                return Err(SitepipeError::ConfigError(format!(
                    "task '{name}': only the `less` transform accepts `command`"
                )));
            }
        }
    }
    Ok(())
}

fn validate_references(cfg: &RawConfigFile) -> Result<()> {
    let known = |n: &str| cfg.task.contains_key(n) || cfg.pipeline.contains_key(n);

    for (name, spec) in cfg.pipeline.iter() {
        for reference in spec.references() {
            if !known(reference) {
                return Err(SitepipeError::TaskNotFound(format!(
                    "'{reference}' (referenced by pipeline '{name}')"
                )));
            }
        }
    }

    for binding in cfg.binding.iter() {
        if binding.run.is_empty() {
            return Err(SitepipeError::ConfigError(format!(
                "binding '{}' has an empty `run` list",
                binding.pattern
            )));
        }
        for reference in binding.run.iter() {
            if !known(reference) {
                return Err(SitepipeError::TaskNotFound(format!(
                    "'{reference}' (referenced by binding '{}')",
                    binding.pattern
                )));
            }
        }
    }
    Ok(())
}

fn validate_pipeline_graph(cfg: &RawConfigFile) -> Result<()> {
    // Edge direction: referenced pipeline -> referencing pipeline.
    // Tasks are leaves and cannot close a cycle, so only pipelines are nodes.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for name in cfg.pipeline.keys() {
        graph.add_node(name.as_str());
    }

    for (name, spec) in cfg.pipeline.iter() {
        for reference in spec.references() {
            if cfg.pipeline.contains_key(reference) {
                graph.add_edge(reference, name.as_str(), ());
            }
        }
    }

    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => Err(SitepipeError::PipelineCycle(format!(
            "cycle detected in [pipeline] involving '{}'",
            cycle.node_id()
        ))),
    }
}

fn validate_bindings(cfg: &RawConfigFile) -> Result<()> {
    for binding in cfg.binding.iter() {
        WatchBinding::compile(&binding.pattern, &binding.exclude).map_err(|e| {
            SitepipeError::ConfigError(format!("binding '{}': {e}", binding.pattern))
        })?;
    }
    Ok(())
}
