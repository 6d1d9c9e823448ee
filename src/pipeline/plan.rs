// src/pipeline/plan.rs

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::{CompositionSpec, ConfigFile};
use crate::errors::{Result, SitepipeError};
use crate::pipeline::compose::Composition;
use crate::pipeline::task::Task;

/// All tasks of a config, built once, plus the named pipelines that refer to
/// them.
#[derive(Debug)]
pub struct Plan {
    tasks: BTreeMap<String, Arc<Task>>,
    pipelines: BTreeMap<String, CompositionSpec>,
}

impl Plan {
    /// Build every task. Fails if a transform cannot be constructed from its
    /// options.
    pub fn from_config(cfg: &ConfigFile) -> Result<Self> {
        let tasks = cfg
            .tasks()
            .iter()
            .map(|(name, task)| Ok((name.clone(), Arc::new(Task::from_config(name, task)?))))
            .collect::<Result<BTreeMap<_, _>>>()?;

        Ok(Self {
            tasks,
            pipelines: cfg.pipelines().clone(),
        })
    }

    pub fn task_names(&self) -> impl Iterator<Item = &str> {
        self.tasks.keys().map(String::as_str)
    }

    pub fn pipeline_names(&self) -> impl Iterator<Item = &str> {
        self.pipelines.keys().map(String::as_str)
    }

    /// Resolve a task or pipeline name into a runnable composition.
    pub fn resolve(&self, name: &str) -> Result<Composition> {
        self.resolve_name(name, &mut Vec::new())
    }

    /// Resolve a binding's run list: the names run in sequence.
    pub fn resolve_sequence(&self, names: &[String]) -> Result<Composition> {
        let items = names
            .iter()
            .map(|n| self.resolve(n))
            .collect::<Result<Vec<_>>>()?;
        Ok(Composition::Series(items))
    }

    fn resolve_name(&self, name: &str, stack: &mut Vec<String>) -> Result<Composition> {
        if let Some(task) = self.tasks.get(name) {
            return Ok(Composition::Job(task.clone()));
        }

        let spec = self
            .pipelines
            .get(name)
            .ok_or_else(|| SitepipeError::TaskNotFound(name.to_string()))?;

        if stack.iter().any(|n| n == name) {
            stack.push(name.to_string());
            return Err(SitepipeError::PipelineCycle(stack.join(" -> ")));
        }

        stack.push(name.to_string());
        let resolved = self.resolve_spec(spec, stack);
        stack.pop();
        resolved
    }

    fn resolve_spec(&self, spec: &CompositionSpec, stack: &mut Vec<String>) -> Result<Composition> {
        match spec {
            CompositionSpec::Ref(name) => self.resolve_name(name, stack),
            CompositionSpec::Series { series } => Ok(Composition::Series(
                series
                    .iter()
                    .map(|s| self.resolve_spec(s, stack))
                    .collect::<Result<Vec<_>>>()?,
            )),
            CompositionSpec::Parallel { parallel } => Ok(Composition::Parallel(
                parallel
                    .iter()
                    .map(|s| self.resolve_spec(s, stack))
                    .collect::<Result<Vec<_>>>()?,
            )),
        }
    }
}
