#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::PathBuf;

use sitepipe::config::{
    BindingConfig, CompositionSpec, ConfigFile, PathsSection, RawConfigFile, ServerSection,
    StageConfig, TaskConfig, TransformKind, TransformOptions, TransformSpec, WatchSection,
};
use sitepipe::types::{TaskKind, TriggerWhileRunningBehaviour};

/// Builder for `ConfigFile` to simplify test setup.
///
/// Starts with trivial `build` and `dev` pipelines (both running `clean`)
/// and a `clean` task, so a bare `ConfigFileBuilder::new().build()` is
/// valid.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        let mut task = BTreeMap::new();
        task.insert("clean".to_string(), TaskConfigBuilder::clean().build());

        let mut pipeline = BTreeMap::new();
        pipeline.insert("build".to_string(), name("clean"));
        pipeline.insert("dev".to_string(), name("clean"));

        Self {
            config: RawConfigFile {
                paths: PathsSection::default(),
                server: ServerSection::default(),
                watch: WatchSection::default(),
                task,
                pipeline,
                binding: Vec::new(),
            },
        }
    }

    pub fn with_task(mut self, name: &str, task: TaskConfig) -> Self {
        self.config.task.insert(name.to_string(), task);
        self
    }

    pub fn without_task(mut self, name: &str) -> Self {
        self.config.task.remove(name);
        self
    }

    pub fn with_pipeline(mut self, name: &str, spec: CompositionSpec) -> Self {
        self.config.pipeline.insert(name.to_string(), spec);
        self
    }

    pub fn without_pipeline(mut self, name: &str) -> Self {
        self.config.pipeline.remove(name);
        self
    }

    pub fn with_binding(mut self, pattern: &str, run: &[&str]) -> Self {
        self.config.binding.push(BindingConfig {
            pattern: pattern.to_string(),
            exclude: Vec::new(),
            run: run.iter().map(|s| s.to_string()).collect(),
        });
        self
    }

    pub fn with_binding_exclude(mut self, pattern: &str, exclude: &[&str], run: &[&str]) -> Self {
        self.config.binding.push(BindingConfig {
            pattern: pattern.to_string(),
            exclude: exclude.iter().map(|s| s.to_string()).collect(),
            run: run.iter().map(|s| s.to_string()).collect(),
        });
        self
    }

    pub fn with_behaviour(mut self, behaviour: TriggerWhileRunningBehaviour) -> Self {
        self.config.watch.triggered_while_running_behaviour = behaviour;
        self
    }

    pub fn with_use_hash(mut self, val: bool) -> Self {
        self.config.watch.use_hash = val;
        self
    }

    /// The unvalidated config, for tests that expect validation to fail.
    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `TaskConfig`.
pub struct TaskConfigBuilder {
    task: TaskConfig,
}

impl TaskConfigBuilder {
    pub fn stages() -> Self {
        Self::of_kind(TaskKind::Stage)
    }

    pub fn clean() -> Self {
        Self::of_kind(TaskKind::Clean)
    }

    pub fn reload() -> Self {
        Self::of_kind(TaskKind::Reload)
    }

    fn of_kind(kind: TaskKind) -> Self {
        Self {
            task: TaskConfig {
                kind,
                stage: Vec::new(),
                stream: false,
            },
        }
    }

    pub fn stage(mut self, stage: StageConfig) -> Self {
        self.task.stage.push(stage);
        self
    }

    pub fn stream(mut self, val: bool) -> Self {
        self.task.stream = val;
        self
    }

    pub fn build(self) -> TaskConfig {
        self.task
    }
}

/// Builder for one `[[task.<name>.stage]]` table.
pub struct StageConfigBuilder {
    stage: StageConfig,
}

impl StageConfigBuilder {
    pub fn new(src: &[&str]) -> Self {
        Self {
            stage: StageConfig {
                src: src.iter().map(|s| s.to_string()).collect(),
                base: None,
                transforms: Vec::new(),
                rename: None,
                dest: PathBuf::new(),
                sourcemaps: false,
            },
        }
    }

    pub fn transform(mut self, kind: TransformKind) -> Self {
        self.stage.transforms.push(TransformSpec::Bare(kind));
        self
    }

    pub fn transform_with(mut self, options: TransformOptions) -> Self {
        self.stage.transforms.push(TransformSpec::Configured(options));
        self
    }

    pub fn base(mut self, base: &str) -> Self {
        self.stage.base = Some(PathBuf::from(base));
        self
    }

    pub fn rename(mut self, name: &str) -> Self {
        self.stage.rename = Some(name.to_string());
        self
    }

    pub fn dest(mut self, dest: &str) -> Self {
        self.stage.dest = PathBuf::from(dest);
        self
    }

    pub fn sourcemaps(mut self) -> Self {
        self.stage.sourcemaps = true;
        self
    }

    pub fn build(self) -> StageConfig {
        self.stage
    }
}

/// Reference a task or pipeline by name.
pub fn name(n: &str) -> CompositionSpec {
    CompositionSpec::Ref(n.to_string())
}

pub fn series(items: Vec<CompositionSpec>) -> CompositionSpec {
    CompositionSpec::Series { series: items }
}

pub fn parallel(items: Vec<CompositionSpec>) -> CompositionSpec {
    CompositionSpec::Parallel { parallel: items }
}
