// src/config/model.rs

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;

use crate::types::{TaskKind, TriggerWhileRunningBehaviour};

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [paths]
/// source = "source"
/// build = "build"
///
/// [task.scripts]
/// [[task.scripts.stage]]
/// src = ["js/*.js"]
/// transforms = ["js"]
/// dest = "js"
///
/// [pipeline]
/// build = { series = ["clean", { parallel = ["scripts"] }] }
///
/// [[binding]]
/// pattern = "js/*.js"
/// run = ["scripts"]
/// ```
///
/// This is the unvalidated form straight out of `serde`; use
/// [`ConfigFile`] (via `TryFrom`) everywhere else.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub paths: PathsSection,

    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub watch: WatchSection,

    /// All tasks from `[task.<name>]`, keyed by task name.
    #[serde(default)]
    pub task: BTreeMap<String, TaskConfig>,

    /// Named compositions from `[pipeline]`.
    #[serde(default)]
    pub pipeline: BTreeMap<String, CompositionSpec>,

    /// Watch bindings from `[[binding]]`.
    #[serde(default)]
    pub binding: Vec<BindingConfig>,
}

/// Validated configuration.
///
/// Can only be obtained through `ConfigFile::try_from(RawConfigFile)`, which
/// runs every check in `config::validate`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    paths: PathsSection,
    server: ServerSection,
    watch: WatchSection,
    task: BTreeMap<String, TaskConfig>,
    pipeline: BTreeMap<String, CompositionSpec>,
    binding: Vec<BindingConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(raw: RawConfigFile) -> Self {
        Self {
            paths: raw.paths,
            server: raw.server,
            watch: raw.watch,
            task: raw.task,
            pipeline: raw.pipeline,
            binding: raw.binding,
        }
    }

    pub fn paths(&self) -> &PathsSection {
        &self.paths
    }

    pub fn server(&self) -> &ServerSection {
        &self.server
    }

    pub fn watch(&self) -> &WatchSection {
        &self.watch
    }

    pub fn tasks(&self) -> &BTreeMap<String, TaskConfig> {
        &self.task
    }

    pub fn pipelines(&self) -> &BTreeMap<String, CompositionSpec> {
        &self.pipeline
    }

    pub fn bindings(&self) -> &[BindingConfig] {
        &self.binding
    }
}

/// `[paths]` section. Both roots are relative to the project root.
#[derive(Debug, Clone, Deserialize)]
pub struct PathsSection {
    #[serde(default = "default_source")]
    pub source: PathBuf,
    #[serde(default = "default_build")]
    pub build: PathBuf,
}

fn default_source() -> PathBuf {
    PathBuf::from("source")
}

fn default_build() -> PathBuf {
    PathBuf::from("build")
}

impl Default for PathsSection {
    fn default() -> Self {
        Self {
            source: default_source(),
            build: default_build(),
        }
    }
}

/// `[server]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Port of the WebSocket listener used for reload signalling.
    #[serde(default = "default_reload_port")]
    pub reload_port: u16,
    #[serde(default = "default_true")]
    pub cors: bool,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_reload_port() -> u16 {
    35729
}

fn default_true() -> bool {
    true
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            reload_port: default_reload_port(),
            cors: true,
        }
    }
}

/// `[watch]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct WatchSection {
    #[serde(default)]
    pub triggered_while_running_behaviour: TriggerWhileRunningBehaviour,

    /// Skip triggers whose file content did not actually change.
    #[serde(default = "default_true")]
    pub use_hash: bool,
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            triggered_while_running_behaviour: TriggerWhileRunningBehaviour::default(),
            use_hash: true,
        }
    }
}

/// `[task.<name>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskConfig {
    #[serde(default)]
    pub kind: TaskKind,

    /// Stages of a `kind = "stage"` task, run in order.
    #[serde(default)]
    pub stage: Vec<StageConfig>,

    /// After the task writes, push changed `.css` outputs to dev clients
    /// without a full page reload.
    #[serde(default)]
    pub stream: bool,
}

/// `[[task.<name>.stage]]` table.
#[derive(Debug, Clone, Deserialize)]
pub struct StageConfig {
    /// Globs relative to the source root; `!`-prefixed entries exclude.
    pub src: Vec<String>,

    /// Declared base directory (relative to the source root). Output paths
    /// mirror the input path below it. Without it, the static prefix of the
    /// matching glob is used.
    #[serde(default)]
    pub base: Option<PathBuf>,

    #[serde(default)]
    pub transforms: Vec<TransformSpec>,

    /// Replace the file name of every output.
    #[serde(default)]
    pub rename: Option<String>,

    /// Destination subtree under the build root.
    #[serde(default)]
    pub dest: PathBuf,

    /// Write a `<name>.map` next to each output that a transform produced a
    /// source map for, and link it with a `sourceMappingURL` comment.
    #[serde(default)]
    pub sourcemaps: bool,
}

/// Name of a built-in transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransformKind {
    Less,
    Css,
    Html,
    Js,
    Raster,
    Webp,
    Svg,
    Sprite,
}

impl TransformKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransformKind::Less => "less",
            TransformKind::Css => "css",
            TransformKind::Html => "html",
            TransformKind::Js => "js",
            TransformKind::Raster => "raster",
            TransformKind::Webp => "webp",
            TransformKind::Svg => "svg",
            TransformKind::Sprite => "sprite",
        }
    }
}

/// Either `"css"` or `{ kind = "raster", quality = 80 }`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TransformSpec {
    Bare(TransformKind),
    Configured(TransformOptions),
}

impl TransformSpec {
    pub fn options(&self) -> TransformOptions {
        match self {
            TransformSpec::Bare(kind) => TransformOptions::new(*kind),
            TransformSpec::Configured(opts) => opts.clone(),
        }
    }
}

/// Options understood by the built-in transforms. Each transform reads only
/// the fields that concern it.
#[derive(Debug, Clone, Deserialize)]
pub struct TransformOptions {
    pub kind: TransformKind,

    /// Encoder quality for lossy output (1..=100).
    #[serde(default)]
    pub quality: Option<u8>,

    /// Program used by the `less` transform.
    #[serde(default)]
    pub command: Option<String>,

    /// Browserslist queries for the `css` transform.
    #[serde(default)]
    pub targets: Option<Vec<String>>,
}

impl TransformOptions {
    pub fn new(kind: TransformKind) -> Self {
        Self {
            kind,
            quality: None,
            command: None,
            targets: None,
        }
    }
}

/// A composition of tasks in `[pipeline]`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum CompositionSpec {
    /// A task or another pipeline, by name.
    Ref(String),
    Series { series: Vec<CompositionSpec> },
    Parallel { parallel: Vec<CompositionSpec> },
}

impl CompositionSpec {
    /// Every name referenced anywhere in this composition.
    pub fn references(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_references(&mut out);
        out
    }

    fn collect_references<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            CompositionSpec::Ref(name) => out.push(name.as_str()),
            CompositionSpec::Series { series: items }
            | CompositionSpec::Parallel { parallel: items } => {
                for item in items {
                    item.collect_references(out);
                }
            }
        }
    }
}

/// `[[binding]]` table: a watch pattern and what it runs.
#[derive(Debug, Clone, Deserialize)]
pub struct BindingConfig {
    /// Glob relative to the source root.
    pub pattern: String,

    #[serde(default)]
    pub exclude: Vec<String>,

    /// Task or pipeline names, run in sequence.
    pub run: Vec<String>,
}
