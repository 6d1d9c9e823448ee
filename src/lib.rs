// src/lib.rs

pub mod cli;
pub mod config;
pub mod dev;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod pipeline;
pub mod select;
pub mod server;
pub mod transform;
pub mod types;
pub mod watch;

use std::sync::Arc;
use std::time::Instant;

use tracing::info;

use crate::cli::{CliArgs, Command};
use crate::config::{ConfigFile, SitePaths, discover};
use crate::errors::Result;
use crate::pipeline::{BuildContext, Plan, clean_build_root};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config discovery and validation
/// - source/build root resolution
/// - the selected command (`build`, `dev`, `clean`, `run <NAME>`)
pub async fn run(args: CliArgs) -> Result<()> {
    let loaded = discover(args.config.as_deref())?;
    let paths = SitePaths::resolve(&loaded.config, &loaded.project_root)?;
    let command = args.command();

    if args.dry_run {
        print_dry_run(&loaded.config, &paths, &command)?;
        return Ok(());
    }

    match command {
        Command::Build => run_pipeline(&loaded.config, paths, "build").await,
        Command::Run { name } => run_pipeline(&loaded.config, paths, &name).await,
        Command::Clean => clean_build_root(&paths.build).await,
        Command::Dev => dev::run_dev(&loaded.config, paths).await,
    }
}

/// Run one task or pipeline to completion.
pub async fn run_pipeline(cfg: &ConfigFile, paths: SitePaths, name: &str) -> Result<()> {
    let plan = Plan::from_config(cfg)?;
    let composition = plan.resolve(name)?;

    info!(pipeline = name, run = %composition, "starting");
    let started = Instant::now();
    composition.run(Arc::new(BuildContext::new(paths))).await?;
    info!(
        pipeline = name,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "finished"
    );
    Ok(())
}

/// Print what would run, without running it.
fn print_dry_run(cfg: &ConfigFile, paths: &SitePaths, command: &Command) -> Result<()> {
    let plan = Plan::from_config(cfg)?;

    println!("sitepipe dry-run");
    println!("  source = {}", paths.source.display());
    println!("  build  = {}", paths.build.display());
    println!("  command = {command:?}");
    println!();

    println!("tasks ({}):", cfg.tasks().len());
    for (name, task) in cfg.tasks().iter() {
        println!("  - {name} ({:?}{})", task.kind, if task.stream { ", stream" } else { "" });
        for stage in task.stage.iter() {
            let transforms: Vec<_> = stage
                .transforms
                .iter()
                .map(|t| t.options().kind.as_str())
                .collect();
            println!("      src: {:?}", stage.src);
            if !transforms.is_empty() {
                println!("      transforms: {transforms:?}");
            }
            if let Some(base) = &stage.base {
                println!("      base: {}", base.display());
            }
            if let Some(rename) = &stage.rename {
                println!("      rename: {rename}");
            }
            println!("      dest: {}/{}", paths.build.display(), stage.dest.display());
        }
    }
    println!();

    println!("pipelines ({}):", cfg.pipelines().len());
    for name in plan.pipeline_names() {
        println!("  - {name} = {}", plan.resolve(name)?);
    }
    println!();

    println!("bindings ({}):", cfg.bindings().len());
    for binding in cfg.bindings().iter() {
        println!("  - {} -> {:?}", binding.pattern, binding.run);
        if !binding.exclude.is_empty() {
            println!("      exclude: {:?}", binding.exclude);
        }
    }

    Ok(())
}
