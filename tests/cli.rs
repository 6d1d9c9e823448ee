// tests/cli.rs

mod common;

use std::error::Error;
use std::fs;
use std::path::PathBuf;

use clap::Parser;

use sitepipe::cli::{CliArgs, Command};
use sitepipe::errors::SitepipeError;
use sitepipe::run;

use common::{SiteFixture, init_tracing, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn no_subcommand_means_dev() -> TestResult {
    let args = CliArgs::try_parse_from(["sitepipe"])?;

    assert_eq!(args.command(), Command::Dev);
    assert!(args.config.is_none());
    assert!(!args.dry_run);
    Ok(())
}

#[test]
fn global_flags_are_accepted_after_the_subcommand() -> TestResult {
    let args = CliArgs::try_parse_from([
        "sitepipe",
        "run",
        "styles",
        "--config",
        "site/Sitepipe.toml",
        "--dry-run",
        "--log-level",
        "debug",
    ])?;

    assert_eq!(
        args.command(),
        Command::Run {
            name: "styles".to_string()
        }
    );
    assert_eq!(args.config, Some(PathBuf::from("site/Sitepipe.toml")));
    assert!(args.dry_run);
    assert!(args.log_level.is_some());
    Ok(())
}

#[test]
fn unknown_subcommand_is_rejected() {
    assert!(CliArgs::try_parse_from(["sitepipe", "deploy"]).is_err());
}

const CONFIG: &str = r#"
[task.clean]
kind = "clean"

[task.html]
[[task.html.stage]]
src = ["*.html"]
transforms = ["html"]

[pipeline]
build = { series = ["clean", "html"] }
dev = "build"
"#;

fn project() -> Result<(SiteFixture, PathBuf), Box<dyn Error>> {
    let site = SiteFixture::new();
    site.write("index.html", "<html>\n  <body>\n    <p>hi</p>\n  </body>\n</html>\n");
    let config = site.root().join("Sitepipe.toml");
    fs::write(&config, CONFIG)?;
    Ok((site, config))
}

#[tokio::test]
async fn build_command_runs_the_build_pipeline() -> TestResult {
    init_tracing();
    let (site, config) = project()?;
    let args = CliArgs::try_parse_from([
        "sitepipe".into(),
        "build".into(),
        "--config".into(),
        config.into_os_string(),
    ])?;

    with_timeout(run(args)).await?;

    assert_eq!(site.build_files(), vec!["index.html"]);
    Ok(())
}

#[tokio::test]
async fn clean_command_removes_the_build_root() -> TestResult {
    init_tracing();
    let (site, config) = project()?;
    site.write_build("old.html", "stale");
    let args = CliArgs::try_parse_from([
        "sitepipe".into(),
        "clean".into(),
        "--config".into(),
        config.into_os_string(),
    ])?;

    with_timeout(run(args)).await?;

    assert!(!site.build().exists());
    Ok(())
}

#[tokio::test]
async fn dry_run_touches_nothing() -> TestResult {
    init_tracing();
    let (site, config) = project()?;
    let args = CliArgs::try_parse_from([
        "sitepipe".into(),
        "build".into(),
        "--dry-run".into(),
        "--config".into(),
        config.into_os_string(),
    ])?;

    with_timeout(run(args)).await?;

    assert!(!site.build().exists());
    Ok(())
}

#[tokio::test]
async fn run_command_rejects_unknown_names() -> TestResult {
    init_tracing();
    let (_site, config) = project()?;
    let args = CliArgs::try_parse_from([
        "sitepipe".into(),
        "run".into(),
        "deploy".into(),
        "--config".into(),
        config.into_os_string(),
    ])?;

    let err = with_timeout(run(args)).await.unwrap_err();

    assert!(matches!(err, SitepipeError::TaskNotFound(_)));
    Ok(())
}
