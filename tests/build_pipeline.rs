// tests/build_pipeline.rs

mod common;

use std::error::Error;

use image::ImageFormat;

use sitepipe::config::{ConfigFile, parse_str};
use sitepipe::errors::SitepipeError;
use sitepipe::pipeline::clean_build_root;
use sitepipe::run_pipeline;

use common::{SAMPLE_SVG, SiteFixture, init_tracing, sample_image, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

const SITE_CONFIG: &str = r#"
[task.clean]
kind = "clean"

[task.copy]
[[task.copy.stage]]
src = ["fonts/*.{woff2,woff}", "*.ico"]
base = "."

[task.styles]
[[task.styles.stage]]
src = ["css/style.css"]
transforms = ["css"]
rename = "style.min.css"
dest = "css"

[task.html]
[[task.html.stage]]
src = ["*.html"]
transforms = ["html"]

[task.scripts]
[[task.scripts.stage]]
src = ["js/*.js"]
transforms = ["js"]
dest = "js"

[task.images]
[[task.images.stage]]
src = ["img/**/*.{jpg,png}"]
transforms = [{ kind = "raster", quality = 80 }]
dest = "img"

[task.webp]
[[task.webp.stage]]
src = ["img/**/*.{jpg,png}"]
transforms = ["webp"]
dest = "img"

[task.svg]
[[task.svg.stage]]
src = ["img/**/*.svg", "!img/sprite/**/*.svg"]
transforms = ["svg"]
dest = "img"

[task.sprite]
[[task.sprite.stage]]
src = ["img/sprite/**/*.svg"]
transforms = ["svg", "sprite"]
dest = "img/sprite"

[pipeline]
assets = { parallel = ["styles", "html", "scripts", "images", "webp", "svg", "sprite"] }
build = { series = ["clean", "copy", "assets"] }
dev = "build"
"#;

fn site_config() -> ConfigFile {
    ConfigFile::try_from(parse_str(SITE_CONFIG).unwrap()).unwrap()
}

fn populate(site: &SiteFixture) {
    site.write("index.html", "<!doctype html>\n<html>\n  <body>\n    <p>  Hello  </p>\n  </body>\n</html>\n");
    site.write("favicon.ico", [0u8, 0, 1, 0]);
    site.write("fonts/body.woff2", b"wOF2fake");
    site.write("css/style.css", ".a {\n  color: red;\n}\n\n.b {\n  margin: 0px;\n}\n");
    site.write(
        "js/app.js",
        "// entry point\nfunction greet(name) {\n  return 'hi ' + name;\n}\nconsole.log(greet('there'));\n",
    );
    site.write("img/photo.jpg", sample_image(ImageFormat::Jpeg));
    site.write("img/icons/banner.png", sample_image(ImageFormat::Png));
    site.write("img/logo.svg", SAMPLE_SVG);
    site.write("img/sprite/cart.svg", SAMPLE_SVG);
    site.write("img/sprite/user.svg", SAMPLE_SVG);
}

#[tokio::test]
async fn build_writes_every_output() -> TestResult {
    init_tracing();
    let site = SiteFixture::new();
    populate(&site);

    with_timeout(run_pipeline(&site_config(), site.paths(), "build")).await?;

    assert_eq!(
        site.build_files(),
        vec![
            "css/style.min.css",
            "favicon.ico",
            "fonts/body.woff2",
            "img/icons/banner.png",
            "img/icons/banner.webp",
            "img/logo.svg",
            "img/photo.jpg",
            "img/photo.webp",
            "img/sprite/sprite.svg",
            "index.html",
            "js/app.js",
        ]
    );

    let css = String::from_utf8(site.read_build("css/style.min.css"))?;
    assert_eq!(css, ".a{color:red}.b{margin:0}");

    let js = String::from_utf8(site.read_build("js/app.js"))?;
    assert!(!js.contains("entry point"));
    assert!(js.len() < site.source().join("js/app.js").metadata()?.len() as usize);

    let html = String::from_utf8(site.read_build("index.html"))?;
    assert!(html.contains("Hello"));
    assert!(!html.contains("\n    "));

    let sprite = String::from_utf8(site.read_build("img/sprite/sprite.svg"))?;
    assert!(sprite.contains(r#"<symbol id="cart" viewBox="0 0 24 24">"#), "{sprite}");
    assert!(sprite.contains(r#"<symbol id="user" viewBox="0 0 24 24">"#), "{sprite}");

    let logo = String::from_utf8(site.read_build("img/logo.svg"))?;
    assert!(logo.contains(r#"viewBox="0 0 24 24""#), "{logo}");

    assert_eq!(site.read_build("fonts/body.woff2"), b"wOF2fake");
    assert_eq!(image::guess_format(&site.read_build("img/photo.jpg"))?, ImageFormat::Jpeg);
    assert_eq!(image::guess_format(&site.read_build("img/photo.webp"))?, ImageFormat::WebP);
    Ok(())
}

#[tokio::test]
async fn sprite_sources_stay_out_of_the_svg_task() -> TestResult {
    init_tracing();
    let site = SiteFixture::new();
    populate(&site);

    with_timeout(run_pipeline(&site_config(), site.paths(), "svg")).await?;

    assert_eq!(site.build_files(), vec!["img/logo.svg"]);
    Ok(())
}

#[tokio::test]
async fn building_twice_produces_identical_trees() -> TestResult {
    init_tracing();
    let site = SiteFixture::new();
    populate(&site);
    let cfg = site_config();

    with_timeout(run_pipeline(&cfg, site.paths(), "build")).await?;
    let first = site.build_snapshot();
    with_timeout(run_pipeline(&cfg, site.paths(), "build")).await?;
    let second = site.build_snapshot();

    assert_eq!(first, second);
    Ok(())
}

#[tokio::test]
async fn clean_runs_before_anything_is_written() -> TestResult {
    init_tracing();
    let site = SiteFixture::new();
    populate(&site);
    site.write_build("stale/old.css", "a{}");
    site.write_build("index.html", "outdated");

    with_timeout(run_pipeline(&site_config(), site.paths(), "build")).await?;

    assert!(!site.build_exists("stale/old.css"));
    assert_ne!(site.read_build("index.html"), b"outdated");
    Ok(())
}

#[tokio::test]
async fn clean_with_missing_build_root_succeeds() -> TestResult {
    let site = SiteFixture::new();
    assert!(!site.build().exists());

    with_timeout(clean_build_root(&site.build())).await?;
    with_timeout(run_pipeline(&site_config(), site.paths(), "clean")).await?;
    Ok(())
}

#[tokio::test]
async fn empty_source_tree_builds_nothing() -> TestResult {
    init_tracing();
    let site = SiteFixture::new();

    with_timeout(run_pipeline(&site_config(), site.paths(), "build")).await?;

    assert!(site.build_files().is_empty());
    Ok(())
}

#[tokio::test]
async fn declared_base_keeps_the_directory_layout() -> TestResult {
    init_tracing();
    let site = SiteFixture::new();
    site.write("img/icons/a.svg", SAMPLE_SVG);
    site.write("img/b.svg", SAMPLE_SVG);

    let cfg = ConfigFile::try_from(parse_str(
        r#"
        [task.clean]
        kind = "clean"

        [task.from_glob]
        [[task.from_glob.stage]]
        src = ["img/**/*.svg"]
        dest = "flat"

        [task.from_base]
        [[task.from_base.stage]]
        src = ["img/**/*.svg"]
        base = "."
        dest = "nested"

        [pipeline]
        build = { parallel = ["from_glob", "from_base"] }
        dev = "build"
        "#,
    )?)?;

    with_timeout(run_pipeline(&cfg, site.paths(), "build")).await?;

    assert_eq!(
        site.build_files(),
        vec![
            "flat/b.svg",
            "flat/icons/a.svg",
            "nested/img/b.svg",
            "nested/img/icons/a.svg",
        ]
    );
    Ok(())
}

#[tokio::test]
async fn transform_failure_is_reported_as_recoverable() -> TestResult {
    init_tracing();
    let site = SiteFixture::new();
    populate(&site);
    site.write("js/broken.js", "function (");

    let err = with_timeout(run_pipeline(&site_config(), site.paths(), "scripts"))
        .await
        .expect_err("broken script must fail the task");

    assert!(err.is_recoverable());
    match err {
        SitepipeError::TransformError { transform, path, .. } => {
            assert_eq!(transform, "js");
            assert!(path.ends_with("js/broken.js"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn failing_branch_does_not_stop_its_siblings() -> TestResult {
    init_tracing();
    let site = SiteFixture::new();
    populate(&site);
    site.write("js/broken.js", "function (");

    let result = with_timeout(run_pipeline(&site_config(), site.paths(), "build")).await;

    assert!(result.is_err());
    // Siblings of the scripts task in the parallel group still finished.
    assert!(site.build_exists("index.html"));
    assert!(site.build_exists("css/style.min.css"));
    assert!(site.build_exists("img/sprite/sprite.svg"));
    Ok(())
}

#[tokio::test]
async fn failure_in_series_skips_later_steps() -> TestResult {
    init_tracing();
    let site = SiteFixture::new();
    populate(&site);
    site.write("img/logo.svg", "this is not svg");

    let cfg = ConfigFile::try_from(parse_str(&SITE_CONFIG.replace(
        r#"build = { series = ["clean", "copy", "assets"] }"#,
        r#"build = { series = ["clean", "svg", "copy"] }"#,
    ))?)?;

    let result = with_timeout(run_pipeline(&cfg, site.paths(), "build")).await;

    assert!(result.is_err());
    assert!(!site.build_exists("favicon.ico"));
    Ok(())
}

#[tokio::test]
async fn unknown_pipeline_is_an_error() {
    let site = SiteFixture::new();

    let err = with_timeout(run_pipeline(&site_config(), site.paths(), "deploy"))
        .await
        .unwrap_err();

    assert!(matches!(err, SitepipeError::TaskNotFound(_)));
}

const MAPPED_STYLES: &str = r#"
[task.styles]
[[task.styles.stage]]
src = ["css/style.css"]
transforms = ["css"]
rename = "style.min.css"
dest = "css"
sourcemaps = true

[pipeline]
build = "styles"
dev = "build"
"#;

#[tokio::test]
async fn stylesheet_source_map_is_written_and_linked() -> TestResult {
    init_tracing();
    let site = SiteFixture::new();
    populate(&site);
    let cfg = ConfigFile::try_from(parse_str(MAPPED_STYLES)?)?;

    with_timeout(run_pipeline(&cfg, site.paths(), "build")).await?;

    assert_eq!(site.build_files(), vec!["css/style.min.css", "css/style.min.css.map"]);
    let css = String::from_utf8(site.read_build("css/style.min.css"))?;
    assert!(css.starts_with(".a{color:red}.b{margin:0}"));
    assert!(css.ends_with("/*# sourceMappingURL=style.min.css.map */\n"), "{css}");

    let map: serde_json::Value = serde_json::from_slice(&site.read_build("css/style.min.css.map"))?;
    assert_eq!(map["version"], 3);
    let sources = map["sources"].as_array().ok_or("no sources")?;
    assert_eq!(sources.len(), 1);
    let source = sources[0].as_str().ok_or("source is not a string")?;
    // Relative to build/css, pointing back into the source tree.
    assert!(source.starts_with("../../"), "{source}");
    assert!(source.ends_with("source/css/style.css"), "{source}");
    assert!(map["sourcesContent"][0].as_str().is_some_and(|c| c.contains("margin: 0px")));
    assert!(!map["mappings"].as_str().unwrap_or_default().is_empty());
    Ok(())
}
