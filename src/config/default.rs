// src/config/default.rs

//! Built-in configuration used when no `Sitepipe.toml` is present.

pub const DEFAULT_CONFIG: &str = r#"
[paths]
source = "source"
build = "build"

[server]
port = 3000
reload_port = 35729
cors = true

[watch]
triggered_while_running_behaviour = "queue"
use_hash = true

[task.clean]
kind = "clean"

[task.reload]
kind = "reload"

[task.styles]
stream = true
[[task.styles.stage]]
src = ["less/style.less"]
transforms = ["less", "css"]
rename = "style.min.css"
dest = "css"
sourcemaps = true

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
transforms = ["raster"]
dest = "img"

[task.copy_images]
[[task.copy_images.stage]]
src = ["img/**/*.{jpg,png}"]
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
rename = "sprite.svg"
dest = "img/sprite"

[task.copy]
[[task.copy.stage]]
src = ["fonts/*.{woff2,woff}", "*.ico", "*.webmanifest"]
base = "."

[pipeline]
assets = { parallel = ["styles", "html", "scripts", "svg", "sprite", "webp"] }
build = { series = ["clean", "copy", "images", "assets"] }
dev = { series = ["clean", "copy", "copy_images", "assets"] }

[[binding]]
pattern = "less/**/*.less"
run = ["styles"]

[[binding]]
pattern = "js/*.js"
run = ["scripts"]

[[binding]]
pattern = "*.html"
run = ["html", "reload"]
"#;
