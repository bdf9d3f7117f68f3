use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::commands::InitArgs;
use crate::io::library_io::{self, CONFIG_FILE, SETTINGS_FILE, TILES_DIR};
use crate::io::store::{FOLDERS_KEY, TEMPLATES_KEY};

const LIBRARY_TOML_TEMPLATE: &str = r##"[library]
name = "Tile Templates"
# How long a write waits for another tt process to finish, in milliseconds
lock_timeout_ms = 5000

[sorting]
# Gap between sort keys after siblings are renumbered
density = 100000
# Deepest allowed folder nesting; folder drops that would go deeper are
# placed next to the target folder instead
max_depth = 4
# Ordering of root-level entries: "m" (manual) or "a" (alphabetical)
root = "m"

[templates]
# Width and height given to new templates, in pixels
grid_size = 100
default_thumbnail = "modules/monks-active-tiles/img/cube.svg"

# --- Export provenance ---
# Stamped into flags.exportSource of every exported template.

[export]
world = ""
system = ""
core_version = ""
system_version = ""

# --- Acting user ---
# Non-GM users may only change templates they own.

[user]
id = "gamemaster"
gm = true
"##;

/// Infer a library name from a directory name: replace hyphens with spaces, title-case.
fn infer_name(dir_name: &str) -> String {
    dir_name
        .split(['-', '_'])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                None => String::new(),
                Some(c) => {
                    let upper: String = c.to_uppercase().collect();
                    upper + chars.as_str()
                }
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Render library.toml with the given name
fn render_library_toml(name: &str) -> Result<String, toml_edit::TomlError> {
    let mut doc: toml_edit::DocumentMut = LIBRARY_TOML_TEMPLATE.parse()?;
    doc["library"]["name"] = toml_edit::value(name);
    Ok(doc.to_string())
}

fn empty_settings() -> String {
    let mut settings = serde_json::Map::new();
    settings.insert(TEMPLATES_KEY.to_string(), serde_json::json!([]));
    settings.insert(FOLDERS_KEY.to_string(), serde_json::json!([]));
    serde_json::Value::Object(settings).to_string()
}

pub fn cmd_init(args: InitArgs, dir: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let root: PathBuf = match dir {
        Some(d) => fs::canonicalize(d).map_err(|e| format!("cannot resolve -C path '{}': {}", d, e))?,
        None => std::env::current_dir()?,
    };
    let data_dir = root.join(TILES_DIR);

    if data_dir.join(CONFIG_FILE).exists() && !args.force {
        return Err("tile library already exists in ./tiles/ (use --force to rewrite library.toml)".into());
    }

    if let Some(parent) = root.parent()
        && let Ok(parent_root) = library_io::discover_library(parent)
    {
        eprintln!(
            "Note: parent library found at {}/",
            parent_root.join(TILES_DIR).display()
        );
        eprintln!("Creating new library in ./tiles/");
    }

    let name = args.name.unwrap_or_else(|| {
        root.file_name()
            .and_then(|n| n.to_str())
            .map(infer_name)
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "Tile Templates".to_string())
    });

    fs::create_dir_all(&data_dir)?;
    fs::write(data_dir.join(CONFIG_FILE), render_library_toml(&name)?)?;
    write_settings_if_missing(&data_dir)?;

    println!("Initialized tile library: {}", name);
    Ok(())
}

fn write_settings_if_missing(data_dir: &Path) -> std::io::Result<()> {
    let path = data_dir.join(SETTINGS_FILE);
    if path.exists() {
        return Ok(());
    }
    fs::write(path, empty_settings())
}
