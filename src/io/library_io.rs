use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::io::store::{JsonFileStore, Repository, StoreError, atomic_write};
use crate::model::config::LibraryConfig;
use crate::model::item::SortingMode;
use crate::model::library::Library;

/// Directory holding a library's data, under the library root
pub const TILES_DIR: &str = "tiles";
pub const CONFIG_FILE: &str = "library.toml";
pub const SETTINGS_FILE: &str = "settings.json";

/// Error type for library I/O operations
#[derive(Debug, thiserror::Error)]
pub enum LibraryError {
    #[error("not a tile library: no tiles/ directory found")]
    NotALibrary,
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not write {path}: {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse library.toml: {0}")]
    ConfigParseError(#[from] toml::de::Error),
    #[error("could not parse library.toml: {0}")]
    ConfigEditError(#[from] toml_edit::TomlError),
    #[error("unknown config key: {0}")]
    UnknownKey(String),
    #[error("invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Discover the library by walking up from the given directory,
/// looking for a `tiles/` subdirectory with a library.toml.
pub fn discover_library(start: &Path) -> Result<PathBuf, LibraryError> {
    let mut current = start.to_path_buf();
    loop {
        let data_dir = current.join(TILES_DIR);
        if data_dir.is_dir() && data_dir.join(CONFIG_FILE).exists() {
            return Ok(current);
        }
        if !current.pop() {
            return Err(LibraryError::NotALibrary);
        }
    }
}

/// The settings repository of a `tiles/` directory
pub fn repository(data_dir: &Path) -> Repository<JsonFileStore> {
    Repository::new(JsonFileStore::new(data_dir.join(SETTINGS_FILE)))
}

/// Load the configuration and both item lists.
pub fn load_library(root: &Path) -> Result<Library, LibraryError> {
    let data_dir = root.join(TILES_DIR);
    if !data_dir.is_dir() {
        return Err(LibraryError::NotALibrary);
    }
    let (config, _) = read_config(&data_dir)?;
    let repo = repository(&data_dir);
    let templates = repo.load_templates()?;
    let folders = repo.load_folders()?;
    debug!(
        root = %root.display(),
        templates = templates.len(),
        folders = folders.len(),
        "loaded library"
    );
    Ok(Library {
        root: root.to_path_buf(),
        data_dir,
        config,
        templates,
        folders,
    })
}

/// Write the template list back to the store
pub fn save_templates(library: &Library) -> Result<(), LibraryError> {
    repository(&library.data_dir).save_templates(&library.templates)?;
    Ok(())
}

/// Write the folder list back to the store
pub fn save_folders(library: &Library) -> Result<(), LibraryError> {
    repository(&library.data_dir).save_folders(&library.folders)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Read the library config, returning both the parsed config and the raw
/// toml_edit Document for round-trip-safe editing.
pub fn read_config(data_dir: &Path) -> Result<(LibraryConfig, toml_edit::DocumentMut), LibraryError> {
    let config_path = data_dir.join(CONFIG_FILE);
    let config_text = fs::read_to_string(&config_path).map_err(|e| LibraryError::ReadError {
        path: config_path.clone(),
        source: e,
    })?;
    let config: LibraryConfig = toml::from_str(&config_text)?;
    let doc: toml_edit::DocumentMut = config_text.parse()?;
    Ok((config, doc))
}

/// Write the config document back to disk, preserving formatting.
pub fn write_config(data_dir: &Path, doc: &toml_edit::DocumentMut) -> Result<(), LibraryError> {
    let config_path = data_dir.join(CONFIG_FILE);
    atomic_write(&config_path, doc.to_string().as_bytes()).map_err(|e| {
        LibraryError::WriteError {
            path: config_path,
            source: e,
        }
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValueKind {
    Text,
    Integer,
    Bool,
    Sorting,
}

/// Every settable key, as `section.field`
const CONFIG_KEYS: &[(&str, ValueKind)] = &[
    ("library.name", ValueKind::Text),
    ("library.lock_timeout_ms", ValueKind::Integer),
    ("sorting.density", ValueKind::Integer),
    ("sorting.max_depth", ValueKind::Integer),
    ("sorting.root", ValueKind::Sorting),
    ("templates.grid_size", ValueKind::Integer),
    ("templates.default_thumbnail", ValueKind::Text),
    ("export.world", ValueKind::Text),
    ("export.system", ValueKind::Text),
    ("export.core_version", ValueKind::Text),
    ("export.system_version", ValueKind::Text),
    ("user.id", ValueKind::Text),
    ("user.gm", ValueKind::Bool),
];

pub fn config_keys() -> impl Iterator<Item = &'static str> {
    CONFIG_KEYS.iter().map(|(key, _)| *key)
}

fn split_key(key: &str) -> Result<(&str, &str, ValueKind), LibraryError> {
    let kind = CONFIG_KEYS
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, kind)| *kind)
        .ok_or_else(|| LibraryError::UnknownKey(key.to_string()))?;
    let (section, field) = key
        .split_once('.')
        .ok_or_else(|| LibraryError::UnknownKey(key.to_string()))?;
    Ok((section, field, kind))
}

/// The effective value of a config key (defaults included), as text
pub fn get_config_value(config: &LibraryConfig, key: &str) -> Result<String, LibraryError> {
    let (section, field, _) = split_key(key)?;
    let value = toml::Value::try_from(config).map_err(|e| LibraryError::InvalidValue {
        key: key.to_string(),
        reason: e.to_string(),
    })?;
    match value.get(section).and_then(|s| s.get(field)) {
        Some(toml::Value::String(s)) => Ok(s.clone()),
        Some(other) => Ok(other.to_string()),
        None => Err(LibraryError::UnknownKey(key.to_string())),
    }
}

/// Set a config key in the document. Comments and layout elsewhere in the
/// file are kept.
pub fn set_config_value(
    doc: &mut toml_edit::DocumentMut,
    key: &str,
    raw: &str,
) -> Result<(), LibraryError> {
    let (section, field, kind) = split_key(key)?;
    let invalid = |reason: &str| LibraryError::InvalidValue {
        key: key.to_string(),
        reason: reason.to_string(),
    };
    let value = match kind {
        ValueKind::Text => toml_edit::value(raw),
        ValueKind::Integer => {
            let n: i64 = raw.trim().parse().map_err(|_| invalid("expected an integer"))?;
            if n < 1 {
                return Err(invalid("must be at least 1"));
            }
            toml_edit::value(n)
        }
        ValueKind::Bool => {
            let b: bool = raw.trim().parse().map_err(|_| invalid("expected true or false"))?;
            toml_edit::value(b)
        }
        ValueKind::Sorting => {
            let mode = SortingMode::parse_mode(raw.trim())
                .ok_or_else(|| invalid("expected \"m\" (manual) or \"a\" (alphabetical)"))?;
            toml_edit::value(mode.code())
        }
    };

    if !doc.contains_key(section) {
        doc[section] = toml_edit::Item::Table(toml_edit::Table::new());
    }
    doc[section][field] = value;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::item::Template;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    const SAMPLE_CONFIG: &str = r#"# my tiles
[library]
name = "Dungeon Kit"

[sorting]
max_depth = 3 # keep it shallow
"#;

    fn create_test_library(dir: &Path) -> PathBuf {
        let data_dir = dir.join(TILES_DIR);
        fs::create_dir_all(&data_dir).unwrap();
        fs::write(data_dir.join(CONFIG_FILE), SAMPLE_CONFIG).unwrap();
        fs::write(
            data_dir.join(SETTINGS_FILE),
            r#"{"tile-templates": [{"_id": "t1", "name": "Door", "sort": 5}]}"#,
        )
        .unwrap();
        data_dir
    }

    #[test]
    fn discover_walks_up() {
        let tmp = TempDir::new().unwrap();
        create_test_library(tmp.path());
        assert_eq!(discover_library(tmp.path()).unwrap(), tmp.path());

        let sub = tmp.path().join(TILES_DIR);
        assert_eq!(discover_library(&sub).unwrap(), tmp.path());
    }

    #[test]
    fn discover_not_found() {
        let tmp = TempDir::new().unwrap();
        assert!(matches!(
            discover_library(tmp.path()),
            Err(LibraryError::NotALibrary)
        ));
    }

    #[test]
    fn load_and_save() {
        let tmp = TempDir::new().unwrap();
        create_test_library(tmp.path());
        let mut library = load_library(tmp.path()).unwrap();
        assert_eq!(library.config.library.name, "Dungeon Kit");
        assert_eq!(library.config.sorting.max_depth, 3);
        assert_eq!(library.templates.len(), 1);
        assert!(library.folders.is_empty());

        library
            .templates
            .push(Template::new("t2".into(), "Chest".into()));
        save_templates(&library).unwrap();
        let reloaded = load_library(tmp.path()).unwrap();
        assert_eq!(reloaded.templates.len(), 2);
        assert_eq!(reloaded.template("t2").unwrap().name, "Chest");
    }

    #[test]
    fn config_round_trip_keeps_comments() {
        let tmp = TempDir::new().unwrap();
        let data_dir = create_test_library(tmp.path());
        let (_, doc) = read_config(&data_dir).unwrap();
        write_config(&data_dir, &doc).unwrap();
        assert_eq!(
            fs::read_to_string(data_dir.join(CONFIG_FILE)).unwrap(),
            SAMPLE_CONFIG
        );
    }

    #[test]
    fn set_config_value_types_and_sections() {
        let mut doc: toml_edit::DocumentMut = SAMPLE_CONFIG.parse().unwrap();
        set_config_value(&mut doc, "sorting.max_depth", "5").unwrap();
        set_config_value(&mut doc, "sorting.root", "alphabetical").unwrap();
        set_config_value(&mut doc, "user.gm", "false").unwrap();
        set_config_value(&mut doc, "export.world", "my-world").unwrap();

        let text = doc.to_string();
        assert!(text.starts_with("# my tiles"));
        let config: LibraryConfig = toml::from_str(&text).unwrap();
        assert_eq!(config.sorting.max_depth, 5);
        assert_eq!(config.sorting.root, SortingMode::Alphabetical);
        assert!(!config.user.gm);
        assert_eq!(config.export.world, "my-world");
        assert_eq!(get_config_value(&config, "sorting.root").unwrap(), "a");
        assert_eq!(get_config_value(&config, "sorting.density").unwrap(), "100000");
        assert_eq!(get_config_value(&config, "library.name").unwrap(), "Dungeon Kit");
    }

    #[test]
    fn set_config_value_rejects_bad_input() {
        let mut doc: toml_edit::DocumentMut = SAMPLE_CONFIG.parse().unwrap();
        assert!(matches!(
            set_config_value(&mut doc, "sorting.speed", "1"),
            Err(LibraryError::UnknownKey(_))
        ));
        assert!(matches!(
            set_config_value(&mut doc, "sorting.density", "lots"),
            Err(LibraryError::InvalidValue { .. })
        ));
        assert!(matches!(
            set_config_value(&mut doc, "sorting.max_depth", "0"),
            Err(LibraryError::InvalidValue { .. })
        ));
        assert!(matches!(
            set_config_value(&mut doc, "sorting.root", "random"),
            Err(LibraryError::InvalidValue { .. })
        ));
        assert_eq!(doc.to_string(), SAMPLE_CONFIG);
    }
}
