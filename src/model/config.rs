use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::item::SortingMode;

/// Gap between consecutive sort keys after a renumber (the host's value).
pub const SORT_INTEGER_DENSITY: i64 = 100_000;

/// Maximum folder nesting depth (the host's value).
pub const FOLDER_MAX_DEPTH: usize = 4;

/// How long a writer waits for another `tt` to release the library lock
pub const LOCK_TIMEOUT_MS: u64 = 5_000;

pub const DEFAULT_THUMBNAIL: &str = "modules/monks-active-tiles/img/cube.svg";

/// Configuration from library.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LibraryConfig {
    #[serde(default)]
    pub library: LibraryInfo,
    #[serde(default)]
    pub sorting: SortingConfig,
    #[serde(default)]
    pub templates: TemplateConfig,
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub user: UserConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryInfo {
    #[serde(default = "default_library_name")]
    pub name: String,
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
}

impl Default for LibraryInfo {
    fn default() -> Self {
        LibraryInfo {
            name: default_library_name(),
            lock_timeout_ms: LOCK_TIMEOUT_MS,
        }
    }
}

impl LibraryInfo {
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }
}

fn default_library_name() -> String {
    "Tile Templates".to_string()
}

fn default_lock_timeout_ms() -> u64 {
    LOCK_TIMEOUT_MS
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SortingConfig {
    #[serde(default = "default_density")]
    pub density: i64,
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    /// Ordering of root-level entries
    #[serde(default)]
    pub root: SortingMode,
}

impl Default for SortingConfig {
    fn default() -> Self {
        SortingConfig {
            density: SORT_INTEGER_DENSITY,
            max_depth: FOLDER_MAX_DEPTH,
            root: SortingMode::Manual,
        }
    }
}

fn default_density() -> i64 {
    SORT_INTEGER_DENSITY
}

fn default_max_depth() -> usize {
    FOLDER_MAX_DEPTH
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateConfig {
    /// Width and height of a new template, in pixels
    #[serde(default = "default_grid_size")]
    pub grid_size: u32,
    #[serde(default = "default_thumbnail")]
    pub default_thumbnail: String,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        TemplateConfig {
            grid_size: default_grid_size(),
            default_thumbnail: default_thumbnail(),
        }
    }
}

fn default_grid_size() -> u32 {
    100
}

fn default_thumbnail() -> String {
    DEFAULT_THUMBNAIL.to_string()
}

/// Provenance stamped onto exported templates
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportConfig {
    #[serde(default)]
    pub world: String,
    #[serde(default)]
    pub system: String,
    #[serde(default)]
    pub core_version: String,
    #[serde(default)]
    pub system_version: String,
}

/// The acting user, for permission checks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserConfig {
    #[serde(default = "default_user_id")]
    pub id: String,
    #[serde(default = "default_true")]
    pub gm: bool,
}

impl Default for UserConfig {
    fn default() -> Self {
        UserConfig {
            id: default_user_id(),
            gm: true,
        }
    }
}

fn default_user_id() -> String {
    "gamemaster".to_string()
}

fn default_true() -> bool {
    true
}
