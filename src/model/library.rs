use std::path::PathBuf;

use super::config::LibraryConfig;
use super::item::{Folder, Template};

/// A fully loaded template library
#[derive(Debug)]
pub struct Library {
    /// Root directory of the library (parent of `tiles/`)
    pub root: PathBuf,
    /// Path to the `tiles/` directory
    pub data_dir: PathBuf,
    /// Parsed library.toml
    pub config: LibraryConfig,
    /// Every template, in stored order
    pub templates: Vec<Template>,
    /// Every folder, in stored order
    pub folders: Vec<Folder>,
}

impl Library {
    pub fn template(&self, id: &str) -> Option<&Template> {
        self.templates.iter().find(|t| t.id == id)
    }

    pub fn folder(&self, id: &str) -> Option<&Folder> {
        self.folders.iter().find(|f| f.id == id)
    }
}
