use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::io::store::atomic_write;

const STATE_FILE: &str = ".state.json";

/// Persisted directory view state (written to .state.json)
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct UiState {
    /// Folders showing their contents. Every other folder is collapsed.
    #[serde(default)]
    pub expanded: BTreeSet<String>,
    /// Last search pattern
    #[serde(default)]
    pub last_search: Option<String>,
}

impl UiState {
    pub fn is_expanded(&self, folder_id: &str) -> bool {
        self.expanded.contains(folder_id)
    }

    /// Returns true when the state changed
    pub fn set_expanded(&mut self, folder_id: &str, expanded: bool) -> bool {
        if expanded {
            self.expanded.insert(folder_id.to_string())
        } else {
            self.expanded.remove(folder_id)
        }
    }

    /// Forget folders that no longer exist
    pub fn retain_folders(&mut self, exists: impl Fn(&str) -> bool) {
        self.expanded.retain(|id| exists(id));
    }
}

/// Read .state.json from the tiles directory
pub fn read_ui_state(data_dir: &Path) -> Option<UiState> {
    let path = data_dir.join(STATE_FILE);
    let content = fs::read_to_string(&path).ok()?;
    serde_json::from_str(&content).ok()
}

/// Write .state.json to the tiles directory
pub fn write_ui_state(data_dir: &Path, state: &UiState) -> Result<(), std::io::Error> {
    let path = data_dir.join(STATE_FILE);
    let content = serde_json::to_string_pretty(state)?;
    atomic_write(&path, content.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn write_and_read_round_trip() {
        let dir = TempDir::new().unwrap();
        let mut state = UiState {
            last_search: Some("door".into()),
            ..Default::default()
        };
        assert!(state.set_expanded("f1", true));
        assert!(!state.set_expanded("f1", true));
        state.set_expanded("f2", true);

        write_ui_state(dir.path(), &state).unwrap();
        let loaded = read_ui_state(dir.path()).unwrap();
        assert_eq!(loaded, state);
        assert!(loaded.is_expanded("f2"));
    }

    #[test]
    fn collapse_and_prune() {
        let mut state = UiState::default();
        state.set_expanded("a", true);
        state.set_expanded("b", true);
        assert!(state.set_expanded("a", false));
        assert!(!state.is_expanded("a"));

        state.set_expanded("gone", true);
        state.retain_folders(|id| id != "gone");
        assert_eq!(state.expanded.iter().collect::<Vec<_>>(), vec!["b"]);
    }

    #[test]
    fn read_missing_file_returns_none() {
        let dir = TempDir::new().unwrap();
        assert!(read_ui_state(dir.path()).is_none());
    }

    #[test]
    fn read_malformed_json_returns_none() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(STATE_FILE), "not json {{{").unwrap();
        assert!(read_ui_state(dir.path()).is_none());
    }

    #[test]
    fn serde_defaults_on_empty_object() {
        let state: UiState = serde_json::from_str("{}").unwrap();
        assert!(state.expanded.is_empty());
        assert!(state.last_search.is_none());
    }
}
