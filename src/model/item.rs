use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::config::UserConfig;

/// Ownership level granting full control over a template.
pub const OWNERSHIP_OWNER: i64 = 3;

/// Document name the host uses for tile templates (drag payloads, labels).
pub const TEMPLATE_DOCUMENT_NAME: &str = "Tile";

/// How a folder orders its direct children
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortingMode {
    /// By name, case-insensitive
    #[serde(rename = "a")]
    Alphabetical,
    /// By sort key
    #[default]
    #[serde(rename = "m")]
    Manual,
}

impl SortingMode {
    /// The single-letter code stored on disk
    pub fn code(self) -> &'static str {
        match self {
            SortingMode::Alphabetical => "a",
            SortingMode::Manual => "m",
        }
    }

    /// Parse a sorting mode from its code or its long name
    pub fn parse_mode(s: &str) -> Option<SortingMode> {
        match s.to_ascii_lowercase().as_str() {
            "a" | "alpha" | "alphabetical" => Some(SortingMode::Alphabetical),
            "m" | "manual" => Some(SortingMode::Manual),
            _ => None,
        }
    }
}

impl std::fmt::Display for SortingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortingMode::Alphabetical => write!(f, "alphabetical"),
            SortingMode::Manual => write!(f, "manual"),
        }
    }
}

/// A reusable tile preset.
///
/// Only the fields the directory reasons about are typed. Everything else
/// (dimensions, texture, flags, ...) is carried through verbatim in `data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Parent folder id; `None` (or a dangling id) means root
    #[serde(default)]
    pub folder: Option<String>,
    #[serde(default)]
    pub sort: i64,
    /// Per-user ownership levels (`default` applies to everyone)
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub ownership: IndexMap<String, i64>,
    #[serde(flatten)]
    pub data: IndexMap<String, Value>,
}

impl Template {
    pub fn new(id: String, name: String) -> Self {
        Template {
            id,
            name,
            folder: None,
            sort: 0,
            ownership: IndexMap::new(),
            data: IndexMap::new(),
        }
    }

    /// The image path, if any
    pub fn image(&self) -> Option<&str> {
        self.data.get("img").and_then(Value::as_str)
    }

    /// The sidebar thumbnail, if any
    pub fn thumbnail(&self) -> Option<&str> {
        self.data.get("thumbnail").and_then(Value::as_str)
    }
}

/// A grouping container for templates and other folders
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Folder {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Parent folder id; `None` (or a dangling id) means root
    #[serde(default)]
    pub folder: Option<String>,
    #[serde(default)]
    pub sort: i64,
    #[serde(default)]
    pub sorting: SortingMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(flatten)]
    pub data: IndexMap<String, Value>,
}

impl Folder {
    pub fn new(id: String, name: String) -> Self {
        Folder {
            id,
            name,
            folder: None,
            sort: 0,
            sorting: SortingMode::Manual,
            color: None,
            data: IndexMap::new(),
        }
    }
}

/// Anything that can be ordered among siblings and re-parented.
pub trait Sortable {
    fn id(&self) -> &str;
    fn sort_key(&self) -> i64;
    fn parent_id(&self) -> Option<&str>;
    fn set_sort_key(&mut self, key: i64);
    fn set_parent_id(&mut self, parent: Option<String>);
}

/// What the directory listing needs from an entry besides ordering.
pub trait DirectoryEntry: Sortable {
    /// Display label
    fn label(&self) -> &str;
    /// Whether the user may edit, move or delete this entry
    fn can_modify(&self, user: &UserConfig) -> bool;
}

impl Sortable for Template {
    fn id(&self) -> &str {
        &self.id
    }

    fn sort_key(&self) -> i64 {
        self.sort
    }

    fn parent_id(&self) -> Option<&str> {
        self.folder.as_deref()
    }

    fn set_sort_key(&mut self, key: i64) {
        self.sort = key;
    }

    fn set_parent_id(&mut self, parent: Option<String>) {
        self.folder = parent;
    }
}

impl DirectoryEntry for Template {
    fn label(&self) -> &str {
        &self.name
    }

    fn can_modify(&self, user: &UserConfig) -> bool {
        if user.gm {
            return true;
        }
        let level = self
            .ownership
            .get(&user.id)
            .or_else(|| self.ownership.get("default"))
            .copied()
            .unwrap_or(0);
        level >= OWNERSHIP_OWNER
    }
}

impl Sortable for Folder {
    fn id(&self) -> &str {
        &self.id
    }

    fn sort_key(&self) -> i64 {
        self.sort
    }

    fn parent_id(&self) -> Option<&str> {
        self.folder.as_deref()
    }

    fn set_sort_key(&mut self, key: i64) {
        self.sort = key;
    }

    fn set_parent_id(&mut self, parent: Option<String>) {
        self.folder = parent;
    }
}

impl DirectoryEntry for Folder {
    fn label(&self) -> &str {
        &self.name
    }

    // Folders are shared structure; only a GM reorganizes them.
    fn can_modify(&self, user: &UserConfig) -> bool {
        user.gm
    }
}

/// Which kind of directory entry an item is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Template,
    Folder,
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemKind::Template => write!(f, "template"),
            ItemKind::Folder => write!(f, "folder"),
        }
    }
}

/// A directory entry: either a template or a folder
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Template(Template),
    Folder(Folder),
}

impl Item {
    pub fn kind(&self) -> ItemKind {
        match self {
            Item::Template(_) => ItemKind::Template,
            Item::Folder(_) => ItemKind::Folder,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Item::Template(t) => &t.id,
            Item::Folder(f) => &f.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Item::Template(t) => &t.name,
            Item::Folder(f) => &f.name,
        }
    }

    pub fn parent_id(&self) -> Option<&str> {
        match self {
            Item::Template(t) => t.folder.as_deref(),
            Item::Folder(f) => f.folder.as_deref(),
        }
    }
}
