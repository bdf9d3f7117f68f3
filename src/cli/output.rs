use std::collections::BTreeSet;

use serde::Serialize;

use crate::model::item::{Folder, ItemKind, SortingMode, Template};
use crate::ops::check::{CheckResult, RepairSummary};
use crate::ops::folder_ops::{DeleteSummary, RemoveSummary};
use crate::ops::search::SearchResult;
use crate::ops::sort::{ParentChange, SortUpdate};
use crate::ops::tree::TreeNode;
use crate::util::unicode::{display_width, pad_to_width};

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TreeEntryJson {
    Folder {
        id: String,
        name: String,
        sort: i64,
        depth: usize,
        sorting: SortingMode,
        expanded: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        color: Option<String>,
        children: Vec<TreeEntryJson>,
    },
    Template {
        id: String,
        name: String,
        sort: i64,
        depth: usize,
        #[serde(skip_serializing_if = "Option::is_none")]
        image: Option<String>,
    },
}

#[derive(Serialize)]
pub struct UpdateJson {
    pub id: String,
    pub sort: i64,
    /// Present only when the parent changes; `null` means root
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder: Option<Option<String>>,
}

#[derive(Serialize)]
pub struct MoveJson {
    pub kind: ItemKind,
    pub id: String,
    pub ignored: bool,
    pub updates: Vec<UpdateJson>,
}

#[derive(Serialize)]
pub struct CreatedJson {
    pub kind: ItemKind,
    pub id: String,
    pub name: String,
}

#[derive(Serialize)]
pub struct FolderRemovedJson {
    pub id: String,
    pub folders_moved: Vec<String>,
    pub templates_moved: Vec<String>,
}

#[derive(Serialize)]
pub struct FolderDeletedJson {
    pub folders_deleted: Vec<String>,
    pub templates_deleted: Vec<String>,
}

#[derive(Serialize)]
pub struct ConfigEntryJson {
    pub key: String,
    pub value: String,
}

#[derive(Serialize)]
pub struct CheckJson<'a> {
    #[serde(flatten)]
    pub result: &'a CheckResult,
    /// Present after `--fix`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repaired: Option<&'a RepairSummary>,
}

#[derive(Serialize)]
pub struct ExportedJson {
    pub id: String,
    pub path: String,
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

/// Which folders a listing opens
pub struct Visibility<'v> {
    /// Open every folder
    pub all: bool,
    pub expanded: &'v BTreeSet<String>,
    /// Only entries the search revealed; those folders are opened
    pub search: Option<&'v SearchResult>,
}

impl Visibility<'_> {
    fn shows(&self, node: &TreeNode<'_>) -> bool {
        match (self.search, node) {
            (None, _) => true,
            (Some(s), TreeNode::Folder { folder, .. }) => s.shows_folder(&folder.id),
            (Some(s), TreeNode::Template { template, .. }) => s.shows_template(&template.id),
        }
    }

    fn is_open(&self, folder_id: &str) -> bool {
        self.all || self.search.is_some() || self.expanded.contains(folder_id)
    }
}

pub fn tree_to_json(nodes: &[TreeNode<'_>], vis: &Visibility<'_>) -> Vec<TreeEntryJson> {
    nodes
        .iter()
        .filter(|n| vis.shows(n))
        .map(|node| match node {
            TreeNode::Folder {
                folder,
                depth,
                children,
            } => {
                let expanded = vis.is_open(&folder.id);
                TreeEntryJson::Folder {
                    id: folder.id.clone(),
                    name: folder.name.clone(),
                    sort: folder.sort,
                    depth: *depth,
                    sorting: folder.sorting,
                    expanded,
                    color: folder.color.clone(),
                    children: if expanded {
                        tree_to_json(children, vis)
                    } else {
                        Vec::new()
                    },
                }
            }
            TreeNode::Template { template, depth } => TreeEntryJson::Template {
                id: template.id.clone(),
                name: template.name.clone(),
                sort: template.sort,
                depth: *depth,
                image: template.image().map(str::to_string),
            },
        })
        .collect()
}

pub fn update_to_json(update: &SortUpdate) -> UpdateJson {
    UpdateJson {
        id: update.id.clone(),
        sort: update.sort,
        folder: match &update.parent {
            ParentChange::Keep => None,
            ParentChange::Set(p) => Some(p.clone()),
        },
    }
}

pub fn removed_to_json(summary: &RemoveSummary) -> FolderRemovedJson {
    FolderRemovedJson {
        id: summary.folder.clone(),
        folders_moved: summary.folders_moved.clone(),
        templates_moved: summary.templates_moved.clone(),
    }
}

pub fn deleted_to_json(summary: &DeleteSummary) -> FolderDeletedJson {
    FolderDeletedJson {
        folders_deleted: summary.folders_deleted.clone(),
        templates_deleted: summary.templates_deleted.clone(),
    }
}

// ---------------------------------------------------------------------------
// Human-readable formatting
// ---------------------------------------------------------------------------

/// Names are padded to this many cells so ids line up
const NAME_COLUMN: usize = 40;

fn name_cell(indent: usize, label: &str) -> String {
    let prefix = "  ".repeat(indent);
    let budget = NAME_COLUMN.saturating_sub(display_width(&prefix)).max(8);
    format!("{}{}", prefix, pad_to_width(label, budget))
}

/// Count of every entry below a folder node
fn entry_count(children: &[TreeNode<'_>]) -> usize {
    let mut count = 0;
    for child in children {
        child.walk(&mut |_| count += 1);
    }
    count
}

/// Format the directory tree, one entry per line
pub fn format_tree(nodes: &[TreeNode<'_>], vis: &Visibility<'_>) -> Vec<String> {
    let mut lines = Vec::new();
    format_level(nodes, vis, 0, &mut lines);
    lines
}

fn format_level(nodes: &[TreeNode<'_>], vis: &Visibility<'_>, indent: usize, lines: &mut Vec<String>) {
    for node in nodes.iter().filter(|n| vis.shows(n)) {
        match node {
            TreeNode::Folder {
                folder, children, ..
            } => {
                let open = vis.is_open(&folder.id);
                let glyph = if open { '▾' } else { '▸' };
                let mut label = format!("{} {}/", glyph, folder.name);
                if !open && !children.is_empty() {
                    label.push_str(&format!(" ({})", entry_count(children)));
                }
                lines.push(format!("{}  {}", name_cell(indent, &label), folder.id));
                if open {
                    format_level(children, vis, indent + 1, lines);
                }
            }
            TreeNode::Template { template, .. } => {
                let label = format!("  {}", template.name);
                lines.push(format!("{}  {}", name_cell(indent, &label), template.id));
            }
        }
    }
}

/// Detailed view of a template
pub fn format_template_detail(template: &Template, folder_name: Option<&str>) -> Vec<String> {
    let mut lines = vec![
        format!("{} ({})", template.name, template.id),
        format!("  folder:    {}", folder_name.unwrap_or("(root)")),
        format!("  sort:      {}", template.sort),
    ];
    if let Some(img) = template.image() {
        lines.push(format!("  image:     {}", img));
    }
    if let Some(thumb) = template.thumbnail() {
        lines.push(format!("  thumbnail: {}", thumb));
    }
    let size = (template.data.get("width"), template.data.get("height"));
    if let (Some(w), Some(h)) = size {
        lines.push(format!("  size:      {}x{}", w, h));
    }
    lines
}

/// Detailed view of a folder
pub fn format_folder_detail(
    folder: &Folder,
    parent_name: Option<&str>,
    depth: usize,
    expanded: bool,
) -> Vec<String> {
    let mut lines = vec![
        format!("{}/ ({})", folder.name, folder.id),
        format!("  parent:   {}", parent_name.unwrap_or("(root)")),
        format!("  sort:     {}", folder.sort),
        format!("  depth:    {}", depth),
        format!("  sorting:  {}", folder.sorting),
        format!("  expanded: {}", if expanded { "yes" } else { "no" }),
    ];
    if let Some(color) = &folder.color {
        lines.push(format!("  color:    {}", color));
    }
    lines
}

/// One line per changed entry: `id  sort  [-> folder]`
pub fn format_updates(updates: &[SortUpdate]) -> Vec<String> {
    updates
        .iter()
        .map(|u| match &u.parent {
            ParentChange::Keep => format!("{}  {}", u.id, u.sort),
            ParentChange::Set(Some(p)) => format!("{}  {}  -> {}", u.id, u.sort, p),
            ParentChange::Set(None) => format!("{}  {}  -> (root)", u.id, u.sort),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::tree::TreeIndex;
    use pretty_assertions::assert_eq;

    fn library() -> (Vec<Folder>, Vec<Template>) {
        let mut doors = Folder::new("F1".into(), "Doors".into());
        doors.sort = 100;
        let mut iron = Template::new("T1".into(), "Iron".into());
        iron.folder = Some("F1".into());
        iron.sort = 100;
        let mut chest = Template::new("T2".into(), "Chest".into());
        chest.sort = 200;
        (vec![doors], vec![iron, chest])
    }

    #[test]
    fn collapsed_folder_hides_children() {
        let (folders, templates) = library();
        let index = TreeIndex::new(&folders, &templates);
        let tree = index.build_tree(SortingMode::Manual);
        let expanded = BTreeSet::new();
        let vis = Visibility {
            all: false,
            expanded: &expanded,
            search: None,
        };
        let lines = format_tree(&tree, &vis);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("▸ Doors/ (1)"));
        assert!(lines[0].ends_with("F1"));
        assert!(lines[1].trim_start().starts_with("Chest"));
    }

    #[test]
    fn expanded_folder_indents_children() {
        let (folders, templates) = library();
        let index = TreeIndex::new(&folders, &templates);
        let tree = index.build_tree(SortingMode::Manual);
        let expanded: BTreeSet<String> = ["F1".to_string()].into();
        let vis = Visibility {
            all: false,
            expanded: &expanded,
            search: None,
        };
        let lines = format_tree(&tree, &vis);
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("▾ Doors/"));
        assert!(lines[1].starts_with("    Iron"));
        assert!(lines[1].ends_with("T1"));

        let json = serde_json::to_value(tree_to_json(&tree, &vis)).unwrap();
        assert_eq!(json[0]["kind"], "folder");
        assert_eq!(json[0]["sorting"], "m");
        assert_eq!(json[0]["children"][0]["id"], "T1");
        assert_eq!(json[1]["kind"], "template");
    }

    #[test]
    fn update_json_marks_parent_changes() {
        let keep = update_to_json(&SortUpdate {
            id: "a".into(),
            sort: 5,
            parent: ParentChange::Keep,
        });
        let to_root = update_to_json(&SortUpdate {
            id: "b".into(),
            sort: 6,
            parent: ParentChange::Set(None),
        });
        assert_eq!(serde_json::to_string(&keep).unwrap(), r#"{"id":"a","sort":5}"#);
        assert_eq!(
            serde_json::to_string(&to_root).unwrap(),
            r#"{"id":"b","sort":6,"folder":null}"#
        );
    }

    #[test]
    fn long_names_are_truncated() {
        let name = "x".repeat(80);
        let cell = name_cell(1, &name);
        assert_eq!(display_width(&cell), NAME_COLUMN);
    }
}
