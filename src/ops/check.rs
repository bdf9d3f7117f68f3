use std::collections::{HashMap, HashSet};

use serde::Serialize;
use tracing::warn;

use crate::model::item::{Folder, ItemKind, Template};
use crate::ops::tree::TreeIndex;

/// Structured result from `tt check`, suitable for --json output.
#[derive(Debug, Default, Serialize)]
pub struct CheckResult {
    pub valid: bool,
    pub errors: Vec<CheckError>,
    pub warnings: Vec<CheckWarning>,
}

/// A validation error (stored data breaks a directory invariant).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum CheckError {
    /// Two entries of the same kind share an id
    #[serde(rename = "duplicate_id")]
    DuplicateId {
        kind: ItemKind,
        id: String,
        count: usize,
    },
    /// Following parent links from a folder leads back to it
    #[serde(rename = "folder_cycle")]
    FolderCycle { folder_id: String },
    /// A folder is nested deeper than the configured limit
    #[serde(rename = "depth_exceeded")]
    DepthExceeded {
        folder_id: String,
        depth: usize,
        max_depth: usize,
    },
}

/// A validation warning (the directory still renders, with a fallback).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum CheckWarning {
    /// Template points at a folder that does not exist; shown at root
    #[serde(rename = "dangling_template_folder")]
    DanglingTemplateFolder {
        template_id: String,
        folder_id: String,
    },
    /// Folder points at a parent that does not exist; shown at root
    #[serde(rename = "dangling_folder_parent")]
    DanglingFolderParent { folder_id: String, parent_id: String },
    #[serde(rename = "empty_name")]
    EmptyName { kind: ItemKind, id: String },
}

/// What `repair` changed
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct RepairSummary {
    /// Templates whose dangling folder ref was cleared
    pub templates_to_root: Vec<String>,
    /// Folders whose dangling parent ref was cleared
    pub folders_to_root: Vec<String>,
    /// Folders moved to root to break a cycle
    pub cycles_broken: Vec<String>,
}

impl RepairSummary {
    pub fn is_empty(&self) -> bool {
        self.templates_to_root.is_empty()
            && self.folders_to_root.is_empty()
            && self.cycles_broken.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Main check entry point
// ---------------------------------------------------------------------------

/// Validate the stored lists. Read-only.
pub fn check_library(templates: &[Template], folders: &[Folder], max_depth: usize) -> CheckResult {
    let mut result = CheckResult::default();

    for (id, count) in duplicates(templates.iter().map(|t| t.id.as_str())) {
        result.errors.push(CheckError::DuplicateId {
            kind: ItemKind::Template,
            id,
            count,
        });
    }
    for (id, count) in duplicates(folders.iter().map(|f| f.id.as_str())) {
        result.errors.push(CheckError::DuplicateId {
            kind: ItemKind::Folder,
            id,
            count,
        });
    }

    let index = TreeIndex::new(folders, templates);
    for folder in folders {
        if index.in_cycle(&folder.id) {
            result.errors.push(CheckError::FolderCycle {
                folder_id: folder.id.clone(),
            });
            continue;
        }
        let depth = index.depth(&folder.id);
        if depth > max_depth {
            result.errors.push(CheckError::DepthExceeded {
                folder_id: folder.id.clone(),
                depth,
                max_depth,
            });
        }
        if let Some(parent) = folder.folder.as_deref()
            && index.folder(parent).is_none()
        {
            result.warnings.push(CheckWarning::DanglingFolderParent {
                folder_id: folder.id.clone(),
                parent_id: parent.to_string(),
            });
        }
        if folder.name.trim().is_empty() {
            result.warnings.push(CheckWarning::EmptyName {
                kind: ItemKind::Folder,
                id: folder.id.clone(),
            });
        }
    }

    for template in templates {
        if let Some(parent) = template.folder.as_deref()
            && index.folder(parent).is_none()
        {
            result.warnings.push(CheckWarning::DanglingTemplateFolder {
                template_id: template.id.clone(),
                folder_id: parent.to_string(),
            });
        }
        if template.name.trim().is_empty() {
            result.warnings.push(CheckWarning::EmptyName {
                kind: ItemKind::Template,
                id: template.id.clone(),
            });
        }
    }

    result.valid = result.errors.is_empty();
    result
}

/// Clear dangling parent refs and break folder cycles by moving one folder
/// of each cycle to root. Duplicate ids and depth violations are left for
/// the user.
pub fn repair(templates: &mut [Template], folders: &mut [Folder]) -> RepairSummary {
    let mut summary = RepairSummary::default();
    let folder_ids: HashSet<String> = folders.iter().map(|f| f.id.clone()).collect();

    for template in templates.iter_mut() {
        if template
            .folder
            .as_ref()
            .is_some_and(|p| !folder_ids.contains(p))
        {
            template.folder = None;
            summary.templates_to_root.push(template.id.clone());
        }
    }
    for folder in folders.iter_mut() {
        if folder.folder.as_ref().is_some_and(|p| !folder_ids.contains(p)) {
            folder.folder = None;
            summary.folders_to_root.push(folder.id.clone());
        }
    }

    while let Some(id) = first_in_cycle(folders) {
        warn!(folder = %id, "breaking folder cycle");
        if let Some(folder) = folders.iter_mut().find(|f| f.id == id) {
            folder.folder = None;
        }
        summary.cycles_broken.push(id);
    }

    summary
}

fn first_in_cycle(folders: &[Folder]) -> Option<String> {
    let index = TreeIndex::new(folders, &[]);
    folders
        .iter()
        .find(|f| index.in_cycle(&f.id))
        .map(|f| f.id.clone())
}

/// Ids seen more than once, with their counts, in first-seen order
fn duplicates<'a>(ids: impl Iterator<Item = &'a str>) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut order = Vec::new();
    for id in ids {
        let count = counts.entry(id).or_insert(0);
        if *count == 0 {
            order.push(id);
        }
        *count += 1;
    }
    order
        .into_iter()
        .filter_map(|id| {
            let count = counts[id];
            (count > 1).then(|| (id.to_string(), count))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn folder(id: &str, parent: Option<&str>) -> Folder {
        let mut f = Folder::new(id.into(), id.into());
        f.folder = parent.map(String::from);
        f
    }

    fn template(id: &str, parent: Option<&str>) -> Template {
        let mut t = Template::new(id.into(), id.into());
        t.folder = parent.map(String::from);
        t
    }

    #[test]
    fn clean_library_is_valid() {
        let folders = vec![folder("a", None), folder("b", Some("a"))];
        let templates = vec![template("t1", Some("b")), template("t2", None)];
        let result = check_library(&templates, &folders, 4);
        assert!(result.valid);
        assert!(result.errors.is_empty());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn detects_duplicates_cycles_and_depth() {
        let folders = vec![
            folder("a", None),
            folder("b", Some("a")),
            folder("c", Some("b")),
            folder("x", Some("y")),
            folder("y", Some("x")),
        ];
        let templates = vec![template("t", None), template("t", None)];
        let result = check_library(&templates, &folders, 2);
        assert!(!result.valid);
        assert_eq!(
            result.errors,
            vec![
                CheckError::DuplicateId {
                    kind: ItemKind::Template,
                    id: "t".into(),
                    count: 2,
                },
                CheckError::DepthExceeded {
                    folder_id: "c".into(),
                    depth: 3,
                    max_depth: 2,
                },
                CheckError::FolderCycle {
                    folder_id: "x".into()
                },
                CheckError::FolderCycle {
                    folder_id: "y".into()
                },
            ]
        );
    }

    #[test]
    fn dangling_refs_are_warnings() {
        let folders = vec![folder("a", Some("gone"))];
        let mut t = template("t1", Some("missing"));
        t.name = " ".into();
        let result = check_library(&[t], &folders, 4);
        assert!(result.valid);
        assert_eq!(
            result.warnings,
            vec![
                CheckWarning::DanglingFolderParent {
                    folder_id: "a".into(),
                    parent_id: "gone".into(),
                },
                CheckWarning::DanglingTemplateFolder {
                    template_id: "t1".into(),
                    folder_id: "missing".into(),
                },
                CheckWarning::EmptyName {
                    kind: ItemKind::Template,
                    id: "t1".into(),
                },
            ]
        );
    }

    #[test]
    fn repair_clears_refs_and_breaks_cycles() {
        let mut folders = vec![
            folder("a", Some("gone")),
            folder("x", Some("y")),
            folder("y", Some("x")),
            folder("z", Some("y")),
        ];
        let mut templates = vec![template("t1", Some("missing")), template("t2", Some("z"))];
        let summary = repair(&mut templates, &mut folders);
        assert_eq!(summary.templates_to_root, vec!["t1".to_string()]);
        assert_eq!(summary.folders_to_root, vec!["a".to_string()]);
        assert_eq!(summary.cycles_broken, vec!["x".to_string()]);
        assert_eq!(folders[1].folder, None);
        assert_eq!(folders[2].folder.as_deref(), Some("x"));
        assert_eq!(templates[1].folder.as_deref(), Some("z"));

        let result = check_library(&templates, &folders, 4);
        assert!(result.valid);
        assert!(result.warnings.is_empty());
        assert!(repair(&mut templates, &mut folders).is_empty());
    }

    #[test]
    fn check_result_json_is_tagged() {
        let result = CheckResult {
            valid: false,
            errors: vec![CheckError::FolderCycle {
                folder_id: "f".into(),
            }],
            warnings: vec![],
        };
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains(r#""type":"folder_cycle""#));
        assert!(json.contains(r#""folder_id":"f""#));
    }
}
