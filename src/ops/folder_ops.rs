use std::collections::HashSet;

use tracing::info;

use crate::model::item::{Folder, SortingMode, Template};
use crate::ops::sort::next_sort_key;
use crate::ops::tree::TreeIndex;
use crate::util::id::unique_id;

/// Error type for folder operations
#[derive(Debug, thiserror::Error)]
pub enum FolderError {
    #[error("folder not found: {0}")]
    NotFound(String),
    #[error("parent folder not found: {0}")]
    ParentNotFound(String),
    #[error("folder depth limit ({0}) reached")]
    MaxDepth(usize),
}

/// Fields for a new folder
#[derive(Debug, Clone, Default)]
pub struct NewFolder {
    pub name: String,
    pub parent: Option<String>,
    pub color: Option<String>,
    pub sorting: SortingMode,
}

/// Changes to an existing folder; `None` leaves a field alone
#[derive(Debug, Clone, Default)]
pub struct FolderEdit {
    pub name: Option<String>,
    /// `Some("")` clears the color
    pub color: Option<String>,
    pub sorting: Option<SortingMode>,
}

/// What a folder removal touched
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoveSummary {
    pub folder: String,
    /// Folders moved up to root
    pub folders_moved: Vec<String>,
    /// Templates moved up to root
    pub templates_moved: Vec<String>,
}

/// What a cascading delete removed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteSummary {
    pub folders_deleted: Vec<String>,
    pub templates_deleted: Vec<String>,
}

pub fn find_folder<'a>(folders: &'a [Folder], id: &str) -> Option<&'a Folder> {
    folders.iter().find(|f| f.id == id)
}

pub fn find_folder_mut<'a>(folders: &'a mut [Folder], id: &str) -> Option<&'a mut Folder> {
    folders.iter_mut().find(|f| f.id == id)
}

/// Create a folder as the last child of `parent`. Returns the new id.
pub fn create_folder(
    folders: &mut Vec<Folder>,
    new: NewFolder,
    max_depth: usize,
    density: i64,
) -> Result<String, FolderError> {
    let parent = new.parent.filter(|p| !p.is_empty());
    if let Some(parent_id) = &parent {
        if find_folder(folders, parent_id).is_none() {
            return Err(FolderError::ParentNotFound(parent_id.clone()));
        }
        let index = TreeIndex::new(folders, &[]);
        if index.depth(parent_id) + 1 > max_depth {
            return Err(FolderError::MaxDepth(max_depth));
        }
    }

    let id = unique_id(|candidate| folders.iter().any(|f| f.id == candidate));
    let name = match new.name.trim() {
        "" => "New Folder".to_string(),
        trimmed => trimmed.to_string(),
    };
    let sort = next_sort_key(
        TreeIndex::new(folders, &[]).child_folders(parent.as_deref()),
        density,
    );

    let mut folder = Folder::new(id.clone(), name);
    folder.sort = sort;
    folder.folder = parent;
    folder.sorting = new.sorting;
    folder.color = new.color.filter(|c| !c.is_empty());

    info!(id = %folder.id, name = %folder.name, "created folder");
    folders.push(folder);
    Ok(id)
}

pub fn edit_folder(folders: &mut [Folder], id: &str, edit: FolderEdit) -> Result<(), FolderError> {
    let folder = find_folder_mut(folders, id).ok_or_else(|| FolderError::NotFound(id.to_string()))?;
    if let Some(name) = edit.name {
        let trimmed = name.trim();
        if !trimmed.is_empty() {
            folder.name = trimmed.to_string();
        }
    }
    if let Some(color) = edit.color {
        folder.color = (!color.is_empty()).then_some(color);
    }
    if let Some(sorting) = edit.sorting {
        folder.sorting = sorting;
    }
    Ok(())
}

/// Remove a folder without touching its contents. Direct children (folders
/// and templates) move to root and keep their sort keys.
pub fn remove_folder(
    folders: &mut Vec<Folder>,
    templates: &mut [Template],
    id: &str,
) -> Result<RemoveSummary, FolderError> {
    let idx = folders
        .iter()
        .position(|f| f.id == id)
        .ok_or_else(|| FolderError::NotFound(id.to_string()))?;
    folders.remove(idx);

    let mut summary = RemoveSummary {
        folder: id.to_string(),
        ..Default::default()
    };
    for folder in folders.iter_mut() {
        if folder.folder.as_deref() == Some(id) {
            folder.folder = None;
            summary.folders_moved.push(folder.id.clone());
        }
    }
    for template in templates.iter_mut() {
        if template.folder.as_deref() == Some(id) {
            template.folder = None;
            summary.templates_moved.push(template.id.clone());
        }
    }
    info!(
        id,
        folders = summary.folders_moved.len(),
        templates = summary.templates_moved.len(),
        "removed folder"
    );
    Ok(summary)
}

/// Delete a folder with everything inside it.
pub fn delete_folder(
    folders: &mut Vec<Folder>,
    templates: &mut Vec<Template>,
    id: &str,
) -> Result<DeleteSummary, FolderError> {
    let doomed: HashSet<String> = {
        let index = TreeIndex::new(folders, templates);
        if index.folder(id).is_none() {
            return Err(FolderError::NotFound(id.to_string()));
        }
        std::iter::once(id.to_string())
            .chain(index.descendant_folders(id).iter().map(|f| f.id.clone()))
            .collect()
    };

    let mut summary = DeleteSummary::default();
    folders.retain(|f| {
        let gone = doomed.contains(&f.id);
        if gone {
            summary.folders_deleted.push(f.id.clone());
        }
        !gone
    });
    templates.retain(|t| {
        let gone = t.folder.as_ref().is_some_and(|p| doomed.contains(p));
        if gone {
            summary.templates_deleted.push(t.id.clone());
        }
        !gone
    });
    info!(
        id,
        folders = summary.folders_deleted.len(),
        templates = summary.templates_deleted.len(),
        "deleted folder"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::config::{FOLDER_MAX_DEPTH, SORT_INTEGER_DENSITY};
    use pretty_assertions::assert_eq;

    fn folder(id: &str, parent: Option<&str>, sort: i64) -> Folder {
        let mut f = Folder::new(id.into(), id.to_uppercase());
        f.folder = parent.map(String::from);
        f.sort = sort;
        f
    }

    fn template(id: &str, parent: Option<&str>) -> Template {
        let mut t = Template::new(id.into(), id.into());
        t.folder = parent.map(String::from);
        t
    }

    /// a > b > c, plus x at root
    fn nested() -> (Vec<Folder>, Vec<Template>) {
        (
            vec![
                folder("a", None, 100),
                folder("b", Some("a"), 100),
                folder("c", Some("b"), 100),
                folder("x", None, 200),
            ],
            vec![
                template("t0", None),
                template("ta", Some("a")),
                template("tb", Some("b")),
                template("tc", Some("c")),
            ],
        )
    }

    #[test]
    fn create_appends_among_siblings() {
        let (mut folders, _) = nested();
        let id = create_folder(
            &mut folders,
            NewFolder {
                name: "  ".into(),
                ..Default::default()
            },
            FOLDER_MAX_DEPTH,
            SORT_INTEGER_DENSITY,
        )
        .unwrap();
        let f = find_folder(&folders, &id).unwrap();
        assert_eq!(f.name, "New Folder");
        assert_eq!(f.folder, None);
        assert_eq!(f.sort, 200 + SORT_INTEGER_DENSITY);
    }

    #[test]
    fn create_at_root_goes_after_orphaned_folders() {
        let (mut folders, _) = nested();
        folders.push(folder("o", Some("GONE"), 900_000));
        let id = create_folder(
            &mut folders,
            NewFolder {
                name: "Props".into(),
                ..Default::default()
            },
            FOLDER_MAX_DEPTH,
            SORT_INTEGER_DENSITY,
        )
        .unwrap();
        let f = find_folder(&folders, &id).unwrap();
        assert_eq!(f.sort, 900_000 + SORT_INTEGER_DENSITY);
    }

    #[test]
    fn create_respects_depth_limit() {
        let (mut folders, _) = nested();
        let deep = create_folder(
            &mut folders,
            NewFolder {
                name: "d".into(),
                parent: Some("c".into()),
                color: Some("#123456".into()),
                sorting: SortingMode::Alphabetical,
            },
            FOLDER_MAX_DEPTH,
            SORT_INTEGER_DENSITY,
        )
        .unwrap();
        let f = find_folder(&folders, &deep).unwrap();
        assert_eq!(f.folder.as_deref(), Some("c"));
        assert_eq!(f.color.as_deref(), Some("#123456"));
        assert_eq!(f.sorting, SortingMode::Alphabetical);

        let result = create_folder(
            &mut folders,
            NewFolder {
                name: "e".into(),
                parent: Some(deep),
                ..Default::default()
            },
            FOLDER_MAX_DEPTH,
            SORT_INTEGER_DENSITY,
        );
        assert!(matches!(result, Err(FolderError::MaxDepth(4))));
    }

    #[test]
    fn create_under_missing_parent() {
        let (mut folders, _) = nested();
        let result = create_folder(
            &mut folders,
            NewFolder {
                name: "n".into(),
                parent: Some("zzz".into()),
                ..Default::default()
            },
            FOLDER_MAX_DEPTH,
            SORT_INTEGER_DENSITY,
        );
        assert!(matches!(result, Err(FolderError::ParentNotFound(_))));
    }

    #[test]
    fn edit_updates_fields() {
        let (mut folders, _) = nested();
        edit_folder(
            &mut folders,
            "x",
            FolderEdit {
                name: Some("Doors".into()),
                color: Some("#ff0000".into()),
                sorting: Some(SortingMode::Alphabetical),
            },
        )
        .unwrap();
        let x = find_folder(&folders, "x").unwrap();
        assert_eq!(x.name, "Doors");
        assert_eq!(x.color.as_deref(), Some("#ff0000"));
        assert_eq!(x.sorting, SortingMode::Alphabetical);

        edit_folder(
            &mut folders,
            "x",
            FolderEdit {
                color: Some(String::new()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(find_folder(&folders, "x").unwrap().color, None);
        assert!(matches!(
            edit_folder(&mut folders, "nope", FolderEdit::default()),
            Err(FolderError::NotFound(_))
        ));
    }

    #[test]
    fn remove_lifts_direct_children_only() {
        let (mut folders, mut templates) = nested();
        let summary = remove_folder(&mut folders, &mut templates, "b").unwrap();
        assert_eq!(summary.folders_moved, vec!["c".to_string()]);
        assert_eq!(summary.templates_moved, vec!["tb".to_string()]);
        assert!(find_folder(&folders, "b").is_none());
        assert_eq!(find_folder(&folders, "c").unwrap().folder, None);
        let tc = templates.iter().find(|t| t.id == "tc").unwrap();
        assert_eq!(tc.folder.as_deref(), Some("c"));
    }

    #[test]
    fn delete_cascades() {
        let (mut folders, mut templates) = nested();
        let summary = delete_folder(&mut folders, &mut templates, "a").unwrap();
        let mut deleted = summary.folders_deleted.clone();
        deleted.sort();
        assert_eq!(deleted, vec!["a", "b", "c"]);
        let mut gone = summary.templates_deleted.clone();
        gone.sort();
        assert_eq!(gone, vec!["ta", "tb", "tc"]);

        let left: Vec<&str> = folders.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(left, vec!["x"]);
        let left: Vec<&str> = templates.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(left, vec!["t0"]);
    }

    #[test]
    fn delete_unknown_folder() {
        let (mut folders, mut templates) = nested();
        assert!(matches!(
            delete_folder(&mut folders, &mut templates, "nope"),
            Err(FolderError::NotFound(_))
        ));
        assert_eq!(folders.len(), 4);
    }
}
