use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::model::drag::{DragData, DragError, DragKind};
use crate::model::item::{Folder, Template};
use crate::ops::sort::{ParentChange, SortOptions, SortUpdate, apply_updates, place_item};
use crate::ops::tree::TreeIndex;

/// Error type for drop handling
#[derive(Debug, thiserror::Error)]
pub enum DropError {
    #[error("template not found: {0}")]
    TemplateNotFound(String),
    #[error("folder not found: {0}")]
    FolderNotFound(String),
    #[error(transparent)]
    Payload(#[from] DragError),
}

/// Where in the directory something was dropped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropTarget {
    /// Empty space at the directory root
    Root,
    /// Onto a template entry
    Template { id: String },
    /// Onto a folder header
    Folder { id: String },
    /// Into a folder's content area
    FolderContents { id: String },
}

/// Directory settings and UI state that shape how a drop resolves
#[derive(Debug, Clone, Copy)]
pub struct DropContext<'s> {
    pub max_depth: usize,
    pub density: i64,
    /// Folders currently showing their contents; all others are collapsed
    pub expanded: &'s HashSet<String>,
}

impl DropContext<'_> {
    fn is_collapsed(&self, folder_id: &str) -> bool {
        !self.expanded.contains(folder_id)
    }
}

/// Result of handling a drop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropOutcome {
    /// Template keys/parents to update
    Templates(Vec<SortUpdate>),
    /// Folder keys/parents to update
    Folders(Vec<SortUpdate>),
    /// The drop was declined; nothing changes
    Ignored,
}

impl DropOutcome {
    /// Write the updates into the flat lists
    pub fn apply(&self, templates: &mut [Template], folders: &mut [Folder]) {
        match self {
            DropOutcome::Templates(updates) => apply_updates(templates, updates),
            DropOutcome::Folders(updates) => apply_updates(folders, updates),
            DropOutcome::Ignored => {}
        }
    }
}

/// Handle a serialized drag payload dropped onto `target`.
///
/// `sort_before` only applies to templates; `None` picks the direction
/// from the current keys (see [`drop_template`]).
pub fn handle_drop(
    templates: &[Template],
    folders: &[Folder],
    payload: &str,
    target: &DropTarget,
    sort_before: Option<bool>,
    ctx: &DropContext,
) -> Result<DropOutcome, DropError> {
    let drag = DragData::parse(payload)?;
    let id = drag.item_id()?;
    let outcome = match drag.kind {
        DragKind::Template => drop_template(templates, folders, id, target, sort_before, ctx)?
            .map(DropOutcome::Templates),
        DragKind::Folder if drag.is_template_folder() => {
            drop_folder(templates, folders, id, target, ctx)?.map(DropOutcome::Folders)
        }
        DragKind::Folder => {
            debug!(id, "ignoring folder from another directory");
            None
        }
    };
    Ok(outcome.unwrap_or(DropOutcome::Ignored))
}

/// Place a template relative to a drop target.
///
/// Dropped on another template it lands next to it and joins that
/// template's folder. Dropped on a folder (header or contents) it is
/// appended inside it. When `sort_before` is `None` the direction follows
/// the drag: an item moving up (larger key than the target) goes before
/// the target, one moving down goes after it.
///
/// Returns `Ok(None)` when the drop is declined.
pub fn drop_template(
    templates: &[Template],
    folders: &[Folder],
    moved_id: &str,
    target: &DropTarget,
    sort_before: Option<bool>,
    ctx: &DropContext,
) -> Result<Option<Vec<SortUpdate>>, DropError> {
    let index = TreeIndex::new(folders, templates);
    let moved = index
        .template(moved_id)
        .ok_or_else(|| DropError::TemplateNotFound(moved_id.to_string()))?;

    let (parent, relative_to): (Option<&str>, Option<&Template>) = match target {
        DropTarget::Root => (None, None),
        DropTarget::Template { id } => {
            if id == moved_id {
                debug!(id, "template dropped onto itself");
                return Ok(None);
            }
            let target = index
                .template(id)
                .ok_or_else(|| DropError::TemplateNotFound(id.clone()))?;
            (index.template_parent(id), Some(target))
        }
        DropTarget::Folder { id } | DropTarget::FolderContents { id } => {
            index
                .folder(id)
                .ok_or_else(|| DropError::FolderNotFound(id.clone()))?;
            (Some(id.as_str()), None)
        }
    };

    let sort_before =
        sort_before.unwrap_or_else(|| relative_to.is_some_and(|t| moved.sort > t.sort));
    let siblings: Vec<&Template> = index
        .child_templates(parent)
        .iter()
        .copied()
        .filter(|t| t.id != moved.id)
        .collect();
    let options = SortOptions {
        sort_before,
        density: ctx.density,
        parent: ParentChange::Set(parent.map(str::to_string)),
    };
    Ok(place_item(moved, relative_to, &siblings, &options))
}

/// Place a folder relative to a drop target.
///
/// - onto a collapsed folder: becomes its sibling, placed before it;
/// - onto an expanded folder, its contents, or a template inside it:
///   appended inside that folder;
/// - onto the root: appended at root level.
///
/// A folder can never end up inside itself or its own subtree. If nesting
/// inside the chosen folder would exceed `max_depth` (counting the moved
/// folder's own subfolders), the drop is redirected to sit next to that
/// folder instead, one level up, repeating until it fits.
///
/// Returns `Ok(None)` when the drop is declined.
pub fn drop_folder(
    templates: &[Template],
    folders: &[Folder],
    moved_id: &str,
    target: &DropTarget,
    ctx: &DropContext,
) -> Result<Option<Vec<SortUpdate>>, DropError> {
    let index = TreeIndex::new(folders, templates);
    let moved = index
        .folder(moved_id)
        .ok_or_else(|| DropError::FolderNotFound(moved_id.to_string()))?;

    let (mut parent, mut relative_to): (Option<&str>, Option<&Folder>) = match target {
        DropTarget::Root => (None, None),
        DropTarget::Folder { id } => {
            let folder = index
                .folder(id)
                .ok_or_else(|| DropError::FolderNotFound(id.clone()))?;
            if ctx.is_collapsed(id) {
                (index.folder_parent(id), Some(folder))
            } else {
                (Some(id.as_str()), None)
            }
        }
        DropTarget::FolderContents { id } => {
            index
                .folder(id)
                .ok_or_else(|| DropError::FolderNotFound(id.clone()))?;
            (Some(id.as_str()), None)
        }
        DropTarget::Template { id } => {
            index
                .template(id)
                .ok_or_else(|| DropError::TemplateNotFound(id.clone()))?;
            (index.template_parent(id), None)
        }
    };

    if relative_to.is_some_and(|f| f.id == moved.id) {
        debug!(id = moved_id, "folder dropped onto itself");
        return Ok(None);
    }
    if let Some(p) = parent
        && (p == moved_id || index.is_descendant(p, moved_id))
    {
        debug!(id = moved_id, parent = p, "rejected: folder into its own subtree");
        return Ok(None);
    }

    let height = index.subtree_height(moved_id);
    let mut climbed: HashSet<&str> = HashSet::new();
    while let Some(p) = parent {
        if index.depth(p) + height <= ctx.max_depth {
            break;
        }
        if !climbed.insert(p) {
            warn!(id = moved_id, folder = p, "folder cycle above drop target, placing at root");
            relative_to = None;
            parent = None;
            break;
        }
        info!(
            id = moved_id,
            folder = p,
            max_depth = ctx.max_depth,
            "folder too deep, placing next to it instead"
        );
        relative_to = index.folder(p);
        parent = index.folder_parent(p);
    }

    let siblings: Vec<&Folder> = index
        .child_folders(parent)
        .iter()
        .copied()
        .filter(|f| f.id != moved.id)
        .collect();
    let options = SortOptions {
        sort_before: true,
        density: ctx.density,
        parent: ParentChange::Set(parent.map(str::to_string)),
    };
    Ok(place_item(moved, relative_to, &siblings, &options))
}
