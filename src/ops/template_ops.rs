use serde_json::{Value, json};
use tracing::info;

use crate::model::config::LibraryConfig;
use crate::model::item::{Folder, TEMPLATE_DOCUMENT_NAME, Template};
use crate::ops::sort::next_sort_key;
use crate::ops::tree::TreeIndex;
use crate::util::id::unique_id;

/// Error type for template operations
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("template not found: {0}")]
    NotFound(String),
    #[error("folder not found: {0}")]
    FolderNotFound(String),
}

/// Fields for a new template
#[derive(Debug, Clone, Default)]
pub struct NewTemplate {
    pub name: String,
    pub folder: Option<String>,
    pub image: Option<String>,
}

/// Changes to an existing template; `None` leaves a field alone
#[derive(Debug, Clone, Default)]
pub struct TemplateEdit {
    pub name: Option<String>,
    /// `Some(None)` moves the template to root
    pub folder: Option<Option<String>>,
    pub image: Option<String>,
}

// ---------------------------------------------------------------------------
// Lookup
// ---------------------------------------------------------------------------

pub fn find_template<'a>(templates: &'a [Template], id: &str) -> Option<&'a Template> {
    templates.iter().find(|t| t.id == id)
}

pub fn find_template_mut<'a>(templates: &'a mut [Template], id: &str) -> Option<&'a mut Template> {
    templates.iter_mut().find(|t| t.id == id)
}

// ---------------------------------------------------------------------------
// CRUD
// ---------------------------------------------------------------------------

/// Create a template at the end of its folder. Returns the new id.
pub fn create_template(
    templates: &mut Vec<Template>,
    folders: &[Folder],
    new: NewTemplate,
    config: &LibraryConfig,
) -> Result<String, TemplateError> {
    let folder = non_empty(new.folder);
    check_folder(folders, folder.as_deref())?;

    let id = unique_id(|candidate| templates.iter().any(|t| t.id == candidate));
    let name = match new.name.trim() {
        "" => format!("New {}", TEMPLATE_DOCUMENT_NAME),
        trimmed => trimmed.to_string(),
    };

    let mut template = Template::new(id.clone(), name);
    let size = config.templates.grid_size;
    template.data.insert("width".into(), json!(size));
    template.data.insert("height".into(), json!(size));
    template.data.insert("visible".into(), json!(true));
    set_image(
        &mut template,
        new.image.as_deref(),
        &config.templates.default_thumbnail,
    );

    template.sort = last_key_in(templates, folders, folder.as_deref(), config.sorting.density);
    template.folder = folder;

    info!(id = %template.id, name = %template.name, "created template");
    templates.push(template);
    Ok(id)
}

/// Rename, re-folder, or re-image a template. Moving it to another folder
/// places it last there.
pub fn edit_template(
    templates: &mut [Template],
    folders: &[Folder],
    id: &str,
    edit: TemplateEdit,
    config: &LibraryConfig,
) -> Result<(), TemplateError> {
    let new_folder = edit.folder.map(non_empty);
    if let Some(folder) = &new_folder {
        check_folder(folders, folder.as_deref())?;
    }
    let new_sort = match &new_folder {
        Some(folder) => {
            let current = find_template(templates, id)
                .ok_or_else(|| TemplateError::NotFound(id.to_string()))?;
            (current.folder != *folder).then(|| {
                let others: Vec<Template> =
                    templates.iter().filter(|t| t.id != id).cloned().collect();
                last_key_in(&others, folders, folder.as_deref(), config.sorting.density)
            })
        }
        None => None,
    };

    let template =
        find_template_mut(templates, id).ok_or_else(|| TemplateError::NotFound(id.to_string()))?;
    if let Some(name) = edit.name {
        let trimmed = name.trim();
        if !trimmed.is_empty() {
            template.name = trimmed.to_string();
        }
    }
    if let Some(folder) = new_folder {
        template.folder = folder;
    }
    if let Some(sort) = new_sort {
        template.sort = sort;
    }
    if let Some(image) = edit.image {
        set_image(template, Some(&image), &config.templates.default_thumbnail);
    }
    Ok(())
}

/// Remove a template. Returns the removed record.
pub fn delete_template(templates: &mut Vec<Template>, id: &str) -> Result<Template, TemplateError> {
    let idx = templates
        .iter()
        .position(|t| t.id == id)
        .ok_or_else(|| TemplateError::NotFound(id.to_string()))?;
    let removed = templates.remove(idx);
    info!(id, name = %removed.name, "deleted template");
    Ok(removed)
}

/// Move a template out of its folder to root. Returns false when it was
/// already at root.
pub fn clear_folder(templates: &mut [Template], id: &str) -> Result<bool, TemplateError> {
    let template =
        find_template_mut(templates, id).ok_or_else(|| TemplateError::NotFound(id.to_string()))?;
    Ok(template.folder.take().is_some())
}

/// Point a template at an image: `texture.src`, `img` and `thumbnail`
/// all follow it. Without an image the thumbnail falls back to
/// `default_thumbnail`.
pub fn set_image(template: &mut Template, image: Option<&str>, default_thumbnail: &str) {
    let image = image.filter(|s| !s.is_empty());
    let src = image.map_or(Value::Null, |s| Value::String(s.to_string()));
    match template.data.get_mut("texture").and_then(Value::as_object_mut) {
        Some(texture) => {
            texture.insert("src".into(), src.clone());
        }
        None => {
            template.data.insert("texture".into(), json!({ "src": src }));
        }
    }
    template.data.insert("img".into(), src);
    template.data.insert(
        "thumbnail".into(),
        json!(image.unwrap_or(default_thumbnail)),
    );
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn non_empty(folder: Option<String>) -> Option<String> {
    folder.filter(|f| !f.is_empty())
}

fn check_folder(folders: &[Folder], folder: Option<&str>) -> Result<(), TemplateError> {
    match folder {
        Some(id) if !folders.iter().any(|f| f.id == id) => {
            Err(TemplateError::FolderNotFound(id.to_string()))
        }
        _ => Ok(()),
    }
}

/// Key after every template the directory shows in `folder`, including
/// ones whose stored folder no longer exists when `folder` is root
fn last_key_in(
    templates: &[Template],
    folders: &[Folder],
    folder: Option<&str>,
    density: i64,
) -> i64 {
    let index = TreeIndex::new(folders, templates);
    next_sort_key(index.child_templates(folder), density)
}
