use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::item::{Folder, Item, TEMPLATE_DOCUMENT_NAME, Template};

/// Error type for drag payload handling
#[derive(Debug, thiserror::Error)]
pub enum DragError {
    #[error("malformed drag payload: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("drag payload carries no item id")]
    MissingId,
}

/// What is being dragged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DragKind {
    #[serde(rename = "Folder")]
    Folder,
    #[serde(rename = "Tile")]
    Template,
}

/// Transfer object carried as text during a drag gesture:
/// `{ "type": "Folder" | "Tile", "data": {...}, "documentName"?: "Tile" }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DragData {
    #[serde(rename = "type")]
    pub kind: DragKind,
    pub data: Value,
    /// Set on folder payloads: the document type the folder holds
    #[serde(
        rename = "documentName",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub document_name: Option<String>,
}

impl DragData {
    /// Start dragging a template
    pub fn from_template(template: &Template) -> Result<Self, DragError> {
        let mut data = serde_json::to_value(template)?;
        strip_canvas_position(&mut data);
        Ok(DragData {
            kind: DragKind::Template,
            data,
            document_name: None,
        })
    }

    /// Start dragging a folder
    pub fn from_folder(folder: &Folder) -> Result<Self, DragError> {
        let mut data = serde_json::to_value(folder)?;
        strip_canvas_position(&mut data);
        Ok(DragData {
            kind: DragKind::Folder,
            data,
            document_name: Some(TEMPLATE_DOCUMENT_NAME.to_string()),
        })
    }

    pub fn to_text(&self) -> Result<String, DragError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn parse(text: &str) -> Result<Self, DragError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Id of the dragged item
    pub fn item_id(&self) -> Result<&str, DragError> {
        self.data
            .get("_id")
            .and_then(Value::as_str)
            .ok_or(DragError::MissingId)
    }

    /// Whether a folder payload belongs to this directory
    pub fn is_template_folder(&self) -> bool {
        self.kind == DragKind::Folder
            && self.document_name.as_deref() == Some(TEMPLATE_DOCUMENT_NAME)
    }

    /// Rebuild the dragged entry from its data
    pub fn into_item(self) -> Result<Item, DragError> {
        Ok(match self.kind {
            DragKind::Template => Item::Template(serde_json::from_value(self.data)?),
            DragKind::Folder => Item::Folder(serde_json::from_value(self.data)?),
        })
    }
}

/// Canvas placement is not part of a template
fn strip_canvas_position(data: &mut Value) {
    if let Some(obj) = data.as_object_mut() {
        obj.shift_remove("x");
        obj.shift_remove("y");
    }
}
