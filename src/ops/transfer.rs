use std::path::Path;

use serde_json::{Map, Value, json};
use tracing::info;

use crate::model::config::{ExportConfig, LibraryConfig};
use crate::model::item::Template;
use crate::ops::template_ops::set_image;
use crate::util::slug::slugify;

/// Error type for template import/export
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid template JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("template data must be a JSON object")]
    NotAnObject,
}

/// Fields that identify a template within one library and never travel
/// with an exported file.
const LOCAL_FIELDS: [&str; 4] = ["_id", "folder", "sort", "ownership"];

/// Portable JSON for a template, stamped with `flags.exportSource`.
pub fn export_template(template: &Template, source: &ExportConfig) -> Result<Value, TransferError> {
    let mut data = serde_json::to_value(template)?;
    let obj = data.as_object_mut().ok_or(TransferError::NotAnObject)?;
    for field in LOCAL_FIELDS {
        obj.shift_remove(field);
    }

    let flags = obj
        .entry("flags")
        .or_insert_with(|| Value::Object(Map::new()));
    if !flags.is_object() {
        *flags = Value::Object(Map::new());
    }
    if let Some(flags) = flags.as_object_mut() {
        flags.insert(
            "exportSource".into(),
            json!({
                "world": source.world,
                "system": source.system,
                "coreVersion": source.core_version,
                "systemVersion": source.system_version,
            }),
        );
    }
    Ok(data)
}

/// Default file name for an exported template
pub fn export_filename(name: &str) -> String {
    format!("fvtt-tiledata-{}.json", slugify(name))
}

/// Pretty-printed export, ready to write to disk
pub fn export_text(template: &Template, source: &ExportConfig) -> Result<String, TransferError> {
    let data = export_template(template, source)?;
    Ok(serde_json::to_string_pretty(&data)?)
}

/// Read an import file
pub fn read_import_file(path: &Path) -> Result<String, TransferError> {
    std::fs::read_to_string(path).map_err(|source| TransferError::Read {
        path: path.display().to_string(),
        source,
    })
}

/// Overwrite `dest` with imported data. The destination keeps its id, sort
/// key, ownership, name and folder. The result is always visible and its
/// image and thumbnail follow `texture.src`.
pub fn import_template(
    dest: &Template,
    json_text: &str,
    config: &LibraryConfig,
) -> Result<Template, TransferError> {
    let mut data: Value = serde_json::from_str(json_text)?;
    let obj = data.as_object_mut().ok_or(TransferError::NotAnObject)?;
    for field in LOCAL_FIELDS {
        obj.shift_remove(field);
    }
    obj.shift_remove("img");
    obj.shift_remove("thumbnail");
    obj.insert("_id".into(), json!(dest.id));
    obj.insert("name".into(), json!(dest.name));
    obj.insert("visible".into(), json!(true));

    let mut imported: Template = serde_json::from_value(data)?;
    imported.folder = dest.folder.clone();
    imported.sort = dest.sort;
    imported.ownership = dest.ownership.clone();

    let src = imported
        .data
        .get("texture")
        .and_then(|t| t.get("src"))
        .and_then(Value::as_str)
        .map(str::to_string);
    set_image(
        &mut imported,
        src.as_deref(),
        &config.templates.default_thumbnail,
    );

    info!(id = %imported.id, name = %imported.name, "imported template data");
    Ok(imported)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    fn dest() -> Template {
        let mut t = Template::new("X9".into(), "Trapdoor".into());
        t.sort = 40;
        t.folder = Some("F1".into());
        t.ownership.insert("default".into(), 0);
        t
    }

    #[test]
    fn import_preserves_destination_identity() {
        let text = r#"{
            "_id": "OTHER",
            "name": "Secret Door",
            "folder": "F7",
            "sort": 999,
            "ownership": {"default": 3},
            "width": 200,
            "texture": {"src": "a.png"},
            "visible": false
        }"#;
        let t = import_template(&dest(), text, &LibraryConfig::default()).unwrap();
        assert_eq!(t.id, "X9");
        assert_eq!(t.sort, 40);
        assert_eq!(t.folder.as_deref(), Some("F1"));
        assert_eq!(t.name, "Trapdoor");
        assert_eq!(t.ownership.get("default"), Some(&0));
        assert_eq!(t.data["visible"], json!(true));
        assert_eq!(t.data["width"], json!(200));
        assert_eq!(t.image(), Some("a.png"));
        assert_eq!(t.thumbnail(), Some("a.png"));
    }

    #[test]
    fn import_without_texture_uses_default_thumbnail() {
        let config = LibraryConfig::default();
        let t = import_template(&dest(), r#"{"width": 50}"#, &config).unwrap();
        assert_eq!(t.image(), None);
        assert_eq!(t.thumbnail(), Some(config.templates.default_thumbnail.as_str()));
    }

    #[test]
    fn import_rejects_bad_input() {
        let config = LibraryConfig::default();
        assert!(matches!(
            import_template(&dest(), "[1, 2]", &config),
            Err(TransferError::NotAnObject)
        ));
        assert!(matches!(
            import_template(&dest(), "{oops", &config),
            Err(TransferError::Json(_))
        ));
    }

    #[test]
    fn export_strips_local_fields_and_stamps_source() {
        let mut t = dest();
        t.data.insert("width".into(), json!(100));
        t.data.insert("flags".into(), json!({"other": {"keep": true}}));
        let source = ExportConfig {
            world: "w".into(),
            system: "dnd5e".into(),
            core_version: "11.315".into(),
            system_version: "2.4.1".into(),
        };
        let data = export_template(&t, &source).unwrap();
        let obj = data.as_object().unwrap();
        for field in LOCAL_FIELDS {
            assert!(!obj.contains_key(field), "{field} should be stripped");
        }
        assert_eq!(data["name"], json!("Trapdoor"));
        assert_eq!(data["flags"]["other"], json!({"keep": true}));
        assert_eq!(
            data["flags"]["exportSource"],
            json!({"world": "w", "system": "dnd5e", "coreVersion": "11.315", "systemVersion": "2.4.1"})
        );
    }

    #[test]
    fn export_then_import_keeps_payload() {
        let mut source = dest();
        source.data.insert("texture".into(), json!({"src": "b.webp"}));
        source.data.insert("height".into(), json!(300));
        let text = export_text(&source, &ExportConfig::default()).unwrap();

        let mut target = Template::new("Z1".into(), "Blank".into());
        target.sort = 7;
        let t = import_template(&target, &text, &LibraryConfig::default()).unwrap();
        assert_eq!(t.id, "Z1");
        assert_eq!(t.name, "Blank");
        assert_eq!(t.folder, None);
        assert_eq!(t.data["height"], json!(300));
        assert_eq!(t.image(), Some("b.webp"));
    }

    #[test]
    fn filename_is_slugged() {
        assert_eq!(export_filename("Secret Door #2"), "fvtt-tiledata-secret-door-2.json");
    }

    #[test]
    fn read_import_file_reports_missing() {
        let dir = tempfile::TempDir::new().unwrap();
        let missing = dir.path().join("nope.json");
        assert!(matches!(
            read_import_file(&missing),
            Err(TransferError::Read { .. })
        ));

        let path = dir.path().join("t.json");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(b"{}").unwrap();
        assert_eq!(read_import_file(&path).unwrap(), "{}");
    }
}
