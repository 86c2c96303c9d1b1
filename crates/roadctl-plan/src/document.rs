//! Roadmap document persistence.
//!
//! Documents are plain JSON objects. Key order is preserved on load so a
//! round-trip only normalizes indentation, never field order.

use serde_json::{Map, Value};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// A JSON object with insertion-ordered keys. Roadmaps and deltas are both
/// documents; fields the tooling does not know about pass through untouched.
pub type Document = Map<String, Value>;

/// Errors from loading or persisting JSON documents.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("{path}: {message}")]
    Io { path: PathBuf, message: String },

    #[error("{path}: invalid JSON: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("{path}: top-level value must be a JSON object")]
    NotAnObject { path: PathBuf },
}

/// Read any JSON value from a file.
pub fn load_value(path: impl AsRef<Path>) -> Result<Value, LoadError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|e| LoadError::Io {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    serde_json::from_slice(&bytes).map_err(|e| LoadError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Read a JSON object from a file, rejecting non-object top-level values.
pub fn load_document(path: impl AsRef<Path>) -> Result<Document, LoadError> {
    let path = path.as_ref();
    match load_value(path)? {
        Value::Object(map) => Ok(map),
        _ => Err(LoadError::NotAnObject {
            path: path.to_path_buf(),
        }),
    }
}

/// Render a value as pretty JSON: 2-space indent, trailing newline,
/// non-ASCII characters left unescaped.
pub fn to_pretty_string(value: &Value) -> String {
    let mut rendered = serde_json::to_string_pretty(value).expect("json value serializes");
    rendered.push('\n');
    rendered
}

/// Write a value as pretty JSON, atomically: the content lands in a temp
/// file first and is renamed over the destination, so a crashed run never
/// leaves a half-written roadmap behind.
pub fn write_pretty(path: impl AsRef<Path>, value: &Value) -> Result<(), LoadError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| LoadError::Io {
            path: parent.to_path_buf(),
            message: e.to_string(),
        })?;
    }

    let tmp_path = tmp_write_path(path);
    let write_result = (|| -> std::io::Result<()> {
        let mut file = File::create(&tmp_path)?;
        file.write_all(to_pretty_string(value).as_bytes())?;
        file.sync_all()
    })();

    if let Err(error) = write_result {
        let _ = fs::remove_file(&tmp_path);
        return Err(LoadError::Io {
            path: tmp_path,
            message: error.to_string(),
        });
    }

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        LoadError::Io {
            path: path.to_path_buf(),
            message: format!("{} -> {}: {e}", tmp_path.display(), path.display()),
        }
    })
}

fn tmp_write_path(path: &Path) -> PathBuf {
    let unique = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let mut tmp: OsString = path.as_os_str().to_os_string();
    tmp.push(format!(".tmp.{}.{}", std::process::id(), unique));
    PathBuf::from(tmp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn temp_path(prefix: &str) -> PathBuf {
        let unique = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "roadctl-document-{prefix}-{}-{unique}.json",
            std::process::id()
        ))
    }

    #[test]
    fn round_trip_preserves_structure_and_key_order() {
        let path = temp_path("round-trip");
        let original = json!({
            "title": "Q3 plan",
            "plan": [{"id": "step-1", "zeta": 1, "alpha": 2}],
            "next_step": {"step_id": "step-1", "prompt": "ship it"}
        });
        write_pretty(&path, &original).expect("write should succeed");

        let reloaded = load_value(&path).expect("reload should succeed");
        assert_eq!(reloaded, original);

        let rendered = fs::read_to_string(&path).expect("file should exist");
        assert!(rendered.ends_with('\n'));
        // zeta was inserted before alpha and must stay that way
        let zeta = rendered.find("zeta").expect("zeta present");
        let alpha = rendered.find("alpha").expect("alpha present");
        assert!(zeta < alpha);

        let _ = fs::remove_file(path);
    }

    #[test]
    fn pretty_rendering_keeps_non_ascii_unescaped() {
        let rendered = to_pretty_string(&json!({"prompt": "приоритет → запуск"}));
        assert!(rendered.contains("приоритет → запуск"));
        assert!(!rendered.contains("\\u"));
    }

    #[test]
    fn load_document_rejects_top_level_array() {
        let path = temp_path("top-level-array");
        fs::write(&path, "[1, 2, 3]\n").expect("fixture should write");

        match load_document(&path) {
            Err(LoadError::NotAnObject { .. }) => {}
            other => panic!("expected NotAnObject, got {other:?}"),
        }

        let _ = fs::remove_file(path);
    }

    #[test]
    fn load_value_reports_parse_errors_with_path() {
        let path = temp_path("bad-json");
        fs::write(&path, "{not json").expect("fixture should write");

        match load_value(&path) {
            Err(LoadError::Parse { path: p, .. }) => assert_eq!(p, path),
            other => panic!("expected parse error, got {other:?}"),
        }

        let _ = fs::remove_file(path);
    }

    #[test]
    fn write_pretty_replaces_existing_file() {
        let path = temp_path("overwrite");
        write_pretty(&path, &json!({"plan": [{"id": "old"}]})).expect("first write");
        write_pretty(&path, &json!({"plan": [{"id": "new"}]})).expect("second write");

        let text = fs::read_to_string(&path).expect("file should exist");
        assert!(!text.contains("old"));
        assert!(text.contains("new"));

        let _ = fs::remove_file(path);
    }
}
