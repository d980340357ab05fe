use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::debug;

use crate::error::BuildError;
use crate::schema::{Document, Metadata, RawStore};

/// Fields checked, in priority order, for the document text.
const TEXT_FIELDS: [&str; 4] = ["content", "text", "body", "readme"];

/// Payload keys promoted into metadata when no `metadata` object exists.
const META_FIELDS: [&str; 5] = ["title", "url", "category", "date", "version"];

/// Nesting bound for the string-leaf flattening walk.
const MAX_FLATTEN_DEPTH: usize = 64;

/// Converts every `<root>/<topic>/<file>.json` into canonical document rows.
///
/// Pure transformation: the first malformed file aborts the whole run.
pub fn build_raw(root: &Path) -> Result<RawStore, BuildError> {
    let files = discover_json_files(root)?;
    if files.is_empty() {
        return Err(BuildError::NoDocumentsFound {
            root: root.to_path_buf(),
        });
    }

    let mut store = RawStore::new();
    for path in files {
        let contents = fs::read_to_string(&path).map_err(|err| BuildError::io(&path, err))?;
        let value: Value =
            serde_json::from_str(&contents).map_err(|err| BuildError::MalformedInput {
                path: path.clone(),
                source: err,
            })?;
        let last_modified = file_mtime(&path)?;

        for (page, payload) in payloads(value).into_iter().enumerate() {
            let text = extract_text(&payload).ok_or_else(|| BuildError::EmptyText {
                path: path.clone(),
            })?;
            let metadata = extract_metadata(&payload);
            let source = path.display().to_string();
            let page = page as i64;

            store.push(Document {
                id: Document::stable_id(&source, page),
                source,
                text,
                metadata,
                page,
                last_modified,
            });
        }
        debug!(path = %path.display(), documents = store.len(), "normalized file");
    }

    Ok(store)
}

/// JSON files exactly one level below the topic subdirectories, sorted by
/// path so document ordering is stable across runs.
fn discover_json_files(root: &Path) -> Result<Vec<PathBuf>, BuildError> {
    let mut files = Vec::new();
    let topics = fs::read_dir(root).map_err(|err| BuildError::io(root, err))?;
    for topic in topics {
        let topic = topic.map_err(|err| BuildError::io(root, err))?;
        let topic_path = topic.path();
        if !topic_path.is_dir() {
            continue;
        }
        let entries = fs::read_dir(&topic_path).map_err(|err| BuildError::io(&topic_path, err))?;
        for entry in entries {
            let entry = entry.map_err(|err| BuildError::io(&topic_path, err))?;
            let path = entry.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
                files.push(path);
            }
        }
    }
    files.sort();
    Ok(files)
}

fn file_mtime(path: &Path) -> Result<DateTime<Utc>, BuildError> {
    let metadata = fs::metadata(path).map_err(|err| BuildError::io(path, err))?;
    let modified = metadata.modified().map_err(|err| BuildError::io(path, err))?;
    Ok(DateTime::<Utc>::from(modified))
}

/// A parsed file may hold a single payload, a sequence of payloads, or a
/// bare scalar. Non-object elements are wrapped as `{content: stringified}`.
fn payloads(value: Value) -> Vec<Metadata> {
    match value {
        Value::Object(map) => vec![map],
        Value::Array(items) => items.into_iter().map(wrap_payload).collect(),
        other => vec![wrap_scalar(other)],
    }
}

fn wrap_payload(value: Value) -> Metadata {
    match value {
        Value::Object(map) => map,
        other => wrap_scalar(other),
    }
}

fn wrap_scalar(value: Value) -> Metadata {
    let text = match value {
        Value::String(s) => s,
        other => other.to_string(),
    };
    let mut map = Metadata::new();
    map.insert("content".to_string(), Value::String(text));
    map
}

/// The first non-empty priority field wins. A string field is used
/// verbatim; a structured field is flattened to its string leaves. With no
/// priority field present, the whole payload is flattened. Returns `None`
/// when the result is empty or whitespace-only.
fn extract_text(payload: &Metadata) -> Option<String> {
    for field in TEXT_FIELDS {
        match payload.get(field) {
            None | Some(Value::Null) => continue,
            Some(Value::String(s)) if s.is_empty() => continue,
            Some(Value::Array(items)) if items.is_empty() => continue,
            Some(Value::Object(map)) if map.is_empty() => continue,
            Some(Value::String(s)) => return non_blank(s.clone()),
            Some(other) => return non_blank(flatten_text(other)),
        }
    }
    let value = Value::Object(payload.clone());
    non_blank(flatten_text(&value))
}

fn non_blank(text: String) -> Option<String> {
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Depth-first walk over nested objects and arrays, collecting string
/// leaves in traversal order, joined by a blank line.
fn flatten_text(value: &Value) -> String {
    let mut leaves = Vec::new();
    collect_string_leaves(value, 0, &mut leaves);
    leaves.join("\n\n")
}

fn collect_string_leaves(value: &Value, depth: usize, out: &mut Vec<String>) {
    if depth >= MAX_FLATTEN_DEPTH {
        return;
    }
    match value {
        Value::String(s) => out.push(s.clone()),
        Value::Object(map) => {
            for nested in map.values() {
                collect_string_leaves(nested, depth + 1, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_string_leaves(item, depth + 1, out);
            }
        }
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
}

/// A `metadata` object on the payload is used verbatim; otherwise the
/// well-known descriptive keys present on the payload are collected.
fn extract_metadata(payload: &Metadata) -> Metadata {
    if let Some(Value::Object(map)) = payload.get("metadata") {
        return map.clone();
    }
    let mut result = Metadata::new();
    for key in META_FIELDS {
        if let Some(value) = payload.get(key) {
            result.insert(key.to_string(), value.clone());
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use std::fs;

    use serde_json::json;
    use tempfile::tempdir;

    use super::*;

    fn write_json(root: &Path, topic: &str, name: &str, contents: &str) -> PathBuf {
        let dir = root.join(topic);
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn single_payload_with_content_field() {
        let dir = tempdir().unwrap();
        write_json(
            dir.path(),
            "geo",
            "france.json",
            r#"{"content": "Paris is the capital of France."}"#,
        );

        let raw = build_raw(dir.path()).unwrap();
        assert_eq!(raw.len(), 1);
        let doc = raw.iter().next().unwrap();
        assert_eq!(doc.text, "Paris is the capital of France.");
        assert!(doc.metadata.is_empty());
        assert_eq!(doc.page, 0);
    }

    #[test]
    fn array_payload_yields_one_document_per_element() {
        let dir = tempdir().unwrap();
        write_json(
            dir.path(),
            "letters",
            "ab.json",
            r#"[{"text":"A"},{"text":"B"}]"#,
        );

        let raw = build_raw(dir.path()).unwrap();
        assert_eq!(raw.len(), 2);
        let texts: Vec<_> = raw.iter().map(|d| d.text.as_str()).collect();
        assert_eq!(texts, vec!["A", "B"]);
        let pages: Vec<_> = raw.iter().map(|d| d.page).collect();
        assert_eq!(pages, vec![0, 1]);
    }

    #[test]
    fn non_object_array_elements_are_wrapped() {
        let dir = tempdir().unwrap();
        write_json(dir.path(), "misc", "mixed.json", r#"["plain", 42]"#);

        let raw = build_raw(dir.path()).unwrap();
        let texts: Vec<_> = raw.iter().map(|d| d.text.as_str()).collect();
        assert_eq!(texts, vec!["plain", "42"]);
    }

    #[test]
    fn bare_scalar_becomes_one_document() {
        let dir = tempdir().unwrap();
        write_json(dir.path(), "misc", "scalar.json", r#""just text""#);

        let raw = build_raw(dir.path()).unwrap();
        assert_eq!(raw.len(), 1);
        assert_eq!(raw.iter().next().unwrap().text, "just text");
    }

    #[test]
    fn priority_order_prefers_content_over_text() {
        let payload = json!({"text": "secondary", "content": "primary"});
        let Value::Object(map) = payload else {
            unreachable!()
        };
        assert_eq!(extract_text(&map).unwrap(), "primary");
    }

    #[test]
    fn structured_priority_field_is_flattened() {
        let payload = json!({"content": {"intro": "first", "sections": ["second", "third"]}});
        let Value::Object(map) = payload else {
            unreachable!()
        };
        assert_eq!(extract_text(&map).unwrap(), "first\n\nsecond\n\nthird");
    }

    #[test]
    fn missing_priority_fields_flatten_whole_payload() {
        let payload = json!({"a": {"b": "one"}, "c": ["two"]});
        let Value::Object(map) = payload else {
            unreachable!()
        };
        assert_eq!(extract_text(&map).unwrap(), "one\n\ntwo");
    }

    #[test]
    fn payload_without_strings_fails_with_empty_text() {
        let dir = tempdir().unwrap();
        write_json(dir.path(), "meta", "empty.json", r#"{"title": 42}"#);

        let err = build_raw(dir.path()).unwrap_err();
        assert!(matches!(err, BuildError::EmptyText { .. }));
    }

    #[test]
    fn malformed_json_aborts_the_run() {
        let dir = tempdir().unwrap();
        write_json(dir.path(), "bad", "broken.json", "{not json");

        let err = build_raw(dir.path()).unwrap_err();
        assert!(matches!(err, BuildError::MalformedInput { .. }));
    }

    #[test]
    fn empty_root_fails_with_no_documents_found() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("empty_topic")).unwrap();

        let err = build_raw(dir.path()).unwrap_err();
        assert!(matches!(err, BuildError::NoDocumentsFound { .. }));
    }

    #[test]
    fn metadata_object_is_used_verbatim() {
        let payload = json!({
            "content": "body",
            "metadata": {"origin": "manual"},
            "title": "ignored when metadata object exists"
        });
        let Value::Object(map) = payload else {
            unreachable!()
        };
        let meta = extract_metadata(&map);
        assert_eq!(meta.len(), 1);
        assert_eq!(meta["origin"], json!("manual"));
    }

    #[test]
    fn descriptive_keys_are_collected_without_metadata_object() {
        let payload = json!({
            "content": "body",
            "title": "Doc",
            "url": "https://example.com",
            "unrelated": true
        });
        let Value::Object(map) = payload else {
            unreachable!()
        };
        let meta = extract_metadata(&map);
        assert_eq!(meta.len(), 2);
        assert_eq!(meta["title"], json!("Doc"));
        assert_eq!(meta["url"], json!("https://example.com"));
    }

    #[test]
    fn document_ids_are_stable_across_runs() {
        let dir = tempdir().unwrap();
        write_json(
            dir.path(),
            "geo",
            "france.json",
            r#"{"content": "Paris is the capital of France."}"#,
        );

        let first = build_raw(dir.path()).unwrap();
        let second = build_raw(dir.path()).unwrap();
        let a: Vec<_> = first.iter().map(|d| d.id.clone()).collect();
        let b: Vec<_> = second.iter().map(|d| d.id.clone()).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn deeply_nested_values_do_not_overflow() {
        let mut value = json!("leaf");
        for _ in 0..200 {
            value = json!([value]);
        }
        let mut out = Vec::new();
        collect_string_leaves(&value, 0, &mut out);
        assert!(out.is_empty());
    }
}
