//! Resource manifest loading for `jsonhome build`
//!
//! A manifest is YAML (or JSON) of the form:
//!
//! ```yaml
//! resources:
//!   - rel: http://mysite.com/rel/widgets
//!     href_template: /widgets{/widget_id}
//!     href_vars:
//!       widget_id: http://mysite.com/param/widget
//!     allow_get: true
//!     accept_post: [application/json]
//! ```
//!
//! Every key besides `rel` is a resource option.

use anyhow::{bail, Context, Result};
use jsonhome_document::{Document, ResourceOptions};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

/// Read a manifest file and build the document it describes
pub fn load_manifest(path: &Path) -> Result<Document> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read manifest {}", path.display()))?;
    let manifest: Value = serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse manifest {}", path.display()))?;

    build_document(&manifest)
}

/// Build a document from a parsed manifest tree
pub fn build_document(manifest: &Value) -> Result<Document> {
    let Some(entries) = manifest.get("resources").and_then(Value::as_array) else {
        bail!("Manifest must contain a 'resources' list");
    };

    let mut doc = Document::new();
    for (position, entry) in entries.iter().enumerate() {
        let Some(object) = entry.as_object() else {
            bail!("Manifest entry {} is not a mapping", position);
        };
        let Some(rel) = object.get("rel").and_then(Value::as_str) else {
            bail!("Manifest entry {} has no 'rel'", position);
        };

        let options: Map<String, Value> = object
            .iter()
            .filter(|(key, _)| key.as_str() != "rel")
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        let options = ResourceOptions::from_value(&Value::Object(options))
            .with_context(|| format!("Invalid options for resource {}", rel))?;

        doc.create_resource(rel, options)
            .with_context(|| format!("Failed to create resource {}", rel))?;
    }

    tracing::debug!(resources = doc.len(), "built document from manifest");
    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonhome_document::JsonHomeError;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_yaml_manifest() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r##"
resources:
  - rel: http://mysite.com/rel/widgets
    href_template: /widgets{{/widget_id}}
    href_vars:
      widget_id: http://mysite.com/param/widget
    allow_get: true
    accept_post: [application/json]
  - rel: http://mysite.com/rel/status
    href: /status
    status: deprecated
"##
        )
        .unwrap();

        let doc = load_manifest(file.path()).unwrap();
        assert_eq!(doc.len(), 2);
        assert_eq!(
            doc.get_uri("http://mysite.com/rel/widgets", &[("widget_id", "1234")])
                .unwrap(),
            "/widgets/1234"
        );
        assert_eq!(
            doc.to_json().unwrap(),
            r##"{"resources":{"http://mysite.com/rel/widgets":{"href-template":"/widgets{/widget_id}","href-vars":{"widget_id":"http://mysite.com/param/widget"},"hints":{"allow":["GET","POST"],"accept-post":["application/json"]}},"http://mysite.com/rel/status":{"href":"/status","hints":{"status":"deprecated"}}}}"##
        );
    }

    #[test]
    fn test_unknown_option_is_reported() {
        let manifest = serde_json::json!({
            "resources": [{"rel": "r", "href": "/r", "allow_teleport": true}]
        });
        let err = build_document(&manifest).unwrap_err();
        let cause = err.downcast_ref::<JsonHomeError>().unwrap();
        match cause {
            JsonHomeError::UnknownHintOption(keys) => assert_eq!(keys, &["allow_teleport"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_duplicate_rel_is_reported() {
        let manifest = serde_json::json!({
            "resources": [
                {"rel": "r", "href": "/a"},
                {"rel": "r", "href": "/b"}
            ]
        });
        let err = build_document(&manifest).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<JsonHomeError>(),
            Some(JsonHomeError::DuplicateRelation(_))
        ));
    }

    #[test]
    fn test_manifest_shape_errors() {
        assert!(build_document(&serde_json::json!({"resource": []})).is_err());
        assert!(build_document(&serde_json::json!({"resources": ["x"]})).is_err());
        assert!(build_document(&serde_json::json!({"resources": [{"href": "/x"}]})).is_err());
    }
}
