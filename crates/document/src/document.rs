//! json-home document

use crate::codec::{Codec, JsonCodec};
use crate::resource::{Resource, ResourceOptions};
use crate::uri_template::Bindings;
use jsonhome_common::{JsonHomeError, Result};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Resources keyed by link relation, in insertion order
#[derive(Debug, Clone, Default)]
pub struct Document {
    resources: Vec<Resource>,
    index: HashMap<String, usize>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a resource and register it under `rel`
    ///
    /// Fails with `DuplicateRelation` if `rel` is already registered; the
    /// document is left unchanged on any error.
    pub fn create_resource(
        &mut self,
        rel: impl Into<String>,
        options: ResourceOptions,
    ) -> Result<&Resource> {
        let rel = rel.into();
        if self.contains(&rel) {
            return Err(JsonHomeError::DuplicateRelation(rel));
        }

        let resource = Resource::create(rel, options)?;
        self.insert(resource)
    }

    /// Register an already built resource under its own relation
    pub fn insert(&mut self, resource: Resource) -> Result<&Resource> {
        if self.contains(resource.rel()) {
            return Err(JsonHomeError::DuplicateRelation(resource.rel().to_string()));
        }

        tracing::debug!(rel = resource.rel(), "registering resource");
        let position = self.resources.len();
        self.index.insert(resource.rel().to_string(), position);
        self.resources.push(resource);
        Ok(&self.resources[position])
    }

    /// Look up a resource, failing with `ResourceNotFound` if absent
    pub fn lookup(&self, rel: &str) -> Result<&Resource> {
        self.get(rel)
            .ok_or_else(|| JsonHomeError::ResourceNotFound(rel.to_string()))
    }

    pub fn get(&self, rel: &str) -> Option<&Resource> {
        self.index.get(rel).map(|&position| &self.resources[position])
    }

    pub fn contains(&self, rel: &str) -> bool {
        self.index.contains_key(rel)
    }

    /// Resolve the URI of the resource registered under `rel`
    pub fn get_uri<B: Bindings + ?Sized>(&self, rel: &str, bindings: &B) -> Result<String> {
        self.lookup(rel)?.resolve(bindings)
    }

    /// Resources in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Resource> {
        self.resources.iter()
    }

    pub fn relations(&self) -> impl Iterator<Item = &str> {
        self.resources.iter().map(Resource::rel)
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Wire tree `{"resources": {...}}` in insertion order
    pub fn to_value(&self) -> Value {
        let resources: Map<String, Value> = self
            .resources
            .iter()
            .map(|resource| (resource.rel().to_string(), resource.to_wire()))
            .collect();

        let mut root = Map::new();
        root.insert("resources".to_string(), Value::Object(resources));
        Value::Object(root)
    }

    /// Parse a wire tree
    ///
    /// Either every entry parses and a complete document is returned, or the
    /// first failing entry's error is.
    pub fn from_value(value: &Value) -> Result<Self> {
        let resources = value
            .as_object()
            .and_then(|root| root.get("resources"))
            .and_then(Value::as_object)
            .ok_or_else(|| {
                JsonHomeError::MalformedDocument(
                    "expected an object with a \"resources\" object".to_string(),
                )
            })?;

        let mut document = Self::new();
        for (rel, entry) in resources {
            document.insert(Resource::from_wire(rel.as_str(), entry)?)?;
        }

        tracing::debug!(resources = document.len(), "parsed json-home document");
        Ok(document)
    }

    /// Compact JSON text
    pub fn to_json(&self) -> Result<String> {
        self.to_json_with(&JsonCodec::compact())
    }

    pub fn to_json_with<C: Codec + ?Sized>(&self, codec: &C) -> Result<String> {
        codec.encode(&self.to_value())
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Self::from_json_with(text, &JsonCodec::default())
    }

    pub fn from_json_with<C: Codec + ?Sized>(text: &str, codec: &C) -> Result<Self> {
        Self::from_value(&codec.decode(text)?)
    }

    /// Read a document from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), "loading json-home document");
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Write the document to a file as indented JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let mut text = self.to_json_with(&JsonCodec::pretty())?;
        text.push('\n');
        fs::write(path, text)?;
        tracing::debug!(path = %path.display(), resources = self.len(), "saved json-home document");
        Ok(())
    }
}

/// Equal when both hold the same resources, regardless of order
impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|resource| other.get(resource.rel()) == Some(resource))
    }
}

impl Eq for Document {}

impl<'a> IntoIterator for &'a Document {
    type Item = &'a Resource;
    type IntoIter = std::slice::Iter<'a, Resource>;

    fn into_iter(self) -> Self::IntoIter {
        self.resources.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::MockCodec;
    use crate::hints::HintOptions;
    use serde_json::json;

    fn delete_only() -> ResourceOptions {
        ResourceOptions {
            href: Some("/r".to_string()),
            hints: HintOptions {
                allow_delete: true,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_duplicate_relation_keeps_first() {
        let mut doc = Document::new();
        doc.create_resource("relation", delete_only()).unwrap();

        let err = doc
            .create_resource(
                "relation",
                ResourceOptions {
                    href: Some("/other".to_string()),
                    ..Default::default()
                },
            )
            .unwrap_err();

        assert!(matches!(err, JsonHomeError::DuplicateRelation(_)));
        assert_eq!(doc.len(), 1);
        assert_eq!(doc.lookup("relation").unwrap().href(), Some("/r"));
    }

    #[test]
    fn test_insert_rejects_duplicate() {
        let mut doc = Document::new();
        let resource = doc.create_resource("relation", delete_only()).unwrap().clone();
        assert!(matches!(
            doc.insert(resource),
            Err(JsonHomeError::DuplicateRelation(_))
        ));
    }

    #[test]
    fn test_invalid_resource_leaves_document_unchanged() {
        let mut doc = Document::new();
        assert!(doc
            .create_resource("relation", ResourceOptions::default())
            .is_err());
        assert!(doc.is_empty());
        assert!(!doc.contains("relation"));
    }

    #[test]
    fn test_unknown_resource() {
        let doc = Document::new();
        assert!(matches!(
            doc.lookup("unknown"),
            Err(JsonHomeError::ResourceNotFound(_))
        ));
        assert!(matches!(
            doc.get_uri("unknown", &[("key", "val")]),
            Err(JsonHomeError::ResourceNotFound(ref rel)) if rel == "unknown"
        ));
    }

    #[test]
    fn test_equality_ignores_order() {
        let mut d1 = Document::new();
        d1.create_resource("a", delete_only()).unwrap();
        d1.create_resource("b", delete_only()).unwrap();

        let mut d2 = Document::new();
        d2.create_resource("b", delete_only()).unwrap();
        d2.create_resource("a", delete_only()).unwrap();

        assert_eq!(d1, d2);

        let mut d3 = Document::new();
        d3.create_resource("a", delete_only()).unwrap();
        assert_ne!(d1, d3);
    }

    #[test]
    fn test_equality_resource_difference() {
        let mut d1 = Document::new();
        d1.create_resource("relation", delete_only()).unwrap();

        let mut d2 = Document::new();
        let mut options = delete_only();
        options.hints.allow_delete = false;
        d2.create_resource("relation", options).unwrap();

        assert_ne!(d1, d2);
    }

    #[test]
    fn test_malformed_envelope() {
        for bad in [
            json!([]),
            json!({}),
            json!({"resources": []}),
            json!({"resource": {}}),
        ] {
            assert!(matches!(
                Document::from_value(&bad),
                Err(JsonHomeError::MalformedDocument(_))
            ));
        }
    }

    #[test]
    fn test_from_value_fails_whole_document() {
        let value = json!({"resources": {
            "good": {"href": "/good"},
            "bad": {"hints": {"allow": ["GET"]}}
        }});
        assert!(matches!(
            Document::from_value(&value),
            Err(JsonHomeError::InvalidResource(_))
        ));
    }

    #[test]
    fn test_to_json_uses_codec() {
        let mut doc = Document::new();
        doc.create_resource("relation", delete_only()).unwrap();
        let expected = doc.to_value();

        let mut codec = MockCodec::new();
        codec
            .expect_encode()
            .withf(move |value| *value == expected)
            .times(1)
            .returning(|_| Ok("encoded".to_string()));

        assert_eq!(doc.to_json_with(&codec).unwrap(), "encoded");
    }

    #[test]
    fn test_codec_failure_returns_no_document() {
        let mut codec = MockCodec::new();
        codec
            .expect_decode()
            .times(1)
            .returning(|_| Err(JsonHomeError::MalformedDocument("truncated".to_string())));

        assert!(Document::from_json_with("{", &codec).is_err());
    }

    #[test]
    fn test_from_json_with_decoded_tree() {
        let mut codec = MockCodec::new();
        codec
            .expect_decode()
            .withf(|text| text == "opaque")
            .returning(|_| Ok(json!({"resources": {"relation": {"href": "/x"}}})));

        let doc = Document::from_json_with("opaque", &codec).unwrap();
        assert_eq!(doc.get_uri("relation", &[("a", "b")]).unwrap(), "/x");
    }
}
