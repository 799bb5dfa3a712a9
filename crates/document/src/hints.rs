//! Resource hints
//!
//! Hints describe how a resource may be used without guaranteeing it. They
//! are built from a flat [`HintOptions`] set on the producer side and parsed
//! from the nested `hints` object on the consumer side.
//!
//! ## Normalization
//!
//! Building from options applies one derivation step: a non-empty
//! `accept_post`, `accept_put` or `accept_patch` list adds `POST`, `PUT` or
//! `PATCH` to `allow`. Parsed wire hints are taken as they are.

use jsonhome_common::{method, HintStatus, JsonHomeError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Flat hint configuration used when building a resource
///
/// Every recognized option is a field; unknown keys are rejected by
/// [`HintOptions::from_value`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HintOptions {
    pub allow_get: bool,
    pub allow_post: bool,
    pub allow_put: bool,
    pub allow_delete: bool,
    pub allow_patch: bool,
    pub allow_head: bool,
    pub allow_options: bool,

    /// Request formats accepted by POST
    pub accept_post: Vec<String>,

    /// Request formats accepted by PUT
    pub accept_put: Vec<String>,

    /// Patch formats accepted by PATCH (equivalent to `Accept-Patch`)
    pub accept_patch: Vec<String>,

    /// Preferences supported by the resource
    pub accept_prefer: Vec<String>,

    /// Range units (equivalent to `Accept-Ranges`)
    pub accept_ranges: Vec<String>,

    /// Preconditions required for state-changing requests
    pub precondition_req: Vec<String>,

    /// Authentication schemes required
    pub auth_req: Vec<String>,

    /// Human-readable documentation
    pub docs: Option<String>,

    pub status: HintStatus,
}

impl HintOptions {
    /// Every recognized option key
    pub const KEYS: &'static [&'static str] = &[
        "allow_get",
        "allow_post",
        "allow_put",
        "allow_delete",
        "allow_patch",
        "allow_head",
        "allow_options",
        "accept_post",
        "accept_put",
        "accept_patch",
        "accept_prefer",
        "accept_ranges",
        "precondition_req",
        "auth_req",
        "docs",
        "status",
    ];

    /// Load options from a generic key/value tree
    ///
    /// Fails with `UnknownHintOption` naming every unrecognized key, or with
    /// `InvalidHint` when a recognized key carries a value of the wrong type.
    pub fn from_value(value: &Value) -> Result<Self> {
        let object = value.as_object().ok_or_else(|| {
            JsonHomeError::InvalidHint(format!("hint options must be an object, got {}", value))
        })?;

        let unknown: Vec<String> = object
            .keys()
            .filter(|key| !Self::KEYS.contains(&key.as_str()))
            .cloned()
            .collect();
        if !unknown.is_empty() {
            return Err(JsonHomeError::UnknownHintOption(unknown));
        }

        serde_json::from_value(value.clone())
            .map_err(|e| JsonHomeError::InvalidHint(format!("invalid hint option: {}", e)))
    }
}

/// Normalized hints of one resource
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hints {
    /// `None` when no `allow` hint is present; an empty set is a present, empty list
    allow: Option<BTreeSet<String>>,
    accept_post: Vec<String>,
    accept_put: Vec<String>,
    accept_patch: Vec<String>,
    accept_prefer: Vec<String>,
    accept_ranges: Vec<String>,
    precondition_req: Vec<String>,
    auth_req: Vec<String>,
    docs: Option<String>,
    status: HintStatus,

    /// Wire hints outside the modeled set, kept for re-emission
    extensions: Map<String, Value>,
}

impl Hints {
    /// Build hints from flat options, applying method derivation
    pub fn from_flags(options: HintOptions) -> Self {
        let flags = [
            (options.allow_get, method::GET),
            (options.allow_post, method::POST),
            (options.allow_put, method::PUT),
            (options.allow_delete, method::DELETE),
            (options.allow_patch, method::PATCH),
            (options.allow_head, method::HEAD),
            (options.allow_options, method::OPTIONS),
        ];

        let allow: BTreeSet<String> = flags
            .iter()
            .filter(|(enabled, _)| *enabled)
            .map(|(_, m)| m.to_string())
            .collect();

        let mut hints = Self {
            allow: Some(allow).filter(|methods| !methods.is_empty()),
            accept_post: options.accept_post,
            accept_put: options.accept_put,
            accept_patch: options.accept_patch,
            accept_prefer: options.accept_prefer,
            accept_ranges: options.accept_ranges,
            precondition_req: options.precondition_req,
            auth_req: options.auth_req,
            docs: options.docs,
            status: options.status,
            extensions: Map::new(),
        };
        hints.derive_allowed_methods();
        hints
    }

    /// Union the methods implied by accept lists into `allow`
    fn derive_allowed_methods(&mut self) {
        let implied = [
            (&self.accept_post, method::POST),
            (&self.accept_put, method::PUT),
            (&self.accept_patch, method::PATCH),
        ];
        let derived: Vec<&str> = implied
            .iter()
            .filter(|(accepts, m)| {
                !accepts.is_empty()
                    && !self
                        .allow
                        .as_ref()
                        .is_some_and(|methods| methods.contains(*m))
            })
            .map(|(_, m)| *m)
            .collect();

        for m in derived {
            tracing::trace!(method = m, "deriving allowed method from accept list");
            self.allow
                .get_or_insert_with(BTreeSet::new)
                .insert(m.to_string());
        }
    }

    /// Parse the wire `hints` object
    ///
    /// Missing keys mean empty; a present key of the wrong shape fails with
    /// `InvalidHint`. Method tokens are normalized to uppercase.
    pub fn from_wire(value: &Value) -> Result<Self> {
        let object = value.as_object().ok_or_else(|| {
            JsonHomeError::InvalidHint(format!("hints must be an object, got {}", value))
        })?;

        let mut hints = Self::default();
        for (key, value) in object {
            match key.as_str() {
                "allow" => {
                    hints.allow = Some(
                        string_list(key, value)?
                            .into_iter()
                            .map(|m| m.to_ascii_uppercase())
                            .collect(),
                    );
                }
                "accept-post" => hints.accept_post = string_list(key, value)?,
                "accept-put" => hints.accept_put = string_list(key, value)?,
                "accept-patch" => hints.accept_patch = string_list(key, value)?,
                "accept-prefer" => hints.accept_prefer = string_list(key, value)?,
                "accept-ranges" => hints.accept_ranges = string_list(key, value)?,
                "precondition-req" => hints.precondition_req = string_list(key, value)?,
                "auth-req" => hints.auth_req = string_list(key, value)?,
                "docs" => {
                    let docs = value.as_str().ok_or_else(|| {
                        JsonHomeError::InvalidHint(format!("'docs' must be a string, got {}", value))
                    })?;
                    hints.docs = Some(docs.to_string());
                }
                "status" => {
                    hints.status = value
                        .as_str()
                        .and_then(HintStatus::from_wire)
                        .ok_or_else(|| {
                            JsonHomeError::InvalidHint(format!(
                                "'status' must be \"deprecated\" or \"gone\", got {}",
                                value
                            ))
                        })?;
                }
                _ => {
                    hints.extensions.insert(key.clone(), value.clone());
                }
            }
        }

        Ok(hints)
    }

    /// Render the wire `hints` object in canonical key order
    pub fn to_wire(&self) -> Value {
        let mut object = Map::new();

        if let Some(allow) = &self.allow {
            object.insert("allow".to_string(), string_array(allow.iter()));
        }

        let lists = [
            ("accept-post", &self.accept_post),
            ("accept-put", &self.accept_put),
            ("accept-patch", &self.accept_patch),
            ("accept-prefer", &self.accept_prefer),
            ("accept-ranges", &self.accept_ranges),
            ("precondition-req", &self.precondition_req),
            ("auth-req", &self.auth_req),
        ];
        for (key, list) in lists {
            if !list.is_empty() {
                object.insert(key.to_string(), string_array(list.iter()));
            }
        }

        if let Some(docs) = &self.docs {
            object.insert("docs".to_string(), Value::String(docs.clone()));
        }
        if let Some(status) = self.status.as_wire() {
            object.insert("status".to_string(), Value::String(status.to_string()));
        }

        for (key, value) in &self.extensions {
            object.insert(key.clone(), value.clone());
        }

        Value::Object(object)
    }

    /// Whether rendering would produce an empty object
    pub fn is_empty(&self) -> bool {
        self.allow.is_none()
            && self.accept_post.is_empty()
            && self.accept_put.is_empty()
            && self.accept_patch.is_empty()
            && self.accept_prefer.is_empty()
            && self.accept_ranges.is_empty()
            && self.precondition_req.is_empty()
            && self.auth_req.is_empty()
            && self.docs.is_none()
            && self.status.is_unspecified()
            && self.extensions.is_empty()
    }

    /// Case-insensitive test of `method` against `allow`
    ///
    /// Returns `None` when no `allow` hint is present at all; a present but
    /// empty list allows nothing.
    pub fn is_allowed(&self, method: &str) -> Option<bool> {
        self.allow
            .as_ref()
            .map(|methods| methods.contains(&method.to_ascii_uppercase()))
    }

    /// Allowed methods in alphabetical order
    pub fn allow(&self) -> impl Iterator<Item = &str> {
        self.allow.iter().flatten().map(String::as_str)
    }

    pub fn accept_post(&self) -> &[String] {
        &self.accept_post
    }

    pub fn accept_put(&self) -> &[String] {
        &self.accept_put
    }

    pub fn accept_patch(&self) -> &[String] {
        &self.accept_patch
    }

    pub fn accept_prefer(&self) -> &[String] {
        &self.accept_prefer
    }

    pub fn accept_ranges(&self) -> &[String] {
        &self.accept_ranges
    }

    pub fn precondition_req(&self) -> &[String] {
        &self.precondition_req
    }

    pub fn auth_req(&self) -> &[String] {
        &self.auth_req
    }

    pub fn docs(&self) -> Option<&str> {
        self.docs.as_deref()
    }

    pub fn status(&self) -> HintStatus {
        self.status
    }
}

fn string_list(key: &str, value: &Value) -> Result<Vec<String>> {
    let invalid = || {
        JsonHomeError::InvalidHint(format!(
            "'{}' must be a list of strings, got {}",
            key, value
        ))
    };

    value
        .as_array()
        .ok_or_else(invalid)?
        .iter()
        .map(|item| item.as_str().map(str::to_string).ok_or_else(invalid))
        .collect()
}

fn string_array<'a>(items: impl Iterator<Item = &'a String>) -> Value {
    Value::Array(items.map(|s| Value::String(s.clone())).collect())
}
