//! Common types and utilities for json-home documents
//!
//! This crate contains the error taxonomy, the hint status closed set and the
//! HTTP method tokens shared by the document model and the CLI.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Media type of a json-home document
pub const MEDIA_TYPE: &str = "application/json-home";

/// Errors that can occur while building, parsing or querying a document
#[derive(Error, Debug)]
pub enum JsonHomeError {
    #[error("Invalid resource: {0}")]
    InvalidResource(String),

    #[error("Relation already registered: {0}")]
    DuplicateRelation(String),

    #[error("Unknown resource: {0}")]
    ResourceNotFound(String),

    #[error("Missing value for template variable: {0}")]
    MissingVariable(String),

    #[error("Unknown hint option(s): {}", .0.join(", "))]
    UnknownHintOption(Vec<String>),

    #[error("Invalid hint: {0}")]
    InvalidHint(String),

    #[error("Malformed document: {0}")]
    MalformedDocument(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for json-home operations
pub type Result<T> = std::result::Result<T, JsonHomeError>;

/// HTTP method tokens a resource can hint through `allow`
pub mod method {
    pub const DELETE: &str = "DELETE";
    pub const GET: &str = "GET";
    pub const HEAD: &str = "HEAD";
    pub const OPTIONS: &str = "OPTIONS";
    pub const PATCH: &str = "PATCH";
    pub const POST: &str = "POST";
    pub const PUT: &str = "PUT";
}

/// Lifecycle status hinted for a resource
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HintStatus {
    /// No status hint; omitted from the wire form
    #[default]
    Unspecified,
    Deprecated,
    Gone,
}

impl HintStatus {
    /// Wire token, `None` for [`HintStatus::Unspecified`]
    pub fn as_wire(&self) -> Option<&'static str> {
        match self {
            HintStatus::Unspecified => None,
            HintStatus::Deprecated => Some("deprecated"),
            HintStatus::Gone => Some("gone"),
        }
    }

    /// Parse a wire token; only `deprecated` and `gone` may appear on the wire
    pub fn from_wire(token: &str) -> Option<Self> {
        match token {
            "deprecated" => Some(HintStatus::Deprecated),
            "gone" => Some(HintStatus::Gone),
            _ => None,
        }
    }

    pub fn is_unspecified(&self) -> bool {
        matches!(self, HintStatus::Unspecified)
    }
}

impl fmt::Display for HintStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_wire().unwrap_or("unspecified"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_tokens() {
        assert_eq!(HintStatus::Unspecified.as_wire(), None);
        assert_eq!(HintStatus::from_wire("gone"), Some(HintStatus::Gone));
        assert_eq!(
            HintStatus::from_wire("deprecated"),
            Some(HintStatus::Deprecated)
        );
        assert_eq!(HintStatus::from_wire("unspecified"), None);
        assert_eq!(HintStatus::from_wire("Gone"), None);
    }

    #[test]
    fn test_status_deserializes_lowercase() {
        let status: HintStatus = serde_json::from_str("\"deprecated\"").unwrap();
        assert_eq!(status, HintStatus::Deprecated);
    }

    #[test]
    fn test_unknown_hint_option_lists_every_key() {
        let err = JsonHomeError::UnknownHintOption(vec![
            "variablea".to_string(),
            "variableb".to_string(),
        ]);
        let message = err.to_string();
        assert!(message.contains("variablea"));
        assert!(message.contains("variableb"));
    }
}
