//! JSON text codec seam
//!
//! The document model works on `serde_json::Value` trees; turning those into
//! text and back goes through a [`Codec`].

use jsonhome_common::Result;
use serde_json::Value;

/// Converts between JSON text and a generic value tree
#[cfg_attr(test, mockall::automock)]
pub trait Codec {
    fn decode(&self, text: &str) -> Result<Value>;

    /// Encode `value`, keeping object keys in their stored order
    fn encode(&self, value: &Value) -> Result<String>;
}

/// `serde_json` backed codec
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JsonCodec {
    pretty: bool,
}

impl JsonCodec {
    /// Compact output, no insignificant whitespace
    pub fn compact() -> Self {
        Self { pretty: false }
    }

    /// Two-space indented output
    pub fn pretty() -> Self {
        Self { pretty: true }
    }
}

impl Codec for JsonCodec {
    fn decode(&self, text: &str) -> Result<Value> {
        Ok(serde_json::from_str(text)?)
    }

    fn encode(&self, value: &Value) -> Result<String> {
        let text = if self.pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };
        Ok(text)
    }
}
