//! json-home document model
//!
//! Builds, serializes, parses and queries json-home documents: catalogs of
//! API resources keyed by link relation, each carrying a fixed URI or a URI
//! template plus usage hints.
//!
//! ## Producing a catalog
//! ```rust
//! use jsonhome_document::{Document, HintOptions, ResourceOptions};
//! use std::collections::BTreeMap;
//!
//! let mut doc = Document::new();
//! doc.create_resource(
//!     "http://mysite.com/rel/widgets",
//!     ResourceOptions {
//!         href_template: Some("/widgets{/widget_id}".to_string()),
//!         href_vars: BTreeMap::from([(
//!             "widget_id".to_string(),
//!             "http://mysite.com/param/widget".to_string(),
//!         )]),
//!         hints: HintOptions {
//!             allow_get: true,
//!             accept_post: vec!["application/json".to_string()],
//!             ..Default::default()
//!         },
//!         ..Default::default()
//!     },
//! )?;
//! let json = doc.to_json()?;
//! # Ok::<(), jsonhome_document::JsonHomeError>(())
//! ```
//!
//! ## Consuming a catalog
//! ```rust
//! use jsonhome_document::Document;
//!
//! let doc = Document::from_json(
//!     r#"{"resources": {"http://mysite.com/rel/widgets": {"href-template": "/widgets{/widget_id}"}}}"#,
//! )?;
//! let uri = doc.get_uri("http://mysite.com/rel/widgets", &[("widget_id", "1234")])?;
//! assert_eq!(uri, "/widgets/1234");
//! # Ok::<(), jsonhome_document::JsonHomeError>(())
//! ```

pub mod codec;
mod document;
pub mod hints;
mod resource;
pub mod uri_template;

pub use codec::{Codec, JsonCodec};
pub use document::Document;
pub use hints::{HintOptions, Hints};
pub use resource::{Location, Resource, ResourceOptions};
pub use uri_template::{Bindings, UriTemplate};

pub use jsonhome_common::{HintStatus, JsonHomeError, Result, MEDIA_TYPE};
