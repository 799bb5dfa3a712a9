//! A single catalog entry

use crate::hints::{HintOptions, Hints};
use crate::uri_template::{Bindings, UriTemplate};
use jsonhome_common::{JsonHomeError, Result};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Options for building a [`Resource`]
///
/// Exactly one of `href` and `href_template` must be set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceOptions {
    /// Fixed URI of the resource
    pub href: Option<String>,

    /// URI template of the resource
    pub href_template: Option<String>,

    /// Variable descriptor URI for each template placeholder
    pub href_vars: BTreeMap<String, String>,

    pub hints: HintOptions,
}

impl ResourceOptions {
    /// Load options from a flat key/value tree
    ///
    /// `href`, `href_template` and `href_vars` set the location; every other
    /// key is a hint option.
    pub fn from_value(value: &Value) -> Result<Self> {
        let object = value.as_object().ok_or_else(|| {
            JsonHomeError::InvalidResource(format!(
                "resource options must be an object, got {}",
                value
            ))
        })?;

        let mut options = Self::default();
        let mut hint_options = Map::new();

        for (key, value) in object {
            match key.as_str() {
                "href" => options.href = Some(string_field(key, value)?),
                "href_template" => options.href_template = Some(string_field(key, value)?),
                "href_vars" => options.href_vars = string_map(key, value)?.into_iter().collect(),
                _ => {
                    hint_options.insert(key.clone(), value.clone());
                }
            }
        }

        options.hints = HintOptions::from_value(&Value::Object(hint_options))?;
        Ok(options)
    }
}

/// Where a resource lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    Href(String),
    Template {
        template: UriTemplate,
        /// Variable descriptors in document order
        vars: Vec<(String, String)>,
    },
}

/// One resource of a json-home document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    rel: String,
    location: Location,
    hints: Hints,
}

impl Resource {
    /// Build a resource from options
    ///
    /// Fails with `InvalidResource` when both or neither of `href` and
    /// `href_template` are given, when the template does not parse or uses an
    /// expression that cannot be expanded, or when `href_vars` names a
    /// variable the template does not reference.
    pub fn create(rel: impl Into<String>, options: ResourceOptions) -> Result<Self> {
        let rel = rel.into();
        let location = match (options.href, options.href_template) {
            (Some(_), Some(_)) => {
                return Err(JsonHomeError::InvalidResource(format!(
                    "{}: href and href_template are mutually exclusive",
                    rel
                )))
            }
            (None, None) => {
                return Err(JsonHomeError::InvalidResource(format!(
                    "{}: one of href or href_template is required",
                    rel
                )))
            }
            (Some(href), None) => {
                if !options.href_vars.is_empty() {
                    return Err(JsonHomeError::InvalidResource(format!(
                        "{}: href_vars given without href_template",
                        rel
                    )));
                }
                Location::Href(href)
            }
            (None, Some(template)) => {
                let template = UriTemplate::parse(&template)?;
                if let Some(expression) = template.unsupported_expression() {
                    return Err(JsonHomeError::InvalidResource(format!(
                        "{}: unsupported expression '{{{}}}' in template '{}'",
                        rel,
                        expression,
                        template.as_str()
                    )));
                }
                let unreferenced: Vec<&str> = options
                    .href_vars
                    .keys()
                    .map(String::as_str)
                    .filter(|name| !template.references(name))
                    .collect();
                if !unreferenced.is_empty() {
                    return Err(JsonHomeError::InvalidResource(format!(
                        "{}: href_vars not referenced by template '{}': {}",
                        rel,
                        template.as_str(),
                        unreferenced.join(", ")
                    )));
                }
                Location::Template {
                    template,
                    vars: options.href_vars.into_iter().collect(),
                }
            }
        };

        Ok(Self {
            rel,
            location,
            hints: Hints::from_flags(options.hints),
        })
    }

    /// Parse one entry of the wire `resources` object
    pub fn from_wire(rel: impl Into<String>, value: &Value) -> Result<Self> {
        let rel = rel.into();
        let object = value.as_object().ok_or_else(|| {
            JsonHomeError::InvalidResource(format!("{}: resource must be an object", rel))
        })?;

        let href = object.get("href");
        let template = object.get("href-template");

        let location = match (href, template) {
            (Some(_), Some(_)) => {
                return Err(JsonHomeError::InvalidResource(format!(
                    "{}: both href and href-template present",
                    rel
                )))
            }
            (None, None) => {
                return Err(JsonHomeError::InvalidResource(format!(
                    "{}: neither href nor href-template present",
                    rel
                )))
            }
            (Some(href), None) => Location::Href(string_field("href", href)?),
            (None, Some(template)) => {
                let template = UriTemplate::parse(&string_field("href-template", template)?)?;
                let vars = match object.get("href-vars") {
                    Some(vars) => string_map("href-vars", vars)?,
                    None => Vec::new(),
                };
                Location::Template { template, vars }
            }
        };

        let hints = match object.get("hints") {
            Some(hints) => Hints::from_wire(hints)?,
            None => Hints::default(),
        };

        Ok(Self {
            rel,
            location,
            hints,
        })
    }

    /// Render the wire form of this resource
    pub fn to_wire(&self) -> Value {
        let mut object = Map::new();

        match &self.location {
            Location::Href(href) => {
                object.insert("href".to_string(), Value::String(href.clone()));
            }
            Location::Template { template, vars } => {
                object.insert(
                    "href-template".to_string(),
                    Value::String(template.as_str().to_string()),
                );
                let vars: Map<String, Value> = vars
                    .iter()
                    .map(|(name, uri)| (name.clone(), Value::String(uri.clone())))
                    .collect();
                object.insert("href-vars".to_string(), Value::Object(vars));
            }
        }

        if !self.hints.is_empty() {
            object.insert("hints".to_string(), self.hints.to_wire());
        }

        Value::Object(object)
    }

    /// Resolve the concrete URI of this resource
    ///
    /// A fixed `href` is returned unchanged and bindings are ignored.
    pub fn resolve<B: Bindings + ?Sized>(&self, bindings: &B) -> Result<String> {
        match &self.location {
            Location::Href(href) => Ok(href.clone()),
            Location::Template { template, .. } => template.expand(bindings),
        }
    }

    pub fn rel(&self) -> &str {
        &self.rel
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn href(&self) -> Option<&str> {
        match &self.location {
            Location::Href(href) => Some(href),
            Location::Template { .. } => None,
        }
    }

    pub fn href_template(&self) -> Option<&str> {
        match &self.location {
            Location::Template { template, .. } => Some(template.as_str()),
            Location::Href(_) => None,
        }
    }

    /// Variable descriptors; empty for a fixed `href`
    pub fn href_vars(&self) -> impl Iterator<Item = (&str, &str)> {
        let vars: &[(String, String)] = match &self.location {
            Location::Template { vars, .. } => vars,
            Location::Href(_) => &[],
        };
        vars.iter().map(|(name, uri)| (name.as_str(), uri.as_str()))
    }

    pub fn hints(&self) -> &Hints {
        &self.hints
    }

    /// See [`Hints::is_allowed`]
    pub fn is_allowed(&self, method: &str) -> Option<bool> {
        self.hints.is_allowed(method)
    }
}

fn string_field(key: &str, value: &Value) -> Result<String> {
    value.as_str().map(str::to_string).ok_or_else(|| {
        JsonHomeError::InvalidResource(format!("'{}' must be a string, got {}", key, value))
    })
}

fn string_map(key: &str, value: &Value) -> Result<Vec<(String, String)>> {
    let invalid = || {
        JsonHomeError::InvalidResource(format!(
            "'{}' must map names to strings, got {}",
            key, value
        ))
    };

    value
        .as_object()
        .ok_or_else(invalid)?
        .iter()
        .map(|(name, uri)| {
            uri.as_str()
                .map(|uri| (name.clone(), uri.to_string()))
                .ok_or_else(invalid)
        })
        .collect()
}
