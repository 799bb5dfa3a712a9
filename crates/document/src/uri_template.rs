//! URI template expansion
//!
//! Supports the two expression forms json-home hints rely on:
//! - `{name}` simple expansion; the variable is required
//! - `{/name}` path-segment expansion; an unbound variable drops the segment
//!
//! Both forms accept comma-separated variable lists (`{/a,b}`). Other
//! operators are kept verbatim so the template still parses and re-renders,
//! but expanding one fails.

use jsonhome_common::{JsonHomeError, Result};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::borrow::Borrow;
use std::collections::{BTreeMap, HashMap};
use std::hash::{BuildHasher, Hash};

/// Everything outside `A-Za-z0-9-._~` is percent-encoded
const UNRESERVED: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Source of variable values for expansion
pub trait Bindings {
    fn lookup(&self, name: &str) -> Option<&str>;
}

impl<K, V, S> Bindings for HashMap<K, V, S>
where
    K: Borrow<str> + Eq + Hash,
    V: AsRef<str>,
    S: BuildHasher,
{
    fn lookup(&self, name: &str) -> Option<&str> {
        self.get(name).map(AsRef::as_ref)
    }
}

impl<K, V> Bindings for BTreeMap<K, V>
where
    K: Borrow<str> + Ord,
    V: AsRef<str>,
{
    fn lookup(&self, name: &str) -> Option<&str> {
        self.get(name).map(AsRef::as_ref)
    }
}

impl<K, V> Bindings for [(K, V)]
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    fn lookup(&self, name: &str) -> Option<&str> {
        self.iter()
            .find(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_ref())
    }
}

impl<K, V, const N: usize> Bindings for [(K, V); N]
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    fn lookup(&self, name: &str) -> Option<&str> {
        self.as_slice().lookup(name)
    }
}

impl<K, V> Bindings for Vec<(K, V)>
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    fn lookup(&self, name: &str) -> Option<&str> {
        self.as_slice().lookup(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operator {
    Simple,
    PathSegment,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Part {
    Literal(String),
    Expression {
        operator: Operator,
        names: Vec<String>,
    },
    /// Expression with an operator outside the supported forms, body verbatim
    Opaque(String),
}

/// A parsed URI template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UriTemplate {
    source: String,
    parts: Vec<Part>,
}

impl UriTemplate {
    /// Parse a template string
    ///
    /// Fails with `InvalidResource` on an unterminated or empty expression.
    /// Expressions outside the supported forms (other operators, modifiers
    /// such as `{id*}`) are kept verbatim.
    pub fn parse(template: &str) -> Result<Self> {
        let mut parts = Vec::new();
        let mut rest = template;

        while let Some(open) = rest.find('{') {
            if open > 0 {
                parts.push(Part::Literal(rest[..open].to_string()));
            }

            let after = &rest[open + 1..];
            let close = after.find('}').ok_or_else(|| {
                JsonHomeError::InvalidResource(format!(
                    "unterminated expression in template '{}'",
                    template
                ))
            })?;

            parts.push(parse_expression(&after[..close], template)?);
            rest = &after[close + 1..];
        }

        if !rest.is_empty() {
            parts.push(Part::Literal(rest.to_string()));
        }

        Ok(Self {
            source: template.to_string(),
            parts,
        })
    }

    /// The template text this was parsed from
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Variable names referenced by the template, in order of appearance
    pub fn variables(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for part in &self.parts {
            if let Part::Expression { names: vars, .. } = part {
                for name in vars {
                    if !names.contains(&name.as_str()) {
                        names.push(name);
                    }
                }
            }
        }
        names
    }

    /// Whether the template references `name`
    pub fn references(&self, name: &str) -> bool {
        self.parts.iter().any(|part| match part {
            Part::Expression { names, .. } => names.iter().any(|n| n == name),
            Part::Literal(_) | Part::Opaque(_) => false,
        })
    }

    /// First expression whose operator cannot be expanded, as written
    pub fn unsupported_expression(&self) -> Option<&str> {
        self.parts.iter().find_map(|part| match part {
            Part::Opaque(body) => Some(body.as_str()),
            _ => None,
        })
    }

    /// Expand against `bindings`; unreferenced bindings are ignored
    pub fn expand<B: Bindings + ?Sized>(&self, bindings: &B) -> Result<String> {
        let mut uri = String::with_capacity(self.source.len());

        for part in &self.parts {
            match part {
                Part::Literal(text) => uri.push_str(text),
                Part::Opaque(body) => {
                    return Err(JsonHomeError::InvalidResource(format!(
                        "cannot expand unsupported expression '{{{}}}' of template '{}'",
                        body, self.source
                    )))
                }
                Part::Expression {
                    operator: Operator::Simple,
                    names,
                } => {
                    for (i, name) in names.iter().enumerate() {
                        let value = bindings
                            .lookup(name)
                            .ok_or_else(|| JsonHomeError::MissingVariable(name.clone()))?;
                        if i > 0 {
                            uri.push(',');
                        }
                        uri.extend(utf8_percent_encode(value, UNRESERVED));
                    }
                }
                Part::Expression {
                    operator: Operator::PathSegment,
                    names,
                } => {
                    for value in names.iter().filter_map(|name| bindings.lookup(name)) {
                        uri.push('/');
                        uri.extend(utf8_percent_encode(value, UNRESERVED));
                    }
                }
            }
        }

        tracing::trace!(template = %self.source, uri = %uri, "expanded template");
        Ok(uri)
    }
}

fn parse_expression(body: &str, template: &str) -> Result<Part> {
    let (operator, list) = match body.chars().next() {
        Some('/') => (Operator::PathSegment, &body[1..]),
        Some(c) if is_var_char(c) => (Operator::Simple, body),
        Some(_) => return Ok(Part::Opaque(body.to_string())),
        None => {
            return Err(JsonHomeError::InvalidResource(format!(
                "empty expression in template '{}'",
                template
            )))
        }
    };

    let names: Vec<String> = list.split(',').map(str::to_string).collect();
    if names.iter().any(|n| n.is_empty() || !n.chars().all(is_var_char)) {
        return Ok(Part::Opaque(body.to_string()));
    }

    Ok(Part::Expression { operator, names })
}

fn is_var_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '.' || c == '%'
}

/// Expand `template` against `bindings` in one step
pub fn expand<B: Bindings + ?Sized>(template: &str, bindings: &B) -> Result<String> {
    UriTemplate::parse(template)?.expand(bindings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_segment_expansion() {
        assert_eq!(
            expand("/widgets{/widget_id}", &[("widget_id", "1234")]).unwrap(),
            "/widgets/1234"
        );
    }

    #[test]
    fn test_unbound_path_segment_disappears() {
        let empty: [(&str, &str); 0] = [];
        assert_eq!(expand("/widgets{/widget_id}", &empty).unwrap(), "/widgets");
    }

    #[test]
    fn test_simple_expansion_requires_binding() {
        let empty: [(&str, &str); 0] = [];
        let err = expand("/items{id}", &empty).unwrap_err();
        assert!(matches!(err, JsonHomeError::MissingVariable(ref name) if name == "id"));
    }

    #[test]
    fn test_simple_expansion_percent_encodes_reserved() {
        let uri = expand("/search?q={term}", &[("term", "a b/c?d#e[f]{g}%")]).unwrap();
        assert_eq!(uri, "/search?q=a%20b%2Fc%3Fd%23e%5Bf%5D%7Bg%7D%25");
    }

    #[test]
    fn test_unreserved_left_untouched() {
        let uri = expand("{v}", &[("v", "Az09-._~")]).unwrap();
        assert_eq!(uri, "Az09-._~");
    }

    #[test]
    fn test_path_segment_encodes_value_slash_only() {
        let uri = expand("/files{/path}", &[("path", "a/b")]).unwrap();
        assert_eq!(uri, "/files/a%2Fb");
    }

    #[test]
    fn test_variable_lists() {
        let bindings = [("a", "1"), ("c", "3")];
        assert_eq!(expand("/x{/a,b,c}", &bindings).unwrap(), "/x/1/3");
        assert_eq!(expand("/x/{a,c}", &bindings).unwrap(), "/x/1,3");
    }

    #[test]
    fn test_extra_bindings_ignored() {
        let mut bindings = HashMap::new();
        bindings.insert("id".to_string(), "7".to_string());
        bindings.insert("unused".to_string(), "x".to_string());
        assert_eq!(expand("/items/{id}", &bindings).unwrap(), "/items/7");
    }

    #[test]
    fn test_variables_in_order_without_duplicates() {
        let template = UriTemplate::parse("/a/{x}{/y}/b/{x}").unwrap();
        assert_eq!(template.variables(), vec!["x", "y"]);
        assert!(template.references("y"));
        assert!(!template.references("z"));
    }

    #[test]
    fn test_invalid_templates() {
        assert!(UriTemplate::parse("/widgets{/id").is_err());
        assert!(UriTemplate::parse("/widgets{}").is_err());
        assert_eq!(
            UriTemplate::parse("/widgets{/a,}")
                .unwrap()
                .unsupported_expression(),
            Some("/a,")
        );
    }

    #[test]
    fn test_unsupported_operator_parses_but_does_not_expand() {
        let template = UriTemplate::parse("/search{?q}").unwrap();
        assert_eq!(template.as_str(), "/search{?q}");
        assert_eq!(template.unsupported_expression(), Some("?q"));
        assert!(template.variables().is_empty());

        let err = template.expand(&[("q", "x")]).unwrap_err();
        assert!(matches!(err, JsonHomeError::InvalidResource(_)));
    }

    #[test]
    fn test_literal_only() {
        let template = UriTemplate::parse("/plain/path").unwrap();
        assert!(template.variables().is_empty());
        let empty: [(&str, &str); 0] = [];
        assert_eq!(template.expand(&empty).unwrap(), "/plain/path");
    }
}
