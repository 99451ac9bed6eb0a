//! The generic document tree that crosses the core/boundary seam.
//!
//! Tag name, ordered string attributes, ordered children, optional text and
//! comments. The encoder produces it, the decoder consumes it, and the
//! formats in [`crate::formats`] turn it into bytes and back.

use crate::error::{Result, TransformError};
use serde::{Deserialize, Serialize};

/// Tag of the document root.
pub const ROOT_TAG: &str = "expression";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Node {
    Element(Element),
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Element {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<(String, String)>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Element {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Set an attribute, replacing an earlier value with the same key.
    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((key, value)),
        }
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(key, value);
        self
    }

    /// Set a boolean flag attribute. Only `true` is written.
    pub fn with_flag(mut self, key: &str, value: bool) -> Self {
        if value {
            self.set_attr(key, "true");
        }
        self
    }

    pub fn push(&mut self, child: Element) {
        self.children.push(Node::Element(child));
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.push(child);
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = Element>) -> Self {
        self.children
            .extend(children.into_iter().map(Node::Element));
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    pub fn with_comment(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Comment(text.into()));
        self
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn required_attr(&self, key: &str) -> Result<&str> {
        self.attr(key)
            .ok_or_else(|| TransformError::missing_attribute(&self.name, key))
    }

    /// Read a boolean flag; absent means `false`.
    pub fn flag(&self, key: &str) -> Result<bool> {
        match self.attr(key) {
            None | Some("false") => Ok(false),
            Some("true") => Ok(true),
            Some(other) => Err(TransformError::malformed(
                &self.name,
                format!("attribute '{key}' must be true or false, found '{other}'"),
            )),
        }
    }

    /// Read an unsigned count attribute, if present.
    pub fn count_attr(&self, key: &str) -> Result<Option<usize>> {
        self.attr(key)
            .map(|text| {
                text.parse::<usize>().map_err(|_| {
                    TransformError::malformed(
                        &self.name,
                        format!("attribute '{key}' must be a count, found '{text}'"),
                    )
                })
            })
            .transpose()
    }

    /// Concatenated text content of direct text children.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                Node::Text(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Child elements, skipping text and comments.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            _ => None,
        })
    }

    pub fn child(&self, name: &str) -> Option<&Element> {
        self.elements().find(|element| element.name == name)
    }

    pub fn required_child(&self, name: &str) -> Result<&Element> {
        self.child(name)
            .ok_or_else(|| TransformError::missing_child(&self.name, name))
    }

    /// The only child element, as required by single-slot wrappers.
    pub fn single_element(&self) -> Result<&Element> {
        let mut elements = self.elements();
        match (elements.next(), elements.next()) {
            (Some(only), None) => Ok(only),
            (None, _) => Err(TransformError::missing_child(&self.name, "node")),
            (Some(_), Some(extra)) => Err(TransformError::UnknownTag {
                tag: extra.name.clone(),
                parent: self.name.clone(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub root: Element,
}

impl Document {
    pub fn new(root: Element) -> Self {
        Document { root }
    }

    /// Wrap an encoded node in the `<expression>` root.
    pub fn wrap(node: Element) -> Self {
        Document {
            root: Element::new(ROOT_TAG).with_child(node),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_attr_replaces_existing_value() {
        let element = Element::new("int").with_attr("a", "1").with_attr("a", "2");
        assert_eq!(element.attributes, vec![("a".to_string(), "2".to_string())]);
    }

    #[test]
    fn flags_only_written_when_true() {
        let element = Element::new("lambda")
            .with_flag("tail-call", false)
            .with_flag("static", true);
        assert_eq!(element.attr("tail-call"), None);
        assert_eq!(element.flag("static"), Ok(true));
        assert_eq!(element.flag("tail-call"), Ok(false));
    }

    #[test]
    fn bad_flag_is_malformed() {
        let element = Element::new("add").with_attr("lifted-to-null", "yes");
        assert!(matches!(
            element.flag("lifted-to-null"),
            Err(TransformError::MalformedLiteral { .. })
        ));
    }

    #[test]
    fn required_lookups_name_the_tag() {
        let element = Element::new("call");
        match element.required_attr("type") {
            Err(TransformError::MissingAttribute { tag, attribute }) => {
                assert_eq!(tag, "call");
                assert_eq!(attribute, "type");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            element.required_child("arguments"),
            Err(TransformError::MissingChild { .. })
        ));
    }

    #[test]
    fn text_ignores_comments() {
        let element = Element::new("nullable")
            .with_comment("int32")
            .with_text("5");
        assert_eq!(element.text(), "5");
    }
}
