//! Structural schema for documents.
//!
//! A [`Schema`] lists the tags a document may contain and the attributes
//! each tag requires. Validation is a boundary concern: the decoder performs
//! its own checks, the schema only lets callers reject foreign documents
//! before decoding and report every problem at once.

use crate::document::{Document, Element};
use crate::expr::{NodeFamily, NodeKind};
use crate::types::{MemberKind, Primitive};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// When the transformer runs schema validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SchemaValidation {
    /// Validate; a missing schema is an error.
    Always,
    Never,
    /// Validate only when a schema is configured.
    #[default]
    IfSchemaPresent,
}

impl SchemaValidation {
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "always" => Some(SchemaValidation::Always),
            "never" => Some(SchemaValidation::Never),
            "if-schema-present" => Some(SchemaValidation::IfSchemaPresent),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaError {
    /// Slash-separated tags from the root to the offending element.
    pub path: String,
    pub message: String,
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    tags: HashMap<String, Vec<String>>,
    /// Tags whose content belongs to someone else and is not checked.
    opaque: HashSet<String>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow `tag`, requiring `attributes` on it.
    pub fn with_tag(mut self, tag: &str, attributes: &[&str]) -> Self {
        self.tags.insert(
            tag.to_string(),
            attributes.iter().map(|a| a.to_string()).collect(),
        );
        self
    }

    /// Allow `tag` without looking inside it.
    pub fn with_opaque_tag(mut self, tag: &str, attributes: &[&str]) -> Self {
        self.opaque.insert(tag.to_string());
        self.with_tag(tag, attributes)
    }

    pub fn allows(&self, tag: &str) -> bool {
        self.tags.contains_key(tag)
    }

    /// The vocabulary the encoder writes.
    pub fn builtin() -> Self {
        let mut schema = Schema::new().with_tag(crate::document::ROOT_TAG, &[]);

        for &kind in NodeKind::ALL {
            let required: &[&str] = match (kind.family(), kind) {
                (_, NodeKind::Constant | NodeKind::Parameter) => continue,
                (_, NodeKind::DebugInfo | NodeKind::Dynamic)
                | (_, NodeKind::Extension | NodeKind::RuntimeVariables) => continue,
                (NodeFamily::TypeBinary, _) => &["type", "type-operand"],
                (NodeFamily::NewArray, _) => &["type", "element-type"],
                (_, NodeKind::Goto) => &["type", "goto-kind"],
                _ => &["type"],
            };
            schema = schema.with_tag(kind.tag(), required);
        }

        for primitive in Primitive::ALL {
            if let Some(tag) = primitive.literal_tag() {
                schema = schema.with_tag(tag, &[]);
            }
        }
        schema = schema
            .with_tag("null", &["type"])
            .with_tag("nullable", &["type"])
            .with_tag("enum", &["type"])
            .with_tag("bytes", &["length"])
            .with_tag("collection", &["type"])
            .with_tag("dictionary", &["type"])
            .with_tag("entry", &[])
            .with_tag("key", &[])
            .with_tag("value", &[])
            .with_tag("tuple", &["type"])
            .with_tag("item", &["name", "type"])
            .with_tag("record", &["type"])
            .with_opaque_tag("object", &[]);

        for kind in MemberKind::ALL {
            schema = schema.with_tag(kind.tag(), &["name"]);
        }
        schema = schema
            .with_tag("parameter", &["type"])
            .with_tag("parameter-definition", &["id", "name", "type"])
            .with_tag("parameter-reference", &["idref"])
            .with_tag("label-definition", &["id", "type"])
            .with_tag("label-reference", &["idref"])
            .with_tag("catch", &["test-type"]);

        const WRAPPERS: [&str; 26] = [
            "parameters",
            "body",
            "arguments",
            "bindings",
            "variables",
            "indexes",
            "bounds",
            "cases",
            "case",
            "case-values",
            "finally",
            "fault",
            "element-init",
            "initializers",
            "array-elements",
            "instance",
            "conversion",
            "filter",
            "default-body",
            "break-label",
            "continue-label",
            "expressions",
            "members",
            "member-assignment",
            "member-member-binding",
            "member-list-binding",
        ];
        for wrapper in WRAPPERS {
            schema = schema.with_tag(wrapper, &[]);
        }
        schema
    }
}

/// Check `document` against `schema`, reporting every violation.
pub fn validate(document: &Document, schema: &Schema) -> Vec<SchemaError> {
    let mut errors = Vec::new();
    let mut stack: Vec<(&Element, String)> =
        vec![(&document.root, format!("/{}", document.root.name))];

    while let Some((element, path)) = stack.pop() {
        let Some(required) = schema.tags.get(&element.name) else {
            errors.push(SchemaError {
                path,
                message: format!("unknown tag <{}>", element.name),
            });
            continue;
        };
        for attribute in required {
            if element.attr(attribute).is_none() {
                errors.push(SchemaError {
                    path: path.clone(),
                    message: format!("missing required attribute '{attribute}'"),
                });
            }
        }
        if schema.opaque.contains(&element.name) {
            continue;
        }
        let children: Vec<&Element> = element.elements().collect();
        for child in children.into_iter().rev() {
            stack.push((child, format!("{path}/{}", child.name)));
        }
    }
    errors
}
