//! Byte boundary for documents: XML parsing, rendering and schema checks.
//!
//! The engine works on [`Document`] values only. This module turns them into
//! bytes and back. Parsing accepts UTF-8 with an optional byte-order mark,
//! keeps comments and drops whitespace-only text between elements. Text of
//! leaf elements is kept verbatim, so string literals survive a round trip.

pub mod schema;

use crate::document::{Document, Element, Node};
use crate::error::FormatError;
use serde::{Deserialize, Serialize};

pub use schema::{validate, Schema, SchemaError, SchemaValidation};

const BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    pub keep_comments: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            keep_comments: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// One level of indentation. Empty renders everything on one line.
    pub indent: String,
    pub xml_declaration: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions {
            indent: "  ".to_string(),
            xml_declaration: true,
        }
    }
}

/// Parse XML bytes into a document.
pub fn parse(bytes: &[u8], options: &ParseOptions) -> Result<Document, FormatError> {
    let bytes = bytes.strip_prefix(BOM).unwrap_or(bytes);
    let source = std::str::from_utf8(bytes)
        .map_err(|e| FormatError::Parse(format!("document is not UTF-8: {e}")))?;
    let xml = roxmltree::Document::parse(source)
        .map_err(|e| FormatError::Parse(e.to_string()))?;
    Ok(Document::new(convert(xml.root_element(), options)))
}

/// An element whose children are still being read.
struct Open<'a, 'input> {
    element: Element,
    children: roxmltree::Children<'a, 'input>,
    has_elements: bool,
}

impl<'a, 'input> Open<'a, 'input> {
    fn new(node: roxmltree::Node<'a, 'input>) -> Self {
        let mut element = Element::new(node.tag_name().name());
        element.attributes = node
            .attributes()
            .map(|attr| (attr.name().to_string(), attr.value().to_string()))
            .collect();
        Open {
            element,
            children: node.children(),
            has_elements: node.children().any(|child| child.is_element()),
        }
    }
}

/// Copy the roxmltree tree without recursion; ancestors wait on `stack`.
fn convert(root: roxmltree::Node<'_, '_>, options: &ParseOptions) -> Element {
    let mut stack: Vec<Open<'_, '_>> = Vec::new();
    let mut current = Open::new(root);
    loop {
        let Some(child) = current.children.next() else {
            match stack.pop() {
                Some(parent) => {
                    let done = std::mem::replace(&mut current, parent);
                    current.element.push(done.element);
                    continue;
                }
                None => return current.element,
            }
        };
        match child.node_type() {
            roxmltree::NodeType::Element => {
                let parent = std::mem::replace(&mut current, Open::new(child));
                stack.push(parent);
            }
            roxmltree::NodeType::Text => {
                let text = child.text().unwrap_or_default();
                if current.has_elements && text.trim().is_empty() {
                    continue;
                }
                current.element.children.push(Node::Text(text.to_string()));
            }
            roxmltree::NodeType::Comment if options.keep_comments => {
                let text = child.text().unwrap_or_default();
                current.element.children.push(Node::Comment(text.to_string()));
            }
            _ => {}
        }
    }
}

/// Render a document as UTF-8 XML.
pub fn render(document: &Document, options: &RenderOptions) -> Vec<u8> {
    let mut out = String::new();
    if options.xml_declaration {
        out.push_str("<?xml version=\"1.0\" encoding=\"utf-8\"?>");
        newline(&mut out, options);
    }
    write_element(&mut out, &document.root, options);
    newline(&mut out, options);
    out.into_bytes()
}

fn newline(out: &mut String, options: &RenderOptions) {
    if !options.indent.is_empty() {
        out.push('\n');
    }
}

enum Step<'d> {
    Open(&'d Element, usize),
    /// A child of a mixed element, on its own line.
    Child(&'d Node, usize),
    Close(&'d Element, usize),
}

fn write_element(out: &mut String, root: &Element, options: &RenderOptions) {
    let mut steps = vec![Step::Open(root, 0)];
    while let Some(step) = steps.pop() {
        match step {
            Step::Open(element, depth) => {
                out.push_str(&options.indent.repeat(depth));
                open_tag(out, element);
                if element.children.is_empty() {
                    out.push_str("/>");
                    continue;
                }
                out.push('>');
                if !element.children.iter().any(|c| matches!(c, Node::Element(_))) {
                    // Leaf: text and comments inline, so whitespace in text is exact.
                    for child in &element.children {
                        write_inline(out, child);
                    }
                    close_tag(out, element);
                } else {
                    steps.push(Step::Close(element, depth));
                    steps.extend(
                        element
                            .children
                            .iter()
                            .rev()
                            .map(|child| Step::Child(child, depth + 1)),
                    );
                }
            }
            Step::Child(node, depth) => {
                newline(out, options);
                match node {
                    Node::Element(nested) => steps.push(Step::Open(nested, depth)),
                    other => {
                        out.push_str(&options.indent.repeat(depth));
                        write_inline(out, other);
                    }
                }
            }
            Step::Close(element, depth) => {
                newline(out, options);
                out.push_str(&options.indent.repeat(depth));
                close_tag(out, element);
            }
        }
    }
}

fn open_tag(out: &mut String, element: &Element) {
    out.push('<');
    out.push_str(&element.name);
    for (key, value) in &element.attributes {
        out.push(' ');
        out.push_str(key);
        out.push_str("=\"");
        out.push_str(&escape_attribute(value));
        out.push('"');
    }
}

fn close_tag(out: &mut String, element: &Element) {
    out.push_str("</");
    out.push_str(&element.name);
    out.push('>');
}

fn write_inline(out: &mut String, node: &Node) {
    match node {
        Node::Text(text) => out.push_str(&escape_text(text)),
        Node::Comment(text) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
        Node::Element(_) => {}
    }
}

/// Escape XML special characters
pub fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('\"', "&quot;")
        .replace('\'', "&apos;")
}

/// Text content: a bare `\r` would be normalized away by any parser.
fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('\r', "&#13;")
}

/// Attribute values: whitespace characters are normalized to spaces unless
/// written as character references.
fn escape_attribute(value: &str) -> String {
    escape_xml(value)
        .replace('\n', "&#10;")
        .replace('\r', "&#13;")
        .replace('\t', "&#9;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> Document {
        Document::wrap(
            Element::new("nullable")
                .with_attr("type", "int32")
                .with_comment(" int32 ")
                .with_child(Element::new("int").with_text("5")),
        )
    }

    #[test]
    fn test_render_layout() {
        let text = String::from_utf8(render(&sample(), &RenderOptions::default())).unwrap();
        assert_eq!(
            text,
            "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n\
             <expression>\n  \
             <nullable type=\"int32\">\n    \
             <!-- int32 -->\n    \
             <int>5</int>\n  \
             </nullable>\n\
             </expression>\n"
        );
    }

    #[test]
    fn test_parse_render_round_trip() {
        let document = sample();
        let bytes = render(&document, &RenderOptions::default());
        assert_eq!(parse(&bytes, &ParseOptions::default()).unwrap(), document);
    }

    #[test]
    fn test_text_whitespace_is_exact() {
        let document = Document::wrap(Element::new("string").with_text("  a\r\n\tb  "));
        for indent in ["", "    "] {
            let options = RenderOptions {
                indent: indent.to_string(),
                xml_declaration: false,
            };
            let back = parse(&render(&document, &options), &ParseOptions::default()).unwrap();
            assert_eq!(back, document);
        }
    }

    #[test]
    fn test_attribute_escaping() {
        let document = Document::wrap(
            Element::new("label-definition")
                .with_attr("id", "L1")
                .with_attr("name", "a\"b<c>\n\t&"),
        );
        let back = parse(
            &render(&document, &RenderOptions::default()),
            &ParseOptions::default(),
        )
        .unwrap();
        assert_eq!(back, document);
    }

    #[test]
    fn test_bom_and_comments() {
        let mut bytes = BOM.to_vec();
        bytes.extend_from_slice(b"<expression><!-- note --><int>1</int></expression>");
        let document = parse(&bytes, &ParseOptions::default()).unwrap();
        assert_eq!(document.root.children.len(), 2);

        let stripped = parse(
            &bytes,
            &ParseOptions {
                keep_comments: false,
            },
        )
        .unwrap();
        assert_eq!(stripped.root.children.len(), 1);
    }

    #[test]
    fn test_malformed_xml() {
        assert!(matches!(
            parse(b"<expression><int>1</expression>", &ParseOptions::default()),
            Err(FormatError::Parse(_))
        ));
        assert!(matches!(
            parse(&[0xff, 0xfe, 0x00], &ParseOptions::default()),
            Err(FormatError::Parse(_))
        ));
    }

    #[test]
    fn test_deep_nesting() {
        let mut node = Element::new("int").with_text("0");
        for _ in 0..2_000 {
            node = Element::new("negate").with_attr("type", "int32").with_child(node);
        }
        let document = Document::wrap(node);
        for indent in ["", "  "] {
            let options = RenderOptions {
                indent: indent.to_string(),
                xml_declaration: false,
            };
            let back = parse(&render(&document, &options), &ParseOptions::default()).unwrap();
            let mut depth = 0;
            let mut element = back.root.single_element().unwrap();
            while element.name == "negate" {
                depth += 1;
                element = element.single_element().unwrap();
            }
            assert_eq!(depth, 2_000);
            assert_eq!(element.text(), "0");
        }
    }
}
