//! Lookup of document formats by name or file extension.

use crate::document::Document;
use crate::error::FormatError;
use crate::format::Format;
use crate::formats::{JsonFormat, XmlFormat};
use crate::io::{ParseOptions, RenderOptions};
use std::collections::BTreeMap;
use std::path::Path;

/// The formats a [`Transformer`](crate::Transformer) can read and write.
///
/// ```ignore
/// let formats = FormatRegistry::default();
/// let document = formats.parse(&bytes, "xml")?;
/// let json = formats.serialize(&document, "json")?;
/// ```
pub struct FormatRegistry {
    formats: BTreeMap<&'static str, Box<dyn Format>>,
}

impl FormatRegistry {
    pub fn empty() -> Self {
        FormatRegistry {
            formats: BTreeMap::new(),
        }
    }

    /// The built-in formats, with XML read and written under these options.
    pub fn with_options(parse: ParseOptions, render: RenderOptions) -> Self {
        let mut formats = Self::empty();
        formats.register(XmlFormat::new(parse, render));
        formats.register(JsonFormat);
        formats
    }

    /// Adds `format`, replacing any format of the same name.
    pub fn register(&mut self, format: impl Format + 'static) {
        self.formats.insert(format.name(), Box::new(format));
    }

    pub fn get(&self, name: &str) -> Result<&dyn Format, FormatError> {
        self.formats
            .get(name)
            .map(|format| format.as_ref())
            .ok_or_else(|| FormatError::UnknownFormat(name.to_string()))
    }

    /// Registered names in order.
    pub fn names(&self) -> Vec<&'static str> {
        self.formats.keys().copied().collect()
    }

    /// The format whose extensions include the extension of `path`.
    pub fn detect(&self, path: impl AsRef<Path>) -> Option<&'static str> {
        let extension = path.as_ref().extension()?.to_str()?;
        self.formats
            .values()
            .find(|format| {
                format
                    .extensions()
                    .iter()
                    .any(|known| known.eq_ignore_ascii_case(extension))
            })
            .map(|format| format.name())
    }

    pub fn parse(&self, source: &[u8], format: &str) -> Result<Document, FormatError> {
        tracing::debug!(format, bytes = source.len(), "parsing document");
        self.get(format)?.parse(source)
    }

    pub fn serialize(&self, document: &Document, format: &str) -> Result<Vec<u8>, FormatError> {
        let bytes = self.get(format)?.serialize(document)?;
        tracing::debug!(format, bytes = bytes.len(), "serialized document");
        Ok(bytes)
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::with_options(ParseOptions::default(), RenderOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Element;

    /// Writes the root's first child tag and nothing else.
    struct TagOnly;

    impl Format for TagOnly {
        fn name(&self) -> &'static str {
            "tag"
        }

        fn extensions(&self) -> &'static [&'static str] {
            &["tag", "tags"]
        }

        fn parse(&self, source: &[u8]) -> Result<Document, FormatError> {
            let tag = std::str::from_utf8(source).map_err(|e| FormatError::Parse(e.to_string()))?;
            Ok(Document::wrap(Element::new(tag.trim())))
        }

        fn serialize(&self, document: &Document) -> Result<Vec<u8>, FormatError> {
            let node = document
                .root
                .elements()
                .next()
                .ok_or_else(|| FormatError::Serialize("empty document".to_string()))?;
            Ok(node.name.clone().into_bytes())
        }
    }

    #[test]
    fn custom_format_is_found_by_name_and_extension() {
        let mut formats = FormatRegistry::empty();
        formats.register(TagOnly);

        assert_eq!(formats.names(), vec!["tag"]);
        assert_eq!(formats.detect("trees/a.TAGS"), Some("tag"));
        let document = formats.parse(b"default\n", "tag").unwrap();
        assert_eq!(formats.serialize(&document, "tag").unwrap(), b"default");
    }

    #[test]
    fn unknown_name_is_reported() {
        let formats = FormatRegistry::empty();
        assert_eq!(
            formats.parse(b"", "yaml").unwrap_err(),
            FormatError::UnknownFormat("yaml".to_string())
        );
    }

    #[test]
    fn built_in_formats() {
        let formats = FormatRegistry::default();
        assert_eq!(formats.names(), vec!["json", "xml"]);
        assert_eq!(formats.detect("tree.xml"), Some("xml"));
        assert_eq!(formats.detect("out/tree.json"), Some("json"));
        assert_eq!(formats.detect("tree.txt"), None);
        assert_eq!(formats.detect("tree"), None);
    }
}
