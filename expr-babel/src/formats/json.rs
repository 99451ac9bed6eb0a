use crate::document::Document;
use crate::error::FormatError;
use crate::format::Format;

/// The document element tree as pretty-printed JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormat;

impl Format for JsonFormat {
    fn name(&self) -> &'static str {
        "json"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["json"]
    }

    fn parse(&self, source: &[u8]) -> Result<Document, FormatError> {
        serde_json::from_slice(source).map_err(|e| FormatError::Parse(e.to_string()))
    }

    fn serialize(&self, doc: &Document) -> Result<Vec<u8>, FormatError> {
        serde_json::to_vec_pretty(doc).map_err(|e| FormatError::Serialize(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Element;

    #[test]
    fn test_json_round_trip() {
        let doc = Document::wrap(
            Element::new("nullable")
                .with_attr("type", "int32")
                .with_comment(" int32 ")
                .with_child(Element::new("int").with_text("5")),
        );
        let bytes = JsonFormat.serialize(&doc).unwrap();
        assert_eq!(JsonFormat.parse(&bytes).unwrap(), doc);
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            JsonFormat.parse(b"{"),
            Err(FormatError::Parse(_))
        ));
    }
}
