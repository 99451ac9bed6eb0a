use crate::document::Document;
use crate::error::FormatError;
use crate::format::Format;
use crate::io::{self, ParseOptions, RenderOptions};

/// XML documents, via [`io::parse`] and [`io::render`].
#[derive(Debug, Clone, Default)]
pub struct XmlFormat {
    parse: ParseOptions,
    render: RenderOptions,
}

impl XmlFormat {
    pub fn new(parse: ParseOptions, render: RenderOptions) -> Self {
        XmlFormat { parse, render }
    }
}

impl Format for XmlFormat {
    fn name(&self) -> &'static str {
        "xml"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["xml"]
    }

    fn parse(&self, source: &[u8]) -> Result<Document, FormatError> {
        io::parse(source, &self.parse)
    }

    fn serialize(&self, doc: &Document) -> Result<Vec<u8>, FormatError> {
        Ok(io::render(doc, &self.render))
    }
}
