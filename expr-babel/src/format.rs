//! Document formats.
//!
//! A format turns a [`Document`] into bytes and back. It knows nothing about
//! expression trees: the engine hands it finished documents and takes back
//! parsed ones.

use crate::document::Document;
use crate::error::FormatError;

/// A byte encoding of the document tree.
///
/// ```ignore
/// struct Yaml;
///
/// impl Format for Yaml {
///     fn name(&self) -> &'static str {
///         "yaml"
///     }
///
///     fn extensions(&self) -> &'static [&'static str] {
///         &["yaml", "yml"]
///     }
///
///     fn parse(&self, source: &[u8]) -> Result<Document, FormatError> { ... }
///     fn serialize(&self, document: &Document) -> Result<Vec<u8>, FormatError> { ... }
/// }
/// ```
pub trait Format: Send + Sync {
    /// Registry key, also accepted by `--from` / `--to`.
    fn name(&self) -> &'static str;

    /// File extensions without the leading dot.
    fn extensions(&self) -> &'static [&'static str];

    fn parse(&self, source: &[u8]) -> Result<Document, FormatError>;

    fn serialize(&self, document: &Document) -> Result<Vec<u8>, FormatError>;
}
