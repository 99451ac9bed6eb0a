//! Document format implementations
//!
//! - `xml`: the canonical interchange format
//! - `json`: the same element tree as JSON, for tooling

pub mod json;
pub mod xml;

pub use json::JsonFormat;
pub use xml::XmlFormat;
