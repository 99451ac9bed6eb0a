//! Error types for transform and format operations

use thiserror::Error;

/// Errors raised by the encoder, the decoder and the codecs they drive.
///
/// Every variant aborts the whole call. Each one carries the tag, attribute,
/// symbol id or type name needed to locate the fault in the source tree or
/// document.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransformError {
    /// The encoder or decoder has no handler for this node kind
    #[error("unsupported node kind '{kind}'")]
    UnsupportedNodeKind { kind: String },

    /// An `idref` with no matching earlier definition
    #[error("unresolved symbol reference '{id}'")]
    UnresolvedSymbolReference { id: String },

    /// A symbol id defined twice in one document
    #[error("symbol '{id}' is defined more than once")]
    DuplicateSymbol { id: String },

    /// Zero or several members matched a member descriptor
    #[error("unresolved member '{member}' on '{declaring_type}': {reason}")]
    UnresolvedMember {
        declaring_type: String,
        member: String,
        reason: String,
    },

    /// A type name that the type-name codec cannot resolve
    #[error("unknown type '{name}'")]
    UnknownType { name: String },

    /// A declared length or count that disagrees with the encoded content
    #[error("<{tag}> declares {attribute}={declared} but holds {actual}")]
    DataIntegrityMismatch {
        tag: String,
        attribute: String,
        declared: usize,
        actual: usize,
    },

    /// A literal whose text or structure cannot become a value
    #[error("malformed literal <{tag}>: {message}")]
    MalformedLiteral { tag: String, message: String },

    /// The opaque-object serializer failed for this type
    #[error("cannot serialize values of type '{type_name}': {message}")]
    Serialization { type_name: String, message: String },

    /// Schema validation reported errors (boundary only)
    #[error("schema validation failed: {}", .errors.join("; "))]
    SchemaValidation { errors: Vec<String> },

    /// A required child element is absent
    #[error("<{tag}> is missing required child <{child}>")]
    MissingChild { tag: String, child: String },

    /// A required attribute is absent
    #[error("<{tag}> is missing required attribute '{attribute}'")]
    MissingAttribute { tag: String, attribute: String },

    /// A tag with no decoder
    #[error("unexpected tag <{tag}> inside <{parent}>")]
    UnknownTag { tag: String, parent: String },

    /// A broken engine invariant, never caused by user input alone
    #[error("internal error: {0}")]
    Internal(String),

    /// A boundary failure surfaced through the transformer facade
    #[error(transparent)]
    Format(#[from] FormatError),
}

impl TransformError {
    pub fn malformed(tag: impl Into<String>, message: impl Into<String>) -> Self {
        TransformError::MalformedLiteral {
            tag: tag.into(),
            message: message.into(),
        }
    }

    pub fn unknown_type(name: impl Into<String>) -> Self {
        TransformError::UnknownType { name: name.into() }
    }

    pub fn missing_attribute(tag: impl Into<String>, attribute: impl Into<String>) -> Self {
        TransformError::MissingAttribute {
            tag: tag.into(),
            attribute: attribute.into(),
        }
    }

    pub fn missing_child(tag: impl Into<String>, child: impl Into<String>) -> Self {
        TransformError::MissingChild {
            tag: tag.into(),
            child: child.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TransformError>;

/// Failures at the byte boundary: finding a format, parsing or writing bytes.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormatError {
    #[error("no document format named '{0}'")]
    UnknownFormat(String),
    #[error("cannot parse document: {0}")]
    Parse(String),
    #[error("cannot write document: {0}")]
    Serialize(String),
}
