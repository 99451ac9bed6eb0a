//! Expression trees to documents and back
//!
//!     This crate converts a strongly typed expression tree (operators, control flow, lambdas,
//!     member and method references, literals) into a self-describing XML-shaped document and
//!     rebuilds an equivalent tree from such a document. The document keeps enough type and
//!     symbol information that the rebuilt tree has the same node kinds, the same static types
//!     and the same variable and label sharing as the original.
//!
//!     This is a pure lib: it powers exprx but is shell agnostic. No code here should print,
//!     read env vars or touch files.
//!
//! Architecture
//!
//!     The core never sees bytes. It works on the in-memory element tree of ./document.rs, and
//!     the io layer (./io) turns that tree into XML bytes and back. Formats plug in through the
//!     Format trait exactly like the io layer does, so the same tree can go out as XML or JSON.
//!
//!     The file structure :
//!     .
//!     ├── error.rs            # TransformError, FormatError
//!     ├── document.rs         # Element tree shared by the codec and the io layer
//!     ├── value.rs            # Literal values
//!     ├── types               # TypeRef, type registry, type-name codec, collection shapes
//!     ├── expr                # Expression tree, node kinds, outline printer
//!     ├── codec
//!     │   ├── encoder.rs      # Tree → document (explicit-stack post-order walk)
//!     │   ├── decoder.rs      # Document → tree (explicit stack, tag dispatch table)
//!     │   ├── literal.rs      # Value ↔ literal fragment
//!     │   ├── collections.rs  # Container construction per shape
//!     │   ├── symbols.rs      # Per-call id allocation for parameters and labels
//!     │   ├── members.rs      # Member descriptor fragments
//!     │   └── opaque.rs       # Fallback serializer for opaque objects
//!     ├── io                  # XML parse/render, schema validation
//!     ├── format.rs           # Format trait
//!     ├── registry.rs         # FormatRegistry, lookup by name or extension
//!     ├── formats             # xml, json
//!     └── engine.rs           # Transformer facade
//!
//! Core Algorithms
//!
//!     Trees can be arbitrarily deep, so the encoder never recurses over nodes. It walks with an
//!     explicit work stack: visiting a node schedules its children and then a build step that
//!     pops the children's finished fragments off an output stack. Scopes (lambda parameters,
//!     block variables, catch variables) are declared before their bodies are visited, so every
//!     reference inside finds the id minted at the definition.
//!
//!     The decoder mirrors this with its own work stack. Each element tag maps, through a table
//!     built once, to the layout of its children and the step that assembles the node. Binding
//!     scopes read their definitions first, which registers fresh bindings in the symbol table;
//!     every reference to the same id then shares one binding. The XML layer converts and
//!     renders element trees with explicit stacks too.
//!
//! Literals
//!
//!     Constants are bare literal fragments (<int>5</int>, <collection>, <dictionary>, ...). The
//!     set of shapes is closed: primitives, nullable, enum, bytes, sequence and dictionary shapes,
//!     tuples, records, and an opaque fallback that hands the value to an OpaqueSerializer.
//!
//! Formats
//!
//!     - Format trait: a document encoding, bytes to Document and back
//!     - FormatRegistry: formats by name, or by file extension
//!     - xml is the interchange format; json dumps the same element tree for tooling
//!
pub mod codec;
pub mod document;
pub mod engine;
pub mod error;
pub mod expr;
pub mod format;
pub mod formats;
pub mod io;
pub mod registry;
pub mod types;
pub mod value;

pub use document::{Document, Element, Node};
pub use engine::{TransformOptions, Transformer};
pub use error::{FormatError, Result, TransformError};
pub use expr::{Expr, LabelTarget, NodeKind, ParameterExpr};
pub use format::Format;
pub use registry::FormatRegistry;
pub use types::{NamingConvention, TypeRef, TypeRegistry};
pub use value::Value;

/// Encodes `expr` with default options and an empty type registry.
pub fn encode(expr: &Expr) -> Result<Document> {
    Transformer::default().encode(expr)
}

/// Decodes `document` with default options and an empty type registry.
///
/// Named types and members need a populated registry; use a [`Transformer`]
/// built with [`Transformer::with_registry`] for those.
pub fn decode(document: &Document) -> Result<Expr> {
    Transformer::default().decode(document)
}
