//! The transformation engine: expression tree ↔ document elements.
//!
//! [`Encoder`] and [`Decoder`] drive the walk; [`LiteralCodec`] handles
//! constant values, [`members`] member descriptors and [`SymbolTable`] the
//! id bookkeeping for parameters and labels.

pub mod collections;
pub mod decoder;
pub mod encoder;
pub mod literal;
pub mod members;
pub mod opaque;
pub mod symbols;

pub use decoder::Decoder;
pub use encoder::Encoder;
pub use literal::LiteralCodec;
pub use opaque::{JsonOpaqueSerializer, OpaqueError, OpaqueSerializer};
pub use symbols::SymbolTable;
