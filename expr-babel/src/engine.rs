//! Transformer facade
//!
//! [`Transformer`] bundles what one encode or decode call needs: the naming
//! convention, the shared type registry, the opaque serializer and a symbol
//! table that is reset at the start of every call. The byte-level entry
//! points go through the [`FormatRegistry`] and apply schema validation on
//! the way in.
//!
//! # Examples
//!
//! ```ignore
//! let mut transformer = Transformer::new(TransformOptions::default());
//! let bytes = transformer.to_bytes(&expr, "xml")?;
//! let back = transformer.from_bytes(&bytes, "xml")?;
//! ```

use crate::codec::{Decoder, Encoder, JsonOpaqueSerializer, LiteralCodec, OpaqueSerializer, SymbolTable};
use crate::document::Document;
use crate::error::{Result, TransformError};
use crate::expr::Expr;
use crate::io::{self, ParseOptions, RenderOptions, Schema, SchemaValidation};
use crate::registry::FormatRegistry;
use crate::types::{NamingConvention, TypeRegistry};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct TransformOptions {
    pub convention: NamingConvention,
    pub parse: ParseOptions,
    pub render: RenderOptions,
    pub validation: SchemaValidation,
    /// Schema applied by [`Transformer::from_bytes`].
    pub schema: Option<Arc<Schema>>,
}

impl TransformOptions {
    pub fn with_convention(mut self, convention: NamingConvention) -> Self {
        self.convention = convention;
        self
    }

    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = Some(Arc::new(schema));
        self
    }

    pub fn with_validation(mut self, validation: SchemaValidation) -> Self {
        self.validation = validation;
        self
    }
}

/// One transformation pipeline. Calls take `&mut self`; use one instance
/// per thread.
pub struct Transformer {
    options: TransformOptions,
    registry: Arc<TypeRegistry>,
    opaque: Box<dyn OpaqueSerializer>,
    formats: FormatRegistry,
    symbols: SymbolTable,
}

impl Transformer {
    pub fn new(options: TransformOptions) -> Self {
        let formats = FormatRegistry::with_options(options.parse.clone(), options.render.clone());
        Transformer {
            options,
            registry: Arc::new(TypeRegistry::empty()),
            opaque: Box::new(JsonOpaqueSerializer),
            formats,
            symbols: SymbolTable::new(),
        }
    }

    pub fn with_registry(mut self, registry: Arc<TypeRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_opaque_serializer(mut self, serializer: impl OpaqueSerializer + 'static) -> Self {
        self.opaque = Box::new(serializer);
        self
    }

    pub fn options(&self) -> &TransformOptions {
        &self.options
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn formats(&self) -> &FormatRegistry {
        &self.formats
    }

    /// Expression tree → document.
    pub fn encode(&mut self, expr: &Expr) -> Result<Document> {
        let convention = self.options.convention;
        let literals = LiteralCodec::new(&self.registry, convention, self.opaque.as_ref());
        Encoder::new(&literals, convention, &mut self.symbols).encode(expr)
    }

    /// Document → expression tree. No schema validation happens here.
    pub fn decode(&mut self, document: &Document) -> Result<Expr> {
        let literals = LiteralCodec::new(
            &self.registry,
            self.options.convention,
            self.opaque.as_ref(),
        );
        Decoder::new(&self.registry, &literals, &mut self.symbols).decode(document)
    }

    /// Check `document` against the configured schema, per the validation
    /// mode.
    pub fn validate(&self, document: &Document) -> Result<()> {
        let schema = match (self.options.validation, &self.options.schema) {
            (SchemaValidation::Never, _) | (SchemaValidation::IfSchemaPresent, None) => {
                return Ok(())
            }
            (SchemaValidation::Always, None) => {
                return Err(TransformError::SchemaValidation {
                    errors: vec!["validation is required but no schema is configured".to_string()],
                })
            }
            (_, Some(schema)) => schema,
        };

        let errors = io::validate(document, schema);
        tracing::debug!(
            mode = ?self.options.validation,
            errors = errors.len(),
            "schema validation"
        );
        if errors.is_empty() {
            Ok(())
        } else {
            Err(TransformError::SchemaValidation {
                errors: errors.iter().map(ToString::to_string).collect(),
            })
        }
    }

    /// Encode and serialize with the named format.
    pub fn to_bytes(&mut self, expr: &Expr, format: &str) -> Result<Vec<u8>> {
        let document = self.encode(expr)?;
        let bytes = self.formats.serialize(&document, format)?;
        tracing::debug!(format, bytes = bytes.len(), "encoded expression");
        Ok(bytes)
    }

    /// Parse with the named format, validate, then decode.
    pub fn from_bytes(&mut self, bytes: &[u8], format: &str) -> Result<Expr> {
        let document = self.formats.parse(bytes, format)?;
        self.validate(&document)?;
        let expr = self.decode(&document)?;
        tracing::debug!(format, kind = %expr.kind(), "decoded expression");
        Ok(expr)
    }
}

impl Default for Transformer {
    fn default() -> Self {
        Self::new(TransformOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Element;
    use crate::error::FormatError;
    use crate::expr::ParameterExpr;
    use crate::types::TypeRef;

    fn sum() -> Expr {
        let x = ParameterExpr::new("x", TypeRef::INT32);
        Expr::lambda(
            vec![x.clone()],
            Expr::add(Expr::parameter(&x), Expr::literal(1)),
        )
    }

    #[test]
    fn test_round_trip_through_each_format() {
        let mut transformer = Transformer::default();
        for format in ["xml", "json"] {
            let bytes = transformer.to_bytes(&sum(), format).unwrap();
            assert_eq!(transformer.from_bytes(&bytes, format).unwrap(), sum());
        }
    }

    #[test]
    fn test_unknown_format() {
        let mut transformer = Transformer::default();
        assert!(matches!(
            transformer.to_bytes(&sum(), "yaml"),
            Err(TransformError::Format(FormatError::UnknownFormat(_)))
        ));
    }

    #[test]
    fn test_validation_modes() {
        let bad = Document::wrap(Element::new("mystery"));

        let lenient = Transformer::default();
        assert!(lenient.validate(&bad).is_ok());

        let strict = Transformer::new(
            TransformOptions::default().with_validation(SchemaValidation::Always),
        );
        assert!(matches!(
            strict.validate(&bad),
            Err(TransformError::SchemaValidation { .. })
        ));

        let checked = Transformer::new(TransformOptions::default().with_schema(Schema::builtin()));
        match checked.validate(&bad) {
            Err(TransformError::SchemaValidation { errors }) => {
                assert_eq!(errors.len(), 1);
                assert!(errors[0].starts_with("/expression/mystery"));
            }
            other => panic!("expected schema errors, got {other:?}"),
        }

        let skipped = Transformer::new(
            TransformOptions::default()
                .with_schema(Schema::builtin())
                .with_validation(SchemaValidation::Never),
        );
        assert!(skipped.validate(&bad).is_ok());
    }

    #[test]
    fn test_symbols_reset_between_calls() {
        let mut transformer = Transformer::default();
        let first = transformer.encode(&sum()).unwrap();
        let second = transformer.encode(&sum()).unwrap();
        assert_eq!(first, second);
    }
}
