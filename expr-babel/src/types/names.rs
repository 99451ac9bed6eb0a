//! Type-name codec.
//!
//! Renders a [`TypeRef`] as a canonical string under one of three naming
//! conventions and parses any of them back. Encoding is total over the type
//! universe; decoding fails with `UnknownType` for anything that does not
//! name a built-in or a type registered in the [`TypeRegistry`].
//!
//! ```text
//! short               List<int32>
//! full                collections.List<core.int32>
//! assembly-qualified  collections.List<[core.int32, core]>, collections
//! ```

use super::{CollectionShape, DictionaryShape, Primitive, TupleKind, TypeRef, TypeRegistry};
use crate::error::{Result, TransformError};
use serde::{Deserialize, Serialize};

const CORE: &str = "core";
const COLLECTIONS: &str = "collections";

/// How type names are written on encode. Decode accepts all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NamingConvention {
    #[default]
    Short,
    Full,
    AssemblyQualified,
}

impl NamingConvention {
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "short" => Some(NamingConvention::Short),
            "full" => Some(NamingConvention::Full),
            "assembly-qualified" | "qualified" => Some(NamingConvention::AssemblyQualified),
            _ => None,
        }
    }
}

/// Encodes a type name under `convention`.
pub fn encode_type_name(ty: &TypeRef, convention: NamingConvention) -> String {
    match convention {
        NamingConvention::AssemblyQualified => {
            format!("{}, {}", body(ty, convention), module_of(ty))
        }
        _ => body(ty, convention),
    }
}

fn body(ty: &TypeRef, convention: NamingConvention) -> String {
    match ty {
        TypeRef::Primitive(p) => qualify(CORE, p.name(), convention),
        TypeRef::Nullable(inner) => generic(CORE, "Nullable", [inner.as_ref()], convention),
        TypeRef::Sequence(CollectionShape::Array, element) => {
            format!("{}[]", body(element, convention))
        }
        TypeRef::Sequence(shape, element) => {
            generic(shape.namespace(), shape.name(), [element.as_ref()], convention)
        }
        TypeRef::Dictionary(shape, key, value) => generic(
            shape.namespace(),
            shape.name(),
            [key.as_ref(), value.as_ref()],
            convention,
        ),
        TypeRef::Tuple(kind, items) => generic(CORE, kind.name(), items.iter(), convention),
        TypeRef::Func(parameters, result) => generic(
            CORE,
            "Func",
            parameters.iter().chain(std::iter::once(result.as_ref())),
            convention,
        ),
        TypeRef::Action(parameters) if parameters.is_empty() => {
            qualify(CORE, "Action", convention)
        }
        TypeRef::Action(parameters) => generic(CORE, "Action", parameters.iter(), convention),
        TypeRef::Named(named) => match convention {
            NamingConvention::Short => named.name.clone(),
            _ => named.full_name(),
        },
    }
}

fn qualify(namespace: &str, name: &str, convention: NamingConvention) -> String {
    match convention {
        NamingConvention::Short => name.to_string(),
        _ => format!("{namespace}.{name}"),
    }
}

fn generic<'a>(
    namespace: &str,
    name: &str,
    args: impl IntoIterator<Item = &'a TypeRef>,
    convention: NamingConvention,
) -> String {
    let args: Vec<String> = args
        .into_iter()
        .map(|arg| match convention {
            NamingConvention::AssemblyQualified => format!("[{}]", encode_type_name(arg, convention)),
            _ => body(arg, convention),
        })
        .collect();
    format!(
        "{}<{}>",
        qualify(namespace, name, convention),
        args.join(", ")
    )
}

/// Module a type is defined in; arrays live with their element type.
fn module_of(ty: &TypeRef) -> String {
    match ty {
        TypeRef::Sequence(CollectionShape::Array, element) => module_of(element),
        TypeRef::Sequence(shape, _) => shape_module(shape.namespace()).to_string(),
        TypeRef::Dictionary(shape, _, _) => shape_module(shape.namespace()).to_string(),
        TypeRef::Named(named) => named.module.clone(),
        _ => CORE.to_string(),
    }
}

fn shape_module(namespace: &str) -> &'static str {
    if namespace == CORE {
        CORE
    } else {
        COLLECTIONS
    }
}

/// Decodes a type name written under any convention.
pub fn decode_type_name(text: &str, registry: &TypeRegistry) -> Result<TypeRef> {
    let mut parser = Parser::new(text);
    let syntax = parser.qualified()?;
    parser.skip_whitespace();
    if !parser.at_end() {
        return Err(TransformError::unknown_type(text));
    }
    resolve(&syntax, registry, text)
}

/// Parsed but unresolved type name.
#[derive(Debug)]
struct TypeSyntax {
    name: String,
    /// Set when an argument list was written, even an empty one.
    generic: bool,
    args: Vec<TypeSyntax>,
    array_rank: usize,
    module: Option<String>,
}

struct Parser<'a> {
    source: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        Parser { source, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.source[self.pos..]
    }

    fn at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    fn skip_whitespace(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.source.len() - trimmed.len();
    }

    fn eat(&mut self, c: char) -> bool {
        self.skip_whitespace();
        if self.rest().starts_with(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    fn error(&self) -> TransformError {
        TransformError::unknown_type(self.source)
    }

    fn identifier(&mut self) -> Result<String> {
        self.skip_whitespace();
        let len = self
            .rest()
            .find(|c: char| !(c.is_alphanumeric() || c == '_' || c == '.'))
            .unwrap_or(self.rest().len());
        if len == 0 {
            return Err(self.error());
        }
        let ident = self.rest()[..len].to_string();
        self.pos += len;
        Ok(ident)
    }

    /// `type_expr (',' module)?`
    fn qualified(&mut self) -> Result<TypeSyntax> {
        let mut syntax = self.type_expr()?;
        if self.eat(',') {
            syntax.module = Some(self.identifier()?);
        }
        Ok(syntax)
    }

    /// `name ('<' (arg (',' arg)*)? '>')? ('[]')*`
    fn type_expr(&mut self) -> Result<TypeSyntax> {
        let name = self.identifier()?;
        let mut args = Vec::new();
        let generic = self.eat('<');
        if generic && !self.eat('>') {
            loop {
                args.push(self.argument()?);
                if self.eat('>') {
                    break;
                }
                if !self.eat(',') {
                    return Err(self.error());
                }
            }
        }
        let mut array_rank = 0;
        while self.rest().trim_start().starts_with("[]") {
            self.skip_whitespace();
            self.pos += 2;
            array_rank += 1;
        }
        Ok(TypeSyntax {
            name,
            generic,
            args,
            array_rank,
            module: None,
        })
    }

    /// `'[' qualified ']' | type_expr`
    fn argument(&mut self) -> Result<TypeSyntax> {
        if self.eat('[') {
            let syntax = self.qualified()?;
            if !self.eat(']') {
                return Err(self.error());
            }
            Ok(syntax)
        } else {
            self.type_expr()
        }
    }
}

fn resolve(syntax: &TypeSyntax, registry: &TypeRegistry, source: &str) -> Result<TypeRef> {
    let unknown = || TransformError::unknown_type(source);
    let (namespace, simple) = match syntax.name.rsplit_once('.') {
        Some((ns, simple)) => (Some(ns), simple),
        None => (None, syntax.name.as_str()),
    };
    let in_namespace = |expected: &str| namespace.map_or(true, |ns| ns == expected);

    let args = syntax
        .args
        .iter()
        .map(|arg| resolve(arg, registry, source))
        .collect::<Result<Vec<_>>>()?;

    let mut ty = if !syntax.generic {
        match Primitive::from_name(simple) {
            Some(p) if in_namespace(CORE) => TypeRef::Primitive(p),
            _ if simple == "Action" && in_namespace(CORE) => TypeRef::Action(Vec::new()),
            _ => {
                let info = match namespace {
                    Some(_) => registry.lookup_full(&syntax.name),
                    None => registry.lookup_short(simple)?,
                };
                info.map(|info| info.type_ref()).ok_or_else(unknown)?
            }
        }
    } else {
        resolve_generic(namespace, simple, args).ok_or_else(unknown)?
    };

    for _ in 0..syntax.array_rank {
        ty = TypeRef::array(ty);
    }

    if let Some(module) = &syntax.module {
        if *module != module_of(&ty) {
            return Err(unknown());
        }
    }
    Ok(ty)
}

fn resolve_generic(namespace: Option<&str>, simple: &str, mut args: Vec<TypeRef>) -> Option<TypeRef> {
    let in_namespace = |expected: &str| namespace.map_or(true, |ns| ns == expected);

    if let Some(shape) = CollectionShape::from_name(simple) {
        if shape == CollectionShape::Array || !in_namespace(shape.namespace()) || args.len() != 1 {
            return None;
        }
        return args.pop().map(|element| TypeRef::sequence(shape, element));
    }
    if let Some(shape) = DictionaryShape::from_name(simple) {
        if !in_namespace(shape.namespace()) || args.len() != 2 {
            return None;
        }
        let value = args.pop()?;
        let key = args.pop()?;
        return Some(TypeRef::dictionary(shape, key, value));
    }
    if !in_namespace(CORE) {
        return None;
    }
    match simple {
        "Nullable" if args.len() == 1 => args.pop().map(TypeRef::nullable),
        "Tuple" => Some(TypeRef::Tuple(TupleKind::Reference, args)),
        "ValueTuple" => Some(TypeRef::Tuple(TupleKind::Value, args)),
        "Func" => {
            let result = args.pop()?;
            Some(TypeRef::func(args, result))
        }
        "Action" => Some(TypeRef::Action(args)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{NamedType, TypeInfo};

    fn registry() -> TypeRegistry {
        TypeRegistry::builder()
            .register(TypeInfo::class(NamedType::new("Geo", "Point", "shapes")))
            .register(TypeInfo::class(NamedType::new("Geo.Solid", "Cube", "shapes")))
            .build()
    }

    #[test]
    fn primitive_conventions() {
        assert_eq!(encode_type_name(&TypeRef::INT32, NamingConvention::Short), "int32");
        assert_eq!(
            encode_type_name(&TypeRef::INT32, NamingConvention::Full),
            "core.int32"
        );
        assert_eq!(
            encode_type_name(&TypeRef::INT32, NamingConvention::AssemblyQualified),
            "core.int32, core"
        );
    }

    #[test]
    fn generic_conventions() {
        let ty = TypeRef::list(TypeRef::INT32);
        assert_eq!(encode_type_name(&ty, NamingConvention::Short), "List<int32>");
        assert_eq!(
            encode_type_name(&ty, NamingConvention::Full),
            "collections.List<core.int32>"
        );
        assert_eq!(
            encode_type_name(&ty, NamingConvention::AssemblyQualified),
            "collections.List<[core.int32, core]>, collections"
        );
    }

    #[test]
    fn arrays_live_with_their_element_module() {
        let point = TypeRef::named("Geo", "Point", "shapes");
        assert_eq!(
            encode_type_name(&TypeRef::array(point), NamingConvention::AssemblyQualified),
            "Geo.Point[], shapes"
        );
    }

    #[test]
    fn decode_accepts_every_convention() {
        let reg = registry();
        let ty = TypeRef::dictionary(
            DictionaryShape::SortedDictionary,
            TypeRef::STRING,
            TypeRef::array(TypeRef::named("Geo", "Point", "shapes")),
        );
        for convention in [
            NamingConvention::Short,
            NamingConvention::Full,
            NamingConvention::AssemblyQualified,
        ] {
            let text = encode_type_name(&ty, convention);
            assert_eq!(decode_type_name(&text, &reg).unwrap(), ty, "{text}");
        }
    }

    #[test]
    fn decode_nullable_and_delegates() {
        let reg = registry();
        assert_eq!(
            decode_type_name("Nullable<int32>", &reg).unwrap(),
            TypeRef::nullable(TypeRef::INT32)
        );
        assert_eq!(
            decode_type_name("Func<int32, int32, bool>", &reg).unwrap(),
            TypeRef::func(vec![TypeRef::INT32, TypeRef::INT32], TypeRef::BOOL)
        );
        assert_eq!(
            decode_type_name("Action", &reg).unwrap(),
            TypeRef::Action(vec![])
        );
    }

    #[test]
    fn decode_rejects_unknown_names() {
        let reg = registry();
        for bad in [
            "Widget",
            "List<int32, int32>",
            "core.List<int32>",
            "int32, shapes",
            "Geo.Point, elsewhere",
            "List<int32",
            "",
        ] {
            assert!(
                matches!(
                    decode_type_name(bad, &reg),
                    Err(TransformError::UnknownType { .. })
                ),
                "{bad}"
            );
        }
    }

    #[test]
    fn empty_tuples_round_trip() {
        let reg = registry();
        for kind in [TupleKind::Value, TupleKind::Reference] {
            let ty = TypeRef::Tuple(kind, vec![]);
            for convention in [
                NamingConvention::Short,
                NamingConvention::Full,
                NamingConvention::AssemblyQualified,
            ] {
                let text = encode_type_name(&ty, convention);
                assert_eq!(decode_type_name(&text, &reg).unwrap(), ty, "{text}");
            }
        }
        assert_eq!(
            encode_type_name(&TypeRef::Tuple(TupleKind::Value, vec![]), NamingConvention::Short),
            "ValueTuple<>"
        );
        for bad in ["Func<>", "List<>", "Nullable<>", "Point<>"] {
            assert!(decode_type_name(bad, &reg).is_err(), "{bad}");
        }
    }

    #[test]
    fn nested_namespaces_use_the_last_dot() {
        let reg = registry();
        assert_eq!(
            decode_type_name("Geo.Solid.Cube", &reg).unwrap(),
            TypeRef::named("Geo.Solid", "Cube", "shapes")
        );
        assert_eq!(
            decode_type_name("Cube", &reg).unwrap(),
            TypeRef::named("Geo.Solid", "Cube", "shapes")
        );
    }
}
