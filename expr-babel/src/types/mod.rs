//! Type descriptors and member metadata.
//!
//! [`TypeRef`] is the closed universe of types the engine can name: the
//! built-in primitives, the generic container families, tuples, delegates and
//! user types registered in a [`TypeRegistry`]. User types are referenced by
//! name only; their metadata (enum variants, record properties, members)
//! lives in the registry.

pub mod names;
pub mod registry;
pub mod shapes;

use std::fmt;
use std::sync::Arc;

pub use names::{decode_type_name, encode_type_name, NamingConvention};
pub use registry::{TypeRegistry, TypeRegistryBuilder};
pub use shapes::{CollectionShape, DictionaryShape, TupleKind};

/// Built-in scalar types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Primitive {
    Void,
    Object,
    Bool,
    Char,
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Float32,
    Float64,
    String,
    DateTime,
    Duration,
    Guid,
}

impl Primitive {
    pub const ALL: [Primitive; 18] = [
        Primitive::Void,
        Primitive::Object,
        Primitive::Bool,
        Primitive::Char,
        Primitive::Int8,
        Primitive::UInt8,
        Primitive::Int16,
        Primitive::UInt16,
        Primitive::Int32,
        Primitive::UInt32,
        Primitive::Int64,
        Primitive::UInt64,
        Primitive::Float32,
        Primitive::Float64,
        Primitive::String,
        Primitive::DateTime,
        Primitive::Duration,
        Primitive::Guid,
    ];

    /// Canonical type name (`int32`).
    pub fn name(self) -> &'static str {
        match self {
            Primitive::Void => "void",
            Primitive::Object => "object",
            Primitive::Bool => "bool",
            Primitive::Char => "char",
            Primitive::Int8 => "int8",
            Primitive::UInt8 => "uint8",
            Primitive::Int16 => "int16",
            Primitive::UInt16 => "uint16",
            Primitive::Int32 => "int32",
            Primitive::UInt32 => "uint32",
            Primitive::Int64 => "int64",
            Primitive::UInt64 => "uint64",
            Primitive::Float32 => "float32",
            Primitive::Float64 => "float64",
            Primitive::String => "string",
            Primitive::DateTime => "datetime",
            Primitive::Duration => "duration",
            Primitive::Guid => "guid",
        }
    }

    /// Tag of the literal fragment holding a value of this type.
    ///
    /// `void` has no values and `object` values use the fragment of their
    /// concrete type.
    pub fn literal_tag(self) -> Option<&'static str> {
        let tag = match self {
            Primitive::Void | Primitive::Object => return None,
            Primitive::Bool => "bool",
            Primitive::Char => "char",
            Primitive::Int8 => "sbyte",
            Primitive::UInt8 => "byte",
            Primitive::Int16 => "short",
            Primitive::UInt16 => "ushort",
            Primitive::Int32 => "int",
            Primitive::UInt32 => "uint",
            Primitive::Int64 => "long",
            Primitive::UInt64 => "ulong",
            Primitive::Float32 => "float",
            Primitive::Float64 => "double",
            Primitive::String => "string",
            Primitive::DateTime => "datetime",
            Primitive::Duration => "duration",
            Primitive::Guid => "guid",
        };
        Some(tag)
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|p| p.name() == name)
    }

    pub fn from_literal_tag(tag: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|p| p.literal_tag() == Some(tag))
    }

    /// Inclusive value range of integral types.
    pub fn integral_range(self) -> Option<(i128, i128)> {
        let range = match self {
            Primitive::Int8 => (i8::MIN as i128, i8::MAX as i128),
            Primitive::UInt8 => (0, u8::MAX as i128),
            Primitive::Int16 => (i16::MIN as i128, i16::MAX as i128),
            Primitive::UInt16 => (0, u16::MAX as i128),
            Primitive::Int32 => (i32::MIN as i128, i32::MAX as i128),
            Primitive::UInt32 => (0, u32::MAX as i128),
            Primitive::Int64 => (i64::MIN as i128, i64::MAX as i128),
            Primitive::UInt64 => (0, u64::MAX as i128),
            _ => return None,
        };
        Some(range)
    }
}

/// A user type known by name: `namespace.name` defined in `module`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NamedType {
    pub namespace: String,
    pub name: String,
    pub module: String,
}

impl NamedType {
    pub fn new(
        namespace: impl Into<String>,
        name: impl Into<String>,
        module: impl Into<String>,
    ) -> Self {
        NamedType {
            namespace: namespace.into(),
            name: name.into(),
            module: module.into(),
        }
    }

    pub fn full_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.namespace, self.name)
        }
    }
}

/// A type in the engine's closed type universe.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TypeRef {
    Primitive(Primitive),
    Nullable(Box<TypeRef>),
    Sequence(CollectionShape, Box<TypeRef>),
    Dictionary(DictionaryShape, Box<TypeRef>, Box<TypeRef>),
    Tuple(TupleKind, Vec<TypeRef>),
    /// Delegate returning a value: parameters then result.
    Func(Vec<TypeRef>, Box<TypeRef>),
    /// Delegate returning nothing.
    Action(Vec<TypeRef>),
    Named(NamedType),
}

impl TypeRef {
    pub const VOID: TypeRef = TypeRef::Primitive(Primitive::Void);
    pub const OBJECT: TypeRef = TypeRef::Primitive(Primitive::Object);
    pub const BOOL: TypeRef = TypeRef::Primitive(Primitive::Bool);
    pub const CHAR: TypeRef = TypeRef::Primitive(Primitive::Char);
    pub const INT8: TypeRef = TypeRef::Primitive(Primitive::Int8);
    pub const UINT8: TypeRef = TypeRef::Primitive(Primitive::UInt8);
    pub const INT16: TypeRef = TypeRef::Primitive(Primitive::Int16);
    pub const UINT16: TypeRef = TypeRef::Primitive(Primitive::UInt16);
    pub const INT32: TypeRef = TypeRef::Primitive(Primitive::Int32);
    pub const UINT32: TypeRef = TypeRef::Primitive(Primitive::UInt32);
    pub const INT64: TypeRef = TypeRef::Primitive(Primitive::Int64);
    pub const UINT64: TypeRef = TypeRef::Primitive(Primitive::UInt64);
    pub const FLOAT32: TypeRef = TypeRef::Primitive(Primitive::Float32);
    pub const FLOAT64: TypeRef = TypeRef::Primitive(Primitive::Float64);
    pub const STRING: TypeRef = TypeRef::Primitive(Primitive::String);
    pub const DATETIME: TypeRef = TypeRef::Primitive(Primitive::DateTime);
    pub const DURATION: TypeRef = TypeRef::Primitive(Primitive::Duration);
    pub const GUID: TypeRef = TypeRef::Primitive(Primitive::Guid);

    pub fn nullable(inner: TypeRef) -> Self {
        TypeRef::Nullable(Box::new(inner))
    }

    pub fn array(element: TypeRef) -> Self {
        TypeRef::Sequence(CollectionShape::Array, Box::new(element))
    }

    pub fn list(element: TypeRef) -> Self {
        TypeRef::Sequence(CollectionShape::List, Box::new(element))
    }

    pub fn sequence(shape: CollectionShape, element: TypeRef) -> Self {
        TypeRef::Sequence(shape, Box::new(element))
    }

    pub fn dictionary(shape: DictionaryShape, key: TypeRef, value: TypeRef) -> Self {
        TypeRef::Dictionary(shape, Box::new(key), Box::new(value))
    }

    pub fn func(parameters: Vec<TypeRef>, result: TypeRef) -> Self {
        TypeRef::Func(parameters, Box::new(result))
    }

    pub fn named(
        namespace: impl Into<String>,
        name: impl Into<String>,
        module: impl Into<String>,
    ) -> Self {
        TypeRef::Named(NamedType::new(namespace, name, module))
    }

    /// Delegate type for a lambda with these parameter and result types.
    pub fn delegate_for(parameters: Vec<TypeRef>, result: TypeRef) -> Self {
        if result == TypeRef::VOID {
            TypeRef::Action(parameters)
        } else {
            TypeRef::Func(parameters, Box::new(result))
        }
    }

    pub fn as_primitive(&self) -> Option<Primitive> {
        match self {
            TypeRef::Primitive(p) => Some(*p),
            _ => None,
        }
    }

    /// Whether `<null/>` is a legal literal for a slot of this type.
    ///
    /// Nullable wrappers use their own nil marker instead.
    pub fn accepts_null(&self) -> bool {
        match self {
            TypeRef::Primitive(p) => matches!(p, Primitive::Object | Primitive::String),
            TypeRef::Nullable(_) => false,
            TypeRef::Tuple(kind, _) => *kind == TupleKind::Reference,
            _ => true,
        }
    }

    /// Result type of invoking a delegate type.
    pub fn delegate_result(&self) -> Option<TypeRef> {
        match self {
            TypeRef::Func(_, result) => Some((**result).clone()),
            TypeRef::Action(_) => Some(TypeRef::VOID),
            _ => None,
        }
    }

    /// Element type of sequences, used by array and indexing nodes.
    pub fn element_type(&self) -> Option<&TypeRef> {
        match self {
            TypeRef::Sequence(_, element) => Some(element),
            _ => None,
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&encode_type_name(self, NamingConvention::Short))
    }
}

/// What a registered user type is.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeKind {
    Class,
    Struct,
    Enum(EnumInfo),
    Record(RecordInfo),
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumInfo {
    pub underlying: Primitive,
    pub flags: bool,
    pub variants: Vec<(String, i128)>,
}

impl EnumInfo {
    pub fn variant_name(&self, value: i128) -> Option<&str> {
        self.variants
            .iter()
            .find(|(_, v)| *v == value)
            .map(|(name, _)| name.as_str())
    }

    pub fn variant_value(&self, name: &str) -> Option<i128> {
        self.variants
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
    }
}

/// A record or anonymous composite: ordered, typed properties.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordInfo {
    pub properties: Vec<(String, TypeRef)>,
    pub anonymous: bool,
}

/// Metadata of a registered user type.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeInfo {
    pub ty: NamedType,
    pub kind: TypeKind,
    pub members: Vec<Arc<MemberInfo>>,
}

impl TypeInfo {
    pub fn class(ty: NamedType) -> Self {
        TypeInfo {
            ty,
            kind: TypeKind::Class,
            members: Vec::new(),
        }
    }

    pub fn structure(ty: NamedType) -> Self {
        TypeInfo {
            ty,
            kind: TypeKind::Struct,
            members: Vec::new(),
        }
    }

    pub fn enumeration(ty: NamedType, underlying: Primitive, variants: &[(&str, i128)]) -> Self {
        TypeInfo {
            ty,
            kind: TypeKind::Enum(EnumInfo {
                underlying,
                flags: false,
                variants: variants
                    .iter()
                    .map(|(name, value)| (name.to_string(), *value))
                    .collect(),
            }),
            members: Vec::new(),
        }
    }

    pub fn flags(mut self) -> Self {
        if let TypeKind::Enum(info) = &mut self.kind {
            info.flags = true;
        }
        self
    }

    /// A record with one public constructor taking every property in order,
    /// plus a public read-only property member per field.
    pub fn record(ty: NamedType, properties: Vec<(&str, TypeRef)>) -> Self {
        let properties: Vec<(String, TypeRef)> = properties
            .into_iter()
            .map(|(name, ty)| (name.to_string(), ty))
            .collect();
        let constructor = MemberInfo::constructor(
            properties
                .iter()
                .map(|(name, ty)| ParameterInfo::new(lower_first(name), ty.clone()))
                .collect(),
        );
        let mut members = vec![Arc::new(constructor)];
        members.extend(
            properties
                .iter()
                .map(|(name, ty)| Arc::new(MemberInfo::property(name, ty.clone()))),
        );
        TypeInfo {
            ty,
            kind: TypeKind::Record(RecordInfo {
                properties,
                anonymous: false,
            }),
            members,
        }
    }

    /// Mark a record as an anonymous composite. Its constructor parameters
    /// take the exact property names, which decoding then requires.
    pub fn anonymous(mut self) -> Self {
        if let TypeKind::Record(info) = &mut self.kind {
            info.anonymous = true;
            let parameters: Vec<ParameterInfo> = info
                .properties
                .iter()
                .map(|(name, ty)| ParameterInfo::new(name.as_str(), ty.clone()))
                .collect();
            for member in &mut self.members {
                if member.kind == MemberKind::Constructor {
                    *member = Arc::new(MemberInfo::constructor(parameters.clone()));
                }
            }
        }
        self
    }

    pub fn with_member(mut self, member: MemberInfo) -> Self {
        self.members.push(Arc::new(member));
        self
    }

    pub fn type_ref(&self) -> TypeRef {
        TypeRef::Named(self.ty.clone())
    }
}

fn lower_first(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    Constructor,
    Property,
    Method,
    Field,
    Event,
}

impl MemberKind {
    pub const ALL: [MemberKind; 5] = [
        MemberKind::Constructor,
        MemberKind::Property,
        MemberKind::Method,
        MemberKind::Field,
        MemberKind::Event,
    ];

    /// Tag of the member-descriptor fragment.
    pub fn tag(self) -> &'static str {
        match self {
            MemberKind::Constructor => "constructor",
            MemberKind::Property => "property",
            MemberKind::Method => "method",
            MemberKind::Field => "field",
            MemberKind::Event => "event",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.tag() == tag)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Visibility {
    Public,
    Internal,
    Protected,
    Private,
}

impl Visibility {
    pub fn as_str(self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Internal => "internal",
            Visibility::Protected => "protected",
            Visibility::Private => "private",
        }
    }

    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "public" => Some(Visibility::Public),
            "internal" => Some(Visibility::Internal),
            "protected" => Some(Visibility::Protected),
            "private" => Some(Visibility::Private),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParameterInfo {
    pub name: String,
    pub ty: TypeRef,
    pub by_ref: bool,
}

impl ParameterInfo {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        ParameterInfo {
            name: name.into(),
            ty,
            by_ref: false,
        }
    }

    pub fn by_ref(name: impl Into<String>, ty: TypeRef) -> Self {
        ParameterInfo {
            name: name.into(),
            ty,
            by_ref: true,
        }
    }
}

/// A constructor, property, method, field or event of some type.
///
/// `ty` is the value type of properties, fields and events, the return type
/// of methods, and `void` for constructors.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemberInfo {
    pub kind: MemberKind,
    pub name: String,
    pub is_static: bool,
    pub visibility: Visibility,
    pub parameters: Vec<ParameterInfo>,
    pub ty: TypeRef,
}

impl MemberInfo {
    fn new(kind: MemberKind, name: impl Into<String>, ty: TypeRef) -> Self {
        MemberInfo {
            kind,
            name: name.into(),
            is_static: false,
            visibility: Visibility::Public,
            parameters: Vec::new(),
            ty,
        }
    }

    pub fn constructor(parameters: Vec<ParameterInfo>) -> Self {
        MemberInfo {
            parameters,
            ..Self::new(MemberKind::Constructor, ".ctor", TypeRef::VOID)
        }
    }

    pub fn method(name: impl Into<String>, parameters: Vec<ParameterInfo>, returns: TypeRef) -> Self {
        MemberInfo {
            parameters,
            ..Self::new(MemberKind::Method, name, returns)
        }
    }

    pub fn property(name: impl Into<String>, ty: TypeRef) -> Self {
        Self::new(MemberKind::Property, name, ty)
    }

    /// An indexed property (`Item`, `Chars`).
    pub fn indexer(name: impl Into<String>, parameters: Vec<ParameterInfo>, ty: TypeRef) -> Self {
        MemberInfo {
            parameters,
            ..Self::new(MemberKind::Property, name, ty)
        }
    }

    pub fn field(name: impl Into<String>, ty: TypeRef) -> Self {
        Self::new(MemberKind::Field, name, ty)
    }

    pub fn event(name: impl Into<String>, ty: TypeRef) -> Self {
        Self::new(MemberKind::Event, name, ty)
    }

    pub fn make_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }
}

/// A member together with the concrete type it was looked up on.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberRef {
    pub declaring_type: TypeRef,
    pub member: Arc<MemberInfo>,
}

impl MemberRef {
    pub fn new(declaring_type: TypeRef, member: Arc<MemberInfo>) -> Self {
        MemberRef {
            declaring_type,
            member,
        }
    }

    pub fn name(&self) -> &str {
        &self.member.name
    }

    pub fn kind(&self) -> MemberKind {
        self.member.kind
    }

    pub fn is_static(&self) -> bool {
        self.member.is_static
    }

    /// Value type of the member (property/field type, method return type).
    pub fn value_type(&self) -> &TypeRef {
        &self.member.ty
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitive_names_and_tags_round_trip() {
        for p in Primitive::ALL {
            assert_eq!(Primitive::from_name(p.name()), Some(p));
            if let Some(tag) = p.literal_tag() {
                assert_eq!(Primitive::from_literal_tag(tag), Some(p));
            }
        }
        assert_eq!(Primitive::Int32.literal_tag(), Some("int"));
        assert_eq!(Primitive::Object.literal_tag(), None);
    }

    #[test]
    fn null_acceptance() {
        assert!(TypeRef::STRING.accepts_null());
        assert!(TypeRef::list(TypeRef::INT32).accepts_null());
        assert!(!TypeRef::INT32.accepts_null());
        assert!(!TypeRef::nullable(TypeRef::INT32).accepts_null());
        assert!(!TypeRef::Tuple(TupleKind::Value, vec![TypeRef::INT32]).accepts_null());
    }

    #[test]
    fn record_gets_constructor_and_properties() {
        let info = TypeInfo::record(
            NamedType::new("Geo", "Point", "shapes"),
            vec![("X", TypeRef::INT32), ("Y", TypeRef::INT32)],
        );
        let ctor = &info.members[0];
        assert_eq!(ctor.kind, MemberKind::Constructor);
        assert_eq!(ctor.parameters[0].name, "x");
        assert_eq!(info.members.len(), 3);

        let anonymous = info.anonymous();
        assert_eq!(anonymous.members[0].parameters[0].name, "X");
        assert_eq!(anonymous.members.len(), 3);
        assert!(matches!(
            &anonymous.kind,
            TypeKind::Record(RecordInfo { anonymous: true, .. })
        ));
    }

    #[test]
    fn delegate_for_void_is_action() {
        assert_eq!(
            TypeRef::delegate_for(vec![TypeRef::INT32], TypeRef::VOID),
            TypeRef::Action(vec![TypeRef::INT32])
        );
        assert_eq!(
            TypeRef::delegate_for(vec![], TypeRef::BOOL).delegate_result(),
            Some(TypeRef::BOOL)
        );
    }
}
