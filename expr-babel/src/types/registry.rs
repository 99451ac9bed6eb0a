//! Declaring-type registry.
//!
//! Holds the metadata of every user type the engine may meet: enum variants,
//! record properties and the members that member descriptors resolve
//! against. Built once through [`TypeRegistryBuilder`] and read-only
//! afterwards, so a single registry can be shared by many transformers.
//!
//! Built-in types expose a small synthesized member set (collection `Add` and
//! `Count`, dictionary indexers, `string.Length`, ...) so that list
//! initializers and indexing over built-in containers can be described.

use super::{
    CollectionShape, EnumInfo, MemberInfo, MemberKind, ParameterInfo, Primitive, RecordInfo,
    TypeInfo, TypeKind, TypeRef, Visibility,
};
use crate::error::{Result, TransformError};
use std::collections::HashMap;
use std::sync::Arc;

/// Registry of user types, keyed by full name.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    types: HashMap<String, Arc<TypeInfo>>,
    short_names: HashMap<String, Vec<String>>,
}

/// Collects type metadata before freezing it into a [`TypeRegistry`].
#[derive(Debug, Default)]
pub struct TypeRegistryBuilder {
    types: Vec<TypeInfo>,
}

impl TypeRegistryBuilder {
    /// Register a type. A later registration with the same full name replaces
    /// the earlier one.
    pub fn register(mut self, info: TypeInfo) -> Self {
        self.types.push(info);
        self
    }

    pub fn build(self) -> TypeRegistry {
        let mut types = HashMap::new();
        for info in self.types {
            types.insert(info.ty.full_name(), Arc::new(info));
        }
        let mut short_names: HashMap<String, Vec<String>> = HashMap::new();
        for (full, info) in &types {
            short_names
                .entry(info.ty.name.clone())
                .or_default()
                .push(full.clone());
        }
        TypeRegistry { types, short_names }
    }
}

/// What a member descriptor asks for.
#[derive(Debug, Clone)]
pub struct MemberQuery<'a> {
    pub kind: MemberKind,
    pub name: &'a str,
    pub is_static: bool,
    pub visibility: Visibility,
    /// Parameter types with their by-ref modifiers, in order.
    pub parameters: &'a [(TypeRef, bool)],
}

impl TypeRegistry {
    pub fn builder() -> TypeRegistryBuilder {
        TypeRegistryBuilder::default()
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn lookup_full(&self, full_name: &str) -> Option<&Arc<TypeInfo>> {
        self.types.get(full_name)
    }

    /// Look a type up by its unqualified name. Two registered types sharing
    /// the name make the lookup ambiguous.
    pub fn lookup_short(&self, name: &str) -> Result<Option<&Arc<TypeInfo>>> {
        match self.short_names.get(name).map(Vec::as_slice) {
            None | Some([]) => Ok(None),
            Some([full]) => Ok(self.types.get(full)),
            Some(_) => Err(TransformError::unknown_type(name)),
        }
    }

    /// Metadata of a named type, checking the module as well as the name.
    pub fn info(&self, ty: &TypeRef) -> Option<&Arc<TypeInfo>> {
        match ty {
            TypeRef::Named(named) => self
                .types
                .get(&named.full_name())
                .filter(|info| info.ty.module == named.module),
            _ => None,
        }
    }

    pub fn enum_info(&self, ty: &TypeRef) -> Option<&EnumInfo> {
        match &self.info(ty)?.kind {
            TypeKind::Enum(info) => Some(info),
            _ => None,
        }
    }

    pub fn record_info(&self, ty: &TypeRef) -> Option<&RecordInfo> {
        match &self.info(ty)?.kind {
            TypeKind::Record(info) => Some(info),
            _ => None,
        }
    }

    /// Every member visible on `ty`, registered or synthesized.
    pub fn members_of(&self, ty: &TypeRef) -> Vec<Arc<MemberInfo>> {
        match ty {
            TypeRef::Named(_) => self
                .info(ty)
                .map(|info| info.members.clone())
                .unwrap_or_default(),
            _ => builtin_members(ty).into_iter().map(Arc::new).collect(),
        }
    }

    /// Resolve a member descriptor to exactly one member of `declaring`.
    pub fn resolve_member(
        &self,
        declaring: &TypeRef,
        query: &MemberQuery<'_>,
    ) -> Result<Arc<MemberInfo>> {
        let unresolved = |reason: String| TransformError::UnresolvedMember {
            declaring_type: declaring.to_string(),
            member: query.name.to_string(),
            reason,
        };
        if matches!(declaring, TypeRef::Named(_)) && self.info(declaring).is_none() {
            return Err(TransformError::unknown_type(declaring.to_string()));
        }

        let mut matches = self.members_of(declaring).into_iter().filter(|member| {
            member.kind == query.kind
                && member.name == query.name
                && member.is_static == query.is_static
                && member.visibility == query.visibility
                && signature_matches(&member.parameters, query.parameters)
        });
        let first = matches
            .next()
            .ok_or_else(|| unresolved("no member matches the descriptor".to_string()))?;
        let extra = matches.count();
        if extra > 0 {
            return Err(unresolved(format!(
                "{} members match the descriptor",
                extra + 1
            )));
        }
        Ok(first)
    }

    /// The single public constructor of a record type.
    pub fn record_constructor(&self, ty: &TypeRef) -> Result<Arc<MemberInfo>> {
        let mut constructors = self.members_of(ty).into_iter().filter(|m| {
            m.kind == MemberKind::Constructor && m.visibility == Visibility::Public && !m.is_static
        });
        match (constructors.next(), constructors.next()) {
            (Some(ctor), None) => Ok(ctor),
            (None, _) => Err(TransformError::malformed(
                "record",
                format!("type '{ty}' has no public constructor"),
            )),
            (Some(_), Some(_)) => Err(TransformError::malformed(
                "record",
                format!("type '{ty}' has more than one public constructor"),
            )),
        }
    }
}

fn signature_matches(parameters: &[ParameterInfo], wanted: &[(TypeRef, bool)]) -> bool {
    parameters.len() == wanted.len()
        && parameters
            .iter()
            .zip(wanted)
            .all(|(param, (ty, by_ref))| param.ty == *ty && param.by_ref == *by_ref)
}

fn builtin_members(ty: &TypeRef) -> Vec<MemberInfo> {
    let int32 = TypeRef::INT32;
    match ty {
        TypeRef::Primitive(Primitive::Void) => Vec::new(),
        TypeRef::Primitive(Primitive::String) => vec![
            MemberInfo::property("Length", int32.clone()),
            MemberInfo::indexer(
                "Chars",
                vec![ParameterInfo::new("index", int32)],
                TypeRef::CHAR,
            ),
            MemberInfo::method(
                "Concat",
                vec![
                    ParameterInfo::new("first", TypeRef::STRING),
                    ParameterInfo::new("second", TypeRef::STRING),
                ],
                TypeRef::STRING,
            )
            .make_static(),
            MemberInfo::method(
                "Contains",
                vec![ParameterInfo::new("value", TypeRef::STRING)],
                TypeRef::BOOL,
            ),
            MemberInfo::method("ToUpper", Vec::new(), TypeRef::STRING),
            MemberInfo::method("ToString", Vec::new(), TypeRef::STRING),
        ],
        TypeRef::Primitive(_) => vec![MemberInfo::method("ToString", Vec::new(), TypeRef::STRING)],
        TypeRef::Nullable(inner) => vec![
            MemberInfo::property("HasValue", TypeRef::BOOL),
            MemberInfo::property("Value", (**inner).clone()),
            MemberInfo::method("GetValueOrDefault", Vec::new(), (**inner).clone()),
        ],
        TypeRef::Sequence(CollectionShape::Array, element) => vec![
            MemberInfo::property("Length", int32.clone()),
            MemberInfo::indexer(
                "Item",
                vec![ParameterInfo::new("index", int32)],
                (**element).clone(),
            ),
        ],
        TypeRef::Sequence(shape, element) => {
            let mut members = vec![
                MemberInfo::constructor(Vec::new()),
                MemberInfo::property("Count", int32.clone()),
                MemberInfo::method(
                    "Add",
                    vec![ParameterInfo::new("item", (**element).clone())],
                    TypeRef::VOID,
                ),
            ];
            if matches!(
                shape,
                CollectionShape::List
                    | CollectionShape::Collection
                    | CollectionShape::ReadOnlyCollection
                    | CollectionShape::ImmutableArray
                    | CollectionShape::ImmutableList
            ) {
                members.push(MemberInfo::indexer(
                    "Item",
                    vec![ParameterInfo::new("index", int32)],
                    (**element).clone(),
                ));
            }
            members
        }
        TypeRef::Dictionary(_, key, value) => vec![
            MemberInfo::constructor(Vec::new()),
            MemberInfo::property("Count", int32),
            MemberInfo::method(
                "Add",
                vec![
                    ParameterInfo::new("key", (**key).clone()),
                    ParameterInfo::new("value", (**value).clone()),
                ],
                TypeRef::VOID,
            ),
            MemberInfo::method(
                "ContainsKey",
                vec![ParameterInfo::new("key", (**key).clone())],
                TypeRef::BOOL,
            ),
            MemberInfo::indexer(
                "Item",
                vec![ParameterInfo::new("key", (**key).clone())],
                (**value).clone(),
            ),
        ],
        TypeRef::Tuple(_, items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| MemberInfo::property(format!("Item{}", i + 1), item.clone()))
            .collect(),
        TypeRef::Func(parameters, result) => vec![MemberInfo::method(
            "Invoke",
            delegate_parameters(parameters),
            (**result).clone(),
        )],
        TypeRef::Action(parameters) => vec![MemberInfo::method(
            "Invoke",
            delegate_parameters(parameters),
            TypeRef::VOID,
        )],
        TypeRef::Named(_) => Vec::new(),
    }
}

fn delegate_parameters(parameters: &[TypeRef]) -> Vec<ParameterInfo> {
    parameters
        .iter()
        .enumerate()
        .map(|(i, ty)| ParameterInfo::new(format!("arg{}", i + 1), ty.clone()))
        .collect()
}
