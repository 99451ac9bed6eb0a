//! Member descriptors.
//!
//! ```text
//! <method declaring-type="string" name="Concat" static="true">
//!   <parameter type="string"/>
//!   <parameter type="string"/>
//! </method>
//! ```
//!
//! The tag is the member kind. `visibility` is written only when it is not
//! `public`. Decoding resolves the descriptor against the declaring type and
//! must find exactly one member.

use crate::document::Element;
use crate::error::{Result, TransformError};
use crate::types::registry::MemberQuery;
use crate::types::{
    decode_type_name, encode_type_name, MemberKind, MemberRef, NamingConvention, TypeRegistry,
    Visibility,
};

pub fn encode_member(member: &MemberRef, convention: NamingConvention) -> Element {
    let info = &member.member;
    let mut element = Element::new(info.kind.tag())
        .with_attr(
            "declaring-type",
            encode_type_name(&member.declaring_type, convention),
        )
        .with_attr("name", info.name.as_str())
        .with_flag("static", info.is_static);
    if info.visibility != Visibility::Public {
        element.set_attr("visibility", info.visibility.as_str());
    }
    element.with_children(info.parameters.iter().map(|parameter| {
        Element::new("parameter")
            .with_attr("type", encode_type_name(&parameter.ty, convention))
            .with_flag("by-ref", parameter.by_ref)
    }))
}

/// Whether `tag` names a member descriptor.
pub fn is_member_tag(tag: &str) -> bool {
    MemberKind::from_tag(tag).is_some()
}

pub fn decode_member(element: &Element, registry: &TypeRegistry) -> Result<MemberRef> {
    let kind = MemberKind::from_tag(&element.name).ok_or_else(|| TransformError::UnknownTag {
        tag: element.name.clone(),
        parent: "member descriptor".to_string(),
    })?;
    let declaring_type = decode_type_name(element.required_attr("declaring-type")?, registry)?;
    let name = element.required_attr("name")?;
    let is_static = element.flag("static")?;
    let visibility = match element.attr("visibility") {
        None => Visibility::Public,
        Some(text) => Visibility::parse(text).ok_or_else(|| {
            TransformError::malformed(&element.name, format!("unknown visibility '{text}'"))
        })?,
    };

    let mut parameters = Vec::new();
    for child in element.elements() {
        if child.name != "parameter" {
            return Err(TransformError::UnknownTag {
                tag: child.name.clone(),
                parent: element.name.clone(),
            });
        }
        let ty = decode_type_name(child.required_attr("type")?, registry)?;
        parameters.push((ty, child.flag("by-ref")?));
    }

    let query = MemberQuery {
        kind,
        name,
        is_static,
        visibility,
        parameters: &parameters,
    };
    let member = registry.resolve_member(&declaring_type, &query)?;
    Ok(MemberRef::new(declaring_type, member))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MemberInfo, NamedType, ParameterInfo, TypeInfo, TypeRef};
    use std::sync::Arc;

    fn registry() -> TypeRegistry {
        let account = NamedType::new("Bank", "Account", "bank");
        TypeRegistry::builder()
            .register(
                TypeInfo::class(account.clone())
                    .with_member(MemberInfo::property("Balance", TypeRef::FLOAT64))
                    .with_member(MemberInfo::method(
                        "Deposit",
                        vec![ParameterInfo::new("amount", TypeRef::FLOAT64)],
                        TypeRef::VOID,
                    ))
                    .with_member(MemberInfo::method(
                        "Deposit",
                        vec![ParameterInfo::new("cents", TypeRef::INT64)],
                        TypeRef::VOID,
                    ))
                    .with_member(MemberInfo::method(
                        "TryWithdraw",
                        vec![
                            ParameterInfo::new("amount", TypeRef::FLOAT64),
                            ParameterInfo::by_ref("left", TypeRef::FLOAT64),
                        ],
                        TypeRef::BOOL,
                    ))
                    .with_member(
                        MemberInfo::field("audit", TypeRef::STRING)
                            .with_visibility(Visibility::Private),
                    ),
            )
            .build()
    }

    fn lookup(registry: &TypeRegistry, name: &str, parameters: &[(TypeRef, bool)]) -> MemberRef {
        let ty = TypeRef::named("Bank", "Account", "bank");
        let kind = if parameters.is_empty() && name == "Balance" {
            MemberKind::Property
        } else {
            MemberKind::Method
        };
        let query = MemberQuery {
            kind,
            name,
            is_static: false,
            visibility: Visibility::Public,
            parameters,
        };
        MemberRef::new(ty.clone(), registry.resolve_member(&ty, &query).unwrap())
    }

    #[test]
    fn test_overload_round_trip() {
        let registry = registry();
        let member = lookup(&registry, "Deposit", &[(TypeRef::INT64, false)]);
        let element = encode_member(&member, NamingConvention::Full);
        assert_eq!(element.name, "method");
        assert_eq!(element.attr("declaring-type"), Some("Bank.Account"));
        let back = decode_member(&element, &registry).unwrap();
        assert!(Arc::ptr_eq(&back.member, &member.member));
    }

    #[test]
    fn test_by_ref_is_part_of_signature() {
        let registry = registry();
        let member = lookup(
            &registry,
            "TryWithdraw",
            &[(TypeRef::FLOAT64, false), (TypeRef::FLOAT64, true)],
        );
        let mut element = encode_member(&member, NamingConvention::Short);
        assert_eq!(element.elements().nth(1).and_then(|p| p.attr("by-ref")), Some("true"));

        // Dropping the modifier leaves no matching overload.
        if let Some(crate::document::Node::Element(second)) = element.children.get_mut(1) {
            second.attributes.retain(|(k, _)| k != "by-ref");
        }
        assert!(matches!(
            decode_member(&element, &registry),
            Err(TransformError::UnresolvedMember { .. })
        ));
    }

    #[test]
    fn test_private_field_visibility() {
        let registry = registry();
        let element = Element::new("field")
            .with_attr("declaring-type", "Account")
            .with_attr("name", "audit")
            .with_attr("visibility", "private");
        let member = decode_member(&element, &registry).unwrap();
        assert_eq!(member.kind(), MemberKind::Field);
        let encoded = encode_member(&member, NamingConvention::Short);
        assert_eq!(encoded.attr("visibility"), Some("private"));

        let public = Element::new("field")
            .with_attr("declaring-type", "Account")
            .with_attr("name", "audit");
        assert!(matches!(
            decode_member(&public, &registry),
            Err(TransformError::UnresolvedMember { .. })
        ));
    }

    #[test]
    fn test_missing_name_names_the_tag() {
        let element = Element::new("property").with_attr("declaring-type", "string");
        assert_eq!(
            decode_member(&element, &registry()).unwrap_err(),
            TransformError::missing_attribute("property", "name")
        );
    }
}
