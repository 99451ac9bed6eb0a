//! Property-based tests for the type-name codec and literal round trips.

use chrono::{DateTime, Duration, TimeZone, Utc};
use expr_babel::types::{
    decode_type_name, encode_type_name, CollectionShape, DictionaryShape, NamingConvention,
    Primitive, TupleKind, TypeRef, TypeRegistry,
};
use expr_babel::value::Sequence;
use expr_babel::{Expr, Transformer, Value};
use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

const CONVENTIONS: [NamingConvention; 3] = [
    NamingConvention::Short,
    NamingConvention::Full,
    NamingConvention::AssemblyQualified,
];

fn primitive_strategy() -> impl Strategy<Value = TypeRef> {
    proptest::sample::select(Primitive::ALL.to_vec()).prop_map(TypeRef::Primitive)
}

fn collection_shape_strategy() -> impl Strategy<Value = CollectionShape> {
    proptest::sample::select(CollectionShape::ALL.to_vec())
}

fn dictionary_shape_strategy() -> impl Strategy<Value = DictionaryShape> {
    proptest::sample::select(DictionaryShape::ALL.to_vec())
}

/// Built-in type shapes, nested a few levels deep
fn type_strategy() -> impl Strategy<Value = TypeRef> {
    primitive_strategy().prop_recursive(4, 24, 4, |inner| {
        prop_oneof![
            primitive_strategy().prop_map(TypeRef::nullable),
            (collection_shape_strategy(), inner.clone())
                .prop_map(|(shape, element)| TypeRef::sequence(shape, element)),
            (dictionary_shape_strategy(), inner.clone(), inner.clone())
                .prop_map(|(shape, key, value)| TypeRef::dictionary(shape, key, value)),
            (
                prop_oneof![Just(TupleKind::Value), Just(TupleKind::Reference)],
                prop::collection::vec(inner.clone(), 0..4)
            )
                .prop_map(|(kind, items)| TypeRef::Tuple(kind, items)),
            (prop::collection::vec(inner.clone(), 0..3), inner)
                .prop_map(|(parameters, result)| TypeRef::delegate_for(parameters, result)),
        ]
    })
}

/// Text made of characters XML can carry, including the ones that need escaping.
fn text_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 <>&\"'\t\n\r\u{e9}\u{4e2d}\u{1f600}]{0,24}"
}

/// Stack, set and immutable shapes over distinct ints.
fn shaped_sequence_strategy() -> impl Strategy<Value = (Value, TypeRef)> {
    (
        proptest::sample::select(vec![
            CollectionShape::Stack,
            CollectionShape::HashSet,
            CollectionShape::ImmutableList,
            CollectionShape::ImmutableHashSet,
            CollectionShape::ImmutableStack,
            CollectionShape::FrozenSet,
        ]),
        prop::collection::hash_set(any::<i32>(), 0..8),
    )
        .prop_map(|(shape, items)| {
            let items: Vec<Value> = items.into_iter().map(Value::I32).collect();
            let sequence = match shape {
                CollectionShape::Stack => Sequence::Stack(items),
                CollectionShape::HashSet => Sequence::HashSet(items.into_iter().collect()),
                CollectionShape::ImmutableList => Sequence::ImmutableList(Arc::new(items)),
                CollectionShape::ImmutableHashSet => Sequence::ImmutableHashSet(Arc::new(
                    items.into_iter().collect::<HashSet<_>>(),
                )),
                CollectionShape::ImmutableStack => Sequence::ImmutableStack(Arc::new(items)),
                _ => Sequence::FrozenSet(Arc::new(items.into_iter().collect())),
            };
            (
                Value::Sequence(sequence),
                TypeRef::sequence(shape, TypeRef::INT32),
            )
        })
}

fn constant_strategy() -> impl Strategy<Value = (Value, TypeRef)> {
    prop_oneof![
        any::<bool>().prop_map(|v| (Value::Bool(v), TypeRef::BOOL)),
        any::<i8>().prop_map(|v| (Value::I8(v), TypeRef::INT8)),
        any::<u8>().prop_map(|v| (Value::U8(v), TypeRef::UINT8)),
        any::<i16>().prop_map(|v| (Value::I16(v), TypeRef::INT16)),
        any::<u16>().prop_map(|v| (Value::U16(v), TypeRef::UINT16)),
        any::<i32>().prop_map(|v| (Value::I32(v), TypeRef::INT32)),
        any::<u32>().prop_map(|v| (Value::U32(v), TypeRef::UINT32)),
        any::<i64>().prop_map(|v| (Value::I64(v), TypeRef::INT64)),
        any::<u64>().prop_map(|v| (Value::U64(v), TypeRef::UINT64)),
        any::<f32>()
            .prop_filter("finite", |v| v.is_finite())
            .prop_map(|v| (Value::F32(v), TypeRef::FLOAT32)),
        any::<f64>()
            .prop_filter("finite", |v| v.is_finite())
            .prop_map(|v| (Value::F64(v), TypeRef::FLOAT64)),
        text_strategy().prop_map(|v| (Value::String(v), TypeRef::STRING)),
        "[a-zA-Z0-9 <>&\u{e9}]"
            .prop_map(|v| (Value::Char(v.chars().next().unwrap_or('a')), TypeRef::CHAR)),
        (0i64..4_102_444_800, 0u32..1_000_000_000)
            .prop_map(|(secs, nanos)| (Value::DateTime(datetime(secs, nanos)), TypeRef::DATETIME)),
        (-1_000_000_000_000_000i64..1_000_000_000_000_000).prop_map(|nanos| (
            Value::Duration(Duration::nanoseconds(nanos)),
            TypeRef::DURATION
        )),
        any::<u128>().prop_map(|v| (Value::Guid(Uuid::from_u128(v)), TypeRef::GUID)),
        prop::collection::vec(any::<u8>(), 0..32)
            .prop_map(|v| (Value::Bytes(v), TypeRef::array(TypeRef::UINT8))),
        prop::collection::vec(any::<i32>(), 0..8).prop_map(|v| (
            Value::list(v.into_iter().map(Value::I32).collect()),
            TypeRef::list(TypeRef::INT32)
        )),
        prop::collection::vec(prop::option::of(text_strategy()), 0..6).prop_map(|v| (
            Value::list(
                v.into_iter()
                    .map(|item| item.map(Value::String).unwrap_or(Value::Null))
                    .collect()
            ),
            TypeRef::list(TypeRef::STRING)
        )),
        (any::<i32>(), prop::option::of(any::<bool>())).prop_map(|(a, b)| (
            Value::Tuple(vec![Value::I32(a), b.map(Value::Bool).unwrap_or(Value::Null)]),
            TypeRef::Tuple(
                TupleKind::Reference,
                vec![TypeRef::INT32, TypeRef::nullable(TypeRef::BOOL)]
            )
        )),
        shaped_sequence_strategy(),
    ]
}

fn datetime(secs: i64, nanos: u32) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, nanos)
        .single()
        .unwrap_or_else(|| Utc.timestamp_opt(0, 0).unwrap())
}

proptest! {
    #[test]
    fn type_names_round_trip(ty in type_strategy()) {
        let registry = TypeRegistry::empty();
        for convention in CONVENTIONS {
            let name = encode_type_name(&ty, convention);
            let decoded = decode_type_name(&name, &registry)
                .unwrap_or_else(|e| panic!("{name}: {e}"));
            prop_assert_eq!(&decoded, &ty, "{}", name);
            prop_assert_eq!(encode_type_name(&decoded, convention), name);
        }
    }

    #[test]
    fn any_convention_decodes_to_the_same_type(ty in type_strategy()) {
        let registry = TypeRegistry::empty();
        let short = decode_type_name(&encode_type_name(&ty, NamingConvention::Short), &registry).unwrap();
        let full = decode_type_name(&encode_type_name(&ty, NamingConvention::Full), &registry).unwrap();
        prop_assert_eq!(short, full);
    }

    #[test]
    fn constants_round_trip_through_xml((value, ty) in constant_strategy()) {
        let expr = Expr::constant(value, ty);
        let mut transformer = Transformer::default();
        let bytes = transformer.to_bytes(&expr, "xml").unwrap();
        let decoded = transformer.from_bytes(&bytes, "xml").unwrap();
        prop_assert_eq!(decoded, expr);
    }

    #[test]
    fn constants_declared_object_keep_their_value((value, ty) in constant_strategy()) {
        // Bytes and containers carry their own type; only check scalars here.
        prop_assume!(ty.as_primitive().is_some());
        let expr = Expr::constant(value, TypeRef::OBJECT);
        let mut transformer = Transformer::default();
        let document = transformer.encode(&expr).unwrap();
        let decoded = transformer.decode(&document).unwrap();
        prop_assert_eq!(decoded, expr);
    }
}
