//! Collection builders.
//!
//! Every [`CollectionShape`] maps to one [`BuildStrategy`]. The literal
//! decoder hands over the decoded elements in document order and gets back
//! the finished container. Dictionaries go through [`prepare_dictionary`],
//! which returns a mutable [`MapBuilder`] that is frozen into its final shape
//! once every entry is in.

use crate::error::{Result, TransformError};
use crate::types::{CollectionShape, DictionaryShape, TypeRef};
use crate::value::{Dictionary, Sequence, Value};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, LinkedList, VecDeque};
use std::sync::Arc;

/// How a sequence shape is constructed from its decoded elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStrategy {
    /// Collected straight from the element iterator.
    FromEnumerable,
    /// Built over an intermediate fixed-size array.
    FromArray,
    /// Wrapped around an intermediate list.
    FromList,
    /// Stack-like: elements arrive top first and are pushed in reverse.
    Reversed,
    /// Built in the canonical mutable form, then frozen.
    Frozen,
}

pub fn strategy(shape: CollectionShape) -> BuildStrategy {
    match shape {
        CollectionShape::List
        | CollectionShape::Enumerable
        | CollectionShape::HashSet
        | CollectionShape::SortedSet
        | CollectionShape::Queue
        | CollectionShape::LinkedList
        | CollectionShape::ConcurrentQueue => BuildStrategy::FromEnumerable,
        CollectionShape::Array
        | CollectionShape::ArraySegment
        | CollectionShape::Memory
        | CollectionShape::ReadOnlyMemory => BuildStrategy::FromArray,
        CollectionShape::Collection | CollectionShape::ReadOnlyCollection => {
            BuildStrategy::FromList
        }
        CollectionShape::Stack
        | CollectionShape::ConcurrentStack
        | CollectionShape::ConcurrentBag
        | CollectionShape::ImmutableStack => BuildStrategy::Reversed,
        CollectionShape::ImmutableArray
        | CollectionShape::ImmutableList
        | CollectionShape::ImmutableHashSet
        | CollectionShape::ImmutableSortedSet
        | CollectionShape::ImmutableQueue
        | CollectionShape::FrozenSet => BuildStrategy::Frozen,
    }
}

/// Build a sequence of `shape` from elements in encoded order.
///
/// `declared_length` is the `length` attribute of the fragment, if any.
pub fn build_sequence(
    shape: CollectionShape,
    element_type: &TypeRef,
    declared_length: Option<usize>,
    elements: Vec<Value>,
) -> Result<Sequence> {
    if let Some(declared) = declared_length {
        if declared != elements.len() {
            return Err(TransformError::DataIntegrityMismatch {
                tag: "collection".to_string(),
                attribute: "length".to_string(),
                declared,
                actual: elements.len(),
            });
        }
    }

    match strategy(shape) {
        BuildStrategy::FromEnumerable => from_enumerable(shape, element_type, elements),
        BuildStrategy::FromArray => from_array(shape, elements.into_boxed_slice()),
        BuildStrategy::FromList => from_list(shape, elements),
        BuildStrategy::Reversed => reversed(shape, elements),
        BuildStrategy::Frozen => frozen(shape, element_type, elements),
    }
}

fn from_enumerable(
    shape: CollectionShape,
    element_type: &TypeRef,
    elements: Vec<Value>,
) -> Result<Sequence> {
    let sequence = match shape {
        CollectionShape::List => Sequence::List(elements),
        CollectionShape::Enumerable => Sequence::Enumerable(elements),
        CollectionShape::HashSet => Sequence::HashSet(hash_set(element_type, elements)?),
        CollectionShape::SortedSet => Sequence::SortedSet(sorted_set(element_type, elements)?),
        CollectionShape::Queue => Sequence::Queue(elements.into_iter().collect()),
        CollectionShape::LinkedList => {
            Sequence::LinkedList(elements.into_iter().collect::<LinkedList<_>>())
        }
        CollectionShape::ConcurrentQueue => {
            Sequence::ConcurrentQueue(elements.into_iter().collect())
        }
        other => return Err(wrong_strategy(other, BuildStrategy::FromEnumerable)),
    };
    Ok(sequence)
}

fn from_array(shape: CollectionShape, array: Box<[Value]>) -> Result<Sequence> {
    let sequence = match shape {
        CollectionShape::Array => Sequence::Array(array.into_vec()),
        CollectionShape::ArraySegment => Sequence::ArraySegment(Arc::from(array)),
        CollectionShape::Memory => Sequence::Memory(Arc::from(array)),
        CollectionShape::ReadOnlyMemory => Sequence::ReadOnlyMemory(Arc::from(array)),
        other => return Err(wrong_strategy(other, BuildStrategy::FromArray)),
    };
    Ok(sequence)
}

fn from_list(shape: CollectionShape, list: Vec<Value>) -> Result<Sequence> {
    let sequence = match shape {
        CollectionShape::Collection => Sequence::Collection(list),
        CollectionShape::ReadOnlyCollection => Sequence::ReadOnlyCollection(Arc::from(list)),
        other => return Err(wrong_strategy(other, BuildStrategy::FromList)),
    };
    Ok(sequence)
}

fn reversed(shape: CollectionShape, mut elements: Vec<Value>) -> Result<Sequence> {
    // Encoded top first; pushing in reverse puts the top back on top.
    elements.reverse();
    let sequence = match shape {
        CollectionShape::Stack => Sequence::Stack(elements),
        CollectionShape::ConcurrentStack => Sequence::ConcurrentStack(elements),
        CollectionShape::ConcurrentBag => Sequence::ConcurrentBag(elements),
        CollectionShape::ImmutableStack => Sequence::ImmutableStack(Arc::new(elements)),
        other => return Err(wrong_strategy(other, BuildStrategy::Reversed)),
    };
    Ok(sequence)
}

fn frozen(shape: CollectionShape, element_type: &TypeRef, elements: Vec<Value>) -> Result<Sequence> {
    let sequence = match shape {
        CollectionShape::ImmutableArray => Sequence::ImmutableArray(Arc::from(elements)),
        CollectionShape::ImmutableList => Sequence::ImmutableList(Arc::new(elements)),
        CollectionShape::ImmutableHashSet => {
            Sequence::ImmutableHashSet(Arc::new(hash_set(element_type, elements)?))
        }
        CollectionShape::ImmutableSortedSet => {
            Sequence::ImmutableSortedSet(Arc::new(sorted_set(element_type, elements)?))
        }
        CollectionShape::ImmutableQueue => {
            Sequence::ImmutableQueue(Arc::new(elements.into_iter().collect::<VecDeque<_>>()))
        }
        CollectionShape::FrozenSet => {
            Sequence::FrozenSet(Arc::new(hash_set(element_type, elements)?))
        }
        other => return Err(wrong_strategy(other, BuildStrategy::Frozen)),
    };
    Ok(sequence)
}

fn hash_set(element_type: &TypeRef, elements: Vec<Value>) -> Result<HashSet<Value>> {
    let mut set = HashSet::with_capacity(elements.len());
    for element in elements {
        if !set.insert(element) {
            return Err(duplicate_element(element_type));
        }
    }
    Ok(set)
}

fn sorted_set(element_type: &TypeRef, elements: Vec<Value>) -> Result<BTreeSet<Value>> {
    let mut set = BTreeSet::new();
    for element in elements {
        if !set.insert(element) {
            return Err(duplicate_element(element_type));
        }
    }
    Ok(set)
}

fn duplicate_element(element_type: &TypeRef) -> TransformError {
    TransformError::malformed(
        "collection",
        format!("set of '{element_type}' holds the same element twice"),
    )
}

fn wrong_strategy(shape: CollectionShape, strategy: BuildStrategy) -> TransformError {
    TransformError::Internal(format!(
        "shape {} routed to {strategy:?} builder",
        shape.name()
    ))
}

/// Mutable map under construction for a dictionary fragment.
#[derive(Debug)]
pub struct MapBuilder {
    shape: DictionaryShape,
    entries: MapEntries,
}

#[derive(Debug)]
enum MapEntries {
    Hashed(HashMap<Value, Value>),
    Sorted(BTreeMap<Value, Value>),
}

impl MapEntries {
    fn into_hashed(self) -> HashMap<Value, Value> {
        match self {
            MapEntries::Hashed(map) => map,
            MapEntries::Sorted(map) => map.into_iter().collect(),
        }
    }

    fn into_sorted(self) -> BTreeMap<Value, Value> {
        match self {
            MapEntries::Hashed(map) => map.into_iter().collect(),
            MapEntries::Sorted(map) => map,
        }
    }
}

pub fn prepare_dictionary(shape: DictionaryShape) -> MapBuilder {
    let entries = if shape.is_sorted() {
        MapEntries::Sorted(BTreeMap::new())
    } else {
        MapEntries::Hashed(HashMap::new())
    };
    MapBuilder { shape, entries }
}

impl MapBuilder {
    pub fn len(&self) -> usize {
        match &self.entries {
            MapEntries::Hashed(map) => map.len(),
            MapEntries::Sorted(map) => map.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Add an entry. A key seen before is malformed.
    pub fn insert(&mut self, key: Value, value: Value) -> Result<()> {
        let duplicate = match &self.entries {
            MapEntries::Hashed(map) => map.contains_key(&key),
            MapEntries::Sorted(map) => map.contains_key(&key),
        };
        if duplicate {
            return Err(TransformError::malformed(
                "dictionary",
                format!("key {key:?} appears more than once"),
            ));
        }
        match &mut self.entries {
            MapEntries::Hashed(map) => map.insert(key, value),
            MapEntries::Sorted(map) => map.insert(key, value),
        };
        Ok(())
    }

    /// Freeze or wrap the collected entries into the final shape.
    pub fn finish(self) -> Dictionary {
        let entries = self.entries;
        match self.shape {
            DictionaryShape::Dictionary => Dictionary::Dictionary(entries.into_hashed()),
            DictionaryShape::SortedDictionary => {
                Dictionary::SortedDictionary(entries.into_sorted())
            }
            DictionaryShape::SortedList => Dictionary::SortedList(entries.into_sorted()),
            DictionaryShape::ConcurrentDictionary => {
                Dictionary::ConcurrentDictionary(entries.into_hashed())
            }
            DictionaryShape::ReadOnlyDictionary => {
                Dictionary::ReadOnlyDictionary(Arc::new(entries.into_hashed()))
            }
            DictionaryShape::ImmutableDictionary => {
                Dictionary::ImmutableDictionary(Arc::new(entries.into_hashed()))
            }
            DictionaryShape::ImmutableSortedDictionary => {
                Dictionary::ImmutableSortedDictionary(Arc::new(entries.into_sorted()))
            }
            DictionaryShape::FrozenDictionary => {
                Dictionary::FrozenDictionary(Arc::new(entries.into_hashed()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(values: &[i32]) -> Vec<Value> {
        values.iter().copied().map(Value::I32).collect()
    }

    #[test]
    fn test_every_shape_builds_with_its_own_shape() {
        for shape in CollectionShape::ALL {
            let built = build_sequence(shape, &TypeRef::INT32, Some(3), ints(&[1, 2, 3]))
                .unwrap_or_else(|e| panic!("{}: {e}", shape.name()));
            assert_eq!(built.shape(), shape);
            assert_eq!(built.len(), 3);
        }
    }

    #[test]
    fn test_stack_preserves_pop_order() {
        let original = Sequence::Stack(ints(&[1, 2, 3]));
        let encoded: Vec<Value> = original.items().into_iter().cloned().collect();
        assert_eq!(encoded, ints(&[3, 2, 1]));

        let rebuilt = build_sequence(CollectionShape::Stack, &TypeRef::INT32, None, encoded).unwrap();
        assert_eq!(rebuilt, original);
        match rebuilt {
            Sequence::Stack(v) => assert_eq!(v.last(), Some(&Value::I32(3))),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_length_mismatch() {
        let err = build_sequence(CollectionShape::List, &TypeRef::INT32, Some(5), ints(&[1, 2]))
            .unwrap_err();
        assert_eq!(
            err,
            TransformError::DataIntegrityMismatch {
                tag: "collection".to_string(),
                attribute: "length".to_string(),
                declared: 5,
                actual: 2,
            }
        );
    }

    #[test]
    fn test_duplicate_set_element_is_malformed() {
        let err = build_sequence(CollectionShape::HashSet, &TypeRef::INT32, None, ints(&[1, 1]))
            .unwrap_err();
        match err {
            TransformError::MalformedLiteral { message, .. } => assert!(message.contains("int32")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_strategy_classification() {
        assert_eq!(strategy(CollectionShape::List), BuildStrategy::FromEnumerable);
        assert_eq!(strategy(CollectionShape::Memory), BuildStrategy::FromArray);
        assert_eq!(strategy(CollectionShape::ReadOnlyCollection), BuildStrategy::FromList);
        assert_eq!(strategy(CollectionShape::ConcurrentStack), BuildStrategy::Reversed);
        assert_eq!(strategy(CollectionShape::FrozenSet), BuildStrategy::Frozen);
    }

    #[test]
    fn test_dictionary_builder() {
        for shape in DictionaryShape::ALL {
            let mut builder = prepare_dictionary(shape);
            builder.insert(Value::I32(2), Value::str("two")).unwrap();
            builder.insert(Value::I32(1), Value::str("one")).unwrap();
            assert_eq!(builder.len(), 2);
            let map = builder.finish();
            assert_eq!(map.shape(), shape);
            assert_eq!(map.get(&Value::I32(1)), Some(&Value::str("one")));
        }
    }

    #[test]
    fn test_duplicate_key_is_malformed() {
        let mut builder = prepare_dictionary(DictionaryShape::SortedDictionary);
        builder.insert(Value::I32(1), Value::str("a")).unwrap();
        assert!(matches!(
            builder.insert(Value::I32(1), Value::str("b")),
            Err(TransformError::MalformedLiteral { .. })
        ));
    }
}
