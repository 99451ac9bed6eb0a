//! Closed sets of container shapes.
//!
//! A shape is the structural category of a collection or dictionary type. The
//! sets are closed: every shape the engine can name is a variant here, and
//! every match over them is exhaustive.

/// Sequence container shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CollectionShape {
    Array,
    List,
    Enumerable,
    Collection,
    ReadOnlyCollection,
    HashSet,
    SortedSet,
    Queue,
    Stack,
    LinkedList,
    ConcurrentQueue,
    ConcurrentStack,
    ConcurrentBag,
    ArraySegment,
    Memory,
    ReadOnlyMemory,
    ImmutableArray,
    ImmutableList,
    ImmutableHashSet,
    ImmutableSortedSet,
    ImmutableQueue,
    ImmutableStack,
    FrozenSet,
}

impl CollectionShape {
    pub const ALL: [CollectionShape; 23] = [
        CollectionShape::Array,
        CollectionShape::List,
        CollectionShape::Enumerable,
        CollectionShape::Collection,
        CollectionShape::ReadOnlyCollection,
        CollectionShape::HashSet,
        CollectionShape::SortedSet,
        CollectionShape::Queue,
        CollectionShape::Stack,
        CollectionShape::LinkedList,
        CollectionShape::ConcurrentQueue,
        CollectionShape::ConcurrentStack,
        CollectionShape::ConcurrentBag,
        CollectionShape::ArraySegment,
        CollectionShape::Memory,
        CollectionShape::ReadOnlyMemory,
        CollectionShape::ImmutableArray,
        CollectionShape::ImmutableList,
        CollectionShape::ImmutableHashSet,
        CollectionShape::ImmutableSortedSet,
        CollectionShape::ImmutableQueue,
        CollectionShape::ImmutableStack,
        CollectionShape::FrozenSet,
    ];

    /// Generic type name used in type strings (`List<int32>`).
    ///
    /// Arrays have no generic name; they render as `T[]`.
    pub fn name(self) -> &'static str {
        match self {
            CollectionShape::Array => "Array",
            CollectionShape::List => "List",
            CollectionShape::Enumerable => "Enumerable",
            CollectionShape::Collection => "Collection",
            CollectionShape::ReadOnlyCollection => "ReadOnlyCollection",
            CollectionShape::HashSet => "HashSet",
            CollectionShape::SortedSet => "SortedSet",
            CollectionShape::Queue => "Queue",
            CollectionShape::Stack => "Stack",
            CollectionShape::LinkedList => "LinkedList",
            CollectionShape::ConcurrentQueue => "ConcurrentQueue",
            CollectionShape::ConcurrentStack => "ConcurrentStack",
            CollectionShape::ConcurrentBag => "ConcurrentBag",
            CollectionShape::ArraySegment => "ArraySegment",
            CollectionShape::Memory => "Memory",
            CollectionShape::ReadOnlyMemory => "ReadOnlyMemory",
            CollectionShape::ImmutableArray => "ImmutableArray",
            CollectionShape::ImmutableList => "ImmutableList",
            CollectionShape::ImmutableHashSet => "ImmutableHashSet",
            CollectionShape::ImmutableSortedSet => "ImmutableSortedSet",
            CollectionShape::ImmutableQueue => "ImmutableQueue",
            CollectionShape::ImmutableStack => "ImmutableStack",
            CollectionShape::FrozenSet => "FrozenSet",
        }
    }

    /// Namespace (and module) the shape lives in for full and qualified names.
    pub fn namespace(self) -> &'static str {
        match self {
            CollectionShape::Array
            | CollectionShape::ArraySegment
            | CollectionShape::Memory
            | CollectionShape::ReadOnlyMemory => "core",
            CollectionShape::ConcurrentQueue
            | CollectionShape::ConcurrentStack
            | CollectionShape::ConcurrentBag => "collections.concurrent",
            CollectionShape::ImmutableArray
            | CollectionShape::ImmutableList
            | CollectionShape::ImmutableHashSet
            | CollectionShape::ImmutableSortedSet
            | CollectionShape::ImmutableQueue
            | CollectionShape::ImmutableStack => "collections.immutable",
            CollectionShape::FrozenSet => "collections.frozen",
            _ => "collections",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|shape| shape.name() == name)
    }
}

/// Dictionary container shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DictionaryShape {
    Dictionary,
    SortedDictionary,
    SortedList,
    ConcurrentDictionary,
    ReadOnlyDictionary,
    ImmutableDictionary,
    ImmutableSortedDictionary,
    FrozenDictionary,
}

impl DictionaryShape {
    pub const ALL: [DictionaryShape; 8] = [
        DictionaryShape::Dictionary,
        DictionaryShape::SortedDictionary,
        DictionaryShape::SortedList,
        DictionaryShape::ConcurrentDictionary,
        DictionaryShape::ReadOnlyDictionary,
        DictionaryShape::ImmutableDictionary,
        DictionaryShape::ImmutableSortedDictionary,
        DictionaryShape::FrozenDictionary,
    ];

    pub fn name(self) -> &'static str {
        match self {
            DictionaryShape::Dictionary => "Dictionary",
            DictionaryShape::SortedDictionary => "SortedDictionary",
            DictionaryShape::SortedList => "SortedList",
            DictionaryShape::ConcurrentDictionary => "ConcurrentDictionary",
            DictionaryShape::ReadOnlyDictionary => "ReadOnlyDictionary",
            DictionaryShape::ImmutableDictionary => "ImmutableDictionary",
            DictionaryShape::ImmutableSortedDictionary => "ImmutableSortedDictionary",
            DictionaryShape::FrozenDictionary => "FrozenDictionary",
        }
    }

    pub fn namespace(self) -> &'static str {
        match self {
            DictionaryShape::ConcurrentDictionary => "collections.concurrent",
            DictionaryShape::ImmutableDictionary | DictionaryShape::ImmutableSortedDictionary => {
                "collections.immutable"
            }
            DictionaryShape::FrozenDictionary => "collections.frozen",
            _ => "collections",
        }
    }

    /// Whether entries are kept in key order.
    pub fn is_sorted(self) -> bool {
        matches!(
            self,
            DictionaryShape::SortedDictionary
                | DictionaryShape::SortedList
                | DictionaryShape::ImmutableSortedDictionary
        )
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|shape| shape.name() == name)
    }
}

/// Whether a tuple is a value tuple or a reference tuple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TupleKind {
    Value,
    Reference,
}

impl TupleKind {
    pub fn name(self) -> &'static str {
        match self {
            TupleKind::Value => "ValueTuple",
            TupleKind::Reference => "Tuple",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TupleKind::Value => "value",
            TupleKind::Reference => "reference",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_names_are_unique_and_reversible() {
        for shape in CollectionShape::ALL {
            assert_eq!(CollectionShape::from_name(shape.name()), Some(shape));
        }
        for shape in DictionaryShape::ALL {
            assert_eq!(DictionaryShape::from_name(shape.name()), Some(shape));
        }
        assert_eq!(CollectionShape::from_name("Bag"), None);
    }

    #[test]
    fn sorted_dictionary_shapes() {
        assert!(DictionaryShape::SortedList.is_sorted());
        assert!(!DictionaryShape::FrozenDictionary.is_sorted());
    }
}
