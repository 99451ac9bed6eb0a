//! Literal values carried by constant nodes.
//!
//! A [`Value`] is untyped on its own; the declared [`TypeRef`] of the
//! constant (or of the enclosing container slot) says how to read it. Enum
//! values are their numeric value, records are ordered named fields, and
//! opaque objects are a structural `serde_json` payload.
//!
//! Values have a total order and a hash so they can key sets and maps.
//! Floats compare by `total_cmp` and hash by bit pattern; unordered
//! containers compare by their sorted contents.

use crate::types::{CollectionShape, DictionaryShape, Primitive, TypeRef};
use chrono::{DateTime, Duration, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, LinkedList, VecDeque};
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Char(char),
    I8(i8),
    U8(u8),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    F32(f32),
    F64(f64),
    String(String),
    DateTime(DateTime<Utc>),
    Duration(Duration),
    Guid(Uuid),
    /// Numeric value of an enum constant.
    Enum(i128),
    Bytes(Vec<u8>),
    Sequence(Sequence),
    Dictionary(Dictionary),
    Tuple(Vec<Value>),
    /// Record or anonymous composite fields, in declaration order.
    Record(Vec<(String, Value)>),
    Opaque(serde_json::Value),
}

impl Value {
    fn rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Char(_) => 2,
            Value::I8(_) => 3,
            Value::U8(_) => 4,
            Value::I16(_) => 5,
            Value::U16(_) => 6,
            Value::I32(_) => 7,
            Value::U32(_) => 8,
            Value::I64(_) => 9,
            Value::U64(_) => 10,
            Value::F32(_) => 11,
            Value::F64(_) => 12,
            Value::String(_) => 13,
            Value::DateTime(_) => 14,
            Value::Duration(_) => 15,
            Value::Guid(_) => 16,
            Value::Enum(_) => 17,
            Value::Bytes(_) => 18,
            Value::Sequence(_) => 19,
            Value::Dictionary(_) => 20,
            Value::Tuple(_) => 21,
            Value::Record(_) => 22,
            Value::Opaque(_) => 23,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Concrete type of a value whose shape alone determines it.
    ///
    /// Used when a slot is declared as `object`. Enums, records and
    /// containers need their declared type and return `None`.
    pub fn natural_type(&self) -> Option<TypeRef> {
        let primitive = match self {
            Value::Bool(_) => Primitive::Bool,
            Value::Char(_) => Primitive::Char,
            Value::I8(_) => Primitive::Int8,
            Value::U8(_) => Primitive::UInt8,
            Value::I16(_) => Primitive::Int16,
            Value::U16(_) => Primitive::UInt16,
            Value::I32(_) => Primitive::Int32,
            Value::U32(_) => Primitive::UInt32,
            Value::I64(_) => Primitive::Int64,
            Value::U64(_) => Primitive::UInt64,
            Value::F32(_) => Primitive::Float32,
            Value::F64(_) => Primitive::Float64,
            Value::String(_) => Primitive::String,
            Value::DateTime(_) => Primitive::DateTime,
            Value::Duration(_) => Primitive::Duration,
            Value::Guid(_) => Primitive::Guid,
            Value::Bytes(_) => return Some(TypeRef::array(TypeRef::UINT8)),
            Value::Opaque(_) => Primitive::Object,
            _ => return None,
        };
        Some(TypeRef::Primitive(primitive))
    }

    /// Wrap any serde-serializable value as an opaque payload.
    pub fn opaque<T: Serialize>(value: &T) -> Result<Self, serde_json::Error> {
        serde_json::to_value(value).map(Value::Opaque)
    }

    /// Read an opaque payload back into a concrete type.
    pub fn to_opaque<T: DeserializeOwned>(&self) -> Option<Result<T, serde_json::Error>> {
        match self {
            Value::Opaque(payload) => Some(serde_json::from_value(payload.clone())),
            _ => None,
        }
    }

    pub fn list(items: Vec<Value>) -> Self {
        Value::Sequence(Sequence::List(items))
    }

    pub fn str(text: &str) -> Self {
        Value::String(text.to_string())
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Char(a), Value::Char(b)) => a.cmp(b),
            (Value::I8(a), Value::I8(b)) => a.cmp(b),
            (Value::U8(a), Value::U8(b)) => a.cmp(b),
            (Value::I16(a), Value::I16(b)) => a.cmp(b),
            (Value::U16(a), Value::U16(b)) => a.cmp(b),
            (Value::I32(a), Value::I32(b)) => a.cmp(b),
            (Value::U32(a), Value::U32(b)) => a.cmp(b),
            (Value::I64(a), Value::I64(b)) => a.cmp(b),
            (Value::U64(a), Value::U64(b)) => a.cmp(b),
            (Value::F32(a), Value::F32(b)) => a.total_cmp(b),
            (Value::F64(a), Value::F64(b)) => a.total_cmp(b),
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (Value::DateTime(a), Value::DateTime(b)) => a.cmp(b),
            (Value::Duration(a), Value::Duration(b)) => a.cmp(b),
            (Value::Guid(a), Value::Guid(b)) => a.cmp(b),
            (Value::Enum(a), Value::Enum(b)) => a.cmp(b),
            (Value::Bytes(a), Value::Bytes(b)) => a.cmp(b),
            (Value::Sequence(a), Value::Sequence(b)) => a.cmp(b),
            (Value::Dictionary(a), Value::Dictionary(b)) => a.cmp(b),
            (Value::Tuple(a), Value::Tuple(b)) => a.cmp(b),
            (Value::Record(a), Value::Record(b)) => a.cmp(b),
            (Value::Opaque(a), Value::Opaque(b)) => a.to_string().cmp(&b.to_string()),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            Value::Null => {}
            Value::Bool(v) => v.hash(state),
            Value::Char(v) => v.hash(state),
            Value::I8(v) => v.hash(state),
            Value::U8(v) => v.hash(state),
            Value::I16(v) => v.hash(state),
            Value::U16(v) => v.hash(state),
            Value::I32(v) => v.hash(state),
            Value::U32(v) => v.hash(state),
            Value::I64(v) => v.hash(state),
            Value::U64(v) => v.hash(state),
            Value::F32(v) => v.to_bits().hash(state),
            Value::F64(v) => v.to_bits().hash(state),
            Value::String(v) => v.hash(state),
            Value::DateTime(v) => v.hash(state),
            Value::Duration(v) => v.hash(state),
            Value::Guid(v) => v.hash(state),
            Value::Enum(v) => v.hash(state),
            Value::Bytes(v) => v.hash(state),
            Value::Sequence(v) => v.hash(state),
            Value::Dictionary(v) => v.hash(state),
            Value::Tuple(v) => v.hash(state),
            Value::Record(v) => v.hash(state),
            Value::Opaque(v) => v.to_string().hash(state),
        }
    }
}

macro_rules! value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

value_from! {
    bool => Bool,
    char => Char,
    i8 => I8,
    u8 => U8,
    i16 => I16,
    u16 => U16,
    i32 => I32,
    u32 => U32,
    i64 => I64,
    u64 => U64,
    f32 => F32,
    f64 => F64,
    String => String,
    DateTime<Utc> => DateTime,
    Duration => Duration,
    Uuid => Guid,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

/// A sequence container, one variant per [`CollectionShape`].
///
/// Stack-like variants keep their top element last.
#[derive(Debug, Clone)]
pub enum Sequence {
    Array(Vec<Value>),
    List(Vec<Value>),
    Enumerable(Vec<Value>),
    Collection(Vec<Value>),
    ReadOnlyCollection(Arc<[Value]>),
    HashSet(HashSet<Value>),
    SortedSet(BTreeSet<Value>),
    Queue(VecDeque<Value>),
    Stack(Vec<Value>),
    LinkedList(LinkedList<Value>),
    ConcurrentQueue(VecDeque<Value>),
    ConcurrentStack(Vec<Value>),
    ConcurrentBag(Vec<Value>),
    ArraySegment(Arc<[Value]>),
    Memory(Arc<[Value]>),
    ReadOnlyMemory(Arc<[Value]>),
    ImmutableArray(Arc<[Value]>),
    ImmutableList(Arc<Vec<Value>>),
    ImmutableHashSet(Arc<HashSet<Value>>),
    ImmutableSortedSet(Arc<BTreeSet<Value>>),
    ImmutableQueue(Arc<VecDeque<Value>>),
    ImmutableStack(Arc<Vec<Value>>),
    FrozenSet(Arc<HashSet<Value>>),
}

impl Sequence {
    pub fn shape(&self) -> CollectionShape {
        match self {
            Sequence::Array(_) => CollectionShape::Array,
            Sequence::List(_) => CollectionShape::List,
            Sequence::Enumerable(_) => CollectionShape::Enumerable,
            Sequence::Collection(_) => CollectionShape::Collection,
            Sequence::ReadOnlyCollection(_) => CollectionShape::ReadOnlyCollection,
            Sequence::HashSet(_) => CollectionShape::HashSet,
            Sequence::SortedSet(_) => CollectionShape::SortedSet,
            Sequence::Queue(_) => CollectionShape::Queue,
            Sequence::Stack(_) => CollectionShape::Stack,
            Sequence::LinkedList(_) => CollectionShape::LinkedList,
            Sequence::ConcurrentQueue(_) => CollectionShape::ConcurrentQueue,
            Sequence::ConcurrentStack(_) => CollectionShape::ConcurrentStack,
            Sequence::ConcurrentBag(_) => CollectionShape::ConcurrentBag,
            Sequence::ArraySegment(_) => CollectionShape::ArraySegment,
            Sequence::Memory(_) => CollectionShape::Memory,
            Sequence::ReadOnlyMemory(_) => CollectionShape::ReadOnlyMemory,
            Sequence::ImmutableArray(_) => CollectionShape::ImmutableArray,
            Sequence::ImmutableList(_) => CollectionShape::ImmutableList,
            Sequence::ImmutableHashSet(_) => CollectionShape::ImmutableHashSet,
            Sequence::ImmutableSortedSet(_) => CollectionShape::ImmutableSortedSet,
            Sequence::ImmutableQueue(_) => CollectionShape::ImmutableQueue,
            Sequence::ImmutableStack(_) => CollectionShape::ImmutableStack,
            Sequence::FrozenSet(_) => CollectionShape::FrozenSet,
        }
    }

    pub fn len(&self) -> usize {
        self.items().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Elements in enumeration order: front to back, and top to bottom for
    /// stack-like shapes. This is the order they are encoded in.
    pub fn items(&self) -> Vec<&Value> {
        match self {
            Sequence::Array(v)
            | Sequence::List(v)
            | Sequence::Enumerable(v)
            | Sequence::Collection(v) => v.iter().collect(),
            Sequence::ReadOnlyCollection(v)
            | Sequence::ArraySegment(v)
            | Sequence::Memory(v)
            | Sequence::ReadOnlyMemory(v)
            | Sequence::ImmutableArray(v) => v.iter().collect(),
            Sequence::ImmutableList(v) => v.iter().collect(),
            Sequence::HashSet(v) => v.iter().collect(),
            Sequence::ImmutableHashSet(v) | Sequence::FrozenSet(v) => v.iter().collect(),
            Sequence::SortedSet(v) => v.iter().collect(),
            Sequence::ImmutableSortedSet(v) => v.iter().collect(),
            Sequence::Queue(v) | Sequence::ConcurrentQueue(v) => v.iter().collect(),
            Sequence::ImmutableQueue(v) => v.iter().collect(),
            Sequence::LinkedList(v) => v.iter().collect(),
            Sequence::Stack(v) | Sequence::ConcurrentStack(v) | Sequence::ConcurrentBag(v) => {
                v.iter().rev().collect()
            }
            Sequence::ImmutableStack(v) => v.iter().rev().collect(),
        }
    }

    fn is_unordered(&self) -> bool {
        matches!(
            self,
            Sequence::HashSet(_) | Sequence::ImmutableHashSet(_) | Sequence::FrozenSet(_)
        )
    }

    /// Elements in encoding order, with unordered sets sorted so the output
    /// does not depend on hash order.
    pub fn canonical_items(&self) -> Vec<&Value> {
        let mut items = self.items();
        if self.is_unordered() {
            items.sort();
        }
        items
    }
}

impl Ord for Sequence {
    fn cmp(&self, other: &Self) -> Ordering {
        self.shape()
            .cmp(&other.shape())
            .then_with(|| self.canonical_items().cmp(&other.canonical_items()))
    }
}

impl PartialOrd for Sequence {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Sequence {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Sequence {}

impl Hash for Sequence {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.shape().hash(state);
        self.canonical_items().hash(state);
    }
}

/// A dictionary container, one variant per [`DictionaryShape`].
#[derive(Debug, Clone)]
pub enum Dictionary {
    Dictionary(HashMap<Value, Value>),
    SortedDictionary(BTreeMap<Value, Value>),
    SortedList(BTreeMap<Value, Value>),
    ConcurrentDictionary(HashMap<Value, Value>),
    ReadOnlyDictionary(Arc<HashMap<Value, Value>>),
    ImmutableDictionary(Arc<HashMap<Value, Value>>),
    ImmutableSortedDictionary(Arc<BTreeMap<Value, Value>>),
    FrozenDictionary(Arc<HashMap<Value, Value>>),
}

impl Dictionary {
    pub fn shape(&self) -> DictionaryShape {
        match self {
            Dictionary::Dictionary(_) => DictionaryShape::Dictionary,
            Dictionary::SortedDictionary(_) => DictionaryShape::SortedDictionary,
            Dictionary::SortedList(_) => DictionaryShape::SortedList,
            Dictionary::ConcurrentDictionary(_) => DictionaryShape::ConcurrentDictionary,
            Dictionary::ReadOnlyDictionary(_) => DictionaryShape::ReadOnlyDictionary,
            Dictionary::ImmutableDictionary(_) => DictionaryShape::ImmutableDictionary,
            Dictionary::ImmutableSortedDictionary(_) => DictionaryShape::ImmutableSortedDictionary,
            Dictionary::FrozenDictionary(_) => DictionaryShape::FrozenDictionary,
        }
    }

    /// Entries in iteration order.
    pub fn entries(&self) -> Vec<(&Value, &Value)> {
        match self {
            Dictionary::Dictionary(m) | Dictionary::ConcurrentDictionary(m) => m.iter().collect(),
            Dictionary::ReadOnlyDictionary(m)
            | Dictionary::ImmutableDictionary(m)
            | Dictionary::FrozenDictionary(m) => m.iter().collect(),
            Dictionary::SortedDictionary(m) | Dictionary::SortedList(m) => m.iter().collect(),
            Dictionary::ImmutableSortedDictionary(m) => m.iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, key: &Value) -> Option<&Value> {
        match self {
            Dictionary::Dictionary(m) | Dictionary::ConcurrentDictionary(m) => m.get(key),
            Dictionary::ReadOnlyDictionary(m)
            | Dictionary::ImmutableDictionary(m)
            | Dictionary::FrozenDictionary(m) => m.get(key),
            Dictionary::SortedDictionary(m) | Dictionary::SortedList(m) => m.get(key),
            Dictionary::ImmutableSortedDictionary(m) => m.get(key),
        }
    }

    /// Entries sorted by key.
    pub fn canonical_entries(&self) -> Vec<(&Value, &Value)> {
        let mut entries = self.entries();
        entries.sort();
        entries
    }
}

impl Ord for Dictionary {
    fn cmp(&self, other: &Self) -> Ordering {
        self.shape()
            .cmp(&other.shape())
            .then_with(|| self.canonical_entries().cmp(&other.canonical_entries()))
    }
}

impl PartialOrd for Dictionary {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Dictionary {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Dictionary {}

impl Hash for Dictionary {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.shape().hash(state);
        self.canonical_entries().hash(state);
    }
}
