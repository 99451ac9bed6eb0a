//! Literal values ↔ document fragments.
//!
//! Encoding dispatches on the declared type: primitive, enum, nullable,
//! record, byte array, dictionary, sequence, tuple, then the opaque
//! fallback. Decoding dispatches on the fragment tag. A `type` attribute
//! always holds the declared type; primitive fragments omit it when the tag
//! already implies it.
//!
//! ```text
//! <int>5</int>
//! <int type="object">5</int>
//! <nullable type="int32" nil="true"/>
//! <collection type="List<int32>" element-type="int32" length="2"><int>1</int><int>2</int></collection>
//! ```

use super::collections::{build_sequence, prepare_dictionary};
use super::opaque::OpaqueSerializer;
use crate::document::Element;
use crate::error::{Result, TransformError};
use crate::types::{
    decode_type_name, encode_type_name, CollectionShape, DictionaryShape, EnumInfo,
    NamingConvention, Primitive, RecordInfo, TupleKind, TypeRef, TypeRegistry,
};
use crate::value::Value;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use uuid::Uuid;

const SHAPE_TAGS: [&str; 9] = [
    "null",
    "nullable",
    "enum",
    "bytes",
    "collection",
    "dictionary",
    "tuple",
    "record",
    "object",
];

/// Every tag a literal fragment can have.
pub fn literal_tags() -> impl Iterator<Item = &'static str> {
    Primitive::ALL
        .into_iter()
        .filter_map(Primitive::literal_tag)
        .chain(SHAPE_TAGS)
}

pub struct LiteralCodec<'a> {
    registry: &'a TypeRegistry,
    convention: NamingConvention,
    opaque: &'a dyn OpaqueSerializer,
}

impl<'a> LiteralCodec<'a> {
    pub fn new(
        registry: &'a TypeRegistry,
        convention: NamingConvention,
        opaque: &'a dyn OpaqueSerializer,
    ) -> Self {
        LiteralCodec {
            registry,
            convention,
            opaque,
        }
    }

    fn name(&self, ty: &TypeRef) -> String {
        encode_type_name(ty, self.convention)
    }

    fn type_attr(&self, element: &Element) -> Result<Option<TypeRef>> {
        element
            .attr("type")
            .map(|text| decode_type_name(text, self.registry))
            .transpose()
    }

    fn required_type(&self, element: &Element) -> Result<TypeRef> {
        decode_type_name(element.required_attr("type")?, self.registry)
    }

    // ---- encode ----

    pub fn encode(&self, value: &Value, declared: &TypeRef) -> Result<Element> {
        if value.is_null() {
            return self.encode_null(declared);
        }
        if let Some(primitive) = declared.as_primitive() {
            return self.encode_primitive(value, primitive);
        }
        if let Some(info) = self.registry.enum_info(declared) {
            return self.encode_enum(value, declared, info);
        }
        if let TypeRef::Nullable(inner) = declared {
            let fragment = self.encode(value, inner)?;
            return Ok(Element::new("nullable")
                .with_attr("type", self.name(inner))
                .with_comment(format!(" {} ", inner))
                .with_child(fragment));
        }
        if let Some(info) = self.registry.record_info(declared) {
            return self.encode_record(value, declared, info);
        }
        match declared {
            TypeRef::Sequence(CollectionShape::Array, element)
                if **element == TypeRef::UINT8 && matches!(value, Value::Bytes(_)) =>
            {
                self.encode_bytes(value)
            }
            TypeRef::Dictionary(shape, key, item) => {
                self.encode_dictionary(value, declared, *shape, key, item)
            }
            TypeRef::Sequence(shape, element) => {
                self.encode_sequence(value, declared, *shape, element)
            }
            TypeRef::Tuple(kind, items) => self.encode_tuple(value, declared, *kind, items),
            _ => self.encode_opaque(value, declared),
        }
    }

    fn encode_null(&self, declared: &TypeRef) -> Result<Element> {
        match declared {
            TypeRef::Nullable(inner) => Ok(Element::new("nullable")
                .with_attr("type", self.name(inner))
                .with_flag("nil", true)),
            ty if ty.accepts_null() && self.registry.enum_info(ty).is_none() => {
                Ok(Element::new("null").with_attr("type", self.name(ty)))
            }
            ty => Err(TransformError::malformed(
                "null",
                format!("'{ty}' cannot hold null"),
            )),
        }
    }

    fn encode_primitive(&self, value: &Value, primitive: Primitive) -> Result<Element> {
        match primitive {
            Primitive::Object => return self.encode_as_object(value),
            Primitive::Void => {
                return Err(TransformError::malformed("constant", "void has no values"))
            }
            _ => {}
        }
        let tag = primitive.literal_tag().unwrap_or("constant");
        let text = match (primitive, value) {
            (Primitive::Bool, Value::Bool(v)) => v.to_string(),
            (Primitive::Char, Value::Char(v)) => checked_text(tag, v.to_string())?,
            (Primitive::Int8, Value::I8(v)) => v.to_string(),
            (Primitive::UInt8, Value::U8(v)) => v.to_string(),
            (Primitive::Int16, Value::I16(v)) => v.to_string(),
            (Primitive::UInt16, Value::U16(v)) => v.to_string(),
            (Primitive::Int32, Value::I32(v)) => v.to_string(),
            (Primitive::UInt32, Value::U32(v)) => v.to_string(),
            (Primitive::Int64, Value::I64(v)) => v.to_string(),
            (Primitive::UInt64, Value::U64(v)) => v.to_string(),
            (Primitive::Float32, Value::F32(v)) => v.to_string(),
            (Primitive::Float64, Value::F64(v)) => v.to_string(),
            (Primitive::String, Value::String(v)) => checked_text(tag, v.clone())?,
            (Primitive::DateTime, Value::DateTime(v)) => {
                v.to_rfc3339_opts(SecondsFormat::AutoSi, true)
            }
            (Primitive::Duration, Value::Duration(v)) => v
                .num_nanoseconds()
                .ok_or_else(|| TransformError::malformed(tag, "duration overflows nanoseconds"))?
                .to_string(),
            (Primitive::Guid, Value::Guid(v)) => v.hyphenated().to_string(),
            (_, other) => return Err(mismatch(tag, primitive.name(), other)),
        };
        Ok(Element::new(tag).with_text(text))
    }

    /// A value declared as `object` is written in the shape of its concrete
    /// type, tagged with `type="object"`.
    fn encode_as_object(&self, value: &Value) -> Result<Element> {
        let concrete = value.natural_type().ok_or_else(|| {
            TransformError::malformed(
                "object",
                format!("cannot infer the concrete type of {value:?}"),
            )
        })?;
        if concrete == TypeRef::OBJECT {
            return self.encode_opaque(value, &TypeRef::OBJECT);
        }
        let mut fragment = self.encode(value, &concrete)?;
        fragment.set_attr("type", self.name(&TypeRef::OBJECT));
        Ok(fragment)
    }

    fn encode_enum(&self, value: &Value, declared: &TypeRef, info: &EnumInfo) -> Result<Element> {
        let number = match value {
            Value::Enum(n) => *n,
            other => return Err(mismatch("enum", &declared.to_string(), other)),
        };
        check_enum_range(info, number)?;
        let mut element = Element::new("enum")
            .with_attr("type", self.name(declared))
            .with_attr("value", number.to_string());
        if info.underlying != Primitive::Int32 {
            element.set_attr("underlying", info.underlying.name());
        }
        Ok(element.with_text(enum_text(info, number)))
    }

    fn encode_record(&self, value: &Value, declared: &TypeRef, info: &RecordInfo) -> Result<Element> {
        let fields = match value {
            Value::Record(fields) => fields,
            other => return Err(mismatch("record", &declared.to_string(), other)),
        };
        let mut element = Element::new("record").with_attr("type", self.name(declared));
        for (index, (name, ty)) in info.properties.iter().enumerate() {
            let field = match fields.get(index) {
                Some((field, value)) if field == name => value,
                Some((field, _)) => {
                    return Err(TransformError::malformed(
                        "record",
                        format!(
                            "property {} of '{declared}' is '{name}', found '{field}'",
                            index + 1
                        ),
                    ))
                }
                None => {
                    return Err(TransformError::malformed(
                        "record",
                        format!("value of '{declared}' lacks property '{name}'"),
                    ))
                }
            };
            let property = Element::new("property").with_attr("name", name.as_str());
            element.push(self.encode_slot(property, field, ty)?);
        }
        if let Some((extra, _)) = fields.get(info.properties.len()) {
            return Err(TransformError::malformed(
                "record",
                format!("'{declared}' has no property '{extra}' after its declared ones"),
            ));
        }
        Ok(element)
    }

    /// Fill a named slot (record property, tuple item): `nil="true"` for
    /// null, otherwise the encoded value as the only child.
    fn encode_slot(&self, slot: Element, value: &Value, ty: &TypeRef) -> Result<Element> {
        let slot = slot.with_attr("type", self.name(ty));
        if value.is_null() {
            if !ty.accepts_null() && !matches!(ty, TypeRef::Nullable(_)) {
                return Err(TransformError::malformed(
                    slot.name.as_str(),
                    format!("'{ty}' cannot hold null"),
                ));
            }
            return Ok(slot.with_flag("nil", true));
        }
        Ok(slot.with_child(self.encode(value, ty)?))
    }

    fn encode_bytes(&self, value: &Value) -> Result<Element> {
        match value {
            Value::Bytes(bytes) => Ok(Element::new("bytes")
                .with_attr("length", bytes.len().to_string())
                .with_text(BASE64.encode(bytes))),
            other => Err(mismatch("bytes", "uint8[]", other)),
        }
    }

    fn encode_dictionary(
        &self,
        value: &Value,
        declared: &TypeRef,
        shape: DictionaryShape,
        key_type: &TypeRef,
        value_type: &TypeRef,
    ) -> Result<Element> {
        let map = match value {
            Value::Dictionary(map) if map.shape() == shape => map,
            other => return Err(mismatch("dictionary", &declared.to_string(), other)),
        };
        let mut element = Element::new("dictionary")
            .with_attr("type", self.name(declared))
            .with_attr("key-type", self.name(key_type))
            .with_attr("value-type", self.name(value_type))
            .with_attr("count", map.len().to_string());
        for (key, item) in map.canonical_entries() {
            element.push(
                Element::new("entry")
                    .with_child(Element::new("key").with_child(self.encode(key, key_type)?))
                    .with_child(Element::new("value").with_child(self.encode(item, value_type)?)),
            );
        }
        Ok(element)
    }

    fn encode_sequence(
        &self,
        value: &Value,
        declared: &TypeRef,
        shape: CollectionShape,
        element_type: &TypeRef,
    ) -> Result<Element> {
        let sequence = match value {
            Value::Sequence(sequence) if sequence.shape() == shape => sequence,
            other => return Err(mismatch("collection", &declared.to_string(), other)),
        };
        let items = sequence.canonical_items();
        let mut element = Element::new("collection")
            .with_attr("type", self.name(declared))
            .with_attr("element-type", self.name(element_type))
            .with_attr("length", items.len().to_string());
        for item in items {
            element.push(self.encode(item, element_type)?);
        }
        Ok(element)
    }

    fn encode_tuple(
        &self,
        value: &Value,
        declared: &TypeRef,
        kind: TupleKind,
        types: &[TypeRef],
    ) -> Result<Element> {
        let items = match value {
            Value::Tuple(items) if items.len() == types.len() => items,
            other => return Err(mismatch("tuple", &declared.to_string(), other)),
        };
        let mut element = Element::new("tuple")
            .with_attr("type", self.name(declared))
            .with_attr("kind", kind.as_str());
        for (index, (item, ty)) in items.iter().zip(types).enumerate() {
            let slot = Element::new("item").with_attr("name", format!("Item{}", index + 1));
            element.push(self.encode_slot(slot, item, ty)?);
        }
        Ok(element)
    }

    fn encode_opaque(&self, value: &Value, declared: &TypeRef) -> Result<Element> {
        let payload = self
            .opaque
            .serialize(value, declared)
            .map_err(|e| TransformError::Serialization {
                type_name: declared.to_string(),
                message: e.to_string(),
            })?;
        let mut element = Element::new("object");
        if *declared != TypeRef::OBJECT {
            element.set_attr("type", self.name(declared));
        }
        Ok(element.with_child(payload))
    }

    // ---- decode ----

    /// Decode a literal fragment into its value and declared type.
    pub fn decode(&self, element: &Element) -> Result<(Value, TypeRef)> {
        if let Some(primitive) = Primitive::from_literal_tag(&element.name) {
            let value = parse_primitive(primitive, &element.name, &element.text())?;
            let declared = self
                .type_attr(element)?
                .unwrap_or(TypeRef::Primitive(primitive));
            return Ok((value, declared));
        }
        match element.name.as_str() {
            "null" => Ok((Value::Null, self.required_type(element)?)),
            "nullable" => self.decode_nullable(element),
            "enum" => self.decode_enum(element),
            "bytes" => self.decode_bytes(element),
            "collection" => self.decode_sequence(element),
            "dictionary" => self.decode_dictionary(element),
            "tuple" => self.decode_tuple(element),
            "record" => self.decode_record(element),
            "object" => self.decode_opaque(element),
            other => Err(TransformError::UnknownTag {
                tag: other.to_string(),
                parent: "constant".to_string(),
            }),
        }
    }

    /// Decode a fragment that must hold a value of `expected`.
    fn decode_as(&self, element: &Element, expected: &TypeRef) -> Result<Value> {
        let (value, ty) = self.decode(element)?;
        if ty != *expected {
            return Err(TransformError::malformed(
                element.name.as_str(),
                format!("expected a value of '{expected}', found '{ty}'"),
            ));
        }
        Ok(value)
    }

    fn decode_slot(&self, slot: &Element, expected: &TypeRef) -> Result<Value> {
        if slot.flag("nil")? {
            return Ok(Value::Null);
        }
        self.decode_as(slot.single_element()?, expected)
    }

    fn decode_nullable(&self, element: &Element) -> Result<(Value, TypeRef)> {
        let inner = self.required_type(element)?;
        let value = if element.flag("nil")? {
            Value::Null
        } else {
            self.decode_as(element.single_element()?, &inner)?
        };
        Ok((value, TypeRef::nullable(inner)))
    }

    fn decode_enum(&self, element: &Element) -> Result<(Value, TypeRef)> {
        let ty = self.required_type(element)?;
        let info = self.registry.enum_info(&ty).ok_or_else(|| {
            TransformError::malformed("enum", format!("'{ty}' is not an enum type"))
        })?;
        if let Some(underlying) = element.attr("underlying") {
            if Primitive::from_name(underlying) != Some(info.underlying) {
                return Err(TransformError::malformed(
                    "enum",
                    format!(
                        "'{ty}' has underlying type {}, document says {underlying}",
                        info.underlying.name()
                    ),
                ));
            }
        }
        let text = element.text();
        let text = match text.trim() {
            "" => element.required_attr("value")?.to_string(),
            trimmed => trimmed.to_string(),
        };
        let number = parse_enum_text(info, &text)
            .map_err(|message| TransformError::malformed("enum", message))?;
        check_enum_range(info, number)?;
        Ok((Value::Enum(number), ty))
    }

    fn decode_bytes(&self, element: &Element) -> Result<(Value, TypeRef)> {
        let declared_length = element
            .count_attr("length")?
            .ok_or_else(|| TransformError::missing_attribute("bytes", "length"))?;
        let text = element.text();
        let bytes = BASE64
            .decode(text.trim())
            .map_err(|e| TransformError::malformed("bytes", e.to_string()))?;
        if bytes.len() != declared_length {
            return Err(TransformError::DataIntegrityMismatch {
                tag: "bytes".to_string(),
                attribute: "length".to_string(),
                declared: declared_length,
                actual: bytes.len(),
            });
        }
        let declared = self
            .type_attr(element)?
            .unwrap_or_else(|| TypeRef::array(TypeRef::UINT8));
        Ok((Value::Bytes(bytes), declared))
    }

    fn check_component(&self, element: &Element, attribute: &str, expected: &TypeRef) -> Result<()> {
        if let Some(text) = element.attr(attribute) {
            let ty = decode_type_name(text, self.registry)?;
            if ty != *expected {
                return Err(TransformError::malformed(
                    element.name.as_str(),
                    format!("{attribute} '{ty}' disagrees with type '{expected}'"),
                ));
            }
        }
        Ok(())
    }

    fn decode_sequence(&self, element: &Element) -> Result<(Value, TypeRef)> {
        let ty = self.required_type(element)?;
        let (shape, element_type) = match &ty {
            TypeRef::Sequence(shape, element_type) => (*shape, element_type.as_ref()),
            other => {
                return Err(TransformError::malformed(
                    "collection",
                    format!("'{other}' is not a sequence type"),
                ))
            }
        };
        self.check_component(element, "element-type", element_type)?;
        let items = element
            .elements()
            .map(|child| self.decode_as(child, element_type))
            .collect::<Result<Vec<_>>>()?;
        let sequence = build_sequence(shape, element_type, element.count_attr("length")?, items)?;
        Ok((Value::Sequence(sequence), ty))
    }

    fn decode_dictionary(&self, element: &Element) -> Result<(Value, TypeRef)> {
        let ty = self.required_type(element)?;
        let (shape, key_type, value_type) = match &ty {
            TypeRef::Dictionary(shape, key, value) => (*shape, key.as_ref(), value.as_ref()),
            other => {
                return Err(TransformError::malformed(
                    "dictionary",
                    format!("'{other}' is not a dictionary type"),
                ))
            }
        };
        self.check_component(element, "key-type", key_type)?;
        self.check_component(element, "value-type", value_type)?;

        let mut builder = prepare_dictionary(shape);
        for entry in element.elements() {
            if entry.name != "entry" {
                return Err(TransformError::UnknownTag {
                    tag: entry.name.clone(),
                    parent: "dictionary".to_string(),
                });
            }
            let key = self.decode_as(entry.required_child("key")?.single_element()?, key_type)?;
            let value =
                self.decode_as(entry.required_child("value")?.single_element()?, value_type)?;
            builder.insert(key, value)?;
        }
        if let Some(declared) = element.count_attr("count")? {
            if declared != builder.len() {
                return Err(TransformError::DataIntegrityMismatch {
                    tag: "dictionary".to_string(),
                    attribute: "count".to_string(),
                    declared,
                    actual: builder.len(),
                });
            }
        }
        Ok((Value::Dictionary(builder.finish()), ty))
    }

    fn decode_tuple(&self, element: &Element) -> Result<(Value, TypeRef)> {
        let ty = self.required_type(element)?;
        let types = match &ty {
            TypeRef::Tuple(_, types) => types,
            other => {
                return Err(TransformError::malformed(
                    "tuple",
                    format!("'{other}' is not a tuple type"),
                ))
            }
        };
        let slots: Vec<&Element> = element.elements().collect();
        if slots.len() != types.len() {
            return Err(TransformError::malformed(
                "tuple",
                format!("'{ty}' has {} items, found {}", types.len(), slots.len()),
            ));
        }
        let mut items = Vec::with_capacity(types.len());
        for (index, (slot, item_type)) in slots.iter().zip(types).enumerate() {
            let expected_name = format!("Item{}", index + 1);
            if slot.name != "item" || slot.attr("name") != Some(expected_name.as_str()) {
                return Err(TransformError::malformed(
                    "tuple",
                    format!("expected <item name=\"{expected_name}\">"),
                ));
            }
            items.push(self.decode_slot(slot, item_type)?);
        }
        Ok((Value::Tuple(items), ty))
    }

    fn decode_record(&self, element: &Element) -> Result<(Value, TypeRef)> {
        let ty = self.required_type(element)?;
        let info = self.registry.record_info(&ty).ok_or_else(|| {
            TransformError::malformed("record", format!("'{ty}' is not a record type"))
        })?;
        let constructor = self.registry.record_constructor(&ty)?;

        let mut properties = Vec::new();
        for property in element.elements() {
            if property.name != "property" {
                return Err(TransformError::UnknownTag {
                    tag: property.name.clone(),
                    parent: "record".to_string(),
                });
            }
            let name = property.required_attr("name")?;
            let property_type = info
                .properties
                .iter()
                .find(|(p, _)| p == name)
                .map(|(_, t)| t)
                .ok_or_else(|| {
                    TransformError::malformed("record", format!("'{ty}' has no property '{name}'"))
                })?;
            properties.push(Some((name.to_string(), self.decode_slot(property, property_type)?)));
        }

        // Arguments are matched to the constructor's parameters by name,
        // exactly for anonymous composites and ignoring case otherwise.
        let same_name = |property: &str, parameter: &str| {
            if info.anonymous {
                property == parameter
            } else {
                property.eq_ignore_ascii_case(parameter)
            }
        };
        let mut fields = Vec::with_capacity(constructor.parameters.len());
        for parameter in &constructor.parameters {
            let slot = properties
                .iter_mut()
                .find(|p| matches!(p, Some((name, _)) if same_name(name, &parameter.name)))
                .and_then(Option::take)
                .ok_or_else(|| {
                    TransformError::malformed(
                        "record",
                        format!("no property for constructor parameter '{}'", parameter.name),
                    )
                })?;
            fields.push(slot);
        }
        if let Some((unused, _)) = properties.into_iter().flatten().next() {
            return Err(TransformError::malformed(
                "record",
                format!("property '{unused}' matches no constructor parameter"),
            ));
        }
        Ok((Value::Record(fields), ty))
    }

    fn decode_opaque(&self, element: &Element) -> Result<(Value, TypeRef)> {
        let ty = self.type_attr(element)?.unwrap_or(TypeRef::OBJECT);
        let payload = element.single_element()?;
        let value = self
            .opaque
            .deserialize(payload, &ty)
            .map_err(|e| TransformError::Serialization {
                type_name: ty.to_string(),
                message: e.to_string(),
            })?;
        Ok((value, ty))
    }
}

/// Characters an XML 1.0 document can carry, escaped or not.
fn is_xml_char(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}'
    )
}

fn checked_text(tag: &str, text: String) -> Result<String> {
    match text.chars().find(|c| !is_xml_char(*c)) {
        Some(c) => Err(TransformError::malformed(
            tag,
            format!("character U+{:04X} cannot appear in a document", c as u32),
        )),
        None => Ok(text),
    }
}

fn mismatch(tag: &str, expected: &str, found: &Value) -> TransformError {
    TransformError::malformed(tag, format!("expected a value of '{expected}', found {found:?}"))
}

fn parse_primitive(primitive: Primitive, tag: &str, text: &str) -> Result<Value> {
    fn number<T: std::str::FromStr>(tag: &str, text: &str) -> Result<T> {
        text.trim().parse::<T>().map_err(|_| {
            TransformError::malformed(tag, format!("'{text}' is not a valid {tag}"))
        })
    }

    let value = match primitive {
        Primitive::Bool => match text.trim() {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => {
                return Err(TransformError::malformed(
                    tag,
                    format!("'{text}' is not true or false"),
                ))
            }
        },
        Primitive::Char => {
            let mut chars = text.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Value::Char(c),
                _ => {
                    return Err(TransformError::malformed(
                        tag,
                        format!("'{text}' is not a single character"),
                    ))
                }
            }
        }
        Primitive::Int8 => Value::I8(number(tag, text)?),
        Primitive::UInt8 => Value::U8(number(tag, text)?),
        Primitive::Int16 => Value::I16(number(tag, text)?),
        Primitive::UInt16 => Value::U16(number(tag, text)?),
        Primitive::Int32 => Value::I32(number(tag, text)?),
        Primitive::UInt32 => Value::U32(number(tag, text)?),
        Primitive::Int64 => Value::I64(number(tag, text)?),
        Primitive::UInt64 => Value::U64(number(tag, text)?),
        Primitive::Float32 => Value::F32(number(tag, text)?),
        Primitive::Float64 => Value::F64(number(tag, text)?),
        Primitive::String => Value::String(text.to_string()),
        Primitive::DateTime => {
            let parsed = DateTime::parse_from_rfc3339(text.trim())
                .map_err(|e| TransformError::malformed(tag, e.to_string()))?;
            Value::DateTime(parsed.with_timezone(&Utc))
        }
        Primitive::Duration => Value::Duration(Duration::nanoseconds(number(tag, text)?)),
        Primitive::Guid => Value::Guid(
            Uuid::parse_str(text.trim()).map_err(|e| TransformError::malformed(tag, e.to_string()))?,
        ),
        Primitive::Void | Primitive::Object => {
            return Err(TransformError::malformed(tag, "no literal form"))
        }
    };
    Ok(value)
}

fn check_enum_range(info: &EnumInfo, number: i128) -> Result<()> {
    let (min, max) = info
        .underlying
        .integral_range()
        .ok_or_else(|| {
            TransformError::malformed(
                "enum",
                format!("underlying type {} is not integral", info.underlying.name()),
            )
        })?;
    if number < min || number > max {
        return Err(TransformError::malformed(
            "enum",
            format!("{number} overflows {}", info.underlying.name()),
        ));
    }
    Ok(())
}

/// Symbolic text of an enum value: the variant name, the `, `-joined flag
/// names, or the number when neither covers it.
fn enum_text(info: &EnumInfo, number: i128) -> String {
    if let Some(name) = info.variant_name(number) {
        return name.to_string();
    }
    if info.flags && number > 0 {
        let mut covered = 0;
        let mut names = Vec::new();
        for (name, value) in &info.variants {
            if *value != 0 && number & value == *value && covered & value != *value {
                covered |= value;
                names.push(name.as_str());
            }
        }
        if covered == number {
            return names.join(", ");
        }
    }
    number.to_string()
}

fn parse_enum_text(info: &EnumInfo, text: &str) -> std::result::Result<i128, String> {
    if let Ok(number) = text.parse::<i128>() {
        return Ok(number);
    }
    let names: Vec<&str> = text.split(',').map(str::trim).collect();
    if names.len() > 1 && !info.flags {
        return Err(format!("'{text}' combines names of a non-flags enum"));
    }
    names.iter().try_fold(0i128, |acc, name| {
        info.variant_value(name)
            .map(|value| acc | value)
            .ok_or_else(|| format!("unknown enum name '{name}'"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::opaque::JsonOpaqueSerializer;
    use crate::types::{NamedType, TypeInfo};
    use pretty_assertions::assert_eq;
    use crate::value::Sequence;

    fn registry() -> TypeRegistry {
        TypeRegistry::builder()
            .register(TypeInfo::enumeration(
                NamedType::new("Paint", "Color", "paint"),
                Primitive::Int32,
                &[("Red", 1), ("Green", 2), ("Blue", 4)],
            ))
            .register(
                TypeInfo::enumeration(
                    NamedType::new("Io", "Access", "io"),
                    Primitive::UInt8,
                    &[("None", 0), ("Read", 1), ("Write", 2)],
                )
                .flags(),
            )
            .build()
    }

    fn round_trip(codec: &LiteralCodec<'_>, value: Value, ty: TypeRef) -> Element {
        let element = codec.encode(&value, &ty).unwrap();
        let (back, back_ty) = codec.decode(&element).unwrap();
        assert_eq!(back, value);
        assert_eq!(back_ty, ty);
        element
    }

    #[test]
    fn test_int_fragment() {
        let registry = TypeRegistry::empty();
        let codec = LiteralCodec::new(&registry, NamingConvention::Short, &JsonOpaqueSerializer);
        let element = round_trip(&codec, Value::I32(5), TypeRef::INT32);
        assert_eq!(element.name, "int");
        assert_eq!(element.text(), "5");
        assert!(element.attributes.is_empty());
    }

    #[test]
    fn test_object_declared_primitive_keeps_declared_type() {
        let registry = TypeRegistry::empty();
        let codec = LiteralCodec::new(&registry, NamingConvention::Short, &JsonOpaqueSerializer);
        let element = round_trip(&codec, Value::I64(7), TypeRef::OBJECT);
        assert_eq!(element.name, "long");
        assert_eq!(element.attr("type"), Some("object"));
    }

    #[test]
    fn test_null_for_value_type_is_rejected() {
        let registry = TypeRegistry::empty();
        let codec = LiteralCodec::new(&registry, NamingConvention::Short, &JsonOpaqueSerializer);
        assert!(codec.encode(&Value::Null, &TypeRef::INT32).is_err());
        round_trip(&codec, Value::Null, TypeRef::STRING);
    }

    #[test]
    fn test_flags_enum_text() {
        let registry = registry();
        let codec = LiteralCodec::new(&registry, NamingConvention::Short, &JsonOpaqueSerializer);
        let access = TypeRef::named("Io", "Access", "io");
        let element = round_trip(&codec, Value::Enum(3), access);
        assert_eq!(element.text(), "Read, Write");
        assert_eq!(element.attr("underlying"), Some("uint8"));
        assert_eq!(element.attr("value"), Some("3"));
    }

    #[test]
    fn test_enum_errors() {
        let registry = registry();
        let codec = LiteralCodec::new(&registry, NamingConvention::Short, &JsonOpaqueSerializer);
        let unknown = Element::new("enum").with_attr("type", "Color").with_text("Purple");
        assert!(matches!(
            codec.decode(&unknown),
            Err(TransformError::MalformedLiteral { .. })
        ));
        let overflow = Element::new("enum").with_attr("type", "Access").with_text("300");
        assert!(matches!(
            codec.decode(&overflow),
            Err(TransformError::MalformedLiteral { .. })
        ));
        let combined = Element::new("enum").with_attr("type", "Color").with_text("Red, Blue");
        assert!(codec.decode(&combined).is_err());
    }

    #[test]
    fn test_bytes_length_is_checked() {
        let registry = TypeRegistry::empty();
        let codec = LiteralCodec::new(&registry, NamingConvention::Short, &JsonOpaqueSerializer);
        let element = round_trip(&codec, Value::Bytes(vec![1, 2, 3]), TypeRef::array(TypeRef::UINT8));
        assert_eq!(element.text(), "AQID");

        let tampered = Element::new("bytes").with_attr("length", "4").with_text("AQID");
        assert_eq!(
            codec.decode(&tampered).unwrap_err(),
            TransformError::DataIntegrityMismatch {
                tag: "bytes".to_string(),
                attribute: "length".to_string(),
                declared: 4,
                actual: 3,
            }
        );
    }

    #[test]
    fn test_sequence_element_type_must_match() {
        let registry = TypeRegistry::empty();
        let codec = LiteralCodec::new(&registry, NamingConvention::Short, &JsonOpaqueSerializer);
        let element = Element::new("collection")
            .with_attr("type", "List<int32>")
            .with_child(Element::new("string").with_text("x"));
        assert!(matches!(
            codec.decode(&element),
            Err(TransformError::MalformedLiteral { .. })
        ));
    }

    #[test]
    fn test_nested_nullable_in_list() {
        let registry = TypeRegistry::empty();
        let codec = LiteralCodec::new(&registry, NamingConvention::Full, &JsonOpaqueSerializer);
        let ty = TypeRef::list(TypeRef::nullable(TypeRef::INT32));
        round_trip(
            &codec,
            Value::Sequence(Sequence::List(vec![Value::I32(1), Value::Null])),
            ty,
        );
    }

    #[test]
    fn test_opaque_failure_is_serialization_error() {
        let registry = TypeRegistry::empty();
        let codec = LiteralCodec::new(&registry, NamingConvention::Short, &JsonOpaqueSerializer);
        let ty = TypeRef::func(vec![], TypeRef::INT32);
        assert!(matches!(
            codec.encode(&Value::I32(1), &ty),
            Err(TransformError::Serialization { .. })
        ));
    }

    #[test]
    fn test_untyped_object_is_top_type() {
        let registry = TypeRegistry::empty();
        let codec = LiteralCodec::new(&registry, NamingConvention::Short, &JsonOpaqueSerializer);
        let element = Element::new("object").with_child(Element::new("json").with_text("[1,2]"));
        let (value, ty) = codec.decode(&element).unwrap();
        assert_eq!(ty, TypeRef::OBJECT);
        assert_eq!(value, Value::Opaque(serde_json::json!([1, 2])));
    }

    fn point(registry: &TypeRegistry) -> (LiteralCodec<'_>, TypeRef) {
        let codec = LiteralCodec::new(registry, NamingConvention::Short, &JsonOpaqueSerializer);
        (codec, TypeRef::named("Geo", "Point", "shapes"))
    }

    fn point_fields(order: &[&str]) -> Value {
        Value::Record(
            order
                .iter()
                .map(|name| {
                    let value = match *name {
                        "X" => Value::I32(3),
                        "Label" => Value::str("corner"),
                        _ => Value::Null,
                    };
                    (name.to_string(), value)
                })
                .collect(),
        )
    }

    #[test]
    fn test_record_round_trip() {
        let registry = TypeRegistry::builder()
            .register(TypeInfo::record(
                NamedType::new("Geo", "Point", "shapes"),
                vec![
                    ("X", TypeRef::INT32),
                    ("Label", TypeRef::STRING),
                    ("W", TypeRef::nullable(TypeRef::FLOAT64)),
                ],
            ))
            .build();
        let (codec, ty) = point(&registry);
        let element = round_trip(&codec, point_fields(&["X", "Label", "W"]), ty);
        let names: Vec<&str> = element.elements().filter_map(|p| p.attr("name")).collect();
        assert_eq!(names, vec!["X", "Label", "W"]);
        assert_eq!(element.elements().nth(2).and_then(|w| w.attr("nil")), Some("true"));
    }

    #[test]
    fn test_record_fields_must_follow_declaration_order() {
        let registry = TypeRegistry::builder()
            .register(TypeInfo::record(
                NamedType::new("Geo", "Point", "shapes"),
                vec![
                    ("X", TypeRef::INT32),
                    ("Label", TypeRef::STRING),
                    ("W", TypeRef::nullable(TypeRef::FLOAT64)),
                ],
            ))
            .build();
        let (codec, ty) = point(&registry);
        for order in [
            &["W", "X", "Label"][..],
            &["X", "Label"][..],
            &["X", "Label", "W", "X"][..],
        ] {
            assert!(
                matches!(
                    codec.encode(&point_fields(order), &ty),
                    Err(TransformError::MalformedLiteral { .. })
                ),
                "{order:?}"
            );
        }
    }

    #[test]
    fn test_anonymous_composite_round_trip() {
        let registry = TypeRegistry::builder()
            .register(
                TypeInfo::record(
                    NamedType::new("Geo", "Point", "shapes"),
                    vec![("X", TypeRef::INT32), ("Label", TypeRef::STRING)],
                )
                .anonymous(),
            )
            .build();
        let (codec, ty) = point(&registry);
        let element = round_trip(&codec, point_fields(&["X", "Label"]), ty);
        assert_eq!(element.attr("type"), Some("Point"));
    }

    #[test]
    fn test_text_outside_xml_is_rejected() {
        let registry = TypeRegistry::empty();
        let codec = LiteralCodec::new(&registry, NamingConvention::Short, &JsonOpaqueSerializer);
        for text in ["nul\0", "bell\u{7}", "\u{FFFE}"] {
            assert!(matches!(
                codec.encode(&Value::str(text), &TypeRef::STRING),
                Err(TransformError::MalformedLiteral { .. })
            ));
        }
        assert!(matches!(
            codec.encode(&Value::Char('\u{1b}'), &TypeRef::CHAR),
            Err(TransformError::MalformedLiteral { .. })
        ));
        round_trip(&codec, Value::str("tab\there\r\n\u{e9}\u{1f600}"), TypeRef::STRING);
    }

    #[test]
    fn test_opaque_value_round_trip() {
        let registry = TypeRegistry::builder()
            .register(TypeInfo::class(NamedType::new("Geo", "Shape", "shapes")))
            .build();
        let codec = LiteralCodec::new(&registry, NamingConvention::Short, &JsonOpaqueSerializer);
        let ty = TypeRef::named("Geo", "Shape", "shapes");
        let value = Value::Opaque(serde_json::json!({"sides": 3, "name": "triangle"}));
        let element = round_trip(&codec, value, ty);
        assert_eq!(element.name, "object");
        assert_eq!(element.attr("type"), Some("Shape"));
    }
}
