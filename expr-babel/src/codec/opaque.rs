//! Fallback serializer for values no built-in literal shape covers.
//!
//! The literal codec wraps whatever fragment the serializer produces in an
//! `<object type="…">` element and hands the same fragment back on decode.
//! Failures are terminal: they surface as `TransformError::Serialization`
//! naming the type.

use crate::document::Element;
use crate::types::TypeRef;
use crate::value::Value;

pub type OpaqueError = Box<dyn std::error::Error + Send + Sync>;

/// Pluggable structural serializer for opaque objects.
pub trait OpaqueSerializer: Send + Sync {
    fn serialize(&self, value: &Value, ty: &TypeRef) -> Result<Element, OpaqueError>;

    fn deserialize(&self, fragment: &Element, ty: &TypeRef) -> Result<Value, OpaqueError>;
}

/// Default serializer: `Value::Opaque` payloads as `<json>` text.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonOpaqueSerializer;

pub const JSON_PAYLOAD_TAG: &str = "json";

impl OpaqueSerializer for JsonOpaqueSerializer {
    fn serialize(&self, value: &Value, ty: &TypeRef) -> Result<Element, OpaqueError> {
        match value {
            Value::Opaque(payload) => {
                let text = serde_json::to_string(payload)?;
                Ok(Element::new(JSON_PAYLOAD_TAG).with_text(text))
            }
            other => Err(format!("{other:?} is not a structural payload for '{ty}'").into()),
        }
    }

    fn deserialize(&self, fragment: &Element, ty: &TypeRef) -> Result<Value, OpaqueError> {
        if fragment.name != JSON_PAYLOAD_TAG {
            return Err(format!(
                "expected <{JSON_PAYLOAD_TAG}> payload for '{ty}', found <{}>",
                fragment.name
            )
            .into());
        }
        let payload: serde_json::Value = serde_json::from_str(&fragment.text())?;
        Ok(Value::Opaque(payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Shape {
        sides: u32,
        label: String,
    }

    #[test]
    fn test_json_payload_round_trip() {
        let shape = Shape {
            sides: 3,
            label: "tri".to_string(),
        };
        let value = Value::opaque(&shape).unwrap();
        let ty = TypeRef::named("Geo", "Shape", "shapes");
        let fragment = JsonOpaqueSerializer.serialize(&value, &ty).unwrap();
        assert_eq!(fragment.name, "json");

        let back = JsonOpaqueSerializer.deserialize(&fragment, &ty).unwrap();
        let shape_back: Shape = back.to_opaque().unwrap().unwrap();
        assert_eq!(shape_back, shape);
    }

    #[test]
    fn test_non_payload_value_fails() {
        let ty = TypeRef::OBJECT;
        assert!(JsonOpaqueSerializer.serialize(&Value::I32(1), &ty).is_err());
        let bad = Element::new("json").with_text("{not json");
        assert!(JsonOpaqueSerializer.deserialize(&bad, &ty).is_err());
    }
}
