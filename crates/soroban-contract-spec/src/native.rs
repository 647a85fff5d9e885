//! Dynamically typed values on the caller side of a conversion.

use std::collections::BTreeMap;

use serde_json::{Map, Number, Value};

use crate::error::{Result, SpecError};

/// A value as a caller naturally writes it, before the contract spec gives
/// it a concrete `ScVal` type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NativeValue {
    Null,
    Bool(bool),
    /// Machine integer. Wide enough for every 64-bit type and most 128-bit
    /// values; larger magnitudes use [`NativeValue::DecimalString`] or
    /// [`NativeValue::Bytes`].
    Int(i128),
    /// Arbitrary-magnitude decimal with an optional leading `-`.
    DecimalString(String),
    Bytes(Vec<u8>),
    String(String),
    Seq(Vec<NativeValue>),
    Map(BTreeMap<String, NativeValue>),
    /// A union case: the case name plus its tuple values, if any.
    Variant {
        tag: String,
        values: Option<Vec<NativeValue>>,
    },
}

impl NativeValue {
    /// A union case with no values.
    pub fn variant(tag: impl Into<String>) -> Self {
        NativeValue::Variant {
            tag: tag.into(),
            values: None,
        }
    }

    /// A union case carrying tuple values.
    pub fn variant_with(tag: impl Into<String>, values: Vec<NativeValue>) -> Self {
        NativeValue::Variant {
            tag: tag.into(),
            values: Some(values),
        }
    }

    /// An arbitrary-magnitude decimal integer.
    pub fn decimal(s: impl Into<String>) -> Self {
        NativeValue::DecimalString(s.into())
    }

    /// Whether this is [`NativeValue::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, NativeValue::Null)
    }

    /// Short name of the value's shape, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            NativeValue::Null => "null",
            NativeValue::Bool(_) => "bool",
            NativeValue::Int(_) => "integer",
            NativeValue::DecimalString(_) => "decimal string",
            NativeValue::Bytes(_) => "bytes",
            NativeValue::String(_) => "string",
            NativeValue::Seq(_) => "sequence",
            NativeValue::Map(_) => "map",
            NativeValue::Variant { .. } => "variant",
        }
    }

    /// Read a JSON document as a native value.
    ///
    /// Objects with a `"tag"` key become variants (with an optional
    /// `"values"` array); an object whose only key is `"$bytes"` holds hex
    /// encoded raw bytes. Non-integer numbers are rejected.
    pub fn from_json(value: &Value) -> Result<Self> {
        Ok(match value {
            Value::Null => NativeValue::Null,
            Value::Bool(b) => NativeValue::Bool(*b),
            Value::Number(n) => match (n.as_i64(), n.as_u64()) {
                (Some(i), _) => NativeValue::Int(i128::from(i)),
                (None, Some(u)) => NativeValue::Int(i128::from(u)),
                _ => return Err(SpecError::invalid_type(format!("non-integer number {n}"))),
            },
            Value::String(s) => NativeValue::String(s.clone()),
            Value::Array(items) => NativeValue::Seq(
                items
                    .iter()
                    .map(NativeValue::from_json)
                    .collect::<Result<_>>()?,
            ),
            Value::Object(obj) => {
                if let (1, Some(Value::String(hex_str))) = (obj.len(), obj.get("$bytes")) {
                    let bytes = hex::decode(hex_str)
                        .map_err(|e| SpecError::invalid_type(format!("invalid $bytes hex: {e}")))?;
                    return Ok(NativeValue::Bytes(bytes));
                }
                if let Some(tag) = obj.get("tag") {
                    let Value::String(tag) = tag else {
                        return Err(SpecError::invalid_type("variant tag must be a string"));
                    };
                    let values = match obj.get("values") {
                        None | Some(Value::Null) => None,
                        Some(Value::Array(items)) => Some(
                            items
                                .iter()
                                .map(NativeValue::from_json)
                                .collect::<Result<_>>()?,
                        ),
                        Some(_) => {
                            return Err(SpecError::invalid_type("variant values must be an array"))
                        }
                    };
                    return Ok(NativeValue::Variant {
                        tag: tag.clone(),
                        values,
                    });
                }
                NativeValue::Map(
                    obj.iter()
                        .map(|(k, v)| Ok((k.clone(), NativeValue::from_json(v)?)))
                        .collect::<Result<_>>()?,
                )
            }
        })
    }

    /// Render as JSON, the inverse of [`NativeValue::from_json`]. Integers
    /// outside the JSON-safe 64-bit range are written as strings.
    pub fn to_json(&self) -> Value {
        match self {
            NativeValue::Null => Value::Null,
            NativeValue::Bool(b) => Value::Bool(*b),
            NativeValue::Int(i) => {
                if let Ok(v) = i64::try_from(*i) {
                    Value::Number(Number::from(v))
                } else if let Ok(v) = u64::try_from(*i) {
                    Value::Number(Number::from(v))
                } else {
                    Value::String(i.to_string())
                }
            }
            NativeValue::DecimalString(s) | NativeValue::String(s) => Value::String(s.clone()),
            NativeValue::Bytes(b) => {
                let mut obj = Map::new();
                obj.insert("$bytes".into(), Value::String(hex::encode(b)));
                Value::Object(obj)
            }
            NativeValue::Seq(items) => Value::Array(items.iter().map(NativeValue::to_json).collect()),
            NativeValue::Map(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            NativeValue::Variant { tag, values } => {
                let mut obj = Map::new();
                obj.insert("tag".into(), Value::String(tag.clone()));
                if let Some(values) = values {
                    obj.insert(
                        "values".into(),
                        Value::Array(values.iter().map(NativeValue::to_json).collect()),
                    );
                }
                Value::Object(obj)
            }
        }
    }
}

impl From<bool> for NativeValue {
    fn from(b: bool) -> Self {
        NativeValue::Bool(b)
    }
}

macro_rules! from_int {
    ($($t:ty),*) => {
        $(impl From<$t> for NativeValue {
            fn from(v: $t) -> Self {
                NativeValue::Int(i128::from(v))
            }
        })*
    };
}

from_int!(i8, i16, i32, i64, i128, u8, u16, u32, u64);

impl From<&str> for NativeValue {
    fn from(s: &str) -> Self {
        NativeValue::String(s.to_string())
    }
}

impl From<String> for NativeValue {
    fn from(s: String) -> Self {
        NativeValue::String(s)
    }
}

impl From<Vec<u8>> for NativeValue {
    fn from(b: Vec<u8>) -> Self {
        NativeValue::Bytes(b)
    }
}

impl From<&[u8]> for NativeValue {
    fn from(b: &[u8]) -> Self {
        NativeValue::Bytes(b.to_vec())
    }
}

impl From<Vec<NativeValue>> for NativeValue {
    fn from(items: Vec<NativeValue>) -> Self {
        NativeValue::Seq(items)
    }
}

impl From<BTreeMap<String, NativeValue>> for NativeValue {
    fn from(map: BTreeMap<String, NativeValue>) -> Self {
        NativeValue::Map(map)
    }
}

impl<T: Into<NativeValue>> From<Option<T>> for NativeValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(NativeValue::Null, Into::into)
    }
}
