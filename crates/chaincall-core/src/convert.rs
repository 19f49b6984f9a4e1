//! Conversion traits for thunk argument extraction and return values,
//! plus the JSON bridge for request and response documents.
//!
//! - [`FromValue`]: extract a typed Rust value from a [`Value`]
//! - [`IntoValue`]: convert a Rust value into a [`Value`]
//! - [`Value::from_json`] / [`Value::to_json`]: document interop
//!
//! Extraction is strict about kinds (an `Int` slot never satisfies `f64`;
//! the engine coerces numeric arguments to the declared parameter tag
//! before a thunk runs) but bounds-checks every narrowing integer
//! conversion.

use std::collections::BTreeMap;

use serde_json::Value as JsonValue;

use crate::error::ConversionError;
use crate::value::Value;

/// Extract a typed value from a [`Value`].
pub trait FromValue: Sized {
    /// Extract, failing with a [`ConversionError`] on kind mismatch or
    /// out-of-range narrowing.
    fn from_value(value: &Value) -> Result<Self, ConversionError>;
}

/// Convert a Rust value into a [`Value`].
pub trait IntoValue {
    /// Perform the conversion.
    fn into_value(self) -> Value;
}

// ============================================================================
// Integer implementations
// ============================================================================

macro_rules! impl_from_value_int {
    ($($ty:ty),*) => {
        $(
            impl FromValue for $ty {
                fn from_value(value: &Value) -> Result<Self, ConversionError> {
                    match value {
                        Value::Int(v) => <$ty>::try_from(*v).map_err(|_| {
                            ConversionError::IntegerOverflow {
                                value: *v,
                                target: stringify!($ty),
                            }
                        }),
                        other => Err(ConversionError::TypeMismatch {
                            expected: "int",
                            actual: other.kind_name(),
                        }),
                    }
                }
            }

            impl IntoValue for $ty {
                fn into_value(self) -> Value {
                    Value::Int(self as i64)
                }
            }
        )*
    };
}

impl_from_value_int!(i8, i16, i32, i64, u8, u16, u32);

// u64 narrows on the way in rather than out: any non-negative i64 fits,
// but a u64 above i64::MAX has no Int representation.
impl FromValue for u64 {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        match value {
            Value::Int(v) => {
                u64::try_from(*v).map_err(|_| ConversionError::IntegerOverflow {
                    value: *v,
                    target: "u64",
                })
            }
            other => Err(ConversionError::TypeMismatch {
                expected: "int",
                actual: other.kind_name(),
            }),
        }
    }
}

impl IntoValue for u64 {
    fn into_value(self) -> Value {
        match i64::try_from(self) {
            Ok(v) => Value::Int(v),
            Err(_) => Value::Float(self as f64),
        }
    }
}

// ============================================================================
// Float implementations
// ============================================================================

macro_rules! impl_from_value_float {
    ($($ty:ty),*) => {
        $(
            impl FromValue for $ty {
                fn from_value(value: &Value) -> Result<Self, ConversionError> {
                    match value {
                        Value::Float(v) => Ok(*v as $ty),
                        other => Err(ConversionError::TypeMismatch {
                            expected: "float",
                            actual: other.kind_name(),
                        }),
                    }
                }
            }

            impl IntoValue for $ty {
                fn into_value(self) -> Value {
                    Value::Float(self as f64)
                }
            }
        )*
    };
}

impl_from_value_float!(f32, f64);

// ============================================================================
// Remaining payload kinds
// ============================================================================

impl FromValue for bool {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        match value {
            Value::Bool(v) => Ok(*v),
            other => Err(ConversionError::TypeMismatch {
                expected: "bool",
                actual: other.kind_name(),
            }),
        }
    }
}

impl IntoValue for bool {
    fn into_value(self) -> Value {
        Value::Bool(self)
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        match value {
            Value::Str(s) => Ok(s.clone()),
            other => Err(ConversionError::TypeMismatch {
                expected: "string",
                actual: other.kind_name(),
            }),
        }
    }
}

impl IntoValue for String {
    fn into_value(self) -> Value {
        Value::Str(self)
    }
}

impl IntoValue for &str {
    fn into_value(self) -> Value {
        Value::Str(self.to_owned())
    }
}

impl FromValue for Vec<Value> {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        match value {
            Value::Seq(items) => Ok(items.clone()),
            other => Err(ConversionError::TypeMismatch {
                expected: "seq",
                actual: other.kind_name(),
            }),
        }
    }
}

impl IntoValue for Vec<Value> {
    fn into_value(self) -> Value {
        Value::Seq(self)
    }
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        Ok(value.clone())
    }
}

impl IntoValue for Value {
    fn into_value(self) -> Value {
        self
    }
}

impl IntoValue for () {
    fn into_value(self) -> Value {
        Value::Null
    }
}

impl<T: IntoValue> IntoValue for Option<T> {
    fn into_value(self) -> Value {
        match self {
            Some(v) => v.into_value(),
            None => Value::Null,
        }
    }
}

// ============================================================================
// JSON interop
// ============================================================================

impl Value {
    /// Build a value from a JSON document fragment.
    ///
    /// Integers that fit i64 stay integral; everything else numeric becomes
    /// a float. Objects become [`Value::Map`] with deterministic key order.
    pub fn from_json(json: &JsonValue) -> Value {
        match json {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Bool(*b),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else {
                    Value::Float(n.as_f64().unwrap_or_default())
                }
            }
            JsonValue::String(s) => Value::Str(s.clone()),
            JsonValue::Array(items) => Value::Seq(items.iter().map(Value::from_json).collect()),
            JsonValue::Object(entries) => Value::Map(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::from_json(v)))
                    .collect::<BTreeMap<_, _>>(),
            ),
        }
    }

    /// Render a value as a JSON document fragment.
    ///
    /// Object and type handles have no JSON representation and render as
    /// their descriptive string form.
    pub fn to_json(&self) -> JsonValue {
        match self {
            Value::Null => JsonValue::Null,
            Value::Bool(b) => JsonValue::Bool(*b),
            Value::Int(i) => JsonValue::from(*i),
            Value::Float(f) => {
                serde_json::Number::from_f64(*f).map_or(JsonValue::Null, JsonValue::Number)
            }
            Value::Str(s) => JsonValue::String(s.clone()),
            Value::Seq(items) => JsonValue::Array(items.iter().map(Value::to_json).collect()),
            Value::Map(entries) => JsonValue::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            handle @ (Value::Object(_) | Value::Type(_)) => JsonValue::String(handle.to_string()),
        }
    }
}
