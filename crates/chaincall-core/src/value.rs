//! Runtime value type flowing through the interpreter.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::TypeHash;

/// A dynamically-typed datum threaded through an invocation chain.
///
/// This is the closed tagged union every argument, binding, and result is
/// expressed in. Plain data variants map one-to-one onto JSON; the two
/// handle variants ([`Value::Object`] and [`Value::Type`]) reference live
/// in-process state and are always distinguishable from each other - the
/// interpreter dispatches differently on each.
#[derive(Debug, Clone)]
pub enum Value {
    /// Absent value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value (all integer widths stored as i64).
    Int(i64),
    /// Floating point value (f32 and f64 both stored as f64).
    Float(f64),
    /// String value (owned).
    Str(String),
    /// Ordered sequence of values.
    Seq(Vec<Value>),
    /// String-keyed mapping with deterministic iteration order.
    Map(BTreeMap<String, Value>),
    /// Shared handle to a live host object.
    Object(NativeObject),
    /// First-class reference to a registered type, not an instance of it.
    Type(TypeHandle),
}

impl Value {
    /// Get a human-readable name for this value's kind.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Seq(_) => "seq",
            Value::Map(_) => "map",
            Value::Object(_) => "object",
            Value::Type(_) => "type",
        }
    }

    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Check if this value is a type handle.
    pub fn is_type(&self) -> bool {
        matches!(self, Value::Type(_))
    }

    /// Build a sequence value from anything iterable.
    pub fn seq(items: impl IntoIterator<Item = Value>) -> Self {
        Value::Seq(items.into_iter().collect())
    }

    /// Wrap a host object under the given registered type.
    pub fn object<T: Any + Send + Sync>(type_hash: TypeHash, value: T) -> Self {
        Value::Object(NativeObject::new(type_hash, value))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Seq(a), Value::Seq(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            (Value::Type(a), Value::Type(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    /// Render a value the way it appears in chain error messages.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Str(s) => write!(f, "{:?}", s),
            Value::Seq(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Map(entries) => {
                write!(f, "{{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{:?}: {}", k, v)?;
                }
                write!(f, "}}")
            }
            Value::Object(obj) => write!(f, "<object {}>", obj.type_hash()),
            Value::Type(handle) => write!(f, "<type {}>", handle.name()),
        }
    }
}

/// Shared handle to a live host object.
///
/// The engine borrows objects from the host's object graph for the duration
/// of one chain; it never manages their lifetime. The handle is tagged with
/// the object's registered [`TypeHash`] so the registry can answer "what
/// type is this?" without runtime introspection.
#[derive(Clone)]
pub struct NativeObject {
    type_hash: TypeHash,
    inner: Arc<dyn Any + Send + Sync>,
}

impl NativeObject {
    /// Wrap a host value under the given registered type.
    pub fn new<T: Any + Send + Sync>(type_hash: TypeHash, value: T) -> Self {
        Self {
            type_hash,
            inner: Arc::new(value),
        }
    }

    /// Wrap an already-shared host value.
    pub fn from_arc(type_hash: TypeHash, inner: Arc<dyn Any + Send + Sync>) -> Self {
        Self { type_hash, inner }
    }

    /// The registered type of the wrapped object.
    pub fn type_hash(&self) -> TypeHash {
        self.type_hash
    }

    /// Downcast the wrapped object to a concrete type.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }
}

impl fmt::Debug for NativeObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeObject")
            .field("type_hash", &self.type_hash)
            .finish_non_exhaustive()
    }
}

impl PartialEq for NativeObject {
    fn eq(&self, other: &Self) -> bool {
        // Identity comparison: two handles are equal iff they reference
        // the same host object.
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

/// First-class reference to a registered type.
///
/// Carries the registered name alongside the hash so errors and renderings
/// can name the type without a registry lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeHandle {
    name: String,
    hash: TypeHash,
}

impl TypeHandle {
    /// Create a handle for a registered type.
    pub fn new(name: impl Into<String>, hash: TypeHash) -> Self {
        Self {
            name: name.into(),
            hash,
        }
    }

    /// The registered type name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The registered type hash.
    pub fn hash(&self) -> TypeHash {
        self.hash
    }
}
