//! Member descriptors and the type-erased invocation thunk.
//!
//! A registered type exposes a table of invocable members. Each member is a
//! [`MemberEntry`]: a static signature ([`MemberDef`]) plus the [`NativeFn`]
//! thunk that executes it. The signature is what overload resolution works
//! over; the thunk is only reached once resolution has picked a winner.

use std::fmt;
use std::sync::Arc;

use bitflags::bitflags;

use crate::call_context::CallContext;
use crate::error::{ConversionError, NativeError};
use crate::type_hash::TypeHash;
use crate::value::Value;

bitflags! {
    /// Flags describing how a member may be invoked.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct MemberTraits: u8 {
        /// Callable on a type handle, with no receiver.
        const STATIC = 1 << 0;
        /// The last declared parameter absorbs the argument tail as a seq.
        const VARIADIC = 1 << 1;
    }
}

/// Declared type tag for one member parameter.
///
/// Arguments arrive untyped, so parameters are declared against this closed
/// tag set and overload resolution scores each argument's natural tag
/// against the declared one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    /// Boolean.
    Bool,
    /// 32-bit signed integer. Accepts integer arguments with a widening
    /// penalty.
    I32,
    /// 64-bit signed integer, the natural tag of integer arguments.
    I64,
    /// 32-bit float. Accepts float arguments with a widening penalty.
    F32,
    /// 64-bit float, the natural tag of float arguments.
    F64,
    /// Any numeric value, accepted at the coercion tier.
    Num,
    /// String.
    Str,
    /// Ordered sequence.
    Seq,
    /// String-keyed mapping.
    Map,
    /// A type handle.
    Type,
    /// An object of (or derived from) the given registered type.
    Object(TypeHash),
    /// The implicit top type: satisfied by every value.
    Any,
}

impl ParamType {
    /// Whether this tag is a primitive kind. A primitive parameter rejects
    /// arguments of any other primitive kind outright.
    pub fn is_primitive(self) -> bool {
        matches!(
            self,
            ParamType::Bool | ParamType::I32 | ParamType::I64 | ParamType::F32 | ParamType::F64
        )
    }

    /// Whether this tag accepts numeric payloads.
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            ParamType::I32 | ParamType::I64 | ParamType::F32 | ParamType::F64 | ParamType::Num
        )
    }

    /// The natural tag of an argument value, or `None` for null (null is
    /// accepted by every parameter and never scored).
    pub fn natural_of(value: &Value) -> Option<ParamType> {
        match value {
            Value::Null => None,
            Value::Bool(_) => Some(ParamType::Bool),
            Value::Int(_) => Some(ParamType::I64),
            Value::Float(_) => Some(ParamType::F64),
            Value::Str(_) => Some(ParamType::Str),
            Value::Seq(_) => Some(ParamType::Seq),
            Value::Map(_) => Some(ParamType::Map),
            Value::Object(obj) => Some(ParamType::Object(obj.type_hash())),
            Value::Type(_) => Some(ParamType::Type),
        }
    }

    /// Coerce an already-resolved argument to this declared tag.
    ///
    /// Resolution has established compatibility, so this is a thin bridge:
    /// integer arguments become floats for float-family parameters and
    /// everything else passes through unchanged. Null always passes.
    pub fn coerce(self, value: Value) -> Result<Value, ConversionError> {
        match (self, value) {
            (_, Value::Null) => Ok(Value::Null),
            (ParamType::F32 | ParamType::F64 | ParamType::Num, Value::Int(n)) => {
                Ok(Value::Float(n as f64))
            }
            (_, value) => Ok(value),
        }
    }
}

/// Static signature of one invocable member.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberDef {
    /// Member name.
    pub name: String,
    /// Declared parameter tags. For variadic members the last tag is the
    /// element type of the absorbed tail.
    pub params: Vec<ParamType>,
    /// Invocation traits.
    pub traits: MemberTraits,
}

impl MemberDef {
    /// Create a new instance-member signature.
    pub fn new(name: impl Into<String>, params: Vec<ParamType>) -> Self {
        Self {
            name: name.into(),
            params,
            traits: MemberTraits::default(),
        }
    }

    /// Create a static-member signature.
    pub fn new_static(name: impl Into<String>, params: Vec<ParamType>) -> Self {
        Self::new(name, params).with_traits(MemberTraits::STATIC)
    }

    /// Add traits to this signature.
    pub fn with_traits(mut self, traits: MemberTraits) -> Self {
        self.traits |= traits;
        self
    }

    /// Mark the signature variadic.
    pub fn variadic(self) -> Self {
        self.with_traits(MemberTraits::VARIADIC)
    }

    /// Whether this member is callable without a receiver.
    pub fn is_static(&self) -> bool {
        self.traits.contains(MemberTraits::STATIC)
    }

    /// Whether this member absorbs an argument tail.
    pub fn is_variadic(&self) -> bool {
        self.traits.contains(MemberTraits::VARIADIC)
    }

    /// Fixed arity: the number of argument positions that map one-to-one
    /// onto declared parameters. For variadic members the last declared
    /// parameter is the tail element type and is excluded.
    pub fn fixed_arity(&self) -> usize {
        if self.is_variadic() {
            self.params.len().saturating_sub(1)
        } else {
            self.params.len()
        }
    }

    /// Whether this signature can receive `count` arguments at all.
    pub fn accepts_arity(&self, count: usize) -> bool {
        if self.is_variadic() {
            count >= self.fixed_arity()
        } else {
            count == self.params.len()
        }
    }

    /// The declared tag scored against argument position `index`.
    /// Positions at or beyond the fixed arity of a variadic member score
    /// against the tail element type.
    pub fn param_at(&self, index: usize) -> ParamType {
        if self.is_variadic() && index >= self.fixed_arity() {
            *self.params.last().unwrap_or(&ParamType::Any)
        } else {
            self.params[index]
        }
    }
}

impl fmt::Display for MemberDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, p) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{:?}", p)?;
        }
        write!(f, ")")
    }
}

/// Registry entry for a member: signature plus implementation.
#[derive(Clone)]
pub struct MemberEntry {
    /// Member signature.
    pub def: MemberDef,
    thunk: NativeFn,
}

impl MemberEntry {
    /// Create a member entry from a signature and a thunk.
    pub fn new(def: MemberDef, thunk: NativeFn) -> Self {
        Self { def, thunk }
    }

    /// Execute the member against a prepared call context.
    pub fn invoke(&self, ctx: &mut CallContext<'_>) -> Result<(), NativeError> {
        self.thunk.call(ctx)
    }
}

impl fmt::Debug for MemberEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemberEntry")
            .field("def", &self.def)
            .finish_non_exhaustive()
    }
}

/// Type-erased member implementation.
///
/// Wraps any callable implementing [`NativeCallable`] so members of
/// different shapes can be stored uniformly in a type's member table.
/// The inner callable is shared via `Arc` so entries clone cheaply.
#[derive(Clone)]
pub struct NativeFn {
    inner: Arc<dyn NativeCallable + Send + Sync>,
}

impl NativeFn {
    /// Wrap a callable.
    pub fn new<F>(f: F) -> Self
    where
        F: NativeCallable + Send + Sync + 'static,
    {
        Self { inner: Arc::new(f) }
    }

    /// Call the wrapped implementation.
    pub fn call(&self, ctx: &mut CallContext<'_>) -> Result<(), NativeError> {
        self.inner.call(ctx)
    }
}

impl fmt::Debug for NativeFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFn").finish_non_exhaustive()
    }
}

/// Trait for callable member implementations.
///
/// The `call` method receives a [`CallContext`] that exposes the receiver
/// and arguments and accepts the return value.
pub trait NativeCallable {
    /// Execute against the given context.
    fn call(&self, ctx: &mut CallContext<'_>) -> Result<(), NativeError>;
}

impl<F> NativeCallable for F
where
    F: Fn(&mut CallContext<'_>) -> Result<(), NativeError>,
{
    fn call(&self, ctx: &mut CallContext<'_>) -> Result<(), NativeError> {
        (self)(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_arity_and_acceptance() {
        let plain = MemberDef::new("put", vec![ParamType::Str, ParamType::Any]);
        assert_eq!(plain.fixed_arity(), 2);
        assert!(plain.accepts_arity(2));
        assert!(!plain.accepts_arity(1));
        assert!(!plain.accepts_arity(3));

        let variadic = MemberDef::new("of", vec![ParamType::Any]).variadic();
        assert_eq!(variadic.fixed_arity(), 0);
        assert!(variadic.accepts_arity(0));
        assert!(variadic.accepts_arity(5));
    }

    #[test]
    fn variadic_tail_positions_score_against_element_type() {
        let def = MemberDef::new("join", vec![ParamType::Str, ParamType::I64]).variadic();
        assert_eq!(def.param_at(0), ParamType::Str);
        assert_eq!(def.param_at(1), ParamType::I64);
        assert_eq!(def.param_at(4), ParamType::I64);
    }

    #[test]
    fn natural_tags() {
        assert_eq!(ParamType::natural_of(&Value::Null), None);
        assert_eq!(ParamType::natural_of(&Value::Int(1)), Some(ParamType::I64));
        assert_eq!(
            ParamType::natural_of(&Value::Float(1.0)),
            Some(ParamType::F64)
        );
        assert_eq!(
            ParamType::natural_of(&Value::Str("x".into())),
            Some(ParamType::Str)
        );
    }

    #[test]
    fn coerce_int_to_float_family() {
        assert_eq!(
            ParamType::F64.coerce(Value::Int(3)).unwrap(),
            Value::Float(3.0)
        );
        assert_eq!(
            ParamType::Num.coerce(Value::Int(3)).unwrap(),
            Value::Float(3.0)
        );
        assert_eq!(ParamType::I64.coerce(Value::Int(3)).unwrap(), Value::Int(3));
        assert_eq!(ParamType::Str.coerce(Value::Null).unwrap(), Value::Null);
    }

    #[test]
    fn signature_display() {
        let def = MemberDef::new("indexOf", vec![ParamType::Str, ParamType::I64]);
        assert_eq!(def.to_string(), "indexOf(Str, I64)");
    }
}
