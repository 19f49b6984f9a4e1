//! Call context bridging the interpreter and native member thunks.

use std::any::Any;
use std::fmt;

use crate::convert::{FromValue, IntoValue};
use crate::error::NativeError;
use crate::value::Value;

/// Context for one member invocation.
///
/// This is what a [`NativeFn`](crate::NativeFn) thunk sees: the receiver
/// (absent for static calls), the coerced argument list, and a slot for
/// the return value.
///
/// ## Typed argument access
///
/// Use `arg::<T>()` for typed extraction with bounds-checked conversion:
///
/// ```ignore
/// let n: i64 = ctx.arg(0)?;
/// let sep: String = ctx.arg(1)?;
/// ```
///
/// ## Return values
///
/// Use `set_return()` for typed return values; a thunk that never sets one
/// returns null.
pub struct CallContext<'call> {
    receiver: Option<&'call Value>,
    args: &'call [Value],
    ret: Value,
}

impl<'call> CallContext<'call> {
    /// Create a context for an instance call.
    pub fn instance(receiver: &'call Value, args: &'call [Value]) -> Self {
        Self {
            receiver: Some(receiver),
            args,
            ret: Value::Null,
        }
    }

    /// Create a context for a static (receiver-less) call.
    pub fn statics(args: &'call [Value]) -> Self {
        Self {
            receiver: None,
            args,
            ret: Value::Null,
        }
    }

    /// Number of arguments.
    pub fn arg_count(&self) -> usize {
        self.args.len()
    }

    /// Raw reference to an argument value.
    pub fn arg_value(&self, index: usize) -> Result<&Value, NativeError> {
        self.args
            .get(index)
            .ok_or(NativeError::ArgumentIndexOutOfBounds {
                index,
                count: self.args.len(),
            })
    }

    /// Typed argument extraction via [`FromValue`].
    pub fn arg<T: FromValue>(&self, index: usize) -> Result<T, NativeError> {
        let value = self.arg_value(index)?;
        T::from_value(value).map_err(NativeError::Conversion)
    }

    /// The receiver value for instance calls.
    pub fn receiver(&self) -> Result<&Value, NativeError> {
        self.receiver
            .ok_or_else(|| NativeError::invalid_receiver("static call has no receiver"))
    }

    /// Downcast an object receiver to a concrete host type.
    pub fn this<T: Any>(&self) -> Result<&T, NativeError> {
        match self.receiver()? {
            Value::Object(obj) => obj.downcast_ref::<T>().ok_or_else(|| {
                NativeError::invalid_receiver(format!(
                    "receiver is not a {}",
                    std::any::type_name::<T>()
                ))
            }),
            other => Err(NativeError::invalid_receiver(format!(
                "expected an object receiver, got {}",
                other.kind_name()
            ))),
        }
    }

    /// Set the return value from a raw [`Value`].
    pub fn set_return_value(&mut self, value: Value) {
        self.ret = value;
    }

    /// Set a typed return value via [`IntoValue`].
    pub fn set_return<T: IntoValue>(&mut self, value: T) {
        self.ret = value.into_value();
    }

    /// Consume the context, yielding the return value.
    pub fn into_return(self) -> Value {
        self.ret
    }
}

impl fmt::Debug for CallContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallContext")
            .field("has_receiver", &self.receiver.is_some())
            .field("arg_count", &self.args.len())
            .finish()
    }
}
