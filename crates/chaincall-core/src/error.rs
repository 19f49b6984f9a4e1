//! Error types for the core value model and native-call bridge.

use thiserror::Error;

/// Conversion failures when bridging [`Value`](crate::Value) and Rust types.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConversionError {
    /// The value's kind does not match the requested type.
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    /// An integer does not fit the requested width.
    #[error("integer {value} out of range for {target}")]
    IntegerOverflow { value: i64, target: &'static str },
}

/// Errors raised by native member thunks.
#[derive(Debug, Error)]
pub enum NativeError {
    /// A thunk asked for an argument position that was not supplied.
    #[error("argument {index} out of bounds (call carries {count})")]
    ArgumentIndexOutOfBounds { index: usize, count: usize },

    /// Typed argument extraction failed.
    #[error("argument conversion failed: {0}")]
    Conversion(#[from] ConversionError),

    /// The receiver was absent or of the wrong shape.
    #[error("invalid receiver: {0}")]
    InvalidReceiver(String),

    /// A fault raised by the invoked member itself.
    #[error("{0}")]
    Message(String),
}

impl NativeError {
    /// Create a receiver error.
    pub fn invalid_receiver(detail: impl Into<String>) -> Self {
        NativeError::InvalidReceiver(detail.into())
    }

    /// Create a fault carrying a plain message.
    pub fn message(detail: impl Into<String>) -> Self {
        NativeError::Message(detail.into())
    }
}
