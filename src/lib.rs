//! chaincall - a JSON-driven dynamic invocation engine.
//!
//! A caller submits a document describing a chain of operations - invoke a
//! member on some value, read or write a named local, resolve a type by
//! name, or run a filter/map/foreach/collect pipeline over a sequence -
//! and the engine executes the chain against live in-process values,
//! returning the result or a structured error.
//!
//! The engine resolves member calls by name against a capability registry
//! ([`TypeRegistry`]) populated by the host: every invocable member is
//! enumerated up front with its parameter signature and an invocation
//! thunk, and an explicit overload-resolution pass picks the best match
//! for each untyped argument list.
//!
//! # Example
//!
//! ```
//! use chaincall::{Engine, Value};
//! use serde_json::json;
//!
//! let engine = Engine::with_prelude();
//! let result = engine
//!     .dispatch_on(
//!         Value::Str("hello".into()),
//!         &json!({"json": {"method": "length", "args": []}}),
//!     )
//!     .unwrap();
//! assert_eq!(result, Value::Int(5));
//! ```
//!
//! Hosts register their own types with
//! [`TypeBuilder`](chaincall_registry::TypeBuilder) and hand the registry
//! to [`Engine::new`]; see the `chaincall-registry` crate.

mod engine;
mod error;
mod interp;
mod iter;
mod locals;
mod resolver;
mod step;

pub use engine::Engine;
pub use error::{ChainError, ChainResult, DispatchError};
pub use step::{Argument, Chain, IterOp, OpKind, Step, StepKind};

// Re-export the data model and registry surface so hosts depend on one
// crate.
pub use chaincall_core::{
    CallContext, ConversionError, FromValue, IntoValue, MemberDef, MemberEntry, MemberTraits,
    NativeCallable, NativeError, NativeFn, NativeObject, ParamType, TypeHandle, TypeHash, Value,
    wellknown,
};
pub use chaincall_registry::{RegistryError, TypeBuilder, TypeEntry, TypeRegistry};
