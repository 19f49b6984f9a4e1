//! Core data model for the chaincall invocation engine.
//!
//! This crate is the leaf of the workspace: the [`Value`] tagged union that
//! flows through every chain, [`TypeHash`] identity, member signatures and
//! their invocation thunks, the [`CallContext`] bridge thunks execute
//! against, and the conversion layer between values, Rust types, and JSON
//! documents.
//!
//! The engine and registry crates build on these types; nothing here knows
//! about chains, steps, or resolution.

mod call_context;
mod convert;
mod error;
mod member;
mod type_hash;
mod value;

pub use call_context::CallContext;
pub use convert::{FromValue, IntoValue};
pub use error::{ConversionError, NativeError};
pub use member::{MemberDef, MemberEntry, MemberTraits, NativeCallable, NativeFn, ParamType};
pub use type_hash::{TypeHash, wellknown};
pub use value::{NativeObject, TypeHandle, Value};
