//! Type and member capability registry for the chaincall engine.
//!
//! The engine resolves names to types and members through the registry
//! instead of runtime introspection: hosts enumerate their types up front
//! with [`TypeBuilder`] (name, base link, member signatures, invocation
//! thunks), and the engine consumes the resulting [`TypeRegistry`]
//! read-only while chains execute.
//!
//! [`TypeRegistry::with_prelude`] ships the built-in plain-data types so
//! the engine is usable against strings, numbers, sequences, and maps out
//! of the box.

mod builtins;
mod registry;

pub use builtins::register_prelude;
pub use registry::{RegistryError, TypeBuilder, TypeEntry, TypeRegistry};
