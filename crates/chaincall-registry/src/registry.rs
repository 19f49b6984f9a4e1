//! TypeRegistry - the engine's capability substrate.
//!
//! This module provides [`TypeRegistry`], the central storage mapping type
//! identity to an enumerated list of invocable members. The engine consumes
//! it read-only: given a type name it answers with a [`TypeEntry`], given a
//! value it answers with the value's runtime type, and given a type it
//! enumerates members (own and inherited) for overload resolution.
//!
//! # Storage Model
//!
//! - **Types**: all entries stored in a single map by [`TypeHash`]
//! - **Names**: a reverse index `name -> TypeHash` for `class`-step lookups
//! - **Members**: stored inline in each entry, in declaration order; the
//!   order is what makes resolution tie-breaking deterministic
//!
//! # Thread Safety
//!
//! Registration happens single-threaded during host setup. After that the
//! registry is read-only and safe to share across concurrently executing
//! requests (member thunks are `Send + Sync`).

use rustc_hash::FxHashMap;

use chaincall_core::{
    CallContext, MemberDef, MemberEntry, NativeError, NativeFn, TypeHandle, TypeHash, Value,
    wellknown,
};
use thiserror::Error;

use crate::builtins;

/// Errors raised while populating a registry.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistryError {
    /// A type with the same name is already registered.
    #[error("type {0} is already registered")]
    Duplicate(String),

    /// A declared base type has not been registered yet.
    #[error("base type {base} of {name} is not registered")]
    UnknownBase { name: String, base: String },
}

/// Registry entry for one type: identity, base link, and member table.
#[derive(Debug, Clone)]
pub struct TypeEntry {
    name: String,
    type_hash: TypeHash,
    base: Option<TypeHash>,
    members: Vec<MemberEntry>,
}

impl TypeEntry {
    /// Unqualified registered name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Identity hash.
    pub fn type_hash(&self) -> TypeHash {
        self.type_hash
    }

    /// Base type, if any.
    pub fn base(&self) -> Option<TypeHash> {
        self.base
    }

    /// Members in declaration order.
    pub fn members(&self) -> &[MemberEntry] {
        &self.members
    }

    /// A first-class handle for this type.
    pub fn handle(&self) -> TypeHandle {
        TypeHandle::new(self.name.clone(), self.type_hash)
    }
}

/// Central type and member registry.
///
/// Read-only from the engine's perspective; see the module docs for the
/// registration/execution phase split.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    types: FxHashMap<TypeHash, TypeEntry>,
    names: FxHashMap<String, TypeHash>,
}

impl TypeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the built-in prelude registered.
    pub fn with_prelude() -> Self {
        let mut registry = Self::new();
        builtins::register_prelude(&mut registry)
            .unwrap_or_else(|e| panic!("prelude registration failed: {e}"));
        registry
    }

    /// Register a type built with [`TypeBuilder`].
    ///
    /// The base type, if declared, must already be registered; base edges
    /// therefore always point at earlier registrations and the inheritance
    /// chain cannot cycle.
    pub fn register(&mut self, builder: TypeBuilder) -> Result<TypeHash, RegistryError> {
        let TypeBuilder {
            name,
            base,
            members,
        } = builder;

        if self.names.contains_key(&name) {
            return Err(RegistryError::Duplicate(name));
        }
        let base = match base {
            Some(base_name) => match self.names.get(&base_name) {
                Some(hash) => Some(*hash),
                None => {
                    return Err(RegistryError::UnknownBase {
                        name,
                        base: base_name,
                    });
                }
            },
            None => None,
        };

        let type_hash = TypeHash::from_name(&name);
        let entry = TypeEntry {
            name: name.clone(),
            type_hash,
            base,
            members,
        };
        self.names.insert(name, type_hash);
        self.types.insert(type_hash, entry);
        Ok(type_hash)
    }

    /// Get a type entry by hash.
    pub fn entry(&self, hash: TypeHash) -> Option<&TypeEntry> {
        self.types.get(&hash)
    }

    /// Resolve a type by its registered name.
    pub fn resolve_type(&self, name: &str) -> Option<&TypeEntry> {
        self.names.get(name).and_then(|hash| self.types.get(hash))
    }

    /// Human-readable name for a type hash, for error messages.
    pub fn type_name(&self, hash: TypeHash) -> &str {
        self.entry(hash).map_or("<unregistered>", TypeEntry::name)
    }

    /// The runtime type of a value.
    ///
    /// Plain data variants map onto the built-in types; object handles carry
    /// their registered type; type handles are themselves of type `type`.
    pub fn type_of(&self, value: &Value) -> TypeHash {
        match value {
            Value::Null => wellknown::NULL,
            Value::Bool(_) => wellknown::BOOL,
            Value::Int(_) => wellknown::INT,
            Value::Float(_) => wellknown::FLOAT,
            Value::Str(_) => wellknown::STRING,
            Value::Seq(_) => wellknown::SEQ,
            Value::Map(_) => wellknown::MAP,
            Value::Object(obj) => obj.type_hash(),
            Value::Type(_) => wellknown::TYPE,
        }
    }

    /// Whether `ty` is `base` or derives from it.
    pub fn is_subtype(&self, ty: TypeHash, base: TypeHash) -> bool {
        let mut current = Some(ty);
        while let Some(hash) = current {
            if hash == base {
                return true;
            }
            current = self.entry(hash).and_then(TypeEntry::base);
        }
        false
    }

    /// Enumerate members named `name` on `ty`, own members first, then the
    /// base chain, preserving declaration order within each type.
    pub fn members_named<'r>(&'r self, ty: TypeHash, name: &str) -> Vec<&'r MemberEntry> {
        let mut found = Vec::new();
        let mut current = Some(ty);
        while let Some(hash) = current {
            let Some(entry) = self.entry(hash) else { break };
            found.extend(entry.members().iter().filter(|m| m.def.name == name));
            current = entry.base();
        }
        found
    }
}

/// Builder for registering one type.
///
/// ```
/// use chaincall_core::{MemberDef, ParamType};
/// use chaincall_registry::{TypeBuilder, TypeRegistry};
///
/// let mut registry = TypeRegistry::new();
/// registry
///     .register(TypeBuilder::new("Greeter").with_member(
///         MemberDef::new("greet", vec![ParamType::Str]),
///         |ctx| {
///             let name: String = ctx.arg(0)?;
///             ctx.set_return(format!("hello {name}"));
///             Ok(())
///         },
///     ))
///     .unwrap();
/// ```
#[derive(Debug)]
pub struct TypeBuilder {
    name: String,
    base: Option<String>,
    members: Vec<MemberEntry>,
}

impl TypeBuilder {
    /// Start building a type with the given registered name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base: None,
            members: Vec::new(),
        }
    }

    /// Declare a base type by name. It must be registered before this type.
    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        self.base = Some(base.into());
        self
    }

    /// Add a member with its implementation thunk.
    pub fn with_member<F>(mut self, def: MemberDef, thunk: F) -> Self
    where
        F: Fn(&mut CallContext<'_>) -> Result<(), NativeError> + Send + Sync + 'static,
    {
        self.members.push(MemberEntry::new(def, NativeFn::new(thunk)));
        self
    }

    /// Add a prebuilt member entry.
    pub fn with_entry(mut self, entry: MemberEntry) -> Self {
        self.members.push(entry);
        self
    }
}
