//! Deterministic hash-based type identity.
//!
//! This module provides [`TypeHash`], a 64-bit hash that identifies a
//! registered type. Hashes are computed deterministically from the type's
//! registered name, which means:
//!
//! - The same name always produces the same hash, across runs and hosts
//! - A hash can be computed before (or without) the type being registered
//! - Lookups need a single map keyed by hash, with no secondary id counters
//!
//! Hashing uses XXHash64 seeded with a domain constant so that type hashes
//! occupy their own hash space, separate from any other entity kind a host
//! may choose to hash with the same algorithm.

use std::fmt;

use xxhash_rust::const_xxh64::xxh64;

/// Seed mixed into every type hash.
const TYPE_DOMAIN: u64 = 0x6d1f42c89ab35e07;

/// A 64-bit identity hash for a registered type.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeHash(pub u64);

impl TypeHash {
    /// Compute the hash for a type name.
    ///
    /// This is a `const fn`, so well-known hashes can be computed at
    /// compile time (see [`wellknown`]).
    #[inline]
    pub const fn from_name(name: &str) -> Self {
        TypeHash(xxh64(name.as_bytes(), TYPE_DOMAIN))
    }

    /// Get the raw hash value.
    #[inline]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeHash({:#018x})", self.0)
    }
}

impl fmt::Display for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}

/// Well-known hashes for the engine's built-in types.
///
/// Computed at compile time from the registered names, so they always agree
/// with what a registry derives for the same names at runtime.
pub mod wellknown {
    use super::TypeHash;

    /// Hash for the `null` pseudo-type.
    pub const NULL: TypeHash = TypeHash::from_name("null");

    /// Hash for `bool`.
    pub const BOOL: TypeHash = TypeHash::from_name("bool");

    /// Hash for `int` (64-bit signed).
    pub const INT: TypeHash = TypeHash::from_name("int");

    /// Hash for `float` (64-bit).
    pub const FLOAT: TypeHash = TypeHash::from_name("float");

    /// Hash for `string`.
    pub const STRING: TypeHash = TypeHash::from_name("string");

    /// Hash for `seq`, the ordered sequence type.
    pub const SEQ: TypeHash = TypeHash::from_name("seq");

    /// Hash for `map`, the string-keyed mapping type.
    pub const MAP: TypeHash = TypeHash::from_name("map");

    /// Hash for `type`, the type of type handles themselves.
    pub const TYPE: TypeHash = TypeHash::from_name("type");
}
