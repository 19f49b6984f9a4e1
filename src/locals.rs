//! Request-scoped local variable store.

use rustc_hash::FxHashMap;

use chaincall_core::Value;

/// Name-to-value bindings for one in-flight request.
///
/// Created empty when a request begins and owned exclusively by that
/// request's interpreter, so concurrent requests can never observe each
/// other's bindings. Dropping the interpreter releases the store on every
/// exit path; there is no shared or thread-affine state to clean up.
#[derive(Debug, Default)]
pub struct LocalScope {
    vars: FxHashMap<String, Value>,
}

impl LocalScope {
    /// Create an empty scope.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` under `name` (overwriting any prior binding) and hand
    /// the value back so it threads on as the next step's target. A step
    /// without a binding name passes through untouched.
    pub fn bind(&mut self, name: Option<&str>, value: Value) -> Value {
        if let Some(name) = name {
            self.vars.insert(name.to_owned(), value.clone());
        }
        value
    }

    /// Look up a binding. An absent name reads as null, not an error.
    pub fn get(&self, name: Option<&str>) -> Value {
        name.and_then(|n| self.vars.get(n))
            .cloned()
            .unwrap_or(Value::Null)
    }

    /// Number of live bindings.
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// Whether the scope holds no bindings.
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}
