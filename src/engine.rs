//! Engine facade and the request dispatch boundary.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use serde_json::Value as JsonValue;

use chaincall_core::Value;
use chaincall_registry::TypeRegistry;

use crate::error::{ChainResult, DispatchError};
use crate::interp::Interp;
use crate::step::Chain;

/// The invocation engine.
///
/// Holds a shared, read-only [`TypeRegistry`] and executes invocation
/// documents against it. `Engine` is cheap to clone and safe to share:
/// each call owns its interpreter and local variable store, so any number
/// of requests may execute concurrently without observing each other.
#[derive(Clone)]
pub struct Engine {
    registry: Arc<TypeRegistry>,
}

impl Engine {
    /// Create an engine over a populated registry.
    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        Self { registry }
    }

    /// Create an engine over a fresh registry holding only the built-in
    /// prelude.
    pub fn with_prelude() -> Self {
        Self::new(Arc::new(TypeRegistry::with_prelude()))
    }

    /// The registry this engine resolves against.
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Execute an invocation document against a root target.
    ///
    /// This is the pure engine: chain errors come back as
    /// [`ChainError`](crate::ChainError) and panics propagate. The
    /// request-scoped local store lives inside this call and is released
    /// on every exit path.
    pub fn run(&self, target: Value, doc: &JsonValue) -> ChainResult<Value> {
        let chain = Chain::parse(doc)?;
        let mut interp = Interp::new(&self.registry);
        interp.run(target, &chain)
    }

    /// Handle one request document with a null root target.
    ///
    /// See [`Engine::dispatch_on`].
    pub fn dispatch(&self, request: &JsonValue) -> Result<Value, DispatchError> {
        self.dispatch_on(Value::Null, request)
    }

    /// Handle one request document against a host-supplied root target.
    ///
    /// This is the boundary the (external) transport and response
    /// formatter sit on: the envelope is validated before any chain runs,
    /// every failure class converts into a [`DispatchError`] that renders
    /// to a single message, and a panic inside invoked host code is
    /// contained here rather than unwinding through a long-lived caller.
    pub fn dispatch_on(&self, target: Value, request: &JsonValue) -> Result<Value, DispatchError> {
        let Some(doc) = request.get("json") else {
            return Err(DispatchError::Invalid(
                "request is missing the json document".into(),
            ));
        };

        match panic::catch_unwind(AssertUnwindSafe(|| self.run(target, doc))) {
            Ok(Ok(value)) => {
                tracing::debug!(result = %value.kind_name(), "chain completed");
                Ok(value)
            }
            Ok(Err(err)) => {
                tracing::debug!(error = %err, "chain failed");
                Err(DispatchError::Chain(err))
            }
            Err(payload) => {
                let detail = panic_detail(payload.as_ref());
                tracing::error!(detail = %detail, "invoked member panicked");
                Err(DispatchError::Fault(detail))
            }
        }
    }
}

fn panic_detail(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic in invoked member".to_owned()
    }
}
