//! Error types for chain execution and the dispatch boundary.
//!
//! ## Error Hierarchy
//!
//! ```text
//! DispatchError (request boundary)
//! ├── Invalid   - malformed request envelope, raised before execution
//! ├── Chain     - business error from executing the chain
//! └── Fault     - contained panic from invoked host code
//! ```
//!
//! `ChainError` is the business taxonomy: unresolvable members and types,
//! malformed steps, null-propagation violations, iteration misuse, and
//! invocation faults. Member-call variants carry the offending type name,
//! member name, and rendered argument list so the caller can see exactly
//! which call failed.

use thiserror::Error;

/// Result alias for chain execution.
pub type ChainResult<T> = Result<T, ChainError>;

/// Business error raised while executing one invocation chain.
///
/// Always local to one request; the dispatch boundary converts it into an
/// error response and never lets it escape further.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ChainError {
    /// No member matched the name and argument list.
    #[error("{type_name}.{member}({args}) does not exist")]
    MemberNotFound {
        type_name: String,
        member: String,
        args: String,
    },

    /// A mid-chain step produced null and the following step cannot run
    /// against a null target.
    #[error("{type_name}.{member}({args}) returned null mid-chain")]
    NullReturn {
        type_name: String,
        member: String,
        args: String,
    },

    /// A `class` step named an unregistered type.
    #[error("class({0}) does not exist")]
    UnknownType(String),

    /// A step carried an unrecognized `type` tag.
    #[error("unknown step type: {0}")]
    UnknownStepKind(String),

    /// A step was structurally unusable (missing method, missing ref, ...).
    #[error("malformed step: {0}")]
    MalformedStep(String),

    /// An `iter` step targeted a null value.
    #[error("cannot iterate null")]
    NullIteration,

    /// An `iter` step targeted a value that is not a sequence.
    #[error("{0} does not support iteration")]
    NotIterable(&'static str),

    /// An iteration operation carried an unrecognized tag.
    #[error("unknown iteration operation: {0}")]
    UnknownIterOp(String),

    /// The iteration operation list ended without foreach or collect.
    #[error("iteration chain has no terminal operation")]
    MissingTerminal,

    /// The resolved member was invoked and failed.
    #[error("{type_name}.{member}({args}) failed: {detail}")]
    Invocation {
        type_name: String,
        member: String,
        args: String,
        detail: String,
    },

    /// Nested argument chains exceeded the recursion bound.
    #[error("invocation chains nest deeper than {0} levels")]
    DepthExceeded(usize),
}

/// Error returned by the dispatch boundary.
///
/// Renders to a single message string, which is the engine's whole
/// contract with the (external) response formatter.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The request envelope was malformed; no chain was executed.
    #[error("invalid request: {0}")]
    Invalid(String),

    /// The chain executed and failed with a business error.
    #[error(transparent)]
    Chain(#[from] ChainError),

    /// Invoked host code panicked; the panic was contained at the boundary.
    #[error("internal fault: {0}")]
    Fault(String),
}
