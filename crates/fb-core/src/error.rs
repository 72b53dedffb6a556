//! Engine error types.
//!
//! Programmer errors surface as `Err`; user-level misuse (unknown event
//! names, missing targets, out-of-range zoom) is logged and no-ops
//! instead, since it typically originates from user-extensible
//! configuration.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Two middlewares may not share a name; registration order is the
    /// execution order and names are the unregistration keys.
    #[error("middleware `{0}` is already registered")]
    DuplicateMiddleware(String),

    #[error("state serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}
