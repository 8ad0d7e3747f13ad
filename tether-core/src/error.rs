//! Error types.
//!
//! The engine itself does not fail: tracking, triggering and running
//! computations are infallible, and failures raised by a work function
//! propagate to whoever called into it. Errors only arise at the edges, when
//! values are converted from JSON or a configuration is loaded.

use thiserror::Error;

/// Errors produced at the crate's conversion and configuration boundaries.
#[derive(Debug, Error)]
pub enum TetherError {
    /// A keyed object was required but a different kind of value was given.
    #[error("expected a keyed object, found {kind}")]
    NotAnObject {
        /// The kind of value that was found instead.
        kind: &'static str,
    },

    /// JSON could not be parsed or produced.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A runtime configuration was rejected.
    #[error("invalid runtime configuration: {0}")]
    Config(String),
}

/// Result alias used across the crate.
pub type Result<T, E = TetherError> = std::result::Result<T, E>;
