//! Error taxonomy for the dispatch layer.
//!
//! # Design Decisions
//! - One enum for everything the core can surface
//! - Registration-time errors (`PatternCompile`) are returned from `map*`
//! - Request-time errors are recovered by the dispatcher and handed to the
//!   error handler; they never escape to the transport as a fault

use thiserror::Error;

/// Boxed error returned by user handler functions.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Errors produced while compiling routes or dispatching a request.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The path pattern is malformed (e.g. unbalanced delimiters).
    #[error("invalid path pattern {pattern:?}: {reason}")]
    PatternCompile { pattern: String, reason: String },

    /// A matcher function failed to evaluate.
    #[error("matcher function failed: {0}")]
    MatcherFunction(String),

    /// No handler in the main pipe claimed the request.
    #[error("no route found for {method} {path}")]
    NoMatchingRoute { method: String, path: String },

    /// A route matched but nothing was registered to execute it.
    #[error("route {pattern:?} has no executor")]
    MissingExecutor { pattern: String },

    /// A handler returned an error from its `handle` step.
    #[error("handler failed: {0}")]
    HandlerExecution(#[source] HandlerError),

    /// No registered formatter accepted the request.
    #[error("no formatter available for this request")]
    NoFormatter,

    /// Serializing response data failed.
    #[error("failed to format response: {0}")]
    Format(#[from] serde_json::Error),

    /// The operation is not supported by the target.
    #[error("unsupported: {0}")]
    Unsupported(&'static str),

    /// A handler panicked. The payload message is kept for logging only
    /// and never rendered.
    #[error("handler panicked")]
    Panicked(String),
}

impl DispatchError {
    /// Wrap any user error as a handler execution error.
    pub fn handler<E>(err: E) -> Self
    where
        E: Into<HandlerError>,
    {
        DispatchError::HandlerExecution(err.into())
    }

    /// True for the "nothing to run" conditions (no route, no executor).
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            DispatchError::NoMatchingRoute { .. } | DispatchError::MissingExecutor { .. }
        )
    }
}
