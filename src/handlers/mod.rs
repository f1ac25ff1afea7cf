//! Handler pipeline subsystem.
//!
//! # Data Flow
//! ```text
//! HttpHandler::serve(request)
//!     → Context
//!     → before Pipe ─┐
//!     → main Pipe    ├─ each Handler: will_handle? → handle → stop?
//!     → after Pipe  ─┘
//!     → error_handler.rs on error / no route
//!     → buffered response
//! ```
//!
//! # Design Decisions
//! - Pipes are handlers themselves, so they nest
//! - Registration order is match-attempt order
//! - Registration takes `&mut`, dispatch takes `&`: routes are frozen once
//!   the dispatcher is shared

use std::sync::Arc;

use crate::context::Context;
use crate::error::DispatchError;

pub mod error_handler;
pub mod http_handler;
pub mod path_match;
pub mod pipe;

pub use error_handler::{DefaultErrorHandler, ErrorHandler};
pub use http_handler::{DispatchOptions, HttpHandler};
pub use path_match::{Executor, HandlerFunc, PathMatchHandler};
pub use pipe::{Pipe, PipeOutcome};

/// The unit of dispatch.
///
/// `will_handle` must not write the response; it may stash derived data
/// (such as path parameters) in the context for `handle` to read. `handle`
/// is only called after `will_handle` returned `Ok(true)`, and returns
/// whether the enclosing pipe should stop.
pub trait Handler: Send + Sync {
    fn will_handle(&self, ctx: &mut Context) -> Result<bool, DispatchError>;

    fn handle(&self, ctx: &mut Context) -> Result<bool, DispatchError>;
}

impl<H: Handler + ?Sized> Handler for Arc<H> {
    fn will_handle(&self, ctx: &mut Context) -> Result<bool, DispatchError> {
        (**self).will_handle(ctx)
    }

    fn handle(&self, ctx: &mut Context) -> Result<bool, DispatchError> {
        (**self).handle(ctx)
    }
}

impl<H: Handler + ?Sized> Handler for Box<H> {
    fn will_handle(&self, ctx: &mut Context) -> Result<bool, DispatchError> {
        (**self).will_handle(ctx)
    }

    fn handle(&self, ctx: &mut Context) -> Result<bool, DispatchError> {
        (**self).handle(ctx)
    }
}
