//! Top-level dispatcher.
//!
//! # Responsibilities
//! - Own the before, main and after pipes
//! - Provide the route registration surface (`map*`)
//! - Drive one request through the pipes and recover every error into a
//!   response
//!
//! # Design Decisions
//! - Built during startup through `&mut self`, then shared behind an `Arc`;
//!   dispatch never mutates routes, so no locking is needed
//! - Main-pipe routes stop the main pipe once they run (first match wins);
//!   before/after routes never stop their pipe on their own
//! - A stop or error in the before pipe skips main; whether after still
//!   runs is `DispatchOptions::run_after_on_before_stop`
//! - The after pipe runs whatever happened in main, including errors and
//!   unmatched requests
//! - Panics are caught at `serve`, never propagated to the transport

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use axum::body::Bytes;
use axum::http::{Method, Request, Response};

use crate::context::Context;
use crate::error::{DispatchError, HandlerError};
use crate::handlers::error_handler::{DefaultErrorHandler, ErrorHandler};
use crate::handlers::path_match::{Executor, PathMatchHandler};
use crate::handlers::pipe::{Pipe, PipeOutcome};
use crate::responders::formatters::Formatters;
use crate::routing::matcher::{self, MatcherFunc};
use crate::routing::PathPattern;

/// Dispatch behaviour switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchOptions {
    /// Run the after pipe even when the before pipe stopped or failed.
    pub run_after_on_before_stop: bool,
    /// Convert handler panics into 500 responses.
    pub catch_panics: bool,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            run_after_on_before_stop: false,
            catch_panics: true,
        }
    }
}

/// Which pipe a registration goes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Before,
    Main,
    After,
}

/// The request dispatcher.
pub struct HttpHandler {
    before: Pipe,
    main: Pipe,
    after: Pipe,
    error_handler: Arc<dyn ErrorHandler>,
    formatters: Arc<Formatters>,
    options: DispatchOptions,
}

impl HttpHandler {
    pub fn new() -> Self {
        Self::with_options(DispatchOptions::default())
    }

    pub fn with_options(options: DispatchOptions) -> Self {
        Self {
            before: Pipe::new(),
            main: Pipe::new(),
            after: Pipe::new(),
            error_handler: Arc::new(DefaultErrorHandler::default()),
            formatters: Arc::new(Formatters::default()),
            options,
        }
    }

    pub fn options(&self) -> DispatchOptions {
        self.options
    }

    pub fn set_error_handler(&mut self, handler: impl ErrorHandler + 'static) -> &mut Self {
        self.error_handler = Arc::new(handler);
        self
    }

    pub fn formatters(&self) -> &Formatters {
        &self.formatters
    }

    /// Formatters handed to every request context.
    pub fn formatters_mut(&mut self) -> &mut Formatters {
        Arc::make_mut(&mut self.formatters)
    }

    pub fn before_pipe(&self) -> &Pipe {
        &self.before
    }

    pub fn before_pipe_mut(&mut self) -> &mut Pipe {
        &mut self.before
    }

    pub fn main_pipe(&self) -> &Pipe {
        &self.main
    }

    pub fn main_pipe_mut(&mut self) -> &mut Pipe {
        &mut self.main
    }

    pub fn after_pipe(&self) -> &Pipe {
        &self.after
    }

    pub fn after_pipe_mut(&mut self) -> &mut Pipe {
        &mut self.after
    }

    /// Register a function for `pattern` in the main pipe.
    pub fn map<F>(&mut self, pattern: &str, f: F) -> Result<&mut Self, DispatchError>
    where
        F: Fn(&mut Context) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        self.map_with(pattern, Executor::func(f), Vec::new())
    }

    /// Register a function for `pattern` restricted to one HTTP method.
    pub fn map_method<F>(&mut self, method: Method, pattern: &str, f: F) -> Result<&mut Self, DispatchError>
    where
        F: Fn(&mut Context) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        self.map_with(pattern, Executor::func(f), vec![matcher::method(method)])
    }

    pub fn map_with(
        &mut self,
        pattern: &str,
        executor: Executor,
        matchers: Vec<Box<dyn MatcherFunc>>,
    ) -> Result<&mut Self, DispatchError> {
        self.register(Phase::Main, pattern, Some(executor), matchers)
    }

    pub fn map_before<F>(&mut self, pattern: &str, f: F) -> Result<&mut Self, DispatchError>
    where
        F: Fn(&mut Context) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        self.map_before_with(pattern, Executor::func(f), Vec::new())
    }

    pub fn map_before_with(
        &mut self,
        pattern: &str,
        executor: Executor,
        matchers: Vec<Box<dyn MatcherFunc>>,
    ) -> Result<&mut Self, DispatchError> {
        self.register(Phase::Before, pattern, Some(executor), matchers)
    }

    pub fn map_after<F>(&mut self, pattern: &str, f: F) -> Result<&mut Self, DispatchError>
    where
        F: Fn(&mut Context) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        self.map_after_with(pattern, Executor::func(f), Vec::new())
    }

    pub fn map_after_with(
        &mut self,
        pattern: &str,
        executor: Executor,
        matchers: Vec<Box<dyn MatcherFunc>>,
    ) -> Result<&mut Self, DispatchError> {
        self.register(Phase::After, pattern, Some(executor), matchers)
    }

    /// Register a main-pipe function that matches every request.
    ///
    /// Routes are tried in registration order, so map this last.
    pub fn map_default<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&mut Context) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        let route = PathMatchHandler::new(PathPattern::catch_all(), Some(Executor::func(f)), Vec::new())
            .break_pipeline(true);
        self.main.push(route);
        self
    }

    /// Register into any pipe. `executor = None` declares a route whose
    /// requests fail with `MissingExecutor`.
    pub fn register(
        &mut self,
        phase: Phase,
        pattern: &str,
        executor: Option<Executor>,
        matchers: Vec<Box<dyn MatcherFunc>>,
    ) -> Result<&mut Self, DispatchError> {
        let pattern = PathPattern::compile(pattern)?;
        tracing::debug!(pattern = %pattern, phase = ?phase, matchers = matchers.len(), "Mapping route");

        let route = PathMatchHandler::new(pattern, executor, matchers).break_pipeline(phase == Phase::Main);
        match phase {
            Phase::Before => self.before.push(route),
            Phase::Main => self.main.push(route),
            Phase::After => self.after.push(route),
        }
        Ok(self)
    }

    /// Serve one request, always producing a complete response.
    pub fn serve(&self, request: Request<Bytes>) -> Response<Bytes> {
        let mut ctx = Context::with_formatters(request, self.formatters.clone());

        let result = if self.options.catch_panics {
            panic::catch_unwind(AssertUnwindSafe(|| self.dispatch(&mut ctx))).unwrap_or_else(|payload| {
                let message = panic_message(payload.as_ref());
                tracing::error!(method = %ctx.method(), path = %ctx.path(), panic = %message, "Handler panicked");
                Err(DispatchError::Panicked(message))
            })
        } else {
            self.dispatch(&mut ctx)
        };

        if let Err(err) = result {
            self.error_handler.handle_error(&mut ctx, &err);
        }
        ctx.into_response()
    }

    /// Drive a context through the pipes, returning the first error.
    pub fn dispatch(&self, ctx: &mut Context) -> Result<(), DispatchError> {
        let before = self.before.run(ctx);
        if !matches!(before, Ok(PipeOutcome { stopped: false, .. })) {
            tracing::debug!(path = %ctx.path(), "Before pipe halted dispatch");
            let pending = before.err();
            return if self.options.run_after_on_before_stop {
                self.finish(ctx, pending)
            } else {
                pending.map_or(Ok(()), Err)
            };
        }

        let pending = match self.main.run(ctx) {
            Ok(outcome) if outcome.handled == 0 => Some(DispatchError::NoMatchingRoute {
                method: ctx.method().to_string(),
                path: ctx.path().raw().to_string(),
            }),
            Ok(_) => None,
            Err(err) => Some(err),
        };

        self.finish(ctx, pending)
    }

    fn finish(&self, ctx: &mut Context, pending: Option<DispatchError>) -> Result<(), DispatchError> {
        match (pending, self.after.run(ctx)) {
            (Some(err), Err(after_err)) => {
                tracing::warn!(error = %after_err, "After pipe failed while handling an earlier error");
                Err(err)
            }
            (Some(err), Ok(_)) | (None, Err(err)) => Err(err),
            (None, Ok(_)) => Ok(()),
        }
    }
}

impl Default for HttpHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for HttpHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpHandler")
            .field("before", &self.before)
            .field("main", &self.main)
            .field("after", &self.after)
            .field("options", &self.options)
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
