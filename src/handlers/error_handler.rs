//! Error-to-response conversion.
//!
//! # Design Decisions
//! - Anything written before the error is discarded, so a client never
//!   sees a half-written response followed by an error body
//! - "No route" and "no executor" answer 404; everything else is a 500
//!   with a prefixed, human-readable message

use axum::http::header::{HeaderValue, CONTENT_TYPE};
use axum::http::StatusCode;

use crate::context::Context;
use crate::error::DispatchError;

/// Turns a dispatch error into a response.
pub trait ErrorHandler: Send + Sync {
    fn handle_error(&self, ctx: &mut Context, err: &DispatchError);
}

impl<F> ErrorHandler for F
where
    F: Fn(&mut Context, &DispatchError) + Send + Sync,
{
    fn handle_error(&self, ctx: &mut Context, err: &DispatchError) {
        (self)(ctx, err)
    }
}

/// Plain-text error responses.
#[derive(Debug, Clone)]
pub struct DefaultErrorHandler {
    prefix: String,
}

impl DefaultErrorHandler {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    fn status_for(err: &DispatchError) -> StatusCode {
        if err.is_not_found() {
            StatusCode::NOT_FOUND
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl Default for DefaultErrorHandler {
    fn default() -> Self {
        Self::new("Internal server error")
    }
}

impl ErrorHandler for DefaultErrorHandler {
    fn handle_error(&self, ctx: &mut Context, err: &DispatchError) {
        let status = Self::status_for(err);
        if status.is_server_error() {
            tracing::error!(method = %ctx.method(), path = %ctx.path(), error = %err, "Request failed");
        } else {
            tracing::warn!(method = %ctx.method(), path = %ctx.path(), error = %err, "No route");
        }

        let response = ctx.response_mut();
        response.reset();
        response.set_status(status);
        response.set_header(
            CONTENT_TYPE,
            [HeaderValue::from_static("text/plain; charset=utf-8")],
        );
        let body = if status.is_server_error() {
            format!("{}: {}", self.prefix, err)
        } else {
            err.to_string()
        };
        response.write_body(body.as_bytes());
    }
}
