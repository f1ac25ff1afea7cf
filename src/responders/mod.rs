//! Response helpers for handlers.
//!
//! # Responsibilities
//! - Write common responses (status only, text, redirect, not found)
//! - Serialize data through the formatter selected for the request
//!
//! # Design Decisions
//! - Helpers write into the buffered response; nothing is flushed here
//! - Data goes through `serde_json::Value` so every formatter sees the
//!   same shape

pub mod formatters;

use axum::http::header::{HeaderValue, CONTENT_TYPE, LOCATION};
use axum::http::StatusCode;
use serde::Serialize;

use crate::context::Context;
use crate::error::DispatchError;

pub use formatters::{Formatter, Formatters, JsonFormatter, TextFormatter};

/// Respond with a status code and no body.
pub fn with_status(ctx: &mut Context, status: StatusCode) {
    ctx.response_mut().set_status(status);
}

/// Respond `200 OK` with no body.
pub fn with_ok(ctx: &mut Context) {
    with_status(ctx, StatusCode::OK);
}

/// Respond `404 Not Found` with no body.
pub fn with_not_found(ctx: &mut Context) {
    with_status(ctx, StatusCode::NOT_FOUND);
}

/// Respond with a plain-text body.
pub fn with_text(ctx: &mut Context, status: StatusCode, text: &str) {
    let response = ctx.response_mut();
    response.set_status(status);
    response.set_header(
        CONTENT_TYPE,
        [HeaderValue::from_static("text/plain; charset=utf-8")],
    );
    response.write_body(text.as_bytes());
}

/// Respond with `data` formatted for this request.
pub fn with_data<T>(ctx: &mut Context, status: StatusCode, data: &T) -> Result<(), DispatchError>
where
    T: Serialize + ?Sized,
{
    let value = serde_json::to_value(data)?;
    let (content_type, body) = {
        let formatter = ctx.formatters().select(ctx)?;
        (formatter.content_type().to_string(), formatter.format(&value)?)
    };
    let content_type = HeaderValue::from_str(&content_type).map_err(DispatchError::handler)?;

    let response = ctx.response_mut();
    response.set_status(status);
    response.set_header(CONTENT_TYPE, [content_type]);
    response.write_body(&body);
    Ok(())
}

/// Respond `302 Found` pointing at `location`.
pub fn with_redirect(ctx: &mut Context, location: &str) -> Result<(), DispatchError> {
    let location = HeaderValue::from_str(location).map_err(DispatchError::handler)?;
    let response = ctx.response_mut();
    response.set_status(StatusCode::FOUND);
    response.set_header(LOCATION, [location]);
    Ok(())
}
