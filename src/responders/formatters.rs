//! Response formatter selection.
//!
//! Formatters are registered as `(decider, formatter)` pairs and selected by
//! scanning in REVERSE registration order: the most recently added pair
//! whose decider accepts the request wins. This is the opposite of route
//! priority, where the first registered route is tried first.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::context::Context;
use crate::error::DispatchError;

/// Decides whether a formatter applies to a request.
pub type Decider = Arc<dyn Fn(&Context) -> bool + Send + Sync>;

/// Serializes response data into a body.
pub trait Formatter: Send + Sync {
    fn content_type(&self) -> &str;

    fn format(&self, data: &Value) -> Result<Vec<u8>, DispatchError>;
}

/// `application/json` bodies.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn content_type(&self) -> &str {
        "application/json"
    }

    fn format(&self, data: &Value) -> Result<Vec<u8>, DispatchError> {
        Ok(serde_json::to_vec(data)?)
    }
}

/// `text/plain` bodies; strings are written bare, other values as JSON text.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextFormatter;

impl Formatter for TextFormatter {
    fn content_type(&self) -> &str {
        "text/plain; charset=utf-8"
    }

    fn format(&self, data: &Value) -> Result<Vec<u8>, DispatchError> {
        match data {
            Value::String(s) => Ok(s.clone().into_bytes()),
            other => Ok(other.to_string().into_bytes()),
        }
    }
}

/// Decider that always applies.
pub fn always() -> Decider {
    Arc::new(|_: &Context| true)
}

/// Decider that applies when the `Accept` header names `media_type`.
pub fn accepts(media_type: &'static str) -> Decider {
    Arc::new(move |ctx: &Context| {
        ctx.header("accept")
            .map(|accept| {
                accept
                    .split(',')
                    .filter_map(|part| part.split(';').next())
                    .any(|part| part.trim().eq_ignore_ascii_case(media_type))
            })
            .unwrap_or(false)
    })
}

/// Registered formatters, newest first at selection time.
#[derive(Clone)]
pub struct Formatters {
    entries: Vec<(Decider, Arc<dyn Formatter>)>,
}

impl Formatters {
    /// No formatters at all; every selection fails.
    pub fn empty() -> Self {
        Self { entries: Vec::new() }
    }

    pub fn add(&mut self, decider: Decider, formatter: impl Formatter + 'static) -> &mut Self {
        self.entries.push((decider, Arc::new(formatter)));
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Pick the most recently added formatter whose decider accepts `ctx`.
    pub fn select(&self, ctx: &Context) -> Result<&dyn Formatter, DispatchError> {
        self.entries
            .iter()
            .rev()
            .find(|(decider, _)| decider(ctx))
            .map(|(_, formatter)| &**formatter)
            .ok_or(DispatchError::NoFormatter)
    }
}

impl Default for Formatters {
    /// JSON for everything, plain text when the client asks for it.
    fn default() -> Self {
        let mut formatters = Self::empty();
        formatters
            .add(always(), JsonFormatter)
            .add(accepts("text/plain"), TextFormatter);
        formatters
    }
}

impl fmt::Debug for Formatters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Formatters").field("entries", &self.entries.len()).finish()
    }
}
