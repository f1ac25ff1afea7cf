//! Ordered handler pipeline.
//!
//! Per dispatch a pipe walks its handlers in registration order:
//!
//! ```text
//! Iterating(i) ── will_handle = false ──────────────▶ Iterating(i + 1)
//!      │
//!      ├─ will_handle = true → handle → stop = false ▶ Iterating(i + 1)
//!      ├─ handle → stop = true ──────────────────────▶ Stopped
//!      └─ will_handle / handle error ────────────────▶ Errored
//! ```

use std::fmt;
use std::sync::Arc;

use crate::context::Context;
use crate::error::DispatchError;
use crate::handlers::Handler;

/// What happened during one pass over a pipe.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipeOutcome {
    /// Number of handlers whose `handle` ran.
    pub handled: usize,
    /// True if a handler asked to stop the pipe.
    pub stopped: bool,
}

/// An ordered, composable collection of handlers.
#[derive(Clone, Default)]
pub struct Pipe {
    handlers: Vec<Arc<dyn Handler>>,
}

impl Pipe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return this pipe with `handler` added at the end.
    pub fn append_handler(mut self, handler: impl Handler + 'static) -> Self {
        self.push(handler);
        self
    }

    /// Return this pipe with `handler` added at the front.
    pub fn prepend_handler(mut self, handler: impl Handler + 'static) -> Self {
        self.push_front(handler);
        self
    }

    pub fn push(&mut self, handler: impl Handler + 'static) {
        self.handlers.push(Arc::new(handler));
    }

    pub fn push_front(&mut self, handler: impl Handler + 'static) {
        self.handlers.insert(0, Arc::new(handler));
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Run the handlers in order until one stops or fails.
    pub fn run(&self, ctx: &mut Context) -> Result<PipeOutcome, DispatchError> {
        let mut outcome = PipeOutcome::default();

        for (index, handler) in self.handlers.iter().enumerate() {
            if !handler.will_handle(ctx)? {
                tracing::trace!(index, "Handler declined");
                continue;
            }

            outcome.handled += 1;
            if handler.handle(ctx)? {
                tracing::trace!(index, "Handler stopped pipe");
                outcome.stopped = true;
                break;
            }
        }

        Ok(outcome)
    }
}

impl Handler for Pipe {
    /// A pipe is always willing to try its children.
    fn will_handle(&self, _ctx: &mut Context) -> Result<bool, DispatchError> {
        Ok(true)
    }

    /// Stops the parent only when a child stopped this pipe.
    fn handle(&self, ctx: &mut Context) -> Result<bool, DispatchError> {
        Ok(self.run(ctx)?.stopped)
    }
}

impl fmt::Debug for Pipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipe").field("handlers", &self.handlers.len()).finish()
    }
}
