//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events (routing, pipes, config reloads)
//!     → logging.rs (subscriber with env filter + fmt layer)
//!
//! HTTP adapter:
//!     → tower_http TraceLayer spans per request
//!     → x-request-id correlation field
//! ```
//!
//! # Design Decisions
//! - Structured key/value fields for machine parsing
//! - Request ID flows from the adapter into every log line of a request

pub mod logging;
