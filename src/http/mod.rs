//! HTTP transport adapter.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum fallback, body buffering, request ID)
//!     → HttpHandler::serve on a blocking task
//!     → buffered response back to the client
//! ```

pub mod server;

pub use server::{AppState, DispatcherFactory, HttpServer, X_REQUEST_ID};
