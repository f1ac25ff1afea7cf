//! Pattern-routed HTTP dispatch library
//!
//! Requests flow through three ordered pipes (before, main, after) of
//! handlers guarded by path patterns and matcher functions.

pub mod config;
pub mod context;
pub mod error;
pub mod handlers;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod responders;
pub mod rest;
pub mod routing;

pub use config::schema::ServerConfig;
pub use context::Context;
pub use error::{DispatchError, HandlerError};
pub use handlers::{Executor, Handler, HttpHandler, Pipe};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use rest::{Capability, RestController};
pub use routing::{Decision, Path, PathPattern};
