//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the server.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::handlers::http_handler::{DispatchOptions, Phase};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Listener configuration (bind address, body limit).
    pub listener: ListenerConfig,

    /// Dispatch behaviour.
    pub dispatch: DispatchConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Statically declared routes.
    pub routes: Vec<RouteConfig>,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Largest request body buffered before dispatch.
    pub max_body_bytes: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_body_bytes: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Dispatch behaviour switches.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Run the after pipe when the before pipe stops or fails.
    pub run_after_on_before_stop: bool,

    /// Turn handler panics into 500 responses.
    pub catch_panics: bool,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        let options = DispatchOptions::default();
        Self {
            run_after_on_before_stop: options.run_after_on_before_stop,
            catch_panics: options.catch_panics,
        }
    }
}

impl From<&DispatchConfig> for DispatchOptions {
    fn from(config: &DispatchConfig) -> Self {
        DispatchOptions {
            run_after_on_before_stop: config.run_after_on_before_stop,
            catch_panics: config.catch_panics,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Pipe a configured route is mapped into.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RoutePhase {
    Before,
    #[default]
    Main,
    After,
}

impl From<RoutePhase> for Phase {
    fn from(phase: RoutePhase) -> Self {
        match phase {
            RoutePhase::Before => Phase::Before,
            RoutePhase::Main => Phase::Main,
            RoutePhase::After => Phase::After,
        }
    }
}

/// A route answered with a fixed response.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteConfig {
    /// Route identifier for logging.
    pub name: String,

    /// Path pattern, e.g. "/people/{id}".
    pub pattern: String,

    /// HTTP methods to accept; empty accepts any method.
    #[serde(default)]
    pub methods: Vec<String>,

    /// Pipe to register into.
    #[serde(default)]
    pub phase: RoutePhase,

    /// Response to write. Absent means the route has no executor yet.
    #[serde(default)]
    pub response: Option<StaticResponse>,
}

/// Fixed response written by a configured route.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StaticResponse {
    /// HTTP status code.
    pub status: u16,

    /// Response body; `{name}` placeholders are replaced by path parameters.
    pub body: String,

    /// Content type header.
    pub content_type: Option<String>,

    /// Extra response headers.
    pub headers: BTreeMap<String, String>,
}

impl Default for StaticResponse {
    fn default() -> Self {
        Self {
            status: 200,
            body: String::new(),
            content_type: None,
            headers: BTreeMap::new(),
        }
    }
}
