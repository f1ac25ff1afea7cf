//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Compile every route pattern once so bad patterns fail at load time
//! - Validate value ranges (status codes 100..=599, body limit, bind address)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;
use std::str::FromStr;

use axum::http::header::{HeaderName, HeaderValue};
use axum::http::Method;
use thiserror::Error;

use crate::config::schema::ServerConfig;
use crate::routing::PathPattern;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid bind address {0:?}")]
    BindAddress(String),

    #[error("max_body_bytes must be greater than zero")]
    BodyLimit,

    #[error("route #{0} has an empty name")]
    EmptyRouteName(usize),

    #[error("duplicate route name {0:?}")]
    DuplicateRoute(String),

    #[error("route {route:?}: {reason}")]
    Pattern { route: String, reason: String },

    #[error("route {route:?}: unknown method {method:?}")]
    Method { route: String, method: String },

    #[error("route {route:?}: invalid status {status}")]
    Status { route: String, status: u16 },

    #[error("route {route:?}: invalid header {header:?}")]
    Header { route: String, header: String },
}

/// Check a configuration, collecting every problem found.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }
    if config.listener.max_body_bytes == 0 {
        errors.push(ValidationError::BodyLimit);
    }

    let mut seen = HashSet::new();
    for (index, route) in config.routes.iter().enumerate() {
        if route.name.trim().is_empty() {
            errors.push(ValidationError::EmptyRouteName(index));
        } else if !seen.insert(route.name.as_str()) {
            errors.push(ValidationError::DuplicateRoute(route.name.clone()));
        }

        if let Err(e) = PathPattern::compile(&route.pattern) {
            errors.push(ValidationError::Pattern {
                route: route.name.clone(),
                reason: e.to_string(),
            });
        }

        for method in &route.methods {
            // Extension methods are legal HTTP but almost always a typo here.
            let known = Method::from_str(&method.to_uppercase())
                .map(|m| !is_extension(&m))
                .unwrap_or(false);
            if !known {
                errors.push(ValidationError::Method {
                    route: route.name.clone(),
                    method: method.clone(),
                });
            }
        }

        if let Some(response) = &route.response {
            if !(100..=599).contains(&response.status) {
                errors.push(ValidationError::Status {
                    route: route.name.clone(),
                    status: response.status,
                });
            }
            let content_type = response.content_type.iter().map(|v| ("content-type", v.as_str()));
            let extra = response.headers.iter().map(|(k, v)| (k.as_str(), v.as_str()));
            for (name, value) in content_type.chain(extra) {
                if HeaderName::from_str(name).is_err() || HeaderValue::from_str(value).is_err() {
                    errors.push(ValidationError::Header {
                        route: route.name.clone(),
                        header: name.to_string(),
                    });
                }
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_extension(method: &Method) -> bool {
    ![
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::HEAD,
        Method::OPTIONS,
        Method::CONNECT,
        Method::PATCH,
        Method::TRACE,
    ]
    .contains(method)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{RouteConfig, StaticResponse};

    fn route(name: &str, pattern: &str) -> RouteConfig {
        RouteConfig {
            name: name.into(),
            pattern: pattern.into(),
            methods: vec!["get".into()],
            phase: Default::default(),
            response: Some(StaticResponse::default()),
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&ServerConfig::default()), Ok(()));
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = ServerConfig::default();
        config.listener.bind_address = "not an address".into();
        config.listener.max_body_bytes = 0;
        config.routes.push(route("a", "/people/{id}"));
        config.routes.push(route("a", "/people/{id"));
        let mut bad = route("", "/x");
        bad.methods = vec!["FETCH".into()];
        bad.response = Some(StaticResponse {
            status: 42,
            ..StaticResponse::default()
        });
        config.routes.push(bad);

        let errors = validate_config(&config).unwrap_err();

        assert!(errors.contains(&ValidationError::BindAddress("not an address".into())));
        assert!(errors.contains(&ValidationError::BodyLimit));
        assert!(errors.contains(&ValidationError::DuplicateRoute("a".into())));
        assert!(errors.contains(&ValidationError::EmptyRouteName(2)));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::Pattern { .. })));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::Method { .. })));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::Status { status: 42, .. })));
    }

    #[test]
    fn test_bad_header() {
        let mut config = ServerConfig::default();
        let mut r = route("h", "/h");
        if let Some(response) = r.response.as_mut() {
            response.headers.insert("bad header".into(), "v".into());
        }
        config.routes.push(r);
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::Header {
                route: "h".into(),
                header: "bad header".into()
            }]
        );
    }
}
