//! HTTP server setup.
//!
//! # Responsibilities
//! - Create the Axum Router that funnels every request into the dispatcher
//! - Buffer request bodies (bounded) and assign request IDs
//! - Run the synchronous dispatch off the async workers
//! - Swap in a rebuilt dispatcher when configuration changes
//!
//! # Design Decisions
//! - One fallback route: all routing happens in `HttpHandler`
//! - The dispatcher lives in an `ArcSwap`; each request loads one snapshot
//!   and keeps it for its whole lifetime
//! - Listener settings are read once at startup; reloads only rebuild routes

use std::sync::Arc;

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::State,
    http::{header::HeaderName, HeaderValue, Request, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::error::DispatchError;
use crate::handlers::HttpHandler;

/// Correlation header set on every request and response.
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Builds a dispatcher from configuration; called at startup and on reload.
pub type DispatcherFactory = Arc<dyn Fn(&ServerConfig) -> Result<HttpHandler, DispatchError> + Send + Sync>;

/// Application state injected into the fallback handler.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<ArcSwap<HttpHandler>>,
    pub max_body_bytes: usize,
}

/// HTTP server serving one hot-swappable dispatcher.
pub struct HttpServer {
    config: ServerConfig,
    factory: DispatcherFactory,
    dispatcher: Arc<ArcSwap<HttpHandler>>,
}

impl HttpServer {
    /// Build the initial dispatcher and the server around it.
    pub fn new<F>(config: ServerConfig, factory: F) -> Result<Self, DispatchError>
    where
        F: Fn(&ServerConfig) -> Result<HttpHandler, DispatchError> + Send + Sync + 'static,
    {
        let dispatcher = factory(&config)?;
        Ok(Self {
            config,
            factory: Arc::new(factory),
            dispatcher: Arc::new(ArcSwap::from_pointee(dispatcher)),
        })
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// The dispatcher currently serving requests.
    pub fn dispatcher(&self) -> Arc<HttpHandler> {
        self.dispatcher.load_full()
    }

    /// Rebuild the dispatcher from `config` and swap it in.
    ///
    /// On error the current dispatcher keeps serving.
    pub fn reload(&self, config: &ServerConfig) -> Result<(), DispatchError> {
        swap_dispatcher(&self.dispatcher, &self.factory, config)
    }

    /// Build the Axum router with all middleware layers.
    pub fn router(&self) -> Router {
        let state = AppState {
            dispatcher: self.dispatcher.clone(),
            max_body_bytes: self.config.listener.max_body_bytes,
        };
        Router::new()
            .fallback(dispatch_handler)
            .with_state(state)
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<ServerConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let dispatcher = self.dispatcher.clone();
        let factory = self.factory.clone();
        tokio::spawn(async move {
            while let Some(config) = config_updates.recv().await {
                // Errors are logged inside; the current dispatcher stays.
                let _ = swap_dispatcher(&dispatcher, &factory, &config);
            }
        });

        axum::serve(listener, self.router())
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

fn swap_dispatcher(
    dispatcher: &ArcSwap<HttpHandler>,
    factory: &DispatcherFactory,
    config: &ServerConfig,
) -> Result<(), DispatchError> {
    match factory(config) {
        Ok(rebuilt) => {
            dispatcher.store(Arc::new(rebuilt));
            tracing::info!(routes = config.routes.len(), "Dispatcher reloaded");
            Ok(())
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to rebuild dispatcher, keeping current routes");
            Err(e)
        }
    }
}

/// Fallback handler: every request goes through the dispatcher.
async fn dispatch_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let (mut parts, body) = request.into_parts();

    let request_id = parts
        .headers
        .get(&X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let request_id_value = HeaderValue::from_str(&request_id).ok();
    if let Some(value) = &request_id_value {
        parts.headers.insert(X_REQUEST_ID, value.clone());
    }

    let body = match axum::body::to_bytes(body, state.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(request_id = %request_id, error = %e, "Failed to buffer request body");
            return (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large").into_response();
        }
    };

    let dispatcher = state.dispatcher.load_full();
    let request = Request::from_parts(parts, body);
    let span = tracing::info_span!("dispatch", request_id = %request_id);

    let result = tokio::task::spawn_blocking(move || {
        let _entered = span.enter();
        dispatcher.serve(request)
    })
    .await;

    let mut response = match result {
        Ok(response) => response.map(Body::from),
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Dispatch task failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
        }
    };

    if let Some(value) = request_id_value {
        response.headers_mut().insert(X_REQUEST_ID, value);
    }
    response
}
