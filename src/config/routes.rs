//! Mapping of configured static routes into a dispatcher.

use std::str::FromStr;

use axum::http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use axum::http::{Method, StatusCode};

use crate::config::schema::{RouteConfig, ServerConfig, StaticResponse};
use crate::context::Context;
use crate::error::DispatchError;
use crate::handlers::{Executor, HttpHandler};
use crate::routing::matcher::{self, MatcherFunc};

/// Fresh dispatcher with the configured options and routes.
pub fn build_dispatcher(config: &ServerConfig) -> Result<HttpHandler, DispatchError> {
    let mut handler = HttpHandler::with_options((&config.dispatch).into());
    apply_routes(&mut handler, &config.routes)?;
    Ok(handler)
}

/// Register every configured route, in file order.
pub fn apply_routes(handler: &mut HttpHandler, routes: &[RouteConfig]) -> Result<(), DispatchError> {
    for route in routes {
        let matchers = method_matchers(route)?;
        let executor = route
            .response
            .as_ref()
            .map(static_executor)
            .transpose()?;

        handler.register(route.phase.into(), &route.pattern, executor, matchers)?;
        tracing::info!(route = %route.name, pattern = %route.pattern, phase = ?route.phase, "Route configured");
    }
    Ok(())
}

fn method_matchers(route: &RouteConfig) -> Result<Vec<Box<dyn MatcherFunc>>, DispatchError> {
    if route.methods.is_empty() {
        return Ok(Vec::new());
    }
    let methods = route
        .methods
        .iter()
        .map(|m| Method::from_str(&m.to_uppercase()).map_err(DispatchError::handler))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(vec![matcher::methods(methods)])
}

fn static_executor(response: &StaticResponse) -> Result<Executor, DispatchError> {
    let status = StatusCode::from_u16(response.status).map_err(DispatchError::handler)?;

    let mut headers = Vec::new();
    if let Some(content_type) = &response.content_type {
        headers.push((
            CONTENT_TYPE,
            HeaderValue::from_str(content_type).map_err(DispatchError::handler)?,
        ));
    }
    for (name, value) in &response.headers {
        headers.push((
            HeaderName::from_str(name).map_err(DispatchError::handler)?,
            HeaderValue::from_str(value).map_err(DispatchError::handler)?,
        ));
    }
    let body = response.body.clone();

    Ok(Executor::func(move |ctx: &mut Context| {
        let body = render(&body, ctx);
        let writer = ctx.response_mut();
        writer.set_status(status);
        for (name, value) in &headers {
            writer.set_header(name.clone(), [value.clone()]);
        }
        writer.write_body(body.as_bytes());
        Ok(())
    }))
}

/// Replace `{name}` placeholders with extracted path parameters.
fn render(template: &str, ctx: &Context) -> String {
    match ctx.path_params() {
        Some(params) => params.iter().fold(template.to_string(), |acc, (name, value)| {
            acc.replace(&format!("{{{name}}}"), value)
        }),
        None => template.to_string(),
    }
}
