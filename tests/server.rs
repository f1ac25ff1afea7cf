//! End-to-end tests: real listener, real HTTP client.

use std::time::Duration;

use axum::http::header::{HeaderValue, CONTENT_TYPE};
use axum::http::{Method, StatusCode};

use routepipe::config::{build_dispatcher, parse_config, ServerConfig};
use routepipe::handlers::HttpHandler;
use routepipe::responders;

mod common;

const ROUTES: &str = r#"
[[routes]]
name = "stamp"
pattern = "***"
phase = "before"
[routes.response]
headers = { "x-served-by" = "routepipe" }

[[routes]]
name = "person"
pattern = "/people/{id}"
methods = ["GET"]
[routes.response]
body = "person {id}"
content_type = "text/plain"

[[routes]]
name = "books"
pattern = "/people/{id}/books/***"
methods = ["GET"]
[routes.response]
body = "books of {id}"
"#;

#[tokio::test]
async fn test_configured_routes_are_served() {
    let config = parse_config(ROUTES).unwrap();
    let server = common::start_server(config, build_dispatcher).await;
    let client = common::client();

    let res = client.get(server.url("/people/42")).send().await.expect("server unreachable");
    assert_eq!(res.status(), 200);
    assert_eq!(res.headers()["x-served-by"], "routepipe");
    assert!(res.headers().contains_key("x-request-id"));
    assert_eq!(res.text().await.unwrap(), "person 42");

    let res = client.get(server.url("/people/7/books")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), "books of 7");

    let res = client.get(server.url("/people/7/books/2021/fiction")).send().await.unwrap();
    assert_eq!(res.text().await.unwrap(), "books of 7");
}

#[tokio::test]
async fn test_unmatched_request_is_not_found() {
    let config = parse_config(ROUTES).unwrap();
    let server = common::start_server(config, build_dispatcher).await;
    let client = common::client();

    let res = client.get(server.url("/planets/mars")).send().await.unwrap();
    assert_eq!(res.status(), 404);
    assert!(res.text().await.unwrap().contains("/planets/mars"));

    // Method guard rejects, so nothing in main handles it.
    let res = client.delete(server.url("/people/42")).send().await.unwrap();
    assert_eq!(res.status(), 404);
}

#[tokio::test]
async fn test_request_id_is_propagated() {
    let server = common::start_server(ServerConfig::default(), |_: &ServerConfig| {
        let mut handler = HttpHandler::new();
        handler.map("/whoami", |ctx| {
            let id = ctx.header("x-request-id").unwrap_or("none").to_string();
            responders::with_text(ctx, StatusCode::OK, &id);
            Ok(())
        })?;
        Ok(handler)
    })
    .await;

    let res = common::client()
        .get(server.url("/whoami"))
        .header("x-request-id", "trace-123")
        .send()
        .await
        .unwrap();
    assert_eq!(res.headers()["x-request-id"], "trace-123");
    assert_eq!(res.text().await.unwrap(), "trace-123");
}

#[tokio::test]
async fn test_pipes_and_body_over_http() {
    let server = common::start_server(ServerConfig::default(), |_: &ServerConfig| {
        let mut handler = HttpHandler::new();
        handler
            .map_before("/echo", |ctx| {
                ctx.set_data("seen_before", true);
                Ok(())
            })?
            .map_method(Method::POST, "/echo", |ctx| {
                let body = String::from_utf8_lossy(ctx.body()).to_uppercase();
                let before = ctx.data().get("seen_before").is_some();
                responders::with_text(ctx, StatusCode::CREATED, &format!("{body} {before}"));
                Ok(())
            })?
            .map_after("***", |ctx| {
                ctx.response_mut()
                    .set_header("x-after".parse().unwrap(), [HeaderValue::from_static("1")]);
                Ok(())
            })?;
        Ok(handler)
    })
    .await;

    let res = common::client()
        .post(server.url("/echo"))
        .body("hello")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 201);
    assert_eq!(res.headers()["x-after"], "1");
    assert_eq!(res.text().await.unwrap(), "HELLO true");
}

#[tokio::test]
async fn test_json_data_and_handler_errors() {
    let server = common::start_server(ServerConfig::default(), |_: &ServerConfig| {
        let mut handler = HttpHandler::new();
        handler
            .map("/people/{id}", |ctx| {
                let id = ctx.path_value("id").unwrap_or_default().to_string();
                responders::with_data(ctx, StatusCode::OK, &serde_json::json!({ "id": id }))?;
                Ok(())
            })?
            .map("/broken", |_ctx| Err("database offline".into()))?
            .map("/panics", |_ctx| panic!("boom"))?;
        Ok(handler)
    })
    .await;
    let client = common::client();

    let res = client.get(server.url("/people/9")).send().await.unwrap();
    assert_eq!(res.headers()[CONTENT_TYPE], "application/json");
    let value: serde_json::Value = serde_json::from_str(&res.text().await.unwrap()).unwrap();
    assert_eq!(value["id"], "9");

    let res = client.get(server.url("/broken")).send().await.unwrap();
    assert_eq!(res.status(), 500);
    assert!(res.text().await.unwrap().contains("database offline"));

    let res = client.get(server.url("/panics")).send().await.unwrap();
    assert_eq!(res.status(), 500);
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let mut config = ServerConfig::default();
    config.listener.max_body_bytes = 16;
    let server = common::start_server(config, |_: &ServerConfig| {
        let mut handler = HttpHandler::new();
        handler.map("/upload", |ctx| {
            responders::with_ok(ctx);
            Ok(())
        })?;
        Ok(handler)
    })
    .await;
    let client = common::client();

    let res = client
        .post(server.url("/upload"))
        .body(vec![b'x'; 1024])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 413);

    let res = client.post(server.url("/upload")).body("small").send().await.unwrap();
    assert_eq!(res.status(), 200);
}

#[tokio::test]
async fn test_config_update_swaps_routes() {
    let config = parse_config(ROUTES).unwrap();
    let server = common::start_server(config, build_dispatcher).await;
    let client = common::client();

    let res = client.get(server.url("/planets/mars")).send().await.unwrap();
    assert_eq!(res.status(), 404);

    let updated = parse_config(
        r#"
        [[routes]]
        name = "planet"
        pattern = "/planets/{name}"
        [routes.response]
        status = 203
        body = "planet {name}"
        "#,
    )
    .unwrap();
    server.updates.send(updated).unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;

    let res = client.get(server.url("/planets/mars")).send().await.unwrap();
    assert_eq!(res.status(), 203);
    assert_eq!(res.text().await.unwrap(), "planet mars");

    let res = client.get(server.url("/people/42")).send().await.unwrap();
    assert_eq!(res.status(), 404);
}
