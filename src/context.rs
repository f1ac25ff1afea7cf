//! Request-scoped context.
//!
//! # Responsibilities
//! - Expose the request parts the core and handlers read (method, path,
//!   headers, query, body)
//! - Carry string-keyed request data between handlers, including the
//!   extracted path parameters
//! - Buffer the response that handlers write
//!
//! # Design Decisions
//! - One `Context` per dispatch, owned by that dispatch only
//! - Response writes are buffered, so an error can still replace them
//!   before anything reaches the wire

use std::sync::Arc;

use axum::body::Bytes;
use axum::http::header::{HeaderName, HeaderValue};
use axum::http::{HeaderMap, Method, Request, Response, StatusCode, Uri};
use serde_json::{Map, Value};

use crate::responders::formatters::Formatters;
use crate::routing::{Parameters, Path};

/// Data key under which extracted path parameters are stored.
pub const PATH_PARAMS_KEY: &str = "path_params";

/// Per-request state handed to every handler in the pipeline.
#[derive(Debug)]
pub struct Context {
    method: Method,
    uri: Uri,
    path: Path,
    headers: HeaderMap,
    body: Bytes,
    data: Map<String, Value>,
    response: ResponseWriter,
    formatters: Arc<Formatters>,
}

impl Context {
    /// Build a context using the default formatters.
    pub fn new(request: Request<Bytes>) -> Self {
        Self::with_formatters(request, Arc::new(Formatters::default()))
    }

    pub fn with_formatters(request: Request<Bytes>, formatters: Arc<Formatters>) -> Self {
        let (parts, body) = request.into_parts();
        Self {
            path: Path::new(parts.uri.path()),
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            body,
            data: Map::new(),
            response: ResponseWriter::default(),
            formatters,
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// First value of a request header, if it is valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// First value of a query string parameter, percent-decoded.
    pub fn query_value(&self, key: &str) -> Option<String> {
        let query = self.uri.query()?;
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    }

    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.data
    }

    pub fn set_data(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.data.insert(key.into(), value.into());
    }

    /// Store extracted path parameters, replacing earlier ones.
    pub fn set_path_params(&mut self, params: Parameters) {
        let params: Map<String, Value> = params
            .into_iter()
            .map(|(k, v)| (k, Value::String(v)))
            .collect();
        self.data.insert(PATH_PARAMS_KEY.to_string(), Value::Object(params));
    }

    /// Value of one extracted path parameter.
    pub fn path_value(&self, name: &str) -> Option<&str> {
        self.data.get(PATH_PARAMS_KEY)?.get(name)?.as_str()
    }

    /// All extracted path parameters, if a route stored any.
    pub fn path_params(&self) -> Option<Parameters> {
        let params = self.data.get(PATH_PARAMS_KEY)?.as_object()?;
        Some(
            params
                .iter()
                .filter_map(|(k, v)| Some((k.clone(), v.as_str()?.to_string())))
                .collect(),
        )
    }

    pub fn response(&self) -> &ResponseWriter {
        &self.response
    }

    pub fn response_mut(&mut self) -> &mut ResponseWriter {
        &mut self.response
    }

    pub fn formatters(&self) -> &Formatters {
        &self.formatters
    }

    /// Finish the request, yielding the buffered response.
    pub fn into_response(self) -> Response<Bytes> {
        self.response.into_response()
    }
}

/// Buffered response written by handlers.
#[derive(Debug, Clone)]
pub struct ResponseWriter {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
    written: bool,
}

impl Default for ResponseWriter {
    fn default() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Vec::new(),
            written: false,
        }
    }
}

impl ResponseWriter {
    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
        self.written = true;
    }

    /// Replace all values of a header.
    pub fn set_header<I>(&mut self, name: HeaderName, values: I)
    where
        I: IntoIterator<Item = HeaderValue>,
    {
        self.headers.remove(&name);
        for value in values {
            self.headers.append(name.clone(), value);
        }
        self.written = true;
    }

    pub fn write_body(&mut self, bytes: &[u8]) {
        self.body.extend_from_slice(bytes);
        self.written = true;
    }

    /// Drop everything written so far.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// True once any handler touched the response.
    pub fn is_written(&self) -> bool {
        self.written
    }

    pub fn into_response(self) -> Response<Bytes> {
        let mut response = Response::new(Bytes::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

#[cfg(test)]
pub(crate) fn test_context(method: Method, uri: &str) -> Context {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Bytes::new())
        .expect("test request should build");
    Context::new(request)
}
