//! RESTful controllers.
//!
//! A controller declares the verbs it supports through
//! [`RestController::capabilities`]; [`HttpHandler::map_controller`] maps
//! one main-pipe route per declared capability:
//!
//! | capability   | method  | pattern       |
//! |--------------|---------|---------------|
//! | `ReadMany`   | GET     | `{base}`      |
//! | `Read`       | GET     | `{base}/{id}` |
//! | `Create`     | POST    | `{base}`      |
//! | `UpdateMany` | PATCH   | `{base}`      |
//! | `Update`     | PATCH   | `{base}/{id}` |
//! | `Replace`    | PUT     | `{base}/{id}` |
//! | `DeleteMany` | DELETE  | `{base}`      |
//! | `Delete`     | DELETE  | `{base}/{id}` |
//! | `Head`       | HEAD    | `{base}/[id]` |
//! | `Options`    | OPTIONS | `{base}/[id]` |
//!
//! Without `Options`, an OPTIONS request gets `200` and an `Allow` header
//! listing the mapped methods.

use std::sync::Arc;

use axum::http::header::{HeaderValue, ALLOW};
use axum::http::{Method, StatusCode};

use crate::context::Context;
use crate::error::{DispatchError, HandlerError};
use crate::handlers::{Executor, HttpHandler};
use crate::routing::matcher;

/// Path parameter holding the resource identifier.
pub const ID_PARAMETER: &str = "id";

/// A verb a controller can serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Create,
    Read,
    ReadMany,
    Update,
    UpdateMany,
    Delete,
    DeleteMany,
    Replace,
    Head,
    Options,
}

impl Capability {
    pub fn method(self) -> Method {
        match self {
            Capability::Create => Method::POST,
            Capability::Read | Capability::ReadMany => Method::GET,
            Capability::Update | Capability::UpdateMany => Method::PATCH,
            Capability::Delete | Capability::DeleteMany => Method::DELETE,
            Capability::Replace => Method::PUT,
            Capability::Head => Method::HEAD,
            Capability::Options => Method::OPTIONS,
        }
    }

    fn pattern(self, base: &str) -> String {
        match self {
            Capability::Create | Capability::ReadMany | Capability::UpdateMany | Capability::DeleteMany => {
                base.to_string()
            }
            Capability::Read | Capability::Update | Capability::Delete | Capability::Replace => {
                format!("{base}/{{{ID_PARAMETER}}}")
            }
            Capability::Head | Capability::Options => format!("{base}/[{ID_PARAMETER}]"),
        }
    }
}

fn unsupported(verb: &'static str) -> Result<(), HandlerError> {
    Err(Box::new(DispatchError::Unsupported(verb)))
}

/// A resource controller with explicitly declared capabilities.
///
/// Every verb defaults to an `Unsupported` error, so implementors only
/// override what they declare.
pub trait RestController: Send + Sync + 'static {
    fn capabilities(&self) -> &[Capability];

    fn create(&self, _ctx: &mut Context) -> Result<(), HandlerError> {
        unsupported("create")
    }

    fn read(&self, _id: &str, _ctx: &mut Context) -> Result<(), HandlerError> {
        unsupported("read")
    }

    fn read_many(&self, _ctx: &mut Context) -> Result<(), HandlerError> {
        unsupported("read many")
    }

    fn update(&self, _id: &str, _ctx: &mut Context) -> Result<(), HandlerError> {
        unsupported("update")
    }

    fn update_many(&self, _ctx: &mut Context) -> Result<(), HandlerError> {
        unsupported("update many")
    }

    fn delete(&self, _id: &str, _ctx: &mut Context) -> Result<(), HandlerError> {
        unsupported("delete")
    }

    fn delete_many(&self, _ctx: &mut Context) -> Result<(), HandlerError> {
        unsupported("delete many")
    }

    fn replace(&self, _id: &str, _ctx: &mut Context) -> Result<(), HandlerError> {
        unsupported("replace")
    }

    fn head(&self, _ctx: &mut Context) -> Result<(), HandlerError> {
        unsupported("head")
    }

    fn options(&self, _ctx: &mut Context) -> Result<(), HandlerError> {
        unsupported("options")
    }
}

fn invoke<C: RestController>(
    controller: &C,
    capability: Capability,
    ctx: &mut Context,
) -> Result<(), HandlerError> {
    let id = ctx.path_value(ID_PARAMETER).unwrap_or_default().to_string();
    match capability {
        Capability::Create => controller.create(ctx),
        Capability::Read => controller.read(&id, ctx),
        Capability::ReadMany => controller.read_many(ctx),
        Capability::Update => controller.update(&id, ctx),
        Capability::UpdateMany => controller.update_many(ctx),
        Capability::Delete => controller.delete(&id, ctx),
        Capability::DeleteMany => controller.delete_many(ctx),
        Capability::Replace => controller.replace(&id, ctx),
        Capability::Head => controller.head(ctx),
        Capability::Options => controller.options(ctx),
    }
}

/// Value of the `Allow` header for a set of capabilities.
pub fn allow_header(capabilities: &[Capability]) -> String {
    let mut methods: Vec<Method> = Vec::new();
    for method in capabilities
        .iter()
        .map(|c| c.method())
        .chain(std::iter::once(Method::OPTIONS))
    {
        if !methods.contains(&method) {
            methods.push(method);
        }
    }
    methods
        .iter()
        .map(Method::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

impl HttpHandler {
    /// Map every capability `controller` declares under `base`.
    pub fn map_controller<C: RestController>(
        &mut self,
        base: &str,
        controller: C,
    ) -> Result<&mut Self, DispatchError> {
        let base = base.trim_end_matches('/');
        let controller = Arc::new(controller);
        let capabilities = controller.capabilities().to_vec();

        for &capability in &capabilities {
            let pattern = capability.pattern(base);
            let target = controller.clone();
            self.map_with(
                &pattern,
                Executor::func(move |ctx: &mut Context| invoke(target.as_ref(), capability, ctx)),
                vec![matcher::method(capability.method())],
            )?;
        }

        if !capabilities.contains(&Capability::Options) {
            let allow = HeaderValue::from_str(&allow_header(&capabilities)).map_err(DispatchError::handler)?;
            self.map_with(
                &Capability::Options.pattern(base),
                Executor::func(move |ctx: &mut Context| {
                    let response = ctx.response_mut();
                    response.set_status(StatusCode::OK);
                    response.set_header(ALLOW, [allow.clone()]);
                    Ok(())
                }),
                vec![matcher::method(Method::OPTIONS)],
            )?;
        }

        tracing::debug!(base = %base, capabilities = ?capabilities, "Mapped controller");
        Ok(self)
    }
}
