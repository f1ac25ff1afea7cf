//! Route registration: a path pattern, matcher functions and an executor.

use std::fmt;
use std::sync::Arc;

use crate::context::Context;
use crate::error::{DispatchError, HandlerError};
use crate::handlers::Handler;
use crate::routing::matcher::{self, MatcherFunc};
use crate::routing::PathPattern;

/// Plain function executor.
pub type HandlerFunc = Arc<dyn Fn(&mut Context) -> Result<(), HandlerError> + Send + Sync>;

/// The work a route performs once it activates.
#[derive(Clone)]
pub enum Executor {
    /// A plain function; the route's `break_pipeline` flag decides stop.
    Func(HandlerFunc),
    /// A full handler (possibly a nested pipe); its own stop signal wins.
    Handler(Arc<dyn Handler>),
}

impl Executor {
    pub fn func<F>(f: F) -> Self
    where
        F: Fn(&mut Context) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        Executor::Func(Arc::new(f))
    }

    pub fn handler(handler: impl Handler + 'static) -> Self {
        Executor::Handler(Arc::new(handler))
    }
}

impl fmt::Debug for Executor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Executor::Func(_) => f.write_str("Executor::Func"),
            Executor::Handler(_) => f.write_str("Executor::Handler"),
        }
    }
}

/// Activates when the path matches and the matcher functions agree.
pub struct PathMatchHandler {
    pattern: PathPattern,
    matchers: Vec<Box<dyn MatcherFunc>>,
    executor: Option<Executor>,
    break_pipeline: bool,
}

impl PathMatchHandler {
    pub fn new(
        pattern: PathPattern,
        executor: Option<Executor>,
        matchers: Vec<Box<dyn MatcherFunc>>,
    ) -> Self {
        Self {
            pattern,
            matchers,
            executor,
            break_pipeline: false,
        }
    }

    /// Stop the enclosing pipe after a function executor runs.
    pub fn break_pipeline(mut self, value: bool) -> Self {
        self.break_pipeline = value;
        self
    }

    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }
}

impl Handler for PathMatchHandler {
    fn will_handle(&self, ctx: &mut Context) -> Result<bool, DispatchError> {
        let params = match self.pattern.matches(ctx.path()).into_parameters() {
            Some(params) => params,
            None => return Ok(false),
        };

        if !matcher::evaluate(&self.matchers, ctx)? {
            return Ok(false);
        }

        tracing::debug!(pattern = %self.pattern, method = %ctx.method(), path = %ctx.path(), "Route matched");
        ctx.set_path_params(params);
        Ok(true)
    }

    fn handle(&self, ctx: &mut Context) -> Result<bool, DispatchError> {
        match &self.executor {
            Some(Executor::Func(f)) => {
                f(ctx).map_err(DispatchError::HandlerExecution)?;
                Ok(self.break_pipeline)
            }
            Some(Executor::Handler(handler)) => {
                if handler.will_handle(ctx)? {
                    let stop = handler.handle(ctx)?;
                    Ok(stop || self.break_pipeline)
                } else {
                    Ok(false)
                }
            }
            None => Err(DispatchError::MissingExecutor {
                pattern: self.pattern.raw().to_string(),
            }),
        }
    }
}

impl fmt::Debug for PathMatchHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathMatchHandler")
            .field("pattern", &self.pattern)
            .field("matchers", &self.matchers.len())
            .field("executor", &self.executor)
            .field("break_pipeline", &self.break_pipeline)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::test_context;
    use crate::handlers::testing::CountingHandler;
    use crate::routing::matcher::{fn_matcher, method, Decision};
    use axum::http::Method;

    fn route(pattern: &str, matchers: Vec<Box<dyn MatcherFunc>>) -> PathMatchHandler {
        let executor = Executor::func(|ctx: &mut Context| {
            let id = ctx.path_value("id").unwrap_or("none").to_string();
            ctx.response_mut().write_body(id.as_bytes());
            Ok(())
        });
        PathMatchHandler::new(PathPattern::compile(pattern).unwrap(), Some(executor), matchers)
    }

    #[test]
    fn test_will_handle_stashes_parameters() {
        let handler = route("/people/{id}", vec![]);
        let mut ctx = test_context(Method::GET, "/people/42");

        assert!(handler.will_handle(&mut ctx).unwrap());
        assert_eq!(ctx.path_value("id"), Some("42"));
        assert!(!handler.handle(&mut ctx).unwrap());
        assert_eq!(ctx.response().body(), b"42");
    }

    #[test]
    fn test_path_mismatch_declines() {
        let handler = route("/people/{id}", vec![]);
        let mut ctx = test_context(Method::GET, "/groups/42");
        assert!(!handler.will_handle(&mut ctx).unwrap());
        assert!(ctx.path_params().is_none());
    }

    #[test]
    fn test_matcher_functions_filter() {
        let handler = route("/people/{id}", vec![method(Method::GET), method(Method::POST)]);

        let mut get = test_context(Method::GET, "/people/1");
        assert!(handler.will_handle(&mut get).unwrap());

        let mut delete = test_context(Method::DELETE, "/people/1");
        assert!(!handler.will_handle(&mut delete).unwrap());
        assert!(delete.path_params().is_none());
    }

    #[test]
    fn test_matcher_error_propagates() {
        let failing = fn_matcher(|_: &Context| -> Result<Decision, DispatchError> {
            Err(DispatchError::MatcherFunction("nope".into()))
        });
        let handler = route("/people/{id}", vec![failing]);
        let mut ctx = test_context(Method::GET, "/people/1");
        assert!(matches!(
            handler.will_handle(&mut ctx),
            Err(DispatchError::MatcherFunction(_))
        ));
    }

    #[test]
    fn test_break_pipeline_flag() {
        let handler = route("/people/{id}", vec![]).break_pipeline(true);
        let mut ctx = test_context(Method::GET, "/people/1");
        assert!(handler.will_handle(&mut ctx).unwrap());
        assert!(handler.handle(&mut ctx).unwrap());
    }

    #[test]
    fn test_missing_executor() {
        let handler = PathMatchHandler::new(PathPattern::compile("/x").unwrap(), None, vec![]);
        let mut ctx = test_context(Method::GET, "/x");
        assert!(handler.will_handle(&mut ctx).unwrap());
        assert!(matches!(
            handler.handle(&mut ctx),
            Err(DispatchError::MissingExecutor { .. })
        ));
    }

    #[test]
    fn test_function_error_is_wrapped() {
        let executor = Executor::func(|_: &mut Context| Err("database down".into()));
        let handler = PathMatchHandler::new(PathPattern::compile("/x").unwrap(), Some(executor), vec![]);
        let mut ctx = test_context(Method::GET, "/x");
        let err = handler.handle(&mut ctx).unwrap_err();
        assert!(matches!(err, DispatchError::HandlerExecution(_)));
        assert!(err.to_string().contains("database down"));
    }

    #[test]
    fn test_handler_executor_stop_signal() {
        let inner = CountingHandler::new("inner", true, true);
        let handler = PathMatchHandler::new(
            PathPattern::compile("/x").unwrap(),
            Some(Executor::handler(inner.clone())),
            vec![],
        );
        let mut ctx = test_context(Method::GET, "/x");
        assert!(handler.handle(&mut ctx).unwrap());
        assert_eq!(inner.handle_count(), 1);
    }
}
