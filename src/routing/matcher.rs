//! Matcher functions: pluggable request filters beyond path matching.
//!
//! # Responsibilities
//! - Define the three-valued [`Decision`]
//! - Reduce a handler's decisions into an activation verdict
//! - Provide the common filters (HTTP method, path regex)
//!
//! # Design Decisions
//! - "Any Match wins": one `Match` activates the handler, a `NoMatch`
//!   never vetoes another function's `Match`
//! - Decisions are evaluated lazily in registration order; evaluation stops
//!   at the first `Match` or the first error
//! - Method filters answer `DontCare` for other methods so several of them
//!   can be attached to one route

use std::fmt;

use axum::http::Method;
use regex::Regex;

use crate::context::Context;
use crate::error::DispatchError;

/// Verdict of a single matcher function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(i8)]
pub enum Decision {
    DontCare = -1,
    NoMatch = 0,
    Match = 1,
}

impl Decision {
    /// `Match` when true, `NoMatch` otherwise.
    pub fn from_bool(matched: bool) -> Self {
        if matched {
            Decision::Match
        } else {
            Decision::NoMatch
        }
    }
}

/// A request filter attached to a handler registration.
pub trait MatcherFunc: Send + Sync {
    fn decide(&self, ctx: &Context) -> Result<Decision, DispatchError>;
}

impl<F> MatcherFunc for F
where
    F: Fn(&Context) -> Result<Decision, DispatchError> + Send + Sync,
{
    fn decide(&self, ctx: &Context) -> Result<Decision, DispatchError> {
        (self)(ctx)
    }
}

/// Reduce decisions with "any Match wins".
///
/// Returns `Ok(true)` at the first `Match`, the first error as-is, and
/// `Ok(false)` when the sequence is exhausted without a `Match`. Callers
/// with no matcher functions at all skip this: an empty set activates.
pub fn any_match<I>(decisions: I) -> Result<bool, DispatchError>
where
    I: IntoIterator<Item = Result<Decision, DispatchError>>,
{
    for decision in decisions {
        if decision? == Decision::Match {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Evaluate a handler's matcher functions against a request.
pub fn evaluate(matchers: &[Box<dyn MatcherFunc>], ctx: &Context) -> Result<bool, DispatchError> {
    if matchers.is_empty() {
        return Ok(true);
    }
    any_match(matchers.iter().map(|m| m.decide(ctx)))
}

/// Box a closure as a matcher function.
pub fn fn_matcher<F>(f: F) -> Box<dyn MatcherFunc>
where
    F: Fn(&Context) -> Result<Decision, DispatchError> + Send + Sync + 'static,
{
    Box::new(f)
}

/// Matches one HTTP method.
#[derive(Debug, Clone)]
pub struct MethodMatcher {
    methods: Vec<Method>,
}

impl MethodMatcher {
    pub fn new<I>(methods: I) -> Self
    where
        I: IntoIterator<Item = Method>,
    {
        Self {
            methods: methods.into_iter().collect(),
        }
    }
}

impl MatcherFunc for MethodMatcher {
    fn decide(&self, ctx: &Context) -> Result<Decision, DispatchError> {
        if self.methods.iter().any(|m| m == ctx.method()) {
            Ok(Decision::Match)
        } else {
            Ok(Decision::DontCare)
        }
    }
}

/// Match requests using `method`; `DontCare` for anything else.
pub fn method(method: Method) -> Box<dyn MatcherFunc> {
    Box::new(MethodMatcher::new([method]))
}

/// Match requests using any of `methods`.
pub fn methods<I>(methods: I) -> Box<dyn MatcherFunc>
where
    I: IntoIterator<Item = Method>,
{
    Box::new(MethodMatcher::new(methods))
}

/// Matches the raw request path against a regular expression.
pub struct RegexPathMatcher {
    source: String,
    regex: Result<Regex, regex::Error>,
}

impl RegexPathMatcher {
    /// Compilation failures are kept and reported on each evaluation.
    pub fn new(expr: impl Into<String>) -> Self {
        let source = expr.into();
        let regex = Regex::new(&source);
        Self { source, regex }
    }
}

impl fmt::Debug for RegexPathMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RegexPathMatcher").field(&self.source).finish()
    }
}

impl MatcherFunc for RegexPathMatcher {
    fn decide(&self, ctx: &Context) -> Result<Decision, DispatchError> {
        match &self.regex {
            Ok(regex) => Ok(Decision::from_bool(regex.is_match(ctx.path().raw()))),
            Err(e) => Err(DispatchError::MatcherFunction(format!(
                "invalid path expression {:?}: {}",
                self.source, e
            ))),
        }
    }
}

/// `Match` when the raw path matches `expr`, `NoMatch` otherwise.
pub fn regex_path(expr: impl Into<String>) -> Box<dyn MatcherFunc> {
    Box::new(RegexPathMatcher::new(expr))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::test_context;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn fixed(decision: Decision) -> Box<dyn MatcherFunc> {
        fn_matcher(move |_: &Context| Ok(decision))
    }

    #[test]
    fn test_decision_ordering() {
        assert!(Decision::DontCare < Decision::NoMatch);
        assert!(Decision::NoMatch < Decision::Match);
        assert_eq!(Decision::DontCare as i8, -1);
        assert_eq!(Decision::Match as i8, 1);
    }

    #[test]
    fn test_any_match_wins() {
        let ctx = test_context(Method::GET, "/");
        let matchers = vec![fixed(Decision::DontCare), fixed(Decision::Match)];
        assert!(evaluate(&matchers, &ctx).unwrap());

        let matchers = vec![fixed(Decision::NoMatch), fixed(Decision::Match)];
        assert!(evaluate(&matchers, &ctx).unwrap());
    }

    #[test]
    fn test_no_match_without_any_match() {
        let ctx = test_context(Method::GET, "/");
        let matchers = vec![fixed(Decision::DontCare), fixed(Decision::NoMatch)];
        assert!(!evaluate(&matchers, &ctx).unwrap());

        let matchers = vec![fixed(Decision::DontCare), fixed(Decision::DontCare)];
        assert!(!evaluate(&matchers, &ctx).unwrap());
    }

    #[test]
    fn test_empty_set_activates() {
        let ctx = test_context(Method::GET, "/");
        assert!(evaluate(&[], &ctx).unwrap());
        assert!(!any_match(Vec::new()).unwrap());
    }

    #[test]
    fn test_error_aborts_evaluation() {
        let ctx = test_context(Method::GET, "/");
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let matchers = vec![
            fn_matcher(|_: &Context| Err(DispatchError::MatcherFunction("boom".into()))),
            fn_matcher(move |_: &Context| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(Decision::Match)
            }),
        ];
        let err = evaluate(&matchers, &ctx).unwrap_err();
        assert!(matches!(err, DispatchError::MatcherFunction(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_method_matcher() {
        let get = test_context(Method::GET, "/");
        let post = test_context(Method::POST, "/");
        let m = method(Method::GET);
        assert_eq!(m.decide(&get).unwrap(), Decision::Match);
        assert_eq!(m.decide(&post).unwrap(), Decision::DontCare);

        let m = methods([Method::PUT, Method::POST]);
        assert_eq!(m.decide(&post).unwrap(), Decision::Match);
        assert_eq!(m.decide(&get).unwrap(), Decision::DontCare);
    }

    #[test]
    fn test_regex_path() {
        let ctx = test_context(Method::GET, "/people/123");
        assert_eq!(regex_path(r"^/people/\d+$").decide(&ctx).unwrap(), Decision::Match);
        assert_eq!(regex_path(r"^/groups").decide(&ctx).unwrap(), Decision::NoMatch);

        let err = regex_path("([unclosed").decide(&ctx).unwrap_err();
        assert!(matches!(err, DispatchError::MatcherFunction(_)));
    }
}
