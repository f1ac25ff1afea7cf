//! Path pattern compilation and matching.
//!
//! # Responsibilities
//! - Compile a pattern string into typed segments once, at registration
//! - Match a concrete [`Path`] in a single linear pass
//! - Extract named parameters from dynamic segments
//!
//! # Design Decisions
//! - Literal segments compare case-insensitively; bound values keep case
//! - No backtracking: only the final segment may be variable-length
//! - A path longer than the pattern needs a trailing catch-all
//! - A path exactly one segment shorter needs a trailing optional or
//!   catch-all; larger shortfalls never match, even when several trailing
//!   segments are optional
//! - A pattern made only of `***` matches everything, the empty path too

use std::collections::HashMap;
use std::fmt;

use crate::error::DispatchError;
use crate::routing::path::{split_segments, Path};
use crate::routing::segment::{classify_segment, clean_parameter_name, SegmentType};

/// Named values extracted from a matched path.
pub type Parameters = HashMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Segment {
    kind: SegmentType,
    /// Lowercased text for literals, parameter name for dynamic kinds.
    value: String,
}

/// A compiled path pattern.
#[derive(Clone, PartialEq, Eq)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    /// Compile a pattern such as `/people/{id}/books/***`.
    pub fn compile(pattern: &str) -> Result<Self, DispatchError> {
        let segments = split_segments(pattern)
            .into_iter()
            .map(|raw| compile_segment(pattern, raw))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            raw: pattern.to_string(),
            segments,
        })
    }

    /// The pattern that matches every path.
    pub fn catch_all() -> Self {
        Self {
            raw: super::segment::CATCH_ALL.to_string(),
            segments: vec![Segment {
                kind: SegmentType::CatchAll,
                value: String::new(),
            }],
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Kinds of the compiled segments, in order.
    pub fn segment_types(&self) -> impl Iterator<Item = SegmentType> + '_ {
        self.segments.iter().map(|s| s.kind)
    }

    /// True when this pattern is the lone catch-all token.
    pub fn is_catch_all(&self) -> bool {
        matches!(self.segments.as_slice(), [only] if only.kind == SegmentType::CatchAll)
    }

    /// Match a concrete path against this pattern.
    pub fn matches(&self, path: &Path) -> PathMatch {
        if self.is_catch_all() {
            return PathMatch::matched(Parameters::new());
        }

        let pattern = &self.segments;
        let concrete = path.segments();

        // Non-empty by construction: splitting never yields zero segments.
        let last = match pattern.last() {
            Some(last) => last.kind,
            None => return PathMatch::no_match(),
        };

        if pattern.len() < concrete.len() {
            if last != SegmentType::CatchAll {
                return PathMatch::no_match();
            }
        } else if pattern.len() > concrete.len() {
            let tolerated = matches!(last, SegmentType::DynamicOptional | SegmentType::CatchAll);
            if !tolerated || pattern.len() - concrete.len() > 1 {
                return PathMatch::no_match();
            }
        }

        let mut parameters = Parameters::new();
        for (i, segment) in pattern.iter().enumerate() {
            let value = concrete.get(i);
            match segment.kind {
                SegmentType::Literal => match value {
                    Some(value) if value.to_lowercase() == segment.value => {}
                    _ => return PathMatch::no_match(),
                },
                SegmentType::Dynamic => {
                    if let Some(value) = value {
                        parameters.insert(segment.value.clone(), value.clone());
                    }
                }
                // An empty path splits into one empty segment; that is not a value.
                SegmentType::DynamicOptional => match value {
                    Some(value) if !value.is_empty() => {
                        parameters.insert(segment.value.clone(), value.clone());
                    }
                    _ => {}
                },
                SegmentType::Wildcard | SegmentType::CatchAll => {}
            }
        }

        PathMatch::matched(parameters)
    }
}

impl fmt::Debug for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PathPattern").field(&self.raw).finish()
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn compile_segment(pattern: &str, raw: String) -> Result<Segment, DispatchError> {
    let invalid = |reason: String| DispatchError::PatternCompile {
        pattern: pattern.to_string(),
        reason,
    };

    let kind = classify_segment(&raw);
    match kind {
        SegmentType::Dynamic | SegmentType::DynamicOptional => {
            let name = clean_parameter_name(&raw);
            // Anything beyond the outer pair of delimiters is malformed.
            if name.len() + 2 != raw.len() {
                return Err(invalid(format!("unbalanced delimiters in segment {raw:?}")));
            }
            if name.is_empty() {
                return Err(invalid(format!("empty parameter name in segment {raw:?}")));
            }
            Ok(Segment { kind, value: name })
        }
        SegmentType::Literal => {
            if raw.contains(['{', '}', '[', ']']) {
                return Err(invalid(format!("unbalanced delimiters in segment {raw:?}")));
            }
            Ok(Segment {
                kind,
                value: raw.to_lowercase(),
            })
        }
        SegmentType::Wildcard | SegmentType::CatchAll => Ok(Segment {
            kind,
            value: String::new(),
        }),
    }
}

/// Result of matching a path against a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathMatch {
    matches: bool,
    parameters: Parameters,
}

impl PathMatch {
    pub fn matched(parameters: Parameters) -> Self {
        Self {
            matches: true,
            parameters,
        }
    }

    /// The canonical "no match" value.
    pub fn no_match() -> Self {
        Self {
            matches: false,
            parameters: Parameters::new(),
        }
    }

    pub fn is_match(&self) -> bool {
        self.matches
    }

    /// Extracted parameters; `None` when the path did not match.
    pub fn parameters(&self) -> Option<&Parameters> {
        self.matches.then_some(&self.parameters)
    }

    /// Consume the result, yielding parameters only for a match.
    pub fn into_parameters(self) -> Option<Parameters> {
        self.matches.then_some(self.parameters)
    }
}
