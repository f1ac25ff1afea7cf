//! Request path normalization.
//!
//! # Responsibilities
//! - Hold the raw request path exactly as received
//! - Split it lazily into `/`-delimited segments
//!
//! # Design Decisions
//! - Only leading/trailing separators are trimmed; case is preserved
//! - Segments are percent-decoded after splitting, so `%2F` stays inside
//!   its segment
//! - An empty path yields one empty segment, the same way patterns split,
//!   so index-aligned comparison stays valid

use std::fmt;
use std::sync::OnceLock;

use percent_encoding::percent_decode_str;

/// Path segment separator.
pub const SEPARATOR: char = '/';

/// Split a path or pattern string into segments.
///
/// Shared by [`Path`] and the pattern compiler so both sides agree on how
/// an empty or slash-only string is represented.
pub(crate) fn split_segments(raw: &str) -> Vec<String> {
    raw.trim_matches(SEPARATOR)
        .split(SEPARATOR)
        .map(str::to_string)
        .collect()
}

/// An immutable request path.
#[derive(Clone, Default)]
pub struct Path {
    raw: String,
    segments: OnceLock<Vec<String>>,
}

impl Path {
    pub fn new(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            segments: OnceLock::new(),
        }
    }

    /// The path as it was received.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Ordered, decoded segments of the trimmed path. Always at least one
    /// element.
    pub fn segments(&self) -> &[String] {
        self.segments.get_or_init(|| {
            split_segments(&self.raw)
                .iter()
                .map(|segment| percent_decode_str(segment).decode_utf8_lossy().into_owned())
                .collect()
        })
    }
}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Path").field(&self.raw).finish()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl PartialEq for Path {
    fn eq(&self, other: &Self) -> bool {
        self.segments() == other.segments()
    }
}

impl Eq for Path {}

impl From<&str> for Path {
    fn from(raw: &str) -> Self {
        Path::new(raw)
    }
}

impl From<String> for Path {
    fn from(raw: String) -> Self {
        Path::new(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segments_trim_separators() {
        let path = Path::new("/people/123/groups/456/");
        assert_eq!(path.segments(), ["people", "123", "groups", "456"]);
        assert_eq!(path.raw(), "/people/123/groups/456/");
    }

    #[test]
    fn test_empty_path_has_one_empty_segment() {
        assert_eq!(Path::new("").segments(), [""]);
        assert_eq!(Path::new("/").segments(), [""]);
        assert_eq!(Path::new("//").segments(), [""]);
    }

    #[test]
    fn test_case_is_preserved() {
        let path = Path::new("/People/ABC");
        assert_eq!(path.segments(), ["People", "ABC"]);
    }

    #[test]
    fn test_segments_are_idempotent() {
        let path = Path::new("/a/b/c");
        let first = path.segments().to_vec();
        let second = path.segments().to_vec();
        assert_eq!(first, second);
    }

    #[test]
    fn test_segments_are_percent_decoded() {
        let path = Path::new("/people/Mat%20Ryer");
        assert_eq!(path.segments(), ["people", "Mat Ryer"]);
        assert_eq!(path.raw(), "/people/Mat%20Ryer");

        let slash = Path::new("/files/a%2Fb/meta");
        assert_eq!(slash.segments(), ["files", "a/b", "meta"]);
    }

    #[test]
    fn test_equality_compares_segments() {
        assert_eq!(Path::new("/a/b/"), Path::new("a/b"));
        assert_ne!(Path::new("/a/b"), Path::new("/a/B"));
    }
}
