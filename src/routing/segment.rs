//! Path pattern segment classification.
//!
//! A segment's kind is decided purely by its lexical shape:
//!
//! | shape     | kind               |
//! |-----------|--------------------|
//! | `{name}`  | dynamic            |
//! | `[name]`  | dynamic, optional  |
//! | `*`       | wildcard           |
//! | `***`     | catch-all          |
//! | otherwise | literal            |

/// Token matching exactly one segment without binding it.
pub const WILDCARD: &str = "*";

/// Token consuming every remaining segment.
pub const CATCH_ALL: &str = "***";

/// Kind of a single pattern segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SegmentType {
    Literal,
    Dynamic,
    DynamicOptional,
    Wildcard,
    CatchAll,
}

impl SegmentType {
    /// True for the kinds that bind a named parameter.
    pub fn is_dynamic(self) -> bool {
        matches!(self, SegmentType::Dynamic | SegmentType::DynamicOptional)
    }
}

/// Classify one pattern segment. Total; never fails.
pub fn classify_segment(segment: &str) -> SegmentType {
    if segment.starts_with('{') && segment.ends_with('}') {
        SegmentType::Dynamic
    } else if segment.starts_with('[') && segment.ends_with(']') {
        SegmentType::DynamicOptional
    } else if segment == WILDCARD {
        SegmentType::Wildcard
    } else if segment == CATCH_ALL {
        SegmentType::CatchAll
    } else {
        SegmentType::Literal
    }
}

/// Strip placeholder delimiters to recover the bindable name.
pub fn clean_parameter_name(segment: &str) -> String {
    segment
        .chars()
        .filter(|c| !matches!(c, '{' | '}' | '[' | ']'))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(classify_segment("{id}"), SegmentType::Dynamic);
        assert_eq!(classify_segment("[id]"), SegmentType::DynamicOptional);
        assert_eq!(classify_segment("*"), SegmentType::Wildcard);
        assert_eq!(classify_segment("***"), SegmentType::CatchAll);
        assert_eq!(classify_segment("people"), SegmentType::Literal);
        assert_eq!(classify_segment(""), SegmentType::Literal);
        assert_eq!(classify_segment("**"), SegmentType::Literal);
        assert_eq!(classify_segment("{id"), SegmentType::Literal);
    }

    #[test]
    fn test_clean_parameter_name() {
        assert_eq!(clean_parameter_name("{id}"), "id");
        assert_eq!(clean_parameter_name("[id]"), "id");
        assert_eq!(clean_parameter_name("{id}"), clean_parameter_name("[id]"));
        assert_eq!(clean_parameter_name("{group_id}"), "group_id");
    }

    #[test]
    fn test_is_dynamic() {
        assert!(SegmentType::Dynamic.is_dynamic());
        assert!(SegmentType::DynamicOptional.is_dynamic());
        assert!(!SegmentType::CatchAll.is_dynamic());
    }
}
