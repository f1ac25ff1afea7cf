//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Compilation (at registration):
//!     pattern string
//!     → segment.rs (classify each segment)
//!     → pattern.rs (compiled PathPattern)
//!
//! Incoming Request:
//!     raw path → path.rs (segments)
//!     → pattern.rs (match verdict + parameters)
//!     → matcher.rs (method / regex filters, three-valued decisions)
//! ```
//!
//! # Design Decisions
//! - Patterns compiled once, immutable afterwards
//! - Single linear pass per match, no regex in path matching
//! - Deterministic: same input always yields the same verdict

pub mod matcher;
pub mod path;
pub mod pattern;
pub mod segment;

pub use matcher::{any_match, Decision, MatcherFunc};
pub use path::Path;
pub use pattern::{Parameters, PathMatch, PathPattern};
pub use segment::{classify_segment, clean_parameter_name, SegmentType};
