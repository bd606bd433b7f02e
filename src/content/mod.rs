//! Content screening.
//!
//! [`ContentChecker`] matches free text against four fixed keyword lists
//! and reports which categories were hit. It is a deny-list heuristic:
//! false positives and false negatives are expected, and reviewers make
//! the final call.

pub mod checker;
pub mod keywords;

pub use checker::{ContentCheck, ContentChecker, ContentChecks, ContentMatches};
pub use keywords::KeywordLists;
