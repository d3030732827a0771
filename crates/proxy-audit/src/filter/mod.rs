//! Filter module — admission gate, auth-token extraction, audit gate.

pub mod admission;
pub mod audit;
pub mod token;

pub use admission::{should_parse, SkipReason};
pub use audit::{should_audit, AuditRejection, NotAuditable};
pub use token::{FilterError, TokenExtractor};

/// ASCII case-insensitive membership test.
#[inline]
pub(crate) fn matches_one_of(value: &str, list: &[String]) -> bool {
    list.iter().any(|item| item.eq_ignore_ascii_case(value))
}
