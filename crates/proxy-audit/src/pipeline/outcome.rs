use crate::filter::{NotAuditable, SkipReason};
use crate::record::RecordError;
use crate::route::RouteParseError;

use super::event::AuditEvent;

/// Result of running one record through the engine.
#[derive(Debug)]
pub enum Outcome {
    Audit(AuditEvent),
    /// Failed the admission gate
    Skipped(SkipReason),
    Unparseable(RouteParseError),
    NotAuditable(NotAuditable),
    /// The raw input never became a record
    Malformed(RecordError),
}

#[cfg(test)]
impl Outcome {
    pub fn kind(&self) -> &'static str {
        match self {
            Outcome::Audit(_) => "audit",
            Outcome::Skipped(_) => "skipped",
            Outcome::Unparseable(_) => "unparseable",
            Outcome::NotAuditable(_) => "not_auditable",
            Outcome::Malformed(_) => "malformed",
        }
    }

    pub fn into_event(self) -> Option<AuditEvent> {
        match self {
            Outcome::Audit(event) => Some(event),
            _ => None,
        }
    }
}
