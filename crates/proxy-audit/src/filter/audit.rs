use std::fmt;

use thiserror::Error;

use crate::conf::FilterConfig;
use crate::record::RawRecord;
use crate::route::{model::parse_id, ParsedRoute};

use super::matches_one_of;

/// Which audit rule rejected the route. Checked in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditRejection {
    MissingToken,
    IgnoredApi(String),
    /// A numeric concept means the path was misparsed
    NumericConcept(String),
    IgnoredConcept(String),
    IgnoredAction(String),
}

impl fmt::Display for AuditRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditRejection::MissingToken => f.write_str("no auth token"),
            AuditRejection::IgnoredApi(api) => write!(f, "ignored api {api:?}"),
            AuditRejection::NumericConcept(concept) => write!(f, "numeric concept {concept:?}"),
            AuditRejection::IgnoredConcept(concept) => write!(f, "ignored concept {concept:?}"),
            AuditRejection::IgnoredAction(action) => write!(f, "ignored action {action:?}"),
        }
    }
}

/// A parsed record that the audit rules excluded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Not auditable: {status} {method} {host}/{path} ({reason})")]
pub struct NotAuditable {
    pub status: i32,
    pub method: String,
    pub host: String,
    pub path: String,
    pub reason: AuditRejection,
}

impl NotAuditable {
    fn new(record: &RawRecord, reason: AuditRejection) -> Self {
        Self {
            status: record.status,
            method: record.method.clone(),
            host: record.host.clone(),
            path: record.path.clone(),
            reason,
        }
    }
}

fn first_rejection(route: &ParsedRoute, token: &str, rules: &FilterConfig) -> Option<AuditRejection> {
    if token.is_empty() {
        return Some(AuditRejection::MissingToken);
    }

    if matches_one_of(&route.api, &rules.ignore_apis) {
        return Some(AuditRejection::IgnoredApi(route.api.clone()));
    }

    if let Some(concept) = &route.concept {
        if parse_id(concept).is_some() {
            return Some(AuditRejection::NumericConcept(concept.clone()));
        }
        if matches_one_of(concept, &rules.ignore_concepts) {
            return Some(AuditRejection::IgnoredConcept(concept.clone()));
        }
    }

    if let Some(action) = &route.action {
        if matches_one_of(action, &rules.ignore_actions) {
            return Some(AuditRejection::IgnoredAction(action.clone()));
        }
    }

    None
}

/// Fine-grained gate over a parsed route. The first failing rule wins.
pub fn should_audit(
    record: &RawRecord,
    route: &ParsedRoute,
    token: &str,
    rules: &FilterConfig,
) -> Result<(), NotAuditable> {
    match first_rejection(route, token, rules) {
        Some(reason) => Err(NotAuditable::new(record, reason)),
        None => Ok(()),
    }
}
