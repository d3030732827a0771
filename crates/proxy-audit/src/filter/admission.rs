use std::fmt;

use crate::conf::FilterConfig;
use crate::record::RawRecord;

use super::matches_one_of;

/// Why a record was not admitted for route parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    Status(i32),
    Host(String),
    Method(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Status(status) => write!(f, "status {status} is not 2xx"),
            SkipReason::Host(host) => write!(f, "host {host:?} not admitted"),
            SkipReason::Method(method) => write!(f, "method {method:?} is not mutating"),
        }
    }
}

/// Coarse gate: 2xx status, admitted host prefix, mutating method.
pub fn should_parse(record: &RawRecord, rules: &FilterConfig) -> Result<(), SkipReason> {
    if !(200..300).contains(&record.status) {
        return Err(SkipReason::Status(record.status));
    }

    if !rules.host_prefixes.iter().any(|p| record.host.starts_with(p.as_str())) {
        return Err(SkipReason::Host(record.host.clone()));
    }

    if !matches_one_of(&record.method, &rules.methods) {
        return Err(SkipReason::Method(record.method.clone()));
    }

    Ok(())
}
