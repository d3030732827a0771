use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::route::ParsedRoute;

/// A mutating API call that passed both gates and is ready to persist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditEvent {
    /// Receipt time at this process, not the proxy's own timestamp
    pub received_at: DateTime<Utc>,
    pub auth_token: String,
    pub ip: String,
    /// HTTP method; stored as the event type
    pub method: String,
    pub uid: Option<String>,
    pub route: ParsedRoute,
}
