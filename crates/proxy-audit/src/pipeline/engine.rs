//! Engine — the shared classification pipeline.
//!
//! Both sources normalize their input into a [`RawRecord`] and hand it here:
//! admission gate, route parsing, token extraction, audit gate.

use chrono::Utc;

use crate::conf::FilterConfig;
use crate::filter::{should_audit, should_parse, FilterError, TokenExtractor};
use crate::record::{line, message, AgentMessage, RawRecord};
use crate::route::parse_route;

use super::event::AuditEvent;
use super::outcome::Outcome;

pub struct Engine {
    rules: FilterConfig,
    tokens: TokenExtractor,
}

impl Engine {
    pub fn new(rules: FilterConfig) -> Result<Self, FilterError> {
        Ok(Self {
            rules,
            tokens: TokenExtractor::new()?,
        })
    }

    pub fn evaluate(&self, record: RawRecord) -> Outcome {
        if let Err(reason) = should_parse(&record, &self.rules) {
            return Outcome::Skipped(reason);
        }

        let route = match parse_route(&record.path) {
            Ok(route) => route,
            Err(e) => return Outcome::Unparseable(e),
        };

        let auth_token = self.tokens.extract(&record.query);

        if let Err(rejected) = should_audit(&record, &route, &auth_token, &self.rules) {
            return Outcome::NotAuditable(rejected);
        }

        Outcome::Audit(AuditEvent {
            received_at: Utc::now(),
            auth_token,
            ip: record.ip,
            method: record.method,
            uid: record.uid,
            route,
        })
    }

    pub fn process_line(&self, raw: &str) -> Outcome {
        match line::from_line(raw) {
            Ok(record) => self.evaluate(record),
            Err(e) => Outcome::Malformed(e),
        }
    }

    pub fn process_message(&self, msg: &AgentMessage) -> Outcome {
        self.evaluate(message::from_message(msg))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{AuditRejection, SkipReason};
    use crate::record::{MessageArg, RecordError};
    use crate::route::RouteParseError;

    const TOKEN: &str = "rvLFkLxnmS-65WjxS8ru";

    fn engine() -> Engine {
        Engine::new(FilterConfig::default()).expect("engine")
    }

    fn log_line(status: i32, host: &str, method: &str, path: &str, query: &str) -> String {
        format!(
            "Oct 19 17:30:01 lb1 haproxy[812]: {{\"host\":\"{host}\",\"ip\":\"10.0.0.7\",\"method\":\"{method}\",\"path\":\"{path}\",\"query\":\"{query}\",\"status\":{status}}}"
        )
    }

    #[test]
    fn test_line_becomes_event() {
        let query = format!("auth_token={TOKEN}");
        let outcome = engine().process_line(&log_line(200, "api.example.com", "PUT", "/v2/panels/568969/zone_informations", &query));
        let event = outcome.into_event().expect("should audit");
        assert_eq!(event.auth_token, TOKEN);
        assert_eq!(event.ip, "10.0.0.7");
        assert_eq!(event.method, "PUT");
        assert_eq!(event.route.api, "panels");
        assert_eq!(event.route.api_id, "568969");
        assert_eq!(event.route.concept.as_deref(), Some("zone_informations"));
    }

    #[test]
    fn test_message_becomes_event() {
        let msg = AgentMessage::new(
            "audit-response",
            vec![
                MessageArg::new("uid", "abc-123"),
                MessageArg::new("ip", "10.0.0.8"),
                MessageArg::new("host", "vk.example.com"),
                MessageArg::new("path", "/1/panels/4-8489/rooms/12/hotspots/99"),
                MessageArg::new("query", format!("auth_token={TOKEN}")),
                MessageArg::new("method", "post"),
                MessageArg::new("status", 201),
            ],
        );
        let event = engine().process_message(&msg).into_event().expect("should audit");
        assert_eq!(event.uid.as_deref(), Some("abc-123"));
        assert_eq!(event.route.concept.as_deref(), Some("room_hotspots"));
        assert_eq!(event.route.concept_id, Some(99));
    }

    #[test]
    fn test_non_2xx_never_audited() {
        let query = format!("auth_token={TOKEN}");
        for status in [100, 199, 300, 404, 503] {
            let outcome = engine().process_line(&log_line(status, "api.example.com", "PUT", "/v2/panels/1/zones", &query));
            assert!(matches!(outcome, Outcome::Skipped(SkipReason::Status(s)) if s == status));
        }
    }

    #[test]
    fn test_foreign_host_never_audited() {
        let query = format!("auth_token={TOKEN}");
        let outcome = engine().process_line(&log_line(200, "www.example.com", "PUT", "/v2/panels/1/zones", &query));
        assert!(matches!(outcome, Outcome::Skipped(SkipReason::Host(_))));
    }

    #[test]
    fn test_missing_marker_is_malformed() {
        let outcome = engine().process_line("Oct 19 17:30:01 lb1 haproxy[812]: Connect from 10.0.0.1");
        assert!(matches!(outcome, Outcome::Malformed(RecordError::NotJson)));
    }

    #[test]
    fn test_bad_path_is_unparseable() {
        let query = format!("auth_token={TOKEN}");
        let outcome = engine().process_line(&log_line(200, "api.example.com", "PUT", "/sessions/new", &query));
        assert!(matches!(outcome, Outcome::Unparseable(RouteParseError::UnsupportedShape { .. })));

        let outcome = engine().process_line(&log_line(200, "api.example.com", "PUT", "/", &query));
        assert!(matches!(outcome, Outcome::Unparseable(RouteParseError::TooShort { .. })));
    }

    #[test]
    fn test_numeric_concept_not_auditable() {
        let query = format!("auth_token={TOKEN}");
        let outcome = engine().process_line(&log_line(200, "api.example.com", "PATCH", "/v2/panels/1/123", &query));
        match outcome {
            Outcome::NotAuditable(rejected) => {
                assert_eq!(rejected.reason, AuditRejection::NumericConcept("123".into()))
            }
            other => panic!("unexpected outcome: {}", other.kind()),
        }
    }

    #[test]
    fn test_missing_token_not_auditable() {
        let outcome = engine().process_line(&log_line(200, "api.example.com", "DELETE", "/v2/panels/1/zones", "x=1"));
        assert!(matches!(outcome, Outcome::NotAuditable(ref r) if r.reason == AuditRejection::MissingToken));
    }
}
