use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Path naming convention, chosen by the first path segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Dialect {
    /// `v2/<api>/<api_id>/<concept>/...`
    V2,
    /// `1/<api>/<api_id>/<concept>/...`
    V1,
    /// Anything else; only `users/<action>` is understood
    Generic,
}

impl Dialect {
    pub fn for_version(segment: &str) -> Self {
        match segment {
            "v2" => Dialect::V2,
            "1" => Dialect::V1,
            _ => Dialect::Generic,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Dialect::V2 => "v2",
            Dialect::V1 => "v1",
            Dialect::Generic => "generic",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteParseError {
    #[error("path not long enough: {path:?}")]
    TooShort { path: String },

    #[error("unable to parse {dialect} route with {} sections: {segments:?}", .segments.len())]
    UnsupportedShape {
        dialect: Dialect,
        path: String,
        segments: Vec<String>,
    },
}

impl RouteParseError {
    pub(crate) fn unsupported(dialect: Dialect, path: &str, segments: &[&str]) -> Self {
        RouteParseError::UnsupportedShape {
            dialect,
            path: path.to_string(),
            segments: segments.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// The trimmed path that failed to parse.
    pub fn path(&self) -> &str {
        match self {
            RouteParseError::TooShort { path } => path,
            RouteParseError::UnsupportedShape { path, .. } => path,
        }
    }

    pub fn segment_count(&self) -> usize {
        match self {
            RouteParseError::TooShort { path } => path.split('/').count(),
            RouteParseError::UnsupportedShape { segments, .. } => segments.len(),
        }
    }
}

/// Structured decomposition of a request path.
///
/// Absent optional parts are `None`. Empty segments and a concept id of `0`
/// are normalized to `None` so they are stored as NULL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct ParsedRoute {
    pub api_version: String,
    pub api: String,
    pub api_id: String,
    pub concept: Option<String>,
    pub concept_id: Option<i64>,
    pub action: Option<String>,
}

impl ParsedRoute {
    pub(crate) fn new(api_version: &str) -> Self {
        Self {
            api_version: api_version.to_string(),
            ..Self::default()
        }
    }

    pub fn dialect(&self) -> Dialect {
        Dialect::for_version(&self.api_version)
    }

    pub(crate) fn set_resource(&mut self, api: &str, api_id: Option<&str>) {
        self.api = api.to_string();
        if let Some(id) = api_id {
            self.api_id = id.to_string();
        }
    }

    pub(crate) fn set_concept(&mut self, concept: &str) {
        self.concept = non_empty(concept);
    }

    pub(crate) fn set_concept_id(&mut self, id: i64) {
        self.concept_id = (id != 0).then_some(id);
    }

    pub(crate) fn set_action(&mut self, action: &str) {
        self.action = non_empty(action);
    }

    /// Numeric segment ⇒ concept id, otherwise ⇒ action.
    pub(crate) fn set_id_or_action(&mut self, segment: &str) {
        match parse_id(segment) {
            Some(id) => self.set_concept_id(id),
            None => self.set_action(segment),
        }
    }

    /// Numeric segment ⇒ concept id, otherwise ignored.
    pub(crate) fn set_id_if_numeric(&mut self, segment: &str) {
        if let Some(id) = parse_id(segment) {
            self.set_concept_id(id);
        }
    }
}

/// Base-10 integer coercion used for every id segment.
pub fn parse_id(segment: &str) -> Option<i64> {
    segment.parse::<i64>().ok()
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}
