pub mod dialects;
pub mod model;
pub mod traits;

pub use model::{Dialect, ParsedRoute, RouteParseError};
pub use traits::RouteDialect;

use dialects::{GenericDialect, V1Dialect, V2Dialect};

static V2: V2Dialect = V2Dialect;
static V1: V1Dialect = V1Dialect;
static GENERIC: GenericDialect = GenericDialect;

/// Select the parser for a leading path segment.
pub fn dialect_for(version: &str) -> &'static dyn RouteDialect {
    match Dialect::for_version(version) {
        Dialect::V2 => &V2,
        Dialect::V1 => &V1,
        Dialect::Generic => &GENERIC,
    }
}

/// Decompose a trimmed request path (no leading or trailing `/`).
pub fn parse_route(path: &str) -> Result<ParsedRoute, RouteParseError> {
    let segments: Vec<&str> = path.split('/').collect();
    if segments.len() < 2 {
        return Err(RouteParseError::TooShort {
            path: path.to_string(),
        });
    }

    dialect_for(segments[0]).parse(path, &segments)
}
