use crate::route::traits::{Dialect, ParsedRoute, RouteDialect, RouteParseError};

/// Parser for `v2/...` paths.
///
/// Example: `v2/panels/568969/zone_informations`
pub struct V2Dialect;

impl RouteDialect for V2Dialect {
    fn parse(&self, path: &str, segments: &[&str]) -> Result<ParsedRoute, RouteParseError> {
        let count = segments.len();
        if count > 6 {
            return Err(RouteParseError::unsupported(Dialect::V2, path, segments));
        }

        let mut route = ParsedRoute::new(segments[0]);
        route.set_resource(segments[1], segments.get(2).copied());
        if let Some(concept) = segments.get(3) {
            route.set_concept(concept);
        }

        match count {
            5 => route.set_id_or_action(segments[4]),
            6 => {
                route.set_id_if_numeric(segments[4]);
                route.set_action(segments[5]);
            }
            _ => {}
        }

        Ok(route)
    }

    fn dialect(&self) -> Dialect {
        Dialect::V2
    }
}
