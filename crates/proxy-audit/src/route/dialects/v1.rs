use crate::route::traits::{Dialect, ParsedRoute, RouteDialect, RouteParseError};

/// Parser for `1/...` paths.
///
/// Example: `1/panels/4-8489/favorites/44974/actions/195666`
pub struct V1Dialect;

// Known seven-segment shapes: (segment[3], segment[5]) => concept name.
// These are compatibility special cases, not a grammar; do not add more.
const COMPOUND_CONCEPTS: &[(&str, &str, &str)] = &[
    ("favorites", "actions", "favorite_actions"),
    ("rooms", "hotspots", "room_hotspots"),
];

impl RouteDialect for V1Dialect {
    fn parse(&self, path: &str, segments: &[&str]) -> Result<ParsedRoute, RouteParseError> {
        let count = segments.len();
        if !(3..=7).contains(&count) {
            return Err(RouteParseError::unsupported(Dialect::V1, path, segments));
        }

        let mut route = ParsedRoute::new(segments[0]);
        route.set_resource(segments[1], Some(segments[2]));

        match count {
            4 => route.set_concept(segments[3]),
            5 => {
                route.set_concept(segments[3]);
                route.set_id_or_action(segments[4]);
            }
            6 => {
                route.set_concept(segments[3]);
                route.set_id_if_numeric(segments[4]);
                route.set_action(segments[5]);
            }
            7 => {
                let concept = COMPOUND_CONCEPTS
                    .iter()
                    .find(|(outer, inner, _)| segments[3] == *outer && segments[5] == *inner)
                    .map(|(_, _, concept)| *concept)
                    .ok_or_else(|| RouteParseError::unsupported(Dialect::V1, path, segments))?;
                route.set_concept(concept);
                route.set_id_if_numeric(segments[6]);
            }
            _ => {}
        }

        Ok(route)
    }

    fn dialect(&self) -> Dialect {
        Dialect::V1
    }
}
