use crate::route::traits::{Dialect, ParsedRoute, RouteDialect, RouteParseError};

/// Parser for unversioned paths. Only `users/<action>` is recognised.
pub struct GenericDialect;

impl RouteDialect for GenericDialect {
    fn parse(&self, path: &str, segments: &[&str]) -> Result<ParsedRoute, RouteParseError> {
        let api = segments[0];
        if api != "users" {
            return Err(RouteParseError::unsupported(Dialect::Generic, path, segments));
        }

        let mut route = ParsedRoute::new(api);
        route.set_resource(api, None);
        route.set_action(segments[1]);
        Ok(route)
    }

    fn dialect(&self) -> Dialect {
        Dialect::Generic
    }
}
