pub use super::model::{Dialect, ParsedRoute, RouteParseError};

pub trait RouteDialect: Send + Sync {
    /// Decompose an already split path. `segments` always has at least two
    /// entries and `segments[0]` selected this dialect.
    fn parse(&self, path: &str, segments: &[&str]) -> Result<ParsedRoute, RouteParseError>;
    fn dialect(&self) -> Dialect;
}
