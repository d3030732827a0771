use grep_matcher::{Captures, Matcher};
use grep_regex::{RegexMatcher, RegexMatcherBuilder};
use thiserror::Error;

/// `auth_token=` followed by exactly 20 characters up to the next `&`.
pub const AUTH_TOKEN_PATTERN: &str = r"auth_token=([^&]{20})";

#[derive(Error, Debug)]
pub enum FilterError {
    #[error("Invalid regex pattern: {0}")]
    InvalidRegex(String),
}

/// Pulls the auth token out of a raw query string.
pub struct TokenExtractor {
    matcher: RegexMatcher,
}

impl TokenExtractor {
    pub fn new() -> Result<Self, FilterError> {
        Self::with_pattern(AUTH_TOKEN_PATTERN)
    }

    /// The pattern's first capture group is the token.
    pub fn with_pattern(pattern: &str) -> Result<Self, FilterError> {
        let matcher = RegexMatcherBuilder::new()
            .multi_line(false)
            .build(pattern)
            .map_err(|e| FilterError::InvalidRegex(e.to_string()))?;

        if matcher.capture_count() < 2 {
            return Err(FilterError::InvalidRegex(format!(
                "pattern {pattern:?} has no capture group"
            )));
        }

        Ok(Self { matcher })
    }

    /// Every match is visited; the last one wins. Empty when none match.
    pub fn extract(&self, query: &str) -> String {
        let haystack = query.as_bytes();
        let mut caps = match self.matcher.new_captures() {
            Ok(caps) => caps,
            Err(_) => return String::new(),
        };

        let mut token = String::new();
        let result = self.matcher.captures_iter(haystack, &mut caps, |caps| {
            if let Some(m) = caps.get(1) {
                token = String::from_utf8_lossy(&haystack[m]).into_owned();
            }
            true
        });

        if result.is_err() {
            return String::new();
        }
        token
    }
}
