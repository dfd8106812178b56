//! Fatal replication error detection.

use regex::Regex;

/// Pattern seeded into the default configuration: the multi-threaded applier
/// coordinator has stopped on a worker error.
pub const DEFAULT_ERROR_PATTERNS: &[&str] = &["Coordinator stopped"];

/// Tests `Last_SQL_Error` against an ordered list of regular expressions.
///
/// Patterns are unanchored, so a plain phrase matches anywhere in the message.
/// Compilation happens up front: a malformed pattern is a configuration error.
#[derive(Debug, Clone)]
pub struct ErrorMatcher {
    patterns: Vec<Regex>,
}

impl ErrorMatcher {
    /// Compile the given patterns, in evaluation order.
    pub fn new<I, S>(patterns: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| Regex::new(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    /// The first pattern (as written) that matches `last_sql_error`.
    ///
    /// An absent or empty error never matches.
    pub fn first_match(&self, last_sql_error: Option<&str>) -> Option<&str> {
        let error = last_sql_error.filter(|e| !e.is_empty())?;
        self.patterns.iter().find(|re| re.is_match(error)).map(Regex::as_str)
    }

    /// Whether any pattern matches `last_sql_error`.
    pub fn matches(&self, last_sql_error: Option<&str>) -> bool {
        self.first_match(last_sql_error).is_some()
    }

    /// The configured patterns, in evaluation order.
    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(Regex::as_str)
    }
}

impl Default for ErrorMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_ERROR_PATTERNS).unwrap_or_else(|_| Self {
            patterns: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_error_never_matches() {
        let matcher = ErrorMatcher::new([".*", "Coordinator stopped"]).unwrap();
        assert!(!matcher.matches(Some("")));
        assert!(!matcher.matches(None));
    }

    #[test]
    fn test_default_pattern_matches_substring() {
        let matcher = ErrorMatcher::default();
        assert!(matcher.matches(Some("Coordinator stopped unexpectedly")));
        assert_eq!(
            matcher.first_match(Some(
                "Coordinator stopped because there were error(s) in the worker(s)."
            )),
            Some("Coordinator stopped")
        );
        assert!(!matcher.matches(Some("Error 'Duplicate entry' on query")));
    }

    #[test]
    fn test_first_match_follows_order() {
        let matcher = ErrorMatcher::new(["Duplicate entry", r"Error_code: \d+", "Coordinator"]).unwrap();
        let error = "Coordinator stopped; Error_code: 1062; Duplicate entry '7' for key 'PRIMARY'";
        assert_eq!(matcher.first_match(Some(error)), Some("Duplicate entry"));
        assert_eq!(matcher.first_match(Some("Worker 1 failed Error_code: 1032")), Some(r"Error_code: \d+"));
    }

    #[test]
    fn test_malformed_pattern_is_rejected() {
        assert!(ErrorMatcher::new(["Coordinator (stopped"]).is_err());
    }

    #[test]
    fn test_patterns_listed_in_order() {
        let matcher = ErrorMatcher::new(["b", "a"]).unwrap();
        assert_eq!(matcher.patterns().collect::<Vec<_>>(), vec!["b", "a"]);
    }
}
