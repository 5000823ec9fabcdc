//! Ignore rules applied to asset paths.
//!
//! A rule is either a literal substring or a regular expression. Both are
//! matched against the full filesystem path, so a literal such as `.git`
//! excludes everything below a `.git` directory.

use std::fmt;
use std::path::Path;

use regex::Regex;
use serde::Deserialize;

use crate::error::StaticError;

/// A single exclusion rule.
#[derive(Clone, Deserialize)]
#[serde(try_from = "RawIgnoreRule")]
pub enum IgnoreRule {
    /// Excludes any path containing this substring
    Literal(String),
    /// Excludes any path matched by this regular expression
    Pattern(Regex),
}

/// Serialized form: a bare string is a literal, `{ pattern = "..." }` is a regex.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawIgnoreRule {
    Literal(String),
    Pattern { pattern: String },
}

impl TryFrom<RawIgnoreRule> for IgnoreRule {
    type Error = StaticError;

    fn try_from(raw: RawIgnoreRule) -> Result<Self, Self::Error> {
        match raw {
            RawIgnoreRule::Literal(s) => Ok(IgnoreRule::literal(s)),
            RawIgnoreRule::Pattern { pattern } => IgnoreRule::pattern(&pattern),
        }
    }
}

impl IgnoreRule {
    /// Literal substring rule.
    pub fn literal(s: impl Into<String>) -> Self {
        IgnoreRule::Literal(s.into())
    }

    /// Regular expression rule.
    ///
    /// # Errors
    ///
    /// Returns [`StaticError::InvalidPattern`] if `pattern` does not compile.
    pub fn pattern(pattern: &str) -> Result<Self, StaticError> {
        Regex::new(pattern)
            .map(IgnoreRule::Pattern)
            .map_err(|e| StaticError::InvalidPattern {
                pattern: pattern.to_string(),
                message: e.to_string(),
            })
    }

    /// Whether this rule matches `path`.
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        match self {
            IgnoreRule::Literal(s) => path.contains(s.as_str()),
            IgnoreRule::Pattern(re) => re.is_match(path),
        }
    }
}

impl fmt::Debug for IgnoreRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IgnoreRule::Literal(s) => f.debug_tuple("Literal").field(s).finish(),
            IgnoreRule::Pattern(re) => f.debug_tuple("Pattern").field(&re.as_str()).finish(),
        }
    }
}

/// Default exclusions: editor/VCS noise and environment files.
#[must_use]
pub fn default_rules() -> Vec<IgnoreRule> {
    vec![
        IgnoreRule::literal(".DS_Store"),
        IgnoreRule::literal(".git"),
        IgnoreRule::literal(".env"),
    ]
}

/// True if any rule matches the path.
#[must_use]
pub fn is_ignored(rules: &[IgnoreRule], path: &Path) -> bool {
    if rules.is_empty() {
        return false;
    }
    let path = path.to_string_lossy();
    rules.iter().any(|rule| rule.matches(&path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_matches_substring() {
        let rule = IgnoreRule::literal(".git");
        assert!(rule.matches("/srv/public/.git/HEAD"));
        assert!(rule.matches("/srv/public/.gitignore"));
        assert!(!rule.matches("/srv/public/app.js"));
    }

    #[test]
    fn test_pattern_matches_regex() {
        let rule = IgnoreRule::pattern(r"\.map$").unwrap();
        assert!(rule.matches("/srv/public/app.js.map"));
        assert!(!rule.matches("/srv/public/app.js"));
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let err = IgnoreRule::pattern("(unclosed").unwrap_err();
        assert!(matches!(err, StaticError::InvalidPattern { .. }));
    }

    #[test]
    fn test_any_rule_excludes() {
        let rules = vec![
            IgnoreRule::literal("secret"),
            IgnoreRule::pattern(r"\.bak$").unwrap(),
        ];
        assert!(is_ignored(&rules, Path::new("/a/secret/key.pem")));
        assert!(is_ignored(&rules, Path::new("/a/old.bak")));
        assert!(!is_ignored(&rules, Path::new("/a/index.html")));
        assert!(!is_ignored(&[], Path::new("/a/secret")));
    }

    #[test]
    fn test_deserialize_mixed_rules() {
        let rules: Vec<IgnoreRule> =
            serde_yaml::from_str("- node_modules\n- pattern: '\\.map$'\n").unwrap();
        assert!(matches!(rules[0], IgnoreRule::Literal(ref s) if s == "node_modules"));
        assert!(rules[1].matches("bundle.js.map"));
    }
}
