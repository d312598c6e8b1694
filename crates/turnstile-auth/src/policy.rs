//! Path authorization policy
//!
//! Decides whether a request path needs authentication, given the configured
//! list of excluded paths. Patterns are either exact paths or prefixes marked
//! by a single trailing `*`. Trailing slashes never matter.

/// A compiled excluded-path pattern
#[derive(Debug, Clone, PartialEq, Eq)]
enum ExcludedPath {
    /// Path must equal this text after normalization
    Exact(String),
    /// Normalized path must start with this text
    Prefix(String),
}

impl ExcludedPath {
    fn compile(pattern: &str) -> Self {
        match pattern.strip_suffix('*') {
            Some(prefix) => ExcludedPath::Prefix(prefix.to_string()),
            None => ExcludedPath::Exact(normalize(pattern).to_string()),
        }
    }

    fn matches(&self, normalized_path: &str) -> bool {
        match self {
            ExcludedPath::Exact(exact) => normalized_path == exact,
            ExcludedPath::Prefix(prefix) => normalized_path.starts_with(prefix.as_str()),
        }
    }
}

/// Strip trailing slashes so `/x` and `/x/` compare equal
fn normalize(path: &str) -> &str {
    path.trim_end_matches('/')
}

/// Excluded-path policy, compiled once from configuration
#[derive(Debug, Clone, Default)]
pub struct PathPolicy {
    patterns: Vec<ExcludedPath>,
}

impl PathPolicy {
    /// Compile a policy from excluded-path patterns
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            patterns: patterns
                .into_iter()
                .map(|p| ExcludedPath::compile(p.as_ref()))
                .collect(),
        }
    }

    /// Check whether `path` requires authentication
    ///
    /// Fails closed: a missing or empty path, or an empty policy, always
    /// requires authentication.
    pub fn requires_auth(&self, path: Option<&str>) -> bool {
        let Some(path) = path.filter(|p| !p.is_empty()) else {
            return true;
        };
        if self.patterns.is_empty() {
            return true;
        }

        let path = normalize(path);
        !self.patterns.iter().any(|p| p.matches(path))
    }
}

/// One-shot form of [`PathPolicy::requires_auth`]
pub fn requires_auth<S: AsRef<str>>(path: Option<&str>, excluded_paths: &[S]) -> bool {
    PathPolicy::new(excluded_paths).requires_auth(path)
}
