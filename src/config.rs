//! # Configuration Module
//!
//! [`StaticConfig`] carries every option recognized by the route builder.
//! It can be assembled in code with builder methods or loaded from a YAML,
//! TOML or JSON file with [`StaticConfig::from_file`].
//!
//! ## Example (YAML)
//!
//! ```yaml
//! assets: ./public
//! prefix: /static
//! static_limit: 512
//! always_static: true
//! ignore_patterns:
//!   - .DS_Store
//!   - pattern: '\.map$'
//! headers:
//!   x-frame-options: DENY
//! max_age: null          # send `Cache-Control: public` without max-age
//! directive: public
//! cache:
//!   ttl_secs: 600
//!   max_keys: 1000
//! ```
//!
//! TOML has no null, so `max_age = false` there means the same as
//! `max_age: null`.
//!
//! The core never reads process environment. Callers that want
//! "static in production" semantics set `always_static` themselves.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use http::{HeaderMap, HeaderName, HeaderValue};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};

use crate::cache::FreshnessConfig;
use crate::error::StaticError;
use crate::ignore::{self, IgnoreRule};

/// Maps an assets root and a URL sub-path to a candidate filesystem path.
///
/// Returning `None` makes the request a NotFound.
pub type PathResolver = Arc<dyn Fn(&Path, &str) -> Option<PathBuf> + Send + Sync>;

/// Join `sub` onto `root`, refusing anything that could escape the root.
///
/// `..`, absolute and prefix components yield `None`; `.` is skipped.
#[must_use]
pub fn default_resolver(root: &Path, sub: &str) -> Option<PathBuf> {
    let mut pb = root.to_path_buf();
    for comp in Path::new(sub.trim_start_matches('/')).components() {
        match comp {
            Component::Normal(s) => pb.push(s),
            Component::CurDir => {}
            _ => return None,
        }
    }
    Some(pb)
}

fn default_path_resolver() -> PathResolver {
    Arc::new(default_resolver)
}

/// Seconds, or `null`/`false` for no `max-age`.
fn deserialize_max_age<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum MaxAge {
        Secs(u64),
        Flag(bool),
    }

    match Option::<MaxAge>::deserialize(deserializer)? {
        Some(MaxAge::Secs(secs)) => Ok(Some(secs)),
        Some(MaxAge::Flag(false)) | None => Ok(None),
        Some(MaxAge::Flag(true)) => Err(D::Error::custom(
            "max_age must be a number of seconds, null or false",
        )),
    }
}

/// `Cache-Control` directive sent alongside `max-age`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CacheDirective {
    /// `public`
    #[default]
    Public,
    /// `private`
    Private,
    /// `no-cache`
    NoCache,
    /// `no-store`
    NoStore,
    /// `must-revalidate`
    MustRevalidate,
    /// `proxy-revalidate`
    ProxyRevalidate,
    /// `no-transform`
    NoTransform,
    /// `immutable`
    Immutable,
}

impl CacheDirective {
    /// Header token.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheDirective::Public => "public",
            CacheDirective::Private => "private",
            CacheDirective::NoCache => "no-cache",
            CacheDirective::NoStore => "no-store",
            CacheDirective::MustRevalidate => "must-revalidate",
            CacheDirective::ProxyRevalidate => "proxy-revalidate",
            CacheDirective::NoTransform => "no-transform",
            CacheDirective::Immutable => "immutable",
        }
    }
}

impl fmt::Display for CacheDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options for one static asset mount.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct StaticConfig {
    /// Root directory to expose (default: `public`)
    pub assets: PathBuf,
    /// URL mount point prepended to every served path (default: `/public`)
    pub prefix: String,
    /// Maximum file count for static mode under `always_static` (default: 1024)
    pub static_limit: usize,
    /// Serve statically whenever the file count allows it
    pub always_static: bool,
    /// Serve statically regardless of file count
    pub force_static: bool,
    /// Exclusion rules (default: `.DS_Store`, `.git`, `.env`)
    pub ignore_patterns: Vec<IgnoreRule>,
    /// Strip the final extension from generated static URLs
    pub no_extension: bool,
    /// Percent-decode the wildcard sub-path before resolving it
    pub decode_uri: bool,
    /// Path join used by the wildcard handler
    #[serde(skip, default = "default_path_resolver")]
    pub path_resolver: PathResolver,
    /// Extra headers merged into every served response
    pub headers: BTreeMap<String, String>,
    /// Skip ETag and conditional handling entirely
    pub no_cache: bool,
    /// `max-age` in seconds; `None` sends the directive alone (default: 86400)
    #[serde(deserialize_with = "deserialize_max_age")]
    pub max_age: Option<u64>,
    /// `Cache-Control` directive (default: `public`)
    pub directive: CacheDirective,
    /// Serve `index.html` for directory paths (default: true)
    pub index_html: bool,
    /// Freshness cache tuning for the wildcard handler
    pub cache: FreshnessConfig,
}

impl Default for StaticConfig {
    fn default() -> Self {
        Self {
            assets: PathBuf::from("public"),
            prefix: "/public".to_string(),
            static_limit: 1024,
            always_static: false,
            force_static: false,
            ignore_patterns: ignore::default_rules(),
            no_extension: false,
            decode_uri: false,
            path_resolver: default_path_resolver(),
            headers: BTreeMap::new(),
            no_cache: false,
            max_age: Some(86_400),
            directive: CacheDirective::Public,
            index_html: true,
            cache: FreshnessConfig::default(),
        }
    }
}

impl fmt::Debug for StaticConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticConfig")
            .field("assets", &self.assets)
            .field("prefix", &self.prefix)
            .field("static_limit", &self.static_limit)
            .field("always_static", &self.always_static)
            .field("force_static", &self.force_static)
            .field("ignore_patterns", &self.ignore_patterns)
            .field("no_extension", &self.no_extension)
            .field("decode_uri", &self.decode_uri)
            .field("headers", &self.headers)
            .field("no_cache", &self.no_cache)
            .field("max_age", &self.max_age)
            .field("directive", &self.directive)
            .field("index_html", &self.index_html)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl StaticConfig {
    /// Defaults with the given assets root.
    pub fn new(assets: impl Into<PathBuf>) -> Self {
        Self {
            assets: assets.into(),
            ..Self::default()
        }
    }

    /// Load a config file; the format follows the extension (`yaml`/`yml`, `toml`, `json`).
    ///
    /// # Errors
    ///
    /// Returns [`StaticError::Config`] if the file cannot be read, has an
    /// unknown extension or does not parse.
    pub fn from_file(path: &Path) -> Result<Self, StaticError> {
        let config_err = |message: String| StaticError::Config {
            path: path.to_path_buf(),
            message,
        };
        let content = std::fs::read_to_string(path).map_err(|e| config_err(e.to_string()))?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        match ext.as_str() {
            "yaml" | "yml" => serde_yaml::from_str(&content).map_err(|e| config_err(e.to_string())),
            "toml" => toml::from_str(&content).map_err(|e| config_err(e.to_string())),
            "json" => serde_json::from_str(&content).map_err(|e| config_err(e.to_string())),
            other => Err(config_err(format!("unsupported config format '{other}'"))),
        }
    }

    /// Set the URL mount point.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Set the static-mode file ceiling.
    pub fn static_limit(mut self, limit: usize) -> Self {
        self.static_limit = limit;
        self
    }

    /// Mark the environment as "always serve statically".
    pub fn always_static(mut self, enabled: bool) -> Self {
        self.always_static = enabled;
        self
    }

    /// Force static mode.
    pub fn force_static(mut self, enabled: bool) -> Self {
        self.force_static = enabled;
        self
    }

    /// Append an ignore rule.
    pub fn ignore(mut self, rule: IgnoreRule) -> Self {
        self.ignore_patterns.push(rule);
        self
    }

    /// Replace all ignore rules.
    pub fn ignore_patterns(mut self, rules: Vec<IgnoreRule>) -> Self {
        self.ignore_patterns = rules;
        self
    }

    /// Strip extensions from static URLs.
    pub fn no_extension(mut self, enabled: bool) -> Self {
        self.no_extension = enabled;
        self
    }

    /// Percent-decode wildcard sub-paths.
    pub fn decode_uri(mut self, enabled: bool) -> Self {
        self.decode_uri = enabled;
        self
    }

    /// Override the path join used by the wildcard handler.
    pub fn path_resolver<F>(mut self, resolver: F) -> Self
    where
        F: Fn(&Path, &str) -> Option<PathBuf> + Send + Sync + 'static,
    {
        self.path_resolver = Arc::new(resolver);
        self
    }

    /// Add a header to every response.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Disable ETag and conditional handling.
    pub fn no_cache(mut self, enabled: bool) -> Self {
        self.no_cache = enabled;
        self
    }

    /// Set `max-age`; `None` drops the clause.
    pub fn max_age(mut self, max_age: Option<u64>) -> Self {
        self.max_age = max_age;
        self
    }

    /// Set the `Cache-Control` directive.
    pub fn directive(mut self, directive: CacheDirective) -> Self {
        self.directive = directive;
        self
    }

    /// Toggle `index.html` directory defaults.
    pub fn index_html(mut self, enabled: bool) -> Self {
        self.index_html = enabled;
        self
    }

    /// Tune the wildcard handler's caches.
    pub fn freshness(mut self, cache: FreshnessConfig) -> Self {
        self.cache = cache;
        self
    }

    /// Prefix with a leading `/` and no trailing `/`; empty for the root mount.
    #[must_use]
    pub fn normalized_prefix(&self) -> String {
        let trimmed = self.prefix.trim_matches('/');
        if trimmed.is_empty() {
            String::new()
        } else {
            format!("/{trimmed}")
        }
    }

    /// `Cache-Control` value: `<directive>` or `<directive>, max-age=<n>`.
    #[must_use]
    pub fn cache_control_value(&self) -> String {
        match self.max_age {
            Some(age) => format!("{}, max-age={}", self.directive, age),
            None => self.directive.to_string(),
        }
    }

    /// Parse configured extra headers.
    ///
    /// # Errors
    ///
    /// Returns [`StaticError::InvalidHeader`] for an invalid name or value.
    pub fn header_map(&self) -> Result<HeaderMap, StaticError> {
        let mut map = HeaderMap::with_capacity(self.headers.len());
        for (name, value) in &self.headers {
            let invalid = || StaticError::InvalidHeader { name: name.clone() };
            let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid())?;
            let header_value = HeaderValue::from_str(value).map_err(|_| invalid())?;
            map.insert(header_name, header_value);
        }
        Ok(map)
    }
}
