//! # Routes Module
//!
//! Turns an assets directory into route descriptors for an external
//! dispatcher.
//!
//! ## Modes
//!
//! The builder picks one strategy per call to [`build_routes`]:
//!
//! - **Static**: one `GET` route per file, each bound to a
//!   [`StaticFileHandler`] holding a precomputed ETag. No filesystem lookups
//!   happen at request time beyond reading the body.
//! - **Dynamic**: a single `GET <prefix>/*` route bound to a
//!   [`WildcardHandler`] that resolves files lazily through the freshness
//!   caches. The route table stays constant-size however large the tree is.
//!
//! Static mode is chosen when `force_static` is set, or when `always_static`
//! is set and the file count is at or below `static_limit`.
//!
//! ## Example
//!
//! ```rust,no_run
//! use static_routes::{build_routes, RouteTable, StaticConfig};
//!
//! # async fn run() -> Result<(), static_routes::StaticError> {
//! let config = StaticConfig::new("./public").prefix("/static");
//! let mut table = RouteTable::new();
//! table.extend(build_routes(&config).await?)?;
//!
//! let req = http::Request::get("/static/app.css").body(()).unwrap();
//! let response = table.dispatch(&req).await.into_response();
//! # Ok(())
//! # }
//! ```

mod table;

use std::collections::HashSet;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::stream::{self, StreamExt, TryStreamExt};
use http::Method;
use tracing::{info, warn};

use crate::config::StaticConfig;
use crate::enumerate::{canonical_root, enumerate_assets, AssetTree};
use crate::error::{Result, StaticError};
use crate::handler::{
    AssetHandler, AssetRequest, Outcome, ResponsePolicy, StaticAsset, StaticFileHandler,
    WildcardHandler,
};

pub use table::RouteTable;

/// Files prepared concurrently while building static routes.
const PREPARE_CONCURRENCY: usize = 32;

const INDEX_SUFFIX: &str = "/index.html";

/// Route generation strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteMode {
    /// One route per file
    Static,
    /// One wildcard route
    Dynamic,
}

impl fmt::Display for RouteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteMode::Static => f.write_str("static"),
            RouteMode::Dynamic => f.write_str("dynamic"),
        }
    }
}

/// Decide the route mode for a tree of `file_count` servable files.
#[must_use]
pub fn plan_mode(config: &StaticConfig, file_count: usize) -> RouteMode {
    if config.force_static || (config.always_static && file_count <= config.static_limit) {
        RouteMode::Static
    } else {
        RouteMode::Dynamic
    }
}

/// A route handed to the dispatcher.
#[derive(Clone)]
pub struct RouteDescriptor {
    /// Always `GET`
    pub method: Method,
    /// Concrete URL path, or `<prefix>/*`
    pub path: String,
    /// Handler serving this route
    pub handler: Arc<dyn AssetHandler>,
}

impl RouteDescriptor {
    /// A `GET` route.
    pub fn get(path: impl Into<String>, handler: Arc<dyn AssetHandler>) -> Self {
        Self {
            method: Method::GET,
            path: path.into(),
            handler,
        }
    }

    /// Prefix covered by a wildcard route, `None` for concrete routes.
    #[must_use]
    pub fn wildcard_prefix(&self) -> Option<&str> {
        if self.path == "*" {
            return Some("");
        }
        self.path.strip_suffix("/*")
    }

    /// Whether this is a `<prefix>/*` route.
    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        self.wildcard_prefix().is_some()
    }

    /// Invoke the handler.
    #[must_use]
    pub fn call(&self, request: AssetRequest<'_>) -> BoxFuture<'static, Outcome> {
        self.handler.handle(request)
    }
}

impl fmt::Debug for RouteDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteDescriptor")
            .field("method", &self.method)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// URL path for `file` under `root`: `prefix + "/" + relative path`, `/`
/// separated, each segment percent-encoded. With `no_extension`, the final
/// `.ext` is dropped from the URL.
///
/// Returns `None` if `file` is not below `root`.
#[must_use]
pub fn url_path_for(root: &Path, file: &Path, prefix: &str, no_extension: bool) -> Option<String> {
    let rel = file.strip_prefix(root).ok()?;
    let mut segments: Vec<String> = rel
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    let last = segments.last_mut()?;
    if no_extension {
        // dotfiles such as `.htaccess` have no extension
        if let Some(dot) = last.rfind('.').filter(|&dot| dot > 0) {
            last.truncate(dot);
        }
    }
    let encoded: Vec<_> = segments.iter().map(|s| urlencoding::encode(s)).collect();
    Some(format!("{}/{}", prefix, encoded.join("/")))
}

/// Build the routes for one assets mount.
///
/// # Errors
///
/// Initialization errors for a missing or non-directory assets root, a file
/// that cannot be prepared in static mode, or invalid configured headers.
/// Nothing is returned on failure; there are no partial route sets.
pub async fn build_routes(config: &StaticConfig) -> Result<Vec<RouteDescriptor>> {
    let policy = Arc::new(ResponsePolicy::from_config(config)?);
    let prefix = config.normalized_prefix();

    // Only static candidates need the file count.
    if !config.force_static && !config.always_static {
        let root = canonical_root(&config.assets).await?;
        info!(
            assets = %root.display(),
            prefix = %prefix,
            mode = %RouteMode::Dynamic,
            "Static asset routes built"
        );
        return Ok(vec![wildcard_route(root, config, &prefix, policy)]);
    }

    let tree = enumerate_assets(&config.assets, &config.ignore_patterns).await?;
    let mode = plan_mode(config, tree.len());
    let routes = match mode {
        RouteMode::Static => static_routes(config, &tree, &prefix, policy).await?,
        RouteMode::Dynamic => vec![wildcard_route(tree.root.clone(), config, &prefix, policy)],
    };
    info!(
        assets = %tree.root.display(),
        prefix = %prefix,
        mode = %mode,
        files = tree.len(),
        routes = routes.len(),
        static_limit = config.static_limit,
        "Static asset routes built"
    );
    Ok(routes)
}

fn wildcard_route(
    root: PathBuf,
    config: &StaticConfig,
    prefix: &str,
    policy: Arc<ResponsePolicy>,
) -> RouteDescriptor {
    let handler = WildcardHandler::new(root, config, policy);
    RouteDescriptor::get(format!("{prefix}/*"), Arc::new(handler))
}

async fn static_routes(
    config: &StaticConfig,
    tree: &AssetTree,
    prefix: &str,
    policy: Arc<ResponsePolicy>,
) -> Result<Vec<RouteDescriptor>> {
    let with_etag = !config.no_cache;
    let assets: Vec<StaticAsset> = stream::iter(tree.files.iter().cloned())
        .map(|file| async move {
            StaticAsset::prepare(file.clone(), with_etag)
                .await
                .map_err(|source| StaticError::Prepare { path: file, source })
        })
        .buffered(PREPARE_CONCURRENCY)
        .try_collect()
        .await?;

    let mut routes = Vec::with_capacity(assets.len());
    let mut seen = HashSet::with_capacity(assets.len());
    for asset in assets {
        let Some(url) = url_path_for(&tree.root, &asset.file, prefix, config.no_extension) else {
            warn!(file = %asset.file.display(), "Asset outside assets root, skipped");
            continue;
        };
        let handler: Arc<dyn AssetHandler> =
            Arc::new(StaticFileHandler::new(Arc::new(asset), Arc::clone(&policy)));

        if config.index_html {
            if let Some(dir) = url.strip_suffix(INDEX_SUFFIX) {
                let alias = if dir.is_empty() { "/" } else { dir };
                push_unique(&mut routes, &mut seen, alias.to_string(), Arc::clone(&handler));
            }
        }
        push_unique(&mut routes, &mut seen, url, handler);
    }
    Ok(routes)
}

fn push_unique(
    routes: &mut Vec<RouteDescriptor>,
    seen: &mut HashSet<String>,
    path: String,
    handler: Arc<dyn AssetHandler>,
) {
    if seen.insert(path.clone()) {
        routes.push(RouteDescriptor::get(path, handler));
    } else {
        warn!(path = %path, "Duplicate static asset URL, keeping the first route");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_mode() {
        let config = StaticConfig::default();
        assert_eq!(plan_mode(&config, 1), RouteMode::Dynamic);

        let config = StaticConfig::default().always_static(true).static_limit(2);
        assert_eq!(plan_mode(&config, 2), RouteMode::Static);
        assert_eq!(plan_mode(&config, 3), RouteMode::Dynamic);

        let config = StaticConfig::default().force_static(true).static_limit(2);
        assert_eq!(plan_mode(&config, 10_000), RouteMode::Static);
    }

    #[test]
    fn test_url_path_for() {
        let root = Path::new("/srv/public");
        assert_eq!(
            url_path_for(root, Path::new("/srv/public/css/app.css"), "/static", false).as_deref(),
            Some("/static/css/app.css")
        );
        assert_eq!(
            url_path_for(root, Path::new("/srv/public/img/foo.png"), "", true).as_deref(),
            Some("/img/foo")
        );
        assert_eq!(
            url_path_for(root, Path::new("/srv/public/.htaccess"), "/p", true).as_deref(),
            Some("/p/.htaccess")
        );
        assert_eq!(
            url_path_for(root, Path::new("/srv/public/v1.2/readme"), "/p", true).as_deref(),
            Some("/p/v1.2/readme")
        );
        assert_eq!(url_path_for(root, Path::new("/etc/passwd"), "/p", false), None);
        assert_eq!(
            url_path_for(root, Path::new("/srv/public/my docs/café.txt"), "/p", true).as_deref(),
            Some("/p/my%20docs/caf%C3%A9")
        );
    }

    #[test]
    fn test_wildcard_prefix() {
        struct Nothing;
        impl AssetHandler for Nothing {
            fn handle(&self, _: AssetRequest<'_>) -> BoxFuture<'static, Outcome> {
                Box::pin(async { Outcome::NotFound })
            }
        }
        let h: Arc<dyn AssetHandler> = Arc::new(Nothing);
        assert_eq!(RouteDescriptor::get("/public/*", Arc::clone(&h)).wildcard_prefix(), Some("/public"));
        assert_eq!(RouteDescriptor::get("/*", Arc::clone(&h)).wildcard_prefix(), Some(""));
        assert!(!RouteDescriptor::get("/public/a.txt", h).is_wildcard());
    }
}
