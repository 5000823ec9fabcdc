//! Wildcard handler: one route serving every file below a prefix.
//!
//! Each request runs a linear pipeline:
//!
//! ```text
//! sub-path → candidate path → ignore check → stat (cached)
//!          → directory / index.html resolution (cached) → read → 200 | 304
//! ```
//!
//! Any step can short-circuit with NotFound. Only the three freshness
//! caches outlive a request.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use futures::future::{BoxFuture, FutureExt};
use tokio::io::AsyncReadExt;
use tracing::{debug, warn};

use super::{content_type_for, AssetHandler, AssetRequest, Outcome, ResponsePolicy};
use crate::cache::{FileStat, FreshnessCaches};
use crate::conditional::{ConditionalContext, RequestValidators};
use crate::config::{PathResolver, StaticConfig};
use crate::etag::ETag;
use crate::ignore::{is_ignored, IgnoreRule};

const INDEX_FILE: &str = "index.html";

/// Why a request resolved to nothing. Only used for logging.
#[derive(Debug)]
enum Miss {
    OutsidePrefix,
    Undecodable,
    TrailingSlash,
    Rejected,
    Ignored,
    Missing(io::ErrorKind),
    Directory,
    NotRegular,
    NoIndex,
}

impl fmt::Display for Miss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Miss::OutsidePrefix => f.write_str("outside prefix"),
            Miss::Undecodable => f.write_str("undecodable path"),
            Miss::TrailingSlash => f.write_str("trailing slash"),
            Miss::Rejected => f.write_str("rejected by path resolver"),
            Miss::Ignored => f.write_str("ignored"),
            Miss::Missing(kind) => write!(f, "stat failed ({kind})"),
            Miss::Directory => f.write_str("directory"),
            Miss::NotRegular => f.write_str("not a regular file"),
            Miss::NoIndex => f.write_str("directory without index.html"),
        }
    }
}

/// Serves `<prefix>/*`, resolving files lazily.
#[derive(Clone)]
pub struct WildcardHandler {
    inner: Arc<WildcardState>,
}

struct WildcardState {
    root: PathBuf,
    prefix: String,
    decode_uri: bool,
    index_html: bool,
    rules: Vec<IgnoreRule>,
    resolver: PathResolver,
    caches: FreshnessCaches,
    policy: Arc<ResponsePolicy>,
}

impl fmt::Debug for WildcardHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WildcardHandler")
            .field("root", &self.inner.root)
            .field("prefix", &self.inner.prefix)
            .finish_non_exhaustive()
    }
}

impl WildcardHandler {
    /// Create a handler for an already canonicalized `root`.
    #[must_use]
    pub fn new(root: PathBuf, config: &StaticConfig, policy: Arc<ResponsePolicy>) -> Self {
        Self {
            inner: Arc::new(WildcardState {
                root,
                prefix: config.normalized_prefix(),
                decode_uri: config.decode_uri,
                index_html: config.index_html,
                rules: config.ignore_patterns.clone(),
                resolver: Arc::clone(&config.path_resolver),
                caches: FreshnessCaches::new(&config.cache),
                policy,
            }),
        }
    }

    /// The handler's freshness caches.
    #[must_use]
    pub fn caches(&self) -> &FreshnessCaches {
        &self.inner.caches
    }
}

impl AssetHandler for WildcardHandler {
    fn handle(&self, request: AssetRequest<'_>) -> BoxFuture<'static, Outcome> {
        let inner = Arc::clone(&self.inner);
        let path = request.path.to_string();
        let validators = inner
            .policy
            .caching_enabled()
            .then(|| RequestValidators::from_headers(request.headers));
        async move { inner.serve(&path, validators).await }.boxed()
    }
}

impl WildcardState {
    async fn serve(&self, url_path: &str, validators: Option<RequestValidators>) -> Outcome {
        let file = match self.resolve(url_path).await {
            Ok(file) => file,
            Err(miss) => {
                debug!(path = url_path, reason = %miss, "Asset not found");
                return Outcome::NotFound;
            }
        };
        match self.respond(&file, validators).await {
            Ok(outcome) => {
                debug!(path = url_path, file = %file.display(), status = outcome.status().as_u16(), "Asset served");
                outcome
            }
            Err(err) => {
                warn!(path = url_path, file = %file.display(), error = %err, "Asset read failed");
                Outcome::NotFound
            }
        }
    }

    /// Map the URL path to a candidate filesystem path.
    fn candidate(&self, url_path: &str) -> Result<PathBuf, Miss> {
        let rest = url_path
            .strip_prefix(self.prefix.as_str())
            .ok_or(Miss::OutsidePrefix)?;
        if !rest.is_empty() && !rest.starts_with('/') {
            return Err(Miss::OutsidePrefix);
        }
        let sub = rest.trim_start_matches('/');
        let sub = if self.decode_uri {
            urlencoding::decode(sub).map_err(|_| Miss::Undecodable)?
        } else {
            sub.into()
        };
        // after decoding, since `%2F` becomes a trailing slash
        if sub.ends_with('/') {
            return Err(Miss::TrailingSlash);
        }
        let candidate = (self.resolver)(&self.root, &*sub).ok_or(Miss::Rejected)?;
        if is_ignored(&self.rules, &candidate) {
            return Err(Miss::Ignored);
        }
        Ok(candidate)
    }

    async fn stat(&self, path: &Path) -> Result<FileStat, Miss> {
        if let Some(stat) = self.caches.stat.get(path) {
            return Ok(stat);
        }
        let meta = tokio::fs::metadata(path)
            .await
            .map_err(|e| Miss::Missing(e.kind()))?;
        let stat = FileStat::from(&meta);
        self.caches.stat.insert(path.to_path_buf(), stat);
        Ok(stat)
    }

    /// Only a present index is cached, so one created later is found on
    /// the next request.
    async fn index_exists(&self, index: &Path) -> bool {
        if self.caches.index.get(index) == Some(true) {
            return true;
        }
        let exists = tokio::fs::metadata(index)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false);
        if exists {
            self.caches.index.insert(index.to_path_buf(), true);
        }
        exists
    }

    /// Resolve the URL path to the file that should be served.
    async fn resolve(&self, url_path: &str) -> Result<PathBuf, Miss> {
        let candidate = self.candidate(url_path)?;
        let stat = self.stat(&candidate).await?;
        if stat.is_dir && !self.index_html {
            return Err(Miss::Directory);
        }
        if let Some(resolved) = self.caches.resolved.get(&candidate) {
            return Ok(resolved);
        }
        if !stat.is_dir && !stat.is_file {
            return Err(Miss::NotRegular);
        }
        let resolved = if stat.is_dir {
            let index = candidate.join(INDEX_FILE);
            if is_ignored(&self.rules, &index) {
                return Err(Miss::Ignored);
            }
            if !self.index_exists(&index).await {
                return Err(Miss::NoIndex);
            }
            index
        } else {
            candidate.clone()
        };
        self.caches.resolved.insert(candidate, resolved.clone());
        Ok(resolved)
    }

    async fn respond(
        &self,
        file: &Path,
        validators: Option<RequestValidators>,
    ) -> io::Result<Outcome> {
        let content_type = content_type_for(file);
        let Some(validators) = validators else {
            let body = tokio::fs::read(file).await?;
            return Ok(self.policy.ok(Bytes::from(body), None, content_type));
        };

        // Body and metadata come from the same handle, so the 304 decision
        // reflects the file as read, not a cached stat.
        let mut handle = tokio::fs::File::open(file).await?;
        let meta = handle.metadata().await?;
        if !meta.is_file() {
            return Err(io::Error::new(io::ErrorKind::NotFound, "not a regular file"));
        }
        let mut body = Vec::with_capacity(usize::try_from(meta.len()).unwrap_or(0));
        handle.read_to_end(&mut body).await?;

        let ctx = ConditionalContext {
            etag: ETag::from_bytes(&body),
            validators,
            last_modified: meta.modified().ok(),
        };
        if ctx.is_fresh() {
            return Ok(self.policy.not_modified());
        }
        Ok(self.policy.ok(Bytes::from(body), Some(&ctx.etag), content_type))
    }
}
