use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::SystemTime;

use bytes::Bytes;
use futures::future::{BoxFuture, FutureExt};
use http::HeaderValue;
use tracing::warn;

use super::{content_type_for, AssetHandler, AssetRequest, Outcome, ResponsePolicy};
use crate::conditional::{is_fresh, RequestValidators};
use crate::etag::ETag;

/// Everything a static route knows about its file, fixed at build time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticAsset {
    /// Absolute path of the file to read
    pub file: PathBuf,
    /// Precomputed tag; `None` when caching is disabled
    pub etag: Option<ETag>,
    /// Modification time at build; `None` when caching is disabled
    pub modified: Option<SystemTime>,
    /// Guessed `Content-Type`
    pub content_type: HeaderValue,
}

impl StaticAsset {
    /// Prepare a file for static serving.
    ///
    /// With `with_etag`, the file is read and stat'ed once here so requests
    /// can be answered with a 304 without touching the filesystem.
    ///
    /// # Errors
    ///
    /// Any I/O error raised while reading or stat'ing the file.
    pub async fn prepare(file: PathBuf, with_etag: bool) -> io::Result<Self> {
        let content_type = content_type_for(&file);
        let (etag, modified) = if with_etag {
            let meta = tokio::fs::metadata(&file).await?;
            let etag = ETag::of_file(&file).await?;
            (Some(etag), meta.modified().ok())
        } else {
            (None, None)
        };
        Ok(Self {
            file,
            etag,
            modified,
            content_type,
        })
    }
}

/// Serves one fixed file.
#[derive(Debug, Clone)]
pub struct StaticFileHandler {
    asset: Arc<StaticAsset>,
    policy: Arc<ResponsePolicy>,
}

impl StaticFileHandler {
    /// Bind an asset to the response policy of its build.
    #[must_use]
    pub fn new(asset: Arc<StaticAsset>, policy: Arc<ResponsePolicy>) -> Self {
        Self { asset, policy }
    }

    /// The asset this handler serves.
    #[must_use]
    pub fn asset(&self) -> &StaticAsset {
        &self.asset
    }
}

impl AssetHandler for StaticFileHandler {
    fn handle(&self, request: AssetRequest<'_>) -> BoxFuture<'static, Outcome> {
        let asset = Arc::clone(&self.asset);
        let policy = Arc::clone(&self.policy);
        let validators = policy
            .caching_enabled()
            .then(|| RequestValidators::from_headers(request.headers));
        async move { serve(&asset, &policy, validators).await }.boxed()
    }
}

async fn serve(
    asset: &StaticAsset,
    policy: &ResponsePolicy,
    validators: Option<RequestValidators>,
) -> Outcome {
    if let (Some(validators), Some(etag)) = (&validators, &asset.etag) {
        if is_fresh(validators, etag, asset.modified) {
            return policy.not_modified();
        }
    }
    match tokio::fs::read(&asset.file).await {
        Ok(body) => policy.ok(
            Bytes::from(body),
            asset.etag.as_ref(),
            asset.content_type.clone(),
        ),
        Err(err) => {
            warn!(file = %asset.file.display(), error = %err, "Static asset unreadable");
            Outcome::NotFound
        }
    }
}
