//! # Handler Module
//!
//! Request handlers bound to generated routes.
//!
//! ## Overview
//!
//! - [`StaticFileHandler`] serves one fixed file. Built once per route in
//!   static mode from an immutable [`StaticAsset`].
//! - [`WildcardHandler`] serves everything below a prefix, resolving files
//!   lazily through the freshness caches.
//!
//! Both implement [`AssetHandler`]. Handlers take an [`AssetRequest`] view
//! (URL path and headers) so they work with any host request type, and
//! return a `'static` future resolving to an [`Outcome`].
//!
//! ## Response Headers
//!
//! [`ResponsePolicy`] merges, in order:
//! 1. configured extra headers
//! 2. `Content-Type` guessed from the file extension, unless configured
//! 3. `Etag` and `Cache-Control` when caching is enabled (these replace
//!    configured headers of the same name)
//!
//! A 304 carries the configured headers only.

mod outcome;
mod static_file;
mod wildcard;

use std::path::Path;

use bytes::Bytes;
use futures::future::BoxFuture;
use http::header::{CACHE_CONTROL, CONTENT_TYPE, ETAG};
use http::{HeaderMap, HeaderValue, Request};

use crate::config::StaticConfig;
use crate::error::Result;
use crate::etag::ETag;

pub use outcome::Outcome;
pub use static_file::{StaticAsset, StaticFileHandler};
pub use wildcard::WildcardHandler;

/// The parts of a request a handler reads.
#[derive(Debug, Clone, Copy)]
pub struct AssetRequest<'a> {
    /// URL path, without query string
    pub path: &'a str,
    /// Request headers
    pub headers: &'a HeaderMap,
}

impl<'a, B> From<&'a Request<B>> for AssetRequest<'a> {
    fn from(req: &'a Request<B>) -> Self {
        Self {
            path: req.uri().path(),
            headers: req.headers(),
        }
    }
}

/// A route handler.
///
/// Invoked concurrently by the dispatcher; implementations keep no
/// request-scoped state between calls.
pub trait AssetHandler: Send + Sync {
    /// Serve one request.
    fn handle(&self, request: AssetRequest<'_>) -> BoxFuture<'static, Outcome>;
}

/// Header rules shared by every handler of one build.
#[derive(Debug, Clone)]
pub struct ResponsePolicy {
    headers: HeaderMap,
    /// `None` when caching is disabled
    cache_control: Option<HeaderValue>,
}

impl ResponsePolicy {
    /// Derive the policy from configuration.
    ///
    /// # Errors
    ///
    /// [`StaticError::InvalidHeader`](crate::StaticError::InvalidHeader) for a
    /// bad configured header.
    pub fn from_config(config: &StaticConfig) -> Result<Self> {
        let headers = config.header_map()?;
        let cache_control = if config.no_cache {
            None
        } else {
            Some(HeaderValue::from_str(&config.cache_control_value()).map_err(|_| {
                crate::StaticError::InvalidHeader {
                    name: CACHE_CONTROL.to_string(),
                }
            })?)
        };
        Ok(Self {
            headers,
            cache_control,
        })
    }

    /// Whether ETag and conditional handling are active.
    #[must_use]
    pub fn caching_enabled(&self) -> bool {
        self.cache_control.is_some()
    }

    /// Build a 200 outcome.
    #[must_use]
    pub fn ok(&self, body: Bytes, etag: Option<&ETag>, content_type: HeaderValue) -> Outcome {
        let mut headers = self.headers.clone();
        if !headers.contains_key(CONTENT_TYPE) {
            headers.insert(CONTENT_TYPE, content_type);
        }
        if let (Some(etag), Some(cache_control)) = (etag, &self.cache_control) {
            headers.insert(ETAG, etag.to_header_value());
            headers.insert(CACHE_CONTROL, cache_control.clone());
        }
        Outcome::Ok { headers, body }
    }

    /// Build a 304 outcome.
    #[must_use]
    pub fn not_modified(&self) -> Outcome {
        Outcome::NotModified {
            headers: self.headers.clone(),
        }
    }
}

/// `Content-Type` for a file, from its extension.
pub(crate) fn content_type_for(path: &Path) -> HeaderValue {
    mime_guess::from_path(path)
        .first_raw()
        .and_then(|mime| HeaderValue::from_str(mime).ok())
        .unwrap_or_else(|| HeaderValue::from_static("application/octet-stream"))
}
