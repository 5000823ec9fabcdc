//! ETag generation.
//!
//! An ETag is the SHA-256 digest of the file contents, URL-safe base64
//! encoded without padding and wrapped in double quotes, e.g.
//! `"n4bQgYhMfWWaL-qgxVrQFaO_TxsrC4Is0V1sFbDwCgg"`. The alphabet contains no
//! control characters, so the value can go straight into a header.

use std::fmt;
use std::path::Path;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use http::HeaderValue;
use sha2::{Digest, Sha256};

/// Length of every generated ETag, quotes included.
pub const ETAG_LEN: usize = 45;

/// Strong entity tag derived from file contents.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ETag(String);

impl ETag {
    /// Fingerprint a byte slice.
    #[must_use]
    pub fn from_bytes(content: &[u8]) -> Self {
        let digest = Sha256::digest(content);
        ETag(format!("\"{}\"", URL_SAFE_NO_PAD.encode(digest.as_slice())))
    }

    /// Read a file and fingerprint its contents.
    ///
    /// # Errors
    ///
    /// Returns any I/O error raised while reading the file.
    pub async fn of_file(path: &Path) -> std::io::Result<Self> {
        let content = tokio::fs::read(path).await?;
        Ok(Self::from_bytes(&content))
    }

    /// The quoted tag.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether `candidate` (one entry of an `If-None-Match` list) names this tag.
    ///
    /// Weak comparison: a `W/` prefix on the candidate is ignored.
    #[must_use]
    pub fn matches(&self, candidate: &str) -> bool {
        let candidate = candidate.trim();
        let candidate = candidate.strip_prefix("W/").unwrap_or(candidate);
        candidate == "*" || candidate == self.0
    }

    /// Header value form.
    #[must_use]
    pub fn to_header_value(&self) -> HeaderValue {
        // base64url plus quotes is always visible ASCII
        HeaderValue::from_str(&self.0).unwrap_or_else(|_| HeaderValue::from_static("\"\""))
    }
}

impl fmt::Display for ETag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
