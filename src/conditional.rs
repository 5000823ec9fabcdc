//! Conditional request evaluation (`If-None-Match` / `If-Modified-Since`).
//!
//! The evaluator only answers one question: can the client keep using its
//! copy? It never fails. Unparseable validators are treated as absent.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use http::header::{IF_MODIFIED_SINCE, IF_NONE_MATCH};
use http::HeaderMap;

use crate::etag::ETag;

/// Validators carried by an incoming request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestValidators {
    /// Raw `If-None-Match` value (may be a comma-separated list)
    pub if_none_match: Option<String>,
    /// Parsed `If-Modified-Since` date
    pub if_modified_since: Option<SystemTime>,
}

impl RequestValidators {
    /// Extract validators from request headers.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let if_none_match = headers
            .get(IF_NONE_MATCH)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let if_modified_since = headers
            .get(IF_MODIFIED_SINCE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| httpdate::parse_http_date(v).ok());
        Self {
            if_none_match,
            if_modified_since,
        }
    }

    /// True when the request carries no usable validator.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.if_none_match.is_none() && self.if_modified_since.is_none()
    }
}

/// Everything needed to decide 200 vs 304 for one request.
#[derive(Debug, Clone)]
pub struct ConditionalContext {
    /// Current tag of the resolved file
    pub etag: ETag,
    /// Validators sent by the client
    pub validators: RequestValidators,
    /// Modification time of the resolved file when checked
    pub last_modified: Option<SystemTime>,
}

impl ConditionalContext {
    /// Whether a 304 should be sent.
    #[must_use]
    pub fn is_fresh(&self) -> bool {
        is_fresh(&self.validators, &self.etag, self.last_modified)
    }
}

/// Decide whether the client's cached copy is still valid.
///
/// 1. `If-None-Match` naming the current tag → fresh.
/// 2. Otherwise `If-Modified-Since` at or after the file's modification time
///    (whole seconds, the resolution of an HTTP date) → fresh.
/// 3. Otherwise not fresh.
#[must_use]
pub fn is_fresh(
    validators: &RequestValidators,
    etag: &ETag,
    last_modified: Option<SystemTime>,
) -> bool {
    if let Some(inm) = &validators.if_none_match {
        if inm.split(',').any(|candidate| etag.matches(candidate)) {
            return true;
        }
    }
    match (validators.if_modified_since, last_modified) {
        (Some(since), Some(modified)) => since >= truncate_to_secs(modified),
        _ => false,
    }
}

fn truncate_to_secs(t: SystemTime) -> SystemTime {
    match t.duration_since(UNIX_EPOCH) {
        Ok(d) => UNIX_EPOCH + Duration::from_secs(d.as_secs()),
        Err(_) => t,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    fn tag() -> ETag {
        ETag::from_bytes(b"hi")
    }

    fn modified() -> SystemTime {
        UNIX_EPOCH + Duration::from_millis(1_700_000_000_250)
    }

    #[test]
    fn test_no_validators_is_not_fresh() {
        let v = RequestValidators::default();
        assert!(v.is_empty());
        assert!(!is_fresh(&v, &tag(), Some(modified())));
    }

    #[test]
    fn test_matching_etag_is_fresh() {
        let v = RequestValidators {
            if_none_match: Some(tag().to_string()),
            ..Default::default()
        };
        assert!(is_fresh(&v, &tag(), None));
    }

    #[test]
    fn test_etag_list_is_fresh() {
        let v = RequestValidators {
            if_none_match: Some(format!("\"old\", {}", tag())),
            ..Default::default()
        };
        assert!(is_fresh(&v, &tag(), None));
    }

    #[test]
    fn test_stale_etag_is_not_fresh() {
        let v = RequestValidators {
            if_none_match: Some("\"stale\"".to_string()),
            ..Default::default()
        };
        assert!(!is_fresh(&v, &tag(), Some(modified())));
    }

    #[test]
    fn test_modified_since_after_is_fresh() {
        let v = RequestValidators {
            if_modified_since: Some(modified() + Duration::from_secs(10)),
            ..Default::default()
        };
        assert!(is_fresh(&v, &tag(), Some(modified())));
    }

    #[test]
    fn test_modified_since_same_second_is_fresh() {
        // HTTP dates drop sub-second precision
        let header = httpdate::fmt_http_date(modified());
        let since = httpdate::parse_http_date(&header).unwrap();
        let v = RequestValidators {
            if_modified_since: Some(since),
            ..Default::default()
        };
        assert!(is_fresh(&v, &tag(), Some(modified())));
    }

    #[test]
    fn test_modified_since_before_is_not_fresh() {
        let v = RequestValidators {
            if_modified_since: Some(modified() - Duration::from_secs(10)),
            ..Default::default()
        };
        assert!(!is_fresh(&v, &tag(), Some(modified())));
    }

    #[test]
    fn test_stale_etag_falls_back_to_modified_since() {
        let v = RequestValidators {
            if_none_match: Some("\"stale\"".to_string()),
            if_modified_since: Some(modified() + Duration::from_secs(10)),
        };
        assert!(is_fresh(&v, &tag(), Some(modified())));
    }

    #[test]
    fn test_from_headers_ignores_bad_date() {
        let mut headers = HeaderMap::new();
        headers.insert(IF_MODIFIED_SINCE, HeaderValue::from_static("yesterday"));
        headers.insert(IF_NONE_MATCH, HeaderValue::from_static("\"abc\""));
        let v = RequestValidators::from_headers(&headers);
        assert_eq!(v.if_modified_since, None);
        assert_eq!(v.if_none_match.as_deref(), Some("\"abc\""));
    }

    #[test]
    fn test_context_delegates() {
        let ctx = ConditionalContext {
            etag: tag(),
            validators: RequestValidators {
                if_none_match: Some(tag().to_string()),
                ..Default::default()
            },
            last_modified: None,
        };
        assert!(ctx.is_fresh());
    }
}
