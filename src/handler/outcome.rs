use bytes::Bytes;
use http::{HeaderMap, Response, StatusCode};

/// Result of serving one request.
///
/// Every handler path ends in exactly one of these. There is no error
/// variant: resolution and I/O failures are folded into [`Outcome::NotFound`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// 200 with the full file body
    Ok {
        /// Response headers
        headers: HeaderMap,
        /// File contents
        body: Bytes,
    },
    /// 304 with an empty body
    NotModified {
        /// Response headers
        headers: HeaderMap,
    },
    /// 404; nothing servable at this path
    NotFound,
}

impl Outcome {
    /// HTTP status for this outcome.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Outcome::Ok { .. } => StatusCode::OK,
            Outcome::NotModified { .. } => StatusCode::NOT_MODIFIED,
            Outcome::NotFound => StatusCode::NOT_FOUND,
        }
    }

    /// Response headers, empty for NotFound.
    #[must_use]
    pub fn headers(&self) -> Option<&HeaderMap> {
        match self {
            Outcome::Ok { headers, .. } | Outcome::NotModified { headers } => Some(headers),
            Outcome::NotFound => None,
        }
    }

    /// Get a header by name.
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers()
            .and_then(|h| h.get(name))
            .and_then(|v| v.to_str().ok())
    }

    /// Body bytes; empty unless the outcome is [`Outcome::Ok`].
    #[must_use]
    pub fn body(&self) -> &[u8] {
        match self {
            Outcome::Ok { body, .. } => body,
            _ => &[],
        }
    }

    /// Convert into an `http` response for the host dispatcher.
    #[must_use]
    pub fn into_response(self) -> Response<Bytes> {
        let status = self.status();
        let (headers, body) = match self {
            Outcome::Ok { headers, body } => (headers, body),
            Outcome::NotModified { headers } => (headers, Bytes::new()),
            Outcome::NotFound => (HeaderMap::new(), Bytes::new()),
        };
        let mut response = Response::new(body);
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        response
    }
}
