//! Transport error type.

use thiserror::Error;

/// ArcGIS error code for an invalid or expired token.
pub const INVALID_TOKEN_CODE: i64 = 498;

/// ArcGIS error code for a missing token on a secured resource.
pub const TOKEN_REQUIRED_CODE: i64 = 499;

/// Any failure between issuing a request and holding a decoded body.
///
/// Callers decide whether a given failure aborts the run or skips an entry;
/// the transport itself never retries.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request could not be sent or the body could not be read.
    #[error("Request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The server answered with a non-2xx status.
    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    /// The body was not valid JSON.
    #[error("Invalid JSON from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// The HTTP client could not be built.
    #[error("Failed to create HTTP client: {0}")]
    Client(String),

    /// The server answered 200 with an ArcGIS error envelope.
    #[error("Remote error {code} from {url}: {message}")]
    Remote {
        url: String,
        code: i64,
        message: String,
    },
}

impl TransportError {
    pub(crate) fn request(
        url: &str,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        TransportError::Request {
            url: url.to_string(),
            source: Box::new(source),
        }
    }

    /// True when the portal rejected the session token.
    pub fn is_token_rejected(&self) -> bool {
        match self {
            TransportError::Remote { code, .. } => {
                matches!(*code, INVALID_TOKEN_CODE | TOKEN_REQUIRED_CODE)
            }
            TransportError::Status { status, .. } => {
                matches!(i64::from(*status), INVALID_TOKEN_CODE | TOKEN_REQUIRED_CODE)
            }
            _ => false,
        }
    }

    /// URL of the failed request, if one was issued.
    pub fn url(&self) -> Option<&str> {
        match self {
            TransportError::Request { url, .. }
            | TransportError::Status { url, .. }
            | TransportError::Decode { url, .. }
            | TransportError::Remote { url, .. } => Some(url),
            TransportError::Client(_) => None,
        }
    }
}
