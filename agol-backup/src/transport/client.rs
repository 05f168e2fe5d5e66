//! HTTP transport abstraction for testability.

use std::io::Read;
use std::time::Duration;

use reqwest::blocking::{Client, Response};
use serde_json::Value;
use tracing::{debug, trace, warn};

use super::{FormParams, TransportError};

/// Default timeout for JSON calls (token, listing, metadata, replica, status).
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Default timeout for result downloads, which can be large archives.
pub const DEFAULT_DOWNLOAD_TIMEOUT_SECS: u64 = 3600;

const USER_AGENT: &str = concat!("agol-backup/", env!("CARGO_PKG_VERSION"));

/// Authenticated HTTP calls against the portal.
///
/// This trait allows the directory, session and replica components to be
/// exercised against [`ScriptedTransport`](super::ScriptedTransport) in tests.
/// Implementations must not retry; retry policy belongs to callers.
pub trait Transport: Send + Sync {
    /// POST `form` URL-encoded to `url` and decode the JSON body.
    fn send(&self, url: &str, form: &FormParams) -> Result<Value, TransportError>;

    /// GET `url` with `query` parameters and decode the JSON body.
    fn fetch_json(&self, url: &str, query: &FormParams) -> Result<Value, TransportError>;

    /// GET `url` with `query` parameters and return the body as a stream.
    fn fetch_binary(
        &self,
        url: &str,
        query: &FormParams,
    ) -> Result<Box<dyn Read + Send>, TransportError>;
}

/// Reject bodies carrying an ArcGIS error envelope.
///
/// The REST API reports most failures (bad token, invalid parameters) as
/// HTTP 200 with `{"error": {"code": ..., "message": ...}}`.
pub(crate) fn check_envelope(url: &str, value: Value) -> Result<Value, TransportError> {
    if let Some(error) = value.get("error") {
        let code = error.get("code").and_then(Value::as_i64).unwrap_or_default();
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown error")
            .to_string();
        return Err(TransportError::Remote {
            url: url.to_string(),
            code,
            message,
        });
    }
    Ok(value)
}

/// Blocking HTTP transport using reqwest.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    timeout: Duration,
    download_timeout: Duration,
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("timeout", &self.timeout)
            .field("download_timeout", &self.download_timeout)
            .finish()
    }
}

impl HttpTransport {
    /// Create a transport with default timeouts.
    pub fn new() -> Result<Self, TransportError> {
        Self::with_timeouts(
            Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            Duration::from_secs(DEFAULT_DOWNLOAD_TIMEOUT_SECS),
        )
    }

    /// Create a transport with custom timeouts.
    ///
    /// `timeout` bounds JSON calls; `download_timeout` bounds a whole result
    /// download including reading the body.
    pub fn with_timeouts(
        timeout: Duration,
        download_timeout: Duration,
    ) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| TransportError::Client(e.to_string()))?;

        Ok(Self {
            client,
            timeout,
            download_timeout,
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn download_timeout(&self) -> Duration {
        self.download_timeout
    }

    fn request_failed(url: &str, error: reqwest::Error) -> TransportError {
        warn!(
            url = url,
            error = %error,
            is_connect = error.is_connect(),
            is_timeout = error.is_timeout(),
            "HTTP request failed"
        );
        TransportError::request(url, error)
    }

    fn check_status(url: &str, response: Response) -> Result<Response, TransportError> {
        let status = response.status();
        debug!(url = url, status = status.as_u16(), "HTTP response received");

        if !status.is_success() {
            warn!(url = url, status = status.as_u16(), "HTTP error status");
            return Err(TransportError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }

    fn decode(url: &str, response: Response) -> Result<Value, TransportError> {
        let response = Self::check_status(url, response)?;
        let bytes = response
            .bytes()
            .map_err(|e| TransportError::request(url, e))?;
        trace!(url = url, bytes = bytes.len(), "HTTP response body read");

        let value: Value = serde_json::from_slice(&bytes).map_err(|source| {
            TransportError::Decode {
                url: url.to_string(),
                source,
            }
        })?;
        check_envelope(url, value)
    }
}

impl Transport for HttpTransport {
    fn send(&self, url: &str, form: &FormParams) -> Result<Value, TransportError> {
        trace!(url = url, fields = form.len(), "HTTP POST request starting");

        let response = self
            .client
            .post(url)
            .form(&form.encoded_pairs())
            .send()
            .map_err(|e| Self::request_failed(url, e))?;

        Self::decode(url, response)
    }

    fn fetch_json(&self, url: &str, query: &FormParams) -> Result<Value, TransportError> {
        trace!(url = url, "HTTP GET request starting");

        let response = self
            .client
            .get(url)
            .query(&query.encoded_pairs())
            .send()
            .map_err(|e| Self::request_failed(url, e))?;

        Self::decode(url, response)
    }

    fn fetch_binary(
        &self,
        url: &str,
        query: &FormParams,
    ) -> Result<Box<dyn Read + Send>, TransportError> {
        trace!(url = url, "HTTP GET (binary) request starting");

        let response = self
            .client
            .get(url)
            .query(&query.encoded_pairs())
            .timeout(self.download_timeout)
            .send()
            .map_err(|e| Self::request_failed(url, e))?;

        let response = Self::check_status(url, response)?;
        Ok(Box::new(response))
    }
}
