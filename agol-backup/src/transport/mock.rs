//! In-memory transport that replays scripted responses.
//!
//! Used by unit and integration tests to drive the full backup workflow
//! without network access. Responses are queued per URL; the last queued
//! response for a URL is repeated once the queue drains to it.

use std::collections::{HashMap, VecDeque};
use std::io::{Cursor, Read};
use std::sync::Mutex;

use serde_json::Value;

use super::client::check_envelope;
use super::{FormParams, Transport, TransportError};

/// A canned response.
#[derive(Debug, Clone)]
pub enum ScriptedResponse {
    /// JSON body (passed through the ArcGIS error-envelope check)
    Json(Value),
    /// Binary body for `fetch_binary`
    Bytes(Vec<u8>),
    /// Non-2xx HTTP status
    Status(u16),
    /// Connection-level failure
    Unreachable,
}

/// HTTP verb recorded for a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Post,
    GetJson,
    GetBinary,
}

/// One recorded call.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub kind: CallKind,
    pub url: String,
    pub params: FormParams,
}

/// Scripted [`Transport`] implementation.
///
/// # Example
///
/// ```
/// use agol_backup::transport::{FormParams, ScriptedResponse, ScriptedTransport, Transport};
/// use serde_json::json;
///
/// let transport = ScriptedTransport::new();
/// transport.push("https://example.com/token", ScriptedResponse::Json(json!({"token": "t"})));
///
/// let body = transport.send("https://example.com/token", &FormParams::new()).unwrap();
/// assert_eq!(body["token"], "t");
/// assert_eq!(transport.call_count("https://example.com/token"), 1);
/// ```
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    responses: Mutex<HashMap<String, VecDeque<ScriptedResponse>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response for `url`.
    pub fn push(&self, url: &str, response: ScriptedResponse) -> &Self {
        let mut responses = self.responses.lock().unwrap_or_else(|e| e.into_inner());
        responses
            .entry(url.to_string())
            .or_default()
            .push_back(response);
        self
    }

    /// Queue a JSON response for `url`.
    pub fn push_json(&self, url: &str, body: Value) -> &Self {
        self.push(url, ScriptedResponse::Json(body))
    }

    /// All calls made so far, in order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Number of calls made to `url`.
    pub fn call_count(&self, url: &str) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|c| c.url == url)
            .count()
    }

    fn next(&self, kind: CallKind, url: &str, params: &FormParams) -> Option<ScriptedResponse> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(RecordedCall {
                kind,
                url: url.to_string(),
                params: params.clone(),
            });

        let mut responses = self.responses.lock().unwrap_or_else(|e| e.into_inner());
        let queue = responses.get_mut(url)?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }

    fn json(&self, kind: CallKind, url: &str, params: &FormParams) -> Result<Value, TransportError> {
        match self.next(kind, url, params) {
            Some(ScriptedResponse::Json(value)) => check_envelope(url, value),
            Some(ScriptedResponse::Bytes(bytes)) => {
                serde_json::from_slice(&bytes).map_err(|source| TransportError::Decode {
                    url: url.to_string(),
                    source,
                })
            }
            other => Err(Self::failure(url, other)),
        }
    }

    fn failure(url: &str, response: Option<ScriptedResponse>) -> TransportError {
        match response {
            Some(ScriptedResponse::Status(status)) => TransportError::Status {
                url: url.to_string(),
                status,
            },
            Some(ScriptedResponse::Unreachable) => TransportError::request(
                url,
                std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "connection refused"),
            ),
            // Unscripted URLs behave like a missing resource
            _ => TransportError::Status {
                url: url.to_string(),
                status: 404,
            },
        }
    }
}

impl Transport for ScriptedTransport {
    fn send(&self, url: &str, form: &FormParams) -> Result<Value, TransportError> {
        self.json(CallKind::Post, url, form)
    }

    fn fetch_json(&self, url: &str, query: &FormParams) -> Result<Value, TransportError> {
        self.json(CallKind::GetJson, url, query)
    }

    fn fetch_binary(
        &self,
        url: &str,
        query: &FormParams,
    ) -> Result<Box<dyn Read + Send>, TransportError> {
        match self.next(CallKind::GetBinary, url, query) {
            Some(ScriptedResponse::Bytes(bytes)) => Ok(Box::new(Cursor::new(bytes))),
            other => Err(Self::failure(url, other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const URL: &str = "https://example.com/status";

    #[test]
    fn test_queue_pops_then_repeats_last() {
        let transport = ScriptedTransport::new();
        transport
            .push_json(URL, json!({"status": "Pending"}))
            .push_json(URL, json!({"status": "Completed"}));

        let q = FormParams::new();
        assert_eq!(transport.fetch_json(URL, &q).unwrap()["status"], "Pending");
        assert_eq!(transport.fetch_json(URL, &q).unwrap()["status"], "Completed");
        assert_eq!(transport.fetch_json(URL, &q).unwrap()["status"], "Completed");
        assert_eq!(transport.call_count(URL), 3);
    }

    #[test]
    fn test_unscripted_url_is_404() {
        let transport = ScriptedTransport::new();
        let err = transport.send(URL, &FormParams::new()).unwrap_err();
        assert!(matches!(err, TransportError::Status { status: 404, .. }));
    }

    #[test]
    fn test_binary_body_streams() {
        let transport = ScriptedTransport::new();
        transport.push(URL, ScriptedResponse::Bytes(b"PK\x03\x04".to_vec()));

        let mut reader = transport.fetch_binary(URL, &FormParams::new()).unwrap();
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).unwrap();
        assert_eq!(buf, b"PK\x03\x04");
    }

    #[test]
    fn test_records_params_and_kind() {
        let transport = ScriptedTransport::new();
        transport.push_json(URL, json!({}));
        transport
            .send(URL, &FormParams::json_with_token("secret"))
            .unwrap();

        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].kind, CallKind::Post);
        assert_eq!(calls[0].params.get_text("token"), Some("secret"));
    }

    #[test]
    fn test_error_envelope_is_applied() {
        let transport = ScriptedTransport::new();
        transport.push_json(URL, json!({"error": {"code": 498, "message": "Invalid token."}}));
        let err = transport.fetch_json(URL, &FormParams::new()).unwrap_err();
        assert!(err.is_token_rejected());
    }
}
