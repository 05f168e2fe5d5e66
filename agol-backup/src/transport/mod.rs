//! HTTP transport for the ArcGIS REST API.
//!
//! Every remote call in the crate goes through the [`Transport`] trait:
//!
//! - [`HttpTransport`] - production implementation over `reqwest::blocking`
//! - [`ScriptedTransport`] - in-memory implementation replaying canned responses
//!
//! Network failures, non-2xx statuses, undecodable bodies and ArcGIS error
//! envelopes all surface as a single [`TransportError`].

mod client;
mod error;
mod form;
mod mock;

pub use client::{HttpTransport, Transport, DEFAULT_DOWNLOAD_TIMEOUT_SECS, DEFAULT_TIMEOUT_SECS};
pub use error::{TransportError, INVALID_TOKEN_CODE, TOKEN_REQUIRED_CODE};
pub use form::{FormParams, FormValue};
pub use mock::{CallKind, RecordedCall, ScriptedResponse, ScriptedTransport};
