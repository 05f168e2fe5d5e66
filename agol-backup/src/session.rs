//! Portal authentication.
//!
//! Exchanges a username and password for a time-bounded token at the
//! `generateToken` endpoint. Authentication failures are fatal to a run:
//! there is no fallback credential source and no retry.

use chrono::{DateTime, Duration as ChronoDuration, Local, TimeZone, Utc};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use crate::transport::{FormParams, Transport, TransportError};

/// Default identity endpoint.
pub const DEFAULT_TOKEN_URL: &str = "https://arcgis.com/sharing/rest/generateToken";

/// Default referer sent with token requests.
pub const DEFAULT_REFERER: &str = "https://www.arcgis.com";

/// Tokens are treated as expired this long before their stated expiry.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// Errors that can occur while authenticating.
#[derive(Debug, Error)]
pub enum AuthenticationError {
    /// The identity endpoint could not be reached or rejected the request.
    #[error("Token generation failed: {0}")]
    Transport(#[from] TransportError),

    /// The identity endpoint answered without a token.
    #[error("Token generation failed: response did not contain a token")]
    MissingToken,
}

/// Portal credentials.
#[derive(Clone)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// An authenticated session.
#[derive(Debug, Clone)]
pub struct Session {
    token: String,
    issued_at: DateTime<Local>,
    expires_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn new(token: impl Into<String>, issued_at: DateTime<Local>) -> Self {
        Self {
            token: token.into(),
            issued_at,
            expires_at: None,
        }
    }

    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn issued_at(&self) -> DateTime<Local> {
        self.issued_at
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// True if the token is past (or within a minute of) its stated expiry.
    ///
    /// Sessions without a stated expiry never report as expired; a rejection
    /// by the portal is detected separately.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires_at) => now + ChronoDuration::seconds(EXPIRY_MARGIN_SECS) >= expires_at,
            None => false,
        }
    }

    /// `f=json&token=<token>` parameters for JSON calls.
    pub fn json_params(&self) -> FormParams {
        FormParams::json_with_token(&self.token)
    }
}

/// Obtains sessions from the identity endpoint.
pub struct SessionManager<'a, T: Transport> {
    transport: &'a T,
    token_url: String,
    referer: String,
    credentials: Credentials,
}

impl<'a, T: Transport> SessionManager<'a, T> {
    pub fn new(
        transport: &'a T,
        token_url: impl Into<String>,
        referer: impl Into<String>,
        credentials: Credentials,
    ) -> Self {
        Self {
            transport,
            token_url: token_url.into(),
            referer: referer.into(),
            credentials,
        }
    }

    pub fn username(&self) -> &str {
        self.credentials.username()
    }

    /// Request a new token.
    pub fn authenticate(&self) -> Result<Session, AuthenticationError> {
        let form = FormParams::new()
            .with("username", self.credentials.username.as_str())
            .with("password", self.credentials.password.as_str())
            .with("referer", self.referer.as_str())
            .with("f", "json");

        debug!(url = %self.token_url, username = %self.credentials.username, "Requesting token");
        let response = self.transport.send(&self.token_url, &form)?;

        let token = response
            .get("token")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .ok_or(AuthenticationError::MissingToken)?;

        let mut session = Session::new(token, Local::now());
        if let Some(expires_at) = response
            .get("expires")
            .and_then(Value::as_i64)
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
        {
            session = session.with_expiry(expires_at);
        }

        info!(
            username = %self.credentials.username,
            expires_at = ?session.expires_at(),
            "Token generated"
        );
        Ok(session)
    }
}
