//! HTTP client for the hosted identity service.
//!
//! Accounts, passwords, and token minting all live in the identity service;
//! this client only exchanges credentials for sessions and verifies bearer
//! tokens. Tokens are stateless, so logout is purely a client-side discard
//! (plus dropping any cached verification).

use std::sync::Arc;

use reqwest::StatusCode;
use secrecy::ExposeSecret;
use serde::Deserialize;
use thiserror::Error;
use tracing::instrument;

use cookeasy_core::{Email, UserId};

use crate::config::IdentityConfig;

/// Errors that can occur when talking to the identity service.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// HTTP request failed before a response was received.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The email/password pair was rejected.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// An account with this email already exists.
    #[error("email already registered")]
    EmailTaken,

    /// The password did not meet the service's policy.
    #[error("weak password: {0}")]
    WeakPassword(String),

    /// The bearer token is invalid or expired.
    #[error("invalid or expired token")]
    InvalidToken,

    /// Response body could not be decoded.
    #[error("response parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The service returned an unrecognized error.
    #[error("identity service error {status}: {message}")]
    Service {
        /// HTTP status code.
        status: u16,
        /// Error code or message from the service.
        message: String,
    },

    /// The service returned structurally invalid account data.
    #[error("malformed identity response: {0}")]
    Malformed(String),
}

/// An authenticated session returned by `register` and `login`.
#[derive(Debug, Clone)]
pub struct AuthSession {
    /// The account's identity reference (recipe `owner_id` values).
    pub user_id: UserId,
    /// The account email.
    pub email: Email,
    /// Bearer token for subsequent requests.
    pub id_token: String,
}

/// Client for the hosted identity service.
#[derive(Clone)]
pub struct IdentityClient {
    inner: Arc<IdentityClientInner>,
}

struct IdentityClientInner {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Deserialize)]
struct WireSession {
    #[serde(rename = "localId")]
    local_id: String,
    email: String,
    #[serde(rename = "idToken")]
    id_token: String,
}

#[derive(Deserialize)]
struct WireLookup {
    users: Vec<WireAccount>,
}

#[derive(Deserialize)]
struct WireAccount {
    #[serde(rename = "localId")]
    local_id: String,
    email: String,
}

#[derive(Deserialize)]
struct WireError {
    error: WireErrorBody,
}

#[derive(Deserialize)]
struct WireErrorBody {
    message: String,
}

impl IdentityClient {
    /// Create a new identity client.
    #[must_use]
    pub fn new(config: &IdentityConfig) -> Self {
        Self {
            inner: Arc::new(IdentityClientInner {
                client: reqwest::Client::new(),
                base_url: config.base_url.trim_end_matches('/').to_owned(),
                api_key: config.api_key.expose_secret().to_owned(),
            }),
        }
    }

    /// Create an account and return its first session.
    ///
    /// # Errors
    ///
    /// Returns `EmailTaken` if the address is registered, `WeakPassword`
    /// if the password fails the service's policy, or a transport error.
    #[instrument(skip(self, password))]
    pub async fn register(&self, email: &Email, password: &str) -> Result<AuthSession, IdentityError> {
        self.credential_call("accounts:signUp", email, password).await
    }

    /// Exchange an email/password pair for a session.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCredentials` when the pair is rejected, or a
    /// transport error.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &Email, password: &str) -> Result<AuthSession, IdentityError> {
        self.credential_call("accounts:signInWithPassword", email, password)
            .await
    }

    /// Resolve a bearer token to the account it was minted for.
    ///
    /// # Errors
    ///
    /// Returns `InvalidToken` when the token is rejected, or a transport
    /// error.
    #[instrument(skip(self, id_token))]
    pub async fn lookup(&self, id_token: &str) -> Result<(UserId, Email), IdentityError> {
        let body = serde_json::json!({ "idToken": id_token });
        let response = self.post("accounts:lookup", &body).await?;
        let lookup: WireLookup = Self::decode(response).await?;

        let account = lookup
            .users
            .into_iter()
            .next()
            .ok_or_else(|| IdentityError::Malformed("lookup returned no accounts".to_owned()))?;
        let email = Email::parse(&account.email)
            .map_err(|err| IdentityError::Malformed(format!("invalid email in account: {err}")))?;

        Ok((UserId::new(account.local_id), email))
    }

    async fn credential_call(
        &self,
        endpoint: &str,
        email: &Email,
        password: &str,
    ) -> Result<AuthSession, IdentityError> {
        let body = serde_json::json!({
            "email": email.as_str(),
            "password": password,
            "returnSecureToken": true,
        });
        let response = self.post(endpoint, &body).await?;
        let session: WireSession = Self::decode(response).await?;

        let email = Email::parse(&session.email)
            .map_err(|err| IdentityError::Malformed(format!("invalid email in session: {err}")))?;

        Ok(AuthSession {
            user_id: UserId::new(session.local_id),
            email,
            id_token: session.id_token,
        })
    }

    async fn post(
        &self,
        endpoint: &str,
        body: &serde_json::Value,
    ) -> Result<reqwest::Response, IdentityError> {
        let url = format!("{}/v1/{endpoint}", self.inner.base_url);
        Ok(self
            .inner
            .client
            .post(&url)
            .query(&[("key", self.inner.api_key.as_str())])
            .json(body)
            .send()
            .await?)
    }

    /// Decode a response, mapping the service's error codes to variants.
    async fn decode<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, IdentityError> {
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            return Ok(serde_json::from_str(&text)?);
        }

        let code = serde_json::from_str::<WireError>(&text)
            .map(|wire| wire.error.message)
            .unwrap_or_else(|_| text.chars().take(200).collect());

        Err(Self::map_error_code(status, &code))
    }

    fn map_error_code(status: StatusCode, code: &str) -> IdentityError {
        // The service reports machine-readable codes, sometimes with a
        // trailing detail after " : ".
        let (head, detail) = match code.split_once(" : ") {
            Some((head, detail)) => (head.trim(), detail.trim()),
            None => (code.trim(), ""),
        };

        match head {
            "EMAIL_EXISTS" => IdentityError::EmailTaken,
            "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS"
            | "USER_DISABLED" => IdentityError::InvalidCredentials,
            "WEAK_PASSWORD" => IdentityError::WeakPassword(if detail.is_empty() {
                "password rejected by identity service".to_owned()
            } else {
                detail.to_owned()
            }),
            "INVALID_ID_TOKEN" | "TOKEN_EXPIRED" | "USER_NOT_FOUND" => IdentityError::InvalidToken,
            _ => IdentityError::Service {
                status: status.as_u16(),
                message: code.to_owned(),
            },
        }
    }
}
