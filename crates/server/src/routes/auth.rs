//! Auth route handlers.
//!
//! Thin passthroughs to the identity service: the server never sees
//! password hashes and keeps no session state, only a short-TTL cache of
//! token verifications that logout drops.

use axum::{Json, extract::State, http::HeaderMap, http::StatusCode};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use cookeasy_core::Email;

use crate::error::{AppError, Result};
use crate::platform::AuthSession;
use crate::state::AppState;

/// Register/login request body.
#[derive(Debug, Deserialize)]
pub struct Credentials {
    /// Account email.
    pub email: String,
    /// Account password, forwarded to the identity service as-is.
    pub password: String,
}

/// Session response returned by register and login.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionBody {
    /// Identity reference for the account.
    pub user_id: String,
    /// Account email.
    pub email: String,
    /// Bearer token for subsequent requests.
    pub token: String,
}

impl From<AuthSession> for SessionBody {
    fn from(session: AuthSession) -> Self {
        Self {
            user_id: session.user_id.into_inner(),
            email: session.email.into_inner(),
            token: session.id_token,
        }
    }
}

/// Create an account.
#[instrument(skip(state, credentials))]
pub async fn register(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> Result<(StatusCode, Json<SessionBody>)> {
    let email = parse_email(&credentials.email)?;
    let session = state.identity().register(&email, &credentials.password).await?;

    tracing::info!(user = %session.user_id, "account registered");
    Ok((StatusCode::CREATED, Json(session.into())))
}

/// Exchange credentials for a session.
#[instrument(skip(state, credentials))]
pub async fn login(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> Result<Json<SessionBody>> {
    let email = parse_email(&credentials.email)?;
    let session = state.identity().login(&email, &credentials.password).await?;
    Ok(Json(session.into()))
}

/// Drop the request token's cached verification.
///
/// Identity tokens are stateless, so this is all logout means server-side;
/// the client discards its copy of the token.
#[instrument(skip(state, headers))]
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> StatusCode {
    let token = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    if let Some(token) = token {
        state.forget_token(token.trim()).await;
    }
    StatusCode::NO_CONTENT
}

fn parse_email(raw: &str) -> Result<Email> {
    Email::parse(raw.trim()).map_err(|err| AppError::Validation(err.to_string()))
}
