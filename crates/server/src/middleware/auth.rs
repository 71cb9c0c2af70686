//! Authentication extractors.
//!
//! Identity lives entirely in the external identity service; a request
//! proves who it is with `Authorization: Bearer <id_token>`. The extractors
//! resolve the token through the state's verification cache.

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};

use cookeasy_core::{Email, UserId};

use crate::error::AppError;
use crate::state::AppState;

/// The authenticated account behind a request.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    /// Identity reference (recipe `owner_id`, user document id).
    pub id: UserId,
    /// Account email, used when lazily creating the user record.
    pub email: Email,
}

/// Extractor that requires an authenticated account.
///
/// Rejects with 401 when the bearer token is missing, invalid, or expired.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireUser(user): RequireUser,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", user.email)
/// }
/// ```
pub struct RequireUser(pub CurrentUser);

impl FromRequestParts<AppState> for RequireUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| AppError::Unauthorized("missing bearer token".to_owned()))?;

        let user = state.verify_token(token).await?;
        Ok(Self(user))
    }
}

/// Extractor that optionally resolves the current account.
///
/// Unlike `RequireUser`, this never rejects: a missing or unverifiable
/// token yields an anonymous request.
pub struct OptionalUser(pub Option<CurrentUser>);

impl FromRequestParts<AppState> for OptionalUser {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(parts) else {
            return Ok(Self(None));
        };

        match state.verify_token(token).await {
            Ok(user) => Ok(Self(Some(user))),
            Err(err) => {
                tracing::debug!(error = %err, "optional auth token did not verify");
                Ok(Self(None))
            }
        }
    }
}

/// Pull the bearer token out of the `Authorization` header, if present.
pub fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}
