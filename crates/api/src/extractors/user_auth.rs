//! Bearer token authentication extractors.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use shared::jwt::{JwtError, JwtVerifier};
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;

/// The authenticated caller, taken from the access token subject.
#[derive(Debug, Clone)]
pub struct UserAuth {
    pub user_id: Uuid,
    /// Token id, useful for correlating sessions in logs.
    pub jti: String,
}

impl UserAuth {
    /// Verifies a raw token. Shared by the header extractor and the
    /// websocket `?token=` query.
    pub fn from_token(verifier: &JwtVerifier, token: &str) -> Result<Self, ApiError> {
        let (user_id, claims) = verifier.authenticate(token).map_err(|e| match e {
            JwtError::TokenExpired => ApiError::Unauthorized("Token has expired".to_string()),
            _ => ApiError::Unauthorized("Invalid or expired token".to_string()),
        })?;
        Ok(Self {
            user_id,
            jti: claims.jti,
        })
    }
}

fn bearer_token(parts: &Parts) -> Result<Option<&str>, ApiError> {
    let Some(header) = parts.headers.get("Authorization") else {
        return Ok(None);
    };
    let value = header
        .to_str()
        .map_err(|_| ApiError::Unauthorized("Invalid Authorization header".to_string()))?;
    value
        .strip_prefix("Bearer ")
        .map(|t| Some(t.trim()))
        .ok_or_else(|| ApiError::Unauthorized("Invalid Authorization header format".to_string()))
}

#[async_trait]
impl FromRequestParts<AppState> for UserAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?
            .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".to_string()))?;
        UserAuth::from_token(&state.jwt, token)
    }
}

/// Authentication that tolerates anonymous callers. A present but invalid
/// token is treated as anonymous.
#[derive(Debug, Clone)]
pub struct OptionalUserAuth(pub Option<UserAuth>);

#[async_trait]
impl FromRequestParts<AppState> for OptionalUserAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth = match bearer_token(parts) {
            Ok(Some(token)) => UserAuth::from_token(&state.jwt, token).ok(),
            _ => None,
        };
        Ok(OptionalUserAuth(auth))
    }
}
