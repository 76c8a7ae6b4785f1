//! Authentication API handlers
//!
//! Registration, credential login, refresh, and the two logout operations.
//! Field validation happens before any database access, so malformed
//! requests answer 400 even when the pool is down.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use trk_auth::{hash_password, verify_password, VerifyOutcome};
use trk_core::Id;
use trk_db::{CreateUserDto, UserRepository};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Authorization header value, if any
pub(crate) fn authorization(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
}

fn require_field(value: Option<String>, name: &str) -> ApiResult<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ApiError::bad_request(format!("Missing field: {}", name))),
    }
}

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(dto): Json<RegisterDto>,
) -> ApiResult<impl IntoResponse> {
    let username = require_field(dto.username, "username")?;
    let email = require_field(dto.email, "email")?;
    let password = require_field(dto.password, "password")?;

    if !email.contains('@') {
        return Err(ApiError::bad_request("Invalid email address"));
    }

    let pool = state.pool()?;
    let repo = UserRepository::new(pool.clone());

    let password_hash =
        hash_password(&password).map_err(|e| ApiError::internal(e.to_string()))?;

    // the unique constraints remain the arbiter under concurrent registration
    let user = repo
        .create(CreateUserDto {
            username,
            email,
            password_hash: Some(password_hash),
        })
        .await?;

    tracing::info!(user_id = user.id, "user registered");

    Ok((
        StatusCode::CREATED,
        Json(UserResponse {
            id: user.id,
            username: user.username,
            email: user.email,
        }),
    ))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(dto): Json<LoginDto>,
) -> ApiResult<impl IntoResponse> {
    let email = require_field(dto.email, "email")?;
    let password = require_field(dto.password, "password")?;

    let pool = state.pool()?;
    let repo = UserRepository::new(pool.clone());

    let user = repo
        .find_by_email(&email)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid email or password"))?;

    match verify_password(user.password_hash.as_deref(), &password) {
        VerifyOutcome::Verified => {}
        VerifyOutcome::Mismatch => {
            return Err(ApiError::unauthorized("Invalid email or password"));
        }
        VerifyOutcome::OAuthOnly => {
            return Err(ApiError::unauthorized(
                "This account signs in with Google",
            ));
        }
    }

    let access = state
        .tokens
        .issue_access(user.id)
        .map_err(|e| ApiError::internal(e.to_string()))?;
    let refresh = state
        .tokens
        .issue_refresh(user.id)
        .map_err(|e| ApiError::internal(e.to_string()))?;

    tracing::info!(user_id = user.id, "user logged in");

    Ok(Json(TokenPairResponse {
        access_token: access.token,
        refresh_token: refresh.token,
        user: UserResponse {
            id: user.id,
            username: user.username,
            email: user.email,
        },
    }))
}

/// POST /api/auth/refresh
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<impl IntoResponse> {
    let identity = state.gate.require_refresh(authorization(&headers)).await?;

    let access = state
        .tokens
        .issue_access(identity.user_id)
        .map_err(|e| ApiError::internal(e.to_string()))?;

    Ok(Json(AccessTokenResponse {
        access_token: access.token,
    }))
}

/// DELETE /api/auth/logout_access
pub async fn logout_access(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<impl IntoResponse> {
    let identity = state.gate.require_access(authorization(&headers)).await?;

    state
        .ledger
        .revoke(&identity.jti, identity.kind, Some(identity.user_id))
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?;

    Ok(Json(MessageResponse {
        message: "Access token revoked".into(),
    }))
}

/// DELETE /api/auth/logout_refresh
pub async fn logout_refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<impl IntoResponse> {
    let identity = state.gate.require_refresh(authorization(&headers)).await?;

    state
        .ledger
        .revoke(&identity.jti, identity.kind, Some(identity.user_id))
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?;

    Ok(Json(MessageResponse {
        message: "Refresh token revoked".into(),
    }))
}

/// GET /api/auth/me
pub async fn me(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<impl IntoResponse> {
    let identity = state.gate.require_access(authorization(&headers)).await?;

    let pool = state.pool()?;
    let repo = UserRepository::new(pool.clone());

    // the token can outlive its account
    let user = repo
        .find_by_id(identity.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User", identity.user_id))?;

    Ok(Json(UserResponse {
        id: user.id,
        username: user.username,
        email: user.email,
    }))
}

// DTOs

#[derive(Debug, Deserialize)]
pub struct RegisterDto {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginDto {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Id,
    pub username: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct TokenPairResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: UserResponse,
}

#[derive(Debug, Serialize)]
pub struct AccessTokenResponse {
    pub access_token: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_response_carries_user_alongside_tokens() {
        let response = TokenPairResponse {
            access_token: "a".into(),
            refresh_token: "r".into(),
            user: UserResponse {
                id: 1,
                username: "alice".into(),
                email: "alice@example.com".into(),
            },
        };

        let body = serde_json::to_value(&response).unwrap();
        assert_eq!(body["access_token"], "a");
        assert_eq!(body["refresh_token"], "r");
        assert_eq!(body["user"]["id"], 1);
        assert_eq!(body["user"]["username"], "alice");
        assert_eq!(body["user"]["email"], "alice@example.com");
    }

    #[test]
    fn test_require_field_rejects_blank_values() {
        assert!(require_field(Some("  ".into()), "username").is_err());
        assert!(require_field(None, "username").is_err());
        assert_eq!(require_field(Some("alice".into()), "username").unwrap(), "alice");
    }
}
