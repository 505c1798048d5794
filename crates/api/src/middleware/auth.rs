//! Admin sessions: a JWT carried as a bearer token or in a cookie.

use argon2::password_hash::{PasswordHash, PasswordVerifier};
use argon2::Argon2;
use axum::extract::{FromRequestParts, OptionalFromRequestParts};
use axum::http::request::Parts;
use axum::RequestPartsExt;
use axum_extra::headers::authorization::Bearer;
use axum_extra::headers::{Authorization, Cookie};
use axum_extra::TypedHeader;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::error::ApiError;
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "sobremesa_admin";
const ADMIN_SUBJECT: &str = "admin";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

pub fn issue_token(config: &AppConfig) -> Result<String, ApiError> {
    let now = Utc::now();
    let claims = Claims {
        sub: ADMIN_SUBJECT.to_string(),
        iat: now.timestamp(),
        exp: (now + Duration::minutes(config.token_ttl_minutes)).timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(format!("token signing failed: {e}")))
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, ApiError> {
    decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &Validation::default())
        .map(|data| data.claims)
        .map_err(|e| {
            tracing::debug!(error = %e, "rejected admin token");
            ApiError::Unauthorized
        })
}

/// Check `password` against the configured argon2 hash. Without a hash
/// nobody can log in.
pub fn verify_password(password: &str, config: &AppConfig) -> Result<bool, ApiError> {
    let Some(hash) = config.admin_password_hash.as_deref() else {
        tracing::warn!("login attempted but ADMIN_PASSWORD_HASH is not set");
        return Ok(false);
    };
    let parsed = PasswordHash::new(hash).map_err(|e| ApiError::Internal(format!("invalid password hash: {e}")))?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(ApiError::Internal(format!("password verification failed: {e}"))),
    }
}

/// `Set-Cookie` value carrying a fresh session token.
pub fn session_cookie(token: &str, config: &AppConfig) -> String {
    format!(
        "{SESSION_COOKIE}={token}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
        config.token_ttl_minutes * 60
    )
}

pub fn clear_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0")
}

/// An authenticated dashboard user. Extracting it rejects with 401 when
/// neither an `Authorization: Bearer` header nor the session cookie holds a
/// valid token.
#[derive(Debug, Clone)]
pub struct AdminSession {
    pub claims: Claims,
}

async fn token_from(parts: &mut Parts) -> Option<String> {
    if let Ok(TypedHeader(Authorization(bearer))) = parts.extract::<TypedHeader<Authorization<Bearer>>>().await {
        return Some(bearer.token().to_string());
    }
    let TypedHeader(cookies) = parts.extract::<TypedHeader<Cookie>>().await.ok()?;
    cookies.get(SESSION_COOKIE).map(str::to_string)
}

impl FromRequestParts<AppState> for AdminSession {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = token_from(parts).await.ok_or(ApiError::Unauthorized)?;
        let claims = verify_token(&token, &state.config().jwt_secret)?;
        Ok(AdminSession { claims })
    }
}

impl OptionalFromRequestParts<AppState> for AdminSession {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Option<Self>, Self::Rejection> {
        let Some(token) = token_from(parts).await else {
            return Ok(None);
        };
        Ok(verify_token(&token, &state.config().jwt_secret)
            .ok()
            .map(|claims| AdminSession { claims }))
    }
}
