use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::{Form, Json};
use serde::Deserialize;
use serde_json::json;

use super::overview::login_page;
use crate::error::{ApiError, ApiResult};
use crate::middleware::auth::{clear_session_cookie, issue_token, session_cookie, verify_password};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    password: String,
}

fn check(state: &AppState, password: &str) -> ApiResult<String> {
    if !verify_password(password, state.config())? {
        tracing::warn!("dashboard login rejected");
        return Err(ApiError::Unauthorized);
    }
    tracing::info!("dashboard login");
    issue_token(state.config())
}

/// JSON login. The token is returned and also set as the session cookie.
pub async fn login(State(state): State<AppState>, Json(req): Json<LoginRequest>) -> ApiResult<Response> {
    let token = check(&state, &req.password)?;
    let body = json!({
        "token": token,
        "expiresIn": state.config().token_ttl_minutes * 60,
    });
    Ok((
        [(header::SET_COOKIE, session_cookie(&token, state.config()))],
        Json(body),
    )
        .into_response())
}

/// Login from the HTML form on `/dashboard`.
pub async fn form_login(State(state): State<AppState>, Form(req): Form<LoginRequest>) -> ApiResult<Response> {
    match check(&state, &req.password) {
        Ok(token) => Ok((
            [(header::SET_COOKIE, session_cookie(&token, state.config()))],
            Redirect::to("/dashboard"),
        )
            .into_response()),
        Err(ApiError::Unauthorized) => Ok((
            StatusCode::UNAUTHORIZED,
            Html(login_page(Some("Contraseña incorrecta."))),
        )
            .into_response()),
        Err(other) => Err(other),
    }
}

pub async fn logout() -> impl IntoResponse {
    (
        StatusCode::NO_CONTENT,
        [(header::SET_COOKIE, clear_session_cookie())],
    )
}
