use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::errors::{respond, AppError, AppJson, AppResult};
use crate::middleware::AuthUser;
use crate::services::credentials::Role;
use crate::services::{csrf, session};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/csrf-token", get(csrf_token))
        .route("/login", post(login))
        .route("/session", get(current_session))
}

#[derive(Debug, Serialize)]
struct CsrfTokenResponse {
    #[serde(rename = "csrfToken")]
    csrf_token: String,
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    #[serde(rename = "csrfToken")]
    csrf_token: Option<String>,
    username: Option<String>,
    password: Option<String>,
}

#[derive(Debug, Serialize)]
struct LoginResponse {
    role: Role,
    redirect: &'static str,
    token: String,
}

// GET /api/csrf-token
async fn csrf_token(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let secret = csrf::new_secret();
    let token = csrf::create_token(&secret);
    let cookie = csrf::secret_cookie(&secret, state.config.csrf.max_age_secs, state.config.is_production());

    (
        [(header::SET_COOKIE, cookie)],
        respond(StatusCode::OK, "Token CSRF", CsrfTokenResponse { csrf_token: token }),
    )
}

// POST /api/login
async fn login(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    AppJson(req): AppJson<LoginRequest>,
) -> AppResult<impl IntoResponse> {
    let token = req.csrf_token.filter(|t| !t.trim().is_empty());
    let (Some(token), Some(secret)) = (token, csrf::secret_from_headers(&headers)) else {
        return Err(AppError::Forbidden("Token CSRF tidak ditemukan".to_string()));
    };
    if !csrf::verify_token(&secret, token.trim()) {
        return Err(AppError::Forbidden("Token CSRF tidak valid".to_string()));
    }

    let wrong = || AppError::Unauthorized("Username atau password salah".to_string());
    let username = req.username.map(|u| u.trim().to_string()).filter(|u| !u.is_empty()).ok_or_else(wrong)?;
    let password = req.password.filter(|p| !p.is_empty()).ok_or_else(wrong)?;

    let credentials = state.credentials.clone();
    let checked_user = username.clone();
    let role = tokio::task::spawn_blocking(move || credentials.verify(&checked_user, &password))
        .await
        .map_err(|e| AppError::Internal(format!("credential check failed: {e}")))?
        .ok_or_else(|| {
            tracing::warn!("Failed login for {}", username);
            wrong()
        })?;

    let token = session::issue(&state.config.jwt, &username, role)
        .map_err(|e| AppError::Internal(format!("failed to sign session: {e}")))?;

    tracing::info!("{} logged in as {:?}", username, role);
    Ok(respond(
        StatusCode::OK,
        "Login berhasil",
        LoginResponse {
            role,
            redirect: role.redirect(),
            token,
        },
    ))
}

// GET /api/session
async fn current_session(user: AuthUser) -> impl IntoResponse {
    respond(StatusCode::OK, "Sesi aktif", user)
}
