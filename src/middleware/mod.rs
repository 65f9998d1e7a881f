use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use serde::Serialize;
use std::sync::Arc;

use crate::config::JwtConfig;
use crate::errors::AppError;
use crate::services::credentials::Role;
use crate::services::session;
use crate::AppState;

/// Staff member identified by the bearer session token.
#[derive(Debug, Clone, Serialize)]
pub struct AuthUser {
    pub username: String,
    pub role: Role,
}

fn bearer_user(headers: &HeaderMap, jwt: &JwtConfig) -> Result<AuthUser, AppError> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Silakan login terlebih dahulu".to_string()))?;

    let claims = session::verify(jwt, token).map_err(|e| {
        tracing::debug!("rejected session token: {:?}", e);
        AppError::Unauthorized("Sesi tidak valid atau sudah berakhir".to_string())
    })?;

    Ok(AuthUser {
        username: claims.sub,
        role: claims.role,
    })
}

// Bearer session extractor
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        bearer_user(&parts.headers, &state.config.jwt)
    }
}

/// Gate for the staff routes when `ENABLE_AUTH` is on.
pub async fn require_session(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    bearer_user(request.headers(), &state.config.jwt)?;
    Ok(next.run(request).await)
}
