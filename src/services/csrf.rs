//! Double-submit anti-forgery tokens for the login form.
//!
//! The secret lives in an HttpOnly cookie; the page gets a token derived
//! from it. A token is `salt-hash` where
//! `hash = base64url(sha256("{salt}-{secret}"))`, so it cannot be minted
//! without the secret and dies with the cookie.

use axum::http::{header, HeaderMap};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use sha2::{Digest, Sha256};
use uuid::Uuid;

pub const SECRET_COOKIE: &str = "csrfSecret";

const SALT_LEN: usize = 8;

/// 32 random bytes, base64url.
pub fn new_secret() -> String {
    let mut bytes = [0u8; 32];
    bytes[..16].copy_from_slice(Uuid::new_v4().as_bytes());
    bytes[16..].copy_from_slice(Uuid::new_v4().as_bytes());
    URL_SAFE_NO_PAD.encode(bytes)
}

fn digest(salt: &str, secret: &str) -> String {
    let hash = Sha256::digest(format!("{salt}-{secret}").as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

pub fn create_token(secret: &str) -> String {
    let salt: String = Uuid::new_v4().simple().to_string().chars().take(SALT_LEN).collect();
    format!("{salt}-{}", digest(&salt, secret))
}

pub fn verify_token(secret: &str, token: &str) -> bool {
    let Some((salt, hash)) = token.split_once('-') else {
        return false;
    };
    if salt.is_empty() || secret.is_empty() {
        return false;
    }
    constant_time_eq(digest(salt, secret).as_bytes(), hash.as_bytes())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// `Set-Cookie` value carrying the secret.
pub fn secret_cookie(secret: &str, max_age_secs: i64, secure: bool) -> String {
    let mut cookie = format!("{SECRET_COOKIE}={secret}; HttpOnly; SameSite=Strict; Path=/; Max-Age={max_age_secs}");
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Reads the secret back from the request's `Cookie` headers.
pub fn secret_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SECRET_COOKIE)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
