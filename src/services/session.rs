use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::JwtConfig;
use crate::services::credentials::Role;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

pub fn issue(config: &JwtConfig, username: &str, role: Role) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let claims = Claims {
        sub: username.to_string(),
        role,
        iat: now.timestamp(),
        exp: (now + Duration::hours(config.expires_in_hours)).timestamp(),
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(config.secret.as_bytes()))
}

pub fn verify(config: &JwtConfig, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn issued_tokens_verify_with_the_same_secret() {
        let config = Config::for_tests().jwt;
        let token = issue(&config, "keuangan", Role::Finance).unwrap();
        let claims = verify(&config, &token).unwrap();
        assert_eq!(claims.sub, "keuangan");
        assert_eq!(claims.role, Role::Finance);

        let other = JwtConfig {
            secret: "another-secret".to_string(),
            expires_in_hours: 1,
        };
        assert!(verify(&other, &token).is_err());
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let config = JwtConfig {
            secret: "s".to_string(),
            expires_in_hours: -2,
        };
        let token = issue(&config, "admin", Role::Admin).unwrap();
        assert!(verify(&config, &token).is_err());
    }
}
