use serde::Deserialize;
use std::env;
use std::str::FromStr;
use thiserror::Error;

use crate::services::pricing::MAX_HOURLY_RATE;

// Top-level configuration, one section per concern
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub pricing: PricingConfig,
    pub sweep: SweepConfig,
    pub jwt: JwtConfig,
    pub csrf: CsrfConfig,
    pub accounts: AccountsConfig,
    pub features: FeatureFlags,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub rust_log: String,
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

// No url means the in-memory store
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub pool_size: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PricingConfig {
    pub hourly_rate: i64,
    pub utc_offset_hours: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SweepConfig {
    pub interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub expires_in_hours: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CsrfConfig {
    pub max_age_secs: i64,
}

// The two staff accounts the login screen knows about
#[derive(Debug, Clone, Deserialize)]
pub struct AccountsConfig {
    pub admin_username: String,
    pub admin_password: String,
    pub finance_username: String,
    pub finance_password: String,
    pub bcrypt_cost: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeatureFlags {
    pub enable_auth: bool,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be set")]
    Missing { name: &'static str },
    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parse_var<T: FromStr>(name: &'static str, default: &str) -> Result<T, ConfigError> {
    let value = var_or(name, default);
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid { name, value })
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let environment = var_or("ENVIRONMENT", "development");
        let is_production = environment == "production";

        let jwt_secret = match env::var("JWT_SECRET") {
            Ok(secret) if !secret.trim().is_empty() => secret,
            _ if is_production => return Err(ConfigError::Missing { name: "JWT_SECRET" }),
            // Sessions do not survive a restart in development
            _ => format!("{}{}", uuid::Uuid::new_v4().simple(), uuid::Uuid::new_v4().simple()),
        };

        let log_format = match var_or("LOG_FORMAT", "pretty").to_lowercase().as_str() {
            "pretty" => LogFormat::Pretty,
            "json" => LogFormat::Json,
            other => {
                return Err(ConfigError::Invalid {
                    name: "LOG_FORMAT",
                    value: other.to_string(),
                })
            }
        };

        let hourly_rate = check_hourly_rate(parse_var("HOURLY_RATE", "1000000")?)?;

        let utc_offset_hours: i32 = parse_var("UTC_OFFSET_HOURS", "7")?;
        if !(-12..=14).contains(&utc_offset_hours) {
            return Err(ConfigError::Invalid {
                name: "UTC_OFFSET_HOURS",
                value: utc_offset_hours.to_string(),
            });
        }

        Ok(Config {
            app: AppConfig {
                host: var_or("HOST", "0.0.0.0"),
                port: parse_var("PORT", "8000")?,
                environment,
                rust_log: var_or("RUST_LOG", "gedung_booking=debug,tower_http=debug"),
                log_format,
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").ok().filter(|url| !url.trim().is_empty()),
                pool_size: parse_var("DB_POOL_SIZE", "10")?,
            },
            pricing: PricingConfig {
                hourly_rate,
                utc_offset_hours,
            },
            sweep: SweepConfig {
                interval_secs: parse_var("SWEEP_INTERVAL_SECS", "300")?,
            },
            jwt: JwtConfig {
                secret: jwt_secret,
                expires_in_hours: parse_var("JWT_EXPIRES_IN_HOURS", "8")?,
            },
            csrf: CsrfConfig {
                max_age_secs: parse_var("CSRF_MAX_AGE_SECS", "3600")?,
            },
            accounts: AccountsConfig {
                admin_username: var_or("ADMIN_USERNAME", "admin"),
                admin_password: var_or("ADMIN_PASSWORD", "admin123"),
                finance_username: var_or("FINANCE_USERNAME", "keuangan"),
                finance_password: var_or("FINANCE_PASSWORD", "keuangan123"),
                bcrypt_cost: parse_var("BCRYPT_COST", &bcrypt::DEFAULT_COST.to_string())?,
            },
            features: FeatureFlags {
                enable_auth: parse_var("ENABLE_AUTH", "false")?,
            },
        })
    }

    pub fn is_production(&self) -> bool {
        self.app.environment == "production"
    }

    /// Configuration for tests and local tooling: in-memory store, cheap
    /// bcrypt, auth gate off.
    pub fn for_tests() -> Self {
        Config {
            app: AppConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                environment: "test".to_string(),
                rust_log: "gedung_booking=debug".to_string(),
                log_format: LogFormat::Pretty,
            },
            database: DatabaseConfig {
                url: None,
                pool_size: 1,
            },
            pricing: PricingConfig {
                hourly_rate: crate::services::pricing::HOURLY_RATE,
                utc_offset_hours: 7,
            },
            sweep: SweepConfig { interval_secs: 300 },
            jwt: JwtConfig {
                secret: "test-secret-with-enough-entropy".to_string(),
                expires_in_hours: 1,
            },
            csrf: CsrfConfig { max_age_secs: 3600 },
            accounts: AccountsConfig {
                admin_username: "admin".to_string(),
                admin_password: "admin123".to_string(),
                finance_username: "keuangan".to_string(),
                finance_password: "keuangan123".to_string(),
                bcrypt_cost: 4,
            },
            features: FeatureFlags { enable_auth: false },
        }
    }
}

fn check_hourly_rate(rate: i64) -> Result<i64, ConfigError> {
    if rate <= 0 || rate > MAX_HOURLY_RATE {
        return Err(ConfigError::Invalid {
            name: "HOURLY_RATE",
            value: rate.to_string(),
        });
    }
    Ok(rate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_var_reports_the_offending_value() {
        env::set_var("GEDUNG_TEST_PORT", "eighty");
        let err = parse_var::<u16>("GEDUNG_TEST_PORT", "8000").unwrap_err();
        assert_eq!(err.to_string(), "GEDUNG_TEST_PORT has an invalid value: eighty");
        env::remove_var("GEDUNG_TEST_PORT");
    }

    #[test]
    fn hourly_rate_must_be_positive_and_bounded() {
        assert_eq!(check_hourly_rate(1_000_000).unwrap(), 1_000_000);
        assert!(check_hourly_rate(0).is_err());
        assert!(check_hourly_rate(i64::MAX).is_err());
        assert!(check_hourly_rate(MAX_HOURLY_RATE).is_ok());
    }

    #[test]
    fn parse_var_falls_back_to_default() {
        let value: u64 = parse_var("GEDUNG_TEST_UNSET_VALUE", "300").unwrap();
        assert_eq!(value, 300);
    }
}
