//! Staff accounts. Callers only see `CredentialStore`; the built-in store
//! holds the two configured accounts with bcrypt-hashed passwords.

use serde::{Deserialize, Serialize};

use crate::config::AccountsConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[serde(rename = "keuangan")]
    Finance,
}

impl Role {
    /// Landing page after login.
    pub fn redirect(&self) -> &'static str {
        match self {
            Role::Admin => "/dashboardadmin",
            Role::Finance => "/dashboardkeuangan",
        }
    }
}

pub trait CredentialStore: Send + Sync {
    /// Blocking: implementations may hash.
    fn verify(&self, username: &str, password: &str) -> Option<Role>;
}

struct Account {
    username: String,
    password_hash: String,
    role: Role,
}

pub struct StaticCredentials {
    accounts: Vec<Account>,
}

impl StaticCredentials {
    pub fn from_config(config: &AccountsConfig) -> Result<Self, bcrypt::BcryptError> {
        let account = |username: &str, password: &str, role| -> Result<Account, bcrypt::BcryptError> {
            Ok(Account {
                username: username.to_string(),
                password_hash: bcrypt::hash(password, config.bcrypt_cost)?,
                role,
            })
        };
        Ok(Self {
            accounts: vec![
                account(&config.admin_username, &config.admin_password, Role::Admin)?,
                account(&config.finance_username, &config.finance_password, Role::Finance)?,
            ],
        })
    }
}

impl CredentialStore for StaticCredentials {
    fn verify(&self, username: &str, password: &str) -> Option<Role> {
        let account = self.accounts.iter().find(|a| a.username == username)?;
        match bcrypt::verify(password, &account.password_hash) {
            Ok(true) => Some(account.role),
            Ok(false) => None,
            Err(e) => {
                tracing::error!("bcrypt verify failed for {}: {:?}", username, e);
                None
            }
        }
    }
}
