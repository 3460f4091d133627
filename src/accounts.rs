//! Account registration and login
//!
//! Passwords are stored as Argon2id PHC strings with a random per-account salt.
//! A successful login issues an opaque session token that expires after
//! [`SESSION_TTL_HOURS`] hours. Live sessions are saved with the accounts so a
//! token stays valid across processes until it expires or is revoked.

use crate::error::SleepwiseError;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

/// Lifetime of a session token
pub const SESSION_TTL_HOURS: i64 = 2;

const TOKEN_PREFIX: &str = "sw-";

/// A registered account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    /// Display handle chosen at signup
    pub user_id: String,
    password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Public view of an account, safe to hand to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSummary {
    pub id: Uuid,
    pub email: String,
    pub user_id: String,
}

impl From<&Account> for AccountSummary {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            email: account.email.clone(),
            user_id: account.user_id.clone(),
        }
    }
}

/// Token issued on login
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub account: AccountSummary,
}

impl SessionToken {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// On-disk form of the account store
#[derive(Debug, Default, Serialize, Deserialize)]
struct AccountsSnapshot {
    accounts: Vec<Account>,
    #[serde(default)]
    sessions: Vec<SessionToken>,
}

/// Account store with session tracking
pub struct AccountStore {
    accounts: RwLock<Vec<Account>>,
    sessions: RwLock<HashMap<String, SessionToken>>,
    hasher: Argon2<'static>,
}

impl Default for AccountStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AccountStore {
    /// Create a store using default Argon2id parameters
    pub fn new() -> Self {
        Self::with_hasher(Argon2::default())
    }

    /// Create a store with custom Argon2id cost (memory in KiB, iterations)
    pub fn with_cost(memory_kib: u32, iterations: u32) -> Result<Self, SleepwiseError> {
        let params = Params::new(memory_kib, iterations, 1, None)
            .map_err(|e| SleepwiseError::CredentialError(e.to_string()))?;
        Ok(Self::with_hasher(Argon2::new(
            Algorithm::Argon2id,
            Version::V0x13,
            params,
        )))
    }

    fn with_hasher(hasher: Argon2<'static>) -> Self {
        Self {
            accounts: RwLock::new(Vec::new()),
            sessions: RwLock::new(HashMap::new()),
            hasher,
        }
    }

    /// Load accounts and their sessions from a JSON snapshot
    pub fn load_accounts(&mut self, json: &str) -> Result<(), SleepwiseError> {
        let snapshot: AccountsSnapshot = serde_json::from_str(json)?;
        let sessions = snapshot
            .sessions
            .into_iter()
            .map(|session| (session.token.clone(), session))
            .collect();

        self.accounts = RwLock::new(snapshot.accounts);
        self.sessions = RwLock::new(sessions);
        Ok(())
    }

    /// Save accounts and unexpired sessions to a JSON snapshot
    pub fn save_accounts(&self) -> Result<String, SleepwiseError> {
        self.save_accounts_at(Utc::now())
    }

    fn save_accounts_at(&self, now: DateTime<Utc>) -> Result<String, SleepwiseError> {
        let accounts = self.accounts.read().map_err(poisoned)?;
        let mut sessions: Vec<SessionToken> = self
            .sessions
            .read()
            .map_err(poisoned)?
            .values()
            .filter(|session| !session.is_expired_at(now))
            .cloned()
            .collect();
        sessions.sort_by(|a, b| a.expires_at.cmp(&b.expires_at));

        let snapshot = AccountsSnapshot {
            accounts: accounts.to_vec(),
            sessions,
        };
        Ok(serde_json::to_string_pretty(&snapshot)?)
    }

    /// Register a new account
    pub fn register(
        &self,
        email: &str,
        user_id: &str,
        password: &str,
    ) -> Result<AccountSummary, SleepwiseError> {
        let mut accounts = self.accounts.write().map_err(poisoned)?;
        if accounts.iter().any(|a| a.email == email) {
            return Err(SleepwiseError::UserExists);
        }

        let account = Account {
            id: Uuid::new_v4(),
            email: email.to_string(),
            user_id: user_id.to_string(),
            password_hash: self.hash_password(password)?,
            created_at: Utc::now(),
        };
        let summary = AccountSummary::from(&account);
        accounts.push(account);

        tracing::info!(account = %summary.id, "account registered");
        Ok(summary)
    }

    /// Verify credentials and issue a session token
    pub fn login(&self, email: &str, password: &str) -> Result<SessionToken, SleepwiseError> {
        self.login_at(email, password, Utc::now())
    }

    fn login_at(
        &self,
        email: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<SessionToken, SleepwiseError> {
        let summary = {
            let accounts = self.accounts.read().map_err(poisoned)?;
            let account = accounts
                .iter()
                .find(|a| a.email == email)
                .ok_or(SleepwiseError::UserNotFound)?;

            if !self.verify_password(password, &account.password_hash)? {
                tracing::warn!(account = %account.id, "login rejected");
                return Err(SleepwiseError::InvalidPassword);
            }
            AccountSummary::from(account)
        };

        let session = SessionToken {
            token: format!("{TOKEN_PREFIX}{}", Uuid::new_v4().simple()),
            expires_at: now + Duration::hours(SESSION_TTL_HOURS),
            account: summary,
        };

        self.sessions
            .write()
            .map_err(poisoned)?
            .insert(session.token.clone(), session.clone());
        Ok(session)
    }

    /// Resolve a live token to its account
    pub fn authenticate(&self, token: &str) -> Result<AccountSummary, SleepwiseError> {
        self.resume(token).map(|session| session.account)
    }

    /// Look up the live session behind a token
    pub fn resume(&self, token: &str) -> Result<SessionToken, SleepwiseError> {
        self.resume_at(token, Utc::now())
    }

    fn resume_at(&self, token: &str, now: DateTime<Utc>) -> Result<SessionToken, SleepwiseError> {
        let mut sessions = self.sessions.write().map_err(poisoned)?;
        match sessions.get(token) {
            Some(session) if !session.is_expired_at(now) => Ok(session.clone()),
            Some(_) => {
                sessions.remove(token);
                tracing::debug!("expired session dropped");
                Err(SleepwiseError::SessionExpired)
            }
            None => Err(SleepwiseError::SessionExpired),
        }
    }

    /// Revoke a session token; unknown tokens are ignored
    pub fn logout(&self, token: &str) -> Result<(), SleepwiseError> {
        self.sessions.write().map_err(poisoned)?.remove(token);
        Ok(())
    }

    fn hash_password(&self, password: &str) -> Result<String, SleepwiseError> {
        let mut salt_bytes = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut salt_bytes);
        let salt = SaltString::encode_b64(&salt_bytes)
            .map_err(|e| SleepwiseError::CredentialError(e.to_string()))?;

        self.hasher
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| SleepwiseError::CredentialError(e.to_string()))
    }

    fn verify_password(&self, password: &str, stored: &str) -> Result<bool, SleepwiseError> {
        let parsed =
            PasswordHash::new(stored).map_err(|e| SleepwiseError::CredentialError(e.to_string()))?;
        Ok(self
            .hasher
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }
}

fn poisoned<T>(_: T) -> SleepwiseError {
    SleepwiseError::StorageError("account store lock poisoned".into())
}
