//! Per-session user context
//!
//! Holds the signed-in account and display theme for one client session.
//! Created at session start, mutated on sign-in, sign-out and theme toggle,
//! and cleared on sign-out. Callers own and pass it explicitly.

use crate::accounts::{AccountStore, AccountSummary, SessionToken};
use crate::error::SleepwiseError;
use serde::{Deserialize, Serialize};

/// Display theme preference
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

/// State for one client session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionContext {
    token: Option<SessionToken>,
    theme: Theme,
}

impl SessionContext {
    pub fn new(theme: Theme) -> Self {
        Self { token: None, theme }
    }

    /// Log in through the account store and remember the issued token
    pub fn sign_in(
        &mut self,
        accounts: &AccountStore,
        email: &str,
        password: &str,
    ) -> Result<&AccountSummary, SleepwiseError> {
        let session = accounts.login(email, password)?;
        Ok(&self.token.insert(session).account)
    }

    /// Adopt a token issued by an earlier login
    pub fn resume(
        &mut self,
        accounts: &AccountStore,
        token: &str,
    ) -> Result<&AccountSummary, SleepwiseError> {
        let session = accounts.resume(token)?;
        Ok(&self.token.insert(session).account)
    }

    /// Revoke the token (if any) and forget the account; the theme is kept
    pub fn sign_out(&mut self, accounts: &AccountStore) -> Result<(), SleepwiseError> {
        if let Some(session) = self.token.take() {
            accounts.logout(&session.token)?;
        }
        Ok(())
    }

    pub fn toggle_theme(&mut self) -> Theme {
        self.theme = self.theme.toggled();
        self.theme
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn account(&self) -> Option<&AccountSummary> {
        self.token.as_ref().map(|t| &t.account)
    }

    /// Bearer token for authenticated requests
    pub fn bearer(&self) -> Option<&str> {
        self.token.as_ref().map(|t| t.token.as_str())
    }

    pub fn is_signed_in(&self) -> bool {
        self.token.is_some()
    }
}
