//! Access-token lifecycle.
//!
//! ```text
//! NoCredential --login--> Valid --exp passed--> Expired --> Refreshing
//!                          ^                                  |    |
//!                          +------------- ok -----------------+    +-- error --> Invalid
//! ```
//!
//! Only one refresh runs at a time: callers that observe an expired token
//! queue on the refresh lock, and whoever gets it after a successful refresh
//! finds the fresh token in the store and uses it directly.

use std::sync::{Arc, Mutex};

use api_types::user::TokenPair;
use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info, warn};

use crate::{ClientError, Result, credentials::TokenStore, jwt};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthState {
    NoCredential,
    Valid,
    Expired,
    Refreshing,
    Invalid,
}

/// Exchanges a refresh token for a new token pair.
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair>;
}

pub struct Authenticator {
    tokens: TokenStore,
    refresher: Arc<dyn TokenRefresher>,
    refresh_lock: tokio::sync::Mutex<()>,
    state: Mutex<AuthState>,
}

impl Authenticator {
    pub fn new(tokens: TokenStore, refresher: Arc<dyn TokenRefresher>) -> Self {
        Self {
            tokens,
            refresher,
            refresh_lock: tokio::sync::Mutex::new(()),
            state: Mutex::new(AuthState::NoCredential),
        }
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    pub fn state(&self) -> AuthState {
        self.state
            .lock()
            .map(|state| *state)
            .unwrap_or(AuthState::Invalid)
    }

    fn set_state(&self, next: AuthState) {
        if let Ok(mut state) = self.state.lock() {
            *state = next;
        }
    }

    /// Returns an access token that has not expired yet, refreshing it at
    /// most once.
    pub async fn ensure_valid_token(&self) -> Result<String> {
        let (Some(access), Some(_)) = (self.tokens.access_token()?, self.tokens.refresh_token()?)
        else {
            self.set_state(AuthState::NoCredential);
            return Err(ClientError::Unauthenticated);
        };
        if !jwt::is_expired(&access, Utc::now()) {
            self.set_state(AuthState::Valid);
            return Ok(access);
        }

        self.set_state(AuthState::Expired);
        let _guard = self.refresh_lock.lock().await;

        // Someone may have refreshed (or given up) while we waited.
        let Some(refresh_token) = self.tokens.refresh_token()? else {
            self.set_state(AuthState::Invalid);
            return Err(ClientError::SessionExpired);
        };
        if let Some(current) = self.tokens.access_token()?
            && !jwt::is_expired(&current, Utc::now())
        {
            debug!("token refreshed by a concurrent request");
            self.set_state(AuthState::Valid);
            return Ok(current);
        }

        self.set_state(AuthState::Refreshing);
        match self.refresher.refresh(&refresh_token).await {
            Ok(pair) => {
                self.tokens.replace_tokens(&pair)?;
                self.set_state(AuthState::Valid);
                info!("access token refreshed");
                Ok(pair.token)
            }
            Err(err) => {
                warn!(%err, "token refresh failed, clearing credentials");
                self.invalidate()?;
                Err(ClientError::SessionExpired)
            }
        }
    }

    /// Drops every stored credential.
    pub fn invalidate(&self) -> Result<()> {
        self.set_state(AuthState::Invalid);
        self.tokens.clear()
    }

    pub fn sign_out(&self) -> Result<()> {
        self.set_state(AuthState::NoCredential);
        self.tokens.clear()
    }
}
