//! Sign-in, sign-up, sign-out and session restore.

use api_types::user::RegisterRequest;
use tracing::{info, warn};

use crate::{
    ClientError, Result,
    api::ApiClient,
    credentials::Profile,
    identity::{credential_from_login, restore_profile},
};

#[derive(Clone)]
pub struct Session {
    api: ApiClient,
}

impl Session {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Logs in and persists the normalized credential. Nothing is stored
    /// when the response carries no usable identity.
    pub async fn login(&self, email: &str, password: &str) -> Result<Profile> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(ClientError::Validation(
                "email and password are required".to_string(),
            ));
        }
        let response = self.api.login(email, password).await?;
        let mut credential = credential_from_login(&response)?;
        if credential.profile.email.is_none() {
            credential.profile.email = Some(email.to_string());
        }
        self.api.tokens().save(&credential)?;
        info!(user = %credential.profile.id, "signed in");
        Ok(credential.profile)
    }

    pub async fn register(&self, email: &str, password: &str, display_name: &str) -> Result<()> {
        let (email, display_name) = (email.trim(), display_name.trim());
        if email.is_empty() || password.is_empty() || display_name.is_empty() {
            return Err(ClientError::Validation(
                "email, password and display name are required".to_string(),
            ));
        }
        self.api
            .register(&RegisterRequest {
                email: email.to_string(),
                password: password.to_string(),
                display_name: display_name.to_string(),
            })
            .await?;
        info!(%email, "account created");
        Ok(())
    }

    pub fn logout(&self) -> Result<()> {
        self.api.authenticator().sign_out()?;
        info!("signed out");
        Ok(())
    }

    /// Restores a previous session: the token is refreshed when needed and
    /// the stored profile repaired from the token claims. Any failure leaves
    /// the store without credentials.
    pub async fn restore(&self) -> Result<Profile> {
        let token = match self.api.authenticator().ensure_valid_token().await {
            Ok(token) => token,
            Err(err) => {
                // A half-written credential (token without refresh token) is dropped too.
                self.api.authenticator().sign_out()?;
                return Err(err);
            }
        };
        let stored = self.api.tokens().profile()?;
        match restore_profile(stored, &token) {
            Some(profile) => {
                self.api.tokens().save_profile(&profile)?;
                Ok(profile)
            }
            None => {
                warn!("stored session has no usable user id");
                self.api.authenticator().invalidate()?;
                Err(ClientError::SessionExpired)
            }
        }
    }

    /// Profile of the signed-in user, without touching the network.
    pub fn profile(&self) -> Result<Option<Profile>> {
        if self.api.tokens().access_token()?.is_none() {
            return Ok(None);
        }
        self.api.tokens().profile()
    }
}
