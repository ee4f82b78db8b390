//! Persistent credential storage.
//!
//! The credential is split over three keys of the shared key-value store:
//! the access token, the refresh token and the JSON profile. They are always
//! cleared together.

use std::sync::Arc;

use api_types::user::TokenPair;
use engine::store::{KeyValueStore, read_json, write_json};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::Result;

pub const TOKEN_KEY: &str = "token";
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";
pub const USER_KEY: &str = "user";

pub(crate) const ALL_KEYS: [&str; 3] = [TOKEN_KEY, REFRESH_TOKEN_KEY, USER_KEY];

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Credential {
    pub access_token: String,
    pub refresh_token: String,
    pub profile: Profile,
}

#[derive(Clone)]
pub struct TokenStore {
    store: Arc<dyn KeyValueStore>,
}

impl TokenStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn access_token(&self) -> Result<Option<String>> {
        Ok(self.store.get(TOKEN_KEY)?.filter(|t| !t.is_empty()))
    }

    pub fn refresh_token(&self) -> Result<Option<String>> {
        Ok(self.store.get(REFRESH_TOKEN_KEY)?.filter(|t| !t.is_empty()))
    }

    /// Stored profile; an unreadable one is reported as absent.
    pub fn profile(&self) -> Result<Option<Profile>> {
        match read_json::<Profile>(self.store.as_ref(), USER_KEY) {
            Ok(profile) => Ok(profile),
            Err(engine::EngineError::Json(err)) => {
                warn!(%err, "stored user profile is corrupt");
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }

    pub fn save(&self, credential: &Credential) -> Result<()> {
        self.store.set(TOKEN_KEY, &credential.access_token)?;
        self.store.set(REFRESH_TOKEN_KEY, &credential.refresh_token)?;
        self.save_profile(&credential.profile)
    }

    pub fn save_profile(&self, profile: &Profile) -> Result<()> {
        write_json(self.store.as_ref(), USER_KEY, profile)?;
        Ok(())
    }

    /// Stores a refreshed token pair, keeping the profile.
    pub fn replace_tokens(&self, pair: &TokenPair) -> Result<()> {
        self.store.set(TOKEN_KEY, &pair.token)?;
        self.store.set(REFRESH_TOKEN_KEY, &pair.refresh_token)?;
        Ok(())
    }

    /// Removes the three credential keys in one write.
    pub fn clear(&self) -> Result<()> {
        self.store.remove_all(&ALL_KEYS)?;
        Ok(())
    }
}
