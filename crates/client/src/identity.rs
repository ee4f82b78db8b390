//! Normalization of the user identity returned at login.
//!
//! Depending on the server version the id is sent as `id`, `userId`,
//! `uuid`, `userUUID` or `user_id`, as a string or a number, or only inside
//! the access token. Everything is folded into one [`Profile::id`].

use api_types::user::LoginResponse;
use serde_json::Value;

use crate::{
    ClientError, Result,
    credentials::{Credential, Profile},
    jwt,
};

const UNDEFINED: &str = "undefined";

/// Id string from a JSON scalar, unless empty or the literal `"undefined"`.
pub fn usable_id(value: &Value) -> Option<String> {
    api_types::id::from_value(value).filter(|id| id != UNDEFINED)
}

fn usable(id: &str) -> bool {
    let id = id.trim();
    !id.is_empty() && id != UNDEFINED
}

/// Builds the credential to store from a login response.
pub fn credential_from_login(response: &LoginResponse) -> Result<Credential> {
    if response.token.trim().is_empty() || response.refresh_token.trim().is_empty() {
        return Err(ClientError::InvalidServerResponse(
            "login response carries no token".to_string(),
        ));
    }

    let id = [
        &response.id,
        &response.user_id,
        &response.uuid,
        &response.user_uuid,
        &response.user_id_snake,
    ]
    .into_iter()
    .flatten()
    .find_map(usable_id)
    .or_else(|| jwt::subject(&response.token))
    .ok_or_else(|| {
        ClientError::InvalidServerResponse("no usable user id in login response".to_string())
    })?;

    Ok(Credential {
        access_token: response.token.clone(),
        refresh_token: response.refresh_token.clone(),
        profile: Profile {
            id,
            email: response.email.clone(),
            display_name: response.display_name.clone(),
            is_admin: response.is_admin.unwrap_or(false),
        },
    })
}

/// Repairs a stored profile: a missing or unusable id is taken from the
/// token. Returns `None` when no id can be found.
pub fn restore_profile(stored: Option<Profile>, access_token: &str) -> Option<Profile> {
    match stored {
        Some(profile) if usable(&profile.id) => Some(profile),
        Some(profile) => jwt::subject(access_token).map(|id| Profile { id, ..profile }),
        None => jwt::subject(access_token).map(|id| Profile {
            id,
            email: None,
            display_name: None,
            is_admin: false,
        }),
    }
}
