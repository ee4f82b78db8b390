//! Authenticated client for the budget REST API.
//!
//! [`api::ApiClient`] wraps every endpoint behind a request pipeline that
//! keeps the access token fresh. The workflows built on top of it
//! ([`session`], [`import`], [`estimations`]) persist their local state in
//! an [`engine::store::KeyValueStore`].

pub mod api;
pub mod auth;
pub mod autosave;
pub mod convert;
pub mod credentials;
mod error;
pub mod estimations;
pub mod identity;
pub mod import;
pub mod jwt;
pub mod navigation;
pub mod pipeline;
pub mod session;

pub use api::ApiClient;
pub use auth::{AuthState, Authenticator};
pub use credentials::{Credential, Profile, TokenStore};
pub use error::{ClientError, Result};
pub use import::{ImportReport, ImportWorkflow};
pub use navigation::{Navigator, Route};
pub use session::Session;
