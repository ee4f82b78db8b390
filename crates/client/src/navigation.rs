//! Screen routing and the redirect to the login screen.

use std::fmt;

use tracing::info;

use crate::{ClientError, Result, credentials::TokenStore};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Route {
    Login,
    Register,
    Dashboard,
    Transactions,
    Categories,
    Analytics,
    Estimations,
    Savings,
    Rules,
    Import,
}

impl Route {
    /// Routes reachable without credentials.
    pub fn is_public(self) -> bool {
        matches!(self, Self::Login | Self::Register)
    }

    pub fn path(self) -> &'static str {
        match self {
            Self::Login => "/login",
            Self::Register => "/register",
            Self::Dashboard => "/",
            Self::Transactions => "/transactions",
            Self::Categories => "/categories",
            Self::Analytics => "/analytics",
            Self::Estimations => "/estimations",
            Self::Savings => "/epargne",
            Self::Rules => "/rules",
            Self::Import => "/import",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

pub struct Navigator {
    current: Route,
    tokens: TokenStore,
}

impl Navigator {
    pub fn new(tokens: TokenStore, start: Route) -> Self {
        Self {
            current: start,
            tokens,
        }
    }

    pub fn current(&self) -> Route {
        self.current
    }

    /// Moves to `route`. Private routes without a stored token end up on
    /// the login screen.
    pub fn navigate(&mut self, route: Route) -> Result<Route> {
        if !route.is_public() && self.tokens.access_token()?.is_none() {
            self.current = Route::Login;
        } else {
            self.current = route;
        }
        Ok(self.current)
    }

    /// Clears the credentials and shows the login screen. Does nothing when
    /// already on a public screen, so concurrent failures redirect once.
    pub fn redirect_to_login(&mut self) -> Result<bool> {
        if self.current.is_public() {
            return Ok(false);
        }
        self.tokens.clear()?;
        info!(from = %self.current, "redirecting to login");
        self.current = Route::Login;
        Ok(true)
    }

    /// Routes an error: auth failures redirect, the rest is left to the
    /// caller. Returns whether the error was consumed.
    pub fn handle_error(&mut self, err: &ClientError) -> Result<bool> {
        if !err.is_auth() {
            return Ok(false);
        }
        self.redirect_to_login()?;
        Ok(true)
    }
}
