//! Session context: auth token, user profile and theme preference.
//!
//! Persisted through the store and observable through a watch channel, so
//! the provider and web layers share one explicit session object.

use crate::db::{DbError, Store};

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::watch;

const TOKEN_KEY: &str = "authToken";
const USER_PROFILE_KEY: &str = "userProfile";
const THEME_KEY: &str = "theme";

/// Signed-in user profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub user_id: String,
    pub email: String,
    pub username: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

/// What subscribers see after every change.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub logged_in: bool,
    pub user: Option<User>,
    pub theme: Theme,
}

pub struct Session {
    store: Arc<Store>,
    tx: watch::Sender<SessionState>,
}

impl Session {
    pub fn new(store: Arc<Store>) -> Self {
        let (tx, _) = watch::channel(SessionState::default());
        let session = Self { store, tx };
        session.publish();
        session
    }

    /// Bearer token, if signed in. Storage errors read as signed out.
    pub fn token(&self) -> Option<String> {
        match self.store.get_preference(TOKEN_KEY) {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                tracing::error!("Session: Failed to read token: {}", e);
                None
            }
        }
    }

    /// Stored profile. A malformed profile reads as no profile.
    pub fn profile(&self) -> Option<User> {
        let raw = match self.store.get_preference(USER_PROFILE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::error!("Session: Failed to read user profile: {}", e);
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                tracing::error!("Session: Error parsing stored user profile: {}", e);
                None
            }
        }
    }

    pub fn theme(&self) -> Theme {
        match self.store.get_preference(THEME_KEY) {
            Ok(Some(t)) if t == "dark" => Theme::Dark,
            Ok(_) => Theme::Light,
            Err(e) => {
                tracing::error!("Session: Failed to read theme: {}", e);
                Theme::Light
            }
        }
    }

    pub fn is_logged_in(&self) -> bool {
        self.token().is_some()
    }

    /// Store the token and profile returned by a successful login.
    pub fn sign_in(&self, token: &str, user: &User) -> Result<(), DbError> {
        let profile = serde_json::to_string(user)
            .map_err(|e| DbError::Validation(format!("unserializable profile: {}", e)))?;

        self.store.set_preference(TOKEN_KEY, token)?;
        self.store.set_preference(USER_PROFILE_KEY, &profile)?;
        tracing::info!("Session: {} signed in", user.username);

        self.publish();
        Ok(())
    }

    /// Tear down the session: token and profile are removed, theme is kept.
    pub fn logout(&self) -> Result<(), DbError> {
        self.store.delete_preference(TOKEN_KEY)?;
        self.store.delete_preference(USER_PROFILE_KEY)?;
        tracing::info!("Session: User logged out");

        self.publish();
        Ok(())
    }

    pub fn set_theme(&self, theme: Theme) -> Result<(), DbError> {
        self.store.set_preference(THEME_KEY, theme.as_str())?;
        self.publish();
        Ok(())
    }

    pub fn toggle_theme(&self) -> Result<Theme, DbError> {
        let next = self.theme().toggled();
        self.set_theme(next)?;
        Ok(next)
    }

    pub fn state(&self) -> SessionState {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.tx.subscribe()
    }

    fn publish(&self) {
        let state = SessionState {
            logged_in: self.is_logged_in(),
            user: self.profile(),
            theme: self.theme(),
        };
        self.tx.send_replace(state);
    }
}
