//! Authenticated identities and the development login stand-in.
//!
//! Production deployments authenticate through CAS in the web front end and
//! hand the resulting identity to the library as a [`Session`]. For local
//! work the [`DevDirectory`] issues sessions for a fixed set of fake users.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::model::Role;

/// How users authenticate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    /// Central Authentication Service (production).
    #[default]
    Cas,
    /// Fake users from the configuration. Never enable in production.
    Dev,
}

impl fmt::Display for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cas => write!(f, "cas"),
            Self::Dev => write!(f, "dev"),
        }
    }
}

/// An authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Person id: register number for students, staff id otherwise.
    pub user_id: i64,
    /// Role granted at login.
    pub role: Role,
    /// Display name.
    pub name: String,
    /// Client address, when the front end reports one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_addr: Option<String>,
}

impl Session {
    /// A session without a client address.
    #[must_use]
    pub fn new(user_id: i64, role: Role, name: impl Into<String>) -> Self {
        Self {
            user_id,
            role,
            name: name.into(),
            remote_addr: None,
        }
    }

    /// Attach the client address reported by the front end.
    #[must_use]
    pub fn with_remote_addr(mut self, addr: impl Into<String>) -> Self {
        self.remote_addr = Some(addr.into());
        self
    }
}

/// A fake user available in development mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevUser {
    /// Display name.
    pub name: String,
    /// Role the login grants.
    pub role: Role,
    /// Register number or staff id.
    pub id: i64,
    /// Contact email.
    pub email: String,
}

/// The built-in fake users.
#[must_use]
pub fn default_dev_users() -> BTreeMap<String, DevUser> {
    let user = |name: &str, role, id, email: &str| DevUser {
        name: name.to_string(),
        role,
        id,
        email: email.to_string(),
    };
    BTreeMap::from([
        (
            "student1".to_string(),
            user("Test Student", Role::Student, 13628, "student1@uoi.gr"),
        ),
        (
            "prof1".to_string(),
            user("Test Professor", Role::Professor, 1, "prof1@uoi.gr"),
        ),
        (
            "admin1".to_string(),
            user("Test Admin", Role::Admin, 9001, "admin1@uoi.gr"),
        ),
    ])
}

/// Issues sessions for configured fake users.
#[derive(Debug, Clone)]
pub struct DevDirectory {
    mode: AuthMode,
    users: BTreeMap<String, DevUser>,
}

impl DevDirectory {
    /// A directory over `users`; logins work only in [`AuthMode::Dev`].
    #[must_use]
    pub fn new(mode: AuthMode, users: BTreeMap<String, DevUser>) -> Self {
        Self { mode, users }
    }

    /// Usernames and their fake identities.
    #[must_use]
    pub fn users(&self) -> &BTreeMap<String, DevUser> {
        &self.users
    }

    /// Log in as a fake user.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DevLoginDisabled`] outside development mode and
    /// [`Error::UserNotRegistered`] for unknown usernames.
    pub fn login(&self, username: &str) -> Result<Session> {
        if self.mode != AuthMode::Dev {
            warn!(username, "Development login attempted in cas mode");
            return Err(Error::DevLoginDisabled);
        }
        let user = self
            .users
            .get(username)
            .ok_or_else(|| Error::UserNotRegistered {
                username: username.to_string(),
            })?;
        info!(username, role = %user.role, "Development login");
        Ok(Session::new(user.id, user.role, user.name.clone()))
    }
}
