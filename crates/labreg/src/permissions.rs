//! Role-based permission matrix.
//!
//! The matrix is a JSON document listing the known roles and, for every
//! resource, which roles may perform each action:
//!
//! ```json
//! { "roles": ["guest", "student"],
//!   "resources": { "groups": { "view": ["guest", "student"], "join": ["student"] } } }
//! ```
//!
//! Anything not listed is denied.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::model::Role;
use crate::session::Session;
use crate::storage::Storage;

/// The matrix shipped with the crate.
pub const DEFAULT_MATRIX_JSON: &str = include_str!("permission_matrix.json");

/// Resource and action names used by the library.
pub mod names {
    /// Landing page and the development user list.
    pub const DASHBOARD: &str = "dashboard";
    /// Semesters, courses and labs.
    pub const CATALOG: &str = "catalog";
    /// Lab groups and seats.
    pub const GROUPS: &str = "groups";
    /// A student's lab enrollments.
    pub const ENROLLMENTS: &str = "enrollments";
    /// Absence records.
    pub const ABSENCES: &str = "absences";
    /// Student records and profiles.
    pub const STUDENTS_LIST: &str = "students_list";
    /// Professor records.
    pub const PROFESSORS_LIST: &str = "professors_list";
    /// Effective configuration.
    pub const CONFIG: &str = "config";
    /// Database administration.
    pub const DATABASE: &str = "database";

    /// `view` action.
    pub const VIEW: &str = "view";
    /// `join` action.
    pub const JOIN: &str = "join";
    /// `leave` action.
    pub const LEAVE: &str = "leave";
    /// `change` action.
    pub const CHANGE: &str = "change";
    /// `view_own` action.
    pub const VIEW_OWN: &str = "view_own";
    /// Read one's own student profile.
    pub const VIEW_OWN_PROFILE: &str = "view_own_profile";
    /// Update one's own student profile.
    pub const EDIT_OWN_PROFILE: &str = "edit_own_profile";
    /// `view_status` action.
    pub const VIEW_STATUS: &str = "view_status";
    /// `view_group` action.
    pub const VIEW_GROUP: &str = "view_group";
    /// `edit_group_absences` action.
    pub const EDIT_GROUP_ABSENCES: &str = "edit_group_absences";
    /// `manage` action.
    pub const MANAGE: &str = "manage";
    /// `stats` action.
    pub const STATS: &str = "stats";
}

/// Which roles may perform which actions on which resources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionMatrix {
    roles: Vec<String>,
    resources: BTreeMap<String, BTreeMap<String, Vec<String>>>,
}

impl Default for PermissionMatrix {
    fn default() -> Self {
        // The embedded document is covered by tests.
        Self::from_json(DEFAULT_MATRIX_JSON).unwrap_or_else(|_| Self {
            roles: Vec::new(),
            resources: BTreeMap::new(),
        })
    }
}

impl PermissionMatrix {
    /// Parse and validate a matrix document.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or an action grants a role
    /// that is not declared in `roles`.
    pub fn from_json(json: &str) -> Result<Self> {
        let matrix: Self = serde_json::from_str(json).map_err(|e| Error::PermissionMatrix {
            message: e.to_string(),
        })?;
        matrix.validate()?;
        Ok(matrix)
    }

    /// Load a matrix file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid matrix.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading permission matrix from {}", path.display());
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Load `path` if given, else the embedded matrix.
    ///
    /// # Errors
    ///
    /// Returns an error if a given file cannot be loaded.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Self::from_json(DEFAULT_MATRIX_JSON),
        }
    }

    fn validate(&self) -> Result<()> {
        for (resource, actions) in &self.resources {
            for (action, roles) in actions {
                if let Some(unknown) = roles.iter().find(|r| !self.roles.contains(*r)) {
                    return Err(Error::PermissionMatrix {
                        message: format!("{resource}.{action} grants undeclared role {unknown}"),
                    });
                }
            }
        }
        Ok(())
    }

    /// Declared role names.
    #[must_use]
    pub fn roles(&self) -> &[String] {
        &self.roles
    }

    /// Resources and their actions.
    #[must_use]
    pub fn resources(&self) -> &BTreeMap<String, BTreeMap<String, Vec<String>>> {
        &self.resources
    }

    /// Check if `role` may perform `resource.action`.
    #[must_use]
    pub fn has_permission(&self, role: Role, resource: &str, action: &str) -> bool {
        let role = role.as_str();
        if !self.roles.iter().any(|r| r == role) {
            return false;
        }
        self.resources
            .get(resource)
            .and_then(|actions| actions.get(action))
            .is_some_and(|allowed| allowed.iter().any(|r| r == role))
    }

    /// Gate an operation on the matrix.
    ///
    /// A missing session acts as `guest`. Returns the role that was checked.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PermissionDenied`] if the role lacks the permission.
    pub fn require(&self, session: Option<&Session>, resource: &str, action: &str) -> Result<Role> {
        let role = session.map_or(Role::Guest, |s| s.role);
        if self.has_permission(role, resource, action) {
            Ok(role)
        } else {
            warn!("Permission denied: {} tried to access {}.{}", role, resource, action);
            Err(Error::permission_denied(role, format!("{resource}.{action}")))
        }
    }
}

/// Work out a user's role.
///
/// The session's role wins when known. Otherwise a professor row with the
/// id makes the user a professor, a student row makes them a student, and
/// anyone else is a guest.
///
/// # Errors
///
/// Returns an error if the database lookup fails.
pub fn resolve_role(storage: &Storage, user_id: i64, session_role: Option<Role>) -> Result<Role> {
    if let Some(role) = session_role {
        return Ok(role);
    }
    if storage.professor(user_id)?.is_some() {
        return Ok(Role::Professor);
    }
    if storage.student(user_id)?.is_some() {
        return Ok(Role::Student);
    }
    Ok(Role::Guest)
}

/// Require an authenticated session holding one of `roles`.
///
/// # Errors
///
/// Returns [`Error::AuthenticationRequired`] without a session and
/// [`Error::PermissionDenied`] when the role is not allowed.
pub fn require_role<'s>(session: Option<&'s Session>, roles: &[Role]) -> Result<&'s Session> {
    let session = session.ok_or(Error::AuthenticationRequired)?;
    if roles.contains(&session.role) {
        Ok(session)
    } else {
        warn!(
            "Role denied: {} tried to access endpoint requiring {:?}",
            session.role, roles
        );
        Err(Error::permission_denied(
            session.role,
            format!("act without one of {roles:?}"),
        ))
    }
}
