//! Error types for labreg.
//!
//! This module defines all error types used throughout the labreg crate.
//! Registration rejections are ordinary variants here: each one carries a
//! stable machine code (see [`Error::error_type`]) that front ends can hand
//! back to clients unchanged.

use std::path::PathBuf;
use thiserror::Error;

use crate::model::{GroupId, LabId, Role, StudentId};
use crate::registration::Occupancy;

/// The main error type for labreg operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    /// The permission matrix file could not be parsed or is inconsistent.
    #[error("invalid permission matrix: {message}")]
    PermissionMatrix {
        /// Description of the problem.
        message: String,
    },

    // === Authentication / Authorization Errors ===
    /// The operation needs an authenticated session.
    #[error("authentication required")]
    AuthenticationRequired,

    /// The session's role may not perform the operation.
    #[error("insufficient permissions to {action}")]
    PermissionDenied {
        /// Role that attempted the operation.
        role: Role,
        /// What was attempted (`resource.action` or a description).
        action: String,
    },

    /// The identity is not known to the portal.
    #[error("user not registered: {username}")]
    UserNotRegistered {
        /// Login name that was looked up.
        username: String,
    },

    /// Development login was attempted while CAS authentication is active.
    #[error("development login is disabled (auth mode is cas)")]
    DevLoginDisabled,

    // === Registration Errors ===
    /// The lab does not exist.
    #[error("lab {0} not found")]
    LabNotFound(LabId),

    /// The group does not exist.
    #[error("group {0} not found")]
    GroupNotFound(GroupId),

    /// The group is not attached to any lab.
    #[error("no lab associated with group {0}")]
    NoLabForGroup(GroupId),

    /// The registration deadline of the lab has passed.
    #[error("registration for lab {lab_id} closed on {limit}")]
    RegistrationClosed {
        /// Lab whose period is over.
        lab_id: LabId,
        /// The configured limit, as stored.
        limit: String,
    },

    /// The target group has no free seats.
    #[error("group {group_id} has no open seats ({}/{})", .occupancy.current, .occupancy.max)]
    GroupFull {
        /// The full group.
        group_id: GroupId,
        /// Occupancy at the time of the check.
        occupancy: Occupancy,
    },

    /// The student already sits in the requested group.
    #[error("student {am} is already enrolled in group {group_id}")]
    AlreadyEnrolled {
        /// Student register number.
        am: StudentId,
        /// The group.
        group_id: GroupId,
    },

    /// The student holds another group of the same lab this year.
    #[error("student {am} is enrolled in group {current_group} of this lab; change group instead")]
    UseChangeGroup {
        /// Student register number.
        am: StudentId,
        /// Group the student currently holds.
        current_group: GroupId,
    },

    /// The student does not hold the referenced group enrollment.
    #[error("student {am} is not enrolled in group {group_id}")]
    NotEnrolled {
        /// Student register number.
        am: StudentId,
        /// The group.
        group_id: GroupId,
    },

    /// No student record exists for the register number.
    #[error("student {0} not found")]
    StudentNotFound(StudentId),

    // === Input Errors ===
    /// A submitted value was rejected.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// What was wrong with the value.
        message: String,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for labreg operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create an invalid input error.
    #[must_use]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create a permission denied error.
    #[must_use]
    pub fn permission_denied(role: Role, action: impl Into<String>) -> Self {
        Self::PermissionDenied {
            role,
            action: action.into(),
        }
    }

    /// Stable machine-readable code for this error.
    ///
    /// Everything that is not a business rejection maps to `system_error`.
    #[must_use]
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::AuthenticationRequired | Self::UserNotRegistered { .. } => {
                "authentication_required"
            }
            Self::PermissionDenied { .. } | Self::DevLoginDisabled => "permission_denied",
            Self::LabNotFound(_) => "lab_not_found",
            Self::GroupNotFound(_) => "group_not_found",
            Self::NoLabForGroup(_) => "no_lab_for_group",
            Self::RegistrationClosed { .. } => "registration_closed",
            Self::GroupFull { .. } => "group_full",
            Self::AlreadyEnrolled { .. } => "already_enrolled",
            Self::UseChangeGroup { .. } => "use_change_group",
            Self::NotEnrolled { .. } => "not_enrolled",
            Self::StudentNotFound(_) => "student_not_found",
            Self::InvalidInput { .. } => "invalid_input",
            _ => "system_error",
        }
    }

    /// Check if this error is a business rejection rather than a failure.
    #[must_use]
    pub fn is_rejection(&self) -> bool {
        self.error_type() != "system_error"
    }

    /// Check if this error is an authorization issue.
    #[must_use]
    pub fn is_permission_error(&self) -> bool {
        matches!(
            self,
            Self::PermissionDenied { .. } | Self::AuthenticationRequired | Self::DevLoginDisabled
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_occupancy() -> Occupancy {
        Occupancy {
            current: 10,
            max: 10,
            available: 0,
            percentage: 100.0,
        }
    }

    #[test]
    fn test_error_display() {
        let err = Error::AuthenticationRequired;
        assert_eq!(err.to_string(), "authentication required");

        let err = Error::internal("test error");
        assert_eq!(err.to_string(), "internal error: test error");
    }

    #[test]
    fn test_error_types() {
        assert_eq!(Error::LabNotFound(1).error_type(), "lab_not_found");
        assert_eq!(Error::GroupNotFound(1).error_type(), "group_not_found");
        assert_eq!(Error::NoLabForGroup(1).error_type(), "no_lab_for_group");
        assert_eq!(
            Error::RegistrationClosed {
                lab_id: 1,
                limit: "01/01/2020".to_string()
            }
            .error_type(),
            "registration_closed"
        );
        assert_eq!(
            Error::GroupFull {
                group_id: 1,
                occupancy: full_occupancy()
            }
            .error_type(),
            "group_full"
        );
        assert_eq!(
            Error::AlreadyEnrolled { am: 1, group_id: 2 }.error_type(),
            "already_enrolled"
        );
        assert_eq!(
            Error::UseChangeGroup {
                am: 1,
                current_group: 2
            }
            .error_type(),
            "use_change_group"
        );
        assert_eq!(
            Error::NotEnrolled { am: 1, group_id: 2 }.error_type(),
            "not_enrolled"
        );
        assert_eq!(Error::StudentNotFound(1).error_type(), "student_not_found");
        assert_eq!(
            Error::invalid_input("bad email").error_type(),
            "invalid_input"
        );
        assert_eq!(Error::internal("x").error_type(), "system_error");
    }

    #[test]
    fn test_storage_failure_is_system_error() {
        let err: Error = rusqlite::Error::QueryReturnedNoRows.into();
        assert_eq!(err.error_type(), "system_error");
        assert!(!err.is_rejection());
    }

    #[test]
    fn test_rejections() {
        assert!(Error::LabNotFound(3).is_rejection());
        assert!(Error::AuthenticationRequired.is_rejection());
    }

    #[test]
    fn test_is_permission_error() {
        let err = Error::permission_denied(Role::Student, "absences.edit_group_absences");
        assert!(err.is_permission_error());
        assert!(Error::AuthenticationRequired.is_permission_error());
        assert!(!Error::LabNotFound(1).is_permission_error());
    }

    #[test]
    fn test_permission_error_display() {
        let err = Error::permission_denied(Role::Guest, "groups.join");
        assert_eq!(err.to_string(), "insufficient permissions to groups.join");
        assert!(matches!(err, Error::PermissionDenied { role: Role::Guest, .. }));
    }

    #[test]
    fn test_group_full_display() {
        let err = Error::GroupFull {
            group_id: 4,
            occupancy: full_occupancy(),
        };
        let msg = err.to_string();
        assert!(msg.contains("group 4"));
        assert!(msg.contains("10/10"));
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_json_error() {
        let json_result: std::result::Result<i32, serde_json::Error> =
            serde_json::from_str("not valid json");
        if let Err(json_err) = json_result {
            let err: Error = json_err.into();
            assert!(matches!(err, Error::Json(_)));
        }
    }

    #[test]
    fn test_database_migration_error_display() {
        let err = Error::DatabaseMigration {
            message: "version mismatch".to_string(),
        };
        assert!(err.to_string().contains("version mismatch"));
    }

    #[test]
    fn test_directory_create_error_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = Error::DirectoryCreate {
            path: PathBuf::from("/root/forbidden"),
            source: io_err,
        };
        assert!(err.to_string().contains("/root/forbidden"));
    }
}
