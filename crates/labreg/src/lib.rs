//! `labreg` - University lab registration portal core
//!
//! This library implements the rules behind a lab registration portal:
//! students register to labs and join lab groups within a registration
//! period and group capacity, professors record absences, and every
//! operation is gated by a role-based permission matrix and recorded in an
//! audit trail.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod absences;
pub mod academic;
pub mod audit;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod permissions;
pub mod privacy;
pub mod profile;
pub mod registration;
pub mod seed;
pub mod session;
pub mod storage;

pub use absences::Absences;
pub use audit::{AuditEntry, AuditLog, Change};
pub use catalog::Catalog;
pub use config::Config;
pub use error::{Error, Result};
pub use logging::init_logging;
pub use model::{LabStatus, Role};
pub use permissions::PermissionMatrix;
pub use profile::Profiles;
pub use registration::{EnrollmentKind, Occupancy, Registrar, Registration};
pub use session::{AuthMode, DevDirectory, Session};
pub use storage::{Storage, StorageStats};
