//! Absence tracking and group rosters.
//!
//! Absences are stored per student and group as a comma-separated list of
//! dates (`"2024-10-10, 2024-10-17"`).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::audit::{AuditLog, Change};
use crate::error::{Error, Result};
use crate::model::{GroupId, Role, Student, StudentId};
use crate::permissions::require_role;
use crate::session::Session;
use crate::storage::Storage;

const SEPARATOR: &str = ", ";
const DEFAULT_REASON: &str = "Professor recorded absence";
const STAFF: &[Role] = &[Role::Professor, Role::Admin];

/// A student of a group with their recorded absences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    /// The student.
    #[serde(flatten)]
    pub student: Student,
    /// Absence dates, oldest first.
    pub absences: Vec<String>,
}

/// Split a stored absence list.
#[must_use]
pub fn parse_absences(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Records absences and lists group members.
#[derive(Debug)]
pub struct Absences<'a> {
    storage: &'a Storage,
    audit: &'a AuditLog,
}

impl<'a> Absences<'a> {
    /// Work on `storage`, auditing to `audit`.
    #[must_use]
    pub fn new(storage: &'a Storage, audit: &'a AuditLog) -> Self {
        Self { storage, audit }
    }

    /// Append `date` to a student's absence list in a group.
    ///
    /// Returns the updated list.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PermissionDenied`] unless the session is a professor
    /// or admin (a missing session counts as a guest), [`Error::NotEnrolled`] if
    /// the student has no seat in the group, or a storage error.
    pub fn record_absence(
        &self,
        session: Option<&Session>,
        am: StudentId,
        group_id: GroupId,
        date: NaiveDate,
        reason: Option<&str>,
    ) -> Result<String> {
        let role = session.map_or(Role::Guest, |s| s.role);
        if !STAFF.contains(&role) {
            warn!(%role, am, group_id, "Absence recording denied");
            return Err(Error::permission_denied(role, "record absence"));
        }

        if self.storage.group_enrollment(am, group_id)?.is_none() {
            return Err(Error::NotEnrolled { am, group_id });
        }

        let date = date.format("%Y-%m-%d").to_string();
        let (old, updated) = self.storage.transaction(|storage| {
            let old = storage.absences(am, group_id)?.filter(|s| !s.is_empty());
            let updated = match &old {
                Some(list) => format!("{list}{SEPARATOR}{date}"),
                None => date.clone(),
            };
            storage.set_absences(am, group_id, &updated)?;
            Ok((old, updated))
        })?;

        let mut change = Change::new()
            .new_value(format!("Student {am}, group {group_id}: {updated}"))
            .reason(reason.unwrap_or(DEFAULT_REASON));
        if let Some(old) = old {
            change = change.old(format!("Student {am}, group {group_id}: {old}"));
        }
        self.audit.record(session, "absence_recorded", change);

        info!(am, group_id, %date, "Absence recorded");
        Ok(updated)
    }

    /// Students of a group with their absences, for staff.
    ///
    /// # Errors
    ///
    /// Returns an authorization error unless the session is a professor or
    /// admin, [`Error::GroupNotFound`], or a storage error.
    pub fn group_absences(
        &self,
        session: Option<&Session>,
        group_id: GroupId,
    ) -> Result<Vec<RosterEntry>> {
        require_role(session, STAFF)?;
        self.group_roster(group_id)?
            .into_iter()
            .map(|student| -> Result<RosterEntry> {
                let absences = self
                    .storage
                    .absences(student.am, group_id)?
                    .map(|list| parse_absences(&list))
                    .unwrap_or_default();
                Ok(RosterEntry { student, absences })
            })
            .collect()
    }

    /// Students seated in a group.
    ///
    /// # Errors
    ///
    /// Returns [`Error::GroupNotFound`] or a storage error.
    pub fn group_roster(&self, group_id: GroupId) -> Result<Vec<Student>> {
        if self.storage.group(group_id)?.is_none() {
            return Err(Error::GroupNotFound(group_id));
        }
        self.storage.group_students(group_id)
    }
}
