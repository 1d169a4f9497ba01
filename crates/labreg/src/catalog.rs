//! Read-only browsing of semesters, courses, labs and groups.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::model::{Course, CourseId, GroupId, Lab, LabGroup, LabId, Professor, Role, StudentId};
use crate::privacy::PiiMasker;
use crate::registration::{self, LabStatusInfo, Occupancy};
use crate::storage::Storage;

/// Professor records as shown to `role`.
///
/// Guests see contact fields masked; signed-in users see them as stored.
///
/// # Errors
///
/// Returns an error if a record cannot be serialized.
pub fn professor_records(
    professors: &[Professor],
    role: Role,
    masker: &PiiMasker,
) -> Result<Vec<Value>> {
    professors
        .iter()
        .map(|p| {
            if role == Role::Guest {
                masker.mask_record(p)
            } else {
                serde_json::to_value(p)
            }
        })
        .collect::<serde_json::Result<Vec<_>>>()
        .map_err(Error::from)
}

/// A group together with its seat usage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupAvailability {
    /// The group.
    #[serde(flatten)]
    pub group: LabGroup,
    /// Seats taken against the lab's seat count.
    pub occupancy: Occupancy,
}

/// Where a student stands in one lab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollmentStatus {
    /// The lab.
    pub lab_id: LabId,
    /// Standing in the lab, if the student ever registered.
    pub lab_status: Option<LabStatusInfo>,
    /// Group held in the requested academic year.
    pub current_group: Option<GroupId>,
    /// Whether the lab accepts registrations today.
    pub registration_open: bool,
    /// Human-readable description of the registration period.
    pub period: String,
}

/// Catalog queries.
#[derive(Debug, Clone, Copy)]
pub struct Catalog<'a> {
    storage: &'a Storage,
}

impl<'a> Catalog<'a> {
    /// Query catalog data from `storage`.
    #[must_use]
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Distinct course semesters, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn semesters(&self) -> Result<Vec<String>> {
        self.storage.semesters()
    }

    /// Courses offered in a semester.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn courses(&self, semester: &str) -> Result<Vec<Course>> {
        self.storage.courses_by_semester(semester)
    }

    /// Labs of a course.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn labs(&self, course_id: CourseId) -> Result<Vec<Lab>> {
        self.storage.labs_for_course(course_id)
    }

    /// Groups of a lab in an academic year, with occupancy.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LabNotFound`] or a storage error.
    pub fn groups(&self, lab_id: LabId, academic_year: i32) -> Result<Vec<GroupAvailability>> {
        let lab = self.storage.lab(lab_id)?.ok_or(Error::LabNotFound(lab_id))?;
        self.storage
            .groups_for_lab(lab_id, Some(academic_year))?
            .into_iter()
            .map(|group| -> Result<GroupAvailability> {
                let current = self.storage.count_group_students(group.group_id)?;
                Ok(GroupAvailability {
                    occupancy: Occupancy::new(current, lab.max_users),
                    group,
                })
            })
            .collect()
    }

    /// Every professor, by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn professors(&self) -> Result<Vec<Professor>> {
        self.storage.professors()
    }

    /// Professors teaching a group.
    ///
    /// # Errors
    ///
    /// Returns [`Error::GroupNotFound`] or a storage error.
    pub fn group_professors(&self, group_id: GroupId) -> Result<Vec<Professor>> {
        if self.storage.group(group_id)?.is_none() {
            return Err(Error::GroupNotFound(group_id));
        }
        self.storage.professors_for_group(group_id)
    }

    /// A student's status in a lab and whether registration is open on `today`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LabNotFound`] or a storage error.
    pub fn enrollment_status(
        &self,
        am: StudentId,
        lab_id: LabId,
        academic_year: i32,
        today: NaiveDate,
    ) -> Result<EnrollmentStatus> {
        let lab = self.storage.lab(lab_id)?.ok_or(Error::LabNotFound(lab_id))?;
        let lab_status = self
            .storage
            .lab_enrollment(am, lab_id)?
            .map(|e| LabStatusInfo {
                status: e.status,
                failures: e.misses,
                reg_month: e.reg_month,
                reg_year: e.reg_year,
            });
        let current_group = self
            .storage
            .group_enrollment_in_lab(am, lab_id, academic_year)?
            .map(|seat| seat.group_id);

        let (registration_open, period) = match registration::registration_period(&lab, today) {
            Ok(period) => (true, period.to_string()),
            Err(Error::RegistrationClosed { limit, .. }) => {
                (false, format!("registration closed on {limit}"))
            }
            Err(e) => return Err(e),
        };

        Ok(EnrollmentStatus {
            lab_id,
            lab_status,
            current_group,
            registration_open,
            period,
        })
    }
}
