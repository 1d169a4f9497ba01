//! Core record types for labreg.
//!
//! These mirror the portal's tables: courses own labs, labs own groups,
//! students hold one lab enrollment per lab and at most one group of that
//! lab per academic year.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Course identifier.
pub type CourseId = i64;
/// Lab identifier.
pub type LabId = i64;
/// Lab group identifier.
pub type GroupId = i64;
/// Professor identifier.
pub type ProfessorId = i64;
/// Student register number ("AM").
pub type StudentId = i64;

/// Role of an authenticated user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Not authenticated, or not known to the portal.
    #[default]
    Guest,
    /// An enrolled student.
    Student,
    /// A professor running lab groups.
    Professor,
    /// Portal administrator.
    Admin,
}

impl Role {
    /// All roles, least privileged first.
    pub const ALL: [Role; 4] = [Role::Guest, Role::Student, Role::Professor, Role::Admin];

    /// The lower-case name used in sessions and the permission matrix.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Guest => "guest",
            Self::Student => "student",
            Self::Professor => "professor",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "guest" => Ok(Self::Guest),
            "student" => Ok(Self::Student),
            "professor" => Ok(Self::Professor),
            "admin" => Ok(Self::Admin),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// Progress of a student in a lab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabStatus {
    /// Currently attending.
    InProgress,
    /// Failed; the student may register again.
    Failed,
    /// Passed.
    Completed,
}

impl LabStatus {
    /// The literal stored in `rel_lab_student.status`.
    ///
    /// Existing portal databases hold these Greek strings, so they are kept
    /// verbatim.
    #[must_use]
    pub fn as_db_str(self) -> &'static str {
        match self {
            Self::InProgress => "Σε Εξέλιξη",
            Self::Failed => "Αποτυχία",
            Self::Completed => "Ολοκληρωμένο",
        }
    }

    /// Parse a stored status literal.
    #[must_use]
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "Σε Εξέλιξη" => Some(Self::InProgress),
            "Αποτυχία" => Some(Self::Failed),
            "Ολοκληρωμένο" => Some(Self::Completed),
            _ => None,
        }
    }
}

impl fmt::Display for LabStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InProgress => write!(f, "in progress"),
            Self::Failed => write!(f, "failed"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

/// A course offered in some semester.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    /// Course id.
    pub course_id: CourseId,
    /// Course title.
    pub name: String,
    /// Course description.
    pub description: String,
    /// Semester label, stored as text.
    pub semester: String,
}

/// A lab attached to one or more courses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lab {
    /// Lab id.
    pub lab_id: LabId,
    /// Lab title.
    pub name: String,
    /// Lab description.
    pub description: String,
    /// Seats per group.
    pub max_users: i64,
    /// Registration deadline as entered by staff; empty for none.
    pub reg_limit: String,
    /// Absences allowed before the lab is failed.
    pub max_misses: i64,
}

/// A weekly session of a lab in a given academic year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabGroup {
    /// Group id.
    pub group_id: GroupId,
    /// Free text such as "Monday 10-12".
    pub daytime: String,
    /// Academic year the group runs in.
    pub year: i32,
    /// Finalization marker set by staff; empty while the group is open.
    pub finalize: String,
}

/// A member of the teaching staff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Professor {
    /// Professor id.
    pub prof_id: ProfessorId,
    /// Full name.
    pub name: String,
    /// Academic rank or position.
    pub status: String,
    /// Office location.
    pub office: String,
    /// Contact email.
    pub email: String,
    /// Contact phone.
    pub tel: String,
}

/// A student known to the portal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    /// Register number.
    pub am: StudentId,
    /// Full name.
    pub name: String,
    /// Current semester.
    pub semester: i64,
    /// Contact email.
    pub email: String,
}

/// A student's standing in a lab (`rel_lab_student`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabEnrollment {
    /// Row id; `None` before insertion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Student register number.
    pub am: StudentId,
    /// The lab.
    pub lab_id: LabId,
    /// Failure counter; bumped on every re-registration after a failure.
    pub misses: i64,
    /// Final grade, 0 until graded.
    pub grade: i64,
    /// Calendar month of the registration.
    pub reg_month: u32,
    /// Calendar year of the registration.
    pub reg_year: i32,
    /// Progress in the lab.
    pub status: LabStatus,
}

/// A student's seat in a group (`rel_group_student`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupEnrollment {
    /// Student register number.
    pub am: StudentId,
    /// The group.
    pub group_id: GroupId,
    /// "D/M" without zero padding.
    pub reg_daymonth: String,
    /// Calendar year the seat was taken.
    pub reg_year: i32,
}

/// One line of a student's enrollment listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollmentSummary {
    /// Lab title.
    pub lab_name: String,
    /// Lab id.
    pub lab_id: LabId,
    /// Group schedule.
    pub group_daytime: String,
    /// Group id.
    pub group_id: GroupId,
    /// Progress in the lab.
    pub status: LabStatus,
    /// Recorded absence dates, or `-` when there are none.
    pub absences: String,
    /// Lab grade.
    pub grade: i64,
}
