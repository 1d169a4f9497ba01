//! Lab and group registration workflow.
//!
//! A registration runs its checks in a fixed order: the lab's registration
//! period, then the target group's capacity, then the student's existing
//! enrollments. Writes happen in one transaction and are audited only after
//! they commit.
//!
//! Every operation takes the current time explicitly; the `*_now` wrappers
//! read the local clock.

use chrono::{Datelike, Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::academic::{self, RegLimit};
use crate::audit::{AuditLog, Change};
use crate::error::{Error, Result};
use crate::model::{
    EnrollmentSummary, GroupEnrollment, GroupId, Lab, LabEnrollment, LabId, LabStatus, StudentId,
};
use crate::session::Session;
use crate::storage::Storage;

/// Seat usage of a group.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Occupancy {
    /// Seats taken.
    pub current: i64,
    /// Seats in total.
    pub max: i64,
    /// Free seats, never negative.
    pub available: i64,
    /// `current / max` in percent, one decimal; 0 when `max` is 0.
    pub percentage: f64,
}

impl Occupancy {
    /// Occupancy of `current` taken seats out of `max`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn new(current: i64, max: i64) -> Self {
        let percentage = if max > 0 {
            (current as f64 / max as f64 * 1000.0).round_ties_even() / 10.0
        } else {
            0.0
        };
        Self {
            current,
            max,
            available: (max - current).max(0),
            percentage,
        }
    }

    /// No seat left.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.current >= self.max
    }
}

/// Outcome of an open registration-period check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationPeriod {
    /// The lab has no deadline.
    NoLimit,
    /// Registrations accepted until this day inclusive.
    Until(NaiveDate),
    /// The deadline could not be read; registration is allowed.
    UnreadableLimit,
}

impl std::fmt::Display for RegistrationPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoLimit => write!(f, "no registration limit"),
            Self::Until(date) => write!(f, "registrations until {}", date.format("%d/%m/%Y")),
            Self::UnreadableLimit => write!(f, "invalid registration limit date"),
        }
    }
}

/// Check a lab's registration deadline against `today`.
///
/// # Errors
///
/// Returns [`Error::RegistrationClosed`] once the deadline has passed.
pub fn registration_period(lab: &Lab, today: NaiveDate) -> Result<RegistrationPeriod> {
    match academic::parse_reg_limit(&lab.reg_limit) {
        RegLimit::None => Ok(RegistrationPeriod::NoLimit),
        RegLimit::Until(limit) if today > limit => Err(Error::RegistrationClosed {
            lab_id: lab.lab_id,
            limit: lab.reg_limit.clone(),
        }),
        RegLimit::Until(limit) => Ok(RegistrationPeriod::Until(limit)),
        RegLimit::Unparseable => {
            warn!("Could not parse reg_limit: {}", lab.reg_limit);
            Ok(RegistrationPeriod::UnreadableLimit)
        }
    }
}

/// A student's standing in a lab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabStatusInfo {
    /// Progress in the lab.
    pub status: LabStatus,
    /// Number of re-registrations after failing.
    pub failures: i64,
    /// Month of the latest registration.
    pub reg_month: u32,
    /// Year of the latest registration.
    pub reg_year: i32,
}

/// What the student already holds in the lab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentKind {
    /// Nothing this year; a fresh registration.
    New,
    /// Failed the lab before; registering again.
    Failed,
    /// Already seated in the requested group.
    SameGroup,
    /// Seated in another group of the lab this year.
    DifferentGroup(GroupId),
}

/// A completed registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    /// What the student held before.
    pub kind: EnrollmentKind,
    /// The lab.
    pub lab_id: LabId,
    /// The group now held.
    pub group_id: GroupId,
}

/// A completed group change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupChange {
    /// Group given up.
    pub old_group_id: GroupId,
    /// Group now held.
    pub new_group_id: GroupId,
}

/// Runs registration operations against a database.
#[derive(Debug)]
pub struct Registrar<'a> {
    storage: &'a Storage,
    audit: &'a AuditLog,
    session: Option<&'a Session>,
    cutoff_day: u32,
}

impl<'a> Registrar<'a> {
    /// Work on `storage`, auditing to `audit` without a session.
    #[must_use]
    pub fn new(storage: &'a Storage, audit: &'a AuditLog) -> Self {
        Self {
            storage,
            audit,
            session: None,
            cutoff_day: academic::DEFAULT_YEAR_CUTOFF_DAY,
        }
    }

    /// Attribute audit entries to `session`.
    #[must_use]
    pub fn with_session(mut self, session: &'a Session) -> Self {
        self.session = Some(session);
        self
    }

    /// Use a different academic-year cutoff day.
    #[must_use]
    pub fn with_cutoff_day(mut self, cutoff_day: u32) -> Self {
        self.cutoff_day = cutoff_day;
        self
    }

    /// Academic year of `date` under this registrar's cutoff.
    #[must_use]
    pub fn academic_year(&self, date: NaiveDate) -> i32 {
        academic::academic_year(date, self.cutoff_day)
    }

    fn require_lab(&self, lab_id: LabId) -> Result<Lab> {
        self.storage.lab(lab_id)?.ok_or(Error::LabNotFound(lab_id))
    }

    /// Check whether the lab still accepts registrations on `today`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LabNotFound`] or [`Error::RegistrationClosed`], or a
    /// storage error.
    pub fn validate_registration_period(
        &self,
        lab_id: LabId,
        today: NaiveDate,
    ) -> Result<RegistrationPeriod> {
        let lab = self.require_lab(lab_id)?;
        registration_period(&lab, today)
    }

    /// Occupancy of a group measured against the lab's seat count.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LabNotFound`] or a storage error.
    pub fn occupancy(&self, group_id: GroupId, lab_id: LabId) -> Result<Occupancy> {
        let current = self.storage.count_group_students(group_id)?;
        let lab = self.require_lab(lab_id)?;
        Ok(Occupancy::new(current, lab.max_users))
    }

    /// Check that the group has a free seat.
    ///
    /// # Errors
    ///
    /// Returns [`Error::GroupFull`] with the occupancy when it does not,
    /// [`Error::LabNotFound`], or a storage error.
    pub fn check_group_capacity(&self, group_id: GroupId, lab_id: LabId) -> Result<Occupancy> {
        let occupancy = self.occupancy(group_id, lab_id)?;
        if occupancy.is_full() {
            return Err(Error::GroupFull {
                group_id,
                occupancy,
            });
        }
        Ok(occupancy)
    }

    /// The student's standing in a lab, if enrolled.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn lab_status(&self, am: StudentId, lab_id: LabId) -> Result<Option<LabStatusInfo>> {
        Ok(self
            .storage
            .lab_enrollment(am, lab_id)?
            .map(|e| LabStatusInfo {
                status: e.status,
                failures: e.misses,
                reg_month: e.reg_month,
                reg_year: e.reg_year,
            }))
    }

    /// Classify what the student already holds in the lab.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn check_existing_enrollment(
        &self,
        am: StudentId,
        lab_id: LabId,
        group_id: GroupId,
        academic_year: i32,
    ) -> Result<EnrollmentKind> {
        let Some(lab_enrollment) = self.storage.lab_enrollment(am, lab_id)? else {
            return Ok(EnrollmentKind::New);
        };

        if lab_enrollment.status == LabStatus::Failed {
            return Ok(EnrollmentKind::Failed);
        }

        if let Some(seat) = self
            .storage
            .group_enrollment_in_lab(am, lab_id, academic_year)?
        {
            return Ok(if seat.group_id == group_id {
                EnrollmentKind::SameGroup
            } else {
                EnrollmentKind::DifferentGroup(seat.group_id)
            });
        }

        Ok(EnrollmentKind::New)
    }

    /// Register a student to a lab and seat them in a group.
    ///
    /// # Errors
    ///
    /// Returns a rejection ([`Error::RegistrationClosed`], [`Error::GroupFull`],
    /// [`Error::AlreadyEnrolled`], [`Error::UseChangeGroup`],
    /// [`Error::LabNotFound`], [`Error::GroupNotFound`]) or a storage error,
    /// in which case nothing was written.
    pub fn register(
        &self,
        am: StudentId,
        lab_id: LabId,
        group_id: GroupId,
        now: NaiveDateTime,
    ) -> Result<Registration> {
        let today = now.date();
        let academic_year = self.academic_year(today);

        self.validate_registration_period(lab_id, today)?;
        if self.storage.group(group_id)?.is_none() {
            return Err(Error::GroupNotFound(group_id));
        }
        self.check_group_capacity(group_id, lab_id)?;

        let kind = self.check_existing_enrollment(am, lab_id, group_id, academic_year)?;
        match kind {
            EnrollmentKind::SameGroup => return Err(Error::AlreadyEnrolled { am, group_id }),
            EnrollmentKind::DifferentGroup(current_group) => {
                return Err(Error::UseChangeGroup { am, current_group })
            }
            EnrollmentKind::New | EnrollmentKind::Failed => {}
        }

        let result = self.storage.transaction(|storage| {
            let mut changes = Vec::with_capacity(2);
            let existing = storage.lab_enrollment(am, lab_id)?;

            match existing {
                Some(mut enrollment) if kind == EnrollmentKind::Failed => {
                    let old_failures = enrollment.misses;
                    enrollment.status = LabStatus::InProgress;
                    enrollment.misses = old_failures + 1;
                    enrollment.reg_month = now.month();
                    enrollment.reg_year = now.year();
                    storage.update_lab_enrollment(&enrollment)?;
                    changes.push((
                        "lab_reregistration",
                        Change::new()
                            .old(format!(
                                "Status: {}, Failures: {old_failures}",
                                LabStatus::Failed.as_db_str()
                            ))
                            .new_value(format!(
                                "Status: {}, Failures: {}",
                                LabStatus::InProgress.as_db_str(),
                                old_failures + 1
                            ))
                            .reason("Student re-registered after failure"),
                    ));
                }
                Some(enrollment)
                    if enrollment.status == LabStatus::InProgress
                        && enrollment.reg_year >= academic_year =>
                {
                    debug!(am, lab_id, "Reusing existing lab enrollment");
                }
                Some(mut enrollment) => {
                    let old = format!(
                        "Status: {}, Year: {}",
                        enrollment.status.as_db_str(),
                        enrollment.reg_year
                    );
                    enrollment.status = LabStatus::InProgress;
                    enrollment.reg_month = now.month();
                    enrollment.reg_year = now.year();
                    storage.update_lab_enrollment(&enrollment)?;
                    changes.push((
                        "lab_registration_created",
                        Change::new()
                            .old(old)
                            .new_value(format!("Student {am} registered to lab {lab_id}"))
                            .reason("New lab registration"),
                    ));
                }
                None => {
                    storage.insert_lab_enrollment(&LabEnrollment {
                        id: None,
                        am,
                        lab_id,
                        misses: 0,
                        grade: 0,
                        reg_month: now.month(),
                        reg_year: now.year(),
                        status: LabStatus::InProgress,
                    })?;
                    changes.push((
                        "lab_registration_created",
                        Change::new()
                            .new_value(format!("Student {am} registered to lab {lab_id}"))
                            .reason("New lab registration"),
                    ));
                }
            }

            let seat = GroupEnrollment {
                am,
                group_id,
                reg_daymonth: academic::day_month(today),
                reg_year: now.year(),
            };
            // A seat in this group from an earlier year is refreshed in place.
            if !storage.move_group_enrollment(am, group_id, &seat)? {
                storage.insert_group_enrollment(&seat)?;
            }
            changes.push((
                "group_enrollment_created",
                Change::new()
                    .new_value(format!("Student {am} enrolled in group {group_id}"))
                    .reason("Registration completed"),
            ));
            Ok(changes)
        });

        let changes = result.map_err(|e| {
            error!("Registration failed: {}", e);
            e
        })?;
        for (action, change) in changes {
            self.audit.record(self.session, action, change);
        }

        info!(am, lab_id, group_id, ?kind, "Student registered");
        Ok(Registration {
            kind,
            lab_id,
            group_id,
        })
    }

    /// [`Self::register`] at the current local time.
    ///
    /// # Errors
    ///
    /// See [`Self::register`].
    pub fn register_now(
        &self,
        am: StudentId,
        lab_id: LabId,
        group_id: GroupId,
    ) -> Result<Registration> {
        self.register(am, lab_id, group_id, Local::now().naive_local())
    }

    /// Move a student from one group of a lab to another.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RegistrationClosed`], [`Error::GroupFull`] for the
    /// new group, [`Error::NotEnrolled`] if the student does not hold the
    /// old seat, [`Error::LabNotFound`], or a storage error.
    pub fn change_group(
        &self,
        am: StudentId,
        old_group_id: GroupId,
        new_group_id: GroupId,
        lab_id: LabId,
        now: NaiveDateTime,
    ) -> Result<GroupChange> {
        let today = now.date();
        self.validate_registration_period(lab_id, today)?;
        self.check_group_capacity(new_group_id, lab_id)?;

        if self.storage.group_enrollment(am, old_group_id)?.is_none() {
            return Err(Error::NotEnrolled {
                am,
                group_id: old_group_id,
            });
        }

        info!(
            "Changing group for student {} from {} to {}",
            am, old_group_id, new_group_id
        );

        let seat = GroupEnrollment {
            am,
            group_id: new_group_id,
            reg_daymonth: academic::day_month(today),
            reg_year: now.year(),
        };
        self.storage
            .transaction(|storage| storage.move_group_enrollment(am, old_group_id, &seat))
            .map_err(|e| {
                error!("Group change failed: {}", e);
                e
            })?;

        self.audit.record(
            self.session,
            "group_changed",
            Change::new()
                .old(format!("Group {old_group_id}"))
                .new_value(format!("Group {new_group_id}"))
                .reason("Student changed group"),
        );

        Ok(GroupChange {
            old_group_id,
            new_group_id,
        })
    }

    /// [`Self::change_group`] at the current local time.
    ///
    /// # Errors
    ///
    /// See [`Self::change_group`].
    pub fn change_group_now(
        &self,
        am: StudentId,
        old_group_id: GroupId,
        new_group_id: GroupId,
        lab_id: LabId,
    ) -> Result<GroupChange> {
        self.change_group(
            am,
            old_group_id,
            new_group_id,
            lab_id,
            Local::now().naive_local(),
        )
    }

    /// Give up a seat in a group while the lab's registration is open.
    ///
    /// The lab enrollment is kept.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoLabForGroup`], [`Error::RegistrationClosed`],
    /// [`Error::NotEnrolled`], or a storage error.
    pub fn leave_group(&self, am: StudentId, group_id: GroupId, now: NaiveDateTime) -> Result<()> {
        let lab_id = self
            .storage
            .lab_for_group(group_id)?
            .ok_or(Error::NoLabForGroup(group_id))?;
        self.validate_registration_period(lab_id, now.date())?;

        let removed = self
            .storage
            .transaction(|storage| storage.delete_group_enrollment(am, group_id))?;
        if !removed {
            return Err(Error::NotEnrolled { am, group_id });
        }

        self.audit.record(
            self.session,
            "group_left",
            Change::new()
                .old(format!("Group {group_id}"))
                .reason("Student left group"),
        );
        Ok(())
    }

    /// The student's labs and groups in an academic year.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn enrollments(&self, am: StudentId, academic_year: i32) -> Result<Vec<EnrollmentSummary>> {
        self.storage.student_enrollments(am, academic_year)
    }

    /// [`Self::enrollments`] for the current academic year.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn enrollments_now(&self, am: StudentId) -> Result<Vec<EnrollmentSummary>> {
        let year = self.academic_year(Local::now().date_naive());
        self.enrollments(am, year)
    }

    /// Check that a group exists, belongs to a lab and has room.
    ///
    /// # Errors
    ///
    /// Returns [`Error::GroupNotFound`], [`Error::NoLabForGroup`],
    /// [`Error::GroupFull`], or a storage error.
    pub fn check_enrollment_preconditions(
        &self,
        am: StudentId,
        group_id: GroupId,
    ) -> Result<Occupancy> {
        debug!(am, group_id, "Checking enrollment preconditions");
        if self.storage.group(group_id)?.is_none() {
            return Err(Error::GroupNotFound(group_id));
        }
        let lab_id = self
            .storage
            .lab_for_group(group_id)?
            .ok_or(Error::NoLabForGroup(group_id))?;
        self.check_group_capacity(group_id, lab_id)
    }

    /// Register a student to a group, resolving the group's lab.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoLabForGroup`] or anything [`Self::register`] returns.
    pub fn enroll_in_group(
        &self,
        am: StudentId,
        group_id: GroupId,
        now: NaiveDateTime,
    ) -> Result<Registration> {
        let lab_id = self
            .storage
            .lab_for_group(group_id)?
            .ok_or(Error::NoLabForGroup(group_id))?;
        self.register(am, lab_id, group_id, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LabGroup, Student};

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    struct Fixture {
        storage: Storage,
        audit: AuditLog,
        lab: LabId,
        group_a: GroupId,
        group_b: GroupId,
    }

    fn fixture(max_users: i64, reg_limit: &str) -> Fixture {
        let storage = Storage::open_in_memory().unwrap();
        let lab = storage
            .insert_lab(&Lab {
                lab_id: 0,
                name: "Test Lab".to_string(),
                description: "Test Lab Description".to_string(),
                max_users,
                reg_limit: reg_limit.to_string(),
                max_misses: 2,
            })
            .unwrap();
        let mut groups = Vec::new();
        for daytime in ["Monday 10-12", "Tuesday 12-14"] {
            let g = storage
                .insert_group(&LabGroup {
                    group_id: 0,
                    daytime: daytime.to_string(),
                    year: 2024,
                    finalize: String::new(),
                })
                .unwrap();
            storage.link_lab_group(lab, g).unwrap();
            groups.push(g);
        }
        for am in [13628, 13629, 13630] {
            storage
                .insert_student(&Student {
                    am,
                    name: format!("Student {am}"),
                    semester: 2,
                    email: format!("{am}@uoi.gr"),
                })
                .unwrap();
        }
        Fixture {
            storage,
            audit: AuditLog::new().retaining(),
            lab,
            group_a: groups[0],
            group_b: groups[1],
        }
    }

    impl Fixture {
        fn registrar(&self) -> Registrar<'_> {
            Registrar::new(&self.storage, &self.audit)
        }
    }

    #[test]
    fn test_occupancy_math() {
        let o = Occupancy::new(1, 3);
        assert_eq!(o.available, 2);
        assert!((o.percentage - 33.3).abs() < f64::EPSILON);
        assert!(!o.is_full());

        let over = Occupancy::new(5, 4);
        assert_eq!(over.available, 0);
        assert!(over.is_full());

        // Ties round to even.
        assert!((Occupancy::new(1, 16).percentage - 6.2).abs() < f64::EPSILON);
        assert!((Occupancy::new(3, 16).percentage - 18.8).abs() < f64::EPSILON);

        let empty = Occupancy::new(0, 0);
        assert!((empty.percentage - 0.0).abs() < f64::EPSILON);
        assert!(empty.is_full());
    }

    #[test]
    fn test_period_open_closed_and_unlimited() {
        let f = fixture(10, "31/12/2024");
        let r = f.registrar();
        let today = at(2024, 12, 31).date();
        assert_eq!(
            r.validate_registration_period(f.lab, today).unwrap(),
            RegistrationPeriod::Until(today)
        );
        let err = r
            .validate_registration_period(f.lab, at(2025, 1, 1).date())
            .unwrap_err();
        assert_eq!(err.error_type(), "registration_closed");

        let f = fixture(10, "");
        assert_eq!(
            f.registrar()
                .validate_registration_period(f.lab, today)
                .unwrap(),
            RegistrationPeriod::NoLimit
        );
    }

    #[test]
    fn test_period_unreadable_limit_allows() {
        let f = fixture(10, "soon");
        let period = f
            .registrar()
            .validate_registration_period(f.lab, at(2030, 1, 1).date())
            .unwrap();
        assert_eq!(period, RegistrationPeriod::UnreadableLimit);
        assert_eq!(period.to_string(), "invalid registration limit date");
    }

    #[test]
    fn test_period_missing_lab() {
        let f = fixture(10, "");
        let err = f
            .registrar()
            .validate_registration_period(999, at(2024, 10, 1).date())
            .unwrap_err();
        assert!(matches!(err, Error::LabNotFound(999)));
    }

    #[test]
    fn test_register_new_student() {
        let f = fixture(10, "2024-12-31");
        let reg = f
            .registrar()
            .register(13628, f.lab, f.group_a, at(2024, 10, 3))
            .unwrap();

        assert_eq!(reg.kind, EnrollmentKind::New);
        let lab_enrollment = f.storage.lab_enrollment(13628, f.lab).unwrap().unwrap();
        assert_eq!(lab_enrollment.status, LabStatus::InProgress);
        assert_eq!(lab_enrollment.misses, 0);
        assert_eq!(lab_enrollment.reg_month, 10);
        let seat = f.storage.group_enrollment(13628, f.group_a).unwrap().unwrap();
        assert_eq!(seat.reg_daymonth, "3/10");
        assert_eq!(seat.reg_year, 2024);

        let actions: Vec<_> = f.audit.entries().into_iter().map(|e| e.action).collect();
        assert_eq!(
            actions,
            ["lab_registration_created", "group_enrollment_created"]
        );
    }

    #[test]
    fn test_register_twice_same_group() {
        let f = fixture(10, "");
        let r = f.registrar();
        r.register(13628, f.lab, f.group_a, at(2024, 10, 3)).unwrap();
        let err = r
            .register(13628, f.lab, f.group_a, at(2024, 10, 4))
            .unwrap_err();
        assert_eq!(err.error_type(), "already_enrolled");
    }

    #[test]
    fn test_register_other_group_needs_change() {
        let f = fixture(10, "");
        let r = f.registrar();
        r.register(13628, f.lab, f.group_a, at(2024, 10, 3)).unwrap();
        let err = r
            .register(13628, f.lab, f.group_b, at(2024, 10, 4))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::UseChangeGroup { current_group, .. } if current_group == f.group_a
        ));
    }

    #[test]
    fn test_register_full_group() {
        let f = fixture(1, "");
        let r = f.registrar();
        r.register(13628, f.lab, f.group_a, at(2024, 10, 3)).unwrap();
        let err = r
            .register(13629, f.lab, f.group_a, at(2024, 10, 3))
            .unwrap_err();
        match err {
            Error::GroupFull { occupancy, .. } => {
                assert_eq!(occupancy.current, 1);
                assert_eq!(occupancy.available, 0);
                assert!((occupancy.percentage - 100.0).abs() < f64::EPSILON);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_register_after_deadline() {
        let f = fixture(10, "01/10/2024");
        let err = f
            .registrar()
            .register(13628, f.lab, f.group_a, at(2024, 10, 2))
            .unwrap_err();
        assert_eq!(err.error_type(), "registration_closed");
        assert!(f.storage.lab_enrollment(13628, f.lab).unwrap().is_none());
    }

    #[test]
    fn test_reregistration_after_failure() {
        let f = fixture(10, "");
        f.storage
            .insert_lab_enrollment(&LabEnrollment {
                id: None,
                am: 13628,
                lab_id: f.lab,
                misses: 1,
                grade: 3,
                reg_month: 10,
                reg_year: 2023,
                status: LabStatus::Failed,
            })
            .unwrap();

        let r = f.registrar();
        assert_eq!(
            r.check_existing_enrollment(13628, f.lab, f.group_a, 2024)
                .unwrap(),
            EnrollmentKind::Failed
        );
        let reg = r.register(13628, f.lab, f.group_a, at(2024, 11, 5)).unwrap();
        assert_eq!(reg.kind, EnrollmentKind::Failed);

        let status = r.lab_status(13628, f.lab).unwrap().unwrap();
        assert_eq!(status.status, LabStatus::InProgress);
        assert_eq!(status.failures, 2);
        assert_eq!(status.reg_month, 11);
        assert_eq!(status.reg_year, 2024);

        let entries = f.audit.entries();
        assert_eq!(entries[0].action, "lab_reregistration");
        assert_eq!(
            entries[0].old_value.as_deref(),
            Some("Status: Αποτυχία, Failures: 1")
        );
        assert_eq!(
            entries[0].new_value.as_deref(),
            Some("Status: Σε Εξέλιξη, Failures: 2")
        );
    }

    #[test]
    fn test_check_existing_enrollment_ignores_other_years() {
        let f = fixture(10, "");
        let r = f.registrar();
        r.register(13628, f.lab, f.group_a, at(2024, 10, 3)).unwrap();

        assert_eq!(
            r.check_existing_enrollment(13628, f.lab, f.group_b, 2025)
                .unwrap(),
            EnrollmentKind::New
        );
        assert_eq!(
            r.check_existing_enrollment(13628, f.lab, f.group_a, 2025)
                .unwrap(),
            EnrollmentKind::New
        );
        assert_eq!(
            r.check_existing_enrollment(13629, f.lab, f.group_a, 2024)
                .unwrap(),
            EnrollmentKind::New
        );
    }

    #[test]
    fn test_register_refreshes_seat_from_earlier_year() {
        let f = fixture(10, "");
        let r = f.registrar();
        r.register(13628, f.lab, f.group_a, at(2024, 10, 3)).unwrap();

        let reg = r.register(13628, f.lab, f.group_a, at(2025, 10, 6)).unwrap();
        assert_eq!(reg.kind, EnrollmentKind::New);

        let seat = f.storage.group_enrollment(13628, f.group_a).unwrap().unwrap();
        assert_eq!(seat.reg_year, 2025);
        assert_eq!(seat.reg_daymonth, "6/10");
        assert_eq!(f.storage.count_group_students(f.group_a).unwrap(), 1);
        assert_eq!(f.storage.stats().unwrap().lab_enrollments, 1);
    }

    #[test]
    fn test_register_after_completing_starts_a_new_run() {
        let f = fixture(10, "");
        f.storage
            .insert_lab_enrollment(&LabEnrollment {
                id: None,
                am: 13628,
                lab_id: f.lab,
                misses: 0,
                grade: 8,
                reg_month: 10,
                reg_year: 2023,
                status: LabStatus::Completed,
            })
            .unwrap();

        let r = f.registrar();
        let reg = r.register(13628, f.lab, f.group_a, at(2025, 10, 1)).unwrap();
        assert_eq!(reg.kind, EnrollmentKind::New);

        let status = r.lab_status(13628, f.lab).unwrap().unwrap();
        assert_eq!(status.status, LabStatus::InProgress);
        assert_eq!(status.reg_month, 10);
        assert_eq!(status.reg_year, 2025);
        assert_eq!(f.storage.stats().unwrap().lab_enrollments, 1);

        let entries = f.audit.entries();
        let actions: Vec<_> = entries.iter().map(|e| e.action.as_str()).collect();
        assert_eq!(
            actions,
            ["lab_registration_created", "group_enrollment_created"]
        );
        assert_eq!(
            entries[0].old_value.as_deref(),
            Some("Status: Ολοκληρωμένο, Year: 2023")
        );
    }

    #[test]
    fn test_register_stale_in_progress_enrollment_is_renewed() {
        let f = fixture(10, "");
        f.storage
            .insert_lab_enrollment(&LabEnrollment {
                id: None,
                am: 13628,
                lab_id: f.lab,
                misses: 0,
                grade: 0,
                reg_month: 11,
                reg_year: 2022,
                status: LabStatus::InProgress,
            })
            .unwrap();

        f.registrar()
            .register(13628, f.lab, f.group_b, at(2024, 10, 2))
            .unwrap();

        let status = f.registrar().lab_status(13628, f.lab).unwrap().unwrap();
        assert_eq!(status.reg_year, 2024);
        assert_eq!(f.audit.entries()[0].action, "lab_registration_created");
    }

    #[test]
    fn test_register_rolls_back_on_storage_failure() {
        let f = fixture(10, "");
        f.storage
            .execute_batch(
                "CREATE TRIGGER block_seats BEFORE INSERT ON rel_group_student
                 BEGIN SELECT RAISE(ABORT, 'seat insert blocked'); END;",
            )
            .unwrap();

        let err = f
            .registrar()
            .register(13628, f.lab, f.group_a, at(2024, 10, 3))
            .unwrap_err();
        assert_eq!(err.error_type(), "system_error");
        assert!(f.storage.lab_enrollment(13628, f.lab).unwrap().is_none());
        assert_eq!(f.storage.stats().unwrap().lab_enrollments, 0);
        assert!(f.audit.entries().is_empty());
    }

    #[test]
    fn test_change_group() {
        let f = fixture(10, "");
        let r = f.registrar();
        r.register(13628, f.lab, f.group_a, at(2024, 10, 3)).unwrap();

        let change = r
            .change_group(13628, f.group_a, f.group_b, f.lab, at(2024, 10, 9))
            .unwrap();
        assert_eq!(change.new_group_id, f.group_b);
        assert!(f.storage.group_enrollment(13628, f.group_a).unwrap().is_none());
        let seat = f.storage.group_enrollment(13628, f.group_b).unwrap().unwrap();
        assert_eq!(seat.reg_daymonth, "9/10");

        let last = f.audit.entries().pop().unwrap();
        assert_eq!(last.action, "group_changed");
        assert_eq!(last.old_value.as_deref(), Some(format!("Group {}", f.group_a).as_str()));
    }

    #[test]
    fn test_change_group_not_enrolled() {
        let f = fixture(10, "");
        let err = f
            .registrar()
            .change_group(13628, f.group_a, f.group_b, f.lab, at(2024, 10, 9))
            .unwrap_err();
        assert_eq!(err.error_type(), "not_enrolled");
    }

    #[test]
    fn test_change_group_into_full_group() {
        let f = fixture(1, "");
        let r = f.registrar();
        r.register(13628, f.lab, f.group_a, at(2024, 10, 3)).unwrap();
        r.register(13629, f.lab, f.group_b, at(2024, 10, 3)).unwrap();

        let err = r
            .change_group(13628, f.group_a, f.group_b, f.lab, at(2024, 10, 9))
            .unwrap_err();
        assert_eq!(err.error_type(), "group_full");
    }

    #[test]
    fn test_leave_group() {
        let f = fixture(10, "");
        let r = f.registrar();
        r.register(13628, f.lab, f.group_a, at(2024, 10, 3)).unwrap();

        r.leave_group(13628, f.group_a, at(2024, 10, 4)).unwrap();
        assert_eq!(f.storage.count_group_students(f.group_a).unwrap(), 0);
        // The lab enrollment survives.
        assert!(f.storage.lab_enrollment(13628, f.lab).unwrap().is_some());

        let err = r.leave_group(13628, f.group_a, at(2024, 10, 4)).unwrap_err();
        assert_eq!(err.error_type(), "not_enrolled");
    }

    #[test]
    fn test_rejoin_after_leaving_reuses_lab_enrollment() {
        let f = fixture(10, "");
        let r = f.registrar();
        r.register(13628, f.lab, f.group_a, at(2024, 10, 3)).unwrap();
        r.leave_group(13628, f.group_a, at(2024, 10, 4)).unwrap();
        r.register(13628, f.lab, f.group_b, at(2024, 10, 5)).unwrap();

        assert_eq!(f.storage.stats().unwrap().lab_enrollments, 1);
    }

    #[test]
    fn test_enrollments_listing() {
        let f = fixture(10, "");
        let r = f.registrar();
        r.register(13628, f.lab, f.group_a, at(2024, 10, 3)).unwrap();
        f.storage.set_absences(13628, f.group_a, "2024-10-10").unwrap();

        let list = r.enrollments(13628, 2024).unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].lab_name, "Test Lab");
        assert_eq!(list[0].group_daytime, "Monday 10-12");
        assert_eq!(list[0].absences, "2024-10-10");

        r.register(13629, f.lab, f.group_b, at(2024, 10, 3)).unwrap();
        let other = r.enrollments(13629, 2024).unwrap();
        assert_eq!(other[0].absences, "-");

        assert!(r.enrollments(13628, 2023).unwrap().is_empty());
    }

    #[test]
    fn test_enrollment_preconditions() {
        let f = fixture(10, "");
        let r = f.registrar();
        let occupancy = r.check_enrollment_preconditions(13628, f.group_a).unwrap();
        assert_eq!(occupancy.available, 10);

        let err = r.check_enrollment_preconditions(13628, 999).unwrap_err();
        assert!(matches!(err, Error::GroupNotFound(999)));

        let orphan = f
            .storage
            .insert_group(&LabGroup {
                group_id: 0,
                daytime: "Friday".to_string(),
                year: 2024,
                finalize: String::new(),
            })
            .unwrap();
        let err = r.check_enrollment_preconditions(13628, orphan).unwrap_err();
        assert_eq!(err.error_type(), "no_lab_for_group");
    }

    #[test]
    fn test_enroll_in_group_resolves_lab() {
        let f = fixture(10, "");
        let r = f.registrar();
        let reg = r.enroll_in_group(13628, f.group_b, at(2024, 10, 3)).unwrap();
        assert_eq!(reg.lab_id, f.lab);

        let err = r.enroll_in_group(13628, f.group_b, at(2024, 10, 3)).unwrap_err();
        assert_eq!(err.error_type(), "already_enrolled");
    }

    #[test]
    fn test_register_unknown_group() {
        let f = fixture(10, "");
        let err = f
            .registrar()
            .register(13628, f.lab, 4242, at(2024, 10, 3))
            .unwrap_err();
        assert!(matches!(err, Error::GroupNotFound(4242)));
    }

    #[test]
    fn test_audit_attributed_to_session() {
        let f = fixture(10, "");
        let session = Session::new(13628, crate::model::Role::Student, "S");
        f.registrar()
            .with_session(&session)
            .register(13628, f.lab, f.group_a, at(2024, 10, 3))
            .unwrap();
        assert!(f.audit.entries().iter().all(|e| e.user_id == "13628"));
    }
}
