//! End-to-end registration scenarios against a file-backed database.

use chrono::{NaiveDate, NaiveDateTime};

use labreg::absences::Absences;
use labreg::catalog::{professor_records, Catalog};
use labreg::model::Role;
use labreg::permissions::names::{
    ABSENCES, EDIT_GROUP_ABSENCES, EDIT_OWN_PROFILE, GROUPS, JOIN, STUDENTS_LIST,
};
use labreg::privacy::PiiMasker;
use labreg::seed::{seed_demo_data, FAILED_STUDENT, FULL_GROUP};
use labreg::session::default_dev_users;
use labreg::{
    AuditLog, AuthMode, DevDirectory, EnrollmentKind, Error, LabStatus, PermissionMatrix,
    Profiles, Registrar, Storage,
};

const YEAR: i32 = 2025;

fn at(month: u32, day: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(YEAR, month, day)
        .unwrap()
        .and_hms_opt(9, 30, 0)
        .unwrap()
}

fn seeded() -> (tempfile::TempDir, Storage) {
    let dir = tempfile::tempdir().unwrap();
    let storage = Storage::open(dir.path().join("data").join("labregister.sqlite")).unwrap();
    seed_demo_data(&storage, YEAR).unwrap();
    (dir, storage)
}

#[test]
fn student_registers_changes_and_leaves() {
    let (_dir, storage) = seeded();
    let audit = AuditLog::new().retaining();
    let directory = DevDirectory::new(AuthMode::Dev, default_dev_users());
    let session = directory.login("student1").unwrap();
    let matrix = PermissionMatrix::default();
    assert_eq!(matrix.require(Some(&session), GROUPS, JOIN).unwrap(), Role::Student);

    let registrar = Registrar::new(&storage, &audit).with_session(&session);
    let am = session.user_id;

    let registration = registrar.register(am, 3, 5, at(10, 1)).unwrap();
    assert_eq!(registration.kind, EnrollmentKind::New);

    let err = registrar.register(am, 3, 6, at(10, 2)).unwrap_err();
    assert_eq!(err.error_type(), "use_change_group");

    registrar.change_group(am, 5, 6, 3, at(10, 3)).unwrap();
    let listing = registrar.enrollments(am, YEAR).unwrap();
    assert_eq!(listing.len(), 1);
    assert_eq!(listing[0].group_id, 6);
    assert_eq!(listing[0].status, LabStatus::InProgress);

    registrar.leave_group(am, 6, at(10, 4)).unwrap();
    assert!(registrar.enrollments(am, YEAR).unwrap().is_empty());

    let actions: Vec<_> = audit.entries().into_iter().map(|e| e.action).collect();
    assert_eq!(
        actions,
        [
            "lab_registration_created",
            "group_enrollment_created",
            "group_changed",
            "group_left"
        ]
    );
    assert!(audit.entries().iter().all(|e| e.user_role == "student"));
}

#[test]
fn full_group_and_closed_period_are_rejected() {
    let (_dir, storage) = seeded();
    let audit = AuditLog::new().retaining();
    let registrar = Registrar::new(&storage, &audit);

    match registrar.register(13628, 6, FULL_GROUP, at(10, 1)) {
        Err(Error::GroupFull { occupancy, .. }) => {
            assert_eq!(occupancy.current, 12);
            assert_eq!(occupancy.available, 0);
        }
        other => panic!("expected a full group, got {other:?}"),
    }

    let next_year = NaiveDate::from_ymd_opt(YEAR + 1, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let err = registrar.register(13628, 6, 12, next_year).unwrap_err();
    assert_eq!(err.error_type(), "registration_closed");

    assert!(audit.entries().is_empty());
    assert!(storage.lab_enrollment(13628, 6).unwrap().is_none());
}

#[test]
fn failed_student_reregisters() {
    let (_dir, storage) = seeded();
    let audit = AuditLog::new().retaining();
    let registrar = Registrar::new(&storage, &audit);

    let before = registrar.lab_status(FAILED_STUDENT, 3).unwrap().unwrap();
    assert_eq!(before.status, LabStatus::Failed);

    let registration = registrar
        .enroll_in_group(FAILED_STUDENT, 6, at(10, 5))
        .unwrap();
    assert_eq!(registration.kind, EnrollmentKind::Failed);
    assert_eq!(registration.lab_id, 3);

    let after = registrar.lab_status(FAILED_STUDENT, 3).unwrap().unwrap();
    assert_eq!(after.status, LabStatus::InProgress);
    assert_eq!(after.failures, before.failures + 1);
    assert_eq!(audit.entries()[0].action, "lab_reregistration");
}

#[test]
fn professor_records_absences_for_group_members() {
    let (_dir, storage) = seeded();
    let audit = AuditLog::new().retaining();
    let directory = DevDirectory::new(AuthMode::Dev, default_dev_users());
    let professor = directory.login("prof1").unwrap();
    let student = directory.login("student1").unwrap();
    let matrix = PermissionMatrix::default();

    assert!(matrix
        .require(Some(&professor), ABSENCES, EDIT_GROUP_ABSENCES)
        .is_ok());
    assert!(matrix
        .require(Some(&student), ABSENCES, EDIT_GROUP_ABSENCES)
        .is_err());

    let absences = Absences::new(&storage, &audit);
    let date = NaiveDate::from_ymd_opt(YEAR, 10, 10).unwrap();
    absences
        .record_absence(Some(&professor), 90000, FULL_GROUP, date, None)
        .unwrap();

    let roster = absences
        .group_absences(Some(&professor), FULL_GROUP)
        .unwrap();
    assert_eq!(roster.len(), 12);
    assert_eq!(roster[0].absences, ["2025-10-10"]);

    let err = absences
        .record_absence(Some(&student), 90001, FULL_GROUP, date, None)
        .unwrap_err();
    assert!(err.is_permission_error());
}

#[test]
fn catalog_reflects_seats_taken() {
    let (_dir, storage) = seeded();
    let audit = AuditLog::new();
    Registrar::new(&storage, &audit)
        .register(13628, 4, 7, at(10, 1))
        .unwrap();

    let groups = Catalog::new(&storage).groups(4, YEAR).unwrap();
    let seven = groups.iter().find(|g| g.group.group_id == 7).unwrap();
    assert_eq!(seven.occupancy.current, 1);
    assert_eq!(seven.occupancy.max, 18);
    assert!((seven.occupancy.percentage - 5.6).abs() < 1e-9);
}

#[test]
fn database_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("labregister.sqlite");
    {
        let storage = Storage::open(&path).unwrap();
        seed_demo_data(&storage, YEAR).unwrap();
    }
    let storage = Storage::open(&path).unwrap();
    let stats = storage.stats().unwrap();
    assert_eq!(stats.courses, 4);
    assert_eq!(stats.group_enrollments, 12);
    assert!(stats.db_size_bytes > 0);
}

#[test]
fn student_updates_own_email() {
    let (_dir, storage) = seeded();
    let audit = AuditLog::new().retaining();
    let directory = DevDirectory::new(AuthMode::Dev, default_dev_users());
    let session = directory.login("student1").unwrap();
    PermissionMatrix::default()
        .require(Some(&session), STUDENTS_LIST, EDIT_OWN_PROFILE)
        .unwrap();

    let profiles = Profiles::new(&storage, &audit);
    let before = profiles.profile(Some(&session)).unwrap();
    assert_eq!(before.am, session.user_id);

    let after = profiles
        .update_email(Some(&session), "updated@example.com")
        .unwrap();
    assert_eq!(after.email, "updated@example.com");
    assert_eq!(profiles.profile(Some(&session)).unwrap(), after);
    assert_eq!(audit.entries()[0].action, "profile_updated");
}

#[test]
fn guests_see_masked_professor_directory() {
    let (_dir, storage) = seeded();
    let professors = Catalog::new(&storage).professors().unwrap();
    assert_eq!(professors.len(), 2);

    let masker = PiiMasker::default();
    let public = professor_records(&professors, Role::Guest, &masker).unwrap();
    for (record, professor) in public.iter().zip(&professors) {
        let email = record["email"].as_str().unwrap();
        assert!(email.contains("***@"), "{email}");
        assert_ne!(email, professor.email);
    }
}
