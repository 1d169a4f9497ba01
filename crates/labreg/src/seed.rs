//! Demo data for development databases.

use tracing::info;

use crate::error::Result;
use crate::model::{
    Course, GroupEnrollment, Lab, LabEnrollment, LabGroup, LabStatus, Professor, Student,
};
use crate::storage::Storage;

/// Register number of the student holding a failed lab.
pub const FAILED_STUDENT: i64 = 88888;

/// Group that is seeded completely full.
pub const FULL_GROUP: i64 = 11;

/// What [`seed_demo_data`] inserted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct SeedSummary {
    /// Courses inserted.
    pub courses: usize,
    /// Labs inserted.
    pub labs: usize,
    /// Groups inserted.
    pub groups: usize,
    /// Professors inserted.
    pub professors: usize,
    /// Students inserted.
    pub students: usize,
}

/// Fill an empty database with demo courses, labs and groups for `year`.
///
/// Labs accept registrations until the end of `year`. Group 11 is full and
/// student 88888 has failed lab 3. A database that already has courses is
/// left untouched and an empty summary is returned.
///
/// # Errors
///
/// Returns an error if a database operation fails; nothing is written then.
pub fn seed_demo_data(storage: &Storage, year: i32) -> Result<SeedSummary> {
    if storage.stats()?.courses > 0 {
        info!("Database already has courses; skipping seed");
        return Ok(SeedSummary::default());
    }

    let reg_limit = format!("31/12/{year}");
    let courses = [
        (301, 1, "Δομές Δεδομένων", "Εισαγωγή στις δομές δεδομένων", "3ο Εξάμηνο"),
        (401, 2, "Βάσεις Δεδομένων", "Σχεσιακές βάσεις και SQL", "4ο Εξάμηνο"),
        (501, 1, "Λειτουργικά Συστήματα", "Αρχιτεκτονική λειτουργικών συστημάτων", "5ο Εξάμηνο"),
        (601, 2, "Δίκτυα Υπολογιστών", "TCP/IP και δικτυακός προγραμματισμός", "6ο Εξάμηνο"),
    ];
    let labs = [
        (3, 301, "Εργαστήριο Δομών Δεδομένων", "Υλοποίηση δομών σε C/C++", 20, 3),
        (4, 401, "Εργαστήριο Βάσεων Δεδομένων", "SQL και σχεδιασμός βάσεων", 18, 2),
        (5, 501, "Εργαστήριο Λειτουργικών Συστημάτων", "Linux και shell scripting", 15, 2),
        (6, 601, "Εργαστήριο Δικτύων", "Wireshark και socket programming", 12, 2),
    ];
    // (group, lab, professor, daytime)
    let groups = [
        (5, 3, 1, "Δευτέρα, 14 - 16"),
        (6, 3, 2, "Τετάρτη, 10 - 12"),
        (7, 4, 1, "Πέμπτη, 10 - 12"),
        (8, 4, 2, "Πέμπτη, 14 - 16"),
        (9, 5, 1, "Παρασκευή, 10 - 12"),
        (10, 5, 2, "Παρασκευή, 12 - 14"),
        (FULL_GROUP, 6, 1, "Σάββατο, 10 - 12"),
        (12, 6, 2, "Σάββατο, 12 - 14"),
    ];
    let professors = [
        (1, "Test Professor", "Καθηγητής", "Γραφείο 12", "prof1@uoi.gr", "2681050448"),
        (2, "Second Professor", "Λέκτορας", "Γραφείο 7", "prof2@uoi.gr", "2681050449"),
    ];

    let summary = storage.transaction(|storage| {
        let mut summary = SeedSummary::default();

        for (course_id, _, name, description, semester) in courses {
            storage.insert_course(&Course {
                course_id,
                name: name.to_string(),
                description: description.to_string(),
                semester: semester.to_string(),
            })?;
            summary.courses += 1;
        }

        for (lab_id, course_id, name, description, max_users, max_misses) in labs {
            storage.insert_lab(&Lab {
                lab_id,
                name: name.to_string(),
                description: description.to_string(),
                max_users,
                reg_limit: reg_limit.clone(),
                max_misses,
            })?;
            storage.link_course_lab(course_id, lab_id)?;
            summary.labs += 1;
        }

        for (prof_id, name, status, office, email, tel) in professors {
            storage.insert_professor(&Professor {
                prof_id,
                name: name.to_string(),
                status: status.to_string(),
                office: office.to_string(),
                email: email.to_string(),
                tel: tel.to_string(),
            })?;
            summary.professors += 1;
        }
        for (course_id, prof_id, ..) in courses {
            storage.link_course_professor(course_id, prof_id)?;
        }

        for (group_id, lab_id, prof_id, daytime) in groups {
            storage.insert_group(&LabGroup {
                group_id,
                daytime: daytime.to_string(),
                year,
                finalize: String::new(),
            })?;
            storage.link_lab_group(lab_id, group_id)?;
            storage.link_group_professor(group_id, prof_id)?;
            summary.groups += 1;
        }

        let mut students = vec![
            (13628, "Test Student".to_string(), 4, "student1@uoi.gr".to_string()),
            (FAILED_STUDENT, "Failed Student".to_string(), 5, "failed@uoi.gr".to_string()),
        ];
        students.extend((0..12).map(|i| {
            (
                90000 + i,
                format!("Test User {i}"),
                4,
                format!("test{i}@uoi.gr"),
            )
        }));
        for (am, name, semester, email) in students {
            storage.insert_student(&Student {
                am,
                name,
                semester,
                email,
            })?;
            summary.students += 1;
        }

        for am in 90000..90012 {
            storage.insert_group_enrollment(&GroupEnrollment {
                am,
                group_id: FULL_GROUP,
                reg_daymonth: "1/10".to_string(),
                reg_year: year,
            })?;
        }

        storage.insert_lab_enrollment(&LabEnrollment {
            id: None,
            am: FAILED_STUDENT,
            lab_id: 3,
            misses: 0,
            grade: 0,
            reg_month: 9,
            reg_year: year - 1,
            status: LabStatus::Failed,
        })?;

        Ok(summary)
    })?;

    info!(?summary, "Seeded demo data");
    Ok(summary)
}
