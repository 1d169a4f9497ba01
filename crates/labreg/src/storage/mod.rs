//! Storage layer for labreg.
//!
//! This module provides `SQLite`-based persistence for the course, lab and
//! group hierarchy and for the enrollment relations the registration
//! workflow reads and writes.

pub mod migrations;
pub mod schema;

use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::model::{
    Course, CourseId, EnrollmentSummary, GroupEnrollment, GroupId, Lab, LabEnrollment, LabGroup,
    LabId, LabStatus, Professor, ProfessorId, Student, StudentId,
};

/// Storage engine for the portal database.
#[derive(Debug)]
pub struct Storage {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
}

impl Storage {
    /// Open or create a storage database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    /// Initializes the schema if this is a new database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        migrations::initialize_schema(&conn)?;

        info!("Database opened successfully at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Create an in-memory storage instance for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run `f` inside a single transaction.
    ///
    /// The transaction commits when `f` returns `Ok` and rolls back when it
    /// returns an error. Transactions do not nest.
    ///
    /// # Errors
    ///
    /// Returns the closure's error, or an error if the transaction cannot be
    /// started or committed.
    pub fn transaction<T>(&self, f: impl FnOnce(&Self) -> Result<T>) -> Result<T> {
        let tx = self.conn.unchecked_transaction()?;
        match f(self) {
            Ok(value) => {
                tx.commit()?;
                Ok(value)
            }
            Err(e) => {
                debug!("Rolling back transaction: {}", e);
                // Dropping the transaction rolls it back.
                drop(tx);
                Err(e)
            }
        }
    }

    /// Run raw SQL against the connection.
    #[cfg(test)]
    pub(crate) fn execute_batch(&self, sql: &str) -> Result<()> {
        self.conn.execute_batch(sql)?;
        Ok(())
    }

    // === Catalog writes ===

    /// Insert a course with an explicit id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn insert_course(&self, course: &Course) -> Result<()> {
        self.conn.execute(
            "INSERT INTO coursename (course_id, name, description, semester) VALUES (?1, ?2, ?3, ?4)",
            params![
                course.course_id,
                course.name,
                course.description,
                course.semester
            ],
        )?;
        Ok(())
    }

    /// Insert a lab and return its id.
    ///
    /// A `lab_id` of 0 lets the database assign one.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn insert_lab(&self, lab: &Lab) -> Result<LabId> {
        let id = (lab.lab_id != 0).then_some(lab.lab_id);
        self.conn.execute(
            r"
            INSERT INTO course_lab (lab_id, name, description, maxusers, reg_limit, max_misses)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ",
            params![
                id,
                lab.name,
                lab.description,
                lab.max_users,
                lab.reg_limit,
                lab.max_misses
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Insert a lab group and return its id.
    ///
    /// A `group_id` of 0 lets the database assign one.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn insert_group(&self, group: &LabGroup) -> Result<GroupId> {
        let id = (group.group_id != 0).then_some(group.group_id);
        self.conn.execute(
            "INSERT INTO lab_groups (group_id, daytime, year, finalize) VALUES (?1, ?2, ?3, ?4)",
            params![id, group.daytime, group.year, group.finalize],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Insert a professor and return their id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn insert_professor(&self, prof: &Professor) -> Result<ProfessorId> {
        let id = (prof.prof_id != 0).then_some(prof.prof_id);
        self.conn.execute(
            r"
            INSERT INTO professor (prof_id, name, status, office, email, tel)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ",
            params![id, prof.name, prof.status, prof.office, prof.email, prof.tel],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Insert a student.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn insert_student(&self, student: &Student) -> Result<()> {
        self.conn.execute(
            "INSERT INTO student (am, name, semester, email) VALUES (?1, ?2, ?3, ?4)",
            params![student.am, student.name, student.semester, student.email],
        )?;
        Ok(())
    }

    /// Attach a lab to a course.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn link_course_lab(&self, course_id: CourseId, lab_id: LabId) -> Result<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO rel_course_lab (course_id, lab_id) VALUES (?1, ?2)",
            params![course_id, lab_id],
        )?;
        Ok(())
    }

    /// Attach a group to a lab.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn link_lab_group(&self, lab_id: LabId, group_id: GroupId) -> Result<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO rel_lab_group (lab_id, group_id) VALUES (?1, ?2)",
            params![lab_id, group_id],
        )?;
        Ok(())
    }

    /// Assign a professor to a group.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn link_group_professor(&self, group_id: GroupId, prof_id: ProfessorId) -> Result<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO rel_group_prof (prof_id, group_id) VALUES (?1, ?2)",
            params![prof_id, group_id],
        )?;
        Ok(())
    }

    /// Assign a professor to a course.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn link_course_professor(&self, course_id: CourseId, prof_id: ProfessorId) -> Result<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO coursetoprof (course_id, prof_id) VALUES (?1, ?2)",
            params![course_id, prof_id],
        )?;
        Ok(())
    }

    // === Catalog reads ===

    /// Get a lab by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn lab(&self, lab_id: LabId) -> Result<Option<Lab>> {
        let lab = self
            .conn
            .query_row(
                r"
                SELECT lab_id, name, description, maxusers, reg_limit, max_misses
                FROM course_lab WHERE lab_id = ?1
                ",
                [lab_id],
                Self::row_to_lab,
            )
            .optional()?;
        Ok(lab)
    }

    /// Get a lab group by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn group(&self, group_id: GroupId) -> Result<Option<LabGroup>> {
        let group = self
            .conn
            .query_row(
                "SELECT group_id, daytime, year, finalize FROM lab_groups WHERE group_id = ?1",
                [group_id],
                Self::row_to_group,
            )
            .optional()?;
        Ok(group)
    }

    /// Get a professor by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn professor(&self, prof_id: ProfessorId) -> Result<Option<Professor>> {
        let prof = self
            .conn
            .query_row(
                r"
                SELECT prof_id, name, status, office, email, tel
                FROM professor WHERE prof_id = ?1
                ",
                [prof_id],
                Self::row_to_professor,
            )
            .optional()?;
        Ok(prof)
    }

    /// Get a student by register number.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn student(&self, am: StudentId) -> Result<Option<Student>> {
        let student = self
            .conn
            .query_row(
                "SELECT am, name, semester, email FROM student WHERE am = ?1",
                [am],
                Self::row_to_student,
            )
            .optional()?;
        Ok(student)
    }

    /// All professors, by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn professors(&self) -> Result<Vec<Professor>> {
        let mut stmt = self.conn.prepare(
            "SELECT prof_id, name, status, office, email, tel FROM professor ORDER BY name, prof_id",
        )?;
        let profs = stmt
            .query_map([], Self::row_to_professor)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(profs)
    }

    /// Replace a student's contact email.
    ///
    /// Returns `true` if the student exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn update_student_email(&self, am: StudentId, email: &str) -> Result<bool> {
        let affected = self.conn.execute(
            "UPDATE student SET email = ?1 WHERE am = ?2",
            params![email, am],
        )?;
        Ok(affected > 0)
    }

    /// Distinct course semesters, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn semesters(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT semester FROM coursename ORDER BY semester")?;
        let semesters = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(semesters)
    }

    /// Courses of a semester, by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn courses_by_semester(&self, semester: &str) -> Result<Vec<Course>> {
        let mut stmt = self.conn.prepare(
            r"
            SELECT course_id, name, description, semester
            FROM coursename WHERE semester = ?1 ORDER BY name
            ",
        )?;
        let courses = stmt
            .query_map([semester], |row| {
                Ok(Course {
                    course_id: row.get(0)?,
                    name: row.get(1)?,
                    description: row.get(2)?,
                    semester: row.get(3)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(courses)
    }

    /// Labs attached to a course.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn labs_for_course(&self, course_id: CourseId) -> Result<Vec<Lab>> {
        let mut stmt = self.conn.prepare(
            r"
            SELECT l.lab_id, l.name, l.description, l.maxusers, l.reg_limit, l.max_misses
            FROM course_lab l
            JOIN rel_course_lab r ON r.lab_id = l.lab_id
            WHERE r.course_id = ?1
            ORDER BY l.lab_id
            ",
        )?;
        let labs = stmt
            .query_map([course_id], Self::row_to_lab)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(labs)
    }

    /// Groups of a lab, optionally restricted to one academic year.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn groups_for_lab(&self, lab_id: LabId, year: Option<i32>) -> Result<Vec<LabGroup>> {
        let mut stmt = self.conn.prepare(
            r"
            SELECT g.group_id, g.daytime, g.year, g.finalize
            FROM lab_groups g
            JOIN rel_lab_group r ON r.group_id = g.group_id
            WHERE r.lab_id = ?1 AND (?2 IS NULL OR g.year = ?2)
            ORDER BY g.group_id
            ",
        )?;
        let groups = stmt
            .query_map(params![lab_id, year], Self::row_to_group)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(groups)
    }

    /// The lab a group belongs to.
    ///
    /// If a group is attached to several labs the lowest lab id wins.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn lab_for_group(&self, group_id: GroupId) -> Result<Option<LabId>> {
        let lab_id = self
            .conn
            .query_row(
                "SELECT lab_id FROM rel_lab_group WHERE group_id = ?1 ORDER BY lab_id LIMIT 1",
                [group_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(lab_id)
    }

    /// Professors assigned to a group.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn professors_for_group(&self, group_id: GroupId) -> Result<Vec<Professor>> {
        let mut stmt = self.conn.prepare(
            r"
            SELECT p.prof_id, p.name, p.status, p.office, p.email, p.tel
            FROM professor p
            JOIN rel_group_prof r ON r.prof_id = p.prof_id
            WHERE r.group_id = ?1
            ORDER BY p.name
            ",
        )?;
        let profs = stmt
            .query_map([group_id], Self::row_to_professor)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(profs)
    }

    // === Enrollments ===

    /// A student's enrollment in a lab.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn lab_enrollment(&self, am: StudentId, lab_id: LabId) -> Result<Option<LabEnrollment>> {
        let enrollment = self
            .conn
            .query_row(
                r"
                SELECT id, am, lab_id, misses, grade, reg_month, reg_year, status
                FROM rel_lab_student WHERE am = ?1 AND lab_id = ?2
                ORDER BY id LIMIT 1
                ",
                params![am, lab_id],
                Self::row_to_lab_enrollment,
            )
            .optional()?;
        Ok(enrollment)
    }

    /// Insert a lab enrollment and return its row id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn insert_lab_enrollment(&self, enrollment: &LabEnrollment) -> Result<i64> {
        self.conn.execute(
            r"
            INSERT INTO rel_lab_student (am, lab_id, misses, grade, reg_month, reg_year, status)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ",
            params![
                enrollment.am,
                enrollment.lab_id,
                enrollment.misses,
                enrollment.grade,
                enrollment.reg_month,
                enrollment.reg_year,
                enrollment.status.as_db_str(),
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        debug!("Inserted lab enrollment with id {}", id);
        Ok(id)
    }

    /// Overwrite the mutable columns of a stored lab enrollment.
    ///
    /// # Errors
    ///
    /// Returns an error if the enrollment has no id or the database operation fails.
    pub fn update_lab_enrollment(&self, enrollment: &LabEnrollment) -> Result<()> {
        let id = enrollment
            .id
            .ok_or_else(|| Error::internal("cannot update a lab enrollment without an id"))?;
        self.conn.execute(
            r"
            UPDATE rel_lab_student
            SET misses = ?1, grade = ?2, reg_month = ?3, reg_year = ?4, status = ?5
            WHERE id = ?6
            ",
            params![
                enrollment.misses,
                enrollment.grade,
                enrollment.reg_month,
                enrollment.reg_year,
                enrollment.status.as_db_str(),
                id,
            ],
        )?;
        Ok(())
    }

    /// Number of students seated in a group.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn count_group_students(&self, group_id: GroupId) -> Result<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM rel_group_student WHERE group_id = ?1",
            [group_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// A student's seat in a specific group.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn group_enrollment(
        &self,
        am: StudentId,
        group_id: GroupId,
    ) -> Result<Option<GroupEnrollment>> {
        let enrollment = self
            .conn
            .query_row(
                r"
                SELECT am, group_id, group_reg_daymonth, group_reg_year
                FROM rel_group_student WHERE am = ?1 AND group_id = ?2
                ",
                params![am, group_id],
                Self::row_to_group_enrollment,
            )
            .optional()?;
        Ok(enrollment)
    }

    /// The student's seat among the groups of `lab_id` held in `year`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn group_enrollment_in_lab(
        &self,
        am: StudentId,
        lab_id: LabId,
        year: i32,
    ) -> Result<Option<GroupEnrollment>> {
        let enrollment = self
            .conn
            .query_row(
                r"
                SELECT s.am, s.group_id, s.group_reg_daymonth, s.group_reg_year
                FROM rel_group_student s
                JOIN lab_groups g ON g.group_id = s.group_id
                JOIN rel_lab_group r ON r.group_id = g.group_id
                WHERE s.am = ?1 AND r.lab_id = ?2 AND g.year = ?3
                ORDER BY s.group_id LIMIT 1
                ",
                params![am, lab_id, year],
                Self::row_to_group_enrollment,
            )
            .optional()?;
        Ok(enrollment)
    }

    /// Seat a student in a group.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails, including when the
    /// student already holds that seat.
    pub fn insert_group_enrollment(&self, enrollment: &GroupEnrollment) -> Result<()> {
        self.conn.execute(
            r"
            INSERT INTO rel_group_student (am, group_id, group_reg_daymonth, group_reg_year)
            VALUES (?1, ?2, ?3, ?4)
            ",
            params![
                enrollment.am,
                enrollment.group_id,
                enrollment.reg_daymonth,
                enrollment.reg_year
            ],
        )?;
        Ok(())
    }

    /// Move a student's seat from one group to another.
    ///
    /// Returns `true` if a seat was moved.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn move_group_enrollment(
        &self,
        am: StudentId,
        from: GroupId,
        to: &GroupEnrollment,
    ) -> Result<bool> {
        let affected = self.conn.execute(
            r"
            UPDATE rel_group_student
            SET group_id = ?1, group_reg_daymonth = ?2, group_reg_year = ?3
            WHERE am = ?4 AND group_id = ?5
            ",
            params![to.group_id, to.reg_daymonth, to.reg_year, am, from],
        )?;
        Ok(affected > 0)
    }

    /// Remove a student's seat in a group.
    ///
    /// Returns `true` if a seat was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn delete_group_enrollment(&self, am: StudentId, group_id: GroupId) -> Result<bool> {
        let affected = self.conn.execute(
            "DELETE FROM rel_group_student WHERE am = ?1 AND group_id = ?2",
            params![am, group_id],
        )?;
        Ok(affected > 0)
    }

    /// Students seated in a group, by register number.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn group_students(&self, group_id: GroupId) -> Result<Vec<Student>> {
        let mut stmt = self.conn.prepare(
            r"
            SELECT st.am, st.name, st.semester, st.email
            FROM student st
            JOIN rel_group_student s ON s.am = st.am
            WHERE s.group_id = ?1
            ORDER BY st.am
            ",
        )?;
        let students = stmt
            .query_map([group_id], Self::row_to_student)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(students)
    }

    /// Lab enrollments of a student joined with the groups they hold in `year`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn student_enrollments(&self, am: StudentId, year: i32) -> Result<Vec<EnrollmentSummary>> {
        let mut stmt = self.conn.prepare(
            r"
            SELECT DISTINCT l.name, l.lab_id, g.daytime, g.group_id, ls.status, ls.grade,
                   m.misses
            FROM course_lab l
            JOIN rel_lab_student ls ON ls.lab_id = l.lab_id
            JOIN rel_lab_group rlg ON rlg.lab_id = l.lab_id
            JOIN lab_groups g ON g.group_id = rlg.group_id
            JOIN rel_group_student gs ON gs.group_id = g.group_id AND gs.am = ls.am
            LEFT JOIN student_misses_pergroup m ON m.am = ls.am AND m.group_id = g.group_id
            WHERE ls.am = ?1 AND g.year = ?2
            ORDER BY l.lab_id, g.group_id
            ",
        )?;
        let rows = stmt
            .query_map(params![am, year], |row| {
                let status: String = row.get(4)?;
                let absences: Option<String> = row.get(6)?;
                Ok(EnrollmentSummary {
                    lab_name: row.get(0)?,
                    lab_id: row.get(1)?,
                    group_daytime: row.get(2)?,
                    group_id: row.get(3)?,
                    status: Self::parse_status(&status),
                    grade: row.get(5)?,
                    absences: absences
                        .filter(|a| !a.is_empty())
                        .unwrap_or_else(|| "-".to_string()),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    // === Absences ===

    /// The recorded absence list of a student in a group.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn absences(&self, am: StudentId, group_id: GroupId) -> Result<Option<String>> {
        let misses = self
            .conn
            .query_row(
                "SELECT misses FROM student_misses_pergroup WHERE am = ?1 AND group_id = ?2",
                params![am, group_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(misses)
    }

    /// Replace the absence list of a student in a group.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn set_absences(&self, am: StudentId, group_id: GroupId, misses: &str) -> Result<()> {
        self.conn.execute(
            r"
            INSERT INTO student_misses_pergroup (am, group_id, misses) VALUES (?1, ?2, ?3)
            ON CONFLICT (am, group_id) DO UPDATE SET misses = excluded.misses
            ",
            params![am, group_id, misses],
        )?;
        Ok(())
    }

    /// Get database statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self) -> Result<StorageStats> {
        let count = |table: &str| -> Result<i64> {
            let n = self
                .conn
                .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
                    row.get(0)
                })?;
            Ok(n)
        };

        let db_size_bytes = if self.path.to_string_lossy() == ":memory:" {
            0
        } else {
            std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
        };

        Ok(StorageStats {
            courses: count("coursename")?,
            labs: count("course_lab")?,
            groups: count("lab_groups")?,
            professors: count("professor")?,
            students: count("student")?,
            lab_enrollments: count("rel_lab_student")?,
            group_enrollments: count("rel_group_student")?,
            db_size_bytes,
        })
    }

    // === Row mapping ===

    fn parse_status(status: &str) -> LabStatus {
        LabStatus::from_db_str(status).unwrap_or_else(|| {
            warn!("Unknown lab status: {}, defaulting to in progress", status);
            LabStatus::InProgress
        })
    }

    fn row_to_lab(row: &rusqlite::Row) -> rusqlite::Result<Lab> {
        Ok(Lab {
            lab_id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            max_users: row.get(3)?,
            reg_limit: row.get(4)?,
            max_misses: row.get(5)?,
        })
    }

    fn row_to_group(row: &rusqlite::Row) -> rusqlite::Result<LabGroup> {
        Ok(LabGroup {
            group_id: row.get(0)?,
            daytime: row.get(1)?,
            year: row.get(2)?,
            finalize: row.get(3)?,
        })
    }

    fn row_to_professor(row: &rusqlite::Row) -> rusqlite::Result<Professor> {
        Ok(Professor {
            prof_id: row.get(0)?,
            name: row.get(1)?,
            status: row.get(2)?,
            office: row.get(3)?,
            email: row.get(4)?,
            tel: row.get(5)?,
        })
    }

    fn row_to_student(row: &rusqlite::Row) -> rusqlite::Result<Student> {
        Ok(Student {
            am: row.get(0)?,
            name: row.get(1)?,
            semester: row.get(2)?,
            email: row.get(3)?,
        })
    }

    fn row_to_lab_enrollment(row: &rusqlite::Row) -> rusqlite::Result<LabEnrollment> {
        let status: String = row.get(7)?;
        Ok(LabEnrollment {
            id: Some(row.get(0)?),
            am: row.get(1)?,
            lab_id: row.get(2)?,
            misses: row.get(3)?,
            grade: row.get(4)?,
            reg_month: row.get(5)?,
            reg_year: row.get(6)?,
            status: Self::parse_status(&status),
        })
    }

    fn row_to_group_enrollment(row: &rusqlite::Row) -> rusqlite::Result<GroupEnrollment> {
        Ok(GroupEnrollment {
            am: row.get(0)?,
            group_id: row.get(1)?,
            reg_daymonth: row.get(2)?,
            reg_year: row.get(3)?,
        })
    }
}

/// Row counts and size of the database.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct StorageStats {
    /// Number of courses.
    pub courses: i64,
    /// Number of labs.
    pub labs: i64,
    /// Number of lab groups.
    pub groups: i64,
    /// Number of professors.
    pub professors: i64,
    /// Number of students.
    pub students: i64,
    /// Number of lab enrollments.
    pub lab_enrollments: i64,
    /// Number of group seats.
    pub group_enrollments: i64,
    /// Size of the database file in bytes.
    pub db_size_bytes: u64,
}
