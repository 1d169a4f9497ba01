//! `SQLite` schema definitions for labreg.
//!
//! Table and column names follow the portal's existing database so that a
//! `labregister.sqlite` file from the web deployment can be opened as is.

/// Courses.
pub const CREATE_COURSE_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS coursename (
    course_id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT NOT NULL,
    semester TEXT NOT NULL
)
";

/// Course to professor relation.
pub const CREATE_COURSE_PROF_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS coursetoprof (
    course_id INTEGER NOT NULL,
    prof_id INTEGER NOT NULL,
    PRIMARY KEY (course_id, prof_id)
)
";

/// Labs.
pub const CREATE_LAB_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS course_lab (
    lab_id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    description TEXT NOT NULL,
    maxusers INTEGER NOT NULL,
    reg_limit TEXT NOT NULL,
    max_misses INTEGER NOT NULL
)
";

/// Lab groups.
pub const CREATE_GROUP_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS lab_groups (
    group_id INTEGER PRIMARY KEY AUTOINCREMENT,
    daytime TEXT NOT NULL,
    year INTEGER NOT NULL,
    finalize TEXT NOT NULL
)
";

/// Professors.
pub const CREATE_PROFESSOR_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS professor (
    prof_id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    status TEXT NOT NULL,
    office TEXT NOT NULL,
    email TEXT NOT NULL,
    tel TEXT NOT NULL
)
";

/// Course to lab relation.
pub const CREATE_COURSE_LAB_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS rel_course_lab (
    course_id INTEGER NOT NULL,
    lab_id INTEGER NOT NULL,
    PRIMARY KEY (course_id, lab_id)
)
";

/// Group to professor relation.
pub const CREATE_GROUP_PROF_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS rel_group_prof (
    prof_id INTEGER NOT NULL,
    group_id INTEGER NOT NULL,
    PRIMARY KEY (prof_id, group_id)
)
";

/// Student seats in groups.
pub const CREATE_GROUP_STUDENT_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS rel_group_student (
    am INTEGER NOT NULL,
    group_id INTEGER NOT NULL,
    group_reg_daymonth TEXT NOT NULL,
    group_reg_year INTEGER NOT NULL,
    PRIMARY KEY (am, group_id)
)
";

/// Lab to group relation.
pub const CREATE_LAB_GROUP_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS rel_lab_group (
    lab_id INTEGER NOT NULL,
    group_id INTEGER NOT NULL,
    PRIMARY KEY (lab_id, group_id)
)
";

/// Student standing per lab.
pub const CREATE_LAB_STUDENT_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS rel_lab_student (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    am INTEGER NOT NULL,
    lab_id INTEGER NOT NULL,
    misses INTEGER NOT NULL,
    grade INTEGER NOT NULL,
    reg_month INTEGER NOT NULL,
    reg_year INTEGER NOT NULL,
    status TEXT NOT NULL
)
";

/// Students.
pub const CREATE_STUDENT_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS student (
    am INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    semester INTEGER NOT NULL,
    pwd TEXT NOT NULL DEFAULT '',
    email TEXT NOT NULL
)
";

/// Absence dates per student and group, comma separated.
pub const CREATE_MISSES_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS student_misses_pergroup (
    am INTEGER NOT NULL,
    group_id INTEGER NOT NULL,
    misses TEXT NOT NULL,
    PRIMARY KEY (am, group_id)
)
";

/// Lookups by student in `rel_lab_student`.
pub const CREATE_LAB_STUDENT_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_rel_lab_student_am_lab ON rel_lab_student(am, lab_id)
";

/// Capacity counts by group.
pub const CREATE_GROUP_STUDENT_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_rel_group_student_group ON rel_group_student(group_id)
";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_COURSE_TABLE,
    CREATE_COURSE_PROF_TABLE,
    CREATE_LAB_TABLE,
    CREATE_GROUP_TABLE,
    CREATE_PROFESSOR_TABLE,
    CREATE_COURSE_LAB_TABLE,
    CREATE_GROUP_PROF_TABLE,
    CREATE_GROUP_STUDENT_TABLE,
    CREATE_LAB_GROUP_TABLE,
    CREATE_LAB_STUDENT_TABLE,
    CREATE_STUDENT_TABLE,
    CREATE_MISSES_TABLE,
    CREATE_METADATA_TABLE,
];

/// Index statements, applied by migration 2.
pub const INDEX_STATEMENTS: &[&str] = &[CREATE_LAB_STUDENT_INDEX, CREATE_GROUP_STUDENT_INDEX];
