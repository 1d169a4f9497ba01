//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::Subcommand;

use crate::model::{CourseId, GroupId, LabId, StudentId};

/// Database maintenance commands.
#[derive(Debug, Subcommand)]
pub enum DbCommand {
    /// Create the database and its schema
    Init,

    /// Insert demo courses, labs and groups into an empty database
    Seed {
        /// Academic year of the demo groups (defaults to the current one)
        #[arg(long)]
        year: Option<i32>,
    },

    /// Show row counts and database size
    Stats {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },
}

/// Catalog browsing commands.
#[derive(Debug, Subcommand)]
pub enum CatalogCommand {
    /// List semesters that have courses
    Semesters {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// List the courses of a semester
    Courses {
        /// Semester label as stored
        semester: String,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// List the labs of a course
    Labs {
        /// Course id
        course: CourseId,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// List the groups of a lab with their occupancy
    Groups {
        /// Lab id
        lab: LabId,

        /// Academic year (defaults to the current one)
        #[arg(long)]
        year: Option<i32>,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// List professors, or only those teaching a group
    Professors {
        /// Group id
        #[arg(long)]
        group: Option<GroupId>,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the current academic year
    Year {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },
}

/// Enrollment commands, acting as the logged-in student.
#[derive(Debug, Subcommand)]
pub enum EnrollCommand {
    /// Register to a lab and join one of its groups
    Register {
        /// Lab id
        #[arg(long)]
        lab: LabId,

        /// Group id
        #[arg(long)]
        group: GroupId,
    },

    /// Move to another group of the same lab
    Change {
        /// Lab id
        #[arg(long)]
        lab: LabId,

        /// Group currently held
        #[arg(long)]
        from: GroupId,

        /// Group to move to
        #[arg(long)]
        to: GroupId,
    },

    /// Leave a group
    Leave {
        /// Group id
        #[arg(long)]
        group: GroupId,
    },

    /// Show standing in a lab
    Status {
        /// Lab id
        #[arg(long)]
        lab: LabId,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// List labs and groups of an academic year
    List {
        /// Academic year (defaults to the current one)
        #[arg(long)]
        year: Option<i32>,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },
}

/// Profile commands, acting as the logged-in student.
#[derive(Debug, Subcommand)]
pub enum ProfileCommand {
    /// Show your student record
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Change your contact email
    Email {
        /// New email address
        address: String,
    },
}

/// Absence commands for professors and admins.
#[derive(Debug, Subcommand)]
pub enum AbsenceCommand {
    /// Record an absence
    Record {
        /// Student register number
        #[arg(long)]
        student: StudentId,

        /// Group id
        #[arg(long)]
        group: GroupId,

        /// Date of the missed session (YYYY-MM-DD)
        #[arg(long)]
        date: NaiveDate,

        /// Reason stored in the audit trail
        #[arg(long)]
        reason: Option<String>,
    },

    /// List the students of a group with their absences
    List {
        /// Group id
        #[arg(long)]
        group: GroupId,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}
