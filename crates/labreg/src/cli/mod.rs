//! Command-line interface for labreg.
//!
//! This module provides the CLI structure for the `labreg` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    AbsenceCommand, CatalogCommand, ConfigCommand, DbCommand, EnrollCommand, ProfileCommand,
};

use crate::logging::Verbosity;

/// labreg - University lab registration
///
/// Browse courses and lab groups, register students to labs, and keep
/// group absence records.
#[derive(Debug, Parser)]
#[command(name = "labreg")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Act as a development user (requires auth mode `dev`)
    #[arg(long = "as", global = true, value_name = "USER")]
    pub as_user: Option<String>,

    /// Print the audit entries written by the command
    #[arg(long, global = true)]
    pub show_audit: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage the database
    #[command(subcommand)]
    Db(DbCommand),

    /// Browse semesters, courses, labs and groups
    #[command(subcommand)]
    Catalog(CatalogCommand),

    /// Register to labs and manage group seats
    #[command(subcommand)]
    Enroll(EnrollCommand),

    /// View or update your student profile
    #[command(subcommand)]
    Profile(ProfileCommand),

    /// Record and list absences
    #[command(subcommand)]
    Absence(AbsenceCommand),

    /// List development users
    Users {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.quiet, self.verbose)
    }
}
