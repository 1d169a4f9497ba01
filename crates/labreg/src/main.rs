//! `labreg` - CLI for the lab registration portal
//!
//! This binary exposes the registration workflow, catalog browsing and
//! absence tracking on the command line. Identity comes from `--as <user>`
//! in development mode.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use chrono::{Local, NaiveDate};
use clap::Parser;
use serde::Serialize;

use labreg::absences::Absences;
use labreg::academic;
use labreg::catalog::{professor_records, Catalog};
use labreg::cli::{
    AbsenceCommand, CatalogCommand, Cli, Command, ConfigCommand, DbCommand, EnrollCommand,
    ProfileCommand,
};
use labreg::model::Role;
use labreg::permissions::names::{
    ABSENCES, CATALOG, CHANGE, CONFIG, DASHBOARD, DATABASE, EDIT_GROUP_ABSENCES, EDIT_OWN_PROFILE,
    ENROLLMENTS, GROUPS, JOIN, LEAVE, MANAGE, PROFESSORS_LIST, STATS, STUDENTS_LIST, VIEW,
    VIEW_GROUP, VIEW_OWN, VIEW_OWN_PROFILE, VIEW_STATUS,
};
use labreg::permissions::require_role;
use labreg::privacy::PiiMasker;
use labreg::seed::seed_demo_data;
use labreg::{init_logging, AuditLog, Config, DevDirectory, PermissionMatrix, Profiles, Registrar};
use labreg::{Session, Storage};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbosity());

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if let Some(err) = e.downcast_ref::<labreg::Error>() {
                eprintln!("error [{}]: {err}", err.error_type());
            } else {
                eprintln!("error: {e:#}");
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    // Validation must work on a broken file, so it loads on its own.
    if let Command::Config(ConfigCommand::Validate { file }) = &cli.command {
        return handle_config_validate(file.clone().or_else(|| cli.config.clone()));
    }

    let config = Config::load_from(cli.config.clone())?;
    let app = App::new(config, cli.as_user.as_deref(), cli.show_audit)?;

    match cli.command {
        Command::Db(cmd) => app.handle_db(cmd)?,
        Command::Catalog(cmd) => app.handle_catalog(cmd)?,
        Command::Enroll(cmd) => app.handle_enroll(cmd)?,
        Command::Profile(cmd) => app.handle_profile(cmd)?,
        Command::Absence(cmd) => app.handle_absence(cmd)?,
        Command::Users { json } => app.handle_users(json)?,
        Command::Config(cmd) => app.handle_config(&cmd)?,
    }

    app.print_audit()?;
    Ok(())
}

/// Everything a command needs besides the database.
#[derive(Debug)]
struct App {
    config: Config,
    matrix: PermissionMatrix,
    audit: AuditLog,
    masker: PiiMasker,
    directory: DevDirectory,
    session: Option<Session>,
    show_audit: bool,
}

impl App {
    fn new(config: Config, as_user: Option<&str>, show_audit: bool) -> anyhow::Result<Self> {
        let matrix = PermissionMatrix::load_or_default(config.permissions.matrix_path.as_deref())?;
        let directory = DevDirectory::new(config.auth.mode, config.auth.dev_users.clone());
        let session = as_user
            .map(|user| directory.login(user).map(|s| s.with_remote_addr("cli")))
            .transpose()?;

        let mut audit = AuditLog::new().with_redaction(config.privacy.redact_audit);
        if show_audit {
            audit = audit.retaining();
        }

        Ok(Self {
            masker: PiiMasker::new(config.privacy.mask_fields.iter().cloned()),
            config,
            matrix,
            audit,
            directory,
            session,
            show_audit,
        })
    }

    fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    fn require(&self, resource: &str, action: &str) -> labreg::Result<Role> {
        self.matrix.require(self.session(), resource, action)
    }

    fn open_storage(&self) -> anyhow::Result<Storage> {
        let path = self.config.database_path();
        Storage::open(&path).with_context(|| format!("opening {}", path.display()))
    }

    fn registrar<'a>(&'a self, storage: &'a Storage) -> Registrar<'a> {
        let registrar = Registrar::new(storage, &self.audit)
            .with_cutoff_day(self.config.registration.academic_year_cutoff_day);
        match self.session() {
            Some(session) => registrar.with_session(session),
            None => registrar,
        }
    }

    fn today() -> NaiveDate {
        Local::now().date_naive()
    }

    fn academic_year(&self, year: Option<i32>) -> i32 {
        year.unwrap_or_else(|| {
            academic::academic_year(
                Self::today(),
                self.config.registration.academic_year_cutoff_day,
            )
        })
    }

    fn print_audit(&self) -> anyhow::Result<()> {
        if self.show_audit {
            for entry in self.audit.entries() {
                println!("{}", serde_json::to_string(&entry)?);
            }
        }
        Ok(())
    }

    fn handle_db(&self, cmd: DbCommand) -> anyhow::Result<()> {
        match cmd {
            DbCommand::Init => {
                self.require(DATABASE, MANAGE)?;
                let storage = self.open_storage()?;
                println!("Database ready at {}", storage.path().display());
            }
            DbCommand::Seed { year } => {
                self.require(DATABASE, MANAGE)?;
                let storage = self.open_storage()?;
                let summary = seed_demo_data(&storage, self.academic_year(year))?;
                if summary.courses == 0 {
                    println!("Database already has data; nothing seeded.");
                } else {
                    println!(
                        "Seeded {} courses, {} labs, {} groups, {} professors, {} students.",
                        summary.courses,
                        summary.labs,
                        summary.groups,
                        summary.professors,
                        summary.students
                    );
                }
            }
            DbCommand::Stats { json } => {
                self.require(DATABASE, STATS)?;
                let stats = self.open_storage()?.stats()?;
                if json {
                    print_json(&stats)?;
                } else {
                    println!("labreg database");
                    println!("---------------");
                    println!("Database:          {}", self.config.database_path().display());
                    println!("Courses:           {}", stats.courses);
                    println!("Labs:              {}", stats.labs);
                    println!("Groups:            {}", stats.groups);
                    println!("Professors:        {}", stats.professors);
                    println!("Students:          {}", stats.students);
                    println!("Lab enrollments:   {}", stats.lab_enrollments);
                    println!("Group enrollments: {}", stats.group_enrollments);
                    println!("Size:              {} bytes", stats.db_size_bytes);
                }
            }
        }
        Ok(())
    }

    fn handle_catalog(&self, cmd: CatalogCommand) -> anyhow::Result<()> {
        let (resource, action) = match &cmd {
            CatalogCommand::Groups { .. } => (GROUPS, VIEW),
            CatalogCommand::Professors { .. } => (PROFESSORS_LIST, VIEW),
            _ => (CATALOG, VIEW),
        };
        let role = self.require(resource, action)?;

        if let CatalogCommand::Year { json } = &cmd {
            let year = self.academic_year(None);
            if *json {
                print_json(&serde_json::json!({ "academic_year": year }))?;
            } else {
                println!("{year}");
            }
            return Ok(());
        }

        let storage = self.open_storage()?;
        let catalog = Catalog::new(&storage);

        match cmd {
            CatalogCommand::Semesters { json } => {
                let semesters = catalog.semesters()?;
                if json {
                    print_json(&semesters)?;
                } else {
                    for semester in semesters {
                        println!("{semester}");
                    }
                }
            }
            CatalogCommand::Courses { semester, json } => {
                let courses = catalog.courses(&semester)?;
                if json {
                    print_json(&courses)?;
                } else {
                    for course in courses {
                        println!("{:>5}  {}", course.course_id, course.name);
                    }
                }
            }
            CatalogCommand::Labs { course, json } => {
                let labs = catalog.labs(course)?;
                if json {
                    print_json(&labs)?;
                } else {
                    for lab in labs {
                        let limit = if lab.reg_limit.is_empty() {
                            "no limit"
                        } else {
                            lab.reg_limit.as_str()
                        };
                        println!(
                            "{:>5}  {}  (seats {}, until {limit})",
                            lab.lab_id, lab.name, lab.max_users
                        );
                    }
                }
            }
            CatalogCommand::Groups { lab, year, json } => {
                let groups = catalog.groups(lab, self.academic_year(year))?;
                if json {
                    print_json(&groups)?;
                } else {
                    for g in groups {
                        println!(
                            "{:>5}  {:<24} {}/{} ({}%)",
                            g.group.group_id,
                            g.group.daytime,
                            g.occupancy.current,
                            g.occupancy.max,
                            g.occupancy.percentage
                        );
                    }
                }
            }
            CatalogCommand::Professors { group, json } => {
                let professors = match group {
                    Some(group) => catalog.group_professors(group)?,
                    None => catalog.professors()?,
                };
                let records = professor_records(&professors, role, &self.masker)?;
                if json {
                    print_json(&records)?;
                } else {
                    for record in records {
                        println!(
                            "{}  <{}>  {}",
                            record["name"].as_str().unwrap_or_default(),
                            record["email"].as_str().unwrap_or_default(),
                            record["tel"].as_str().unwrap_or_default()
                        );
                    }
                }
            }
            CatalogCommand::Year { .. } => {}
        }
        Ok(())
    }

    fn handle_enroll(&self, cmd: EnrollCommand) -> anyhow::Result<()> {
        let student = require_role(self.session(), &[Role::Student])?;
        let (resource, action) = match &cmd {
            EnrollCommand::Register { .. } => (GROUPS, JOIN),
            EnrollCommand::Change { .. } => (GROUPS, CHANGE),
            EnrollCommand::Leave { .. } => (GROUPS, LEAVE),
            EnrollCommand::Status { .. } => (ENROLLMENTS, VIEW_STATUS),
            EnrollCommand::List { .. } => (ENROLLMENTS, VIEW_OWN),
        };
        self.require(resource, action)?;

        let am = student.user_id;
        let storage = self.open_storage()?;
        let registrar = self.registrar(&storage);

        match cmd {
            EnrollCommand::Register { lab, group } => {
                let registration = registrar.register_now(am, lab, group)?;
                println!(
                    "Registered {am} to lab {} in group {} ({:?}).",
                    registration.lab_id, registration.group_id, registration.kind
                );
            }
            EnrollCommand::Change { lab, from, to } => {
                let change = registrar.change_group_now(am, from, to, lab)?;
                println!(
                    "Moved {am} from group {} to group {}.",
                    change.old_group_id, change.new_group_id
                );
            }
            EnrollCommand::Leave { group } => {
                registrar.leave_group(am, group, Local::now().naive_local())?;
                println!("Left group {group}.");
            }
            EnrollCommand::Status { lab, json } => {
                let status = Catalog::new(&storage).enrollment_status(
                    am,
                    lab,
                    self.academic_year(None),
                    Self::today(),
                )?;
                if json {
                    print_json(&status)?;
                } else {
                    match &status.lab_status {
                        Some(info) => println!(
                            "Lab {lab}: {} (failures {}, registered {}/{})",
                            info.status, info.failures, info.reg_month, info.reg_year
                        ),
                        None => println!("Lab {lab}: not registered"),
                    }
                    if let Some(group) = status.current_group {
                        println!("Group:  {group}");
                    }
                    println!("Period: {}", status.period);
                }
            }
            EnrollCommand::List { year, json } => {
                let enrollments = registrar.enrollments(am, self.academic_year(year))?;
                if json {
                    print_json(&enrollments)?;
                } else if enrollments.is_empty() {
                    println!("No enrollments.");
                } else {
                    for e in enrollments {
                        println!(
                            "{:>5}  {:<40} {:<24} {}  absences: {}",
                            e.lab_id, e.lab_name, e.group_daytime, e.status, e.absences
                        );
                    }
                }
            }
        }
        Ok(())
    }

    fn handle_profile(&self, cmd: ProfileCommand) -> anyhow::Result<()> {
        match &cmd {
            ProfileCommand::Show { .. } => self.require(STUDENTS_LIST, VIEW_OWN_PROFILE)?,
            ProfileCommand::Email { .. } => self.require(STUDENTS_LIST, EDIT_OWN_PROFILE)?,
        };
        let storage = self.open_storage()?;
        let profiles = Profiles::new(&storage, &self.audit);

        match cmd {
            ProfileCommand::Show { json } => {
                let student = profiles.profile(self.session())?;
                if json {
                    print_json(&student)?;
                } else {
                    println!("AM:       {}", student.am);
                    println!("Name:     {}", student.name);
                    println!("Semester: {}", student.semester);
                    println!("Email:    {}", student.email);
                }
            }
            ProfileCommand::Email { address } => {
                let student = profiles.update_email(self.session(), &address)?;
                println!("Email of {} set to {}.", student.am, student.email);
            }
        }
        Ok(())
    }

    fn handle_absence(&self, cmd: AbsenceCommand) -> anyhow::Result<()> {
        match &cmd {
            AbsenceCommand::Record { .. } => self.require(ABSENCES, EDIT_GROUP_ABSENCES)?,
            AbsenceCommand::List { .. } => self.require(ABSENCES, VIEW_GROUP)?,
        };
        let storage = self.open_storage()?;
        let absences = Absences::new(&storage, &self.audit);

        match cmd {
            AbsenceCommand::Record {
                student,
                group,
                date,
                reason,
            } => {
                let list = absences.record_absence(
                    self.session(),
                    student,
                    group,
                    date,
                    reason.as_deref(),
                )?;
                println!("Absences of {student} in group {group}: {list}");
            }
            AbsenceCommand::List { group, json } => {
                let roster = absences.group_absences(self.session(), group)?;
                if json {
                    print_json(&roster)?;
                } else {
                    for entry in roster {
                        println!(
                            "{:>6}  {:<32} {}",
                            entry.student.am,
                            entry.student.name,
                            entry.absences.join(", ")
                        );
                    }
                }
            }
        }
        Ok(())
    }

    fn handle_users(&self, json: bool) -> anyhow::Result<()> {
        self.require(DASHBOARD, VIEW)?;
        let users = self
            .directory
            .users()
            .iter()
            .map(|(username, user)| -> anyhow::Result<serde_json::Value> {
                let mut record = self.masker.mask_record(user)?;
                record["username"] = username.clone().into();
                Ok(record)
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        if json {
            print_json(&users)?;
        } else {
            println!("Auth mode: {}", self.config.auth.mode);
            for user in users {
                println!(
                    "{:<12} {:<10} {:>6}  {:<20} {}",
                    user["username"].as_str().unwrap_or_default(),
                    user["role"].as_str().unwrap_or_default(),
                    user["id"],
                    user["name"].as_str().unwrap_or_default(),
                    user["email"].as_str().unwrap_or_default()
                );
            }
        }
        Ok(())
    }

    fn handle_config(&self, cmd: &ConfigCommand) -> anyhow::Result<()> {
        let config = &self.config;
        match cmd {
            ConfigCommand::Show { json } => {
                self.require(CONFIG, VIEW)?;
                if *json {
                    print_json(config)?;
                } else {
                    println!("Current Configuration");
                    println!("=====================");
                    println!();
                    println!("[Storage]");
                    println!("  Database path:      {}", config.database_path().display());
                    println!();
                    println!("[Auth]");
                    println!("  Mode:               {}", config.auth.mode);
                    println!("  Dev users:          {}", config.auth.dev_users.len());
                    println!();
                    println!("[Permissions]");
                    match &config.permissions.matrix_path {
                        Some(path) => println!("  Matrix:             {}", path.display()),
                        None => println!("  Matrix:             (embedded)"),
                    }
                    println!();
                    println!("[Registration]");
                    println!(
                        "  Year cutoff day:    {}",
                        config.registration.academic_year_cutoff_day
                    );
                    println!();
                    println!("[Privacy]");
                    println!(
                        "  Masked fields:      {}",
                        config.privacy.mask_fields.join(", ")
                    );
                    println!("  Redact audit:       {}", config.privacy.redact_audit);
                }
            }
            ConfigCommand::Path => {
                println!("{}", Config::default_config_path().display());
            }
            ConfigCommand::Validate { file } => {
                handle_config_validate(file.clone())?;
            }
        }
        Ok(())
    }
}

fn handle_config_validate(file: Option<PathBuf>) -> anyhow::Result<()> {
    let path = file.unwrap_or_else(Config::default_config_path);
    println!("Validating configuration: {}", path.display());
    let config = Config::load_from(Some(path))?;
    PermissionMatrix::load_or_default(config.permissions.matrix_path.as_deref())?;
    println!("Configuration is valid.");
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
