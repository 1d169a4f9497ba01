//! A student's own profile.

use tracing::info;

use crate::audit::{AuditLog, Change};
use crate::error::{Error, Result};
use crate::model::{Role, Student};
use crate::permissions::require_role;
use crate::session::Session;
use crate::storage::Storage;

/// Reads and updates the signed-in student's record.
#[derive(Debug)]
pub struct Profiles<'a> {
    storage: &'a Storage,
    audit: &'a AuditLog,
}

impl<'a> Profiles<'a> {
    /// Work on `storage`, auditing to `audit`.
    #[must_use]
    pub fn new(storage: &'a Storage, audit: &'a AuditLog) -> Self {
        Self { storage, audit }
    }

    /// The student record of the session.
    ///
    /// # Errors
    ///
    /// Returns an authorization error unless the session is a student,
    /// [`Error::StudentNotFound`], or a storage error.
    pub fn profile(&self, session: Option<&Session>) -> Result<Student> {
        let session = require_role(session, &[Role::Student])?;
        self.storage
            .student(session.user_id)?
            .ok_or(Error::StudentNotFound(session.user_id))
    }

    /// Change the session student's contact email.
    ///
    /// Returns the updated record. Setting the current address again writes
    /// nothing and is not audited.
    ///
    /// # Errors
    ///
    /// Returns an authorization error unless the session is a student,
    /// [`Error::InvalidInput`] for a malformed address,
    /// [`Error::StudentNotFound`], or a storage error.
    pub fn update_email(&self, session: Option<&Session>, email: &str) -> Result<Student> {
        let session = require_role(session, &[Role::Student])?;
        let email = email.trim();
        validate_email(email)?;

        let am = session.user_id;
        let (old_email, student) = self.storage.transaction(|storage| {
            let mut student = storage.student(am)?.ok_or(Error::StudentNotFound(am))?;
            if student.email == email {
                return Ok((None, student));
            }
            storage.update_student_email(am, email)?;
            let old = std::mem::replace(&mut student.email, email.to_string());
            Ok((Some(old), student))
        })?;

        if let Some(old_email) = old_email {
            self.audit.record(
                Some(session),
                "profile_updated",
                Change::new()
                    .old(format!("Email: {old_email}"))
                    .new_value(format!("Email: {email}"))
                    .reason("Student updated profile"),
            );
            info!(am, "Student email updated");
        }
        Ok(student)
    }
}

/// Accept `local@domain.tld` with no whitespace.
fn validate_email(email: &str) -> Result<()> {
    let valid = !email.chars().any(char::is_whitespace)
        && match email.split_once('@') {
            Some((local, domain)) => {
                !local.is_empty()
                    && !domain.contains('@')
                    && domain
                        .split_once('.')
                        .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
            }
            None => false,
        };
    if valid {
        Ok(())
    } else {
        Err(Error::invalid_input(format!("not an email address: {email}")))
    }
}
