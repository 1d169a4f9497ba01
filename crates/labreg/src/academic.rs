//! Academic calendar rules.

use chrono::{Datelike, NaiveDate};

/// Day of year before which a date still belongs to the previous academic year.
pub const DEFAULT_YEAR_CUTOFF_DAY: u32 = 35;

/// Academic year that `date` falls in.
///
/// Dates whose day of year is below `cutoff_day` (early February with the
/// default) count towards the previous calendar year.
#[must_use]
pub fn academic_year(date: NaiveDate, cutoff_day: u32) -> i32 {
    if date.ordinal() < cutoff_day {
        date.year() - 1
    } else {
        date.year()
    }
}

/// A lab's registration deadline, as interpreted from free text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegLimit {
    /// No deadline configured.
    None,
    /// Registrations accepted up to and including this day.
    Until(NaiveDate),
    /// Text that is neither `DD/MM/YYYY` nor `YYYY-MM-DD`.
    Unparseable,
}

/// Parse the `reg_limit` column.
#[must_use]
pub fn parse_reg_limit(text: &str) -> RegLimit {
    let text = text.trim();
    if text.is_empty() {
        return RegLimit::None;
    }
    NaiveDate::parse_from_str(text, "%d/%m/%Y")
        .or_else(|_| NaiveDate::parse_from_str(text, "%Y-%m-%d"))
        .map_or(RegLimit::Unparseable, RegLimit::Until)
}

/// Registration date in the `D/M` form stored with group seats.
#[must_use]
pub fn day_month(date: NaiveDate) -> String {
    format!("{}/{}", date.day(), date.month())
}
