//! Core data model for punchcard.
//!
//! Diary entries as the service reports them, the month window that
//! bounds a fetch, and the per-artifact execution outcome.

use std::path::PathBuf;

use jiff::civil::Date;
use serde::Deserialize;

/// Integer identifier naming the authenticated principal.
pub type UserId = i64;

/// One calendar day's attendance record for a user.
///
/// Every field is optional on the wire. An entry missing any of the
/// four classification fields (`in`, `out`, `isHoliday`, `isWeekend`)
/// is simply never actionable; it is not an error.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiaryEntry {
    /// Calendar date as `YYYY-MM-DD`.
    pub date: Option<String>,

    /// Clock-in code. A sentinel value marks flexible-schedule days
    /// that were never clocked.
    #[serde(rename = "in")]
    pub check_in: Option<String>,

    /// Clock-out code; empty when the day was never clocked out.
    #[serde(rename = "out")]
    pub check_out: Option<String>,

    pub is_holiday: Option<bool>,
    pub is_weekend: Option<bool>,

    /// Identifier the fill-in request targets.
    pub diary_id: Option<i64>,
}

/// A (year, month) pair resolved to the closed date interval it covers.
///
/// Bounds the diary fetch; never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthWindow {
    pub first: Date,
    pub last: Date,
}

impl MonthWindow {
    /// Resolve a year and month to its first and last day.
    pub fn new(year: i16, month: i8) -> Result<Self, jiff::Error> {
        let first = Date::new(year, month, 1)?;
        Ok(Self {
            first,
            last: first.last_of_month(),
        })
    }

    /// Number of days in the month.
    pub fn days(&self) -> i8 {
        self.first.days_in_month()
    }
}

/// Outcome of dispatching one rendered request artifact.
#[derive(Debug)]
pub struct ExecutionResult {
    pub artifact: PathBuf,
    pub success: bool,

    /// Raw response text on success; diagnostic text on failure.
    pub output: String,
}
