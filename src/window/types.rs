//! Window types

use super::{first_of_month, first_of_next_month, last_of_month};
use crate::error::{Error, Result};
use chrono::{Days, NaiveDate};
use std::fmt;

/// Trailing days added to a window when matching report creation dates.
///
/// Reports for the last day of a month are generated in the following month.
pub const REPORT_GRACE_DAYS: u64 = 3;

/// Inclusive date range, usually one calendar month
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvaluationWindow {
    start_date: NaiveDate,
    end_date: NaiveDate,
}

impl EvaluationWindow {
    /// Window covering the whole month that contains `date`
    pub fn for_month(date: NaiveDate) -> Result<Self> {
        let start_date = first_of_month(date);
        let end_date = last_of_month(date)
            .ok_or_else(|| Error::config(format!("No month end representable for {date}")))?;
        Ok(Self {
            start_date,
            end_date,
        })
    }

    /// Window with explicit bounds
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> Result<Self> {
        if start_date > end_date {
            return Err(Error::config(format!(
                "Window start {start_date} is after end {end_date}"
            )));
        }
        Ok(Self {
            start_date,
            end_date,
        })
    }

    /// First day of the window
    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    /// Last day of the window
    pub fn end_date(&self) -> NaiveDate {
        self.end_date
    }

    /// Whether `date` falls inside the window, inclusive on both ends
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }

    /// Last report creation date that can still hold usage for this window
    pub fn report_end_date(&self) -> NaiveDate {
        self.end_date
            .checked_add_days(Days::new(REPORT_GRACE_DAYS))
            .unwrap_or(self.end_date)
    }

    /// Whether a report created on `date` may hold usage for this window
    pub fn accepts_report_created(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.report_end_date()
    }
}

/// Billing data id: `<first of month>-<first of next month>` as `YYYYMMDD`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BillingDataId(String);

impl BillingDataId {
    /// Billing data id of the month containing `date`
    pub fn for_date(date: NaiveDate) -> Result<Self> {
        let first = first_of_month(date);
        let next = first_of_next_month(date)
            .ok_or_else(|| Error::config(format!("No following month representable for {date}")))?;
        Ok(Self(format!(
            "{}-{}",
            first.format("%Y%m%d"),
            next.format("%Y%m%d")
        )))
    }

    /// Borrow the id string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BillingDataId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for BillingDataId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
