//! Date window module
//!
//! Month-aligned evaluation windows and billing data ids.
//!
//! # Overview
//!
//! - `EvaluationWindow` - inclusive `[start_date, end_date]` covering one month
//! - `BillingDataId` - `YYYYMMDD-YYYYMMDD` key naming a monthly billing window
//! - `months_lookback` - window for the month `n` months before the current one

mod types;

pub use types::{BillingDataId, EvaluationWindow, REPORT_GRACE_DAYS};

use crate::error::{Error, Result};
use chrono::{Datelike, Months, NaiveDate, Utc};
use tracing::info;

/// Window for the month `lookback_months` before the current UTC month.
///
/// `0` is the current month, `1` the previous month and so on.
pub fn months_lookback(lookback_months: i32) -> Result<EvaluationWindow> {
    let window = months_lookback_from(Utc::now().date_naive(), lookback_months)?;
    info!(
        "Eval dates: {} to {}",
        window.start_date(),
        window.end_date()
    );
    Ok(window)
}

/// Window for the month `lookback_months` before the month containing `today`
pub fn months_lookback_from(today: NaiveDate, lookback_months: i32) -> Result<EvaluationWindow> {
    let months = u32::try_from(lookback_months).map_err(|_| Error::InvalidLookback {
        months: lookback_months,
    })?;

    let start = first_of_month(today)
        .checked_sub_months(Months::new(months))
        .ok_or(Error::InvalidLookback {
            months: lookback_months,
        })?;

    EvaluationWindow::for_month(start)
}

/// First day of the month containing `date`
pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// First day of the month following the one containing `date`
pub fn first_of_next_month(date: NaiveDate) -> Option<NaiveDate> {
    first_of_month(date).checked_add_months(Months::new(1))
}

/// Last day of the month containing `date`
pub fn last_of_month(date: NaiveDate) -> Option<NaiveDate> {
    first_of_next_month(date).and_then(|d| d.pred_opt())
}
