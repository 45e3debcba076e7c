//! # Calendar Arithmetic
//!
//! The single place where month offsets are computed. Every deadline in the
//! crate (board buckets, inventory forecast, pickup dates) goes through
//! [`add_months`] so they can never disagree.
//!
//! ## Month-end rule
//!
//! The day of month is clamped to the last day of the target month:
//! - Jan 31 + 6 months = Jul 31
//! - Aug 31 + 6 months = Feb 28 (Feb 29 in leap years)
//! - Mar 31 + 6 months = Sep 30

use crate::primitives::PHASE_LENGTH_MONTHS;
use chrono::{Months, NaiveDate};

/// Add whole calendar months to a date, clamping the day to month end.
///
/// Saturates at `NaiveDate::MAX` instead of failing.
#[must_use]
pub fn add_months(date: NaiveDate, months: u32) -> NaiveDate {
    date.checked_add_months(Months::new(months))
        .unwrap_or(NaiveDate::MAX)
}

/// Date at which Phase 1 dosimeters are due for pickup.
#[must_use]
pub fn pickup_deadline(start: NaiveDate) -> NaiveDate {
    add_months(start, PHASE_LENGTH_MONTHS)
}

/// Whole days from `today` until `deadline`; negative once overdue.
#[must_use]
pub fn days_until(today: NaiveDate, deadline: NaiveDate) -> i64 {
    deadline.signed_duration_since(today).num_days()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).expect("valid date")
    }

    #[test]
    fn plain_offset() {
        assert_eq!(pickup_deadline(d(2025, 1, 13)), d(2025, 7, 13));
    }

    #[test]
    fn month_end_clamps() {
        assert_eq!(add_months(d(2025, 1, 31), 6), d(2025, 7, 31));
        assert_eq!(add_months(d(2025, 3, 31), 6), d(2025, 9, 30));
        assert_eq!(add_months(d(2025, 8, 31), 6), d(2026, 2, 28));
        assert_eq!(add_months(d(2023, 8, 31), 6), d(2024, 2, 29));
    }

    #[test]
    fn crosses_year() {
        assert_eq!(pickup_deadline(d(2025, 11, 3)), d(2026, 5, 3));
    }

    #[test]
    fn saturates_at_max() {
        assert_eq!(add_months(NaiveDate::MAX, 6), NaiveDate::MAX);
    }

    #[test]
    fn days_until_sign() {
        assert_eq!(days_until(d(2025, 7, 1), d(2025, 7, 13)), 12);
        assert_eq!(days_until(d(2025, 7, 20), d(2025, 7, 13)), -7);
    }
}
