//! Date arithmetic shared by the lifecycle stages.
//!
//! Two different notions of "month" coexist on purpose: cohort assignment
//! truncates to the calendar month, while customer and order age is counted
//! in fixed 30-day buckets. The mismatch is inherited from the source
//! dashboard and callers relying on cohort output for financial reporting
//! should be aware of it.

use chrono::{Datelike, NaiveDate};

/// Days per "month" when bucketing ages. Not a calendar month.
pub const DAYS_PER_AGE_BUCKET: i64 = 30;

/// Calendar-month key in `YYYY-MM` form, used for cohort assignment.
pub fn month_key(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

/// Whole days from `from` to `to`; negative when `to` precedes `from`.
pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}

/// Age in 30-day buckets, floored. Ages before `from` clamp to 0.
pub fn age_in_months(from: NaiveDate, to: NaiveDate) -> u32 {
    let days = days_between(from, to);
    if days <= 0 {
        0
    } else {
        (days / DAYS_PER_AGE_BUCKET) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_month_key_truncates_to_calendar_month() {
        assert_eq!(month_key(d(2025, 1, 31)), "2025-01");
        assert_eq!(month_key(d(2025, 12, 1)), "2025-12");
    }

    #[test]
    fn test_age_uses_thirty_day_buckets() {
        let first = d(2025, 1, 5);
        assert_eq!(age_in_months(first, d(2025, 1, 5)), 0);
        assert_eq!(age_in_months(first, d(2025, 2, 3)), 0); // 29 days
        assert_eq!(age_in_months(first, d(2025, 2, 4)), 1); // 30 days
        assert_eq!(age_in_months(first, d(2025, 4, 6)), 3); // 91 days
    }

    #[test]
    fn test_age_clamps_before_first_order() {
        assert_eq!(age_in_months(d(2025, 2, 1), d(2025, 1, 1)), 0);
    }
}
