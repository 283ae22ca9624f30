//! Shared utility functions for NFH crates.

/// Date utility functions
pub mod dates {
    use crate::error::DateError;
    use chrono::{Datelike, Local, NaiveDate};

    /// Format used for backend date filters and report text: "YYYY-MM-DD"
    pub const ISO_FORMAT: &str = "%Y-%m-%d";

    const MONTH_NAMES: [&str; 12] = [
        "January",
        "February",
        "March",
        "April",
        "May",
        "June",
        "July",
        "August",
        "September",
        "October",
        "November",
        "December",
    ];

    /// Format a NaiveDate as "YYYY-MM-DD"
    pub fn format_date(date: &NaiveDate) -> String {
        date.format(ISO_FORMAT).to_string()
    }

    /// English name of a calendar month (1 = January).
    pub fn month_name(month: u32) -> Result<&'static str, DateError> {
        match month {
            1..=12 => Ok(MONTH_NAMES[(month - 1) as usize]),
            m => Err(DateError(format!("month out of range: {m}"))),
        }
    }

    /// Label used for a month in trend series, e.g. "2023-01".
    pub fn month_label(year: i32, month: u32) -> String {
        format!("{year}-{month:02}")
    }

    /// Calendar months from `start` through `end` (inclusive).
    ///
    /// Yields nothing when `start > end`.
    pub fn months_between(start: u32, end: u32) -> impl Iterator<Item = u32> {
        start.max(1)..=end.min(12)
    }

    /// The current calendar year in local time.
    pub fn current_year() -> i32 {
        Local::now().naive_local().date().year()
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use chrono::NaiveDate;

        #[test]
        fn test_format_date() {
            let date = NaiveDate::from_ymd_opt(2023, 6, 5).unwrap();
            assert_eq!(format_date(&date), "2023-06-05");
        }

        #[test]
        fn test_month_name() {
            assert_eq!(month_name(1).unwrap(), "January");
            assert_eq!(month_name(12).unwrap(), "December");
            assert!(month_name(0).is_err());
            assert!(month_name(13).is_err());
        }

        #[test]
        fn test_month_label_zero_padded() {
            assert_eq!(month_label(2023, 3), "2023-03");
            assert_eq!(month_label(2023, 11), "2023-11");
        }

        #[test]
        fn test_months_between() {
            let months: Vec<u32> = months_between(1, 3).collect();
            assert_eq!(months, vec![1, 2, 3]);
            assert_eq!(months_between(5, 4).count(), 0);
            assert_eq!(months_between(0, 20).count(), 12);
        }
    }
}

/// Error types
pub mod error {
    use std::fmt;

    #[derive(Debug)]
    pub struct DateError(pub String);

    impl fmt::Display for DateError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "Date error: {}", self.0)
        }
    }

    impl std::error::Error for DateError {}
}
