use crate::error::{GeoError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Day of month used as the end of a seasonal comparison window.
///
/// Every month is cut at the 28th regardless of its length.
pub const SEASON_END_DAY: u32 = 28;

/// A window of acquisition dates.
///
/// The end date is exclusive when filtering acquisitions, matching the
/// geospatial backend's date filter.
#[derive(Clone, Eq, PartialEq, Copy, Debug, Serialize, Deserialize)]
pub struct DateRange(pub NaiveDate, pub NaiveDate);

fn ymd(year: i32, month: u32, day: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day).ok_or(GeoError::InvalidMonth(month))
}

impl DateRange {
    /// Seasonal window for one comparison year: the 1st of `start_month`
    /// through the 28th of `end_month`.
    pub fn season(year: i32, start_month: u32, end_month: u32) -> Result<DateRange> {
        let start = ymd(year, start_month, 1)?;
        let end = ymd(year, end_month, SEASON_END_DAY)?;
        if end < start {
            return Err(GeoError::InvalidRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(DateRange(start, end))
    }

    /// A whole calendar month, ending on the 1st of the following month.
    /// December rolls over into January of the next year.
    pub fn month(year: i32, month: u32) -> Result<DateRange> {
        let start = ymd(year, month, 1)?;
        let end = if month == 12 {
            ymd(year + 1, 1, 1)?
        } else {
            ymd(year, month + 1, 1)?
        };
        Ok(DateRange(start, end))
    }

    pub fn start(&self) -> NaiveDate {
        self.0
    }

    pub fn end(&self) -> NaiveDate {
        self.1
    }

    /// True when `date` falls in `[start, end)`.
    pub fn contains(&self, date: &NaiveDate) -> bool {
        self.0 <= *date && *date < self.1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_season_uses_fixed_end_day() {
        let range = DateRange::season(2022, 1, 3).unwrap();
        assert_eq!(range.start(), date(2022, 1, 1));
        assert_eq!(range.end(), date(2022, 3, 28));

        // February in a leap year is still cut at the 28th
        let range = DateRange::season(2024, 2, 2).unwrap();
        assert_eq!(range.end(), date(2024, 2, 28));
    }

    #[test]
    fn test_season_rejects_reversed_months() {
        assert!(matches!(
            DateRange::season(2022, 5, 2),
            Err(GeoError::InvalidRange { .. })
        ));
        assert_eq!(DateRange::season(2022, 13, 13), Err(GeoError::InvalidMonth(13)));
    }

    #[test]
    fn test_month_range() {
        let range = DateRange::month(2023, 4).unwrap();
        assert_eq!(range, DateRange(date(2023, 4, 1), date(2023, 5, 1)));
    }

    #[test]
    fn test_december_rolls_into_next_year() {
        let range = DateRange::month(2023, 12).unwrap();
        assert_eq!(range, DateRange(date(2023, 12, 1), date(2024, 1, 1)));
    }

    #[test]
    fn test_contains_excludes_end() {
        let range = DateRange::month(2023, 1).unwrap();
        assert!(range.contains(&date(2023, 1, 1)));
        assert!(range.contains(&date(2023, 1, 31)));
        assert!(!range.contains(&date(2023, 2, 1)));
        assert!(!range.contains(&date(2022, 12, 31)));
    }
}
