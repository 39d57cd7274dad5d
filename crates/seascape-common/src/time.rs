//! Time filters for occurrence queries.

use chrono::{Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{SeascapeError, SeascapeResult};

/// Earliest year accepted by the year filter.
pub const MIN_YEAR: i32 = 1600;

/// Restricts occurrence queries to records observed during one calendar year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct YearFilter(i32);

impl YearFilter {
    /// Accepts years from 1600 up to the current year.
    pub fn new(year: i32) -> SeascapeResult<Self> {
        let current = Utc::now().year();
        if !(MIN_YEAR..=current).contains(&year) {
            return Err(SeascapeError::InvalidConfig(format!(
                "year filter {year} outside {MIN_YEAR}..={current}"
            )));
        }
        Ok(Self(year))
    }

    pub fn year(&self) -> i32 {
        self.0
    }

    /// First day of the year, as sent in a `startdate` query parameter.
    pub fn start_date(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.0, 1, 1).unwrap_or(NaiveDate::MIN)
    }

    /// Last day of the year, as sent in an `enddate` query parameter.
    pub fn end_date(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.0, 12, 31).unwrap_or(NaiveDate::MAX)
    }

    /// Client-side check for records the server returned anyway.
    pub fn matches(&self, year: Option<i32>) -> bool {
        year.map_or(true, |y| y == self.0)
    }
}

impl TryFrom<i32> for YearFilter {
    type Error = SeascapeError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        YearFilter::new(value)
    }
}

impl From<YearFilter> for i32 {
    fn from(filter: YearFilter) -> Self {
        filter.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_year_filter_range() {
        let f = YearFilter::new(2019).unwrap();
        assert_eq!(f.start_date().to_string(), "2019-01-01");
        assert_eq!(f.end_date().to_string(), "2019-12-31");
        assert!(YearFilter::new(1200).is_err());
        assert!(YearFilter::new(Utc::now().year() + 1).is_err());
    }

    #[test]
    fn test_matches_unknown_year() {
        let f = YearFilter::new(2019).unwrap();
        assert!(f.matches(Some(2019)));
        assert!(!f.matches(Some(2018)));
        assert!(f.matches(None));
    }
}
