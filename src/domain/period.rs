//! Mission year ranges

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Inclusive range of mission years
///
/// # Examples
///
/// ```
/// use ems_metrics::domain::YearRange;
///
/// let range: YearRange = "2023-2024".parse().unwrap();
/// assert_eq!(range.start(), 2023);
/// assert_eq!(range.end(), 2024);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct YearRange {
    start: i32,
    end: i32,
}

impl YearRange {
    /// Creates a range; `start` must not be after `end`
    pub fn new(start: i32, end: i32) -> Result<Self, String> {
        if !(1900..=9999).contains(&start) || !(1900..=9999).contains(&end) {
            return Err(format!("Year out of range: {start}-{end}"));
        }
        if start > end {
            return Err(format!("Year range start {start} is after end {end}"));
        }
        Ok(Self { start, end })
    }

    /// Range covering one year
    pub fn single(year: i32) -> Result<Self, String> {
        Self::new(year, year)
    }

    pub fn start(&self) -> i32 {
        self.start
    }

    pub fn end(&self) -> i32 {
        self.end
    }

    /// First and last second of the range
    pub fn bounds(&self) -> (chrono::NaiveDateTime, chrono::NaiveDateTime) {
        use chrono::NaiveDate;

        // Years are validated in `new`, so both dates exist
        let first = NaiveDate::from_ymd_opt(self.start, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap_or_default();
        let last = NaiveDate::from_ymd_opt(self.end, 12, 31)
            .and_then(|d| d.and_hms_opt(23, 59, 59))
            .unwrap_or_default();
        (first, last)
    }
}

impl fmt::Display for YearRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

impl FromStr for YearRange {
    type Err = String;

    /// Accepts `2024` or `2023-2024`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse = |part: &str| {
            part.trim()
                .parse::<i32>()
                .map_err(|_| format!("Invalid year '{}'", part.trim()))
        };
        match s.split_once('-') {
            Some((start, end)) => Self::new(parse(start)?, parse(end)?),
            None => Self::single(parse(s)?),
        }
    }
}
