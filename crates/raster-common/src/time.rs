//! Date handling for forecast issue dates and daily products.

use chrono::{DateTime, Datelike, Duration, Months, NaiveDate};
use serde::{Deserialize, Serialize};

/// Date format used in blob names and date axis labels.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a date given as `YYYY-MM-DD` or a full RFC 3339 timestamp.
pub fn parse_date(s: &str) -> Result<NaiveDate, TimeParseError> {
    let s = s.trim();

    if let Ok(date) = NaiveDate::parse_from_str(s, DATE_FORMAT) {
        return Ok(date);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.date_naive());
    }

    Err(TimeParseError::InvalidFormat(s.to_string()))
}

/// Format a date the way blob names and labels expect it.
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Cadence of a product's issue dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueCadence {
    /// One issue on the first of every month
    Monthly,
    /// One issue per day
    Daily,
}

/// Issue-date calendar for a product.
///
/// Monthly products publish their issue for month M a few days into M;
/// until `publication_day` has passed the latest issue is the previous
/// month's.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueCalendar {
    pub start: NaiveDate,
    pub cadence: IssueCadence,
    /// Day of month after which the current month's issue is available
    #[serde(default = "default_publication_day")]
    pub publication_day: u32,
}

fn default_publication_day() -> u32 {
    6
}

impl IssueCalendar {
    pub fn new(start: NaiveDate, cadence: IssueCadence) -> Self {
        Self {
            start,
            cadence,
            publication_day: default_publication_day(),
        }
    }

    /// The most recent issue date available on `today`.
    pub fn latest(&self, today: NaiveDate) -> NaiveDate {
        match self.cadence {
            IssueCadence::Daily => today,
            IssueCadence::Monthly => {
                let first = today.with_day(1).unwrap_or(today);
                if today.day() <= self.publication_day {
                    first - Months::new(1)
                } else {
                    first
                }
            }
        }
    }

    /// All issue dates from `start` through the latest available, newest first.
    pub fn issue_dates(&self, today: NaiveDate) -> Vec<NaiveDate> {
        let end = self.latest(today);
        let mut dates = Vec::new();
        let mut current = self.start;

        while current <= end {
            dates.push(current);
            current = match self.cadence {
                IssueCadence::Daily => current + Duration::days(1),
                IssueCadence::Monthly => current + Months::new(1),
            };
        }

        dates.reverse();
        dates
    }
}

/// `date` and the `days - 1` days before it, most recent first.
pub fn trailing_days(date: NaiveDate, days: u32) -> Vec<NaiveDate> {
    (0..days as i64).map(|i| date - Duration::days(i)).collect()
}

#[derive(Debug, thiserror::Error)]
pub enum TimeParseError {
    #[error("Invalid time format: {0}")]
    InvalidFormat(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("2024-03-01").unwrap(), ymd(2024, 3, 1));
        assert_eq!(parse_date("2024-03-01T12:00:00Z").unwrap(), ymd(2024, 3, 1));
        assert!(parse_date("03/01/2024").is_err());
    }

    #[test]
    fn test_monthly_latest_before_publication() {
        let cal = IssueCalendar::new(ymd(1981, 1, 1), IssueCadence::Monthly);
        assert_eq!(cal.latest(ymd(2024, 3, 6)), ymd(2024, 2, 1));
        assert_eq!(cal.latest(ymd(2024, 3, 7)), ymd(2024, 3, 1));
    }

    #[test]
    fn test_monthly_latest_wraps_year() {
        let cal = IssueCalendar::new(ymd(1981, 1, 1), IssueCadence::Monthly);
        assert_eq!(cal.latest(ymd(2024, 1, 3)), ymd(2023, 12, 1));
    }

    #[test]
    fn test_monthly_issue_dates_newest_first() {
        let cal = IssueCalendar::new(ymd(2023, 10, 1), IssueCadence::Monthly);
        let dates = cal.issue_dates(ymd(2024, 1, 20));
        assert_eq!(
            dates,
            vec![ymd(2024, 1, 1), ymd(2023, 12, 1), ymd(2023, 11, 1), ymd(2023, 10, 1)]
        );
        assert_eq!(format_date(dates[0]), "2024-01-01");
    }

    #[test]
    fn test_daily_issue_dates() {
        let cal = IssueCalendar::new(ymd(2024, 2, 27), IssueCadence::Daily);
        let dates = cal.issue_dates(ymd(2024, 3, 1));
        assert_eq!(dates.len(), 4);
        assert_eq!(dates[0], ymd(2024, 3, 1));
        assert_eq!(dates[1], ymd(2024, 2, 29));
    }

    #[test]
    fn test_trailing_days() {
        let days = trailing_days(ymd(2024, 3, 2), 3);
        assert_eq!(days, vec![ymd(2024, 3, 2), ymd(2024, 3, 1), ymd(2024, 2, 29)]);
    }
}
