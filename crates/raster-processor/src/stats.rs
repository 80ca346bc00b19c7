//! Shaping of precomputed zonal statistics for the time-series charts.
//!
//! Rows come from the statistics database already aggregated per region;
//! these functions only filter, group, and label them.

use std::collections::BTreeMap;

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

/// Largest gap, in days, between rows of the same Floodscan season.
pub const SEASON_GAP_DAYS: i64 = 30;

/// How far back SEAS5 history reaches for a given issue month.
pub const SEAS5_HISTORY_YEARS: u32 = 40;

/// Statistics stored for every region, in display order.
pub const STAT_NAMES: [&str; 7] = ["mean", "median", "min", "max", "count", "sum", "std"];

/// Zonal statistics of one SEAS5 forecast over one region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Seas5StatRow {
    pub iso3: String,
    pub pcode: String,
    pub issued_date: NaiveDate,
    pub leadtime: i64,
    /// Statistic name (`mean`, `median`, `max`, ...) to value.
    #[serde(flatten)]
    pub stats: BTreeMap<String, f64>,
}

/// Zonal statistics of one Floodscan day over one region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloodscanStatRow {
    pub iso3: String,
    pub pcode: String,
    pub valid_date: NaiveDate,
    pub band: String,
    #[serde(flatten)]
    pub stats: BTreeMap<String, f64>,
}

/// A Floodscan row labeled for plotting one line per season.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonRow {
    #[serde(flatten)]
    pub row: FloodscanStatRow,
    pub valid_year: i32,
    /// Day and abbreviated month, e.g. `05-Mar`.
    pub month_day: String,
    /// Season index; rows more than 30 days apart fall in different seasons.
    pub group: usize,
}

impl Seas5StatRow {
    pub fn stat(&self, name: &str) -> Option<f64> {
        self.stats.get(name).copied()
    }

    pub fn issued_year(&self) -> i32 {
        self.issued_date.year()
    }
}

impl FloodscanStatRow {
    pub fn stat(&self, name: &str) -> Option<f64> {
        self.stats.get(name).copied()
    }
}

/// `MM-DD` strings for `issue_date` and the `days - 1` days before it.
pub fn floodscan_day_window(issue_date: NaiveDate, days: u32) -> Vec<String> {
    raster_common::time::trailing_days(issue_date, days)
        .into_iter()
        .map(|d| d.format("%m-%d").to_string())
        .collect()
}

/// Rows for `band` whose day of year falls in the window ending at `issue_date`,
/// in any year, newest first.
pub fn floodscan_history(
    rows: &[FloodscanStatRow],
    issue_date: NaiveDate,
    band: &str,
    days: u32,
) -> Vec<FloodscanStatRow> {
    let window = floodscan_day_window(issue_date, days);
    let mut matching: Vec<FloodscanStatRow> = rows
        .iter()
        .filter(|r| r.band == band)
        .filter(|r| window.contains(&r.valid_date.format("%m-%d").to_string()))
        .cloned()
        .collect();
    matching.sort_by(|a, b| b.valid_date.cmp(&a.valid_date));
    matching
}

/// Sort rows by date and split them into seasons at gaps over 30 days.
pub fn group_seasons(rows: &[FloodscanStatRow]) -> Vec<SeasonRow> {
    let mut sorted = rows.to_vec();
    sorted.sort_by_key(|r| r.valid_date);

    let mut group = 0;
    let mut previous: Option<NaiveDate> = None;
    sorted
        .into_iter()
        .map(|row| {
            if let Some(prev) = previous {
                if (row.valid_date - prev).num_days() > SEASON_GAP_DAYS {
                    group += 1;
                }
            }
            previous = Some(row.valid_date);

            SeasonRow {
                valid_year: row.valid_date.year(),
                month_day: row.valid_date.format("%d-%b").to_string(),
                group,
                row,
            }
        })
        .collect()
}

/// Rows issued on the same month and day as `issue_date` within the last
/// 40 years, ordered by issue date then leadtime.
pub fn seas5_history(rows: &[Seas5StatRow], issue_date: NaiveDate) -> Vec<Seas5StatRow> {
    let earliest = issue_date
        .checked_sub_months(Months::new(12 * SEAS5_HISTORY_YEARS))
        .unwrap_or(NaiveDate::MIN);

    let mut matching: Vec<Seas5StatRow> = rows
        .iter()
        .filter(|r| {
            r.issued_date.month() == issue_date.month()
                && r.issued_date.day() == issue_date.day()
                && r.issued_date >= earliest
        })
        .cloned()
        .collect();
    matching.sort_by_key(|r| (r.issued_date, r.leadtime));
    matching
}

/// Group rows by issue year, each group ordered by leadtime.
pub fn seas5_by_issue_year(rows: &[Seas5StatRow]) -> BTreeMap<i32, Vec<Seas5StatRow>> {
    let mut groups: BTreeMap<i32, Vec<Seas5StatRow>> = BTreeMap::new();
    for row in rows {
        groups.entry(row.issued_year()).or_default().push(row.clone());
    }
    for rows in groups.values_mut() {
        rows.sort_by_key(|r| r.leadtime);
    }
    groups
}
