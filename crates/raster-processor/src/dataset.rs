//! Dataset catalog: blob naming, issue dates, and raster assembly.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use raster_common::time::format_date;
use raster_common::{IssueCadence, IssueCalendar};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{RasterError, Result};
use crate::raster::Raster;
use crate::source::RasterSource;
use crate::types::{AttrPolicy, DATE_DIM};

/// Leadtimes published for every SEAS5 issue, in months.
pub const SEAS5_LEADTIMES: std::ops::RangeInclusive<i64> = 0..=6;

/// Name of the SEAS5 leadtime axis.
pub const LEADTIME_DIM: &str = "lt";

/// Name of the Floodscan band axis.
pub const BAND_DIM: &str = "band";

/// Raster attribute carrying a SEAS5 file's leadtime.
const LEADTIME_ATTR: &str = "leadtime";

/// Products the validation dashboard can display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dataset {
    /// ECMWF SEAS5 monthly precipitation forecasts
    Seas5,
    /// Floodscan daily flood extent
    Floodscan,
}

impl Dataset {
    pub fn name(&self) -> &'static str {
        match self {
            Dataset::Seas5 => "seas5",
            Dataset::Floodscan => "floodscan",
        }
    }

    /// The axis each slice of this dataset varies along.
    pub fn extra_dim(&self) -> &'static str {
        match self {
            Dataset::Seas5 => LEADTIME_DIM,
            Dataset::Floodscan => BAND_DIM,
        }
    }

    /// Issue-date calendar, if one is configured for the dataset.
    pub fn calendar(&self) -> Option<IssueCalendar> {
        match self {
            Dataset::Seas5 => NaiveDate::from_ymd_opt(1981, 1, 1)
                .map(|start| IssueCalendar::new(start, IssueCadence::Monthly)),
            Dataset::Floodscan => None,
        }
    }

    /// Available issue dates as `YYYY-MM-DD`, newest first.
    pub fn issue_dates(&self, today: NaiveDate) -> Result<Vec<String>> {
        let calendar = self
            .calendar()
            .ok_or_else(|| RasterError::NoDateRange(self.name().to_string()))?;
        Ok(calendar
            .issue_dates(today)
            .into_iter()
            .map(format_date)
            .collect())
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Dataset {
    type Err = RasterError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "seas5" => Ok(Dataset::Seas5),
            "floodscan" => Ok(Dataset::Floodscan),
            _ => Err(RasterError::UnknownDataset(s.to_string())),
        }
    }
}

/// Floodscan flood-extent indicators and their band numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FloodscanBand {
    /// Standard flood extent depiction
    Sfed,
    /// Maximum flood extent depiction
    Mfed,
}

impl FloodscanBand {
    pub fn index(&self) -> i64 {
        match self {
            FloodscanBand::Sfed => 1,
            FloodscanBand::Mfed => 2,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FloodscanBand::Sfed => "SFED",
            FloodscanBand::Mfed => "MFED",
        }
    }
}

impl FromStr for FloodscanBand {
    type Err = RasterError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "SFED" => Ok(FloodscanBand::Sfed),
            "MFED" => Ok(FloodscanBand::Mfed),
            _ => Err(RasterError::UnknownBand(s.to_string())),
        }
    }
}

/// Blob holding the SEAS5 forecast issued on `issue_date` at leadtime `lt`.
pub fn seas5_blob_name(issue_date: &str, lt: i64) -> String {
    format!("seas5/monthly/processed/precip_em_i{}_lt{}.tif", issue_date, lt)
}

/// Blob holding the Floodscan extent for `valid_date`.
pub fn floodscan_blob_name(valid_date: &str) -> String {
    format!(
        "floodscan/daily/v5/processed/aer_area_300s_v{}_v05r01.tif",
        valid_date
    )
}

/// Naming of COD-AB administrative boundary files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodabLayer {
    iso3: String,
    admin_level: u8,
}

impl CodabLayer {
    pub fn new(iso3: &str, admin_level: u8) -> Self {
        Self {
            iso3: iso3.trim().to_lowercase(),
            admin_level,
        }
    }

    pub fn iso3(&self) -> &str {
        &self.iso3
    }

    pub fn admin_level(&self) -> u8 {
        self.admin_level
    }

    /// Zipped shapefile blob for the country.
    pub fn blob_name(&self) -> String {
        format!("{}_shp.zip", self.iso3)
    }

    /// Shapefile layer inside the zip for this admin level.
    pub fn shapefile(&self) -> String {
        format!("{}_adm{}.shp", self.iso3, self.admin_level)
    }

    /// GeoJSON export of the same layer.
    pub fn geojson_name(&self) -> String {
        format!("{}_adm{}.geojson", self.iso3, self.admin_level)
    }

    /// Property holding each feature's pcode.
    pub fn pcode_field(&self) -> String {
        format!("ADM{}_PCODE", self.admin_level)
    }
}

/// Open every SEAS5 leadtime for `issue_date` as one `(date, lt, y, x)` raster.
///
/// Each file's `leadtime` attribute becomes its `lt` label. Attributes that
/// differ between leadtimes are dropped from the stack.
pub async fn open_seas5_rasters<S>(source: &S, issue_date: &str) -> Result<Raster>
where
    S: RasterSource + ?Sized,
{
    let mut slices = Vec::with_capacity(SEAS5_LEADTIMES.count());
    for lt in SEAS5_LEADTIMES {
        let raster = source.open(&seas5_blob_name(issue_date, lt)).await?.squeeze();
        let leadtime = leadtime_label(&raster)?;
        slices.push((leadtime, raster.expand_dims(LEADTIME_DIM, leadtime.into(), 0)?));
    }
    slices.sort_by_key(|(leadtime, _)| *leadtime);

    let slices: Vec<Raster> = slices.into_iter().map(|(_, raster)| raster).collect();
    debug!(issue_date, leadtimes = slices.len(), "Stacking SEAS5 leadtimes");

    Raster::concat(&slices, LEADTIME_DIM, AttrPolicy::DropConflicts)?
        .expand_dims(DATE_DIM, issue_date.into(), 0)
}

/// Open the Floodscan raster for `valid_date`, keeping only `band`.
///
/// The result has dims `(date, y, x)`.
pub async fn open_floodscan_rasters<S>(source: &S, valid_date: &str, band: &str) -> Result<Raster>
where
    S: RasterSource + ?Sized,
{
    let band: FloodscanBand = band.parse()?;
    let raster = source.open(&floodscan_blob_name(valid_date)).await?;

    // Band labels may be stored as integral floats.
    let position = raster
        .dim(BAND_DIM)
        .and_then(|dim| {
            dim.labels
                .iter()
                .position(|label| label.as_int() == Some(band.index()))
        })
        .ok_or_else(|| {
            RasterError::invalid_raster(format!(
                "band {} ({}) not found in {}",
                band.index(),
                band.name(),
                floodscan_blob_name(valid_date)
            ))
        })?;

    raster
        .isel(BAND_DIM, position)?
        .squeeze()
        .expand_dims(DATE_DIM, valid_date.into(), 0)
}

fn leadtime_label(raster: &Raster) -> Result<i64> {
    let value = raster.attr(LEADTIME_ATTR).ok_or_else(|| {
        RasterError::invalid_raster(format!("missing '{}' attribute", LEADTIME_ATTR))
    })?;
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.fract() == 0.0)
        .map(|v| v as i64)
        .ok_or_else(|| {
            RasterError::invalid_raster(format!(
                "'{}' attribute is not a whole number: {}",
                LEADTIME_ATTR, value
            ))
        })
}
