//! Preparing rasters for the dashboard's map panel.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::clip::{clip_to_region, ClipOptions};
use crate::config::ResampleConfig;
use crate::dataset::{open_floodscan_rasters, open_seas5_rasters, Dataset, FloodscanBand};
use crate::error::{RasterError, Result};
use crate::raster::Raster;
use crate::resample::Resampler;
use crate::source::{RasterSource, RegionSource};
use crate::types::{CoordValue, DATE_DIM};

/// How the map panel renders a raster.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    /// Native pixels, clipped to the region.
    #[default]
    Original,
    /// Re-gridded to a finer resolution first, so the region's outline
    /// is followed more closely.
    Upsampled,
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayMode::Original => write!(f, "original"),
            DisplayMode::Upsampled => write!(f, "upsampled"),
        }
    }
}

impl FromStr for DisplayMode {
    type Err = RasterError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "original" | "raw" => Ok(DisplayMode::Original),
            "upsampled" => Ok(DisplayMode::Upsampled),
            _ => Err(RasterError::ConfigError(format!(
                "unknown display mode '{}'",
                s
            ))),
        }
    }
}

/// Selection made in the dashboard's sidebar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CogRequest {
    pub dataset: Dataset,
    pub iso3: String,
    pub admin_level: u8,
    pub pcode: String,
    pub issue_date: String,
    /// Floodscan band; SFED when unset.
    #[serde(default)]
    pub band: Option<String>,
    #[serde(default)]
    pub display: DisplayMode,
}

/// Loads, clips, and optionally resamples rasters for a region.
pub struct CogView<R, G> {
    rasters: R,
    regions: G,
    resampler: Resampler,
}

impl<R, G> CogView<R, G>
where
    R: RasterSource,
    G: RegionSource,
{
    pub fn new(rasters: R, regions: G, config: ResampleConfig) -> Self {
        Self {
            rasters,
            regions,
            resampler: Resampler::new(config),
        }
    }

    pub fn rasters(&self) -> &R {
        &self.rasters
    }

    /// Raster for `request`, clipped to its region at the requested issue date.
    ///
    /// The result has the dataset's extra axis (`lt` or nothing for a single
    /// Floodscan band) over `(y, x)`; the `date` axis is selected away.
    ///
    /// # Errors
    /// * [`RasterError::NotFound`] if the raster or region does not exist
    /// * [`RasterError::NoDataInBounds`] if the region misses the raster
    pub async fn prepare(&self, request: &CogRequest) -> Result<Raster> {
        info!(
            dataset = %request.dataset,
            iso3 = %request.iso3,
            admin_level = request.admin_level,
            pcode = %request.pcode,
            issue_date = %request.issue_date,
            display = %request.display,
            "Preparing raster view"
        );

        let region = self
            .regions
            .region(&request.iso3, request.admin_level, &request.pcode)
            .await?;

        let mut raster = match request.dataset {
            Dataset::Seas5 => open_seas5_rasters(&self.rasters, &request.issue_date).await?,
            Dataset::Floodscan => {
                let band = request
                    .band
                    .as_deref()
                    .unwrap_or(FloodscanBand::Sfed.name());
                open_floodscan_rasters(&self.rasters, &request.issue_date, band).await?
            }
        };

        if request.display == DisplayMode::Upsampled {
            raster = clip_to_region(&raster, &region, ClipOptions::all_touched())?;
            raster = self.resampler.upsample(&raster)?;
            debug!(shape = ?raster.shape(), "Upsampled raster");
        }

        clip_to_region(&raster, &region, ClipOptions::default())?
            .sel(DATE_DIM, &CoordValue::from(request.issue_date.as_str()))
    }
}
