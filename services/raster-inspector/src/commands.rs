//! Subcommand implementations.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use raster_common::time::parse_date;
use raster_common::{BoundingBox, Polygon};
use raster_processor::dataset::CodabLayer;
use raster_processor::source::find_region;
use raster_processor::stats::{
    floodscan_history, group_seasons, seas5_by_issue_year, seas5_history, FloodscanStatRow,
    Seas5StatRow,
};
use raster_processor::{
    clip_to_region, CachedRasterSource, ClipOptions, CogRequest, CogView, Dataset, FloodscanBand,
    LocalRasterSource, LocalRegionSource, Raster, Resampler,
};
use serde::de::DeserializeOwned;
use tracing::info;

use crate::config::InspectorConfig;

/// Area a resampled raster is clipped to.
#[derive(Debug, Clone)]
pub enum ClipTarget {
    /// Feature with `pcode` in a COD-AB GeoJSON layer
    Region {
        path: PathBuf,
        admin_level: u8,
        pcode: String,
    },
    /// Plain rectangle in the raster's CRS
    Bbox(BoundingBox),
}

/// Upsample one raster file, optionally clipping the result to a region.
pub async fn resample(
    config: &InspectorConfig,
    input: &Path,
    resolution: Option<f64>,
    clip: Option<&ClipTarget>,
    all_touched: bool,
) -> Result<Raster> {
    let json = tokio::fs::read_to_string(input)
        .await
        .with_context(|| format!("Failed to read raster {}", input.display()))?;
    let raster: Raster = serde_json::from_str(&json)
        .with_context(|| format!("Invalid raster file {}", input.display()))?;
    raster.validate()?;

    let resampler = Resampler::new(config.resample.clone());
    let resolution = resolution.unwrap_or(config.resample.target_resolution);
    let mut out = resampler.upsample_to(&raster, resolution)?;
    info!(
        input = %input.display(),
        resolution,
        before = ?raster.shape(),
        after = ?out.shape(),
        "Upsampled raster"
    );

    if let Some(target) = clip {
        let polygon = match target {
            ClipTarget::Region {
                path,
                admin_level,
                pcode,
            } => load_region(path, *admin_level, pcode).await?,
            ClipTarget::Bbox(bbox) => Polygon::from_bbox(bbox),
        };
        out = clip_to_region(&out, &polygon, ClipOptions { all_touched })?;
        info!(clip = ?target, shape = ?out.shape(), "Clipped raster");
    }

    Ok(out)
}

async fn load_region(path: &Path, admin_level: u8, pcode: &str) -> Result<Polygon> {
    let json = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read region file {}", path.display()))?;
    let collection: serde_json::Value = serde_json::from_str(&json)?;
    let field = CodabLayer::new("", admin_level).pcode_field();
    Ok(find_region(&collection, &field, pcode)?)
}

/// Prepare the map-panel raster for a dashboard selection.
pub async fn view(config: &InspectorConfig, request: &CogRequest) -> Result<Raster> {
    let rasters = CachedRasterSource::new(
        LocalRasterSource::new(&config.data_dir),
        config.cache_size_mb,
    );
    let regions = LocalRegionSource::new(&config.data_dir);
    let view = CogView::new(rasters, regions, config.resample.clone());

    let raster = view.prepare(request).await?;

    let stats = view.rasters().cache_stats().await;
    info!(
        shape = ?raster.shape(),
        cache_hits = stats.hits,
        cache_misses = stats.misses,
        "Prepared view"
    );
    Ok(raster)
}

/// Issue dates offered for `dataset`, newest first.
pub fn issue_dates(dataset: Dataset, today: Option<&str>) -> Result<Vec<String>> {
    let today = match today {
        Some(s) => parse_date(s).with_context(|| format!("Invalid date '{}'", s))?,
        None => chrono::Utc::now().date_naive(),
    };
    Ok(dataset.issue_dates(today)?)
}

/// Days of Floodscan history shown by default.
pub const DEFAULT_HISTORY_DAYS: u32 = 10;

/// Shape precomputed zonal statistics for the time-series chart.
///
/// `rows` is a JSON array of rows for `dataset`. SEAS5 rows issued on the
/// same month and day as `date` come back as an object keyed by issue year;
/// Floodscan rows of `band` in the `days` ending at `date` come back as
/// season rows.
pub async fn stats(
    dataset: Dataset,
    rows: &Path,
    date: &str,
    band: Option<&str>,
    days: u32,
) -> Result<serde_json::Value> {
    let issue_date = parse_date(date).with_context(|| format!("Invalid date '{}'", date))?;

    let value = match dataset {
        Dataset::Seas5 => {
            let rows: Vec<Seas5StatRow> = read_rows(rows).await?;
            let history = seas5_history(&rows, issue_date);
            info!(rows = rows.len(), matching = history.len(), "Selected SEAS5 history");
            serde_json::to_value(seas5_by_issue_year(&history))?
        }
        Dataset::Floodscan => {
            let band = band
                .map(str::parse::<FloodscanBand>)
                .transpose()?
                .unwrap_or(FloodscanBand::Sfed);
            let rows: Vec<FloodscanStatRow> = read_rows(rows).await?;
            let history = floodscan_history(&rows, issue_date, band.name(), days);
            let seasons = group_seasons(&history);
            info!(
                rows = rows.len(),
                matching = history.len(),
                seasons = seasons.last().map(|r| r.group + 1).unwrap_or(0),
                "Selected Floodscan history"
            );
            serde_json::to_value(seasons)?
        }
    };
    Ok(value)
}

async fn read_rows<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let json = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read rows {}", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("Invalid rows file {}", path.display()))
}

/// Write `raster` as JSON to `output`, or stdout when unset.
pub async fn write_raster(raster: &Raster, output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(raster)?;
    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(path, json)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!(path = %path.display(), "Wrote raster");
        }
        None => println!("{}", json),
    }
    Ok(())
}
