//! Configuration for the raster resampler.

use std::collections::BTreeMap;
use std::path::Path;

use raster_common::CrsCode;
use serde::{Deserialize, Serialize};

use crate::error::{RasterError, Result};
use crate::types::{AttrPolicy, CoordValue};

/// Replacement labels for integer values along one axis.
///
/// Flood-extent rasters store their indicators as bands 1 and 2; after
/// resampling they are labeled by indicator name instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisRelabel {
    /// Axis the table applies to.
    pub axis: String,
    /// Integer label to replacement text.
    pub labels: BTreeMap<i64, String>,
}

impl AxisRelabel {
    pub fn new<I, S>(axis: impl Into<String>, labels: I) -> Self
    where
        I: IntoIterator<Item = (i64, S)>,
        S: Into<String>,
    {
        Self {
            axis: axis.into(),
            labels: labels.into_iter().map(|(k, v)| (k, v.into())).collect(),
        }
    }

    /// The Floodscan band table: `1 -> SFED`, `2 -> MFED`.
    pub fn floodscan_bands() -> Self {
        Self::new("band", [(1, "SFED"), (2, "MFED")])
    }

    /// Relabel `value`, passing through anything not in the table.
    pub fn apply(&self, value: &CoordValue) -> CoordValue {
        value
            .as_int()
            .and_then(|key| self.labels.get(&key))
            .map(|label| CoordValue::Text(label.clone()))
            .unwrap_or_else(|| value.clone())
    }
}

/// Configuration for the raster resampler.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResampleConfig {
    /// Target isotropic resolution, in the raster's native units.
    pub target_resolution: f64,

    /// CRS assigned to rasters that arrive without one.
    pub default_crs: CrsCode,

    /// Whether a `date` dimension must be present.
    pub require_date: bool,

    /// Reproject extra-axis slices on the rayon pool.
    pub parallel_slices: bool,

    /// How attributes are merged when slices are recombined.
    pub combine_attrs: AttrPolicy,

    /// Label replacement tables, one per axis.
    pub relabel: Vec<AxisRelabel>,
}

impl Default for ResampleConfig {
    fn default() -> Self {
        Self {
            target_resolution: 0.05,
            default_crs: CrsCode::WGS84,
            require_date: true,
            parallel_slices: false,
            combine_attrs: AttrPolicy::DropConflicts,
            relabel: vec![AxisRelabel::floodscan_bands()],
        }
    }
}

impl ResampleConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("RESAMPLE_RESOLUTION") {
            if let Ok(resolution) = val.parse() {
                config.target_resolution = resolution;
            }
        }

        if let Ok(val) = std::env::var("RESAMPLE_DEFAULT_CRS") {
            if let Ok(crs) = CrsCode::parse(&val) {
                config.default_crs = crs;
            }
        }

        if let Ok(val) = std::env::var("RESAMPLE_REQUIRE_DATE") {
            config.require_date = val.to_lowercase() == "true" || val == "1";
        }

        if let Ok(val) = std::env::var("RESAMPLE_PARALLEL") {
            config.parallel_slices = val.to_lowercase() == "true" || val == "1";
        }

        config
    }

    /// Parse configuration from YAML; missing keys take their defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self =
            serde_yaml::from_str(yaml).map_err(|e| RasterError::ConfigError(e.to_string()))?;
        config.validate().map_err(RasterError::ConfigError)?;
        Ok(config)
    }

    /// Load configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|e| {
            RasterError::ConfigError(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_yaml_str(&yaml)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if !(self.target_resolution.is_finite() && self.target_resolution > 0.0) {
            return Err("target_resolution must be a positive number".to_string());
        }

        let mut axes: Vec<&str> = self.relabel.iter().map(|r| r.axis.as_str()).collect();
        axes.sort_unstable();
        if axes.windows(2).any(|w| w[0] == w[1]) {
            return Err("relabel tables must name distinct axes".to_string());
        }

        Ok(())
    }

    /// Relabel table for `axis`, if one is configured.
    pub fn relabel_for(&self, axis: &str) -> Option<&AxisRelabel> {
        self.relabel.iter().find(|r| r.axis == axis)
    }

    /// Builder-style override of the target resolution.
    pub fn with_resolution(mut self, resolution: f64) -> Self {
        self.target_resolution = resolution;
        self
    }
}
