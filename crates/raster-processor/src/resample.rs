//! Resampling rasters to a target resolution.
//!
//! A raster has spatial axes `y` and `x`, usually a `date` axis, and at
//! most one further axis (a band or forecast leadtime). Rasters without a
//! further axis are re-gridded in one pass. Otherwise every slice along the
//! further axis is re-gridded on its own, relabeled, and the slices are
//! concatenated back in their original order.

use rayon::prelude::*;
use tracing::{debug, instrument, warn};

use crate::config::ResampleConfig;
use crate::error::{RasterError, Result};
use crate::projection::{output_len, reproject_to_shape, scaled_shape};
use crate::raster::Raster;
use crate::types::{CoordValue, DATE_DIM, X_DIM, Y_DIM};

/// Check the required axes and return the name of the first further axis.
///
/// `x` and `y` are always required; `date` is required unless
/// `config.require_date` is off.
pub fn validate_dimensions(raster: &Raster, config: &ResampleConfig) -> Result<Option<String>> {
    let mut required = vec![X_DIM, Y_DIM];
    if config.require_date {
        required.push(DATE_DIM);
    }

    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|name| !raster.has_dim(name))
        .collect();
    if !missing.is_empty() {
        return Err(RasterError::invalid_shape(missing));
    }

    Ok(raster
        .dims()
        .iter()
        .map(|d| d.name.as_str())
        .find(|name| ![X_DIM, Y_DIM, DATE_DIM].contains(name))
        .map(str::to_string))
}

/// Resamples rasters according to a [`ResampleConfig`].
#[derive(Debug, Clone, Default)]
pub struct Resampler {
    config: ResampleConfig,
}

impl Resampler {
    pub fn new(config: ResampleConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ResampleConfig {
        &self.config
    }

    /// Resample to the configured target resolution.
    pub fn upsample(&self, raster: &Raster) -> Result<Raster> {
        self.upsample_to(raster, self.config.target_resolution)
    }

    /// Resample `raster` so its pixels are roughly `resolution` wide.
    ///
    /// The output covers the same extent as the input. Its pixel count is
    /// the input's scaled by `native / resolution` and truncated, so the
    /// effective resolution can differ slightly from the one requested.
    /// Pixels with no source coverage, and source nodata, come out as NaN.
    ///
    /// # Errors
    /// * [`RasterError::InvalidRasterShape`] if required axes are missing
    /// * [`RasterError::InvalidResolution`] if `resolution` is not positive
    /// * [`RasterError::ReprojectionFailure`] if the geotransform is missing or
    ///   corrupt, or the output grid would be empty
    #[instrument(skip(self, raster), fields(dims = ?raster.dim_names()))]
    pub fn upsample_to(&self, raster: &Raster, resolution: f64) -> Result<Raster> {
        let extra_dim = validate_dimensions(raster, &self.config)?;

        if !(resolution.is_finite() && resolution > 0.0) {
            return Err(RasterError::InvalidResolution(resolution));
        }

        // Slices are checked one by one; a further axis may sit anywhere.
        if extra_dim.is_none() {
            raster.check_spatial_layout()?;
        }
        let transform = raster.geotransform()?;
        let (native, _) = transform.resolution();
        let factor = native / resolution;
        let (new_width, new_height) = scaled_shape(raster.width(), raster.height(), factor);

        debug!(
            native_resolution = native,
            target_resolution = resolution,
            factor,
            width = raster.width(),
            height = raster.height(),
            new_width,
            new_height,
            "Computed target grid"
        );

        if new_width == 0 || new_height == 0 {
            return Err(RasterError::reprojection(format!(
                "resolution {} leaves a {}x{} raster with no pixels",
                resolution,
                raster.height(),
                raster.width()
            )));
        }
        output_len(raster.plane_count(), new_width, new_height).ok_or_else(|| {
            RasterError::reprojection(format!(
                "resolution {} gives a {}x{} grid too large to allocate",
                resolution, new_height, new_width
            ))
        })?;

        let mut raster = raster.clone();
        if raster.crs().is_none() {
            warn!(
                default_crs = %self.config.default_crs,
                "Raster has no CRS defined; assuming default"
            );
            raster.set_crs(self.config.default_crs);
        }

        match extra_dim {
            None => reproject_to_shape(&raster, new_height, new_width),
            Some(dim) => self.resample_slices(&raster, &dim, new_height, new_width),
        }
    }

    /// Re-grid each slice along `dim` and concatenate them back in order.
    fn resample_slices(
        &self,
        raster: &Raster,
        dim: &str,
        new_height: usize,
        new_width: usize,
    ) -> Result<Raster> {
        let position = raster
            .dim_index(dim)
            .ok_or_else(|| RasterError::reprojection(format!("dimension '{}' vanished", dim)))?;
        let labels = raster.dims()[position].labels.clone();
        let relabel = self.config.relabel_for(dim);

        debug!(dim, slices = labels.len(), "Resampling slice by slice");

        let resample_one = |(index, label): (usize, &CoordValue)| {
            let slice = raster.isel(dim, index)?;
            let resampled = reproject_to_shape(&slice, new_height, new_width)?;
            let label = match relabel {
                Some(table) => table.apply(label),
                None => label.clone(),
            };
            resampled.expand_dims(dim, label, position)
        };

        let slices: Vec<Raster> = if self.config.parallel_slices {
            labels
                .par_iter()
                .enumerate()
                .map(resample_one)
                .collect::<Result<_>>()?
        } else {
            labels
                .iter()
                .enumerate()
                .map(resample_one)
                .collect::<Result<_>>()?
        };

        Raster::concat(&slices, dim, self.config.combine_attrs).map_err(|e| {
            RasterError::reprojection(format!("failed to recombine '{}' slices: {}", dim, e))
        })
    }
}

/// Resample `raster` to `resolution` with the default configuration.
///
/// This is the entry point used by the validation dashboard: it keeps the
/// `date` requirement, assigns EPSG:4326 to rasters without a CRS, and
/// labels Floodscan bands `1`/`2` as `SFED`/`MFED`.
pub fn upsample_raster(raster: &Raster, resolution: f64) -> Result<Raster> {
    Resampler::default().upsample_to(raster, resolution)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Dimension;
    use raster_common::GeoTransform;

    fn dated(extra: Option<Dimension>) -> Raster {
        let mut dims = vec![Dimension::new(DATE_DIM, vec!["2024-01-01".into()])];
        let mut planes = 1;
        if let Some(extra) = extra {
            planes = extra.len();
            dims.push(extra);
        }
        dims.push(Dimension::new(Y_DIM, vec![1.5.into(), 0.5.into()]));
        dims.push(Dimension::new(X_DIM, vec![0.5.into(), 1.5.into()]));
        let data = (0..planes * 4).map(|v| v as f32).collect();
        Raster::new(dims, data)
            .unwrap()
            .with_transform(GeoTransform::new(0.0, 1.0, 2.0, -1.0))
    }

    #[test]
    fn test_validate_dimensions() {
        let config = ResampleConfig::default();
        assert_eq!(validate_dimensions(&dated(None), &config).unwrap(), None);

        let banded = dated(Some(Dimension::new("band", vec![1.into(), 2.into()])));
        assert_eq!(
            validate_dimensions(&banded, &config).unwrap(),
            Some("band".to_string())
        );
    }

    #[test]
    fn test_validate_dimensions_reports_missing() {
        let raster = Raster::new(vec![Dimension::indexed("band", 1)], vec![0.0]).unwrap();
        match validate_dimensions(&raster, &ResampleConfig::default()) {
            Err(RasterError::InvalidRasterShape { missing }) => {
                assert_eq!(missing, vec!["date", "x", "y"]);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_date_optional_when_configured() {
        let raster = dated(None).squeeze();
        assert!(validate_dimensions(&raster, &ResampleConfig::default()).is_err());

        let config = ResampleConfig {
            require_date: false,
            ..Default::default()
        };
        assert_eq!(validate_dimensions(&raster, &config).unwrap(), None);
    }

    #[test]
    fn test_invalid_resolution() {
        for resolution in [0.0, -0.5, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                upsample_raster(&dated(None), resolution),
                Err(RasterError::InvalidResolution(_))
            ));
        }
    }

    #[test]
    fn test_tiny_resolution_is_reprojection_failure() {
        let banded = dated(Some(Dimension::new("band", vec![1.into(), 2.into()])));
        for raster in [dated(None), banded] {
            assert!(matches!(
                upsample_raster(&raster, 1e-10),
                Err(RasterError::ReprojectionFailure(_))
            ));
        }
    }

    #[test]
    fn test_too_coarse_is_reprojection_failure() {
        assert!(matches!(
            upsample_raster(&dated(None), 5.0),
            Err(RasterError::ReprojectionFailure(_))
        ));
    }

    #[test]
    fn test_relabels_band_slices() {
        let raster = dated(Some(Dimension::new("band", vec![1.into(), 2.into()])));
        let out = upsample_raster(&raster, 0.5).unwrap();

        assert_eq!(out.dim_names(), vec!["date", "band", "y", "x"]);
        assert_eq!(out.shape(), vec![1, 2, 4, 4]);
        assert_eq!(
            out.dim("band").unwrap().labels,
            vec![CoordValue::from("SFED"), CoordValue::from("MFED")]
        );
        // Second band's top-left pixel came from input value 4.0
        assert_eq!(out.data()[16], 4.0);
    }

    #[test]
    fn test_other_axes_keep_labels() {
        let raster = dated(Some(Dimension::new("lt", vec![0.into(), 1.into(), 2.into()])));
        let out = upsample_raster(&raster, 1.0).unwrap();
        assert_eq!(out.dim("lt").unwrap().labels, raster.dim("lt").unwrap().labels);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let raster = dated(Some(Dimension::indexed("lt", 7)));
        let sequential = upsample_raster(&raster, 0.25).unwrap();

        let config = ResampleConfig {
            parallel_slices: true,
            ..Default::default()
        };
        let parallel = Resampler::new(config).upsample_to(&raster, 0.25).unwrap();
        assert_eq!(parallel.dims(), sequential.dims());
        assert_eq!(parallel.data(), sequential.data());
    }
}
