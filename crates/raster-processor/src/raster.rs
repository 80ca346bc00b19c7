//! Labeled multi-dimensional rasters.

use std::collections::{BTreeMap, HashSet};

use raster_common::{CrsCode, GeoTransform};
use serde::{Deserialize, Serialize};

use crate::error::{RasterError, Result};
use crate::types::{AttrPolicy, CoordValue, Dimension, X_DIM, Y_DIM};

/// An in-memory raster: named dimensions over row-major `f32` values.
///
/// The spatial dimensions are `y` and `x`; every other dimension (date,
/// band, leadtime) indexes a stack of 2D planes. Values are stored in
/// dimension order, so with dims `(band, y, x)` the first plane is band 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Raster {
    dims: Vec<Dimension>,
    #[serde(with = "nan_as_null")]
    data: Vec<f32>,
    #[serde(default)]
    transform: Option<GeoTransform>,
    #[serde(default)]
    crs: Option<CrsCode>,
    #[serde(default)]
    nodata: Option<f32>,
    #[serde(default)]
    attrs: BTreeMap<String, String>,
}

impl Raster {
    /// Create a raster from dimensions and data.
    pub fn new(dims: Vec<Dimension>, data: Vec<f32>) -> Result<Self> {
        let raster = Self {
            dims,
            data,
            transform: None,
            crs: None,
            nodata: None,
            attrs: BTreeMap::new(),
        };
        raster.validate()?;
        Ok(raster)
    }

    /// Create a `(y, x)` raster whose coordinate labels follow `transform`.
    pub fn spatial(
        data: Vec<f32>,
        width: usize,
        height: usize,
        transform: GeoTransform,
    ) -> Result<Self> {
        let (y, x) = spatial_dims(&transform, width, height);
        Ok(Self::new(vec![y, x], data)?.with_transform(transform))
    }

    /// Check that data length and dimension names are consistent.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for dim in &self.dims {
            if !seen.insert(dim.name.as_str()) {
                return Err(RasterError::invalid_raster(format!(
                    "duplicate dimension '{}'",
                    dim.name
                )));
            }
        }

        let expected: usize = self.dims.iter().map(Dimension::len).product();
        if expected != self.data.len() {
            return Err(RasterError::invalid_raster(format!(
                "dimensions {:?} imply {} values, got {}",
                self.shape(),
                expected,
                self.data.len()
            )));
        }
        Ok(())
    }

    pub fn with_transform(mut self, transform: GeoTransform) -> Self {
        self.transform = Some(transform);
        self
    }

    pub fn with_crs(mut self, crs: CrsCode) -> Self {
        self.crs = Some(crs);
        self
    }

    pub fn with_nodata(mut self, nodata: f32) -> Self {
        self.nodata = Some(nodata);
        self
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    pub fn with_attrs(mut self, attrs: BTreeMap<String, String>) -> Self {
        self.attrs = attrs;
        self
    }

    pub fn dims(&self) -> &[Dimension] {
        &self.dims
    }

    pub fn dim_names(&self) -> Vec<&str> {
        self.dims.iter().map(|d| d.name.as_str()).collect()
    }

    pub fn dim(&self, name: &str) -> Option<&Dimension> {
        self.dims.iter().find(|d| d.name == name)
    }

    pub fn dim_index(&self, name: &str) -> Option<usize> {
        self.dims.iter().position(|d| d.name == name)
    }

    pub fn has_dim(&self, name: &str) -> bool {
        self.dim_index(name).is_some()
    }

    /// Sizes of all dimensions, in order.
    pub fn shape(&self) -> Vec<usize> {
        self.dims.iter().map(Dimension::len).collect()
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn into_data(self) -> Vec<f32> {
        self.data
    }

    pub fn transform(&self) -> Option<&GeoTransform> {
        self.transform.as_ref()
    }

    pub fn crs(&self) -> Option<CrsCode> {
        self.crs
    }

    pub fn nodata(&self) -> Option<f32> {
        self.nodata
    }

    pub fn attrs(&self) -> &BTreeMap<String, String> {
        &self.attrs
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).map(String::as_str)
    }

    /// Number of columns (size of `x`), or 0 when absent.
    pub fn width(&self) -> usize {
        self.dim(X_DIM).map(Dimension::len).unwrap_or(0)
    }

    /// Number of rows (size of `y`), or 0 when absent.
    pub fn height(&self) -> usize {
        self.dim(Y_DIM).map(Dimension::len).unwrap_or(0)
    }

    /// Check that `y` and `x` are the two trailing dimensions.
    pub fn check_spatial_layout(&self) -> Result<()> {
        let n = self.dims.len();
        if n < 2 || self.dims[n - 2].name != Y_DIM || self.dims[n - 1].name != X_DIM {
            return Err(RasterError::reprojection(format!(
                "spatial dimensions must be trailing (y, x), got {:?}",
                self.dim_names()
            )));
        }
        Ok(())
    }

    /// Number of 2D planes stacked over the non-spatial dimensions.
    pub fn plane_count(&self) -> usize {
        let plane = self.width() * self.height();
        if plane == 0 {
            0
        } else {
            self.data.len() / plane
        }
    }

    /// Iterate over the 2D planes in storage order.
    pub fn planes(&self) -> impl Iterator<Item = &[f32]> {
        self.data.chunks(self.width().max(1) * self.height().max(1))
    }

    /// The geotransform, falling back to one inferred from the `x`/`y` labels.
    ///
    /// Inference needs at least two evenly spaced numeric labels on each
    /// axis, as pixel-center coordinates.
    pub fn geotransform(&self) -> Result<GeoTransform> {
        if let Some(transform) = self.transform {
            transform.validate()?;
            return Ok(transform);
        }

        let (x0, dx) = axis_spacing(self.dim(X_DIM), X_DIM)?;
        let (y0, dy) = axis_spacing(self.dim(Y_DIM), Y_DIM)?;
        let transform = GeoTransform::new(x0 - dx / 2.0, dx, y0 - dy / 2.0, dy);
        transform.validate()?;
        Ok(transform)
    }

    /// Select one position along `name`, dropping that dimension.
    pub fn isel(&self, name: &str, index: usize) -> Result<Raster> {
        let axis = self.require_dim(name)?;
        let size = self.dims[axis].len();
        if index >= size {
            return Err(RasterError::invalid_raster(format!(
                "index {} out of range for dimension '{}' of size {}",
                index, name, size
            )));
        }

        let (outer, inner) = self.strides(axis);
        let mut data = Vec::with_capacity(outer * inner);
        for o in 0..outer {
            let start = (o * size + index) * inner;
            data.extend_from_slice(&self.data[start..start + inner]);
        }

        let mut dims = self.dims.clone();
        dims.remove(axis);

        Ok(self.derive(dims, data))
    }

    /// Select the position labeled `label` along `name`, dropping that dimension.
    pub fn sel(&self, name: &str, label: &CoordValue) -> Result<Raster> {
        let axis = self.require_dim(name)?;
        let index = self.dims[axis].position(label).ok_or_else(|| {
            RasterError::invalid_raster(format!("label {} not found on dimension '{}'", label, name))
        })?;
        self.isel(name, index)
    }

    /// Insert a singleton dimension `name` labeled `label` at `position`.
    pub fn expand_dims(&self, name: &str, label: CoordValue, position: usize) -> Result<Raster> {
        if self.has_dim(name) {
            return Err(RasterError::invalid_raster(format!(
                "dimension '{}' already exists",
                name
            )));
        }
        if position > self.dims.len() {
            return Err(RasterError::invalid_raster(format!(
                "cannot insert dimension at position {} of {}",
                position,
                self.dims.len()
            )));
        }

        let mut dims = self.dims.clone();
        dims.insert(position, Dimension::new(name, vec![label]));
        Ok(self.derive(dims, self.data.clone()))
    }

    /// Drop every non-spatial dimension of size one.
    pub fn squeeze(&self) -> Raster {
        let dims = self
            .dims
            .iter()
            .filter(|d| d.len() != 1 || d.name == X_DIM || d.name == Y_DIM)
            .cloned()
            .collect();
        self.derive(dims, self.data.clone())
    }

    /// Concatenate rasters along an existing dimension.
    ///
    /// All parts must agree on every other dimension, the dimension's
    /// position, and their spatial reference. Labels along `name` must not
    /// repeat across parts.
    pub fn concat(parts: &[Raster], name: &str, policy: AttrPolicy) -> Result<Raster> {
        let first = parts
            .first()
            .ok_or_else(|| RasterError::invalid_raster("nothing to concatenate"))?;
        let axis = first.require_dim(name)?;

        let mut labels = Vec::new();
        for part in parts {
            if part.dim_index(name) != Some(axis) || part.dims.len() != first.dims.len() {
                return Err(RasterError::invalid_raster(format!(
                    "dimension layout mismatch: {:?} vs {:?}",
                    part.dim_names(),
                    first.dim_names()
                )));
            }
            let others_match = part
                .dims
                .iter()
                .zip(&first.dims)
                .enumerate()
                .all(|(i, (a, b))| i == axis || a == b);
            if !others_match {
                return Err(RasterError::invalid_raster(format!(
                    "cannot concatenate along '{}': other dimensions differ",
                    name
                )));
            }
            if part.transform != first.transform || part.crs != first.crs {
                return Err(RasterError::invalid_raster(format!(
                    "cannot concatenate along '{}': spatial reference differs",
                    name
                )));
            }
            for label in &part.dims[axis].labels {
                if labels.contains(label) {
                    return Err(RasterError::invalid_raster(format!(
                        "duplicate label {} along '{}'",
                        label, name
                    )));
                }
                labels.push(label.clone());
            }
        }

        let (outer, inner) = first.strides(axis);
        let mut data = Vec::with_capacity(parts.iter().map(|p| p.data.len()).sum());
        for o in 0..outer {
            for part in parts {
                let block = part.dims[axis].len() * inner;
                data.extend_from_slice(&part.data[o * block..(o + 1) * block]);
            }
        }

        let mut dims = first.dims.clone();
        dims[axis] = Dimension::new(name, labels);

        let nodata = first.nodata;
        Ok(Raster {
            dims,
            data,
            transform: first.transform,
            crs: first.crs,
            nodata,
            attrs: policy.combine(parts.iter().map(|p| &p.attrs)),
        })
    }

    /// Replace the spatial grid, keeping the non-spatial dimensions.
    pub(crate) fn with_spatial_grid(
        &self,
        data: Vec<f32>,
        width: usize,
        height: usize,
        transform: GeoTransform,
    ) -> Raster {
        let (y, x) = spatial_dims(&transform, width, height);
        let n = self.dims.len();
        let mut dims = self.dims[..n - 2].to_vec();
        dims.push(y);
        dims.push(x);

        let mut raster = self.derive(dims, data);
        raster.transform = Some(transform);
        raster
    }

    pub(crate) fn set_crs(&mut self, crs: CrsCode) {
        self.crs = Some(crs);
    }

    pub(crate) fn set_nodata(&mut self, nodata: Option<f32>) {
        self.nodata = nodata;
    }

    fn derive(&self, dims: Vec<Dimension>, data: Vec<f32>) -> Raster {
        Raster {
            dims,
            data,
            transform: self.transform,
            crs: self.crs,
            nodata: self.nodata,
            attrs: self.attrs.clone(),
        }
    }

    fn require_dim(&self, name: &str) -> Result<usize> {
        self.dim_index(name).ok_or_else(|| {
            RasterError::invalid_raster(format!(
                "dimension '{}' not found in {:?}",
                name,
                self.dim_names()
            ))
        })
    }

    /// (product of sizes before `axis`, product of sizes after `axis`)
    fn strides(&self, axis: usize) -> (usize, usize) {
        let outer = self.dims[..axis].iter().map(Dimension::len).product();
        let inner = self.dims[axis + 1..].iter().map(Dimension::len).product();
        (outer, inner)
    }
}

/// Pixel-center labels for the `y` and `x` dimensions of a grid.
pub fn spatial_dims(transform: &GeoTransform, width: usize, height: usize) -> (Dimension, Dimension) {
    let xs = (0..width)
        .map(|col| CoordValue::Float(transform.pixel_center(col, 0).0))
        .collect();
    let ys = (0..height)
        .map(|row| CoordValue::Float(transform.pixel_center(0, row).1))
        .collect();
    (Dimension::new(Y_DIM, ys), Dimension::new(X_DIM, xs))
}

/// JSON has no NaN, so missing values travel as `null`.
mod nan_as_null {
    use serde::ser::SerializeSeq;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(data: &[f32], serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(data.len()))?;
        for value in data {
            if value.is_nan() {
                seq.serialize_element(&None::<f32>)?;
            } else {
                seq.serialize_element(value)?;
            }
        }
        seq.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<f32>, D::Error> {
        let values = Vec::<Option<f32>>::deserialize(deserializer)?;
        Ok(values.into_iter().map(|v| v.unwrap_or(f32::NAN)).collect())
    }
}

fn axis_spacing(dim: Option<&Dimension>, name: &str) -> Result<(f64, f64)> {
    let dim = dim.ok_or_else(|| RasterError::reprojection(format!("missing '{}' axis", name)))?;
    let values: Option<Vec<f64>> = dim.labels.iter().map(CoordValue::as_f64).collect();
    let values = values.ok_or_else(|| {
        RasterError::reprojection(format!("'{}' coordinates are not numeric", name))
    })?;

    if values.len() < 2 {
        return Err(RasterError::reprojection(format!(
            "cannot infer resolution from {} '{}' coordinate(s)",
            values.len(),
            name
        )));
    }

    let step = values[1] - values[0];
    let tolerance = step.abs() * 1e-6;
    let regular = values
        .windows(2)
        .all(|w| ((w[1] - w[0]) - step).abs() <= tolerance);
    if !regular || step == 0.0 {
        return Err(RasterError::reprojection(format!(
            "'{}' coordinates are not evenly spaced",
            name
        )));
    }

    Ok((values[0], step))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn banded() -> Raster {
        // (band=2, y=2, x=3)
        let data: Vec<f32> = (0..12).map(|v| v as f32).collect();
        Raster::new(
            vec![
                Dimension::new("band", vec![1.into(), 2.into()]),
                Dimension::indexed(Y_DIM, 2),
                Dimension::indexed(X_DIM, 3),
            ],
            data,
        )
        .unwrap()
    }

    #[test]
    fn test_new_rejects_length_mismatch() {
        let err = Raster::new(vec![Dimension::indexed(Y_DIM, 2)], vec![0.0; 3]).unwrap_err();
        assert!(matches!(err, RasterError::InvalidRaster(_)));
    }

    #[test]
    fn test_new_rejects_duplicate_dims() {
        let err = Raster::new(
            vec![Dimension::indexed(X_DIM, 1), Dimension::indexed(X_DIM, 1)],
            vec![0.0],
        )
        .unwrap_err();
        assert!(matches!(err, RasterError::InvalidRaster(_)));
    }

    #[test]
    fn test_isel_leading() {
        let second = banded().isel("band", 1).unwrap();
        assert_eq!(second.dim_names(), vec!["y", "x"]);
        assert_eq!(second.data(), &[6.0, 7.0, 8.0, 9.0, 10.0, 11.0]);
    }

    #[test]
    fn test_isel_middle() {
        // Select row 1 of every band
        let row = banded().isel(Y_DIM, 1).unwrap();
        assert_eq!(row.shape(), vec![2, 3]);
        assert_eq!(row.data(), &[3.0, 4.0, 5.0, 9.0, 10.0, 11.0]);
    }

    #[test]
    fn test_sel_by_label() {
        let first = banded().sel("band", &CoordValue::Int(1)).unwrap();
        assert_eq!(first.data()[0], 0.0);
        assert!(banded().sel("band", &CoordValue::Int(9)).is_err());
    }

    #[test]
    fn test_expand_then_concat_restores() {
        let raster = banded();
        let parts: Vec<Raster> = (0..2)
            .map(|i| {
                let slice = raster.isel("band", i).unwrap();
                let label = raster.dims()[0].labels[i].clone();
                slice.expand_dims("band", label, 0).unwrap()
            })
            .collect();

        let merged = Raster::concat(&parts, "band", AttrPolicy::DropConflicts).unwrap();
        assert_eq!(merged, raster);
    }

    #[test]
    fn test_concat_rejects_duplicate_labels() {
        let slice = banded().isel("band", 0).unwrap();
        let a = slice.expand_dims("band", 1.into(), 0).unwrap();
        let err = Raster::concat(&[a.clone(), a], "band", AttrPolicy::Drop).unwrap_err();
        assert!(matches!(err, RasterError::InvalidRaster(_)));
    }

    #[test]
    fn test_squeeze_keeps_spatial() {
        let raster = Raster::new(
            vec![
                Dimension::new("date", vec!["2024-01-01".into()]),
                Dimension::indexed(Y_DIM, 1),
                Dimension::indexed(X_DIM, 2),
            ],
            vec![1.0, 2.0],
        )
        .unwrap();
        assert_eq!(raster.squeeze().dim_names(), vec!["y", "x"]);
    }

    #[test]
    fn test_geotransform_inferred_from_labels() {
        let transform = GeoTransform::new(10.0, 0.5, 20.0, -0.5);
        let raster = Raster::spatial(vec![0.0; 6], 3, 2, transform).unwrap();

        let mut unlabeled = raster.clone();
        unlabeled.transform = None;
        let inferred = unlabeled.geotransform().unwrap();
        assert!((inferred.origin_x - 10.0).abs() < 1e-12);
        assert!((inferred.pixel_width - 0.5).abs() < 1e-12);
        assert!((inferred.origin_y - 20.0).abs() < 1e-12);
        assert!((inferred.pixel_height + 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_geotransform_unreadable() {
        let raster = Raster::new(
            vec![Dimension::indexed(Y_DIM, 1), Dimension::indexed(X_DIM, 1)],
            vec![1.0],
        )
        .unwrap();
        assert!(matches!(
            raster.geotransform(),
            Err(RasterError::ReprojectionFailure(_))
        ));
    }

    #[test]
    fn test_serde_nan_as_null() {
        let raster = Raster::new(
            vec![Dimension::indexed(Y_DIM, 1), Dimension::indexed(X_DIM, 2)],
            vec![f32::NAN, 2.0],
        )
        .unwrap();
        let json = serde_json::to_value(&raster).unwrap();
        assert_eq!(json["data"], serde_json::json!([null, 2.0]));

        let back: Raster = serde_json::from_value(json).unwrap();
        assert!(back.data()[0].is_nan());
        assert_eq!(back.data()[1], 2.0);
    }

    #[test]
    fn test_serde_round_trip() {
        let raster = banded()
            .with_crs(CrsCode::Epsg4326)
            .with_attr("units", "fraction");
        let json = serde_json::to_string(&raster).unwrap();
        let back: Raster = serde_json::from_str(&json).unwrap();
        assert_eq!(back, raster);
    }
}
