//! Interpolation methods for grid resampling.

/// Nearest neighbor interpolation.
///
/// `x` and `y` are fractional pixel positions where pixel `(i, j)` spans
/// `[i, i + 1) x [j, j + 1)`. Returns the value of the pixel containing the
/// position, or NaN when it falls outside the grid.
pub fn nearest_interpolate(data: &[f32], width: usize, height: usize, x: f64, y: f64) -> f32 {
    if !(x.is_finite() && y.is_finite()) || x < 0.0 || y < 0.0 {
        return f32::NAN;
    }

    let col = x.floor() as usize;
    let row = y.floor() as usize;

    if col >= width || row >= height {
        return f32::NAN;
    }

    data[row * width + col]
}
