//! Test data generators for synthetic rasters.
//!
//! These generators create predictable, verifiable value patterns that
//! can be used across the test suite.

/// Creates a test grid with predictable values.
///
/// Each cell value is calculated as: `col * 1000 + row`
///
/// This makes it easy to check where a resampled pixel was sampled from:
/// an output value `v` came from input column `v / 1000`, row `v % 1000`.
///
/// # Arguments
///
/// * `width` - Number of columns
/// * `height` - Number of rows
///
/// # Returns
///
/// A `Vec<f32>` in row-major order (row 0 first, then row 1, etc.)
///
/// # Example
///
/// ```
/// use test_utils::create_test_grid;
///
/// let grid = create_test_grid(10, 5);
/// assert_eq!(grid.len(), 50); // 10 * 5
/// assert_eq!(grid[0], 0.0);   // col=0, row=0 -> 0*1000 + 0
/// assert_eq!(grid[1], 1000.0); // col=1, row=0 -> 1*1000 + 0
/// assert_eq!(grid[10], 1.0);  // col=0, row=1 -> 0*1000 + 1
/// ```
pub fn create_test_grid(width: usize, height: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            data.push((col * 1000 + row) as f32);
        }
    }
    data
}

/// Creates a stack of `planes` test grids, offset by `plane * 1_000_000`.
///
/// Useful for band or leadtime stacks where each slice must stay
/// distinguishable after resampling.
pub fn create_test_stack(width: usize, height: usize, planes: usize) -> Vec<f32> {
    let grid = create_test_grid(width, height);
    (0..planes)
        .flat_map(|plane| grid.iter().map(move |v| v + (plane * 1_000_000) as f32))
        .collect()
}

/// Creates a precipitation-like grid in mm/day.
///
/// Values follow a smooth pattern in `[0, 20)` that depends on `seed`,
/// so different leadtimes get different but deterministic fields.
pub fn create_precipitation_grid(width: usize, height: usize, seed: u32) -> Vec<f32> {
    let phase = seed as f32 * 0.7;
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            let x = col as f32 / width.max(1) as f32;
            let y = row as f32 / height.max(1) as f32;
            let wave = ((x * 6.0 + phase).sin() * (y * 4.0 - phase).cos() + 1.0) / 2.0;
            data.push(wave * 20.0);
        }
    }
    data
}

/// Creates a flooded-fraction grid with values in `[0, 1]`.
///
/// Flooding is concentrated along the middle rows, like a river valley.
pub fn create_flood_fraction_grid(width: usize, height: usize) -> Vec<f32> {
    let center = height as f32 / 2.0;
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        let distance = ((row as f32 + 0.5) - center).abs() / center.max(1.0);
        let fraction = (1.0 - distance).clamp(0.0, 1.0);
        for _col in 0..width {
            data.push(fraction);
        }
    }
    data
}

/// Creates a test grid with NaN at the given `(col, row)` positions.
pub fn create_grid_with_nans(
    width: usize,
    height: usize,
    nan_positions: &[(usize, usize)],
) -> Vec<f32> {
    let mut data = create_test_grid(width, height);
    for &(col, row) in nan_positions {
        if col < width && row < height {
            data[row * width + col] = f32::NAN;
        }
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_test_grid() {
        let grid = create_test_grid(3, 2);
        assert_eq!(grid, vec![0.0, 1000.0, 2000.0, 1.0, 1001.0, 2001.0]);
    }

    #[test]
    fn test_create_test_stack() {
        let stack = create_test_stack(2, 2, 3);
        assert_eq!(stack.len(), 12);
        assert_eq!(stack[4], 1_000_000.0);
        assert_eq!(stack[11], 2_001_001.0);
    }

    #[test]
    fn test_precipitation_deterministic() {
        let a = create_precipitation_grid(8, 8, 3);
        let b = create_precipitation_grid(8, 8, 3);
        assert_eq!(a, b);
        assert_ne!(a, create_precipitation_grid(8, 8, 4));
        assert!(a.iter().all(|v| (0.0..=20.0).contains(v)));
    }

    #[test]
    fn test_flood_fraction_range() {
        let grid = create_flood_fraction_grid(4, 10);
        assert!(grid.iter().all(|v| (0.0..=1.0).contains(v)));
        // Middle row floods more than the edge
        assert!(grid[5 * 4] > grid[0]);
    }

    #[test]
    fn test_create_grid_with_nans() {
        let grid = create_grid_with_nans(3, 3, &[(1, 1), (5, 5)]);
        assert!(grid[4].is_nan());
        assert_eq!(grid.iter().filter(|v| v.is_nan()).count(), 1);
    }
}
