//! Regular lon/lat grids as delivered by raster services.

use crate::BoundingBox;
use serde::{Deserialize, Serialize};

/// One raster cell centre as delivered by a gridded service.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridCell {
    pub lon: f64,
    pub lat: f64,
    /// `None` for fill values (land cells, NaN).
    pub value: Option<f64>,
}

impl GridCell {
    pub fn new(lon: f64, lat: f64, value: Option<f64>) -> Self {
        Self { lon, lat, value }
    }

    pub fn has_valid_coordinates(&self) -> bool {
        self.lon.is_finite()
            && self.lat.is_finite()
            && (-180.0..=180.0).contains(&self.lon)
            && (-90.0..=90.0).contains(&self.lat)
    }
}

/// Specification of a regular lat/lon grid.
///
/// Points are stored row-major starting at the south-west corner, with `dx`
/// and `dy` both positive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    /// Number of points in X (longitude) direction
    pub nx: usize,
    /// Number of points in Y (latitude) direction
    pub ny: usize,
    /// Grid resolution in X direction (degrees)
    pub dx: f64,
    /// Grid resolution in Y direction (degrees)
    pub dy: f64,
    /// Westernmost cell-centre longitude
    pub first_x: f64,
    /// Southernmost cell-centre latitude
    pub first_y: f64,
}

/// Coordinates closer than this are considered the same grid line.
const AXIS_TOLERANCE: f64 = 1e-9;

impl GridSpec {
    pub fn new(nx: usize, ny: usize, dx: f64, dy: f64, first_x: f64, first_y: f64) -> Self {
        Self {
            nx,
            ny,
            dx,
            dy,
            first_x,
            first_y,
        }
    }

    /// Recover the grid a set of cell centres was sampled from.
    ///
    /// Returns `None` when there is no cell with valid coordinates.
    pub fn infer(cells: &[GridCell]) -> Option<GridSpec> {
        let xs = unique_sorted(cells.iter().filter(|c| c.has_valid_coordinates()).map(|c| c.lon));
        let ys = unique_sorted(cells.iter().filter(|c| c.has_valid_coordinates()).map(|c| c.lat));

        let (first_x, last_x) = (*xs.first()?, *xs.last()?);
        let (first_y, last_y) = (*ys.first()?, *ys.last()?);

        let step = |first: f64, last: f64, n: usize| {
            if n > 1 {
                (last - first) / (n - 1) as f64
            } else {
                0.0
            }
        };

        Some(GridSpec {
            nx: xs.len(),
            ny: ys.len(),
            dx: step(first_x, last_x, xs.len()),
            dy: step(first_y, last_y, ys.len()),
            first_x,
            first_y,
        })
    }

    /// Calculate the bounding box of the cell centres.
    pub fn bbox(&self) -> BoundingBox {
        let last_x = self.first_x + self.nx.saturating_sub(1) as f64 * self.dx;
        let last_y = self.first_y + self.ny.saturating_sub(1) as f64 * self.dy;
        BoundingBox::new(self.first_x, self.first_y, last_x, last_y)
    }

    /// Convert a grid index to the cell-centre (lon, lat).
    pub fn index_to_coord(&self, i: usize, j: usize) -> Option<(f64, f64)> {
        if i >= self.nx || j >= self.ny {
            return None;
        }
        Some((
            self.first_x + i as f64 * self.dx,
            self.first_y + j as f64 * self.dy,
        ))
    }

    /// Convert coordinates to the nearest grid index.
    pub fn coord_to_index(&self, x: f64, y: f64) -> Option<(usize, usize)> {
        let i = axis_index(x, self.first_x, self.dx, self.nx)?;
        let j = axis_index(y, self.first_y, self.dy, self.ny)?;
        Some((i, j))
    }

    /// Get the 1D array index for a 2D grid position (row-major).
    pub fn flat_index(&self, i: usize, j: usize) -> usize {
        j * self.nx + i
    }

    /// Total number of grid points.
    pub fn len(&self) -> usize {
        self.nx * self.ny
    }

    pub fn is_empty(&self) -> bool {
        self.nx == 0 || self.ny == 0
    }
}

fn axis_index(value: f64, first: f64, step: f64, n: usize) -> Option<usize> {
    if !value.is_finite() || n == 0 {
        return None;
    }
    if n == 1 || step == 0.0 {
        return ((value - first).abs() <= AXIS_TOLERANCE.max(step.abs() / 2.0)).then_some(0);
    }
    let idx = ((value - first) / step).round();
    if idx < 0.0 || idx >= n as f64 {
        return None;
    }
    Some(idx as usize)
}

fn unique_sorted(values: impl Iterator<Item = f64>) -> Vec<f64> {
    let mut v: Vec<f64> = values.collect();
    v.sort_by(f64::total_cmp);
    v.dedup_by(|a, b| (*a - *b).abs() <= AXIS_TOLERANCE);
    v
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells() -> Vec<GridCell> {
        let mut out = Vec::new();
        for j in 0..3 {
            for i in 0..4 {
                out.push(GridCell::new(
                    -67.5 + i as f64 * 0.5,
                    49.0 + j as f64 * 0.25,
                    Some((i * 10 + j) as f64),
                ));
            }
        }
        out
    }

    #[test]
    fn test_infer_regular_grid() {
        let spec = GridSpec::infer(&cells()).unwrap();
        assert_eq!(spec.nx, 4);
        assert_eq!(spec.ny, 3);
        assert!((spec.dx - 0.5).abs() < 1e-12);
        assert!((spec.dy - 0.25).abs() < 1e-12);
        assert_eq!(spec.len(), 12);

        let bbox = spec.bbox();
        assert_eq!(bbox.min_x, -67.5);
        assert!((bbox.max_y - 49.5).abs() < 1e-12);
    }

    #[test]
    fn test_index_roundtrip() {
        let spec = GridSpec::infer(&cells()).unwrap();
        let (x, y) = spec.index_to_coord(2, 1).unwrap();
        assert_eq!(spec.coord_to_index(x, y), Some((2, 1)));
        assert_eq!(spec.flat_index(2, 1), 6);
        assert!(spec.index_to_coord(4, 0).is_none());
        assert!(spec.coord_to_index(-70.0, 49.0).is_none());
    }

    #[test]
    fn test_infer_skips_bad_cells() {
        let mut c = cells();
        c.push(GridCell::new(f64::NAN, 49.0, Some(1.0)));
        c.push(GridCell::new(-200.0, 49.0, Some(1.0)));
        let spec = GridSpec::infer(&c).unwrap();
        assert_eq!(spec.nx, 4);

        assert!(GridSpec::infer(&[]).is_none());
    }

    #[test]
    fn test_single_column_grid() {
        let c = vec![
            GridCell::new(-66.0, 49.0, None),
            GridCell::new(-66.0, 49.5, None),
        ];
        let spec = GridSpec::infer(&c).unwrap();
        assert_eq!(spec.nx, 1);
        assert_eq!(spec.coord_to_index(-66.0, 49.5), Some((0, 1)));
        assert_eq!(spec.coord_to_index(-65.0, 49.5), None);
    }
}
