//! Generators for synthetic, predictable seascape data.

use geo::{point, MultiPolygon, Polygon};
use seascape_common::{GeoBounds, GridCell, RawOccurrence};

/// Creates grid cells covering `bounds` at `step` degrees, with values from `f(lon, lat)`.
///
/// Cells are emitted row-major from the south-west corner, like a griddap
/// response sorted by latitude then longitude.
pub fn create_grid_cells(
    bounds: &GeoBounds,
    step: f64,
    f: impl Fn(f64, f64) -> Option<f64>,
) -> Vec<GridCell> {
    let nx = ((bounds.east() - bounds.west()) / step).round() as usize + 1;
    let ny = ((bounds.north() - bounds.south()) / step).round() as usize + 1;
    let mut cells = Vec::with_capacity(nx * ny);
    for j in 0..ny {
        for i in 0..nx {
            let lon = bounds.west() + i as f64 * step;
            let lat = bounds.south() + j as f64 * step;
            cells.push(GridCell::new(lon, lat, f(lon, lat)));
        }
    }
    cells
}

/// Depth grid deepening toward the estuary channel; cells west of -67.2 are land.
pub fn create_depth_cells(bounds: &GeoBounds, step: f64) -> Vec<GridCell> {
    create_grid_cells(bounds, step, |lon, lat| {
        if lon < -67.2 {
            Some(50.0)
        } else {
            Some(-(100.0 + (lat - bounds.south()) * 150.0 + (lon - bounds.west()) * 40.0))
        }
    })
}

/// Sea-surface temperature field: warmer to the south, NaN over land (lon < -67.2).
pub fn create_sst_cells(bounds: &GeoBounds, step: f64) -> Vec<GridCell> {
    create_grid_cells(bounds, step, |lon, lat| {
        (lon >= -67.2).then(|| 8.0 - (lat - bounds.south()) * 2.0)
    })
}

/// Salinity field: constant 31.5 at sea, NaN over land (lon < -67.2).
pub fn create_salinity_cells(bounds: &GeoBounds, step: f64) -> Vec<GridCell> {
    create_grid_cells(bounds, step, |lon, _| (lon >= -67.2).then_some(31.5))
}

/// Creates `n` occurrences spread along a line through the study area.
///
/// Every third record has no count; every fifth repeats the previous position.
pub fn create_occurrences(bounds: &GeoBounds, n: usize) -> Vec<RawOccurrence> {
    let mut out = Vec::with_capacity(n);
    let mut last = (bounds.west(), bounds.south());
    for k in 0..n {
        let frac = (k as f64 + 0.5) / n.max(1) as f64;
        let pos = if k % 5 == 4 {
            last
        } else {
            (
                bounds.west() + frac * (bounds.east() - bounds.west()),
                bounds.south() + frac * (bounds.north() - bounds.south()),
            )
        };
        last = pos;
        out.push(RawOccurrence {
            species: if k % 2 == 0 {
                "Balaenoptera musculus".to_string()
            } else {
                "Megaptera novaeangliae".to_string()
            },
            longitude: Some(pos.0),
            latitude: Some(pos.1),
            individual_count: (k % 3 != 0).then_some((k % 4 + 1) as u32),
            year: Some(2019),
        });
    }
    out
}

/// A coarse "land" polygon covering the north shore of the estuary, lon/lat.
pub fn create_north_shore() -> MultiPolygon<f64> {
    let exterior = vec![
        point!(x: -70.0, y: 49.3),
        point!(x: -68.0, y: 49.1),
        point!(x: -66.0, y: 50.0),
        point!(x: -64.0, y: 50.2),
        point!(x: -64.0, y: 52.0),
        point!(x: -70.0, y: 52.0),
        point!(x: -70.0, y: 49.3),
    ];
    MultiPolygon::new(vec![Polygon::new(exterior.into(), vec![])])
}
