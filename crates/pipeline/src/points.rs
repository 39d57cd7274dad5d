//! Point-data loaders for occurrences, bathymetry and environmental layers.
//!
//! All three follow the same contract: fetch raw rows, drop rows without
//! usable coordinates, tag the rest as EPSG:4326, reproject into the area
//! CRS and optionally mask to the buffered area. Dropped rows are counted in
//! a [`LoadReport`], never treated as errors.

use std::collections::BTreeMap;
use std::fmt;

use geo::{MultiPolygon, Point};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use projection::Transformer;
use seascape_common::{
    BathymetrySample, CrsCode, EnvironmentalSample, GridCell, Georeferenced, Located, Occurrence,
    PointDataset, SeascapeResult, YearFilter,
};
use sources::{
    BathymetrySource, EnvironmentalSource, GridQuery, LayerDescriptor, OccurrenceQuery,
    OccurrenceSource,
};

use crate::area::AreaOfInterest;
use crate::ops::PointMask;

/// Which loader produced a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetKind {
    Occurrences,
    Bathymetry,
    Environmental,
}

impl DatasetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetKind::Occurrences => "occurrences",
            DatasetKind::Bathymetry => "bathymetry",
            DatasetKind::Environmental => "environmental",
        }
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Row accounting for one loader run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub kind: DatasetKind,
    /// Rows returned by the source; distinct cells for joined layers.
    pub received: usize,
    /// Missing, non-finite or out-of-range coordinates.
    pub invalid_coordinates: usize,
    /// Rows with no value (land cells, fill values).
    pub missing_values: usize,
    /// Valid lon/lat outside the domain of the target projection.
    pub unprojectable: usize,
    /// Rows outside the requested year that the server returned anyway.
    pub outside_filter: usize,
    /// Rows outside the mask.
    pub outside_mask: usize,
    pub kept: usize,
}

impl LoadReport {
    fn new(kind: DatasetKind, received: usize) -> Self {
        Self {
            kind,
            received,
            invalid_coordinates: 0,
            missing_values: 0,
            unprojectable: 0,
            outside_filter: 0,
            outside_mask: 0,
            kept: 0,
        }
    }

    pub fn dropped(&self) -> usize {
        self.invalid_coordinates
            + self.missing_values
            + self.unprojectable
            + self.outside_filter
            + self.outside_mask
    }

    fn publish(&self) {
        let kind = self.kind.as_str();
        metrics::counter!("seascape_rows_received_total", "dataset" => kind).increment(self.received as u64);
        metrics::counter!("seascape_rows_dropped_total", "dataset" => kind, "reason" => "invalid_coordinates")
            .increment(self.invalid_coordinates as u64);
        metrics::counter!("seascape_rows_dropped_total", "dataset" => kind, "reason" => "missing_value")
            .increment(self.missing_values as u64);
        metrics::counter!("seascape_rows_dropped_total", "dataset" => kind, "reason" => "unprojectable")
            .increment(self.unprojectable as u64);
        metrics::counter!("seascape_rows_dropped_total", "dataset" => kind, "reason" => "outside_filter")
            .increment(self.outside_filter as u64);
        metrics::counter!("seascape_rows_dropped_total", "dataset" => kind, "reason" => "outside_mask")
            .increment(self.outside_mask as u64);

        if self.invalid_coordinates > 0 {
            warn!(
                dataset = kind,
                dropped = self.invalid_coordinates,
                "Dropped rows with invalid coordinates"
            );
        }
        if self.unprojectable > 0 {
            warn!(
                dataset = kind,
                dropped = self.unprojectable,
                "Dropped rows outside the projection domain"
            );
        }
        info!(
            dataset = kind,
            received = self.received,
            kept = self.kept,
            dropped = self.dropped(),
            "Loaded point dataset"
        );
    }
}

/// A loaded dataset with its row accounting.
#[derive(Debug, Clone)]
pub struct Loaded<T> {
    pub dataset: PointDataset<T>,
    pub report: LoadReport,
}

/// Occurrence filters applied on top of the area.
#[derive(Debug, Clone, Default)]
pub struct OccurrenceFilter {
    pub year: Option<YearFilter>,
    pub scientific_name: Option<String>,
    pub max_records: usize,
}

/// Keep the points covered by `mask`.
///
/// Fails with `CrsMismatch` when the dataset and mask tags differ. Returns
/// the number of points removed.
pub fn mask_points<T: Located>(
    dataset: &mut PointDataset<T>,
    mask: &Georeferenced<MultiPolygon<f64>>,
) -> SeascapeResult<usize> {
    seascape_common::georef::ensure_crs(dataset.crs(), mask.crs())?;
    let before = dataset.len();
    let mask = PointMask::new(mask);
    dataset.retain(|record| mask.covers(record.location()));
    Ok(before - dataset.len())
}

/// Reproject a geographic dataset into `to`, dropping records the target
/// projection cannot represent. Returns the number dropped.
fn reproject<T: Located>(
    dataset: PointDataset<T>,
    to: CrsCode,
    transformer: &Transformer,
) -> (PointDataset<T>, usize) {
    let from = dataset.crs();
    if from == to {
        return (dataset, 0);
    }
    dataset.relocate(to, |p| match transformer.transform_coord(from, to, p.0) {
        Ok(c) => Some(c.into()),
        Err(err) => {
            debug!(error = %err, "Skipping record");
            None
        }
    })
}

fn finish<T: Located>(
    dataset: PointDataset<T>,
    mut report: LoadReport,
    aoi: &AreaOfInterest,
    mask: Option<&Georeferenced<MultiPolygon<f64>>>,
    transformer: &Transformer,
) -> SeascapeResult<Loaded<T>> {
    let (mut dataset, unprojectable) = reproject(dataset, aoi.crs(), transformer);
    report.unprojectable = unprojectable;
    if let Some(mask) = mask {
        report.outside_mask = mask_points(&mut dataset, mask)?;
    }
    report.kept = dataset.len();
    report.publish();
    Ok(Loaded { dataset, report })
}

/// Fetch occurrences inside the area, optionally masked.
#[instrument(skip_all, fields(year = ?filter.year.map(|y| y.year())))]
pub async fn load_occurrences(
    source: &dyn OccurrenceSource,
    aoi: &AreaOfInterest,
    filter: &OccurrenceFilter,
    mask: Option<&Georeferenced<MultiPolygon<f64>>>,
    transformer: &Transformer,
) -> SeascapeResult<Loaded<Occurrence>> {
    let query = OccurrenceQuery {
        geometry_wkt: aoi.to_wkt(),
        bounds: *aoi.bounds(),
        year: filter.year,
        scientific_name: filter.scientific_name.clone(),
        max_records: filter.max_records,
    };
    let rows = source.fetch_occurrences(&query).await?;

    let mut report = LoadReport::new(DatasetKind::Occurrences, rows.len());
    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        let Some((lon, lat)) = row.valid_position() else {
            report.invalid_coordinates += 1;
            continue;
        };
        // Servers occasionally ignore the date window
        if let Some(year) = filter.year {
            if !year.matches(row.year) {
                report.outside_filter += 1;
                continue;
            }
        }
        records.push(Occurrence {
            species: row.species,
            count: row.individual_count,
            year: row.year,
            location: Point::new(lon, lat),
        });
    }

    finish(
        PointDataset::new(CrsCode::Epsg4326, records),
        report,
        aoi,
        mask,
        transformer,
    )
}

/// Fetch bathymetry over the area bounds, optionally masked.
#[instrument(skip_all, fields(stride = stride))]
pub async fn load_bathymetry(
    source: &dyn BathymetrySource,
    aoi: &AreaOfInterest,
    stride: u32,
    mask: Option<&Georeferenced<MultiPolygon<f64>>>,
    transformer: &Transformer,
) -> SeascapeResult<Loaded<BathymetrySample>> {
    let cells = source.fetch_bathymetry(&GridQuery::new(*aoi.bounds(), stride)).await?;

    let mut report = LoadReport::new(DatasetKind::Bathymetry, cells.len());
    let mut records = Vec::with_capacity(cells.len());
    for cell in cells {
        if !cell.has_valid_coordinates() {
            report.invalid_coordinates += 1;
            continue;
        }
        let Some(depth) = cell.value else {
            report.missing_values += 1;
            continue;
        };
        records.push(BathymetrySample {
            location: Point::new(cell.lon, cell.lat),
            depth,
        });
    }

    finish(
        PointDataset::new(CrsCode::Epsg4326, records),
        report,
        aoi,
        mask,
        transformer,
    )
}

/// Cell key at micro-degree precision, shared by every layer of a grid.
fn cell_key(cell: &GridCell) -> (i64, i64) {
    ((cell.lat * 1e6).round() as i64, (cell.lon * 1e6).round() as i64)
}

/// Fetch every layer over the area bounds, join them cell by cell and mask
/// the result to `mask`.
///
/// Cells where every layer is missing are dropped. A layer without data in
/// the area contributes `None` to every cell.
#[instrument(skip_all, fields(layers = layers.len(), stride = stride))]
pub async fn load_environmental(
    source: &dyn EnvironmentalSource,
    layers: &[LayerDescriptor],
    aoi: &AreaOfInterest,
    stride: u32,
    mask: &Georeferenced<MultiPolygon<f64>>,
    transformer: &Transformer,
) -> SeascapeResult<Loaded<EnvironmentalSample>> {
    let query = GridQuery::new(*aoi.bounds(), stride);
    let empty: BTreeMap<String, Option<f64>> =
        layers.iter().map(|layer| (layer.code.clone(), None)).collect();

    let mut layer_cells = 0usize;
    let mut invalid = 0usize;
    let mut joined: BTreeMap<(i64, i64), (GridCell, BTreeMap<String, Option<f64>>)> = BTreeMap::new();
    for layer in layers {
        let cells = source.fetch_layer(layer, &query).await?;
        if cells.is_empty() {
            warn!(layer = %layer.code, "Layer returned no cells");
        }
        layer_cells += cells.len();
        for cell in cells {
            if !cell.has_valid_coordinates() {
                invalid += 1;
                continue;
            }
            let entry = joined
                .entry(cell_key(&cell))
                .or_insert_with(|| (cell, empty.clone()));
            entry.1.insert(layer.code.clone(), cell.value);
        }
    }

    // One row per joined cell, plus rows that never reached the join
    debug!(layer_cells, joined = joined.len(), "Joined layer cells");
    let mut report = LoadReport::new(DatasetKind::Environmental, joined.len() + invalid);
    report.invalid_coordinates = invalid;

    let mut records = Vec::with_capacity(joined.len());
    for (cell, values) in joined.into_values() {
        if values.values().all(Option::is_none) {
            report.missing_values += 1;
            continue;
        }
        records.push(EnvironmentalSample {
            location: Point::new(cell.lon, cell.lat),
            values,
        });
    }

    finish(
        PointDataset::new(CrsCode::Epsg4326, records),
        report,
        aoi,
        Some(mask),
        transformer,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;
    use seascape_common::SeascapeError;

    fn dataset(crs: CrsCode) -> PointDataset<BathymetrySample> {
        PointDataset::new(
            crs,
            vec![
                BathymetrySample { location: Point::new(5.0, 5.0), depth: -10.0 },
                BathymetrySample { location: Point::new(10.0, 5.0), depth: -20.0 },
                BathymetrySample { location: Point::new(50.0, 5.0), depth: -30.0 },
            ],
        )
    }

    fn mask(crs: CrsCode) -> Georeferenced<MultiPolygon<f64>> {
        Georeferenced::new(
            crs,
            MultiPolygon::new(vec![polygon![
                (x: 0.0, y: 0.0), (x: 10.0, y: 0.0), (x: 10.0, y: 10.0), (x: 0.0, y: 10.0)
            ]]),
        )
    }

    #[test]
    fn test_mask_keeps_inside_and_boundary() {
        let mut data = dataset(CrsCode::Epsg32198);
        let removed = mask_points(&mut data, &mask(CrsCode::Epsg32198)).unwrap();
        assert_eq!(removed, 1);
        let depths: Vec<_> = data.records().iter().map(|r| r.depth).collect();
        assert_eq!(depths, vec![-10.0, -20.0]);
    }

    #[test]
    fn test_mask_crs_mismatch() {
        let mut data = dataset(CrsCode::Epsg4326);
        let err = mask_points(&mut data, &mask(CrsCode::Epsg32198)).unwrap_err();
        assert!(matches!(err, SeascapeError::CrsMismatch { .. }));
        assert_eq!(data.len(), 3);
    }

    #[test]
    fn test_report_dropped_sums_reasons() {
        let mut report = LoadReport::new(DatasetKind::Bathymetry, 10);
        report.invalid_coordinates = 1;
        report.missing_values = 2;
        report.outside_filter = 3;
        report.outside_mask = 4;
        assert_eq!(report.dropped(), 10);
    }
}
