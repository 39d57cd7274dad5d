//! In-memory sources for offline runs and tests.
//!
//! [`MemorySources`] serves fixed data through the same traits as the remote
//! clients and applies the same query semantics (bounding box, year, species,
//! grid stride), so the pipeline cannot tell the difference.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use geo::{coord, LineString, MultiPolygon, Polygon};
use tracing::debug;

use seascape_common::{GeoBounds, GridCell, GridSpec, RawOccurrence, SeascapeError, SeascapeResult};

use crate::catalog::{EnvironmentalCatalog, LayerDescriptor};
use crate::source::{
    BasemapScale, BasemapSource, BathymetrySource, EnvironmentalSource, GridQuery,
    OccurrenceQuery, OccurrenceSource,
};

#[derive(Debug, Default)]
pub struct MemorySources {
    occurrences: Vec<RawOccurrence>,
    bathymetry: Vec<GridCell>,
    layers: HashMap<String, Vec<GridCell>>,
    countries: HashMap<String, MultiPolygon<f64>>,
    calls: AtomicU32,
}

impl MemorySources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_occurrences(mut self, rows: Vec<RawOccurrence>) -> Self {
        self.occurrences = rows;
        self
    }

    pub fn with_bathymetry(mut self, cells: Vec<GridCell>) -> Self {
        self.bathymetry = cells;
        self
    }

    pub fn with_layer(mut self, code: impl Into<String>, cells: Vec<GridCell>) -> Self {
        self.layers.insert(code.into(), cells);
        self
    }

    pub fn with_country(mut self, name: &str, outline: MultiPolygon<f64>) -> Self {
        self.countries.insert(name.trim().to_lowercase(), outline);
        self
    }

    /// Total trait calls served, across all data kinds.
    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::Relaxed)
    }

    /// Deterministic data over `bounds` for offline runs: a 0.1 degree grid
    /// for bathymetry and every catalog layer, occurrences along the diagonal,
    /// and a "Canada" outline covering the northern third of the box.
    pub fn synthetic(bounds: &GeoBounds) -> Self {
        const STEP: f64 = 0.1;
        let (w, s, e, n) = (bounds.west(), bounds.south(), bounds.east(), bounds.north());
        let shore_lat = n - (n - s) / 3.0;
        let on_land = move |lat: f64| lat > shore_lat;

        let mut sources = Self::new()
            .with_bathymetry(synthetic_grid(bounds, STEP, |lon, lat| {
                Some(if on_land(lat) {
                    25.0
                } else {
                    -(50.0 + (shore_lat - lat) * 200.0 + (lon - w) * 20.0)
                })
            }))
            .with_occurrences(synthetic_occurrences(bounds, shore_lat, 24));

        let catalog = EnvironmentalCatalog::builtin();
        for dataset in catalog.dataset_codes() {
            for (k, layer) in catalog.list_layers(dataset, None).unwrap_or_default().into_iter().enumerate() {
                let base = 5.0 + 5.0 * k as f64;
                let cells = synthetic_grid(bounds, STEP, |lon, lat| {
                    (!on_land(lat)).then(|| base + (lat - s) + (lon - w) * 0.1)
                });
                sources = sources.with_layer(layer.code, cells);
            }
        }

        let land = Polygon::new(
            LineString::from(vec![
                coord! { x: w - 2.0, y: shore_lat },
                coord! { x: e + 2.0, y: shore_lat },
                coord! { x: e + 2.0, y: n + 2.0 },
                coord! { x: w - 2.0, y: n + 2.0 },
                coord! { x: w - 2.0, y: shore_lat },
            ]),
            vec![],
        );
        sources.with_country("Canada", MultiPolygon::new(vec![land]))
    }

    fn record_call(&self) {
        self.calls.fetch_add(1, Ordering::Relaxed);
    }
}

#[async_trait]
impl OccurrenceSource for MemorySources {
    async fn fetch_occurrences(&self, query: &OccurrenceQuery) -> SeascapeResult<Vec<RawOccurrence>> {
        self.record_call();
        let rows: Vec<RawOccurrence> = self
            .occurrences
            .iter()
            .filter(|row| {
                // Rows without a usable position are passed through for the
                // loader to count
                row.valid_position()
                    .map_or(true, |(lon, lat)| query.bounds.contains(lon, lat))
            })
            .filter(|row| query.year.map_or(true, |y| y.matches(row.year)))
            .filter(|row| {
                query
                    .scientific_name
                    .as_ref()
                    .map_or(true, |name| row.species.eq_ignore_ascii_case(name))
            })
            .take(query.max_records)
            .cloned()
            .collect();
        debug!(rows = rows.len(), "Served in-memory occurrences");
        Ok(rows)
    }
}

#[async_trait]
impl BathymetrySource for MemorySources {
    async fn fetch_bathymetry(&self, query: &GridQuery) -> SeascapeResult<Vec<GridCell>> {
        self.record_call();
        Ok(subset_grid(&self.bathymetry, query))
    }
}

#[async_trait]
impl EnvironmentalSource for MemorySources {
    async fn fetch_layer(&self, layer: &LayerDescriptor, query: &GridQuery) -> SeascapeResult<Vec<GridCell>> {
        self.record_call();
        Ok(self
            .layers
            .get(&layer.code)
            .map(|cells| subset_grid(cells, query))
            .unwrap_or_default())
    }
}

#[async_trait]
impl BasemapSource for MemorySources {
    async fn fetch_country(&self, name: &str, _scale: BasemapScale) -> SeascapeResult<MultiPolygon<f64>> {
        self.record_call();
        self.countries
            .get(&name.trim().to_lowercase())
            .cloned()
            .ok_or_else(|| SeascapeError::basemap_unavailable(name, "country not in memory source"))
    }
}

/// Cells inside the query box, thinned to every `stride`-th row and column.
/// Cells with unusable coordinates are passed through.
fn subset_grid(cells: &[GridCell], query: &GridQuery) -> Vec<GridCell> {
    let inside: Vec<GridCell> = cells
        .iter()
        .filter(|c| !c.has_valid_coordinates() || query.bounds.contains(c.lon, c.lat))
        .copied()
        .collect();

    let stride = query.stride as usize;
    if stride <= 1 {
        return inside;
    }
    let Some(spec) = GridSpec::infer(&inside) else {
        return inside;
    };
    inside
        .into_iter()
        .filter(|c| match spec.coord_to_index(c.lon, c.lat) {
            Some((i, j)) => i % stride == 0 && j % stride == 0,
            None => true,
        })
        .collect()
}

fn synthetic_grid(bounds: &GeoBounds, step: f64, f: impl Fn(f64, f64) -> Option<f64>) -> Vec<GridCell> {
    let nx = ((bounds.east() - bounds.west()) / step).round() as usize + 1;
    let ny = ((bounds.north() - bounds.south()) / step).round() as usize + 1;
    (0..ny)
        .flat_map(|j| (0..nx).map(move |i| (i, j)))
        .map(|(i, j)| {
            let lon = bounds.west() + i as f64 * step;
            let lat = bounds.south() + j as f64 * step;
            GridCell::new(lon, lat, f(lon, lat))
        })
        .collect()
}

fn synthetic_occurrences(bounds: &GeoBounds, max_lat: f64, n: usize) -> Vec<RawOccurrence> {
    let species = ["Balaenoptera musculus", "Megaptera novaeangliae", "Phoca vitulina"];
    (0..n)
        .map(|k| {
            let frac = (k % (n / 2).max(1)) as f64 / (n / 2).max(1) as f64;
            RawOccurrence {
                species: species[k % species.len()].to_string(),
                longitude: Some(bounds.west() + frac * (bounds.east() - bounds.west())),
                latitude: Some(bounds.south() + frac * (max_lat - bounds.south()) * 0.9),
                individual_count: (k % 4 != 0).then_some((k % 3 + 1) as u32),
                year: Some(2015 + (k % 6) as i32),
            }
        })
        .collect()
}
