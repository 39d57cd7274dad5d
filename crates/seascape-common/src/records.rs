//! Record schemas for each dataset the pipeline loads.

use std::collections::BTreeMap;

use geo::Point;
use serde::{Deserialize, Serialize};

use crate::crs::CrsCode;

/// An occurrence row as delivered by the remote service, before validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawOccurrence {
    pub species: String,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
    pub individual_count: Option<u32>,
    pub year: Option<i32>,
}

impl RawOccurrence {
    /// The (lon, lat) pair when both are present, finite and in range.
    pub fn valid_position(&self) -> Option<(f64, f64)> {
        let (lon, lat) = (self.longitude?, self.latitude?);
        let ok = lon.is_finite()
            && lat.is_finite()
            && (-180.0..=180.0).contains(&lon)
            && (-90.0..=90.0).contains(&lat);
        ok.then_some((lon, lat))
    }
}

/// A species occurrence located in some CRS.
#[derive(Debug, Clone, PartialEq)]
pub struct Occurrence {
    pub species: String,
    /// Observed individual count; `None` when the source did not record one.
    pub count: Option<u32>,
    pub year: Option<i32>,
    pub location: Point<f64>,
}

impl Occurrence {
    /// Count used for aggregation: an unobserved count is one individual.
    pub fn effective_count(&self) -> u64 {
        u64::from(self.count.unwrap_or(1))
    }
}

/// A depth sample. Negative depth is below sea level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BathymetrySample {
    pub location: Point<f64>,
    pub depth: f64,
}

/// Values of every requested environmental layer at one grid cell.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvironmentalSample {
    pub location: Point<f64>,
    /// Keyed by catalog layer code, verbatim.
    pub values: BTreeMap<String, Option<f64>>,
}

impl EnvironmentalSample {
    pub fn value(&self, layer: &str) -> Option<f64> {
        self.values.get(layer).copied().flatten()
    }
}

/// Records that carry a single point location.
pub trait Located {
    fn location(&self) -> Point<f64>;
    fn set_location(&mut self, location: Point<f64>);
}

impl Located for Occurrence {
    fn location(&self) -> Point<f64> {
        self.location
    }

    fn set_location(&mut self, location: Point<f64>) {
        self.location = location;
    }
}

impl Located for BathymetrySample {
    fn location(&self) -> Point<f64> {
        self.location
    }

    fn set_location(&mut self, location: Point<f64>) {
        self.location = location;
    }
}

impl Located for EnvironmentalSample {
    fn location(&self) -> Point<f64> {
        self.location
    }

    fn set_location(&mut self, location: Point<f64>) {
        self.location = location;
    }
}

/// A set of point records sharing one CRS tag.
#[derive(Debug, Clone, PartialEq)]
pub struct PointDataset<T> {
    crs: CrsCode,
    records: Vec<T>,
}

impl<T: Located> PointDataset<T> {
    pub fn new(crs: CrsCode, records: Vec<T>) -> Self {
        Self { crs, records }
    }

    pub fn crs(&self) -> CrsCode {
        self.crs
    }

    pub fn records(&self) -> &[T] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Keep only the records matching `keep`.
    pub fn retain(&mut self, keep: impl FnMut(&T) -> bool) {
        self.records.retain(keep);
    }

    /// Rewrite every location under a new CRS tag. Records for which `f`
    /// yields `None` are dropped; returns the dataset and the drop count.
    pub fn relocate(
        self,
        crs: CrsCode,
        mut f: impl FnMut(Point<f64>) -> Option<Point<f64>>,
    ) -> (Self, usize) {
        let before = self.records.len();
        let records: Vec<T> = self
            .records
            .into_iter()
            .filter_map(|mut record| {
                let moved = f(record.location())?;
                record.set_location(moved);
                Some(record)
            })
            .collect();
        let dropped = before - records.len();
        (Self { crs, records }, dropped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::point;

    fn raw(lon: Option<f64>, lat: Option<f64>) -> RawOccurrence {
        RawOccurrence {
            species: "Balaenoptera musculus".into(),
            longitude: lon,
            latitude: lat,
            individual_count: None,
            year: Some(2019),
        }
    }

    #[test]
    fn test_valid_position() {
        assert_eq!(raw(Some(-66.0), Some(49.5)).valid_position(), Some((-66.0, 49.5)));
        assert_eq!(raw(None, Some(49.5)).valid_position(), None);
        assert_eq!(raw(Some(f64::NAN), Some(49.5)).valid_position(), None);
        assert_eq!(raw(Some(-66.0), Some(91.0)).valid_position(), None);
    }

    #[test]
    fn test_effective_count_defaults_to_one() {
        let occ = Occurrence {
            species: "x".into(),
            count: None,
            year: None,
            location: point!(x: 0.0, y: 0.0),
        };
        assert_eq!(occ.effective_count(), 1);
        let occ = Occurrence {
            count: Some(3),
            ..occ
        };
        assert_eq!(occ.effective_count(), 3);
    }

    #[test]
    fn test_relocate_sets_tag() {
        let sample = BathymetrySample {
            location: point!(x: 1.0, y: 2.0),
            depth: -10.0,
        };
        let ds = PointDataset::new(CrsCode::Epsg4326, vec![sample]);
        let (moved, dropped) =
            ds.relocate(CrsCode::Epsg3857, |p| Some(point!(x: p.x() * 2.0, y: p.y() * 2.0)));
        assert_eq!(dropped, 0);
        assert_eq!(moved.crs(), CrsCode::Epsg3857);
        assert_eq!(moved.records()[0].location, point!(x: 2.0, y: 4.0));
    }

    #[test]
    fn test_relocate_drops_failed_records() {
        let at = |y: f64| BathymetrySample {
            location: point!(x: 0.0, y: y),
            depth: -10.0,
        };
        let ds = PointDataset::new(CrsCode::Epsg4326, vec![at(10.0), at(-90.0), at(20.0)]);
        let (moved, dropped) =
            ds.relocate(CrsCode::Epsg32198, |p| (p.y() > -90.0).then_some(p));
        assert_eq!(dropped, 1);
        let ys: Vec<_> = moved.records().iter().map(|r| r.location.y()).collect();
        assert_eq!(ys, vec![10.0, 20.0]);
    }
}
