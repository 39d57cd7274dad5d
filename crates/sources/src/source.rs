//! Source traits and query types shared by every client.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use geo::MultiPolygon;
use serde::{Deserialize, Serialize};

use seascape_common::{GeoBounds, GridCell, RawOccurrence, SeascapeError, SeascapeResult, YearFilter};

use crate::catalog::LayerDescriptor;

/// Spatial and temporal constraints for an occurrence query.
#[derive(Debug, Clone)]
pub struct OccurrenceQuery {
    /// Area of interest in EPSG:4326, as WKT.
    pub geometry_wkt: String,
    /// Extent of `geometry_wkt`, for sources that filter by box.
    pub bounds: GeoBounds,
    pub year: Option<YearFilter>,
    pub scientific_name: Option<String>,
    /// Stop paging after this many records.
    pub max_records: usize,
}

/// Extent and sampling of a gridded query.
#[derive(Debug, Clone, Copy)]
pub struct GridQuery {
    pub bounds: GeoBounds,
    /// Take every `stride`-th cell of the native grid along each axis.
    pub stride: u32,
}

impl GridQuery {
    pub fn new(bounds: GeoBounds, stride: u32) -> Self {
        Self {
            bounds,
            stride: stride.max(1),
        }
    }
}

/// Natural Earth cartographic scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum BasemapScale {
    /// 1:110m
    Small,
    /// 1:50m
    Medium,
    /// 1:10m
    Large,
}

impl BasemapScale {
    /// Scale token used in Natural Earth file names.
    pub fn natural_earth_code(&self) -> &'static str {
        match self {
            BasemapScale::Small => "110m",
            BasemapScale::Medium => "50m",
            BasemapScale::Large => "10m",
        }
    }
}

impl FromStr for BasemapScale {
    type Err = SeascapeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "small" | "110" | "110m" => Ok(BasemapScale::Small),
            "medium" | "50" | "50m" => Ok(BasemapScale::Medium),
            "large" | "10" | "10m" => Ok(BasemapScale::Large),
            _ => Err(SeascapeError::InvalidScale(s.to_string())),
        }
    }
}

impl fmt::Display for BasemapScale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BasemapScale::Small => "small",
            BasemapScale::Medium => "medium",
            BasemapScale::Large => "large",
        };
        f.write_str(name)
    }
}

impl TryFrom<String> for BasemapScale {
    type Error = SeascapeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BasemapScale> for String {
    fn from(scale: BasemapScale) -> Self {
        scale.to_string()
    }
}

/// Species occurrence records.
#[async_trait]
pub trait OccurrenceSource: Send + Sync {
    /// Fetch raw rows matching the query. An empty vector is a valid answer.
    async fn fetch_occurrences(&self, query: &OccurrenceQuery) -> SeascapeResult<Vec<RawOccurrence>>;
}

/// Gridded depth/elevation samples.
#[async_trait]
pub trait BathymetrySource: Send + Sync {
    async fn fetch_bathymetry(&self, query: &GridQuery) -> SeascapeResult<Vec<GridCell>>;
}

/// Gridded environmental layers resolved through the catalog.
#[async_trait]
pub trait EnvironmentalSource: Send + Sync {
    async fn fetch_layer(
        &self,
        layer: &LayerDescriptor,
        query: &GridQuery,
    ) -> SeascapeResult<Vec<GridCell>>;
}

/// Country outlines in EPSG:4326.
#[async_trait]
pub trait BasemapSource: Send + Sync {
    /// Fails with `BasemapUnavailable` for unknown names or unreachable services.
    async fn fetch_country(&self, name: &str, scale: BasemapScale) -> SeascapeResult<MultiPolygon<f64>>;
}
