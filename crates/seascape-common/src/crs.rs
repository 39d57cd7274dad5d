//! Coordinate Reference System codes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::bbox::BoundingBox;
use crate::error::SeascapeError;

/// CRS codes the pipeline can tag geometries with and transform between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CrsCode {
    /// WGS84 Geographic (lon/lat in degrees)
    Epsg4326,
    /// NAD83 Geographic
    Epsg4269,
    /// Web Mercator (meters)
    Epsg3857,
    /// NAD83 / Quebec Lambert (meters)
    Epsg32198,
}

impl CrsCode {
    /// Parse a CRS identifier.
    ///
    /// Accepts formats like:
    /// - "EPSG:4326"
    /// - "epsg:32198"
    /// - "CRS:84" (EPSG:4326 with lon/lat axis order)
    pub fn from_code_string(s: &str) -> Result<Self, SeascapeError> {
        let normalized = s.trim().to_uppercase();

        match normalized.as_str() {
            "EPSG:4326" | "CRS:84" | "WGS84" => Ok(CrsCode::Epsg4326),
            "EPSG:4269" | "NAD83" => Ok(CrsCode::Epsg4269),
            "EPSG:3857" | "EPSG:900913" => Ok(CrsCode::Epsg3857),
            "EPSG:32198" => Ok(CrsCode::Epsg32198),
            _ => Err(SeascapeError::UnknownCrs(s.to_string())),
        }
    }

    /// Numeric EPSG code.
    pub fn epsg(&self) -> u32 {
        match self {
            CrsCode::Epsg4326 => 4326,
            CrsCode::Epsg4269 => 4269,
            CrsCode::Epsg3857 => 3857,
            CrsCode::Epsg32198 => 32198,
        }
    }

    /// Check if this is a geographic (lat/lon) CRS.
    pub fn is_geographic(&self) -> bool {
        matches!(self, CrsCode::Epsg4326 | CrsCode::Epsg4269)
    }

    /// Projected CRS use linear units; buffering is only meaningful there.
    pub fn is_metric(&self) -> bool {
        !self.is_geographic()
    }

    pub fn unit_name(&self) -> &'static str {
        if self.is_geographic() {
            "degree"
        } else {
            "metre"
        }
    }

    /// OGC URN, used as the `crs` member of GeoJSON output.
    pub fn ogc_urn(&self) -> String {
        format!("urn:ogc:def:crs:EPSG::{}", self.epsg())
    }

    /// Geographic area of use (lon/lat degrees).
    pub fn area_of_use(&self) -> BoundingBox {
        match self {
            CrsCode::Epsg4326 | CrsCode::Epsg4269 => BoundingBox::new(-180.0, -90.0, 180.0, 90.0),
            CrsCode::Epsg3857 => BoundingBox::new(-180.0, -85.06, 180.0, 85.06),
            CrsCode::Epsg32198 => BoundingBox::new(-79.85, 44.99, -57.1, 62.62),
        }
    }
}

impl fmt::Display for CrsCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg())
    }
}

impl FromStr for CrsCode {
    type Err = SeascapeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CrsCode::from_code_string(s)
    }
}

impl TryFrom<String> for CrsCode {
    type Error = SeascapeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        CrsCode::from_code_string(&value)
    }
}

impl From<CrsCode> for String {
    fn from(code: CrsCode) -> Self {
        code.to_string()
    }
}
