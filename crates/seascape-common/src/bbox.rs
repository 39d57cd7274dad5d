//! Bounding box types: validated geographic bounds and planar extents.

use serde::{Deserialize, Serialize};

use crate::error::{SeascapeError, SeascapeResult};

/// Study-area bounds in a geographic CRS, in degrees.
///
/// Always satisfies `north > south` and `east > west`; construction through
/// [`GeoBounds::new`] rejects anything else.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoBounds {
    north: f64,
    south: f64,
    east: f64,
    west: f64,
}

impl GeoBounds {
    /// Validate and build bounds from the four edge coordinates.
    pub fn new(north: f64, south: f64, east: f64, west: f64) -> SeascapeResult<Self> {
        let invalid = |message: String| SeascapeError::InvalidBounds(message);

        for (name, value) in [("north", north), ("south", south), ("east", east), ("west", west)] {
            if !value.is_finite() {
                return Err(invalid(format!("{name} is not a finite number")));
            }
        }
        for (name, lat) in [("north", north), ("south", south)] {
            if !(-90.0..=90.0).contains(&lat) {
                return Err(invalid(format!("{name}={lat} is outside [-90, 90]")));
            }
        }
        for (name, lon) in [("east", east), ("west", west)] {
            if !(-180.0..=180.0).contains(&lon) {
                return Err(invalid(format!("{name}={lon} is outside [-180, 180]")));
            }
        }
        if north <= south {
            return Err(invalid(format!(
                "north ({north}) must be greater than south ({south})"
            )));
        }
        if east <= west {
            return Err(invalid(format!(
                "east ({east}) must be greater than west ({west})"
            )));
        }

        Ok(Self {
            north,
            south,
            east,
            west,
        })
    }

    pub fn north(&self) -> f64 {
        self.north
    }

    pub fn south(&self) -> f64 {
        self.south
    }

    pub fn east(&self) -> f64 {
        self.east
    }

    pub fn west(&self) -> f64 {
        self.west
    }

    /// The same extent as a lon/lat [`BoundingBox`].
    pub fn to_bounding_box(&self) -> BoundingBox {
        BoundingBox::new(self.west, self.south, self.east, self.north)
    }

    /// Check if a lon/lat position falls inside the bounds (edges included).
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        self.to_bounding_box().contains_point(lon, lat)
    }
}

impl<'de> Deserialize<'de> for GeoBounds {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            north: f64,
            south: f64,
            east: f64,
            west: f64,
        }

        let raw = Raw::deserialize(deserializer)?;
        GeoBounds::new(raw.north, raw.south, raw.east, raw.west).map_err(serde::de::Error::custom)
    }
}

/// An axis-aligned extent in whatever units the owning CRS uses.
///
/// For geographic CRS (EPSG:4326), coordinates are in degrees.
/// For projected CRS (EPSG:32198, EPSG:3857), coordinates are in meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// Create a new bounding box from corner coordinates.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Check if a point is contained within this bbox.
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    /// Key fragment quantized to 4 decimal places, stable across float noise.
    pub fn cache_key(&self) -> String {
        format!(
            "{:.4}_{:.4}_{:.4}_{:.4}",
            self.min_x, self.min_y, self.max_x, self.max_y
        )
    }
}

impl From<geo::Rect<f64>> for BoundingBox {
    fn from(rect: geo::Rect<f64>) -> Self {
        BoundingBox::new(rect.min().x, rect.min().y, rect.max().x, rect.max().y)
    }
}
