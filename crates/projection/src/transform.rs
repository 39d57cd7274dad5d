//! CRS-to-CRS transforms over `geo` geometries.
//!
//! Every transform goes through geographic lon/lat: inverse-project out of
//! the source CRS, forward-project into the target. NAD83 and WGS84 are
//! treated as the same datum; they differ by less than two meters over
//! North America.

use geo::{Coord, MapCoords};
use seascape_common::{CrsCode, Georeferenced, SeascapeError};
use thiserror::Error;

use crate::lambert::LambertConformal;
use crate::mercator::WebMercator;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProjectionError {
    #[error("coordinate ({x}, {y}) is outside the projection domain")]
    OutOfDomain { x: f64, y: f64 },

    #[error("inverse projection did not converge")]
    NoConvergence,
}

impl From<ProjectionError> for SeascapeError {
    fn from(err: ProjectionError) -> Self {
        SeascapeError::Projection(err.to_string())
    }
}

/// A map projection between lon/lat degrees and planar meters.
pub trait Projection {
    /// (lon, lat) degrees to (x, y) meters.
    fn forward(&self, lon: f64, lat: f64) -> Result<(f64, f64), ProjectionError>;
    /// (x, y) meters to (lon, lat) degrees.
    fn inverse(&self, x: f64, y: f64) -> Result<(f64, f64), ProjectionError>;
}

/// Transforms coordinates and geometries between supported CRS.
#[derive(Debug, Clone)]
pub struct Transformer {
    quebec_lambert: LambertConformal,
    web_mercator: WebMercator,
}

impl Default for Transformer {
    fn default() -> Self {
        Self::new()
    }
}

impl Transformer {
    pub fn new() -> Self {
        Self {
            quebec_lambert: LambertConformal::quebec_lambert(),
            web_mercator: WebMercator,
        }
    }

    fn projection(&self, crs: CrsCode) -> Option<&dyn Projection> {
        match crs {
            CrsCode::Epsg4326 | CrsCode::Epsg4269 => None,
            CrsCode::Epsg3857 => Some(&self.web_mercator),
            CrsCode::Epsg32198 => Some(&self.quebec_lambert),
        }
    }

    /// Transform a single coordinate.
    ///
    /// Same-CRS transforms return the input unchanged.
    pub fn transform_coord(
        &self,
        from: CrsCode,
        to: CrsCode,
        coord: Coord<f64>,
    ) -> Result<Coord<f64>, ProjectionError> {
        if from == to {
            return Ok(coord);
        }

        let (lon, lat) = match self.projection(from) {
            Some(proj) => proj.inverse(coord.x, coord.y)?,
            None => {
                if !coord.x.is_finite() || !coord.y.is_finite() || coord.y.abs() > 90.0 {
                    return Err(ProjectionError::OutOfDomain {
                        x: coord.x,
                        y: coord.y,
                    });
                }
                (coord.x, coord.y)
            }
        };

        let (x, y) = match self.projection(to) {
            Some(proj) => proj.forward(lon, lat)?,
            None => (lon, lat),
        };
        Ok(Coord { x, y })
    }

    /// Reproject a tagged geometry into `to`.
    pub fn reproject<G>(
        &self,
        geometry: &Georeferenced<G>,
        to: CrsCode,
    ) -> Result<Georeferenced<G>, SeascapeError>
    where
        G: MapCoords<f64, f64, Output = G> + Clone,
    {
        let from = geometry.crs();
        if from == to {
            return Ok(geometry.clone());
        }

        let projected = geometry
            .geometry()
            .try_map_coords(|c| self.transform_coord(from, to, c))?;

        tracing::trace!(%from, %to, "reprojected geometry");
        Ok(Georeferenced::new(to, projected))
    }
}
