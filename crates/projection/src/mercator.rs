//! Spherical Web Mercator (EPSG:3857).

use std::f64::consts::FRAC_PI_4;

use crate::transform::{Projection, ProjectionError};

/// Web Mercator sphere radius (meters).
pub const EARTH_RADIUS: f64 = 6_378_137.0;

/// Latitude limit where the projected world becomes square.
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

#[derive(Debug, Clone, Copy, Default)]
pub struct WebMercator;

impl Projection for WebMercator {
    fn forward(&self, lon: f64, lat: f64) -> Result<(f64, f64), ProjectionError> {
        if !lon.is_finite() || !lat.is_finite() || lat.abs() > MAX_LATITUDE || lon.abs() > 180.0 {
            return Err(ProjectionError::OutOfDomain { x: lon, y: lat });
        }
        let x = EARTH_RADIUS * lon.to_radians();
        let y = EARTH_RADIUS * (FRAC_PI_4 + lat.to_radians() / 2.0).tan().ln();
        Ok((x, y))
    }

    fn inverse(&self, x: f64, y: f64) -> Result<(f64, f64), ProjectionError> {
        if !x.is_finite() || !y.is_finite() {
            return Err(ProjectionError::OutOfDomain { x, y });
        }
        let lon = (x / EARTH_RADIUS).to_degrees();
        let lat = (2.0 * (y / EARTH_RADIUS).exp().atan() - std::f64::consts::FRAC_PI_2).to_degrees();
        Ok((lon, lat))
    }
}
