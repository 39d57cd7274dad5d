//! Lambert Conformal Conic projection (ellipsoidal, two standard parallels).
//!
//! This is the projection behind NAD83 / Quebec Lambert (EPSG:32198), the
//! metric CRS used for Gulf of St. Lawrence study areas.
//!
//! The projection parameters include:
//! - Latitude of origin (lat0) and central meridian (lon0)
//! - Standard parallels latin1 and latin2
//! - False easting / northing
//! - Ellipsoid semi-major axis and flattening
//!
//! Formulas follow Snyder, "Map Projections: A Working Manual", §15.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

use crate::transform::{Projection, ProjectionError};

/// GRS80 semi-major axis (meters).
pub const GRS80_A: f64 = 6_378_137.0;
/// GRS80 inverse flattening.
pub const GRS80_INV_F: f64 = 298.257_222_101;

const MAX_ITERATIONS: usize = 15;
const CONVERGENCE: f64 = 1e-12;

/// Lambert Conformal Conic projection parameters.
#[derive(Debug, Clone)]
pub struct LambertConformal {
    /// Central meridian in radians
    pub lon0: f64,
    /// Latitude of origin in radians
    pub lat0: f64,
    /// First standard parallel in radians
    pub latin1: f64,
    /// Second standard parallel in radians
    pub latin2: f64,
    pub false_easting: f64,
    pub false_northing: f64,
    /// Ellipsoid semi-major axis (meters)
    pub a: f64,
    /// First eccentricity
    e: f64,
    /// Cone constant (n)
    n: f64,
    /// F constant
    f: f64,
    /// Rho at the latitude of origin
    rho0: f64,
}

impl LambertConformal {
    /// Build a secant (or tangent, when the parallels coincide) cone.
    ///
    /// All angles are in degrees.
    pub fn new(
        lat0_deg: f64,
        lon0_deg: f64,
        latin1_deg: f64,
        latin2_deg: f64,
        false_easting: f64,
        false_northing: f64,
        a: f64,
        inv_f: f64,
    ) -> Self {
        let lat0 = lat0_deg.to_radians();
        let lon0 = lon0_deg.to_radians();
        let latin1 = latin1_deg.to_radians();
        let latin2 = latin2_deg.to_radians();

        let flattening = 1.0 / inv_f;
        let e = (2.0 * flattening - flattening * flattening).sqrt();

        let m1 = m(latin1, e);
        let t1 = t(latin1, e);

        let n = if (latin1 - latin2).abs() < 1e-10 {
            latin1.sin()
        } else {
            let m2 = m(latin2, e);
            let t2 = t(latin2, e);
            (m1.ln() - m2.ln()) / (t1.ln() - t2.ln())
        };

        let f = m1 / (n * t1.powf(n));
        let rho0 = a * f * t(lat0, e).powf(n);

        Self {
            lon0,
            lat0,
            latin1,
            latin2,
            false_easting,
            false_northing,
            a,
            e,
            n,
            f,
            rho0,
        }
    }

    /// NAD83 / Quebec Lambert (EPSG:32198).
    ///
    /// - Latitude of origin: 44°N
    /// - Central meridian: 68.5°W
    /// - Standard parallels: 60°N and 46°N
    /// - No false easting or northing, GRS80 ellipsoid
    pub fn quebec_lambert() -> Self {
        Self::new(44.0, -68.5, 60.0, 46.0, 0.0, 0.0, GRS80_A, GRS80_INV_F)
    }

    /// Convert geographic coordinates (degrees) to projected meters.
    ///
    /// Returns (x, y).
    pub fn geo_to_xy(&self, lat_deg: f64, lon_deg: f64) -> Result<(f64, f64), ProjectionError> {
        if !lat_deg.is_finite() || !lon_deg.is_finite() || lat_deg.abs() > 90.0 {
            return Err(ProjectionError::OutOfDomain { x: lon_deg, y: lat_deg });
        }

        let lat = lat_deg.to_radians();
        let dlon = normalize_angle(lon_deg.to_radians() - self.lon0);
        let apex = FRAC_PI_2 * self.n.signum();

        // rho is 0 at the pole the cone points to, infinite at the other one
        if (lat + apex).abs() < 1e-9 {
            return Err(ProjectionError::OutOfDomain { x: lon_deg, y: lat_deg });
        }
        let rho = if (lat - apex).abs() < 1e-12 {
            0.0
        } else {
            self.a * self.f * t(lat, self.e).powf(self.n)
        };
        if !rho.is_finite() {
            return Err(ProjectionError::OutOfDomain { x: lon_deg, y: lat_deg });
        }

        let theta = self.n * dlon;
        let x = self.false_easting + rho * theta.sin();
        let y = self.false_northing + self.rho0 - rho * theta.cos();
        Ok((x, y))
    }

    /// Convert projected meters back to geographic coordinates.
    ///
    /// Returns (lat, lon) in degrees.
    pub fn xy_to_geo(&self, x: f64, y: f64) -> Result<(f64, f64), ProjectionError> {
        if !x.is_finite() || !y.is_finite() {
            return Err(ProjectionError::OutOfDomain { x, y });
        }

        let dx = x - self.false_easting;
        let dy = self.rho0 - (y - self.false_northing);
        let sign = self.n.signum();

        let rho = sign * (dx * dx + dy * dy).sqrt();
        let theta = (sign * dx).atan2(sign * dy);

        let lat = if rho == 0.0 {
            sign * FRAC_PI_2
        } else {
            let t_prime = (rho / (self.a * self.f)).powf(1.0 / self.n);
            self.latitude_from_t(t_prime)?
        };
        let lon = normalize_angle(theta / self.n + self.lon0);

        Ok((lat.to_degrees(), lon.to_degrees()))
    }

    /// Solve the isometric-latitude relation for phi by fixed-point iteration.
    fn latitude_from_t(&self, t_prime: f64) -> Result<f64, ProjectionError> {
        let half_e = self.e / 2.0;
        let mut phi = FRAC_PI_2 - 2.0 * t_prime.atan();
        for _ in 0..MAX_ITERATIONS {
            let es = self.e * phi.sin();
            let next = FRAC_PI_2 - 2.0 * (t_prime * ((1.0 - es) / (1.0 + es)).powf(half_e)).atan();
            if (next - phi).abs() < CONVERGENCE {
                return Ok(next);
            }
            phi = next;
        }
        Err(ProjectionError::NoConvergence)
    }
}

impl Projection for LambertConformal {
    fn forward(&self, lon: f64, lat: f64) -> Result<(f64, f64), ProjectionError> {
        self.geo_to_xy(lat, lon)
    }

    fn inverse(&self, x: f64, y: f64) -> Result<(f64, f64), ProjectionError> {
        let (lat, lon) = self.xy_to_geo(x, y)?;
        Ok((lon, lat))
    }
}

fn m(phi: f64, e: f64) -> f64 {
    let es = e * phi.sin();
    phi.cos() / (1.0 - es * es).sqrt()
}

fn t(phi: f64, e: f64) -> f64 {
    let es = e * phi.sin();
    (FRAC_PI_4 - phi / 2.0).tan() / ((1.0 - es) / (1.0 + es)).powf(e / 2.0)
}

/// Normalize an angle to [-π, π].
fn normalize_angle(mut angle: f64) -> f64 {
    use std::f64::consts::PI;
    while angle > PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_maps_to_false_origin() {
        let proj = LambertConformal::quebec_lambert();
        let (x, y) = proj.geo_to_xy(44.0, -68.5).unwrap();
        assert!(x.abs() < 1e-6, "x should be 0, got {}", x);
        assert!(y.abs() < 1e-6, "y should be 0, got {}", y);
    }

    #[test]
    fn test_quebec_city() {
        let proj = LambertConformal::quebec_lambert();
        let (x, y) = proj.geo_to_xy(46.8139, -71.2080).unwrap();
        assert!((x - -206_300.41).abs() < 1.0, "x = {}", x);
        assert!((y - 317_060.36).abs() < 1.0, "y = {}", y);
    }

    #[test]
    fn test_roundtrip() {
        let proj = LambertConformal::quebec_lambert();
        for (lat, lon) in [(49.0, -67.5), (50.5, -65.5), (61.0, -75.0), (45.2, -58.0)] {
            let (x, y) = proj.geo_to_xy(lat, lon).unwrap();
            let (lat2, lon2) = proj.xy_to_geo(x, y).unwrap();
            assert!((lat - lat2).abs() < 1e-9, "lat roundtrip: {} vs {}", lat, lat2);
            assert!((lon - lon2).abs() < 1e-9, "lon roundtrip: {} vs {}", lon, lon2);
        }
    }

    #[test]
    fn test_axes_point_east_and_north() {
        let proj = LambertConformal::quebec_lambert();
        let (x0, y0) = proj.geo_to_xy(49.0, -67.0).unwrap();
        let (x1, _) = proj.geo_to_xy(49.0, -66.0).unwrap();
        let (_, y1) = proj.geo_to_xy(50.0, -67.0).unwrap();
        assert!(x1 > x0);
        assert!(y1 > y0);
    }

    #[test]
    fn test_rejects_invalid_latitude() {
        let proj = LambertConformal::quebec_lambert();
        assert!(proj.geo_to_xy(91.0, -68.0).is_err());
        assert!(proj.geo_to_xy(f64::NAN, -68.0).is_err());
        // The cone opens toward the south pole
        assert!(proj.geo_to_xy(-90.0, -68.0).is_err());
    }
}
