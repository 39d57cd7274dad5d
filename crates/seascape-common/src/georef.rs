//! CRS-tagged geometry wrapper.

use crate::crs::CrsCode;
use crate::error::{SeascapeError, SeascapeResult};

/// A geometry together with the CRS its coordinates are expressed in.
///
/// Operations combining two tagged values must go through
/// [`Georeferenced::ensure_same_crs`]; reprojection is done by the
/// `projection` crate and always yields a new tag.
#[derive(Debug, Clone, PartialEq)]
pub struct Georeferenced<G> {
    crs: CrsCode,
    geometry: G,
}

impl<G> Georeferenced<G> {
    pub fn new(crs: CrsCode, geometry: G) -> Self {
        Self { crs, geometry }
    }

    pub fn crs(&self) -> CrsCode {
        self.crs
    }

    pub fn geometry(&self) -> &G {
        &self.geometry
    }

    /// Fail with `CrsMismatch` unless `other` shares this CRS.
    pub fn ensure_same_crs<H>(&self, other: &Georeferenced<H>) -> SeascapeResult<()> {
        ensure_crs(self.crs, other.crs)
    }
}

/// Fail with `CrsMismatch` when two tags differ.
pub fn ensure_crs(left: CrsCode, right: CrsCode) -> SeascapeResult<()> {
    if left == right {
        Ok(())
    } else {
        Err(SeascapeError::CrsMismatch { left, right })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::point;

    #[test]
    fn test_same_crs_passes() {
        let a = Georeferenced::new(CrsCode::Epsg32198, point!(x: 1.0, y: 2.0));
        let b = Georeferenced::new(CrsCode::Epsg32198, point!(x: 3.0, y: 4.0));
        assert!(a.ensure_same_crs(&b).is_ok());
    }

    #[test]
    fn test_mismatch_is_error() {
        let a = Georeferenced::new(CrsCode::Epsg4326, point!(x: 1.0, y: 2.0));
        let b = Georeferenced::new(CrsCode::Epsg32198, point!(x: 3.0, y: 4.0));
        let err = a.ensure_same_crs(&b).unwrap_err();
        assert!(matches!(
            err,
            SeascapeError::CrsMismatch {
                left: CrsCode::Epsg4326,
                right: CrsCode::Epsg32198
            }
        ));
    }
}
