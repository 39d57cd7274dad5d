//! Common test fixtures for seascape tests.

use seascape_common::GeoBounds;

/// Study-area bounds as (north, south, east, west) in degrees.
pub mod bounds {
    /// Lower St. Lawrence estuary, the reference study area
    pub const ST_LAWRENCE: (f64, f64, f64, f64) = (50.5, 49.0, -65.5, -67.5);

    /// A smaller box fully at sea in the estuary
    pub const ESTUARY_SMALL: (f64, f64, f64, f64) = (49.6, 49.2, -66.0, -66.8);

    /// North below south
    pub const REVERSED: (f64, f64, f64, f64) = (49.0, 50.5, -65.5, -67.5);
}

/// Buffer distance used in the basemap examples (meters).
pub const BUFFER_M: f64 = 20_000.0;

/// Validated St. Lawrence study-area bounds.
pub fn st_lawrence_bounds() -> GeoBounds {
    let (n, s, e, w) = bounds::ST_LAWRENCE;
    GeoBounds::new(n, s, e, w).expect("fixture bounds are valid")
}

/// Common environmental layer codes.
pub mod layers {
    pub const SST_MEAN: &str = "BO_sstmean";
    pub const SALINITY: &str = "BO_salinity";
}

/// Common CRS identifiers.
pub mod crs {
    pub const EPSG_4326: &str = "EPSG:4326";
    pub const EPSG_32198: &str = "EPSG:32198";
    pub const EPSG_3857: &str = "EPSG:3857";
}

/// Minimal OBIS-style occurrence payload: one valid row with a string count,
/// one with no count, one missing longitude.
pub const OBIS_PAGE: &str = r#"{
  "total": 3,
  "results": [
    {"id": "a1", "scientificName": "Balaenoptera musculus", "decimalLongitude": -66.2, "decimalLatitude": 49.6, "individualCount": "3", "date_year": 2019},
    {"id": "a2", "scientificName": "Balaenoptera musculus", "decimalLongitude": -66.2, "decimalLatitude": 49.6, "date_year": 2019},
    {"id": "a3", "scientificName": "Megaptera novaeangliae", "decimalLatitude": 49.7, "individualCount": 2, "date_year": 2019}
  ]
}"#;

/// Minimal ERDDAP griddap CSV: header row, units row, 2x2 cells.
pub const GRIDDAP_CSV: &str = "latitude,longitude,altitude\n\
degrees_north,degrees_east,m\n\
49.0,-67.0,-120.0\n\
49.0,-66.5,-250.5\n\
49.5,-67.0,NaN\n\
49.5,-66.5,-310.0\n";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_bounds_valid() {
        let b = st_lawrence_bounds();
        assert_eq!(b.north(), 50.5);
        let (n, s, e, w) = bounds::REVERSED;
        assert!(GeoBounds::new(n, s, e, w).is_err());
    }
}
