//! Area-of-interest builder.
//!
//! Turns four geographic bounds into a closed rectangle polygon, densified
//! along its edges, and reprojects it into the working CRS.

use geo::{BoundingRect, Coord, LineString, Polygon};
use tracing::{debug, info};

use projection::Transformer;
use seascape_common::{BoundingBox, CrsCode, GeoBounds, Georeferenced, SeascapeError, SeascapeResult};

/// Segments each rectangle edge is split into before reprojection.
pub const EDGE_SEGMENTS: usize = 16;

/// The study area, both as validated bounds and as a projected polygon.
#[derive(Debug, Clone, PartialEq)]
pub struct AreaOfInterest {
    bounds: GeoBounds,
    source_crs: CrsCode,
    polygon: Georeferenced<Polygon<f64>>,
}

impl AreaOfInterest {
    /// Build the rectangle in `source_crs` and reproject it to `target_crs`.
    pub fn build(
        bounds: GeoBounds,
        source_crs: CrsCode,
        target_crs: CrsCode,
        transformer: &Transformer,
    ) -> SeascapeResult<Self> {
        if !source_crs.is_geographic() {
            return Err(SeascapeError::InvalidConfig(format!(
                "area bounds must be given in a geographic CRS, got {source_crs}"
            )));
        }

        let geographic = Georeferenced::new(source_crs, geographic_polygon(&bounds));
        let polygon = transformer.reproject(&geographic, target_crs)?;

        info!(
            north = bounds.north(),
            south = bounds.south(),
            east = bounds.east(),
            west = bounds.west(),
            crs = %target_crs,
            "Built area of interest"
        );

        Ok(Self {
            bounds,
            source_crs,
            polygon,
        })
    }

    pub fn bounds(&self) -> &GeoBounds {
        &self.bounds
    }

    /// CRS the bounds were given in.
    pub fn source_crs(&self) -> CrsCode {
        self.source_crs
    }

    /// CRS of the projected polygon.
    pub fn crs(&self) -> CrsCode {
        self.polygon.crs()
    }

    pub fn polygon(&self) -> &Georeferenced<Polygon<f64>> {
        &self.polygon
    }

    /// The densified rectangle before reprojection.
    pub fn geographic_polygon(&self) -> Georeferenced<Polygon<f64>> {
        Georeferenced::new(self.source_crs, geographic_polygon(&self.bounds))
    }

    /// Extent of the projected polygon.
    pub fn bounding_rect(&self) -> BoundingBox {
        self.polygon
            .geometry()
            .bounding_rect()
            .map(BoundingBox::from)
            .unwrap_or(BoundingBox::new(0.0, 0.0, 0.0, 0.0))
    }

    /// The geographic rectangle as WKT, counter-clockwise from the
    /// south-west corner, for remote query filters.
    pub fn to_wkt(&self) -> String {
        let b = &self.bounds;
        let (w, s, e, n) = (b.west(), b.south(), b.east(), b.north());
        format!("POLYGON(({w} {s},{e} {s},{e} {n},{w} {n},{w} {s}))")
    }
}

/// Closed ring NW, NE, SE, SW, NW with every edge split into
/// [`EDGE_SEGMENTS`] equal steps.
pub fn geographic_polygon(bounds: &GeoBounds) -> Polygon<f64> {
    let corners = [
        Coord { x: bounds.west(), y: bounds.north() },
        Coord { x: bounds.east(), y: bounds.north() },
        Coord { x: bounds.east(), y: bounds.south() },
        Coord { x: bounds.west(), y: bounds.south() },
    ];

    let mut ring = Vec::with_capacity(corners.len() * EDGE_SEGMENTS + 1);
    for (k, start) in corners.iter().enumerate() {
        let end = corners[(k + 1) % corners.len()];
        for step in 0..EDGE_SEGMENTS {
            let t = step as f64 / EDGE_SEGMENTS as f64;
            ring.push(Coord {
                x: start.x + (end.x - start.x) * t,
                y: start.y + (end.y - start.y) * t,
            });
        }
    }
    ring.push(corners[0]);

    debug!(vertices = ring.len(), "Densified area ring");
    Polygon::new(LineString::new(ring), vec![])
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::{assert_approx_eq, st_lawrence_bounds};

    fn build() -> AreaOfInterest {
        AreaOfInterest::build(
            st_lawrence_bounds(),
            CrsCode::Epsg4326,
            CrsCode::Epsg32198,
            &Transformer::new(),
        )
        .unwrap()
    }

    #[test]
    fn test_ring_starts_north_west_and_is_closed() {
        let poly = geographic_polygon(&st_lawrence_bounds());
        let ring = &poly.exterior().0;
        assert_eq!(ring.len(), 4 * EDGE_SEGMENTS + 1);
        assert_eq!(ring[0], Coord { x: -67.5, y: 50.5 });
        assert_eq!(ring[EDGE_SEGMENTS], Coord { x: -65.5, y: 50.5 });
        assert_eq!(ring[2 * EDGE_SEGMENTS], Coord { x: -65.5, y: 49.0 });
        assert_eq!(ring[3 * EDGE_SEGMENTS], Coord { x: -67.5, y: 49.0 });
        assert_eq!(ring.first(), ring.last());
    }

    #[test]
    fn test_every_vertex_within_bounds() {
        let cases = [
            st_lawrence_bounds(),
            GeoBounds::new(48.9, 48.3, -68.2, -69.6).unwrap(),
            GeoBounds::new(-33.5, -35.25, 151.75, 150.0).unwrap(),
            GeoBounds::new(60.0, 50.0, 180.0, 170.0).unwrap(),
        ];
        for bounds in cases {
            let poly = geographic_polygon(&bounds);
            let ring = &poly.exterior().0;
            assert_eq!(ring.len(), 4 * EDGE_SEGMENTS + 1);
            assert_eq!(ring.first(), ring.last());
            for c in ring {
                assert!(
                    (bounds.west()..=bounds.east()).contains(&c.x),
                    "{c:?} outside {bounds:?}"
                );
                assert!(
                    (bounds.south()..=bounds.north()).contains(&c.y),
                    "{c:?} outside {bounds:?}"
                );
            }
        }
    }

    #[test]
    fn test_projected_polygon_tagged() {
        let aoi = build();
        assert_eq!(aoi.crs(), CrsCode::Epsg32198);
        assert_eq!(aoi.source_crs(), CrsCode::Epsg4326);
        let ring = &aoi.polygon().geometry().exterior().0;
        assert_eq!(ring.first(), ring.last());
        assert_approx_eq!(ring[0].x, 70_494.17, 1.0);
        assert_approx_eq!(ring[0].y, 721_795.47, 1.0);
    }

    #[test]
    fn test_bounding_rect_spans_polygon() {
        let rect = build().bounding_rect();
        // East of the -68.5 central meridian
        assert!(rect.min_x > 0.0);
        assert!(rect.height() > 150_000.0);
        assert!(rect.width() > 140_000.0);

        let built = build();
        let ring = &built.polygon().geometry().exterior().0;
        let min_x = ring.iter().map(|c| c.x).fold(f64::MAX, f64::min);
        let max_y = ring.iter().map(|c| c.y).fold(f64::MIN, f64::max);
        assert_eq!(rect.min_x, min_x);
        assert_eq!(rect.max_y, max_y);
    }

    #[test]
    fn test_wkt_is_geographic() {
        assert_eq!(
            build().to_wkt(),
            "POLYGON((-67.5 49,-65.5 49,-65.5 50.5,-67.5 50.5,-67.5 49))"
        );
    }

    #[test]
    fn test_projected_source_crs_rejected() {
        let err = AreaOfInterest::build(
            st_lawrence_bounds(),
            CrsCode::Epsg3857,
            CrsCode::Epsg32198,
            &Transformer::new(),
        )
        .unwrap_err();
        assert!(matches!(err, SeascapeError::InvalidConfig(_)));
    }
}
