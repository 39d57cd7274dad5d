//! Planar geometry operations on CRS-tagged geometries: buffer, clip, mask.
//!
//! Every operation that combines two geometries checks their tags first and
//! fails with `CrsMismatch` rather than mixing coordinate spaces.

use std::f64::consts::TAU;

use geo::{BooleanOps, BoundingRect, ConvexHull, Coord, Intersects, MultiPoint, MultiPolygon, Point, Polygon, Rect};
use tracing::debug;

use seascape_common::{Georeferenced, SeascapeError, SeascapeResult};

/// Vertices of each circle approximating a buffer end cap.
pub const CIRCLE_SEGMENTS: usize = 32;

/// Grow `polygon` outward by `distance` CRS units.
///
/// The result is the union of the polygon with one capsule per ring edge,
/// each capsule being the convex hull of two inscribed circles at the edge
/// endpoints. Inscribed circles keep every output vertex within `distance`
/// of the input. Refused for geographic CRS, where units are degrees.
pub fn buffer_polygon(
    polygon: &Georeferenced<Polygon<f64>>,
    distance: f64,
) -> SeascapeResult<Georeferenced<MultiPolygon<f64>>> {
    let crs = polygon.crs();
    if !crs.is_metric() {
        return Err(SeascapeError::NonMetricBuffer(crs));
    }
    if !distance.is_finite() || distance < 0.0 {
        return Err(SeascapeError::InvalidConfig(format!(
            "buffer distance must be a non-negative number of metres, got {distance}"
        )));
    }

    let shape = polygon.geometry();
    let mut buffered = MultiPolygon::new(vec![shape.clone()]);
    if distance == 0.0 {
        return Ok(Georeferenced::new(crs, buffered));
    }

    let mut capsules = 0usize;
    for ring in std::iter::once(shape.exterior()).chain(shape.interiors()) {
        for edge in ring.lines() {
            buffered = buffered.union(&capsule(edge.start, edge.end, distance));
            capsules += 1;
        }
    }

    debug!(capsules, distance, polygons = buffered.0.len(), "Buffered polygon");
    Ok(Georeferenced::new(crs, buffered))
}

fn circle(center: Coord<f64>, radius: f64) -> impl Iterator<Item = Point<f64>> {
    (0..CIRCLE_SEGMENTS).map(move |k| {
        let angle = TAU * k as f64 / CIRCLE_SEGMENTS as f64;
        Point::new(center.x + radius * angle.cos(), center.y + radius * angle.sin())
    })
}

fn capsule(start: Coord<f64>, end: Coord<f64>, radius: f64) -> Polygon<f64> {
    let points: Vec<Point<f64>> = circle(start, radius).chain(circle(end, radius)).collect();
    MultiPoint::new(points).convex_hull()
}

/// Intersection of `subject` with `mask`. Both must share a CRS.
pub fn clip(
    subject: &Georeferenced<MultiPolygon<f64>>,
    mask: &Georeferenced<MultiPolygon<f64>>,
) -> SeascapeResult<Georeferenced<MultiPolygon<f64>>> {
    subject.ensure_same_crs(mask)?;
    let clipped = subject.geometry().intersection(mask.geometry());
    Ok(Georeferenced::new(subject.crs(), clipped))
}

/// Point-in-area test against a tagged multipolygon, boundary included.
pub struct PointMask<'a> {
    area: &'a Georeferenced<MultiPolygon<f64>>,
    extent: Option<Rect<f64>>,
}

impl<'a> PointMask<'a> {
    pub fn new(area: &'a Georeferenced<MultiPolygon<f64>>) -> Self {
        Self {
            area,
            extent: area.geometry().bounding_rect(),
        }
    }

    /// True when `point` lies inside the area or on its boundary.
    pub fn covers(&self, point: Point<f64>) -> bool {
        let Some(extent) = self.extent else {
            return false;
        };
        let (min, max) = (extent.min(), extent.max());
        if point.x() < min.x || point.x() > max.x || point.y() < min.y || point.y() > max.y {
            return false;
        }
        self.area.geometry().intersects(&point)
    }
}
