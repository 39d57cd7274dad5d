//! Basemap loading against in-memory country outlines.

#![allow(deprecated)]

use geo::{point, Coord, CoordsIter, EuclideanDistance, MultiPolygon, Point, Polygon};

use pipeline::{load_basemap, AreaOfInterest, BasemapRequest};
use projection::Transformer;
use seascape_common::{CrsCode, SeascapeError};
use sources::{BasemapScale, MemorySources};
use test_utils::{create_north_shore, st_lawrence_bounds, BUFFER_M};

fn aoi(transformer: &Transformer) -> AreaOfInterest {
    AreaOfInterest::build(
        st_lawrence_bounds(),
        CrsCode::Epsg4326,
        CrsCode::Epsg32198,
        transformer,
    )
    .unwrap()
}

fn request(country: &str) -> BasemapRequest {
    BasemapRequest {
        country: country.to_string(),
        scale: BasemapScale::Medium,
    }
}

#[tokio::test]
async fn test_basemap_within_buffer_of_area() {
    let transformer = Transformer::new();
    let aoi = aoi(&transformer);
    let sources = MemorySources::new().with_country("Canada", create_north_shore());

    let basemap = load_basemap(&sources, &request("Canada"), &aoi, BUFFER_M, &transformer)
        .await
        .unwrap();

    assert_eq!(basemap.land.crs(), CrsCode::Epsg32198);
    assert!(!basemap.land.geometry().0.is_empty());

    let area: &Polygon<f64> = aoi.polygon().geometry();
    for c in basemap.land.geometry().coords_iter() {
        let d = Point::from(c).euclidean_distance(area);
        assert!(d <= BUFFER_M + 1.0, "vertex {c:?} is {d} m from the area");
    }
}

#[tokio::test]
async fn test_basemap_extends_past_unbuffered_area() {
    let transformer = Transformer::new();
    let aoi = aoi(&transformer);
    let sources = MemorySources::new().with_country("Canada", create_north_shore());

    let basemap = load_basemap(&sources, &request("canada"), &aoi, BUFFER_M, &transformer)
        .await
        .unwrap();

    // The north shore runs past the northern edge, so some land lies in the buffer
    let rect = aoi.bounding_rect();
    let max_y = basemap
        .land
        .geometry()
        .coords_iter()
        .map(|c: Coord<f64>| c.y)
        .fold(f64::MIN, f64::max);
    assert!(max_y > rect.max_y);
}

#[tokio::test]
async fn test_zero_buffer_stays_inside_area() {
    let transformer = Transformer::new();
    let aoi = aoi(&transformer);
    let sources = MemorySources::new().with_country("Canada", create_north_shore());

    let basemap = load_basemap(&sources, &request("Canada"), &aoi, 0.0, &transformer)
        .await
        .unwrap();

    let area = aoi.polygon().geometry();
    for c in basemap.land.geometry().coords_iter() {
        assert!(Point::from(c).euclidean_distance(area) < 1e-3);
    }
}

#[tokio::test]
async fn test_outline_far_from_area_is_unavailable() {
    let transformer = Transformer::new();
    let aoi = aoi(&transformer);
    let elsewhere = MultiPolygon::new(vec![Polygon::new(
        vec![
            point!(x: 140.0, y: -30.0),
            point!(x: 150.0, y: -30.0),
            point!(x: 150.0, y: -20.0),
            point!(x: 140.0, y: -20.0),
            point!(x: 140.0, y: -30.0),
        ]
        .into(),
        vec![],
    )]);
    let sources = MemorySources::new().with_country("Australia", elsewhere);

    let err = load_basemap(&sources, &request("Australia"), &aoi, BUFFER_M, &transformer)
        .await
        .unwrap_err();
    assert!(matches!(err, SeascapeError::BasemapUnavailable { .. }));
}

#[tokio::test]
async fn test_unknown_country_is_unavailable() {
    let transformer = Transformer::new();
    let aoi = aoi(&transformer);
    let sources = MemorySources::new().with_country("Canada", create_north_shore());

    let err = load_basemap(&sources, &request("Atlantis"), &aoi, BUFFER_M, &transformer)
        .await
        .unwrap_err();
    assert!(matches!(err, SeascapeError::BasemapUnavailable { source: None, .. }));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_geographic_area_cannot_be_buffered() {
    let transformer = Transformer::new();
    let aoi = AreaOfInterest::build(
        st_lawrence_bounds(),
        CrsCode::Epsg4326,
        CrsCode::Epsg4326,
        &transformer,
    )
    .unwrap();
    let sources = MemorySources::new().with_country("Canada", create_north_shore());

    let err = load_basemap(&sources, &request("Canada"), &aoi, BUFFER_M, &transformer)
        .await
        .unwrap_err();
    assert!(matches!(err, SeascapeError::NonMetricBuffer(CrsCode::Epsg4326)));
    assert_eq!(sources.call_count(), 0);
}
