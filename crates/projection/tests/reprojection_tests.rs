//! Reprojection properties over the study area.

use geo::{coord, LineString, Polygon};
use projection::Transformer;
use seascape_common::{CrsCode, Georeferenced};
use test_utils::{assert_coords_approx_eq, st_lawrence_bounds};

fn study_area_ring() -> Polygon<f64> {
    let b = st_lawrence_bounds();
    Polygon::new(
        LineString::from(vec![
            (b.west(), b.north()),
            (b.east(), b.north()),
            (b.east(), b.south()),
            (b.west(), b.south()),
            (b.west(), b.north()),
        ]),
        vec![],
    )
}

#[test]
fn test_reprojection_to_own_crs_is_idempotent() {
    let t = Transformer::new();
    let geographic = Georeferenced::new(CrsCode::Epsg4326, study_area_ring());
    let projected = t.reproject(&geographic, CrsCode::Epsg32198).unwrap();

    let once = t.reproject(&projected, CrsCode::Epsg32198).unwrap();
    let twice = t.reproject(&once, CrsCode::Epsg32198).unwrap();
    assert_eq!(projected, once);
    assert_eq!(once, twice);
}

#[test]
fn test_roundtrip_through_quebec_lambert() {
    let t = Transformer::new();
    let geographic = Georeferenced::new(CrsCode::Epsg4326, study_area_ring());
    let projected = t.reproject(&geographic, CrsCode::Epsg32198).unwrap();
    let back = t.reproject(&projected, CrsCode::Epsg4326).unwrap();

    for (a, b) in geographic
        .geometry()
        .exterior()
        .coords()
        .zip(back.geometry().exterior().coords())
    {
        assert_coords_approx_eq!((a.x, a.y), (b.x, b.y), 1e-7);
    }
}

#[test]
fn test_projected_ring_stays_closed() {
    let t = Transformer::new();
    let projected = t
        .reproject(
            &Georeferenced::new(CrsCode::Epsg4326, study_area_ring()),
            CrsCode::Epsg32198,
        )
        .unwrap();
    let ring = projected.geometry().exterior();
    assert!(ring.is_closed());
}

#[test]
fn test_mercator_roundtrip() {
    let t = Transformer::new();
    let c = coord! { x: -66.5, y: 49.75 };
    let m = t.transform_coord(CrsCode::Epsg4326, CrsCode::Epsg3857, c).unwrap();
    let back = t.transform_coord(CrsCode::Epsg3857, CrsCode::Epsg4326, m).unwrap();
    assert_coords_approx_eq!((back.x, back.y), (c.x, c.y), 1e-9);
}
