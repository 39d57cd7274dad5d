//! Basemap loader: country outline, reprojected and clipped to the buffered
//! area of interest.

use geo::{coord, BooleanOps, MultiPolygon, Rect};
use serde::Deserialize;
use tracing::{info, instrument};

use projection::Transformer;
use seascape_common::{CrsCode, Georeferenced, SeascapeError, SeascapeResult};
use sources::{BasemapScale, BasemapSource};

use crate::area::AreaOfInterest;
use crate::ops::{buffer_polygon, clip};

/// Length of one degree of latitude, close enough for a window margin.
const METRES_PER_DEGREE: f64 = 111_320.0;

/// Which outline to fetch.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BasemapRequest {
    pub country: String,
    #[serde(default = "default_scale")]
    pub scale: BasemapScale,
}

fn default_scale() -> BasemapScale {
    BasemapScale::Medium
}

/// Land outline in the area CRS, clipped to the area plus buffer.
#[derive(Debug, Clone)]
pub struct Basemap {
    pub country: String,
    pub scale: BasemapScale,
    pub land: Georeferenced<MultiPolygon<f64>>,
}

/// Buffer the area polygon by `buffer_m` metres in its own CRS.
pub fn buffered_area(aoi: &AreaOfInterest, buffer_m: f64) -> SeascapeResult<Georeferenced<MultiPolygon<f64>>> {
    buffer_polygon(aoi.polygon(), buffer_m)
}

/// Cut a country outline down to a generous lon/lat window around the area
/// so only nearby coastline gets reprojected.
fn prefilter(outline: &MultiPolygon<f64>, aoi: &AreaOfInterest, buffer_m: f64) -> MultiPolygon<f64> {
    let b = aoi.bounds();
    let max_abs_lat = b.north().abs().max(b.south().abs()).min(85.0);
    let margin_lat = 1.0 + buffer_m / METRES_PER_DEGREE;
    let margin_lon = 1.0 + buffer_m / (METRES_PER_DEGREE * max_abs_lat.to_radians().cos());

    let window = Rect::new(
        coord! { x: (b.west() - margin_lon).max(-180.0), y: (b.south() - margin_lat).max(-90.0) },
        coord! { x: (b.east() + margin_lon).min(180.0), y: (b.north() + margin_lat).min(90.0) },
    )
    .to_polygon();
    outline.intersection(&MultiPolygon::new(vec![window]))
}

/// Fetch the outline, reproject it to the area CRS, and clip it to the
/// area buffered by `buffer_m`.
#[instrument(skip(source, aoi, transformer), fields(country = %request.country, scale = %request.scale))]
pub async fn load_basemap(
    source: &dyn BasemapSource,
    request: &BasemapRequest,
    aoi: &AreaOfInterest,
    buffer_m: f64,
    transformer: &Transformer,
) -> SeascapeResult<Basemap> {
    if !aoi.crs().is_metric() {
        return Err(SeascapeError::NonMetricBuffer(aoi.crs()));
    }

    let outline = source.fetch_country(&request.country, request.scale).await?;
    let outline = Georeferenced::new(CrsCode::Epsg4326, prefilter(&outline, aoi, buffer_m));
    let projected = transformer.reproject(&outline, aoi.crs())?;

    let mask = buffered_area(aoi, buffer_m)?;
    let land = clip(&projected, &mask)?;

    if land.geometry().0.is_empty() {
        return Err(SeascapeError::basemap_unavailable(
            &request.country,
            format!("outline does not intersect the area of interest buffered by {buffer_m} m"),
        ));
    }

    info!(polygons = land.geometry().0.len(), "Clipped basemap to buffered area");
    Ok(Basemap {
        country: request.country.clone(),
        scale: request.scale,
        land,
    })
}
