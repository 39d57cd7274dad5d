//! Natural Earth admin-0 country outlines.
//!
//! Downloads `ne_{scale}_admin_0_countries.geojson` and keeps the features
//! whose `ADMIN`, `NAME` or `SOVEREIGNT` property matches the requested
//! country, case-insensitively.

use async_trait::async_trait;
use geo::{Geometry, MultiPolygon};
use geojson::{Feature, GeoJson};
use tracing::{info, instrument, warn};

use seascape_common::{RemoteError, SeascapeError, SeascapeResult};

use crate::fetch::FetchSession;
use crate::source::{BasemapScale, BasemapSource};

pub const DEFAULT_NATURAL_EARTH_URL: &str =
    "https://raw.githubusercontent.com/nvkelso/natural-earth-vector/master/geojson";

const NAME_PROPERTIES: [&str; 3] = ["ADMIN", "NAME", "SOVEREIGNT"];

pub struct NaturalEarthClient<'a> {
    session: &'a FetchSession,
    base_url: String,
}

impl<'a> NaturalEarthClient<'a> {
    pub fn new(session: &'a FetchSession, base_url: impl Into<String>) -> Self {
        Self {
            session,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn countries_url(&self, scale: BasemapScale) -> String {
        format!(
            "{}/ne_{}_admin_0_countries.geojson",
            self.base_url,
            scale.natural_earth_code()
        )
    }
}

#[async_trait]
impl BasemapSource for NaturalEarthClient<'_> {
    #[instrument(skip(self), fields(scale = %scale))]
    async fn fetch_country(&self, name: &str, scale: BasemapScale) -> SeascapeResult<MultiPolygon<f64>> {
        let url = self.countries_url(scale);
        let body = self
            .session
            .get_text(&url, &[])
            .await
            .map_err(|err| SeascapeError::BasemapUnavailable {
                region: name.to_string(),
                reason: "country outlines could not be downloaded".to_string(),
                source: Some(err),
            })?;

        let outline = extract_country(&body, name).map_err(|message| {
            SeascapeError::BasemapUnavailable {
                region: name.to_string(),
                reason: "country outlines could not be parsed".to_string(),
                source: Some(RemoteError::MalformedPayload {
                    url: url.clone(),
                    message,
                }),
            }
        })?;

        match outline {
            Some(outline) => {
                info!(country = %name, polygons = outline.0.len(), "Loaded country outline");
                Ok(outline)
            }
            None => {
                warn!(country = %name, "Country not found in Natural Earth");
                Err(SeascapeError::basemap_unavailable(
                    name,
                    format!("no Natural Earth country named '{name}'"),
                ))
            }
        }
    }
}

/// Polygons of every feature matching `name`; `Ok(None)` when none match.
pub fn extract_country(body: &str, name: &str) -> Result<Option<MultiPolygon<f64>>, String> {
    let geojson: GeoJson = body.parse().map_err(|e| format!("invalid GeoJSON: {e}"))?;
    let GeoJson::FeatureCollection(collection) = geojson else {
        return Err("expected a FeatureCollection".to_string());
    };

    let wanted = name.trim();
    let mut polygons = Vec::new();
    for feature in collection.features.iter().filter(|f| feature_matches(f, wanted)) {
        let Some(geometry) = &feature.geometry else {
            continue;
        };
        let geometry: Geometry<f64> = geometry
            .value
            .clone()
            .try_into()
            .map_err(|e| format!("unconvertible geometry: {e}"))?;
        match geometry {
            Geometry::Polygon(p) => polygons.push(p),
            Geometry::MultiPolygon(mp) => polygons.extend(mp.0),
            _ => {}
        }
    }

    Ok((!polygons.is_empty()).then(|| MultiPolygon::new(polygons)))
}

fn feature_matches(feature: &Feature, wanted: &str) -> bool {
    NAME_PROPERTIES.iter().any(|key| {
        feature
            .property(key)
            .and_then(|v| v.as_str())
            .is_some_and(|v| v.eq_ignore_ascii_case(wanted))
    })
}
