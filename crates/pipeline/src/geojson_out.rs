//! GeoJSON output for the area of interest and the basemap.
//!
//! Coordinates stay in the projected CRS; each collection carries a legacy
//! `crs` member naming it, since RFC 7946 readers otherwise assume lon/lat.

use std::fs;
use std::path::{Path, PathBuf};

use geojson::{Feature, FeatureCollection, GeoJson, Geometry, JsonObject, JsonValue};
use serde_json::json;
use tracing::info;

use seascape_common::{CrsCode, SeascapeResult};

use crate::area::AreaOfInterest;
use crate::basemap::Basemap;

pub const AREA_FILE: &str = "area_of_interest.geojson";
pub const BASEMAP_FILE: &str = "basemap.geojson";

/// Writes GeoJSON feature collections into one directory.
#[derive(Debug, Clone)]
pub struct GeoJsonWriter {
    dir: PathBuf,
}

impl GeoJsonWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: output_dir.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn write_area(&self, aoi: &AreaOfInterest) -> SeascapeResult<PathBuf> {
        let b = aoi.bounds();
        let properties = json!({
            "name": "area_of_interest",
            "north": b.north(),
            "south": b.south(),
            "east": b.east(),
            "west": b.west(),
            "source_crs": aoi.source_crs().to_string(),
        });
        let geometry = Geometry::new(geojson::Value::from(aoi.polygon().geometry()));
        self.write(AREA_FILE, aoi.crs(), feature(geometry, properties))
    }

    pub fn write_basemap(&self, basemap: &Basemap) -> SeascapeResult<PathBuf> {
        let properties = json!({
            "name": "basemap",
            "country": basemap.country,
            "scale": basemap.scale.to_string(),
        });
        let geometry = Geometry::new(geojson::Value::from(basemap.land.geometry()));
        self.write(BASEMAP_FILE, basemap.land.crs(), feature(geometry, properties))
    }

    fn write(&self, file_name: &str, crs: CrsCode, feature: Feature) -> SeascapeResult<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(file_name);

        let collection = FeatureCollection {
            bbox: None,
            features: vec![feature],
            foreign_members: Some(crs_member(crs)),
        };
        fs::write(&path, GeoJson::from(collection).to_string())?;

        info!(path = %path.display(), %crs, "Wrote GeoJSON");
        Ok(path)
    }
}

fn feature(geometry: Geometry, properties: JsonValue) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(geometry),
        id: None,
        properties: match properties {
            JsonValue::Object(map) => Some(map),
            _ => None,
        },
        foreign_members: None,
    }
}

fn crs_member(crs: CrsCode) -> JsonObject {
    let mut members = JsonObject::new();
    members.insert(
        "crs".to_string(),
        json!({ "type": "name", "properties": { "name": crs.ogc_urn() } }),
    );
    members
}
