//! Pipeline configuration loaded from YAML.
//!
//! ```yaml
//! area:
//!   north: 50.5
//!   south: 49.0
//!   east: -65.5
//!   west: -67.5
//!   target_crs: EPSG:32198
//!   buffer_m: 20000
//! basemap:
//!   country: Canada
//!   scale: medium
//! environmental:
//!   dataset: Bio-ORACLE
//!   layers: [BO_salinity, BO_sstmean]
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{debug, info};

use seascape_common::{CrsCode, GeoBounds, SeascapeError, SeascapeResult, YearFilter};
use sources::obis::{DEFAULT_OBIS_URL, DEFAULT_PAGE_SIZE};
use sources::{EnvironmentalCatalog, HttpConfig};

use crate::basemap::BasemapRequest;

/// Root configuration for one pipeline run.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    pub area: AreaConfig,
    pub basemap: BasemapRequest,
    #[serde(default)]
    pub occurrence: OccurrenceConfig,
    #[serde(default)]
    pub bathymetry: BathymetryConfig,
    #[serde(default)]
    pub environmental: EnvironmentalConfig,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub endpoints: Endpoints,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("cache")
}

/// Study-area bounds and working CRS.
#[derive(Debug, Clone, Deserialize)]
pub struct AreaConfig {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
    #[serde(default = "default_source_crs")]
    pub source_crs: String,
    #[serde(default = "default_target_crs")]
    pub target_crs: String,
    /// Basemap clip and mask buffer around the area (metres).
    #[serde(default = "default_buffer_m")]
    pub buffer_m: f64,
}

fn default_source_crs() -> String {
    "EPSG:4326".to_string()
}

fn default_target_crs() -> String {
    "EPSG:32198".to_string()
}

fn default_buffer_m() -> f64 {
    20_000.0
}

impl AreaConfig {
    pub fn bounds(&self) -> SeascapeResult<GeoBounds> {
        GeoBounds::new(self.north, self.south, self.east, self.west)
    }

    pub fn source_crs(&self) -> SeascapeResult<CrsCode> {
        self.source_crs.parse()
    }

    pub fn target_crs(&self) -> SeascapeResult<CrsCode> {
        self.target_crs.parse()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OccurrenceConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Drop records outside the buffered area.
    #[serde(default = "default_enabled")]
    pub mask: bool,
    /// Restrict records to one calendar year. Absent means all years.
    #[serde(default)]
    pub year: Option<YearFilter>,
    #[serde(default)]
    pub scientific_name: Option<String>,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_max_records")]
    pub max_records: usize,
}

fn default_enabled() -> bool {
    true
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_max_records() -> usize {
    50_000
}

impl Default for OccurrenceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            mask: true,
            year: None,
            scientific_name: None,
            page_size: default_page_size(),
            max_records: default_max_records(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BathymetryConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub mask: bool,
    /// Sampling interval in arc-minutes; ETOPO is served at one arc-minute.
    #[serde(default = "default_resolution_minutes")]
    pub resolution_minutes: u32,
}

fn default_resolution_minutes() -> u32 {
    1
}

impl Default for BathymetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            mask: false,
            resolution_minutes: default_resolution_minutes(),
        }
    }
}

impl BathymetryConfig {
    pub fn stride(&self) -> u32 {
        self.resolution_minutes.max(1)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EnvironmentalConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_dataset")]
    pub dataset: String,
    #[serde(default = "default_layers")]
    pub layers: Vec<String>,
    /// Take every n-th native cell.
    #[serde(default = "default_stride")]
    pub stride: u32,
}

fn default_dataset() -> String {
    "Bio-ORACLE".to_string()
}

fn default_layers() -> Vec<String> {
    vec!["BO_salinity".to_string(), "BO_sstmean".to_string()]
}

fn default_stride() -> u32 {
    1
}

impl Default for EnvironmentalConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dataset: default_dataset(),
            layers: default_layers(),
            stride: default_stride(),
        }
    }
}

/// Base URLs of the remote services.
#[derive(Debug, Clone, Deserialize)]
pub struct Endpoints {
    #[serde(default = "default_obis")]
    pub obis: String,
    #[serde(default = "default_erddap")]
    pub erddap: String,
    #[serde(default = "default_bio_oracle_erddap")]
    pub bio_oracle_erddap: String,
    #[serde(default = "default_natural_earth")]
    pub natural_earth: String,
}

fn default_obis() -> String {
    DEFAULT_OBIS_URL.to_string()
}

fn default_erddap() -> String {
    sources::griddap::DEFAULT_ERDDAP_URL.to_string()
}

fn default_bio_oracle_erddap() -> String {
    sources::environmental::DEFAULT_BIO_ORACLE_URL.to_string()
}

fn default_natural_earth() -> String {
    sources::natural_earth::DEFAULT_NATURAL_EARTH_URL.to_string()
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            obis: default_obis(),
            erddap: default_erddap(),
            bio_oracle_erddap: default_bio_oracle_erddap(),
            natural_earth: default_natural_earth(),
        }
    }
}

impl PipelineConfig {
    /// Load and validate a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::from_yaml(&contents)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        info!(path = %path.display(), "Loaded pipeline config");
        Ok(config)
    }

    /// Parse and validate YAML text.
    pub fn from_yaml(contents: &str) -> Result<Self> {
        let config: PipelineConfig =
            serde_yaml::from_str(contents).context("Failed to parse YAML")?;
        config.validate()?;
        Ok(config)
    }

    /// Check everything that can be checked without the network.
    pub fn validate(&self) -> SeascapeResult<()> {
        self.area.bounds()?;
        if !self.area.source_crs()?.is_geographic() {
            return Err(SeascapeError::InvalidConfig(format!(
                "area.source_crs must be geographic, got {}",
                self.area.source_crs
            )));
        }
        let target = self.area.target_crs()?;
        if self.area.buffer_m > 0.0 && !target.is_metric() {
            return Err(SeascapeError::NonMetricBuffer(target));
        }
        if !self.area.buffer_m.is_finite() || self.area.buffer_m < 0.0 {
            return Err(SeascapeError::InvalidConfig(format!(
                "area.buffer_m must be a non-negative number, got {}",
                self.area.buffer_m
            )));
        }
        if self.basemap.country.trim().is_empty() {
            return Err(SeascapeError::InvalidConfig(
                "basemap.country must not be empty".to_string(),
            ));
        }
        if self.occurrence.max_records == 0 || self.occurrence.page_size == 0 {
            return Err(SeascapeError::InvalidConfig(
                "occurrence.page_size and occurrence.max_records must be positive".to_string(),
            ));
        }

        if self.environmental.enabled {
            let catalog = EnvironmentalCatalog::builtin();
            let resolved = catalog.resolve(&self.environmental.dataset, &self.environmental.layers)?;
            if let Some(missing) = self
                .environmental
                .layers
                .iter()
                .find(|code| !resolved.iter().any(|l| &l.code == *code))
            {
                return Err(SeascapeError::lookup_failed(
                    missing.as_str(),
                    format!("no such layer in dataset {}", self.environmental.dataset),
                ));
            }
        }

        debug!("Pipeline config is valid");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sources::BasemapScale;

    const MINIMAL: &str = r#"
area:
  north: 50.5
  south: 49.0
  east: -65.5
  west: -67.5
basemap:
  country: Canada
"#;

    #[test]
    fn test_minimal_config_defaults() {
        let config = PipelineConfig::from_yaml(MINIMAL).unwrap();
        assert_eq!(config.area.target_crs().unwrap(), CrsCode::Epsg32198);
        assert_eq!(config.area.buffer_m, 20_000.0);
        assert_eq!(config.basemap.scale, BasemapScale::Medium);
        assert!(config.occurrence.year.is_none());
        assert_eq!(config.environmental.layers, vec!["BO_salinity", "BO_sstmean"]);
        assert_eq!(config.output_dir, PathBuf::from("output"));
        assert_eq!(config.http.timeout_secs, 60);
    }

    #[test]
    fn test_reversed_bounds_rejected() {
        let yaml = MINIMAL.replace("north: 50.5", "north: 48.0");
        let err = PipelineConfig::from_yaml(&yaml).unwrap_err();
        let err = err.downcast_ref::<SeascapeError>().unwrap();
        assert!(matches!(err, SeascapeError::InvalidBounds(_)));
    }

    #[test]
    fn test_unknown_scale_rejected() {
        let yaml = format!("{MINIMAL}  scale: enormous\n");
        assert!(PipelineConfig::from_yaml(&yaml).is_err());
    }

    #[test]
    fn test_geographic_target_with_buffer_rejected() {
        let yaml = MINIMAL.replace("west: -67.5", "west: -67.5\n  target_crs: EPSG:4326");
        let err = PipelineConfig::from_yaml(&yaml).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SeascapeError>(),
            Some(SeascapeError::NonMetricBuffer(CrsCode::Epsg4326))
        ));
    }

    #[test]
    fn test_unknown_layer_rejected() {
        let yaml = format!("{MINIMAL}environmental:\n  layers: [BO_nonexistent]\n");
        let err = PipelineConfig::from_yaml(&yaml).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SeascapeError>(),
            Some(SeascapeError::LookupFailed { .. })
        ));
    }

    #[test]
    fn test_year_out_of_range_rejected() {
        let yaml = format!("{MINIMAL}occurrence:\n  year: 1200\n");
        assert!(PipelineConfig::from_yaml(&yaml).is_err());
    }

    #[test]
    fn test_sample_config_loads() {
        let path = test_utils::config_dir().join("st_lawrence.yaml");
        let config = PipelineConfig::load(&path).unwrap();
        assert_eq!(config.basemap.country, "Canada");
        assert_eq!(config.occurrence.year.map(|y| y.year()), Some(2019));
    }
}
