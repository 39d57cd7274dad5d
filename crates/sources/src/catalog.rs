//! Built-in catalog of environmental raster layers.
//!
//! Layers are addressed by a dataset code (e.g. `Bio-ORACLE`) and a layer
//! code (e.g. `BO_sstmean`). Each layer maps to a griddap dataset and
//! variable on an ERDDAP server.

use std::fmt;

use serde::{Deserialize, Serialize};

use seascape_common::{SeascapeError, SeascapeResult};

/// A syntactically valid dataset code: ASCII letters, digits, `_` and `-`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DatasetCode(String);

impl DatasetCode {
    pub fn parse(code: &str) -> SeascapeResult<Self> {
        if code.is_empty() {
            return Err(SeascapeError::lookup_failed(code, "dataset code is empty"));
        }
        if let Some(bad) = code
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
        {
            return Err(SeascapeError::lookup_failed(
                code,
                format!("dataset code contains invalid character {bad:?}"),
            ));
        }
        Ok(Self(code.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DatasetCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for DatasetCode {
    type Error = SeascapeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        DatasetCode::parse(&value)
    }
}

impl From<DatasetCode> for String {
    fn from(code: DatasetCode) -> Self {
        code.0
    }
}

/// One downloadable layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerDescriptor {
    /// Layer code, used verbatim as the sample attribute name.
    pub code: String,
    pub name: String,
    pub dataset: String,
    pub units: String,
    /// Griddap dataset id on the ERDDAP server.
    pub griddap_id: String,
    /// Variable to extract from the griddap dataset.
    pub variable: String,
    /// Fixed constraint on a leading time axis, e.g. `(2010-01-01T00:00:00Z)`.
    #[serde(default)]
    pub time_constraint: Option<String>,
}

#[derive(Debug, Clone)]
struct DatasetEntry {
    code: &'static str,
    layers: Vec<LayerDescriptor>,
}

/// In-process catalog of known datasets and their layers.
#[derive(Debug, Clone)]
pub struct EnvironmentalCatalog {
    datasets: Vec<DatasetEntry>,
}

impl Default for EnvironmentalCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl EnvironmentalCatalog {
    /// Marine layers for Bio-ORACLE (surface, 2000-2019 baseline) and MARSPEC.
    pub fn builtin() -> Self {
        let bio_oracle = |code: &str, name: &str, units: &str, id: &str, var: &str| LayerDescriptor {
            code: code.to_string(),
            name: name.to_string(),
            dataset: "Bio-ORACLE".to_string(),
            units: units.to_string(),
            griddap_id: id.to_string(),
            variable: var.to_string(),
            time_constraint: Some("(2010-01-01T00:00:00Z)".to_string()),
        };
        let marspec = |code: &str, name: &str, units: &str, var: &str| LayerDescriptor {
            code: code.to_string(),
            name: name.to_string(),
            dataset: "MARSPEC".to_string(),
            units: units.to_string(),
            griddap_id: "marspec_5m".to_string(),
            variable: var.to_string(),
            time_constraint: None,
        };

        Self {
            datasets: vec![
                DatasetEntry {
                    code: "Bio-ORACLE",
                    layers: vec![
                        bio_oracle(
                            "BO_sstmean",
                            "Sea surface temperature (mean)",
                            "degC",
                            "thetao_baseline_2000_2019_depthsurf",
                            "thetao_mean",
                        ),
                        bio_oracle(
                            "BO_sstmax",
                            "Sea surface temperature (maximum)",
                            "degC",
                            "thetao_baseline_2000_2019_depthsurf",
                            "thetao_max",
                        ),
                        bio_oracle(
                            "BO_salinity",
                            "Sea surface salinity (mean)",
                            "PSS",
                            "so_baseline_2000_2019_depthsurf",
                            "so_mean",
                        ),
                        bio_oracle(
                            "BO_chlomean",
                            "Chlorophyll concentration (mean)",
                            "mmol/m3",
                            "chl_baseline_2000_2018_depthsurf",
                            "chl_mean",
                        ),
                        bio_oracle(
                            "BO_dissox",
                            "Dissolved oxygen (mean)",
                            "mmol/m3",
                            "o2_baseline_2000_2018_depthsurf",
                            "o2_mean",
                        ),
                    ],
                },
                DatasetEntry {
                    code: "MARSPEC",
                    layers: vec![
                        marspec("MS_bathy_5m", "Bathymetry", "m", "bathy"),
                        marspec("MS_biogeo08_sss_mean_5m", "Mean annual sea surface salinity", "PSS", "sss_mean"),
                        marspec("MS_biogeo13_sst_mean_5m", "Mean annual sea surface temperature", "degC", "sst_mean"),
                    ],
                },
            ],
        }
    }

    /// Codes of every dataset in the catalog.
    pub fn dataset_codes(&self) -> Vec<&str> {
        self.datasets.iter().map(|d| d.code).collect()
    }

    /// Layers of `dataset_code` whose code or name contains `name_filter`
    /// (case-insensitive). `None` lists every layer.
    ///
    /// A malformed or unknown dataset code is a `LookupFailed` error; a known
    /// dataset without a matching layer yields an empty list.
    pub fn list_layers(
        &self,
        dataset_code: &str,
        name_filter: Option<&str>,
    ) -> SeascapeResult<Vec<LayerDescriptor>> {
        let code = DatasetCode::parse(dataset_code)?;
        let entry = self
            .datasets
            .iter()
            .find(|d| d.code.eq_ignore_ascii_case(code.as_str()))
            .ok_or_else(|| {
                SeascapeError::lookup_failed(
                    dataset_code,
                    format!(
                        "unknown dataset, expected one of: {}",
                        self.dataset_codes().join(", ")
                    ),
                )
            })?;

        let needle = name_filter.map(str::to_lowercase);
        Ok(entry
            .layers
            .iter()
            .filter(|layer| match &needle {
                None => true,
                Some(n) => {
                    layer.code.to_lowercase().contains(n) || layer.name.to_lowercase().contains(n)
                }
            })
            .cloned()
            .collect())
    }

    /// Resolve exact layer codes. Codes that are not in the dataset are
    /// skipped; the caller decides whether that is acceptable.
    pub fn resolve(&self, dataset_code: &str, codes: &[String]) -> SeascapeResult<Vec<LayerDescriptor>> {
        let layers = self.list_layers(dataset_code, None)?;
        Ok(codes
            .iter()
            .filter_map(|code| layers.iter().find(|l| &l.code == code).cloned())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_layers_by_name() {
        let catalog = EnvironmentalCatalog::builtin();
        let layers = catalog.list_layers("Bio-ORACLE", Some("temperature")).unwrap();
        let codes: Vec<_> = layers.iter().map(|l| l.code.as_str()).collect();
        assert_eq!(codes, vec!["BO_sstmean", "BO_sstmax"]);
    }

    #[test]
    fn test_nonexistent_layer_is_empty_not_error() {
        let catalog = EnvironmentalCatalog::builtin();
        let layers = catalog.list_layers("Bio-ORACLE", Some("no_such_layer")).unwrap();
        assert!(layers.is_empty());
    }

    #[test]
    fn test_malformed_dataset_code_is_lookup_failure() {
        let catalog = EnvironmentalCatalog::builtin();
        let err = catalog.list_layers("Bio ORACLE!", None).unwrap_err();
        assert!(matches!(err, SeascapeError::LookupFailed { .. }));
        assert!(err.to_string().contains("invalid character"));

        let err = catalog.list_layers("", None).unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn test_unknown_dataset_lists_alternatives() {
        let catalog = EnvironmentalCatalog::builtin();
        let err = catalog.list_layers("WorldClim", None).unwrap_err();
        assert!(err.to_string().contains("Bio-ORACLE"));
    }

    #[test]
    fn test_resolve_skips_unknown_codes() {
        let catalog = EnvironmentalCatalog::builtin();
        let layers = catalog
            .resolve(
                "bio-oracle",
                &["BO_salinity".to_string(), "BO_nope".to_string(), "BO_sstmean".to_string()],
            )
            .unwrap();
        let codes: Vec<_> = layers.iter().map(|l| l.code.as_str()).collect();
        assert_eq!(codes, vec!["BO_salinity", "BO_sstmean"]);
    }
}
