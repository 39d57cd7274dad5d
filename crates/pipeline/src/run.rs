//! Run orchestration.
//!
//! Steps run one after another. The area of interest is required by every
//! other step, so a failure there aborts the run; any later failure is
//! recorded in the [`RunSummary`] and the remaining steps still run.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use projection::Transformer;
use seascape_common::{SeascapeError, SeascapeResult};
use sources::{
    BasemapSource, BathymetrySource, EnvironmentalCatalog, EnvironmentalSource, OccurrenceSource,
};

use crate::area::AreaOfInterest;
use crate::basemap::{buffered_area, load_basemap};
use crate::config::PipelineConfig;
use crate::flatten::{flatten_bathymetry, flatten_environmental, flatten_occurrences, TableWriter};
use crate::geojson_out::GeoJsonWriter;
use crate::points::{load_bathymetry, load_environmental, load_occurrences, LoadReport, OccurrenceFilter};

pub const SUMMARY_FILE: &str = "run_summary.json";

/// The data sources one run reads from.
#[derive(Clone, Copy)]
pub struct SourceSet<'a> {
    pub occurrences: &'a dyn OccurrenceSource,
    pub bathymetry: &'a dyn BathymetrySource,
    pub environmental: &'a dyn EnvironmentalSource,
    pub basemap: &'a dyn BasemapSource,
}

impl<'a> SourceSet<'a> {
    /// Use one value for every data kind.
    pub fn uniform<S>(source: &'a S) -> Self
    where
        S: OccurrenceSource + BathymetrySource + EnvironmentalSource + BasemapSource,
    {
        Self {
            occurrences: source,
            bathymetry: source,
            environmental: source,
            basemap: source,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    AreaOfInterest,
    Basemap,
    Occurrences,
    Bathymetry,
    Environmental,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepStatus {
    Completed { outputs: Vec<PathBuf> },
    Skipped,
    Failed {
        category: String,
        retryable: bool,
        error: String,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct StepOutcome {
    pub step: Step,
    #[serde(flatten)]
    pub status: StepStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<LoadReport>,
}

/// What one run did, step by step.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub output_dir: PathBuf,
    pub steps: Vec<StepOutcome>,
}

impl RunSummary {
    pub fn outcome(&self, step: Step) -> Option<&StepOutcome> {
        self.steps.iter().find(|s| s.step == step)
    }

    pub fn failed_steps(&self) -> Vec<Step> {
        self.steps
            .iter()
            .filter(|s| matches!(s.status, StepStatus::Failed { .. }))
            .map(|s| s.step)
            .collect()
    }

    pub fn is_success(&self) -> bool {
        self.failed_steps().is_empty()
    }

    /// Every file written by a completed step.
    pub fn outputs(&self) -> Vec<&Path> {
        self.steps
            .iter()
            .filter_map(|s| match &s.status {
                StepStatus::Completed { outputs } => Some(outputs.iter().map(PathBuf::as_path)),
                _ => None,
            })
            .flatten()
            .collect()
    }

    fn write_json(&self) -> SeascapeResult<PathBuf> {
        let path = self.output_dir.join(SUMMARY_FILE);
        let body = serde_json::to_string_pretty(self)
            .map_err(|e| SeascapeError::Io(std::io::Error::other(e)))?;
        std::fs::write(&path, body)?;
        Ok(path)
    }
}

type StepResult = SeascapeResult<(Vec<PathBuf>, Option<LoadReport>)>;

fn record(steps: &mut Vec<StepOutcome>, step: Step, result: StepResult) {
    let outcome = match result {
        Ok((outputs, report)) => {
            info!(?step, files = outputs.len(), "Step completed");
            StepOutcome {
                step,
                status: StepStatus::Completed { outputs },
                report,
            }
        }
        Err(err) => {
            warn!(?step, error = %err, category = ?err.category(), "Step failed");
            StepOutcome {
                step,
                status: StepStatus::Failed {
                    category: format!("{:?}", err.category()).to_lowercase(),
                    retryable: err.is_retryable(),
                    error: err.to_string(),
                },
                report: None,
            }
        }
    };
    steps.push(outcome);
}

fn skipped(steps: &mut Vec<StepOutcome>, step: Step) {
    info!(?step, "Step disabled");
    steps.push(StepOutcome {
        step,
        status: StepStatus::Skipped,
        report: None,
    });
}

/// Run every configured step against `sources`.
///
/// Returns `Err` only when the area of interest cannot be built or buffered;
/// other step failures are reported in the summary.
pub async fn run_pipeline(
    config: &PipelineConfig,
    sources: SourceSet<'_>,
    transformer: &Transformer,
) -> SeascapeResult<RunSummary> {
    let run_id = Uuid::new_v4();
    let started_at = Utc::now();
    let span = info_span!("run", %run_id);

    async move {
        info!(output_dir = %config.output_dir.display(), "Starting pipeline run");
        let tables = TableWriter::new(&config.output_dir);
        let shapes = GeoJsonWriter::new(&config.output_dir);
        let mut steps = Vec::new();

        // Area of interest: fatal on failure
        let area = async {
            let aoi = AreaOfInterest::build(
                config.area.bounds()?,
                config.area.source_crs()?,
                config.area.target_crs()?,
                transformer,
            )?;
            let mask = buffered_area(&aoi, config.area.buffer_m)?;
            let path = shapes.write_area(&aoi)?;
            Ok::<_, SeascapeError>((aoi, mask, path))
        }
        .await;
        let (aoi, mask, area_file) = match area {
            Ok(built) => built,
            Err(err) => {
                error!(error = %err, "Area of interest failed, aborting run");
                return Err(err);
            }
        };
        record(&mut steps, Step::AreaOfInterest, Ok((vec![area_file], None)));

        // Basemap
        let result = async {
            let basemap =
                load_basemap(sources.basemap, &config.basemap, &aoi, config.area.buffer_m, transformer).await?;
            StepResult::Ok((vec![shapes.write_basemap(&basemap)?], None))
        }
        .await;
        record(&mut steps, Step::Basemap, result);

        // Occurrences
        if config.occurrence.enabled {
            let filter = OccurrenceFilter {
                year: config.occurrence.year,
                scientific_name: config.occurrence.scientific_name.clone(),
                max_records: config.occurrence.max_records,
            };
            let result = async {
                let mask = config.occurrence.mask.then_some(&mask);
                let loaded = load_occurrences(sources.occurrences, &aoi, &filter, mask, transformer).await?;
                let path = tables.write_counts(&flatten_occurrences(&loaded.dataset))?;
                StepResult::Ok((vec![path], Some(loaded.report)))
            }
            .await;
            record(&mut steps, Step::Occurrences, result);
        } else {
            skipped(&mut steps, Step::Occurrences);
        }

        // Bathymetry
        if config.bathymetry.enabled {
            let result = async {
                let mask = config.bathymetry.mask.then_some(&mask);
                let loaded =
                    load_bathymetry(sources.bathymetry, &aoi, config.bathymetry.stride(), mask, transformer).await?;
                let path = tables.write_depths(&flatten_bathymetry(&loaded.dataset))?;
                StepResult::Ok((vec![path], Some(loaded.report)))
            }
            .await;
            record(&mut steps, Step::Bathymetry, result);
        } else {
            skipped(&mut steps, Step::Bathymetry);
        }

        // Environmental layers
        if config.environmental.enabled {
            let result = async {
                let layers = EnvironmentalCatalog::builtin()
                    .resolve(&config.environmental.dataset, &config.environmental.layers)?;
                let loaded = load_environmental(
                    sources.environmental,
                    &layers,
                    &aoi,
                    config.environmental.stride,
                    &mask,
                    transformer,
                )
                .await?;
                let mut paths = Vec::with_capacity(layers.len());
                for layer in &layers {
                    let rows = flatten_environmental(&loaded.dataset, &layer.code);
                    paths.push(tables.write_values(&layer.code, &rows)?);
                }
                StepResult::Ok((paths, Some(loaded.report)))
            }
            .await;
            record(&mut steps, Step::Environmental, result);
        } else {
            skipped(&mut steps, Step::Environmental);
        }

        let summary = RunSummary {
            run_id,
            started_at,
            finished_at: Utc::now(),
            output_dir: config.output_dir.clone(),
            steps,
        };
        match summary.write_json() {
            Ok(path) => info!(path = %path.display(), "Wrote run summary"),
            Err(err) => warn!(error = %err, "Could not write run summary"),
        }

        let failed = summary.failed_steps();
        if failed.is_empty() {
            info!(files = summary.outputs().len(), "Pipeline run completed");
        } else {
            warn!(?failed, "Pipeline run completed with failed steps");
        }
        Ok(summary)
    }
    .instrument(span)
    .await
}
