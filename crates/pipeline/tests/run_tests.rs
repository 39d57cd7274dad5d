//! End-to-end runs against the synthetic in-memory sources.

use pipeline::{run_pipeline, PipelineConfig, SourceSet, Step, StepStatus};
use projection::Transformer;
use seascape_common::SeascapeError;
use sources::MemorySources;

const CONFIG: &str = r#"
area:
  north: 50.5
  south: 49.0
  east: -65.5
  west: -67.5
  target_crs: EPSG:32198
  buffer_m: 20000
basemap:
  country: Canada
occurrence:
  mask: true
bathymetry:
  resolution_minutes: 1
environmental:
  dataset: Bio-ORACLE
  layers: [BO_salinity, BO_sstmean]
"#;

fn config(dir: &std::path::Path) -> PipelineConfig {
    let mut config = PipelineConfig::from_yaml(CONFIG).unwrap();
    config.output_dir = dir.join("output");
    config
}

#[tokio::test]
async fn test_offline_run_writes_every_output() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path());
    let sources = MemorySources::synthetic(&config.area.bounds().unwrap());

    let summary = run_pipeline(&config, SourceSet::uniform(&sources), &Transformer::new())
        .await
        .unwrap();

    assert!(summary.is_success(), "failed steps: {:?}", summary.failed_steps());
    assert_eq!(summary.steps.len(), 5);

    let out = dir.path().join("output");
    for file in [
        "area_of_interest.geojson",
        "basemap.geojson",
        "occurrence_counts.csv",
        "bathymetry.csv",
        "BO_salinity.csv",
        "BO_sstmean.csv",
        "run_summary.json",
    ] {
        assert!(out.join(file).is_file(), "missing {file}");
    }
    assert_eq!(summary.outputs().len(), 6);

    let counts = std::fs::read_to_string(out.join("occurrence_counts.csv")).unwrap();
    assert!(counts.starts_with("x,y,count\n"));
    let total: u64 = counts
        .lines()
        .skip(1)
        .map(|line| line.rsplit(',').next().unwrap().parse::<u64>().unwrap())
        .sum();
    let occurrences = summary.outcome(Step::Occurrences).unwrap().report.as_ref().unwrap();
    assert_eq!(occurrences.kept, 24);
    // Every record counts at least once
    assert!(total >= 24);

    let summary_json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(out.join("run_summary.json")).unwrap()).unwrap();
    assert_eq!(summary_json["steps"][0]["step"], "area_of_interest");
    assert_eq!(summary_json["steps"][0]["status"], "completed");
}

#[tokio::test]
async fn test_year_filter_limits_occurrences() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config(dir.path());
    config.occurrence.year = Some(seascape_common::YearFilter::new(2019).unwrap());
    config.bathymetry.enabled = false;
    config.environmental.enabled = false;
    let sources = MemorySources::synthetic(&config.area.bounds().unwrap());

    let summary = run_pipeline(&config, SourceSet::uniform(&sources), &Transformer::new())
        .await
        .unwrap();

    let report = summary.outcome(Step::Occurrences).unwrap().report.clone().unwrap();
    assert_eq!(report.kept, 4);
    assert!(matches!(
        summary.outcome(Step::Bathymetry).unwrap().status,
        StepStatus::Skipped
    ));
    assert!(matches!(
        summary.outcome(Step::Environmental).unwrap().status,
        StepStatus::Skipped
    ));
    assert!(summary.is_success());
}

#[tokio::test]
async fn test_unknown_country_fails_only_basemap() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config(dir.path());
    config.basemap.country = "Atlantis".to_string();
    let sources = MemorySources::synthetic(&config.area.bounds().unwrap());

    let summary = run_pipeline(&config, SourceSet::uniform(&sources), &Transformer::new())
        .await
        .unwrap();

    assert_eq!(summary.failed_steps(), vec![Step::Basemap]);
    match &summary.outcome(Step::Basemap).unwrap().status {
        StepStatus::Failed { category, retryable, .. } => {
            assert_eq!(category, "remote");
            assert!(!retryable);
        }
        other => panic!("expected failure, got {other:?}"),
    }
    assert!(!dir.path().join("output/basemap.geojson").exists());
    assert!(dir.path().join("output/bathymetry.csv").is_file());
}

#[tokio::test]
async fn test_unusable_area_aborts_run() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config(dir.path());
    config.area.north = 48.0;
    let sources = MemorySources::new();

    let err = run_pipeline(&config, SourceSet::uniform(&sources), &Transformer::new())
        .await
        .unwrap_err();

    assert!(matches!(err, SeascapeError::InvalidBounds(_)));
    assert_eq!(sources.call_count(), 0);
    assert!(!dir.path().join("output/run_summary.json").exists());
}
