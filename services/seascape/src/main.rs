//! Marine study-area builder.
//!
//! Reads a YAML config, then:
//! - Builds the area of interest in the target CRS
//! - Clips a Natural Earth country outline to the buffered area
//! - Loads OBIS occurrences, ETOPO bathymetry and Bio-ORACLE layers
//! - Writes CSV tables, GeoJSON files and a run summary
//!
//! With `--offline` the same steps run against deterministic in-memory data.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use pipeline::{run_pipeline, PipelineConfig, RunSummary, SourceSet};
use projection::Transformer;
use seascape_common::YearFilter;
use sources::{
    FetchSession, GriddapClient, GriddapEnvironmentalSource, LayerCache, MemorySources,
    NaturalEarthClient, ObisClient,
};

#[derive(Parser, Debug)]
#[command(name = "seascape")]
#[command(about = "Build a marine study area from public ocean data services")]
struct Args {
    /// Pipeline configuration file
    #[arg(short, long, env = "SEASCAPE_CONFIG", default_value = "config/st_lawrence.yaml")]
    config: PathBuf,

    /// Override the output directory
    #[arg(long, env = "SEASCAPE_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Override the environmental layer cache directory
    #[arg(long, env = "SEASCAPE_CACHE_DIR")]
    cache_dir: Option<PathBuf>,

    /// Restrict occurrences to one calendar year
    #[arg(long)]
    year: Option<i32>,

    /// Use synthetic in-memory data instead of the remote services
    #[arg(long)]
    offline: bool,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

impl Args {
    /// Fold command-line overrides into `config` and re-validate it.
    fn apply(&self, mut config: PipelineConfig) -> Result<PipelineConfig> {
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(dir) = &self.cache_dir {
            config.cache_dir = dir.clone();
        }
        if let Some(year) = self.year {
            config.occurrence.year = Some(YearFilter::new(year)?);
        }
        config.validate()?;
        Ok(config)
    }
}

fn init_tracing(log_level: &str, json: bool) -> Result<()> {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let builder = FmtSubscriber::builder().with_max_level(level).with_target(true);
    if json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}

async fn run_live(config: &PipelineConfig, transformer: &Transformer) -> Result<RunSummary> {
    let session = FetchSession::open(&config.http)?;
    let endpoints = &config.endpoints;

    let obis = ObisClient::new(&session, endpoints.obis.as_str()).with_page_size(config.occurrence.page_size);
    let etopo = GriddapClient::new(&session, endpoints.erddap.as_str());
    let bio_oracle = GriddapEnvironmentalSource::new(
        GriddapClient::new(&session, endpoints.bio_oracle_erddap.as_str()),
        LayerCache::new(config.cache_dir.clone()),
    );
    let natural_earth = NaturalEarthClient::new(&session, endpoints.natural_earth.as_str());

    let sources = SourceSet {
        occurrences: &obis,
        bathymetry: &etopo,
        environmental: &bio_oracle,
        basemap: &natural_earth,
    };
    let summary = run_pipeline(config, sources, transformer).await?;
    info!(requests = session.request_count(), "Remote services done");
    Ok(summary)
}

async fn run_offline(config: &PipelineConfig, transformer: &Transformer) -> Result<RunSummary> {
    let sources = MemorySources::synthetic(&config.area.bounds()?);
    let summary = run_pipeline(config, SourceSet::uniform(&sources), transformer).await?;
    Ok(summary)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_tracing(&args.log_level, args.json_logs)?;

    let config = PipelineConfig::load(&args.config)?;
    let config = args.apply(config).context("Invalid command-line overrides")?;

    info!(
        config = %args.config.display(),
        offline = args.offline,
        target_crs = %config.area.target_crs,
        "Starting seascape"
    );

    let transformer = Transformer::new();
    let summary = if args.offline {
        run_offline(&config, &transformer).await?
    } else {
        run_live(&config, &transformer).await?
    };

    println!("{}", serde_json::to_string_pretty(&summary)?);

    let failed = summary.failed_steps();
    if !failed.is_empty() {
        warn!(?failed, "Some steps failed");
        std::process::exit(1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"
area:
  north: 49.6
  south: 49.2
  east: -66.0
  west: -66.8
basemap:
  country: Canada
"#;

    #[test]
    fn test_overrides_applied() {
        let args = Args::try_parse_from([
            "seascape",
            "--output-dir",
            "/tmp/out",
            "--cache-dir",
            "/tmp/cache",
            "--year",
            "2019",
        ])
        .unwrap();
        let config = args.apply(PipelineConfig::from_yaml(CONFIG).unwrap()).unwrap();
        assert_eq!(config.output_dir, PathBuf::from("/tmp/out"));
        assert_eq!(config.cache_dir, PathBuf::from("/tmp/cache"));
        assert_eq!(config.occurrence.year.map(|y| y.year()), Some(2019));
    }

    #[test]
    fn test_bad_year_rejected() {
        let args = Args::try_parse_from(["seascape", "--year", "99999"]).unwrap();
        assert!(args.apply(PipelineConfig::from_yaml(CONFIG).unwrap()).is_err());
    }

    #[tokio::test]
    async fn test_offline_run() {
        let dir = tempfile::tempdir().unwrap();
        let args = Args::try_parse_from(["seascape", "--offline"]).unwrap();
        let mut config = args.apply(PipelineConfig::from_yaml(CONFIG).unwrap()).unwrap();
        config.output_dir = dir.path().to_path_buf();

        let summary = run_offline(&config, &Transformer::new()).await.unwrap();
        assert!(summary.is_success(), "failed: {:?}", summary.failed_steps());
        assert!(dir.path().join("run_summary.json").is_file());
    }
}
