//! Marine study-area pipeline.
//!
//! Builds a projected area of interest, clips a country basemap to it, loads
//! occurrence, bathymetry and environmental points into the same CRS, and
//! flattens everything into CSV tables and GeoJSON files.

pub mod area;
pub mod basemap;
pub mod config;
pub mod flatten;
pub mod geojson_out;
pub mod ops;
pub mod points;
pub mod run;

pub use area::AreaOfInterest;
pub use basemap::{buffered_area, load_basemap, Basemap, BasemapRequest};
pub use config::PipelineConfig;
pub use flatten::{
    flatten_bathymetry, flatten_environmental, flatten_occurrences, CountRow, DepthRow, TableWriter,
    ValueRow,
};
pub use geojson_out::GeoJsonWriter;
pub use ops::{buffer_polygon, clip, PointMask};
pub use points::{
    load_bathymetry, load_environmental, load_occurrences, mask_points, DatasetKind, LoadReport,
    Loaded, OccurrenceFilter,
};
pub use run::{run_pipeline, RunSummary, SourceSet, Step, StepOutcome, StepStatus};
