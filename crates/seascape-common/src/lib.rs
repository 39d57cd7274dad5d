//! Common types shared across the seascape crates.

pub mod bbox;
pub mod crs;
pub mod error;
pub mod georef;
pub mod grid;
pub mod records;
pub mod time;

pub use bbox::{BoundingBox, GeoBounds};
pub use crs::CrsCode;
pub use error::{ErrorCategory, RemoteError, SeascapeError, SeascapeResult};
pub use georef::Georeferenced;
pub use grid::{GridCell, GridSpec};
pub use records::{
    BathymetrySample, EnvironmentalSample, Located, Occurrence, PointDataset, RawOccurrence,
};
pub use time::YearFilter;
