//! Clients for the remote services the pipeline pulls data from.
//!
//! Each data kind sits behind an async trait so the pipeline can run against
//! live services or the in-memory [`memory::MemorySources`]:
//!
//! - [`OccurrenceSource`]: species occurrence records (OBIS)
//! - [`BathymetrySource`]: gridded depth (ERDDAP griddap, ETOPO)
//! - [`EnvironmentalSource`]: environmental layers (ERDDAP griddap, Bio-ORACLE)
//! - [`BasemapSource`]: country outlines (Natural Earth GeoJSON)

pub mod cache;
pub mod catalog;
pub mod environmental;
pub mod fetch;
pub mod griddap;
pub mod memory;
pub mod natural_earth;
pub mod obis;
pub mod source;

pub use cache::LayerCache;
pub use catalog::{DatasetCode, EnvironmentalCatalog, LayerDescriptor};
pub use environmental::GriddapEnvironmentalSource;
pub use fetch::{FetchSession, HttpConfig};
pub use griddap::GriddapClient;
pub use memory::MemorySources;
pub use natural_earth::NaturalEarthClient;
pub use obis::ObisClient;
pub use source::{
    BasemapScale, BasemapSource, BathymetrySource, EnvironmentalSource, GridQuery,
    OccurrenceQuery, OccurrenceSource,
};
