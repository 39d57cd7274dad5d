//! Map projections and CRS-to-CRS transforms.
//!
//! Quebec Lambert (EPSG:32198) is an ellipsoidal Lambert Conformal Conic on
//! GRS80; Web Mercator is spherical. Every transform passes through
//! geographic lon/lat.

pub mod lambert;
pub mod mercator;
pub mod transform;

pub use lambert::LambertConformal;
pub use mercator::WebMercator;
pub use transform::{Projection, ProjectionError, Transformer};
