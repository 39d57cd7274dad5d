//! Fixtures and helpers shared by the seascape test suites.
//!
//! - [`fixtures`]: the St. Lawrence study area, layer codes, canned payloads
//! - [`generators`]: deterministic grids, occurrences and a coastline
//! - [`paths`]: workspace-relative locations such as `config/`
//!
//! Pull it in as a dev-dependency:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```

pub mod fixtures;
pub mod generators;
pub mod paths;

pub use fixtures::*;
pub use generators::*;
pub use paths::*;

/// Assert that two numbers differ by at most `tol`.
///
/// ```ignore
/// use test_utils::assert_approx_eq;
///
/// assert_approx_eq!(70_494.2, 70_494.17, 0.1);
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($actual:expr, $expected:expr, $tol:expr) => {{
        let (actual, expected, tol) = ($actual as f64, $expected as f64, $tol as f64);
        assert!(
            (actual - expected).abs() <= tol,
            "{} = {actual} is not within {tol} of {expected}",
            stringify!($actual),
        );
    }};
}

/// Assert that two `(x, y)` pairs agree on both axes within `tol`.
#[macro_export]
macro_rules! assert_coords_approx_eq {
    (($x1:expr, $y1:expr), ($x2:expr, $y2:expr), $tol:expr) => {{
        $crate::assert_approx_eq!($x1, $x2, $tol);
        $crate::assert_approx_eq!($y1, $y2, $tol);
    }};
}
