//! Tabular flattener: planar x/y columns, aggregated per coordinate.
//!
//! Rows sharing an exact (x, y) pair are merged: occurrence counts are
//! summed, depths and layer values averaged. Output is sorted by (x, y), so
//! the table does not depend on input order or partitioning.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use seascape_common::{
    BathymetrySample, EnvironmentalSample, Located, Occurrence, PointDataset, SeascapeResult,
};

pub const OCCURRENCE_TABLE: &str = "occurrence_counts.csv";
pub const BATHYMETRY_TABLE: &str = "bathymetry.csv";

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CountRow {
    pub x: f64,
    pub y: f64,
    pub count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DepthRow {
    pub x: f64,
    pub y: f64,
    pub depth: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ValueRow {
    pub x: f64,
    pub y: f64,
    pub value: f64,
}

/// Exact coordinate key; `-0.0` and `0.0` are the same position.
fn key(x: f64, y: f64) -> (u64, u64) {
    let bits = |v: f64| if v == 0.0 { 0.0f64.to_bits() } else { v.to_bits() };
    (bits(x), bits(y))
}

fn sorted<R>(mut rows: Vec<R>, xy: impl Fn(&R) -> (f64, f64)) -> Vec<R> {
    rows.sort_by(|a, b| {
        let (ax, ay) = xy(a);
        let (bx, by) = xy(b);
        ax.total_cmp(&bx).then(ay.total_cmp(&by))
    });
    rows
}

/// Group `items` by position, folding each group with `merge`.
fn aggregate<T, A>(
    items: impl IntoIterator<Item = (f64, f64, T)>,
    init: impl Fn(T) -> A,
    merge: impl Fn(&mut A, T),
) -> Vec<(f64, f64, A)> {
    let mut groups: HashMap<(u64, u64), (f64, f64, A)> = HashMap::new();
    for (x, y, item) in items {
        // Normalize the sign of zero so the output never shows "-0"
        let (x, y) = (x + 0.0, y + 0.0);
        match groups.get_mut(&key(x, y)) {
            Some(group) => merge(&mut group.2, item),
            None => {
                groups.insert(key(x, y), (x, y, init(item)));
            }
        }
    }
    sorted(groups.into_values().collect(), |g| (g.0, g.1))
}

/// Sum individual counts per coordinate. An unobserved count is one.
pub fn flatten_occurrences(dataset: &PointDataset<Occurrence>) -> Vec<CountRow> {
    aggregate(
        dataset.records().iter().map(|r| (r.location.x(), r.location.y(), r.effective_count())),
        |count| count,
        |total, count| *total += count,
    )
    .into_iter()
    .map(|(x, y, count)| CountRow { x, y, count })
    .collect()
}

fn mean_rows(items: impl IntoIterator<Item = (f64, f64, f64)>) -> Vec<(f64, f64, f64)> {
    aggregate(items, |v| (v, 1usize), |acc, v| {
        acc.0 += v;
        acc.1 += 1;
    })
    .into_iter()
    .map(|(x, y, (sum, n))| (x, y, sum / n as f64))
    .collect()
}

/// One depth per coordinate; duplicates are averaged.
pub fn flatten_bathymetry(dataset: &PointDataset<BathymetrySample>) -> Vec<DepthRow> {
    mean_rows(dataset.records().iter().map(|r| (r.location.x(), r.location.y(), r.depth)))
        .into_iter()
        .map(|(x, y, depth)| DepthRow { x, y, depth })
        .collect()
}

/// Values of one layer per coordinate. Missing values are skipped,
/// duplicates averaged.
pub fn flatten_environmental(dataset: &PointDataset<EnvironmentalSample>, layer: &str) -> Vec<ValueRow> {
    mean_rows(dataset.records().iter().filter_map(|r| {
        let p = r.location();
        r.value(layer).map(|v| (p.x(), p.y(), v))
    }))
    .into_iter()
    .map(|(x, y, value)| ValueRow { x, y, value })
    .collect()
}

/// Writes flattened tables as CSV files into one directory.
#[derive(Debug, Clone)]
pub struct TableWriter {
    dir: PathBuf,
}

impl TableWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: output_dir.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn write_counts(&self, rows: &[CountRow]) -> SeascapeResult<PathBuf> {
        self.write(OCCURRENCE_TABLE, rows)
    }

    pub fn write_depths(&self, rows: &[DepthRow]) -> SeascapeResult<PathBuf> {
        self.write(BATHYMETRY_TABLE, rows)
    }

    /// Writes `<layer>.csv`.
    pub fn write_values(&self, layer: &str, rows: &[ValueRow]) -> SeascapeResult<PathBuf> {
        let name: String = layer
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
            .collect();
        self.write(&format!("{name}.csv"), rows)
    }

    fn write<R: Serialize>(&self, file_name: &str, rows: &[R]) -> SeascapeResult<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(file_name);

        let mut writer = csv::Writer::from_path(&path).map_err(std::io::Error::from)?;
        for row in rows {
            writer.serialize(row).map_err(std::io::Error::from)?;
        }
        writer.flush()?;

        info!(path = %path.display(), rows = rows.len(), "Wrote table");
        Ok(path)
    }
}
