//! On-disk cache for downloaded environmental layers.
//!
//! Files are named `{layer}_{bbox}_s{stride}.csv` under the configured cache
//! directory. Writes go through a `.partial` file and a rename so an
//! interrupted run never leaves a truncated entry behind.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, info};

use crate::source::GridQuery;

#[derive(Debug, Clone)]
pub struct LayerCache {
    dir: PathBuf,
}

impl LayerCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Cache file for `layer` over the query extent and stride.
    pub fn path_for(&self, layer: &str, query: &GridQuery) -> PathBuf {
        let safe: String = layer
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
            .collect();
        self.dir.join(format!(
            "{}_{}_s{}.csv",
            safe,
            query.bounds.to_bounding_box().cache_key(),
            query.stride
        ))
    }

    /// Cached body, if present.
    pub async fn load(&self, layer: &str, query: &GridQuery) -> std::io::Result<Option<String>> {
        let path = self.path_for(layer, query);
        match fs::read_to_string(&path).await {
            Ok(body) => {
                debug!(path = %path.display(), "Layer cache hit");
                Ok(Some(body))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Persist a downloaded body.
    pub async fn store(&self, layer: &str, query: &GridQuery, body: &str) -> std::io::Result<PathBuf> {
        fs::create_dir_all(&self.dir).await?;

        let final_path = self.path_for(layer, query);
        let temp_path = final_path.with_extension("csv.partial");
        fs::write(&temp_path, body).await?;
        fs::rename(&temp_path, &final_path).await?;

        info!(path = %final_path.display(), bytes = body.len(), "Cached layer");
        Ok(final_path)
    }
}
