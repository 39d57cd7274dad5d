//! Workspace-relative paths.

use std::path::{Path, PathBuf};

/// The workspace root, two levels above this crate's manifest.
pub fn workspace_root() -> PathBuf {
    let manifest = Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest
        .ancestors()
        .nth(2)
        .unwrap_or(manifest)
        .to_path_buf()
}

/// The `config/` directory holding sample pipeline configs.
pub fn config_dir() -> PathBuf {
    workspace_root().join("config")
}
