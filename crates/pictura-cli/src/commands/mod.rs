pub mod compress;
pub mod config;
pub mod crop;
pub mod history;
pub mod upload;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use pictura_core::config::PicturaConfig;
use pictura_core::consts::CALLER_ID_FILE;
use pictura_core::library::CallerId;

/// Load the config file if one was given, defaults otherwise.
pub fn load_config(path: Option<&Path>) -> Result<PicturaConfig> {
    match path {
        Some(path) => PicturaConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(PicturaConfig::default()),
    }
}

/// Caller token from `identity`, or from the library root when not given.
pub async fn caller_id(identity: Option<&Path>, config: &PicturaConfig) -> Result<CallerId> {
    let path = identity
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config.library.root.join(CALLER_ID_FILE));
    CallerId::load_or_create(&path)
        .await
        .with_context(|| format!("Failed to read caller identity {}", path.display()))
}

/// Directory to write results into: `dir` if given, else next to `source`.
pub fn output_dir(dir: Option<&Path>, source: &Path) -> PathBuf {
    match dir {
        Some(dir) => dir.to_path_buf(),
        None => source
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."))
            .to_path_buf(),
    }
}
