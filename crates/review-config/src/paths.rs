//! Configuration and data directory paths
//!
//! Uses platform directories via `dirs` crate.
//!
//! Platform-specific locations:
//! - Linux: `~/.config/pr-review/`, `~/.cache/pr-review/`
//! - macOS: `~/Library/Application Support/pr-review/`, `~/Library/Caches/pr-review/`
//! - Windows: `%APPDATA%\pr-review\`, `%LOCALAPPDATA%\pr-review\`

use anyhow::{Context, Result};
use std::path::PathBuf;

const APP_NAME: &str = "pr-review";

/// Get the application config directory
pub fn config_dir() -> Result<PathBuf> {
    let base = dirs::config_dir().context("Could not determine config directory")?;
    let dir = base.join(APP_NAME);
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Get the application cache directory
pub fn cache_dir() -> Result<PathBuf> {
    let base = dirs::cache_dir().context("Could not determine cache directory")?;
    let dir = base.join(APP_NAME);
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Directory holding persisted review session slices (viewed files, drafts)
pub fn storage_dir() -> Result<PathBuf> {
    let dir = cache_dir()?.join("storage");
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Get path to app config file
pub fn app_config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}
