//! Application configuration
//!
//! Configuration loaded from .pr-review.toml.

use serde::{Deserialize, Serialize};

/// Preferred diff layout when no per-user preference has been stored yet
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffViewModeSetting {
    #[default]
    Unified,
    Split,
}

/// Application configuration loaded from .pr-review.toml
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    /// Maximum number of parsed diffs kept in the process-wide cache
    #[serde(default = "default_diff_cache_capacity")]
    pub diff_cache_capacity: usize,

    /// Number of neighbouring files (each direction) prefetched after a file is opened
    #[serde(default = "default_prefetch_radius")]
    pub prefetch_radius: usize,

    /// Rows moved by a page jump
    #[serde(default = "default_page_jump")]
    pub page_jump: usize,

    /// syntect theme used for content segments
    #[serde(default = "default_syntax_theme")]
    pub syntax_theme: String,

    /// Diff layout used until the user picks one
    #[serde(default)]
    pub default_diff_view_mode: DiffViewModeSetting,

    /// Fetch full old/new file contents so trailing skip blocks can be computed
    #[serde(default = "default_fetch_full_content")]
    pub fetch_full_content: bool,
}

fn default_diff_cache_capacity() -> usize {
    50
}

fn default_prefetch_radius() -> usize {
    2
}

fn default_page_jump() -> usize {
    20
}

fn default_syntax_theme() -> String {
    "base16-ocean.dark".to_string()
}

fn default_fetch_full_content() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            diff_cache_capacity: default_diff_cache_capacity(),
            prefetch_radius: default_prefetch_radius(),
            page_jump: default_page_jump(),
            syntax_theme: default_syntax_theme(),
            default_diff_view_mode: DiffViewModeSetting::default(),
            fetch_full_content: default_fetch_full_content(),
        }
    }
}

impl AppConfig {
    /// Load config from CWD first, then home directory, or use defaults
    pub fn load() -> Self {
        if let Some(content) = crate::load_config_file() {
            match Self::parse(&content) {
                Ok(config) => {
                    log::info!("Loaded app config from file");
                    return config;
                }
                Err(e) => {
                    log::warn!("Failed to parse config file: {}", e);
                }
            }
        }

        log::debug!("Using default app config");
        Self::default()
    }

    /// Parse config from TOML text. A zero cache capacity is bumped to one so
    /// the displayed diff always has a slot.
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        let mut config: AppConfig = toml::from_str(content)?;
        if config.diff_cache_capacity == 0 {
            config.diff_cache_capacity = 1;
        }
        Ok(config)
    }
}
