//! Configuration and local storage for pr-review
//!
//! This crate provides:
//! - Config and cache directory paths
//! - Configuration file loading (TOML)
//! - Application configuration (AppConfig)
//! - Best-effort local key-value storage for review session slices

pub mod app_config;
pub mod config_file;
pub mod paths;
pub mod storage;

pub use app_config::{AppConfig, DiffViewModeSetting};
pub use config_file::load_config_file;
pub use paths::{cache_dir, config_dir, storage_dir};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
