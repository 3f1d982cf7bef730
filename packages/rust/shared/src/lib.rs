//! Shared types, error model, and configuration for towermap.
//!
//! This crate is the foundation depended on by all other towermap crates.
//! It provides:
//! - [`TowerMapError`] — the unified error type
//! - Domain types ([`TowerRecord`], [`Operator`], [`ResolvedLocation`])
//! - Configuration ([`AppConfig`], [`LookupSettings`], [`MapSettings`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DefaultsConfig, LookupConfig, LookupSettings, MapConfig, MapSettings, config_dir,
    config_file_path, init_config, load_config, load_config_from,
};
pub use error::{Result, TowerMapError};
pub use types::{IRAN_MCC, Operator, ResolvedLocation, TowerRecord};
