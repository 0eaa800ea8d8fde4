//! # ERM Common Library
//!
//! Shared code for the ERM entity-resolution crates including:
//! - Common error type
//! - Bootstrap TOML configuration and atomic file writes
//! - Runtime engine settings (reloadable without restart)
//! - SQLite pool initialization

pub mod config;
pub mod db;
pub mod error;
pub mod settings;

pub use error::{Error, Result};
pub use settings::{EngineSettings, SettingsHandle, SettingsSource};
