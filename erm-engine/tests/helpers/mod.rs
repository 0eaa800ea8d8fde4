//! Test Helper Utilities
//!
//! Shared fixtures and log capture for erm-engine integration tests

#![allow(dead_code)]

pub mod fixtures;
pub mod log_capture;

pub use fixtures::{
    default_settings, engine, legacy, sample_history, sample_registry, ScriptedCandidate,
};
pub use log_capture::{capture_logs, LogCapture};
