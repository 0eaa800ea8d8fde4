//! erm-engine library interface
//!
//! Resolves free-text supplier and bank names against a canonical registry.
//!
//! # Architecture
//! - **Signals:** typed, bounded-strength evidence ([`signal`])
//! - **Feeders:** one evidence source each ([`feeders`])
//! - **Calculator:** unified score and tier ([`calculator`])
//! - **Engine:** fan-out, scoring and ranking ([`engine`])
//! - **Legacy:** the previous scoring path, still the system of record ([`legacy`])
//! - **Shadow:** dual-run harness and comparison telemetry ([`shadow`])

pub mod calculator;
pub mod engine;
pub mod feeders;
pub mod legacy;
pub mod normalize;
pub mod registry;
pub mod shadow;
pub mod signal;
pub mod types;

pub use crate::calculator::{assign_tier, calculate};
pub use crate::engine::ConfidenceEngine;
pub use crate::legacy::LegacySuggestionService;
pub use crate::normalize::normalize;
pub use crate::shadow::{ComparisonLogger, ComparisonResult, RunSummary, ShadowExecutor};
pub use crate::signal::{Signal, SignalType};
pub use crate::types::{CandidateSuggestion, EntityId, Tier};
