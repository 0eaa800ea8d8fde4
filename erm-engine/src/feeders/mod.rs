//! Signal Feeders
//!
//! Each feeder turns a normalized input into raw, typed, bounded-strength
//! evidence from exactly one source. Feeders never rank, never apply
//! business policy and never see each other's output.
//!
//! # Feeders (4 total)
//! 1. [`AliasFeeder`] - confirmed-alias lookup
//! 2. [`AnchorFeeder`] - distinctive token (anchor) lookup
//! 3. [`FuzzyFeeder`] - normalized edit-distance similarity
//! 4. [`HistoricalFeeder`] - prior selection frequency
//!
//! # Silence
//! A feeder without sufficient evidence returns an empty list rather than
//! low-strength noise.

mod alias;
mod anchor;
mod fuzzy;
mod historical;

pub use alias::AliasFeeder;
pub use anchor::{AnchorFeeder, AnchorRules};
pub use fuzzy::{classify_similarity, FuzzyFeeder, FUZZY_FLOOR};
pub use historical::{historical_strength, HistoricalFeeder, FREQUENT_SELECTION_COUNT};

use crate::signal::{Signal, SignalError};
use async_trait::async_trait;
use thiserror::Error;

/// Feeder error
///
/// The engine treats any feeder error as "no signals" from that feeder.
#[derive(Debug, Error)]
pub enum FeederError {
    /// Registry or history lookup failed
    #[error("Lookup failed: {0}")]
    Lookup(#[from] erm_common::Error),

    /// Feeder built an invalid signal
    #[error("Invalid signal: {0}")]
    Signal(#[from] SignalError),

    /// Internal processing error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Evidence source for one normalized input
#[async_trait]
pub trait SignalFeeder: Send + Sync {
    /// Feeder name for logging
    fn name(&self) -> &'static str;

    /// Signals for a normalized input
    ///
    /// # Errors
    /// Returns `FeederError` if lookups fail or a signal is malformed
    async fn get_signals(&self, normalized_input: &str) -> Result<Vec<Signal>, FeederError>;
}
