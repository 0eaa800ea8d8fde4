//! Signals: typed, bounded-strength evidence
//!
//! A [`Signal`] links one normalized input to one candidate entity. Signals
//! are produced fresh per query by the feeders and never persisted.
//!
//! The signal vocabulary is closed: every [`SignalType`] has a fixed base
//! score, and adding a type means extending the exhaustive match in
//! [`SignalType::base_score`].

use crate::types::EntityId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Kind of evidence a signal carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalType {
    /// Input equals a confirmed alias of the entity
    ExactAlias,
    /// Distinctive token matches exactly one entity
    AnchorUnique,
    /// Distinctive token matches several entities
    AnchorGeneric,
    /// Name similarity >= 0.85
    FuzzyStrong,
    /// Name similarity >= 0.70
    FuzzyMedium,
    /// Name similarity >= 0.55
    FuzzyWeak,
    /// Selected 5 or more times for similar input
    HistoricalFrequent,
    /// Selected fewer than 5 times for similar input
    HistoricalOccasional,
}

impl SignalType {
    /// All signal types, strongest base score first
    pub const ALL: [SignalType; 8] = [
        SignalType::ExactAlias,
        SignalType::AnchorUnique,
        SignalType::FuzzyStrong,
        SignalType::AnchorGeneric,
        SignalType::FuzzyMedium,
        SignalType::HistoricalFrequent,
        SignalType::FuzzyWeak,
        SignalType::HistoricalOccasional,
    ];

    /// Fixed base score used when this signal is the primary signal
    pub fn base_score(&self) -> i32 {
        match self {
            SignalType::ExactAlias => 100,
            SignalType::AnchorUnique => 90,
            SignalType::FuzzyStrong => 85,
            SignalType::AnchorGeneric => 75,
            SignalType::FuzzyMedium => 70,
            SignalType::HistoricalFrequent => 60,
            SignalType::FuzzyWeak => 55,
            SignalType::HistoricalOccasional => 45,
        }
    }

    /// Whether the raw strength is a name-similarity value
    pub fn is_fuzzy(&self) -> bool {
        matches!(
            self,
            SignalType::FuzzyStrong | SignalType::FuzzyMedium | SignalType::FuzzyWeak
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SignalType::ExactAlias => "exact_alias",
            SignalType::AnchorUnique => "anchor_unique",
            SignalType::AnchorGeneric => "anchor_generic",
            SignalType::FuzzyStrong => "fuzzy_strong",
            SignalType::FuzzyMedium => "fuzzy_medium",
            SignalType::FuzzyWeak => "fuzzy_weak",
            SignalType::HistoricalFrequent => "historical_frequent",
            SignalType::HistoricalOccasional => "historical_occasional",
        }
    }
}

impl fmt::Display for SignalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignalType {
    type Err = SignalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SignalType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| SignalError::UnknownType(s.to_string()))
    }
}

/// Signal construction error
///
/// Indicates a feeder bug, not a runtime condition to tolerate.
#[derive(Debug, Error, PartialEq)]
pub enum SignalError {
    /// Raw strength outside [0, 1] or not finite
    #[error("Signal strength out of range for entity {entity_id}: {strength}")]
    StrengthOutOfRange { entity_id: EntityId, strength: f64 },

    /// Signal type name outside the vocabulary
    #[error("Unknown signal type: {0}")]
    UnknownType(String),
}

/// One piece of evidence linking an input to a candidate entity
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Signal {
    entity_id: EntityId,
    signal_type: SignalType,
    raw_strength: f64,
    metadata: HashMap<String, serde_json::Value>,
}

impl Signal {
    /// Create a signal, rejecting strengths outside [0, 1]
    pub fn new(
        entity_id: EntityId,
        signal_type: SignalType,
        raw_strength: f64,
    ) -> Result<Self, SignalError> {
        if !raw_strength.is_finite() || !(0.0..=1.0).contains(&raw_strength) {
            return Err(SignalError::StrengthOutOfRange {
                entity_id,
                strength: raw_strength,
            });
        }

        Ok(Self {
            entity_id,
            signal_type,
            raw_strength,
            metadata: HashMap::new(),
        })
    }

    /// Attach a metadata entry
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn entity_id(&self) -> EntityId {
        self.entity_id
    }

    pub fn signal_type(&self) -> SignalType {
        self.signal_type
    }

    pub fn raw_strength(&self) -> f64 {
        self.raw_strength
    }

    pub fn metadata(&self) -> &HashMap<String, serde_json::Value> {
        &self.metadata
    }
}
