//! Core types shared by the engine, the legacy path and the shadow harness

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// ============================================================================
// Registry Types
// ============================================================================

/// Canonical entity identifier in the registry
pub type EntityId = i64;

/// Kind of canonical entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Supplier,
    Bank,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Supplier => "supplier",
            EntityKind::Bank => "bank",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "supplier" => Some(EntityKind::Supplier),
            "bank" => Some(EntityKind::Bank),
            _ => None,
        }
    }
}

/// Candidate entity as known to the registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateEntity {
    pub id: EntityId,
    pub kind: EntityKind,
    /// Name shown to users
    pub display_name: String,
    /// Name after [`crate::normalize::normalize`]
    pub normalized_name: String,
}

impl CandidateEntity {
    /// Create a candidate, deriving the normalized name from the display name
    pub fn new(id: EntityId, kind: EntityKind, display_name: impl Into<String>) -> Self {
        let display_name = display_name.into();
        let normalized_name = crate::normalize::normalize(&display_name);
        Self {
            id,
            kind,
            display_name,
            normalized_name,
        }
    }
}

/// Decision-history counters for one (normalized input, entity) pair
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackCounters {
    pub confirmations: u32,
    pub rejections: u32,
}

// ============================================================================
// Suggestion Types
// ============================================================================

/// Discrete trust bucket derived from a confidence score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tier {
    /// High confidence (>= 85)
    B,
    /// Medium confidence (review threshold up to 84)
    C,
    /// Low confidence (below review threshold)
    D,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::B => write!(f, "B"),
            Tier::C => write!(f, "C"),
            Tier::D => write!(f, "D"),
        }
    }
}

/// One ranked suggestion returned to the caller
///
/// Built once per query response and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateSuggestion {
    pub entity_id: EntityId,
    pub display_name: String,
    /// Confidence score (0-100)
    pub confidence: u8,
    pub tier: Tier,
    /// Human-readable explanation, never empty
    pub reason_text: String,
    pub confirmation_count: u32,
    pub rejection_count: u32,
}

/// Sort suggestions by descending confidence, keeping input order for ties
pub fn sort_by_confidence(suggestions: &mut [CandidateSuggestion]) {
    suggestions.sort_by(|a, b| b.confidence.cmp(&a.confidence));
}

// ============================================================================
// Engine Errors
// ============================================================================

/// Failure of the new engine path as a whole
///
/// Individual lookup failures degrade to missing evidence instead. This is
/// raised only when no evidence source could run at all, so the shadow
/// harness counts it as an engine-side error rather than an empty answer.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Every configured feeder failed or panicked
    #[error("All {failed} feeders failed")]
    AllFeedersFailed { failed: usize },
}
