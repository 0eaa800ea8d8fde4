//! Read-only collaborators: candidate registry and decision history
//!
//! Both the engine and the legacy path consume the canonical registry and the
//! decision history only through these traits. Storage is owned elsewhere.
//!
//! # Implementations
//! - [`InMemoryRegistry`] / [`InMemoryFeedbackHistory`]: fixtures and embedded use
//! - [`SqliteRegistry`] / [`SqliteFeedbackHistory`]: standard SQLite table layout

mod memory;
mod sqlite;

pub use memory::{InMemoryFeedbackHistory, InMemoryRegistry};
pub use sqlite::{init_registry_tables, SqliteFeedbackHistory, SqliteRegistry};

use crate::types::{CandidateEntity, EntityId, FeedbackCounters};
use async_trait::async_trait;
use erm_common::Result;
use std::collections::HashMap;

/// Kind of a recorded decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Decision {
    /// User confirmed the entity for this exact input
    Confirmed,
    /// User rejected the entity for this exact input
    Rejected,
    /// User picked the entity from a suggestion list
    Selected,
}

impl Decision {
    pub const ALL: [Decision; 3] = [Decision::Confirmed, Decision::Rejected, Decision::Selected];

    /// Stored column value
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Confirmed => "confirmed",
            Decision::Rejected => "rejected",
            Decision::Selected => "selected",
        }
    }
}

/// Canonical entity registry lookups
#[async_trait]
pub trait CandidateRegistry: Send + Sync {
    /// All known candidate entities with their normalized names
    async fn all_candidates(&self) -> Result<Vec<CandidateEntity>>;

    /// Single entity by id
    async fn get(&self, id: EntityId) -> Result<Option<CandidateEntity>>;

    /// Entities whose confirmed alias equals the normalized input
    async fn confirmed_aliases(&self, normalized_input: &str) -> Result<Vec<EntityId>>;
}

/// Decision history lookups, keyed by normalized input
///
/// All methods return `(entity_id, count)` pairs with `count > 0`.
#[async_trait]
pub trait FeedbackHistory: Send + Sync {
    /// Confirmations recorded for exactly this normalized input
    async fn confirmations(&self, normalized_input: &str) -> Result<Vec<(EntityId, u32)>>;

    /// Rejections recorded for exactly this normalized input
    async fn rejections(&self, normalized_input: &str) -> Result<Vec<(EntityId, u32)>>;

    /// Selections recorded for inputs that contain, or are contained in, this input
    async fn historical_selections(&self, normalized_input: &str) -> Result<Vec<(EntityId, u32)>>;
}

/// Merge confirmation and rejection counts per entity
pub async fn feedback_counters(
    history: &dyn FeedbackHistory,
    normalized_input: &str,
) -> Result<HashMap<EntityId, FeedbackCounters>> {
    let mut counters: HashMap<EntityId, FeedbackCounters> = HashMap::new();

    for (entity_id, count) in history.confirmations(normalized_input).await? {
        counters.entry(entity_id).or_default().confirmations += count;
    }
    for (entity_id, count) in history.rejections(normalized_input).await? {
        counters.entry(entity_id).or_default().rejections += count;
    }

    Ok(counters)
}

/// Containment match used for historical selections
pub(crate) fn inputs_overlap(stored: &str, query: &str) -> bool {
    !stored.is_empty() && !query.is_empty() && (stored.contains(query) || query.contains(stored))
}
