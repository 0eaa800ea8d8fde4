//! In-memory registry and decision history

use super::{inputs_overlap, CandidateRegistry, Decision, FeedbackHistory};
use crate::normalize::normalize;
use crate::types::{CandidateEntity, EntityId};
use async_trait::async_trait;
use erm_common::Result;
use std::collections::{BTreeMap, HashMap};

/// Registry held in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryRegistry {
    candidates: Vec<CandidateEntity>,
    aliases: HashMap<String, Vec<EntityId>>,
}

impl InMemoryRegistry {
    pub fn new(candidates: Vec<CandidateEntity>) -> Self {
        Self {
            candidates,
            aliases: HashMap::new(),
        }
    }

    /// Register a confirmed alias (normalized on insert)
    pub fn with_alias(mut self, alias: &str, entity_id: EntityId) -> Self {
        let ids = self.aliases.entry(normalize(alias)).or_default();
        if !ids.contains(&entity_id) {
            ids.push(entity_id);
        }
        self
    }
}

#[async_trait]
impl CandidateRegistry for InMemoryRegistry {
    async fn all_candidates(&self) -> Result<Vec<CandidateEntity>> {
        Ok(self.candidates.clone())
    }

    async fn get(&self, id: EntityId) -> Result<Option<CandidateEntity>> {
        Ok(self.candidates.iter().find(|c| c.id == id).cloned())
    }

    async fn confirmed_aliases(&self, normalized_input: &str) -> Result<Vec<EntityId>> {
        Ok(self.aliases.get(normalized_input).cloned().unwrap_or_default())
    }
}

#[derive(Debug, Clone)]
struct DecisionRecord {
    normalized_input: String,
    entity_id: EntityId,
    decision: Decision,
    count: u32,
}

/// Decision history held in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryFeedbackHistory {
    records: Vec<DecisionRecord>,
}

impl InMemoryFeedbackHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_confirmations(self, input: &str, entity_id: EntityId, count: u32) -> Self {
        self.with_record(input, entity_id, Decision::Confirmed, count)
    }

    pub fn with_rejections(self, input: &str, entity_id: EntityId, count: u32) -> Self {
        self.with_record(input, entity_id, Decision::Rejected, count)
    }

    pub fn with_selections(self, input: &str, entity_id: EntityId, count: u32) -> Self {
        self.with_record(input, entity_id, Decision::Selected, count)
    }

    fn with_record(mut self, input: &str, entity_id: EntityId, decision: Decision, count: u32) -> Self {
        if count > 0 {
            self.records.push(DecisionRecord {
                normalized_input: normalize(input),
                entity_id,
                decision,
                count,
            });
        }
        self
    }

    fn sum_where(
        &self,
        decision: Decision,
        matches: impl Fn(&str) -> bool,
    ) -> Vec<(EntityId, u32)> {
        let mut totals: BTreeMap<EntityId, u32> = BTreeMap::new();
        for record in &self.records {
            if record.decision == decision && matches(&record.normalized_input) {
                *totals.entry(record.entity_id).or_default() += record.count;
            }
        }
        totals.into_iter().collect()
    }
}

#[async_trait]
impl FeedbackHistory for InMemoryFeedbackHistory {
    async fn confirmations(&self, normalized_input: &str) -> Result<Vec<(EntityId, u32)>> {
        Ok(self.sum_where(Decision::Confirmed, |stored| stored == normalized_input))
    }

    async fn rejections(&self, normalized_input: &str) -> Result<Vec<(EntityId, u32)>> {
        Ok(self.sum_where(Decision::Rejected, |stored| stored == normalized_input))
    }

    async fn historical_selections(&self, normalized_input: &str) -> Result<Vec<(EntityId, u32)>> {
        Ok(self.sum_where(Decision::Selected, |stored| {
            inputs_overlap(stored, normalized_input)
        }))
    }
}
