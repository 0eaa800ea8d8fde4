//! Comparison of one dual-run request
//!
//! A [`ComparisonResult`] is built once per shadow-executed request and never
//! mutated. Metrics are derived on demand by [`ComparisonResult::metrics`].

use crate::normalize::normalize;
use crate::types::{CandidateSuggestion, EntityId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use uuid::Uuid;

/// Outputs of both paths for one input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub comparison_id: Uuid,
    pub input_raw: String,
    pub input_normalized: String,
    pub legacy_suggestions: Vec<CandidateSuggestion>,
    pub new_suggestions: Vec<CandidateSuggestion>,
    pub legacy_latency_ms: f64,
    pub new_latency_ms: f64,
    pub timestamp: DateTime<Utc>,
}

/// Metrics derived from a [`ComparisonResult`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonMetrics {
    /// Percentage (0-100) of legacy entities also found by the new engine
    pub coverage: f64,
    /// Found by legacy, missed by the new engine (ascending ids)
    pub missed_entities: Vec<EntityId>,
    /// Found only by the new engine (ascending ids)
    pub new_discoveries: Vec<EntityId>,
    /// Mean absolute confidence difference over shared entities
    pub confidence_divergence: Option<f64>,
    /// `new_latency_ms - legacy_latency_ms`
    pub performance_delta_ms: f64,
}

impl ComparisonResult {
    pub fn new(
        input_raw: impl Into<String>,
        legacy_suggestions: Vec<CandidateSuggestion>,
        new_suggestions: Vec<CandidateSuggestion>,
        legacy_latency_ms: f64,
        new_latency_ms: f64,
    ) -> Self {
        let input_raw = input_raw.into();
        Self {
            comparison_id: Uuid::new_v4(),
            input_normalized: normalize(&input_raw),
            input_raw,
            legacy_suggestions,
            new_suggestions,
            legacy_latency_ms,
            new_latency_ms,
            timestamp: Utc::now(),
        }
    }

    pub fn metrics(&self) -> ComparisonMetrics {
        let legacy_ids: BTreeSet<EntityId> =
            self.legacy_suggestions.iter().map(|s| s.entity_id).collect();
        let new_ids: BTreeSet<EntityId> =
            self.new_suggestions.iter().map(|s| s.entity_id).collect();

        let shared = legacy_ids.intersection(&new_ids).count();
        let coverage = if legacy_ids.is_empty() {
            100.0
        } else {
            shared as f64 / legacy_ids.len() as f64 * 100.0
        };

        ComparisonMetrics {
            coverage,
            missed_entities: legacy_ids.difference(&new_ids).copied().collect(),
            new_discoveries: new_ids.difference(&legacy_ids).copied().collect(),
            confidence_divergence: self.confidence_divergence(),
            performance_delta_ms: self.new_latency_ms - self.legacy_latency_ms,
        }
    }

    fn confidence_divergence(&self) -> Option<f64> {
        let new_confidence: HashMap<EntityId, u8> = self
            .new_suggestions
            .iter()
            .map(|s| (s.entity_id, s.confidence))
            .collect();

        let mut seen = BTreeSet::new();
        let diffs: Vec<f64> = self
            .legacy_suggestions
            .iter()
            .filter(|s| seen.insert(s.entity_id))
            .filter_map(|s| {
                new_confidence
                    .get(&s.entity_id)
                    .map(|&other| (f64::from(s.confidence) - f64::from(other)).abs())
            })
            .collect();

        if diffs.is_empty() {
            None
        } else {
            Some(diffs.iter().sum::<f64>() / diffs.len() as f64)
        }
    }
}
