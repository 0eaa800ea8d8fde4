//! Legacy Suggestion Service
//!
//! The previous scoring path. Still the system of record while the shadow
//! harness compares it against [`crate::engine::ConfidenceEngine`].
//!
//! # Origins
//! Candidates are gathered from three origins, deduplicated by entity id with
//! priority anchor > learned > historical:
//! - **Anchor:** candidate name contains a distinctive input token (base 85)
//! - **Learned:** prior confirmations for this exact input (base 65)
//! - **Historical:** prior selections for overlapping inputs (base 40)
//!
//! # Formula
//! ```text
//! score = base
//!       + min(confirmations, confirm_cap) * k_confirm
//!       + min(selections, history_cap) * k_history
//!       - rejections * k_reject
//! ```
//! Clamped to 0-100. Ties are broken by entity id ascending.

use crate::calculator::assign_tier;
use crate::feeders::AnchorRules;
use crate::normalize::{normalize, tokens};
use crate::registry::{CandidateRegistry, FeedbackHistory};
use crate::types::{CandidateSuggestion, EntityId};
use erm_common::SettingsHandle;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Origin of a legacy candidate, in descending priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LegacyOrigin {
    Anchor,
    Learned,
    Historical,
}

impl LegacyOrigin {
    pub fn base_score(&self) -> i64 {
        match self {
            LegacyOrigin::Anchor => 85,
            LegacyOrigin::Learned => 65,
            LegacyOrigin::Historical => 40,
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            LegacyOrigin::Anchor => "Name token match",
            LegacyOrigin::Learned => "Previously confirmed for this input",
            LegacyOrigin::Historical => "Previously selected for similar input",
        }
    }
}

/// Legacy scoring weights
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegacyWeights {
    pub confirm_cap: u32,
    pub k_confirm: i64,
    pub history_cap: u32,
    pub k_history: i64,
    pub k_reject: i64,
}

impl Default for LegacyWeights {
    fn default() -> Self {
        Self {
            confirm_cap: 5,
            k_confirm: 4,
            history_cap: 10,
            k_history: 2,
            k_reject: 10,
        }
    }
}

impl LegacyWeights {
    /// Clamped legacy score for one candidate
    pub fn score(
        &self,
        origin: LegacyOrigin,
        confirmations: u32,
        selections: u32,
        rejections: u32,
    ) -> u8 {
        let score = origin.base_score()
            + i64::from(confirmations.min(self.confirm_cap)) * self.k_confirm
            + i64::from(selections.min(self.history_cap)) * self.k_history
            - i64::from(rejections) * self.k_reject;
        score.clamp(0, 100) as u8
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct LegacyEvidence {
    confirmations: u32,
    rejections: u32,
    selections: u32,
}

pub struct LegacySuggestionService {
    registry: Arc<dyn CandidateRegistry>,
    history: Arc<dyn FeedbackHistory>,
    rules: AnchorRules,
    weights: LegacyWeights,
    settings: SettingsHandle,
}

impl LegacySuggestionService {
    pub fn new(
        registry: Arc<dyn CandidateRegistry>,
        history: Arc<dyn FeedbackHistory>,
        settings: SettingsHandle,
    ) -> Self {
        Self {
            registry,
            history,
            rules: AnchorRules::default(),
            weights: LegacyWeights::default(),
            settings,
        }
    }

    pub fn with_weights(mut self, weights: LegacyWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_anchor_rules(mut self, rules: AnchorRules) -> Self {
        self.rules = rules;
        self
    }

    /// Ranked suggestions for a raw input
    ///
    /// Each origin lookup that fails is logged and treated as empty.
    pub async fn get_suggestions(&self, raw_input: &str) -> Vec<CandidateSuggestion> {
        let started = Instant::now();
        let normalized = normalize(raw_input);
        if normalized.is_empty() {
            return Vec::new();
        }

        let settings = self.settings.snapshot().await;
        let mut origins: HashMap<EntityId, LegacyOrigin> = HashMap::new();
        let mut evidence: HashMap<EntityId, LegacyEvidence> = HashMap::new();

        for entity_id in self.anchor_matches(&normalized).await {
            claim(&mut origins, entity_id, LegacyOrigin::Anchor);
        }

        match self.history.confirmations(&normalized).await {
            Ok(confirmed) => {
                for (entity_id, count) in confirmed {
                    evidence.entry(entity_id).or_default().confirmations += count;
                    claim(&mut origins, entity_id, LegacyOrigin::Learned);
                }
            }
            Err(e) => warn!(origin = "learned", error = %e, "Legacy origin lookup failed"),
        }

        match self.history.historical_selections(&normalized).await {
            Ok(selected) => {
                for (entity_id, count) in selected {
                    evidence.entry(entity_id).or_default().selections += count;
                    claim(&mut origins, entity_id, LegacyOrigin::Historical);
                }
            }
            Err(e) => warn!(origin = "historical", error = %e, "Legacy origin lookup failed"),
        }

        match self.history.rejections(&normalized).await {
            Ok(rejected) => {
                for (entity_id, count) in rejected {
                    evidence.entry(entity_id).or_default().rejections += count;
                }
            }
            Err(e) => warn!(origin = "rejections", error = %e, "Legacy rejection lookup failed"),
        }

        let mut suggestions = Vec::with_capacity(origins.len());
        for (entity_id, origin) in origins {
            let candidate = match self.registry.get(entity_id).await {
                Ok(Some(candidate)) => candidate,
                Ok(None) => {
                    debug!(entity_id, "Legacy candidate missing from registry, skipping");
                    continue;
                }
                Err(e) => {
                    warn!(entity_id, error = %e, "Legacy registry lookup failed, skipping");
                    continue;
                }
            };

            let found = evidence.get(&entity_id).copied().unwrap_or_default();
            let confidence = self.weights.score(
                origin,
                found.confirmations,
                found.selections,
                found.rejections,
            );
            if confidence < settings.display_floor {
                continue;
            }

            suggestions.push(CandidateSuggestion {
                entity_id,
                display_name: candidate.display_name,
                confidence,
                tier: assign_tier(confidence, settings.review_threshold),
                reason_text: legacy_reason(origin, found),
                confirmation_count: found.confirmations,
                rejection_count: found.rejections,
            });
        }

        suggestions.sort_by(|a, b| {
            b.confidence
                .cmp(&a.confidence)
                .then_with(|| a.entity_id.cmp(&b.entity_id))
        });

        debug!(
            input = %normalized,
            suggestions = suggestions.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Legacy scoring complete"
        );

        suggestions
    }

    /// Candidates whose name tokens contain any anchor of the input
    async fn anchor_matches(&self, normalized: &str) -> Vec<EntityId> {
        let anchors = self.rules.extract_anchors(normalized);
        if anchors.is_empty() {
            return Vec::new();
        }

        let candidates = match self.registry.all_candidates().await {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!(origin = "anchor", error = %e, "Legacy origin lookup failed");
                return Vec::new();
            }
        };

        candidates
            .iter()
            .filter(|candidate| {
                let name_tokens: HashSet<&str> = tokens(&candidate.normalized_name).collect();
                anchors.iter().any(|anchor| name_tokens.contains(anchor.as_str()))
            })
            .map(|candidate| candidate.id)
            .collect()
    }
}

/// Keep the highest-priority origin per entity
fn claim(origins: &mut HashMap<EntityId, LegacyOrigin>, entity_id: EntityId, origin: LegacyOrigin) {
    origins
        .entry(entity_id)
        .and_modify(|current| *current = (*current).min(origin))
        .or_insert(origin);
}

fn legacy_reason(origin: LegacyOrigin, evidence: LegacyEvidence) -> String {
    let mut reason = origin.describe().to_string();
    if evidence.confirmations > 0 {
        reason.push_str(&format!("; confirmations: {}", evidence.confirmations));
    }
    if evidence.rejections > 0 {
        reason.push_str(&format!("; rejections: {}", evidence.rejections));
    }
    reason
}
