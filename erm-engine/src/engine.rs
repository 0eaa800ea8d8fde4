//! Confidence Engine
//!
//! The signal-based scoring path:
//! 1. Normalize the raw input
//! 2. Fan out to every feeder concurrently (a failing feeder contributes nothing)
//! 3. Group signals per entity, keeping first-seen order
//! 4. Score each entity with the calculator and its feedback counters
//! 5. Hide suggestions below the display floor
//! 6. Sort by descending confidence (stable: ties keep grouping order)

use crate::calculator::{assign_tier, calculate, primary_signal, reason_text};
use crate::feeders::{
    AliasFeeder, AnchorFeeder, AnchorRules, FuzzyFeeder, HistoricalFeeder, SignalFeeder,
};
use crate::normalize::normalize;
use crate::registry::{feedback_counters, CandidateRegistry, FeedbackHistory};
use crate::signal::Signal;
use crate::types::{sort_by_confidence, CandidateSuggestion, EngineError, EntityId};
use erm_common::SettingsHandle;
use futures::future::join_all;
use futures::FutureExt;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

pub struct ConfidenceEngine {
    registry: Arc<dyn CandidateRegistry>,
    history: Arc<dyn FeedbackHistory>,
    feeders: Vec<Box<dyn SignalFeeder>>,
    settings: SettingsHandle,
}

impl ConfidenceEngine {
    pub fn new(
        registry: Arc<dyn CandidateRegistry>,
        history: Arc<dyn FeedbackHistory>,
        feeders: Vec<Box<dyn SignalFeeder>>,
        settings: SettingsHandle,
    ) -> Self {
        Self {
            registry,
            history,
            feeders,
            settings,
        }
    }

    /// Engine with the standard feeder set: alias, anchor, fuzzy, historical
    pub fn with_default_feeders(
        registry: Arc<dyn CandidateRegistry>,
        history: Arc<dyn FeedbackHistory>,
        settings: SettingsHandle,
    ) -> Self {
        let feeders: Vec<Box<dyn SignalFeeder>> = vec![
            Box::new(AliasFeeder::new(registry.clone())),
            Box::new(AnchorFeeder::new(registry.clone(), AnchorRules::default())),
            Box::new(FuzzyFeeder::new(registry.clone())),
            Box::new(HistoricalFeeder::new(history.clone())),
        ];
        Self::new(registry, history, feeders, settings)
    }

    /// Ranked suggestions for a raw input
    ///
    /// Never fails: an engine-level error is logged and yields no suggestions.
    pub async fn get_suggestions(&self, raw_input: &str) -> Vec<CandidateSuggestion> {
        match self.try_suggestions(raw_input).await {
            Ok(suggestions) => suggestions,
            Err(e) => {
                warn!(error = %e, input = %raw_input, "Engine failed, returning no suggestions");
                Vec::new()
            }
        }
    }

    /// Ranked suggestions, failing only when no evidence source could run
    ///
    /// Each lookup failure degrades to "no evidence" for its piece: a failed
    /// feeder contributes no signals, a failed feedback lookup leaves every
    /// entity without counters, and a failed registry lookup drops that entity.
    pub async fn try_suggestions(
        &self,
        raw_input: &str,
    ) -> Result<Vec<CandidateSuggestion>, EngineError> {
        let started = Instant::now();
        let normalized = normalize(raw_input);
        if normalized.is_empty() {
            return Ok(Vec::new());
        }

        let settings = self.settings.snapshot().await;
        let gathered = self.gather_signals(&normalized).await;
        if !self.feeders.is_empty() && gathered.failed == self.feeders.len() {
            return Err(EngineError::AllFeedersFailed {
                failed: gathered.failed,
            });
        }

        let grouped = group_by_entity(gathered.signals);
        if grouped.is_empty() {
            debug!(input = %normalized, "No signals");
            return Ok(Vec::new());
        }

        let counters = match feedback_counters(self.history.as_ref(), &normalized).await {
            Ok(counters) => counters,
            Err(e) => {
                warn!(input = %normalized, error = %e, "Feedback lookup failed, scoring without counters");
                HashMap::new()
            }
        };

        let mut suggestions = Vec::with_capacity(grouped.len());
        for (entity_id, signals) in grouped {
            let candidate = match self.registry.get(entity_id).await {
                Ok(Some(candidate)) => candidate,
                Ok(None) => {
                    warn!(entity_id, "Signal references unknown entity, dropping");
                    continue;
                }
                Err(e) => {
                    warn!(entity_id, error = %e, "Registry lookup failed, dropping entity");
                    continue;
                }
            };

            let Some(primary) = primary_signal(&signals) else {
                continue;
            };
            let feedback = counters.get(&entity_id).copied().unwrap_or_default();
            let confidence = calculate(&signals, feedback.confirmations, feedback.rejections);

            if confidence < settings.display_floor {
                debug!(entity_id, confidence, "Below display floor");
                continue;
            }

            suggestions.push(CandidateSuggestion {
                entity_id,
                display_name: candidate.display_name,
                confidence,
                tier: assign_tier(confidence, settings.review_threshold),
                reason_text: reason_text(primary, feedback.confirmations, feedback.rejections),
                confirmation_count: feedback.confirmations,
                rejection_count: feedback.rejections,
            });
        }

        sort_by_confidence(&mut suggestions);

        debug!(
            input = %normalized,
            suggestions = suggestions.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Engine scoring complete"
        );

        Ok(suggestions)
    }

    /// Run all feeders concurrently; failures and panics contribute no signals
    async fn gather_signals(&self, normalized: &str) -> Gathered {
        let runs = self.feeders.iter().map(|feeder| async move {
            let outcome = AssertUnwindSafe(feeder.get_signals(normalized))
                .catch_unwind()
                .await;
            (feeder.name(), outcome)
        });

        let mut gathered = Gathered::default();
        for (name, outcome) in join_all(runs).await {
            match outcome {
                Ok(Ok(found)) => {
                    debug!(feeder = name, signals = found.len(), "Feeder complete");
                    gathered.signals.extend(found);
                }
                Ok(Err(e)) => {
                    warn!(feeder = name, error = %e, "Feeder failed, treating as no signals");
                    gathered.failed += 1;
                }
                Err(_) => {
                    warn!(feeder = name, "Feeder panicked, treating as no signals");
                    gathered.failed += 1;
                }
            }
        }
        gathered
    }
}

#[derive(Default)]
struct Gathered {
    signals: Vec<Signal>,
    failed: usize,
}

/// Group signals per entity, entities in first-seen order
fn group_by_entity(signals: Vec<Signal>) -> Vec<(EntityId, Vec<Signal>)> {
    let mut index: HashMap<EntityId, usize> = HashMap::new();
    let mut grouped: Vec<(EntityId, Vec<Signal>)> = Vec::new();

    for signal in signals {
        let entity_id = signal.entity_id();
        match index.get(&entity_id) {
            Some(&slot) => grouped[slot].1.push(signal),
            None => {
                index.insert(entity_id, grouped.len());
                grouped.push((entity_id, vec![signal]));
            }
        }
    }

    grouped
}
