//! Entity-Anchor Feeder
//!
//! Extracts distinctive tokens ("anchors") from the input and looks them up
//! in candidate names. Anchor extraction:
//! 1. Strip leading generic business-entity prefixes ("شركة", "bank", ...)
//! 2. Drop tokens shorter than 3 characters and stop-listed words
//! 3. Deduplicate, keeping first occurrence order
//!
//! An anchor found in exactly one candidate yields `AnchorUnique`; found in
//! several candidates, each gets `AnchorGeneric`.

use super::{FeederError, SignalFeeder};
use crate::normalize::{normalize, tokens};
use crate::registry::CandidateRegistry;
use crate::signal::{Signal, SignalType};
use crate::types::EntityId;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// Minimum anchor length in characters
pub const MIN_ANCHOR_CHARS: usize = 3;

const DEFAULT_PREFIXES: &[&str] = &[
    "شركة", "مؤسسة", "مصنع", "مكتب", "مجموعة", "بنك", "مصرف", "company", "co", "est", "bank",
    "the",
];

const DEFAULT_STOP_WORDS: &[&str] = &[
    "للتجارة",
    "والتجارة",
    "التجارية",
    "المحدودة",
    "العامة",
    "القابضة",
    "للمقاولات",
    "الدولية",
    "المتحدة",
    "وشركاه",
    "ltd",
    "llc",
    "inc",
    "limited",
    "trading",
    "group",
    "and",
    "for",
];

/// Prefix and stop-word configuration for anchor extraction
///
/// Words are normalized on construction so they compare against normalized input.
#[derive(Debug, Clone)]
pub struct AnchorRules {
    prefixes: HashSet<String>,
    stop_words: HashSet<String>,
}

impl Default for AnchorRules {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIXES, DEFAULT_STOP_WORDS)
    }
}

impl AnchorRules {
    pub fn new<P, S>(prefixes: &[P], stop_words: &[S]) -> Self
    where
        P: AsRef<str>,
        S: AsRef<str>,
    {
        Self {
            prefixes: prefixes.iter().map(|p| normalize(p.as_ref())).collect(),
            stop_words: stop_words.iter().map(|s| normalize(s.as_ref())).collect(),
        }
    }

    /// Add words to the stop-list
    pub fn with_stop_words<S: AsRef<str>>(mut self, words: &[S]) -> Self {
        self.stop_words
            .extend(words.iter().map(|w| normalize(w.as_ref())));
        self
    }

    /// Distinctive tokens of a normalized input
    pub fn extract_anchors(&self, normalized_input: &str) -> Vec<String> {
        let mut seen = HashSet::new();

        tokens(normalized_input)
            .skip_while(|token| self.prefixes.contains(*token))
            .filter(|token| token.chars().count() >= MIN_ANCHOR_CHARS)
            .filter(|token| !self.stop_words.contains(*token) && !self.prefixes.contains(*token))
            .filter(|token| seen.insert(*token))
            .map(str::to_string)
            .collect()
    }
}

pub struct AnchorFeeder {
    registry: Arc<dyn CandidateRegistry>,
    rules: AnchorRules,
}

impl AnchorFeeder {
    pub fn new(registry: Arc<dyn CandidateRegistry>, rules: AnchorRules) -> Self {
        Self { registry, rules }
    }
}

#[async_trait]
impl SignalFeeder for AnchorFeeder {
    fn name(&self) -> &'static str {
        "anchor"
    }

    async fn get_signals(&self, normalized_input: &str) -> Result<Vec<Signal>, FeederError> {
        let anchors = self.rules.extract_anchors(normalized_input);
        if anchors.is_empty() {
            return Ok(Vec::new());
        }

        let candidates = self.registry.all_candidates().await?;
        let matches: Vec<(EntityId, Vec<&String>)> = candidates
            .iter()
            .filter_map(|candidate| {
                let name_tokens: HashSet<&str> = tokens(&candidate.normalized_name).collect();
                let matched: Vec<&String> = anchors
                    .iter()
                    .filter(|anchor| name_tokens.contains(anchor.as_str()))
                    .collect();
                (!matched.is_empty()).then_some((candidate.id, matched))
            })
            .collect();

        let signal_type = if matches.len() == 1 {
            SignalType::AnchorUnique
        } else {
            SignalType::AnchorGeneric
        };

        debug!(
            anchors = ?anchors,
            matched_entities = matches.len(),
            "Anchor feeder complete"
        );

        matches
            .into_iter()
            .map(|(entity_id, matched)| -> Result<Signal, FeederError> {
                let strength = matched.len() as f64 / anchors.len() as f64;
                Ok(Signal::new(entity_id, signal_type, strength)?
                    .with_metadata("matched_anchors", serde_json::json!(matched)))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::InMemoryRegistry;
    use crate::types::{CandidateEntity, EntityKind};

    #[test]
    fn test_prefix_stripped_and_short_words_dropped() {
        let rules = AnchorRules::default();
        let anchors = rules.extract_anchors(&normalize("شركة النورس للتجارة و المقاولات"));
        assert_eq!(anchors, vec!["النورس".to_string(), "المقاولات".to_string()]);
    }

    #[test]
    fn test_anchors_deduplicated_in_order() {
        let rules = AnchorRules::default();
        let anchors = rules.extract_anchors("acme globex acme supplies globex");
        assert_eq!(anchors, vec!["acme", "globex", "supplies"]);
    }

    #[test]
    fn test_configurable_stop_list() {
        let rules = AnchorRules::default().with_stop_words(&["supplies"]);
        assert_eq!(rules.extract_anchors("acme supplies"), vec!["acme"]);
    }

    #[test]
    fn test_only_generic_words_yields_nothing() {
        let rules = AnchorRules::default();
        assert!(rules.extract_anchors("bank co ltd").is_empty());
    }

    fn registry() -> Arc<InMemoryRegistry> {
        Arc::new(InMemoryRegistry::new(vec![
            CandidateEntity::new(1, EntityKind::Supplier, "مؤسسة النورس للتجارة"),
            CandidateEntity::new(2, EntityKind::Supplier, "Acme Supplies"),
            CandidateEntity::new(3, EntityKind::Supplier, "Acme Logistics"),
        ]))
    }

    #[tokio::test]
    async fn test_single_match_is_unique() {
        let feeder = AnchorFeeder::new(registry(), AnchorRules::default());
        let signals = feeder.get_signals(&normalize("شركة النورس")).await.unwrap();

        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].entity_id(), 1);
        assert_eq!(signals[0].signal_type(), SignalType::AnchorUnique);
        assert_eq!(signals[0].raw_strength(), 1.0);
    }

    #[tokio::test]
    async fn test_shared_anchor_is_generic() {
        let feeder = AnchorFeeder::new(registry(), AnchorRules::default());
        let signals = feeder.get_signals("acme supplies").await.unwrap();

        assert_eq!(signals.len(), 2);
        assert!(signals.iter().all(|s| s.signal_type() == SignalType::AnchorGeneric));
        let supplies = signals.iter().find(|s| s.entity_id() == 2).unwrap();
        assert_eq!(supplies.raw_strength(), 1.0);
        let logistics = signals.iter().find(|s| s.entity_id() == 3).unwrap();
        assert_eq!(logistics.raw_strength(), 0.5);
    }
}
