//! Fuzzy Feeder
//!
//! Normalized Levenshtein similarity between the input and every candidate's
//! normalized name. Similarity below [`FUZZY_FLOOR`] produces no signal.
//!
//! Band floors are compared against the unrounded similarity. An exact edit
//! ratio such as 9 edits over 20 characters lands on 0.55 exactly.

use super::{FeederError, SignalFeeder};
use crate::registry::CandidateRegistry;
use crate::signal::{Signal, SignalType};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Minimum similarity for any fuzzy signal
pub const FUZZY_FLOOR: f64 = 0.55;

const MEDIUM_FLOOR: f64 = 0.70;
const STRONG_FLOOR: f64 = 0.85;

/// Band for a similarity value, `None` below the floor
pub fn classify_similarity(similarity: f64) -> Option<SignalType> {
    if similarity >= STRONG_FLOOR {
        Some(SignalType::FuzzyStrong)
    } else if similarity >= MEDIUM_FLOOR {
        Some(SignalType::FuzzyMedium)
    } else if similarity >= FUZZY_FLOOR {
        Some(SignalType::FuzzyWeak)
    } else {
        None
    }
}

fn similarity(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(a, b)
}

pub struct FuzzyFeeder {
    registry: Arc<dyn CandidateRegistry>,
}

impl FuzzyFeeder {
    pub fn new(registry: Arc<dyn CandidateRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl SignalFeeder for FuzzyFeeder {
    fn name(&self) -> &'static str {
        "fuzzy"
    }

    async fn get_signals(&self, normalized_input: &str) -> Result<Vec<Signal>, FeederError> {
        if normalized_input.is_empty() {
            return Ok(Vec::new());
        }

        let candidates = self.registry.all_candidates().await?;
        let mut signals = Vec::new();

        for candidate in &candidates {
            let sim = similarity(normalized_input, &candidate.normalized_name);
            let Some(signal_type) = classify_similarity(sim) else {
                continue;
            };

            signals.push(
                Signal::new(candidate.id, signal_type, sim)?
                    .with_metadata("similarity", sim)
                    .with_metadata("candidate_name", candidate.normalized_name.clone()),
            );
        }

        debug!(
            candidates = candidates.len(),
            signals = signals.len(),
            "Fuzzy feeder complete"
        );

        Ok(signals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::InMemoryRegistry;
    use crate::types::{CandidateEntity, EntityKind};

    #[test]
    fn test_band_edges() {
        assert_eq!(classify_similarity(0.54), None);
        assert_eq!(classify_similarity(0.54995), None);
        assert_eq!(classify_similarity(0.55), Some(SignalType::FuzzyWeak));
        assert_eq!(classify_similarity(0.6999), Some(SignalType::FuzzyWeak));
        assert_eq!(classify_similarity(0.70), Some(SignalType::FuzzyMedium));
        assert_eq!(classify_similarity(0.8499), Some(SignalType::FuzzyMedium));
        assert_eq!(classify_similarity(0.85), Some(SignalType::FuzzyStrong));
        assert_eq!(classify_similarity(1.0), Some(SignalType::FuzzyStrong));
    }

    #[test]
    fn test_exact_edit_ratio_hits_floor() {
        // 20 chars, 9 substitutions: 1 - 9/20
        let a = "abcdefghijklmnopqrst";
        let b = "xxxxxxxxxjklmnopqrst";
        assert_eq!(similarity(a, b), 0.55);
    }

    #[tokio::test]
    async fn test_exact_name_is_strong() {
        let registry = Arc::new(InMemoryRegistry::new(vec![CandidateEntity::new(
            4,
            EntityKind::Supplier,
            "Acme Supplies",
        )]));
        let feeder = FuzzyFeeder::new(registry);

        let signals = feeder.get_signals("acme supplies").await.unwrap();
        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].signal_type(), SignalType::FuzzyStrong);
        assert_eq!(signals[0].raw_strength(), 1.0);
    }

    #[tokio::test]
    async fn test_empty_input_is_silent() {
        let registry = Arc::new(InMemoryRegistry::new(vec![CandidateEntity::new(
            4,
            EntityKind::Supplier,
            "Acme",
        )]));
        let feeder = FuzzyFeeder::new(registry);

        assert!(feeder.get_signals("").await.unwrap().is_empty());
    }
}
