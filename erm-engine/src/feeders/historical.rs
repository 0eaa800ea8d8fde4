//! Historical Feeder
//!
//! Prior selections of each candidate for inputs matching the current input
//! by containment. Strength grows sub-linearly with the selection count:
//! ```text
//! strength = min(1.0, 0.3 + 0.5 * ln(count + 1) / ln(20))
//! ```

use super::{FeederError, SignalFeeder};
use crate::registry::FeedbackHistory;
use crate::signal::{Signal, SignalType};
use async_trait::async_trait;
use std::sync::Arc;

/// Selection count at which history counts as frequent
pub const FREQUENT_SELECTION_COUNT: u32 = 5;

/// Diminishing-returns strength for a selection count
pub fn historical_strength(count: u32) -> f64 {
    let strength = 0.3 + 0.5 * (f64::from(count) + 1.0).ln() / 20f64.ln();
    strength.min(1.0)
}

pub struct HistoricalFeeder {
    history: Arc<dyn FeedbackHistory>,
}

impl HistoricalFeeder {
    pub fn new(history: Arc<dyn FeedbackHistory>) -> Self {
        Self { history }
    }
}

#[async_trait]
impl SignalFeeder for HistoricalFeeder {
    fn name(&self) -> &'static str {
        "historical"
    }

    async fn get_signals(&self, normalized_input: &str) -> Result<Vec<Signal>, FeederError> {
        let selections = self.history.historical_selections(normalized_input).await?;

        selections
            .into_iter()
            .filter(|(_, count)| *count > 0)
            .map(|(entity_id, count)| -> Result<Signal, FeederError> {
                let signal_type = if count >= FREQUENT_SELECTION_COUNT {
                    SignalType::HistoricalFrequent
                } else {
                    SignalType::HistoricalOccasional
                };
                Ok(Signal::new(entity_id, signal_type, historical_strength(count))?
                    .with_metadata("selection_count", count))
            })
            .collect()
    }
}
