//! Alias Feeder
//!
//! Exact lookup of the normalized input among confirmed aliases.

use super::{FeederError, SignalFeeder};
use crate::registry::CandidateRegistry;
use crate::signal::{Signal, SignalType};
use async_trait::async_trait;
use std::sync::Arc;

pub struct AliasFeeder {
    registry: Arc<dyn CandidateRegistry>,
}

impl AliasFeeder {
    pub fn new(registry: Arc<dyn CandidateRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl SignalFeeder for AliasFeeder {
    fn name(&self) -> &'static str {
        "alias"
    }

    async fn get_signals(&self, normalized_input: &str) -> Result<Vec<Signal>, FeederError> {
        if normalized_input.is_empty() {
            return Ok(Vec::new());
        }

        let mut signals = Vec::new();
        for entity_id in self.registry.confirmed_aliases(normalized_input).await? {
            signals.push(Signal::new(entity_id, SignalType::ExactAlias, 1.0)?);
        }
        Ok(signals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::InMemoryRegistry;
    use crate::types::{CandidateEntity, EntityKind};

    #[tokio::test]
    async fn test_alias_hit_and_miss() {
        let registry = Arc::new(
            InMemoryRegistry::new(vec![CandidateEntity::new(9, EntityKind::Bank, "Riyad Bank")])
                .with_alias("bank al riyad", 9),
        );
        let feeder = AliasFeeder::new(registry);

        let hit = feeder.get_signals("bank al riyad").await.unwrap();
        assert_eq!(hit.len(), 1);
        assert_eq!(hit[0].signal_type(), SignalType::ExactAlias);

        assert!(feeder.get_signals("riyad").await.unwrap().is_empty());
    }
}
