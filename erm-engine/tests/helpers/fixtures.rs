//! Shared registry, history and engine fixtures

use async_trait::async_trait;
use erm_common::{EngineSettings, SettingsHandle};
use erm_engine::registry::{InMemoryFeedbackHistory, InMemoryRegistry};
use erm_engine::shadow::ShadowCandidate;
use erm_engine::types::{CandidateEntity, EngineError, EntityKind};
use erm_engine::{CandidateSuggestion, ConfidenceEngine, LegacySuggestionService};
use std::sync::Arc;
use std::time::Duration;

pub const NAWRAS_ID: i64 = 1;
pub const UFUQ_ID: i64 = 2;
pub const ACME_SUPPLIES_ID: i64 = 3;
pub const ACME_LOGISTICS_ID: i64 = 4;
pub const GLOBEX_ID: i64 = 5;
pub const RIYAD_BANK_ID: i64 = 6;

pub fn sample_registry() -> Arc<InMemoryRegistry> {
    Arc::new(
        InMemoryRegistry::new(vec![
            CandidateEntity::new(NAWRAS_ID, EntityKind::Supplier, "مؤسسة النورس للتجارة"),
            CandidateEntity::new(UFUQ_ID, EntityKind::Supplier, "شركة الأفق للمقاولات"),
            CandidateEntity::new(ACME_SUPPLIES_ID, EntityKind::Supplier, "Acme Supplies"),
            CandidateEntity::new(ACME_LOGISTICS_ID, EntityKind::Supplier, "Acme Logistics"),
            CandidateEntity::new(GLOBEX_ID, EntityKind::Supplier, "Globex Corporation"),
            CandidateEntity::new(RIYAD_BANK_ID, EntityKind::Bank, "Riyad Bank"),
        ])
        .with_alias("بنك الرياض", RIYAD_BANK_ID),
    )
}

pub fn sample_history() -> Arc<InMemoryFeedbackHistory> {
    Arc::new(
        InMemoryFeedbackHistory::new()
            .with_confirmations("acme supplies", ACME_SUPPLIES_ID, 3)
            .with_rejections("acme supplies", ACME_LOGISTICS_ID, 2)
            .with_selections("globex", GLOBEX_ID, 7),
    )
}

pub fn default_settings() -> SettingsHandle {
    SettingsHandle::new(EngineSettings::default())
}

pub fn engine(settings: SettingsHandle) -> ConfidenceEngine {
    ConfidenceEngine::with_default_feeders(sample_registry(), sample_history(), settings)
}

pub fn legacy(settings: SettingsHandle) -> LegacySuggestionService {
    LegacySuggestionService::new(sample_registry(), sample_history(), settings)
}

/// Shadow candidate with a fixed behavior
pub enum ScriptedCandidate {
    Returns(Vec<CandidateSuggestion>),
    Fails,
    Panics,
    Stalls(Duration),
}

#[async_trait]
impl ShadowCandidate for ScriptedCandidate {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn suggest(&self, _raw_input: &str) -> Result<Vec<CandidateSuggestion>, EngineError> {
        match self {
            ScriptedCandidate::Returns(suggestions) => Ok(suggestions.clone()),
            ScriptedCandidate::Fails => Err(EngineError::AllFeedersFailed { failed: 4 }),
            ScriptedCandidate::Panics => panic!("scripted panic"),
            ScriptedCandidate::Stalls(duration) => {
                tokio::time::sleep(*duration).await;
                Ok(Vec::new())
            }
        }
    }
}
