//! Run summary
//!
//! Running aggregate over every comparison of a shadow run, plus the offline
//! gap report ([`RunSummary::top_missed`]) and cutover assessment
//! ([`RunSummary::assess_cutover`]).
//!
//! Only the comparison logger's writer task mutates the live summary.

use super::comparison::ComparisonMetrics;
use crate::types::EntityId;
use chrono::{DateTime, Utc};
use erm_common::config::write_atomic;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};

/// File name of the persisted summary inside the telemetry directory
pub const SUMMARY_FILE_NAME: &str = "run_summary.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSummary {
    pub comparison_count: u64,
    /// Mean coverage percentage (0-100)
    pub avg_coverage: f64,
    pub avg_performance_delta_ms: f64,
    /// Mean divergence over comparisons where it was defined
    pub avg_confidence_divergence: f64,
    /// Number of comparisons contributing to `avg_confidence_divergence`
    pub divergence_samples: u64,
    /// How often each entity was found by legacy but missed by the new engine
    pub missed_entities: BTreeMap<EntityId, u64>,
    /// New-engine failures (errors, panics, timeouts) seen by the harness
    pub engine_error_count: u64,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for RunSummary {
    fn default() -> Self {
        Self {
            comparison_count: 0,
            avg_coverage: 0.0,
            avg_performance_delta_ms: 0.0,
            avg_confidence_divergence: 0.0,
            divergence_samples: 0,
            missed_entities: BTreeMap::new(),
            engine_error_count: 0,
            updated_at: None,
        }
    }
}

/// Incremental mean after adding the n-th sample
fn running_mean(mean: f64, sample: f64, n: u64) -> f64 {
    mean + (sample - mean) / n as f64
}

impl RunSummary {
    /// Fold one comparison's metrics into the running aggregate
    pub fn fold(&mut self, metrics: &ComparisonMetrics) {
        self.comparison_count += 1;
        let n = self.comparison_count;

        self.avg_coverage = running_mean(self.avg_coverage, metrics.coverage, n);
        self.avg_performance_delta_ms =
            running_mean(self.avg_performance_delta_ms, metrics.performance_delta_ms, n);

        if let Some(divergence) = metrics.confidence_divergence {
            self.divergence_samples += 1;
            self.avg_confidence_divergence = running_mean(
                self.avg_confidence_divergence,
                divergence,
                self.divergence_samples,
            );
        }

        for entity_id in &metrics.missed_entities {
            *self.missed_entities.entry(*entity_id).or_insert(0) += 1;
        }

        self.updated_at = Some(Utc::now());
    }

    pub fn record_engine_error(&mut self) {
        self.engine_error_count += 1;
        self.updated_at = Some(Utc::now());
    }

    /// Most frequently missed entities, count descending then id ascending
    pub fn top_missed(&self, n: usize) -> Vec<(EntityId, u64)> {
        let mut missed: Vec<(EntityId, u64)> =
            self.missed_entities.iter().map(|(id, count)| (*id, *count)).collect();
        missed.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        missed.truncate(n);
        missed
    }

    /// Readiness of the new engine to replace the legacy path
    pub fn assess_cutover(&self, criteria: &CutoverCriteria) -> CutoverVerdict {
        let mut reasons = Vec::new();

        if self.comparison_count < criteria.min_comparisons {
            reasons.push(format!(
                "Only {} comparisons recorded (need {})",
                self.comparison_count, criteria.min_comparisons
            ));
        }
        if self.avg_coverage < criteria.min_avg_coverage {
            reasons.push(format!(
                "Average coverage {:.2}% below {:.2}%",
                self.avg_coverage, criteria.min_avg_coverage
            ));
        }
        if self.divergence_samples > 0 && self.avg_confidence_divergence > criteria.max_avg_divergence {
            reasons.push(format!(
                "Average confidence divergence {:.2} above {:.2}",
                self.avg_confidence_divergence, criteria.max_avg_divergence
            ));
        }
        if self.avg_performance_delta_ms > criteria.max_avg_performance_delta_ms {
            reasons.push(format!(
                "Average latency delta {:.1}ms above {:.1}ms",
                self.avg_performance_delta_ms, criteria.max_avg_performance_delta_ms
            ));
        }

        CutoverVerdict {
            ready: reasons.is_empty(),
            reasons,
        }
    }

    /// Read a persisted summary
    ///
    /// A missing file yields defaults; an unreadable or corrupt file yields
    /// defaults with a warning.
    pub fn load(path: &Path) -> Self {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No run summary yet, starting empty");
                return Self::default();
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read run summary, starting empty");
                return Self::default();
            }
        };

        match serde_json::from_str(&contents) {
            Ok(summary) => summary,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Corrupt run summary, starting empty");
                Self::default()
            }
        }
    }

    /// Write the summary atomically
    pub fn persist(&self, path: &Path) -> erm_common::Result<()> {
        let json = serde_json::to_vec_pretty(self)?;
        write_atomic(path, &json)
    }
}

/// Operator thresholds for switching to the new engine
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CutoverCriteria {
    pub min_comparisons: u64,
    pub min_avg_coverage: f64,
    pub max_avg_divergence: f64,
    pub max_avg_performance_delta_ms: f64,
}

impl Default for CutoverCriteria {
    fn default() -> Self {
        Self {
            min_comparisons: 500,
            min_avg_coverage: 98.0,
            max_avg_divergence: 5.0,
            max_avg_performance_delta_ms: 50.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CutoverVerdict {
    pub ready: bool,
    /// Unmet criteria, empty when ready
    pub reasons: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn metrics(coverage: f64, divergence: Option<f64>, missed: Vec<EntityId>, delta: f64) -> ComparisonMetrics {
        ComparisonMetrics {
            coverage,
            missed_entities: missed,
            new_discoveries: vec![],
            confidence_divergence: divergence,
            performance_delta_ms: delta,
        }
    }

    #[test]
    fn test_fold_running_means() {
        let mut summary = RunSummary::default();
        summary.fold(&metrics(50.0, Some(10.0), vec![2], 4.0));
        summary.fold(&metrics(100.0, None, vec![], -2.0));
        summary.fold(&metrics(75.0, Some(2.0), vec![2, 3], 1.0));

        assert_eq!(summary.comparison_count, 3);
        assert!((summary.avg_coverage - 75.0).abs() < 1e-9);
        assert!((summary.avg_performance_delta_ms - 1.0).abs() < 1e-9);
        assert_eq!(summary.divergence_samples, 2);
        assert!((summary.avg_confidence_divergence - 6.0).abs() < 1e-9);
        assert_eq!(summary.missed_entities[&2], 2);
        assert_eq!(summary.missed_entities[&3], 1);
        assert!(summary.updated_at.is_some());
    }

    #[test]
    fn test_top_missed_ordering() {
        let mut summary = RunSummary::default();
        summary.missed_entities.insert(8, 3);
        summary.missed_entities.insert(2, 5);
        summary.missed_entities.insert(5, 3);
        summary.missed_entities.insert(1, 1);

        assert_eq!(summary.top_missed(3), vec![(2, 5), (5, 3), (8, 3)]);
        assert_eq!(summary.top_missed(10).len(), 4);
    }

    #[test]
    fn test_cutover_not_ready_lists_reasons() {
        let mut summary = RunSummary::default();
        summary.fold(&metrics(90.0, Some(8.0), vec![], 80.0));

        let verdict = summary.assess_cutover(&CutoverCriteria::default());
        assert!(!verdict.ready);
        assert_eq!(verdict.reasons.len(), 4);
    }

    #[test]
    fn test_cutover_ready() {
        let mut summary = RunSummary::default();
        for _ in 0..500 {
            summary.fold(&metrics(100.0, Some(1.0), vec![], 5.0));
        }

        let verdict = summary.assess_cutover(&CutoverCriteria::default());
        assert!(verdict.ready, "{:?}", verdict.reasons);
    }

    #[test]
    fn test_persist_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(SUMMARY_FILE_NAME);

        let mut summary = RunSummary::default();
        summary.fold(&metrics(50.0, Some(3.0), vec![7], 2.0));
        summary.record_engine_error();
        summary.persist(&path).unwrap();

        assert_eq!(RunSummary::load(&path), summary);
    }

    #[test]
    fn test_corrupt_file_loads_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(SUMMARY_FILE_NAME);
        std::fs::write(&path, "{ not json").unwrap();

        assert_eq!(RunSummary::load(&path), RunSummary::default());
        assert_eq!(RunSummary::load(&dir.path().join("missing.json")), RunSummary::default());
    }
}
