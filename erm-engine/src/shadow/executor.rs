//! Shadow Executor
//!
//! Runs the legacy path (authoritative) and the new engine path
//! (informational) for the same input and always returns the legacy result.
//!
//! # Per-request flow
//! 1. Run the legacy future and time it
//! 2. Stop if shadow mode is off (read from the settings handle every request)
//! 3. Spawn the new engine path as a detached task and return the legacy
//!    result without waiting for it
//! 4. In that task, run the engine behind an isolation boundary: errors,
//!    panics and timeouts are logged as engine-side events, counted in the
//!    run summary, and produce no comparison
//! 5. Otherwise queue a [`ComparisonResult`] on the comparison logger
//!
//! [`ShadowExecutor::flush`] waits until every spawned engine run has
//! finished, so shutdown can drain the harness before the logger.

use super::comparison::ComparisonResult;
use super::logger::ComparisonLogger;
use crate::engine::ConfidenceEngine;
use crate::types::{CandidateSuggestion, EngineError};
use async_trait::async_trait;
use erm_common::SettingsHandle;
use futures::FutureExt;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::{debug, error};

/// Scoring path evaluated in shadow mode
#[async_trait]
pub trait ShadowCandidate: Send + Sync {
    fn name(&self) -> &'static str;

    async fn suggest(&self, raw_input: &str) -> Result<Vec<CandidateSuggestion>, EngineError>;
}

#[async_trait]
impl ShadowCandidate for ConfidenceEngine {
    fn name(&self) -> &'static str {
        "confidence_engine"
    }

    async fn suggest(&self, raw_input: &str) -> Result<Vec<CandidateSuggestion>, EngineError> {
        self.try_suggestions(raw_input).await
    }
}

pub struct ShadowExecutor {
    candidate: Arc<dyn ShadowCandidate>,
    logger: ComparisonLogger,
    settings: SettingsHandle,
    in_flight: Arc<watch::Sender<usize>>,
}

/// Decrements the in-flight count when a spawned engine run ends
struct InFlightGuard(Arc<watch::Sender<usize>>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.send_modify(|count| *count = count.saturating_sub(1));
    }
}

impl ShadowExecutor {
    pub fn new(
        candidate: Arc<dyn ShadowCandidate>,
        logger: ComparisonLogger,
        settings: SettingsHandle,
    ) -> Self {
        let (in_flight, _) = watch::channel(0);
        Self {
            candidate,
            logger,
            settings,
            in_flight: Arc::new(in_flight),
        }
    }

    pub fn logger(&self) -> &ComparisonLogger {
        &self.logger
    }

    pub async fn set_enabled(&self, enabled: bool) {
        self.settings.set_shadow_enabled(enabled).await;
    }

    pub async fn is_enabled(&self) -> bool {
        self.settings.snapshot().await.shadow_enabled
    }

    /// Engine runs spawned but not yet finished
    pub fn in_flight(&self) -> usize {
        *self.in_flight.borrow()
    }

    /// Wait until every spawned engine run has finished and been queued
    pub async fn flush(&self) {
        let mut rx = self.in_flight.subscribe();
        let _ = rx.wait_for(|count| *count == 0).await;
    }

    /// Drain outstanding engine runs, then stop the comparison logger
    pub async fn shutdown(&self) {
        self.flush().await;
        self.logger.shutdown().await;
    }

    /// Run both paths for `raw_input`; returns exactly what `legacy_fn` produced
    ///
    /// Returns as soon as the legacy path is done. The engine path runs on a
    /// spawned task, so this must be called from within a tokio runtime.
    pub async fn execute_shadow<F, Fut>(&self, raw_input: &str, legacy_fn: F) -> Vec<CandidateSuggestion>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Vec<CandidateSuggestion>>,
    {
        let legacy_started = Instant::now();
        let legacy = legacy_fn().await;
        let legacy_latency_ms = elapsed_ms(legacy_started);

        let settings = self.settings.snapshot().await;
        if !settings.shadow_enabled {
            return legacy;
        }

        self.in_flight.send_modify(|count| *count += 1);
        let run = EngineRun {
            candidate: self.candidate.clone(),
            logger: self.logger.clone(),
            raw_input: raw_input.to_string(),
            legacy: legacy.clone(),
            legacy_latency_ms,
            timeout: Duration::from_millis(settings.shadow_timeout_ms),
        };
        let guard = InFlightGuard(self.in_flight.clone());
        tokio::spawn(async move {
            run.execute().await;
            drop(guard);
        });

        legacy
    }
}

/// One detached engine-path execution
struct EngineRun {
    candidate: Arc<dyn ShadowCandidate>,
    logger: ComparisonLogger,
    raw_input: String,
    legacy: Vec<CandidateSuggestion>,
    legacy_latency_ms: f64,
    timeout: Duration,
}

impl EngineRun {
    async fn execute(self) {
        let new_started = Instant::now();
        let outcome = tokio::time::timeout(
            self.timeout,
            AssertUnwindSafe(self.candidate.suggest(&self.raw_input)).catch_unwind(),
        )
        .await;
        let new_latency_ms = elapsed_ms(new_started);

        let new_suggestions = match outcome {
            Ok(Ok(Ok(suggestions))) => suggestions,
            Ok(Ok(Err(e))) => {
                error!(
                    candidate = self.candidate.name(),
                    input = %self.raw_input,
                    error = %e,
                    "Shadow engine path failed"
                );
                self.logger.record_engine_error();
                return;
            }
            Ok(Err(panic)) => {
                error!(
                    candidate = self.candidate.name(),
                    input = %self.raw_input,
                    panic = %panic_message(panic.as_ref()),
                    "Shadow engine path panicked"
                );
                self.logger.record_engine_error();
                return;
            }
            Err(_) => {
                error!(
                    candidate = self.candidate.name(),
                    input = %self.raw_input,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Shadow engine path timed out"
                );
                self.logger.record_engine_error();
                return;
            }
        };

        debug!(
            legacy = self.legacy.len(),
            new = new_suggestions.len(),
            legacy_latency_ms = self.legacy_latency_ms,
            new_latency_ms,
            "Shadow comparison complete"
        );

        self.logger.record(ComparisonResult::new(
            self.raw_input,
            self.legacy,
            new_suggestions,
            self.legacy_latency_ms,
            new_latency_ms,
        ));
    }
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
