//! Comparison Logger
//!
//! Single-writer actor owning the shadow-run telemetry:
//! - `<dir>/comparisons-YYYY-MM-DD.jsonl`: one JSON line per comparison
//!   (UTC date of the comparison), result plus derived metrics
//! - `<dir>/run_summary.json`: the [`RunSummary`], rewritten atomically after
//!   every update
//!
//! All commands go through one unbounded channel and are applied in order by
//! one writer, so summary updates never race within a process. The writer
//! runs on tokio's blocking pool because every command ends in synchronous
//! file I/O (append, fsync, rename). I/O failures are logged and dropped.

use super::comparison::{ComparisonMetrics, ComparisonResult};
use super::summary::{RunSummary, SUMMARY_FILE_NAME};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

/// One line of the comparison log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRecord {
    #[serde(flatten)]
    pub result: ComparisonResult,
    pub metrics: ComparisonMetrics,
}

/// Log file name for a UTC date
pub fn log_file_name(date: NaiveDate) -> String {
    format!("comparisons-{}.jsonl", date.format("%Y-%m-%d"))
}

/// Read the persisted run summary from a telemetry directory
pub fn load_summary(dir: &Path) -> RunSummary {
    RunSummary::load(&dir.join(SUMMARY_FILE_NAME))
}

/// Re-read one day's comparison log
///
/// A missing log is an empty day. Blank and malformed lines are skipped.
pub fn read_comparisons(dir: &Path, date: NaiveDate) -> erm_common::Result<Vec<ComparisonRecord>> {
    let path = dir.join(log_file_name(date));
    let contents = match std::fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut records = Vec::new();
    for (line_no, line) in contents.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<ComparisonRecord>(line) {
            Ok(record) => records.push(record),
            Err(e) => warn!(
                path = %path.display(),
                line = line_no + 1,
                error = %e,
                "Skipping malformed comparison line"
            ),
        }
    }

    Ok(records)
}

enum LoggerCommand {
    Record(Box<ComparisonResult>),
    EngineError,
    Snapshot(oneshot::Sender<RunSummary>),
    Shutdown(oneshot::Sender<()>),
}

/// Handle to the comparison writer task
///
/// Cloning shares the same writer.
#[derive(Debug, Clone)]
pub struct ComparisonLogger {
    tx: mpsc::UnboundedSender<LoggerCommand>,
    dir: PathBuf,
}

impl ComparisonLogger {
    /// Spawn the writer for a telemetry directory
    ///
    /// The writer loads any existing summary from the directory before
    /// applying commands. Must be called from within a tokio runtime.
    pub fn start(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let (tx, rx) = mpsc::unbounded_channel();

        let writer_dir = dir.clone();
        tokio::task::spawn_blocking(move || {
            let writer = ComparisonWriter {
                summary: load_summary(&writer_dir),
                dir: writer_dir,
            };
            info!(
                dir = %writer.dir.display(),
                comparisons = writer.summary.comparison_count,
                "Comparison logger started"
            );
            writer.run(rx);
        });

        Self { tx, dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Queue a comparison; returns immediately
    pub fn record(&self, result: ComparisonResult) {
        if self.tx.send(LoggerCommand::Record(Box::new(result))).is_err() {
            warn!("Comparison logger closed, dropping comparison");
        }
    }

    /// Queue an engine-side failure count
    pub fn record_engine_error(&self) {
        if self.tx.send(LoggerCommand::EngineError).is_err() {
            warn!("Comparison logger closed, dropping engine error");
        }
    }

    /// Summary after every previously queued command has been applied
    ///
    /// Falls back to the persisted file once the writer has stopped.
    pub async fn summary(&self) -> RunSummary {
        let (reply_tx, reply_rx) = oneshot::channel();
        if self.tx.send(LoggerCommand::Snapshot(reply_tx)).is_ok() {
            if let Ok(summary) = reply_rx.await {
                return summary;
            }
        }

        let dir = self.dir.clone();
        match tokio::task::spawn_blocking(move || load_summary(&dir)).await {
            Ok(summary) => summary,
            Err(e) => {
                warn!(error = %e, "Run summary load task failed, using defaults");
                RunSummary::default()
            }
        }
    }

    /// Drain queued commands and stop the writer
    pub async fn shutdown(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self.tx.send(LoggerCommand::Shutdown(done_tx)).is_ok() {
            let _ = done_rx.await;
        }
    }
}

struct ComparisonWriter {
    dir: PathBuf,
    summary: RunSummary,
}

impl ComparisonWriter {
    /// Blocking command loop; ends on shutdown or when every handle is dropped
    fn run(mut self, mut rx: mpsc::UnboundedReceiver<LoggerCommand>) {
        while let Some(command) = rx.blocking_recv() {
            if let LoggerCommand::Shutdown(done) = command {
                rx.close();
                // Apply anything queued before the shutdown request
                while let Some(pending) = rx.blocking_recv() {
                    self.apply(pending);
                }
                info!(comparisons = self.summary.comparison_count, "Comparison logger stopped");
                let _ = done.send(());
                return;
            }
            self.apply(command);
        }
        debug!("Comparison logger channel closed");
    }

    fn apply(&mut self, command: LoggerCommand) {
        match command {
            LoggerCommand::Record(result) => self.record(&result),
            LoggerCommand::EngineError => {
                self.summary.record_engine_error();
                self.persist_summary();
            }
            LoggerCommand::Snapshot(reply) => {
                let _ = reply.send(self.summary.clone());
            }
            LoggerCommand::Shutdown(done) => {
                let _ = done.send(());
            }
        }
    }

    fn record(&mut self, result: &ComparisonResult) {
        let metrics = result.metrics();
        if let Err(e) = self.append_line(result, &metrics) {
            warn!(
                comparison_id = %result.comparison_id,
                error = %e,
                "Failed to append comparison log"
            );
        }

        self.summary.fold(&metrics);
        self.persist_summary();

        debug!(
            comparison_id = %result.comparison_id,
            coverage = metrics.coverage,
            missed = metrics.missed_entities.len(),
            "Comparison recorded"
        );
    }

    fn append_line(
        &self,
        result: &ComparisonResult,
        metrics: &ComparisonMetrics,
    ) -> erm_common::Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(log_file_name(result.timestamp.date_naive()));

        let record = ComparisonRecord {
            result: result.clone(),
            metrics: metrics.clone(),
        };
        let mut line = serde_json::to_vec(&record)?;
        line.push(b'\n');

        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        file.write_all(&line)?;
        Ok(())
    }

    fn persist_summary(&self) {
        let path = self.dir.join(SUMMARY_FILE_NAME);
        if let Err(e) = self.summary.persist(&path) {
            warn!(path = %path.display(), error = %e, "Failed to persist run summary");
        }
    }
}
