//! Shadow dual-run harness
//!
//! Compares the legacy scoring path against the new confidence engine on live
//! traffic without letting the new path affect what callers receive.
//!
//! # Components
//! - [`ShadowExecutor`]: runs both paths, returns the legacy result
//! - [`ComparisonResult`]: both outputs for one input, metrics on demand
//! - [`ComparisonLogger`]: single-writer telemetry (daily JSONL log + summary)
//! - [`RunSummary`]: running aggregate, gap report, cutover verdict

mod comparison;
mod executor;
mod logger;
mod summary;

pub use comparison::{ComparisonMetrics, ComparisonResult};
pub use executor::{ShadowCandidate, ShadowExecutor};
pub use logger::{load_summary, log_file_name, read_comparisons, ComparisonLogger, ComparisonRecord};
pub use summary::{CutoverCriteria, CutoverVerdict, RunSummary, SUMMARY_FILE_NAME};
