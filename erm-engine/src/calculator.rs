//! Confidence Calculator
//!
//! Turns one candidate's aggregated signals plus its feedback counters into a
//! single confidence score (0-100), and maps scores to tiers.
//!
//! # Formula
//! ```text
//! confidence = clamp(base + confirm_boost - rejection_penalty + strength_modifier, 0, 100)
//! ```
//! - `base`: base score of the primary signal (highest base score, first wins on ties)
//! - `confirm_boost`: 0 / +5 (1-2) / +10 (3-5) / +15 (6+)
//! - `rejection_penalty`: 10 per rejection
//! - `strength_modifier`: `round((strength - 0.9) * 50)` for fuzzy primaries, else 0
//!
//! An empty signal list scores 0 regardless of feedback.

use crate::signal::{Signal, SignalType};
use crate::types::Tier;
use erm_common::settings::HIGH_TIER_FLOOR;

/// Penalty per rejection
pub const REJECTION_PENALTY: i32 = 10;

/// Primary signal: highest base score, first in input order on ties
pub fn primary_signal(signals: &[Signal]) -> Option<&Signal> {
    let mut primary: Option<&Signal> = None;
    for signal in signals {
        match primary {
            Some(current) if signal.signal_type().base_score() <= current.signal_type().base_score() => {}
            _ => primary = Some(signal),
        }
    }
    primary
}

/// Boost for prior confirmations of this (input, entity) pair
pub fn confirm_boost(confirmations: u32) -> i32 {
    match confirmations {
        0 => 0,
        1..=2 => 5,
        3..=5 => 10,
        _ => 15,
    }
}

/// Adjustment from similarity strength; zero for non-fuzzy signals
pub fn strength_modifier(signal: &Signal) -> i32 {
    if !signal.signal_type().is_fuzzy() {
        return 0;
    }
    ((signal.raw_strength() - 0.9) * 50.0).round() as i32
}

/// Score before clamping
///
/// Returns `None` when there are no signals.
pub fn raw_score(signals: &[Signal], confirmations: u32, rejections: u32) -> Option<i64> {
    let primary = primary_signal(signals)?;
    let penalty = i64::from(rejections) * i64::from(REJECTION_PENALTY);

    Some(
        i64::from(primary.signal_type().base_score())
            + i64::from(confirm_boost(confirmations))
            - penalty
            + i64::from(strength_modifier(primary)),
    )
}

/// Unified confidence score (0-100)
pub fn calculate(signals: &[Signal], confirmations: u32, rejections: u32) -> u8 {
    match raw_score(signals, confirmations, rejections) {
        Some(score) => score.clamp(0, 100) as u8,
        None => 0,
    }
}

/// Tier for a confidence score
///
/// `>= 85` is B, `>= review_threshold` is C, anything lower is D.
pub fn assign_tier(confidence: u8, review_threshold: u8) -> Tier {
    if confidence >= HIGH_TIER_FLOOR {
        Tier::B
    } else if confidence >= review_threshold {
        Tier::C
    } else {
        Tier::D
    }
}

/// Human-readable reason for a score, never empty
pub fn reason_text(primary: &Signal, confirmations: u32, rejections: u32) -> String {
    let mut reason = match primary.signal_type() {
        SignalType::ExactAlias => "Confirmed alias match".to_string(),
        SignalType::AnchorUnique => "Distinctive name token match".to_string(),
        SignalType::AnchorGeneric => "Shared name token match".to_string(),
        SignalType::FuzzyStrong => {
            format!("Strong name similarity ({:.0}%)", primary.raw_strength() * 100.0)
        }
        SignalType::FuzzyMedium => {
            format!("Moderate name similarity ({:.0}%)", primary.raw_strength() * 100.0)
        }
        SignalType::FuzzyWeak => {
            format!("Weak name similarity ({:.0}%)", primary.raw_strength() * 100.0)
        }
        SignalType::HistoricalFrequent | SignalType::HistoricalOccasional => {
            match primary.metadata().get("selection_count").and_then(|v| v.as_u64()) {
                Some(count) => format!("Selected {} times for similar input", count),
                None => "Previously selected for similar input".to_string(),
            }
        }
    };

    if confirmations > 0 {
        reason.push_str(&format!("; confirmations: {}", confirmations));
    }
    if rejections > 0 {
        reason.push_str(&format!("; rejections: {}", rejections));
    }

    reason
}
