//! Scoring properties that must hold for every signal type

use erm_engine::calculator::{assign_tier, calculate, confirm_boost, raw_score};
use erm_engine::signal::SignalError;
use erm_engine::{Signal, SignalType, Tier};
use std::str::FromStr;

fn single(signal_type: SignalType, strength: f64) -> Vec<Signal> {
    vec![Signal::new(1, signal_type, strength).unwrap()]
}

#[test]
fn test_rejection_penalty_is_linear_before_clamping() {
    for signal_type in SignalType::ALL {
        let signals = single(signal_type, 0.9);
        let unpenalized = raw_score(&signals, 2, 0).unwrap();
        for rejections in 0..20u32 {
            assert_eq!(
                raw_score(&signals, 2, rejections).unwrap(),
                unpenalized - 10 * i64::from(rejections),
                "{} with {} rejections",
                signal_type,
                rejections
            );
        }
    }
}

#[test]
fn test_confirmations_never_lower_confidence() {
    for signal_type in SignalType::ALL {
        let signals = single(signal_type, 0.75);
        let mut previous = calculate(&signals, 0, 1);
        for confirmations in 1..12u32 {
            let current = calculate(&signals, confirmations, 1);
            assert!(current >= previous, "{} at {} confirmations", signal_type, confirmations);
            previous = current;
        }
    }
    assert_eq!(confirm_boost(u32::MAX), 15);
}

#[test]
fn test_confidence_always_in_range() {
    for signal_type in SignalType::ALL {
        for strength in [0.0, 0.55, 0.9, 1.0] {
            let signals = single(signal_type, strength);
            for (confirmations, rejections) in [(0, 0), (100, 0), (0, 100), (u32::MAX, u32::MAX)] {
                let confidence = calculate(&signals, confirmations, rejections);
                assert!(confidence <= 100);
            }
        }
    }
    assert_eq!(calculate(&single(SignalType::ExactAlias, 1.0), 0, u32::MAX), 0);
}

#[test]
fn test_tier_boundaries_follow_review_threshold() {
    for review_threshold in [40u8, 70, 85] {
        for confidence in 0..=100u8 {
            let expected = if confidence >= 85 {
                Tier::B
            } else if confidence >= review_threshold {
                Tier::C
            } else {
                Tier::D
            };
            assert_eq!(assign_tier(confidence, review_threshold), expected);
        }
    }
}

#[test]
fn test_signal_strength_contract() {
    assert!(matches!(
        Signal::new(3, SignalType::FuzzyStrong, 1.01),
        Err(SignalError::StrengthOutOfRange { entity_id: 3, .. })
    ));
    assert!(Signal::new(3, SignalType::FuzzyStrong, -0.01).is_err());
    assert!(Signal::new(3, SignalType::FuzzyStrong, f64::NAN).is_err());
    assert!(Signal::new(3, SignalType::FuzzyStrong, f64::INFINITY).is_err());
}

#[test]
fn test_signal_type_vocabulary_is_closed() {
    for signal_type in SignalType::ALL {
        assert_eq!(SignalType::from_str(signal_type.as_str()), Ok(signal_type));
    }
    assert_eq!(
        SignalType::from_str("phonetic"),
        Err(SignalError::UnknownType("phonetic".to_string()))
    );
}
