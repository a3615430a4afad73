use crate::models::{Achievement, InterpretationMode, Reliability, ReliabilityTier, SignalResult, StudentRecord};

pub fn classify_reliability(students: u32) -> Reliability {
    let (tier, weight) = match students {
        300.. => (ReliabilityTier::VeryHigh, 0.92),
        200..=299 => (ReliabilityTier::High, 0.82),
        120..=199 => (ReliabilityTier::Moderate, 0.70),
        _ => (ReliabilityTier::Caution, 0.55),
    };
    Reliability { tier, weight }
}

/// Explanatory 1-99 score. `mode` only steers the narrative; the number is
/// the same for every mode.
pub fn compute_signal(record: &StudentRecord, _mode: InterpretationMode) -> SignalResult {
    let deviation = record.raw_score - record.mean;
    let reliability = classify_reliability(record.students);

    let mut score = 50.0;
    score += deviation.clamp(-20.0, 25.0) * 1.2;
    // scarce A / thin AB tiers read favourably
    score += (20.0 - record.a_ratio.clamp(0.0, 40.0)) * 0.4;
    score += (25.0 - record.ab_ratio.clamp(0.0, 60.0)) * 0.25;
    score += achievement_adjustment(&record.achievement);
    score += (3.0 - f64::from(record.rank_grade.clamp(1, 6))) * 3.5;
    score *= 0.85 + reliability.weight * 0.15;

    SignalResult {
        deviation,
        reliability,
        score: score.clamp(1.0, 99.0),
    }
}

pub fn achievement_adjustment(achievement: &Achievement) -> f64 {
    match achievement {
        Achievement::A => 8.0,
        Achievement::B => 0.0,
        Achievement::C | Achievement::Other(_) => -8.0,
    }
}

/// Ranks a roster by signal score, highest first.
pub fn score_roster(
    records: &[StudentRecord],
    mode: InterpretationMode,
) -> Vec<(&StudentRecord, SignalResult)> {
    let mut scored: Vec<_> = records
        .iter()
        .map(|record| (record, compute_signal(record, mode)))
        .collect();
    scored.sort_by(|a, b| {
        b.1.score
            .partial_cmp(&a.1.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    scored
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::tests::sample_record;
    use proptest::prelude::*;

    #[test]
    fn reliability_follows_expected_tiers() {
        assert_eq!(classify_reliability(300).tier, ReliabilityTier::VeryHigh);
        assert_eq!(classify_reliability(299).tier, ReliabilityTier::High);
        assert_eq!(classify_reliability(200).tier, ReliabilityTier::High);
        assert_eq!(classify_reliability(199).tier, ReliabilityTier::Moderate);
        assert_eq!(classify_reliability(120).tier, ReliabilityTier::Moderate);
        assert_eq!(classify_reliability(119).tier, ReliabilityTier::Caution);

        let small = classify_reliability(90);
        assert_eq!(small.tier.label(), "caution");
        assert_eq!(small.weight, 0.55);
    }

    #[test]
    fn worked_example_scores_as_expected() {
        let record = sample_record();
        let signal = compute_signal(&record, InterpretationMode::Balanced);

        assert!((signal.deviation - 13.0).abs() < 1e-9);
        assert_eq!(signal.reliability.tier, ReliabilityTier::High);
        assert_eq!(signal.reliability.weight, 0.82);
        // 50 + 15.6 + 2.0 - 0.75 + 0 + 3.5 = 70.35, scaled by 0.973
        let expected = 70.35 * (0.85 + 0.82 * 0.15);
        assert!((signal.score - expected).abs() < 1e-9);
        assert_eq!(signal.score.round(), 68.0);
    }

    #[test]
    fn mode_does_not_change_the_score() {
        let record = sample_record();
        let baseline = compute_signal(&record, InterpretationMode::Balanced);
        for mode in InterpretationMode::ALL {
            assert_eq!(compute_signal(&record, mode), baseline);
        }
    }

    #[test]
    fn achievement_adjustments() {
        assert_eq!(achievement_adjustment(&Achievement::A), 8.0);
        assert_eq!(achievement_adjustment(&Achievement::B), 0.0);
        assert_eq!(achievement_adjustment(&Achievement::C), -8.0);
        assert_eq!(achievement_adjustment(&Achievement::Other("P".into())), -8.0);
    }

    #[test]
    fn roster_is_ranked_by_score() {
        let strong = StudentRecord {
            id: "strong".into(),
            achievement: Achievement::A,
            rank_grade: 1,
            ..sample_record()
        };
        let weak = StudentRecord {
            id: "weak".into(),
            achievement: Achievement::C,
            raw_score: 50.0,
            ..sample_record()
        };
        let roster = vec![weak, strong];
        let ranked = score_roster(&roster, InterpretationMode::Raw);
        assert_eq!(ranked[0].0.id, "strong");
        assert_eq!(ranked[1].0.id, "weak");
    }

    fn record_strategy() -> impl Strategy<Value = StudentRecord> {
        (
            0.0..=100.0f64,
            0.0..=100.0f64,
            0.0..=100.0f64,
            0.0..=100.0f64,
            1u32..5000,
            1u8..=6,
            prop_oneof![
                Just(Achievement::A),
                Just(Achievement::B),
                Just(Achievement::C)
            ],
        )
            .prop_map(|(raw_score, mean, a, ab, students, rank_grade, achievement)| {
                StudentRecord {
                    raw_score,
                    mean,
                    a_ratio: a.min(ab),
                    ab_ratio: a.max(ab),
                    students,
                    rank_grade,
                    achievement,
                    ..sample_record()
                }
            })
    }

    proptest! {
        #[test]
        fn score_stays_in_bounds(record in record_strategy()) {
            let signal = compute_signal(&record, InterpretationMode::Balanced);
            prop_assert!((1.0..=99.0).contains(&signal.score), "score={}", signal.score);
        }

        #[test]
        fn score_is_deterministic(record in record_strategy()) {
            let first = compute_signal(&record, InterpretationMode::Distribution);
            let second = compute_signal(&record, InterpretationMode::Reliability);
            prop_assert_eq!(first, second);
        }

        #[test]
        fn tier_matches_thresholds(students in 1u32..10_000) {
            let tier = classify_reliability(students).tier;
            let expected = if students >= 300 {
                ReliabilityTier::VeryHigh
            } else if students >= 200 {
                ReliabilityTier::High
            } else if students >= 120 {
                ReliabilityTier::Moderate
            } else {
                ReliabilityTier::Caution
            };
            prop_assert_eq!(tier, expected);
        }
    }
}
