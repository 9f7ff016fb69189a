//! Property-Based Tests for papereval-core
//!
//! Uses proptest for:
//! 1. Fused scores always stay within [0, 1]
//! 2. The confidence curve is symmetric and bounded
//! 3. The confusion matrix always accounts for every applicable paper
//! 4. Agreement statistics are well defined for any score vector

use papereval_core::agreement::{cross_paper_consistency, fleiss_kappa, SharedPaper};
use papereval_core::aggregation::{PositionStats, ScoredEvaluation};
use papereval_core::classification::classify_component;
use papereval_core::config::{AgreementConfig, FusionConfig};
use papereval_core::fusion::fuse;
use papereval_core::stats::{histogram, median, ScoreStats};
use papereval_core::*;
use proptest::prelude::*;

// ============================================================================
// Strategies
// ============================================================================

fn unit_strategy() -> impl Strategy<Value = f64> {
    0.0f64..=1.0f64
}

fn rating_strategy() -> impl Strategy<Value = u8> {
    1u8..=5u8
}

fn multiplier_strategy() -> impl Strategy<Value = f64> {
    MIN_EXPERTISE_MULTIPLIER..=MAX_EXPERTISE_MULTIPLIER
}

fn component_strategy() -> impl Strategy<Value = Component> {
    prop::sample::select(Component::ALL.to_vec())
}

fn maybe_text() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        Just(Some(String::new())),
        Just(Some("ACL".to_string())),
        Just(Some("EMNLP".to_string())),
        "[a-z ]{1,12}".prop_map(Some),
    ]
}

fn paper_strategy() -> impl Strategy<Value = Paper> {
    (
        "10\\.[0-9]{4}/[a-c]",
        maybe_text(),
        maybe_text(),
        unit_strategy(),
    )
        .prop_map(|(doi, gt, sys, confidence)| {
            let mut paper = Paper::new(doi);
            if let Some(gt) = gt {
                paper = paper.with_ground_truth(GroundTruth::default().with(Component::Venue, gt));
            }
            if let Some(sys) = sys {
                paper = paper.with_system_output(
                    SystemOutput::default().with(Component::Venue, SystemValue::new(sys, confidence)),
                );
            }
            paper
        })
}

fn scored(paper: usize, evaluator: usize, score: f64) -> ScoredEvaluation {
    ScoredEvaluation {
        paper: PaperId::new(format!("10.1/{paper}")),
        evaluator_id: format!("e{evaluator}"),
        tier: ExpertiseTier::Intermediate,
        prior_experience: false,
        position: None,
        provenance: None,
        fused: fuse(Some(score), None, 1.0, &Component::Title.profile(), &FusionConfig::default())
            .unwrap(),
    }
}

// ============================================================================
// Fusion & Confidence
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn final_score_always_in_unit_range(
        automated in prop::option::of(unit_strategy()),
        rating in prop::option::of(rating_strategy()),
        multiplier in multiplier_strategy(),
        component in component_strategy(),
    ) {
        prop_assume!(automated.is_some() || rating.is_some());
        let fused = fuse(automated, rating, multiplier, &component.profile(), &FusionConfig::default()).unwrap();
        prop_assert!(fused.final_score >= 0.0);
        prop_assert!(fused.final_score <= 1.0);
        prop_assert_eq!(fused.is_capped, fused.uncapped_score > 1.0);
    }

    #[test]
    fn fusion_weights_sum_to_one(
        automated in unit_strategy(),
        rating in rating_strategy(),
        multiplier in multiplier_strategy(),
        component in component_strategy(),
    ) {
        let fused = fuse(Some(automated), Some(rating), multiplier, &component.profile(), &FusionConfig::default()).unwrap();
        let b = fused.breakdown.unwrap();
        prop_assert!((b.auto_weight + b.user_weight - 1.0).abs() < 1e-12);
        prop_assert!(b.auto_weight_raw >= component.profile().auto_weight_floor);
    }

    #[test]
    fn confidence_is_symmetric(score in unit_strategy()) {
        let a = system_confidence(score);
        let b = system_confidence(1.0 - score);
        prop_assert!((a - b).abs() < 1e-9);
        prop_assert!((0.0..=1.0).contains(&a));
    }
}

// ============================================================================
// Classification
// ============================================================================

proptest! {
    #[test]
    fn matrix_counts_every_unique_paper(papers in prop::collection::vec(paper_strategy(), 0..20)) {
        let result = classify_component(&papers, Component::Venue, &EngineConfig::default());
        prop_assert_eq!(result.matrix.total(), result.applicable());
        prop_assert_eq!(result.matrix.total(), result.papers.len());

        let m = result.metrics;
        for value in [m.accuracy, m.precision, m.recall, m.f1_score] {
            prop_assert!((0.0..=1.0).contains(&value));
        }
    }
}

// ============================================================================
// Statistics & Agreement
// ============================================================================

proptest! {
    #[test]
    fn score_stats_are_ordered(scores in prop::collection::vec(unit_strategy(), 1..50)) {
        let stats = ScoreStats::from_scores(&scores);
        prop_assert!(stats.min <= stats.median && stats.median <= stats.max);
        prop_assert!(stats.min <= stats.mean + 1e-12 && stats.mean <= stats.max + 1e-12);
        prop_assert_eq!(median(&scores), stats.median);
    }

    #[test]
    fn histogram_counts_every_score(scores in prop::collection::vec(unit_strategy(), 0..50), bins in 1usize..10) {
        prop_assert_eq!(histogram(&scores, bins).iter().sum::<usize>(), scores.len());
    }

    #[test]
    fn position_buckets_are_cumulative(positions in prop::collection::vec(prop::option::of(0u32..10), 0..30)) {
        let stats = PositionStats::from_positions(positions.iter().copied());
        prop_assert!(stats.top1 <= stats.top3 && stats.top3 <= stats.top5);
        prop_assert_eq!(stats.top5 + stats.outside, positions.len());
        prop_assert_eq!(stats.total, positions.len());
    }

    #[test]
    fn identical_scores_give_perfect_kappa(score in unit_strategy(), papers in 2usize..6, raters in 2usize..5) {
        let shared: Vec<SharedPaper> = (0..papers)
            .map(|i| SharedPaper { paper: PaperId::new(format!("p{i}")), scores: vec![score; raters] })
            .collect();
        let result = fleiss_kappa(&shared, &AgreementConfig::default()).unwrap();
        prop_assert_eq!(result.kappa, 1.0);
    }

    #[test]
    fn kappa_never_exceeds_one(scores in prop::collection::vec(prop::collection::vec(unit_strategy(), 2..5), 2..8)) {
        let shared: Vec<SharedPaper> = scores
            .into_iter()
            .enumerate()
            .map(|(i, scores)| SharedPaper { paper: PaperId::new(format!("p{i}")), scores })
            .collect();
        let result = fleiss_kappa(&shared, &AgreementConfig::default()).unwrap();
        prop_assert!(result.kappa <= 1.0 + 1e-12);
        prop_assert!(result.kappa.is_finite());
    }

    #[test]
    fn cv_is_never_negative(scores in prop::collection::vec(unit_strategy(), 0..30)) {
        let evaluations: Vec<ScoredEvaluation> = scores
            .iter()
            .enumerate()
            .map(|(i, &s)| scored(i, 0, s))
            .collect();
        let consistency = cross_paper_consistency(&evaluations);
        prop_assert!(consistency.cv_percent >= 0.0);
    }
}
