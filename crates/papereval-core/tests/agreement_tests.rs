//! Inter-rater agreement over engine-scored evaluations.

use approx::assert_abs_diff_eq;
use papereval_core::agreement::{ConsistencyLevel, KappaInterpretation};
use papereval_core::*;

fn template_paper(doi: &str, ratings: &[(&str, f64, u8)]) -> Paper {
    ratings.iter().fold(Paper::new(doi), |paper, &(evaluator, multiplier, rating)| {
        paper.with_evaluation(Evaluation::new(Evaluator::new(evaluator, multiplier)).rate(Component::Template, rating))
    })
}

#[test]
fn test_identical_ratings_reach_kappa_one() {
    let dataset = Dataset::new(vec![
        template_paper("10.1/a", &[("e1", 1.0, 4), ("e2", 1.0, 4), ("e3", 1.0, 4)]),
        template_paper("10.1/b", &[("e1", 1.0, 4), ("e2", 1.0, 4)]),
    ]);
    let report = EvaluationEngine::default().agreement(&dataset, Component::Template);

    match &report.statistic {
        AgreementStatistic::FleissKappa(result) => {
            assert_eq!(result.n_papers, 2);
            assert_abs_diff_eq!(result.raters_per_paper, 2.5);
            assert_eq!(result.observed_agreement, 1.0);
            assert_eq!(result.kappa, 1.0);
            assert_eq!(result.interpretation, KappaInterpretation::AlmostPerfect);
        }
        other => panic!("expected kappa, got {other:?}"),
    }
    assert!(report.variance.iter().all(|v| v.level == AgreementLevel::High));
}

#[test]
fn test_disagreement_is_visible() {
    let dataset = Dataset::new(vec![
        template_paper("10.1/a", &[("e1", 1.0, 1), ("e2", 1.0, 5)]),
        template_paper("10.1/b", &[("e1", 1.0, 5), ("e2", 1.0, 1)]),
    ]);
    let report = EvaluationEngine::default().agreement(&dataset, Component::Template);
    let AgreementStatistic::FleissKappa(result) = &report.statistic else {
        panic!("expected kappa");
    };
    assert!(result.kappa < 0.0);
    assert_eq!(result.interpretation, KappaInterpretation::Poor);
    assert!(report
        .variance
        .iter()
        .all(|v| v.level == AgreementLevel::Disagreement));
}

#[test]
fn test_single_rater_papers_fall_back() {
    let dataset = Dataset::new(vec![
        template_paper("10.1/a", &[("e1", 1.0, 4)]),
        template_paper("10.1/b", &[("e2", 1.8, 4)]),
        template_paper("10.1/c", &[("e3", 1.0, 4)]),
    ]);
    let report = EvaluationEngine::default().agreement(&dataset, Component::Template);
    match &report.statistic {
        AgreementStatistic::CrossPaperFallback {
            shared_papers,
            consistency,
        } => {
            assert_eq!(*shared_papers, 0);
            assert_eq!(consistency.by_tier.len(), 2);
            // Expertise-scaled ratings differ, but only slightly.
            assert!(matches!(
                consistency.level,
                ConsistencyLevel::High | ConsistencyLevel::Moderate
            ));
        }
        other => panic!("expected fallback, got {other:?}"),
    }
    assert!(report.variance.is_empty());
    assert_eq!(report.shape.histogram.iter().sum::<usize>(), 3);
}

#[test]
fn test_statistic_serializes_with_kind() {
    let dataset = Dataset::new(vec![template_paper("10.1/a", &[("e1", 1.0, 3)])]);
    let report = EvaluationEngine::default().agreement(&dataset, Component::Template);
    let value = serde_json::to_value(&report.statistic).unwrap();
    assert_eq!(value["kind"], "cross_paper_fallback");
    assert_eq!(value["shared_papers"], 0);
}
