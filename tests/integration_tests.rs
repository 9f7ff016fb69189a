//! Integration tests for the complete papereval pipeline
//!
//! These tests drive the engine end to end:
//! - raw JSON → normalization → Dataset
//! - Dataset → per-component reports → JSON files
//! - Dataset → agreement analysis
//!
//! Run with: cargo test --test integration_tests

use approx::assert_abs_diff_eq;
use chrono::{TimeZone, Utc};
use papereval_core::agreement::KappaInterpretation;
use papereval_core::config::EngineConfig;
use papereval_core::*;
use tempfile::tempdir;

const DATASET: &str = r#"
{
  "papers": [
    {
      "doi": "10.1000/alpha",
      "title": "Alpha",
      "groundTruth": {
        "title": "Learning to Rank Research Fields",
        "authors": ["Ada Lovelace", "Alan Turing"],
        "researchField": "Information Retrieval",
        "researchProblem": "Field classification"
      },
      "systemOutput": {
        "title": {"value": "Learning to rank research fields", "confidence": 0.97},
        "authors": {"value": "Ada Lovelace; Alan Turing", "confidence": 0.9},
        "researchFieldPredictions": [
          {"label": "Information Retrieval", "score": 0.81},
          {"label": "Machine Learning", "score": 0.12}
        ],
        "researchProblem": {"value": "Field classification", "confidence": 0.7, "source": "orkg"},
        "template": {"value": "Classification template", "confidence": 0.6, "source": "llm"}
      },
      "evaluations": [
        {"evaluatorId": "r1", "expertiseMultiplier": 1.0, "orkgExperience": true,
         "ratings": {"title": 5, "authors": 5, "researchField": 5, "researchProblem": 4, "template": 3},
         "positions": {"researchField": 1}},
        {"evaluatorId": "r2", "expertiseMultiplier": 1.5,
         "ratings": {"title": 5, "authors": 4, "researchField": 5, "researchProblem": 4, "template": 3}}
      ]
    },
    {
      "doi": "10.1000/beta",
      "title": "Beta",
      "groundTruth": {
        "title": "Graph Neural Networks for Citation Analysis",
        "researchField": "Bibliometrics"
      },
      "systemOutput": {
        "title": {"value": "Graph networks for citations", "confidence": 0.6},
        "researchFieldPredictions": [
          {"label": "Machine Learning", "score": 0.5},
          {"label": "Network Science", "score": 0.3},
          {"label": "Bibliometrics", "score": 0.2}
        ],
        "template": {"value": "Graph template", "confidence": 0.9, "source": "llm"}
      },
      "evaluations": [
        {"evaluatorId": "r1", "expertiseMultiplier": 1.0, "orkgExperience": true,
         "ratings": {"title": 3, "researchField": 3, "template": 4}},
        {"evaluatorId": "r2", "expertiseMultiplier": 1.5,
         "ratings": {"title": 3, "researchField": 3, "template": 4}}
      ]
    },
    {
      "doi": "https://doi.org/10.1000/ALPHA",
      "systemOutput": {},
      "evaluations": [
        {"evaluatorId": "r3", "expertiseMultiplier": 0.9, "ratings": {"title": 4}}
      ]
    }
  ]
}
"#;

fn timestamp() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 9, 1, 8, 0, 0).unwrap()
}

// ============================================================================
// JSON → reports
// ============================================================================

#[test]
fn test_title_report_end_to_end() {
    let dataset = Dataset::from_json_str(DATASET).unwrap();
    assert_eq!(dataset.papers.len(), 3);

    let report = EvaluationEngine::default().component_report(&dataset, Component::Title, timestamp());
    assert_eq!(report.counts.total_unique_papers, 2);
    assert_eq!(report.counts.total_evaluations, 5);
    assert_eq!(report.matrix.true_positives, 1);
    assert_eq!(report.matrix.false_positives, 1);
    assert!(report.coverage.insufficient_ground_truth);

    let alpha = &report.paper_breakdown[0];
    assert_eq!(alpha.classification, ClassificationLabel::TruePositive);
    assert_eq!(alpha.score_method, Some(ScoreMethod::Hybrid));
    // r1: 5, r2: 5, plus r3's 4 on the duplicate entry.
    assert_abs_diff_eq!(alpha.user_rating.unwrap(), 14.0 / 3.0, epsilon = 1e-12);
    assert!(alpha.score.unwrap() > 0.9);

    let beta = &report.paper_breakdown[1];
    assert_eq!(beta.classification, ClassificationLabel::FalsePositive);
    assert!(beta.score.unwrap() < alpha.score.unwrap());
}

#[test]
fn test_research_field_ranks() {
    let dataset = Dataset::from_json_str(DATASET).unwrap();
    let engine = EvaluationEngine::default();
    let report = engine.component_report(&dataset, Component::ResearchField, timestamp());

    assert_eq!(report.matrix.true_positives, 1);
    assert_eq!(report.matrix.false_positives, 1);
    // r3 left the field unrated on alpha's duplicate entry, so it is scored
    // automatically against alpha's predictions (rank 1).
    let positions = report.position_stats.unwrap();
    assert_eq!(positions.top1, 3);
    assert_eq!(positions.top3, 5);
    assert_eq!(positions.top5, 5);
    assert_eq!(positions.total, 5);
    assert_eq!(positions.outside, 0);
    assert_eq!(report.paper_breakdown[1].position, Some(3));

    let deep = EvaluationEngine::new(EngineConfig {
        research_field_match_depth: 3,
        ..Default::default()
    });
    let report = deep.component_report(&dataset, Component::ResearchField, timestamp());
    assert_eq!(report.matrix.true_positives, 2);
}

#[test]
fn test_provenance_sections() {
    let dataset = Dataset::from_json_str(DATASET).unwrap();
    let engine = EvaluationEngine::default();

    let problem = engine.component_report(&dataset, Component::ResearchProblem, timestamp());
    let sources = problem.source_stats.unwrap();
    assert_eq!(sources.external, 1);
    assert_eq!(sources.generated, 0);
    assert_eq!(sources.external_accuracy, 1.0);

    let template = engine.component_report(&dataset, Component::Template, timestamp());
    let sources = template.source_stats.unwrap();
    assert_eq!(sources.generated, 2);
    assert_abs_diff_eq!(sources.generated_user_rating, 0.7, epsilon = 1e-12);
    assert_eq!(template.coverage.with_ground_truth, 0);
}

// ============================================================================
// Analysis & files
// ============================================================================

#[test]
fn test_analyze_and_write_reports() {
    let dataset = Dataset::from_json_str(DATASET).unwrap();
    let analysis = EvaluationEngine::default().analyze(&dataset, timestamp());

    let dir = tempdir().unwrap();
    for report in &analysis.reports {
        let path = dir.path().join(format!("{}.json", report.component));
        report.write_json(&path).unwrap();
        let back = ComponentReport::from_json_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(&back, report);
    }
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), Component::ALL.len());

    // Template ratings scale with expertise: r2's 3 becomes 0.9 against
    // r1's 0.6 on alpha, while both land in the top category on beta.
    let template = &analysis.agreement[&Component::Template];
    match &template.statistic {
        AgreementStatistic::FleissKappa(result) => {
            assert_eq!(result.n_papers, 2);
            assert_abs_diff_eq!(result.observed_agreement, 0.5, epsilon = 1e-12);
            assert_abs_diff_eq!(result.expected_agreement, 0.625, epsilon = 1e-12);
            assert_abs_diff_eq!(result.kappa, -1.0 / 3.0, epsilon = 1e-12);
            assert_eq!(result.interpretation, KappaInterpretation::Poor);
        }
        other => panic!("expected kappa, got {other:?}"),
    }
}

#[test]
fn test_parallel_and_sequential_agree() {
    let dataset = Dataset::from_json_str(DATASET).unwrap();
    let parallel = EvaluationEngine::default().analyze(&dataset, timestamp());
    let sequential = EvaluationEngine::new(EngineConfig {
        parallel: false,
        ..Default::default()
    })
    .analyze(&dataset, timestamp());
    assert_eq!(parallel, sequential);
}

#[test]
fn test_config_file_drives_engine() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("engine.json");
    std::fs::write(&path, r#"{"confidence_threshold": 0.65}"#).unwrap();

    let config = EngineConfig::from_json_file(&path).unwrap();
    let dataset = Dataset::from_json_str(DATASET).unwrap();
    let report = EvaluationEngine::new(config).component_report(&dataset, Component::Title, timestamp());

    // Beta's title (confidence 0.6) no longer counts as present.
    assert_eq!(report.confidence_threshold, 0.65);
    assert_eq!(report.paper_breakdown[1].classification, ClassificationLabel::FalseNegative);
}
