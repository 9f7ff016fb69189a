//! Classification Engine: per-paper confusion labels and the aggregate matrix.
//!
//! ```text
//!                 system present          system absent
//!              ┌───────────┬───────────┬───────────────┐
//!  gt present  │ match: TP │ differ: FP│      FN       │
//!              ├───────────┴───────────┼───────────────┤
//!  gt absent   │          FP           │      TN       │
//!              └───────────────────────┴───────────────┘
//! ```
//!
//! "System present" means a non-empty value whose declared confidence
//! reaches the configured threshold. Papers are deduplicated by DOI
//! before counting; the first occurrence wins.

use crate::component::{Component, MetricKind};
use crate::config::EngineConfig;
use crate::metrics::text::values_match;
use crate::stats::ratio;
use crate::{Paper, PaperId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClassificationLabel {
    #[serde(rename = "TP")]
    TruePositive,
    #[serde(rename = "FN")]
    FalseNegative,
    #[serde(rename = "FP")]
    FalsePositive,
    #[serde(rename = "TN")]
    TrueNegative,
    /// The component has no ground-truth concept.
    #[serde(rename = "N/A")]
    NotApplicable,
}

impl ClassificationLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClassificationLabel::TruePositive => "TP",
            ClassificationLabel::FalseNegative => "FN",
            ClassificationLabel::FalsePositive => "FP",
            ClassificationLabel::TrueNegative => "TN",
            ClassificationLabel::NotApplicable => "N/A",
        }
    }
}

/// Aggregate counts over unique papers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    #[serde(rename = "tp")]
    pub true_positives: usize,
    #[serde(rename = "fn")]
    pub false_negatives: usize,
    #[serde(rename = "fp")]
    pub false_positives: usize,
    #[serde(rename = "tn")]
    pub true_negatives: usize,
}

impl ConfusionMatrix {
    pub fn from_labels<I: IntoIterator<Item = ClassificationLabel>>(labels: I) -> Self {
        let mut matrix = Self::default();
        for label in labels {
            matrix.record(label);
        }
        matrix
    }

    pub fn record(&mut self, label: ClassificationLabel) {
        match label {
            ClassificationLabel::TruePositive => self.true_positives += 1,
            ClassificationLabel::FalseNegative => self.false_negatives += 1,
            ClassificationLabel::FalsePositive => self.false_positives += 1,
            ClassificationLabel::TrueNegative => self.true_negatives += 1,
            ClassificationLabel::NotApplicable => {}
        }
    }

    pub fn total(&self) -> usize {
        self.true_positives + self.false_negatives + self.false_positives + self.true_negatives
    }

    pub fn metrics(&self) -> ClassificationMetrics {
        let tp = self.true_positives as f64;
        let fp = self.false_positives as f64;
        let fn_ = self.false_negatives as f64;
        let tn = self.true_negatives as f64;
        let precision = ratio(tp, tp + fp);
        let recall = ratio(tp, tp + fn_);
        ClassificationMetrics {
            accuracy: ratio(tp + tn, self.total() as f64),
            precision,
            recall,
            f1_score: ratio(2.0 * precision * recall, precision + recall),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
}

/// The decision for one unique paper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperClassification {
    pub paper: PaperId,
    pub label: ClassificationLabel,
    pub gt_present: bool,
    pub sys_present: bool,
}

/// Papers deduplicated by DOI, in first-occurrence order.
pub fn unique_papers(papers: &[Paper]) -> Vec<&Paper> {
    let mut seen = HashSet::new();
    papers
        .iter()
        .filter(|p| seen.insert(p.id.dedup_key()))
        .collect()
}

/// Classify one paper for one component.
pub fn classify(paper: &Paper, component: Component, config: &EngineConfig) -> PaperClassification {
    let profile = component.profile();
    let reference = paper.reference(component);
    let system = paper
        .system_output
        .get(component)
        .filter(|s| !s.is_empty() && s.confidence >= config.confidence_threshold);

    let gt_present = reference.is_some();
    let sys_present = system.is_some();

    let label = if !profile.classifiable {
        ClassificationLabel::NotApplicable
    } else {
        match (reference, system) {
            (Some(reference), Some(value)) => {
                let matched = if profile.kind == MetricKind::Ranking {
                    ranked_match(paper, reference, config.research_field_match_depth)
                        || values_match(reference, &value.value)
                } else {
                    values_match(reference, &value.value)
                };
                if matched {
                    ClassificationLabel::TruePositive
                } else {
                    ClassificationLabel::FalsePositive
                }
            }
            (Some(_), None) => ClassificationLabel::FalseNegative,
            (None, Some(_)) => ClassificationLabel::FalsePositive,
            (None, None) => ClassificationLabel::TrueNegative,
        }
    };

    PaperClassification {
        paper: paper.id.clone(),
        label,
        gt_present,
        sys_present,
    }
}

fn ranked_match(paper: &Paper, reference: &str, depth: usize) -> bool {
    paper
        .system_output
        .field_predictions
        .iter()
        .take(depth)
        .any(|p| values_match(reference, &p.label))
}

/// Labels for every unique paper plus the aggregate matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub component: Component,
    pub papers: Vec<PaperClassification>,
    pub matrix: ConfusionMatrix,
    pub metrics: ClassificationMetrics,
}

impl ClassificationResult {
    /// Unique papers with an applicable label.
    pub fn applicable(&self) -> usize {
        self.papers
            .iter()
            .filter(|p| p.label != ClassificationLabel::NotApplicable)
            .count()
    }
}

pub fn classify_component(
    papers: &[Paper],
    component: Component,
    config: &EngineConfig,
) -> ClassificationResult {
    let classified: Vec<PaperClassification> = unique_papers(papers)
        .into_iter()
        .map(|p| classify(p, component, config))
        .collect();
    let matrix = ConfusionMatrix::from_labels(classified.iter().map(|c| c.label));
    ClassificationResult {
        component,
        metrics: matrix.metrics(),
        papers: classified,
        matrix,
    }
}
