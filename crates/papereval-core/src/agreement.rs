//! Inter-Rater Agreement
//!
//! How consistently do evaluators score the same work?
//!
//! * **Fleiss' Kappa** over papers rated by at least two distinct
//!   evaluators ("shared" papers). Scores are bucketed into `k` equal-width
//!   categories over `[0, 1]`; a variable number of raters per paper is
//!   supported.
//! * **Variance agreement** per shared paper.
//! * **Cross-paper consistency** when too few papers are shared: the
//!   coefficient of variation of all evaluation scores, split by expertise
//!   tier and prior experience.
//! * **Distribution shape** of all scores: histogram and moments.

use crate::aggregation::ScoredEvaluation;
use crate::config::AgreementConfig;
use crate::stats::{
    coefficient_of_variation, histogram, kurtosis, mean, skewness, std_dev, unit_bucket, variance,
};
use crate::{ExpertiseTier, PaperId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

// ============================================================================
// Shared papers
// ============================================================================

/// A paper scored by two or more distinct evaluators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharedPaper {
    pub paper: PaperId,
    /// One score per distinct evaluator, first evaluation wins.
    pub scores: Vec<f64>,
}

/// Shared papers in order of first appearance.
pub fn shared_papers(evaluations: &[ScoredEvaluation]) -> Vec<SharedPaper> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, (PaperId, HashSet<&str>, Vec<f64>)> = HashMap::new();

    for evaluation in evaluations {
        let key = evaluation.paper.dedup_key();
        let entry = groups.entry(key.clone()).or_insert_with(|| {
            order.push(key);
            (evaluation.paper.clone(), HashSet::new(), Vec::new())
        });
        if entry.1.insert(evaluation.evaluator_id.as_str()) {
            entry.2.push(evaluation.fused.final_score);
        }
    }

    order
        .into_iter()
        .filter_map(|key| groups.remove(&key))
        .filter(|(_, _, scores)| scores.len() >= 2)
        .map(|(paper, _, scores)| SharedPaper { paper, scores })
        .collect()
}

// ============================================================================
// Fleiss' Kappa
// ============================================================================

/// Landis & Koch reading of a kappa value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KappaInterpretation {
    /// Below chance (κ < 0). Consumers that only know the five positive
    /// bands can read it as `slight`.
    Poor,
    Slight,
    Fair,
    Moderate,
    Substantial,
    AlmostPerfect,
}

impl KappaInterpretation {
    pub fn from_kappa(kappa: f64) -> Self {
        if kappa < 0.0 {
            KappaInterpretation::Poor
        } else if kappa < 0.2 {
            KappaInterpretation::Slight
        } else if kappa < 0.4 {
            KappaInterpretation::Fair
        } else if kappa < 0.6 {
            KappaInterpretation::Moderate
        } else if kappa < 0.8 {
            KappaInterpretation::Substantial
        } else {
            KappaInterpretation::AlmostPerfect
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FleissKappaResult {
    pub n_papers: usize,
    pub raters_per_paper: f64,
    pub categories: usize,
    /// `P̄`, mean per-paper agreement.
    pub observed_agreement: f64,
    /// `P̄e`, chance agreement from category marginals.
    pub expected_agreement: f64,
    pub kappa: f64,
    pub interpretation: KappaInterpretation,
}

/// Fleiss' Kappa over shared papers, or `None` when fewer than
/// `config.min_shared_papers` (at least 2) papers are shared.
pub fn fleiss_kappa(shared: &[SharedPaper], config: &AgreementConfig) -> Option<FleissKappaResult> {
    let k = config.categories.max(2);
    if shared.len() < config.min_shared_papers.max(2) {
        return None;
    }

    let mut category_totals = vec![0usize; k];
    let mut per_paper = Vec::with_capacity(shared.len());
    let mut total_ratings = 0usize;

    for paper in shared {
        let mut counts = vec![0usize; k];
        for &score in &paper.scores {
            counts[unit_bucket(score, k)] += 1;
        }
        let n = paper.scores.len() as f64;
        let sum_sq: f64 = counts.iter().map(|&c| (c * c) as f64).sum();
        per_paper.push((sum_sq - n) / (n * (n - 1.0)));

        for (total, count) in category_totals.iter_mut().zip(&counts) {
            *total += count;
        }
        total_ratings += paper.scores.len();
    }

    let observed = mean(&per_paper);
    let expected: f64 = category_totals
        .iter()
        .map(|&c| {
            let p = c as f64 / total_ratings as f64;
            p * p
        })
        .sum();

    let kappa = if (1.0 - expected).abs() < 1e-12 {
        if (observed - 1.0).abs() < 1e-12 {
            1.0
        } else {
            0.0
        }
    } else {
        (observed - expected) / (1.0 - expected)
    };

    Some(FleissKappaResult {
        n_papers: shared.len(),
        raters_per_paper: total_ratings as f64 / shared.len() as f64,
        categories: k,
        observed_agreement: observed,
        expected_agreement: expected,
        kappa,
        interpretation: KappaInterpretation::from_kappa(kappa),
    })
}

// ============================================================================
// Variance agreement
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgreementLevel {
    High,
    Medium,
    Low,
    Disagreement,
}

impl AgreementLevel {
    pub fn from_variance(variance: f64) -> Self {
        if variance < 0.01 {
            AgreementLevel::High
        } else if variance < 0.05 {
            AgreementLevel::Medium
        } else if variance <= 0.1 {
            AgreementLevel::Low
        } else {
            AgreementLevel::Disagreement
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarianceAgreement {
    pub paper: PaperId,
    pub raters: usize,
    pub mean: f64,
    pub variance: f64,
    pub level: AgreementLevel,
}

pub fn variance_agreement(shared: &[SharedPaper]) -> Vec<VarianceAgreement> {
    shared
        .iter()
        .map(|p| {
            let variance = variance(&p.scores);
            VarianceAgreement {
                paper: p.paper.clone(),
                raters: p.scores.len(),
                mean: mean(&p.scores),
                variance,
                level: AgreementLevel::from_variance(variance),
            }
        })
        .collect()
}

// ============================================================================
// Cross-paper consistency
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsistencyLevel {
    High,
    Moderate,
    Low,
}

impl ConsistencyLevel {
    pub fn from_cv(cv_percent: f64) -> Self {
        if cv_percent < 15.0 {
            ConsistencyLevel::High
        } else if cv_percent <= 25.0 {
            ConsistencyLevel::Moderate
        } else {
            ConsistencyLevel::Low
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupStats {
    pub mean: f64,
    pub std: f64,
    pub count: usize,
}

impl GroupStats {
    pub fn from_scores(scores: &[f64]) -> Self {
        Self {
            mean: mean(scores),
            std: std_dev(scores),
            count: scores.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossPaperConsistency {
    pub mean: f64,
    pub std: f64,
    pub cv_percent: f64,
    pub level: ConsistencyLevel,
    pub by_tier: BTreeMap<ExpertiseTier, GroupStats>,
    pub with_prior_experience: GroupStats,
    pub without_prior_experience: GroupStats,
}

pub fn cross_paper_consistency(evaluations: &[ScoredEvaluation]) -> CrossPaperConsistency {
    let scores: Vec<f64> = evaluations.iter().map(|e| e.fused.final_score).collect();
    let cv = coefficient_of_variation(&scores);

    let mut tiers: BTreeMap<ExpertiseTier, Vec<f64>> = BTreeMap::new();
    let (mut experienced, mut new) = (Vec::new(), Vec::new());
    for evaluation in evaluations {
        let score = evaluation.fused.final_score;
        tiers.entry(evaluation.tier).or_default().push(score);
        if evaluation.prior_experience {
            experienced.push(score);
        } else {
            new.push(score);
        }
    }

    CrossPaperConsistency {
        mean: mean(&scores),
        std: std_dev(&scores),
        cv_percent: cv,
        level: ConsistencyLevel::from_cv(cv),
        by_tier: tiers
            .into_iter()
            .map(|(tier, scores)| (tier, GroupStats::from_scores(&scores)))
            .collect(),
        with_prior_experience: GroupStats::from_scores(&experienced),
        without_prior_experience: GroupStats::from_scores(&new),
    }
}

// ============================================================================
// Assessment
// ============================================================================

/// The agreement statistic actually reported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AgreementStatistic {
    FleissKappa(FleissKappaResult),
    /// Too few shared papers for Kappa; cross-paper consistency instead.
    CrossPaperFallback {
        shared_papers: usize,
        consistency: CrossPaperConsistency,
    },
}

impl AgreementStatistic {
    pub fn is_fallback(&self) -> bool {
        matches!(self, AgreementStatistic::CrossPaperFallback { .. })
    }
}

pub fn assess(evaluations: &[ScoredEvaluation], config: &AgreementConfig) -> AgreementStatistic {
    let shared = shared_papers(evaluations);
    match fleiss_kappa(&shared, config) {
        Some(result) => AgreementStatistic::FleissKappa(result),
        None => AgreementStatistic::CrossPaperFallback {
            shared_papers: shared.len(),
            consistency: cross_paper_consistency(evaluations),
        },
    }
}

// ============================================================================
// Distribution shape
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionShape {
    pub histogram: Vec<usize>,
    pub mean: f64,
    pub std: f64,
    pub skewness: f64,
    pub kurtosis: f64,
}

impl DistributionShape {
    pub fn from_scores(scores: &[f64], config: &AgreementConfig) -> Self {
        let sd = std_dev(scores);
        let raw_kurtosis = kurtosis(scores);
        let kurtosis = if config.excess_kurtosis && sd >= 1e-12 {
            raw_kurtosis - 3.0
        } else {
            raw_kurtosis
        };
        Self {
            histogram: histogram(scores, config.histogram_bins),
            mean: mean(scores),
            std: sd,
            skewness: skewness(scores),
            kurtosis,
        }
    }
}

/// Everything the agreement engine reports for one component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgreementReport {
    pub statistic: AgreementStatistic,
    pub variance: Vec<VarianceAgreement>,
    pub consistency: CrossPaperConsistency,
    pub shape: DistributionShape,
}

pub fn agreement_report(evaluations: &[ScoredEvaluation], config: &AgreementConfig) -> AgreementReport {
    let shared = shared_papers(evaluations);
    let scores: Vec<f64> = evaluations.iter().map(|e| e.fused.final_score).collect();
    AgreementReport {
        statistic: assess(evaluations, config),
        variance: variance_agreement(&shared),
        consistency: cross_paper_consistency(evaluations),
        shape: DistributionShape::from_scores(&scores, config),
    }
}
