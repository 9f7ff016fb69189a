//! Aggregation & Statistics Engine
//!
//! Two granularities are aggregated:
//!
//! * [`ScoredEvaluation`]: one per `(paper, evaluation)`. Repeated
//!   evaluations of the same paper all count.
//! * [`PaperScore`]: one per unique paper, summarizing its evaluations.
//!
//! Coverage, provenance and scoring summaries are computed over unique
//! papers; score distributions and rank buckets over evaluations.

use crate::classification::ClassificationLabel;
use crate::fusion::{FusedScore, ScoreMethod};
use crate::metrics::ranking::LADDER_DEPTH;
use crate::stats::{mean, ratio, ScoreStats};
use crate::{ExpertiseTier, PaperId, Provenance};
use serde::{Deserialize, Serialize};

/// A fused score for one evaluation of one paper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredEvaluation {
    pub paper: PaperId,
    pub evaluator_id: String,
    pub tier: ExpertiseTier,
    pub prior_experience: bool,
    /// Rank at which the correct answer was found (ranking components).
    pub position: Option<u32>,
    pub provenance: Option<Provenance>,
    pub fused: FusedScore,
}

/// Per-evaluation final scores.
pub fn evaluation_stats(evaluations: &[ScoredEvaluation]) -> ScoreStats {
    let scores: Vec<f64> = evaluations.iter().map(|e| e.fused.final_score).collect();
    ScoreStats::from_scores(&scores)
}

/// Everything known about one unique paper for one component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperScore {
    pub paper: PaperId,
    pub has_ground_truth: bool,
    pub automated_score: Option<f64>,
    pub provenance: Option<Provenance>,
    pub label: ClassificationLabel,
    /// Mean final score of the paper's evaluations, or the automated
    /// score when nobody rated it.
    pub score: Option<f64>,
    pub method: Option<ScoreMethod>,
    /// Mean raw 1-5 rating.
    pub mean_rating: Option<f64>,
    pub position: Option<u32>,
    pub evaluations: usize,
}

impl PaperScore {
    pub fn summarize(
        paper: PaperId,
        has_ground_truth: bool,
        automated_score: Option<f64>,
        provenance: Option<Provenance>,
        label: ClassificationLabel,
        position: Option<u32>,
        evaluations: &[&ScoredEvaluation],
    ) -> Self {
        let finals: Vec<f64> = evaluations.iter().map(|e| e.fused.final_score).collect();
        let ratings: Vec<f64> = evaluations
            .iter()
            .filter_map(|e| e.fused.rating.map(f64::from))
            .collect();

        let (score, method) = if !finals.is_empty() {
            (Some(mean(&finals)), Some(paper_method(evaluations)))
        } else {
            (automated_score, automated_score.map(|_| ScoreMethod::AutomatedOnly))
        };

        Self {
            paper,
            has_ground_truth,
            automated_score,
            provenance,
            label,
            score,
            method,
            mean_rating: (!ratings.is_empty()).then(|| mean(&ratings)),
            position,
            evaluations: evaluations.len(),
        }
    }
}

fn paper_method(evaluations: &[&ScoredEvaluation]) -> ScoreMethod {
    let methods = || evaluations.iter().map(|e| e.fused.method);
    if methods().any(|m| m == ScoreMethod::Hybrid) {
        ScoreMethod::Hybrid
    } else if methods().any(|m| m == ScoreMethod::UserRatingOnly) {
        ScoreMethod::UserRatingOnly
    } else {
        ScoreMethod::AutomatedOnly
    }
}

// ============================================================================
// Rank distribution
// ============================================================================

/// Cumulative rank buckets for ranking-style components.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionStats {
    pub top1: usize,
    pub top3: usize,
    pub top5: usize,
    pub outside: usize,
    pub total: usize,
}

impl PositionStats {
    /// Missing positions and positions past the ladder count as outside.
    pub fn from_positions<I: IntoIterator<Item = Option<u32>>>(positions: I) -> Self {
        let mut stats = Self::default();
        for position in positions {
            stats.total += 1;
            match position.filter(|p| (1..=LADDER_DEPTH).contains(p)) {
                Some(p) => {
                    stats.top1 += usize::from(p == 1);
                    stats.top3 += usize::from(p <= 3);
                    stats.top5 += 1;
                }
                None => stats.outside += 1,
            }
        }
        stats
    }

    /// `(top1, top3, top5)` as shares of all evaluations.
    pub fn rates(&self) -> (f64, f64, f64) {
        let total = self.total as f64;
        (
            ratio(self.top1 as f64, total),
            ratio(self.top3 as f64, total),
            ratio(self.top5 as f64, total),
        )
    }
}

// ============================================================================
// Provenance split
// ============================================================================

/// External answers are checked against ground truth; generated answers
/// have none, so they are judged by user ratings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ProvenanceStats {
    #[serde(rename = "orkg")]
    pub external: usize,
    #[serde(rename = "llm")]
    pub generated: usize,
    /// Share of external answers with ground truth labelled TP.
    #[serde(rename = "orkgAccuracy")]
    pub external_accuracy: f64,
    /// Mean normalized rating of generated answers.
    #[serde(rename = "llmUserRating")]
    pub generated_user_rating: f64,
}

impl ProvenanceStats {
    pub fn from_papers(papers: &[PaperScore]) -> Self {
        let external: Vec<&PaperScore> = papers
            .iter()
            .filter(|p| p.provenance == Some(Provenance::External))
            .collect();
        let generated: Vec<&PaperScore> = papers
            .iter()
            .filter(|p| p.provenance == Some(Provenance::Generated))
            .collect();

        let checked = external.iter().filter(|p| p.has_ground_truth).count();
        let correct = external
            .iter()
            .filter(|p| p.has_ground_truth && p.label == ClassificationLabel::TruePositive)
            .count();
        let generated_ratings: Vec<f64> = generated
            .iter()
            .filter_map(|p| p.mean_rating.map(|r| r / 5.0))
            .collect();

        Self {
            external: external.len(),
            generated: generated.len(),
            external_accuracy: ratio(correct as f64, checked as f64),
            generated_user_rating: mean(&generated_ratings),
        }
    }
}

// ============================================================================
// Scoring summary & coverage
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringStats {
    /// Mean final score over evaluations; papers nobody evaluated
    /// contribute their automated score.
    pub overall_score: f64,
    /// Mean automated score over papers with ground truth.
    pub gt_based_score: f64,
    /// Mean normalized user rating over rated papers.
    pub user_rating_score: f64,
    pub scored_papers: usize,
    pub gt_scored_papers: usize,
    pub user_rated_papers: usize,
}

impl ScoringStats {
    pub fn compute(papers: &[PaperScore], evaluations: &[ScoredEvaluation]) -> Self {
        let overall: Vec<f64> = evaluations
            .iter()
            .map(|e| e.fused.final_score)
            .chain(
                papers
                    .iter()
                    .filter(|p| p.evaluations == 0)
                    .filter_map(|p| p.automated_score),
            )
            .collect();
        let gt_scores: Vec<f64> = papers
            .iter()
            .filter(|p| p.has_ground_truth)
            .filter_map(|p| p.automated_score)
            .collect();
        let ratings: Vec<f64> = papers
            .iter()
            .filter_map(|p| p.mean_rating.map(|r| r / 5.0))
            .collect();

        Self {
            overall_score: mean(&overall),
            gt_based_score: mean(&gt_scores),
            user_rating_score: mean(&ratings),
            scored_papers: papers.iter().filter(|p| p.score.is_some()).count(),
            gt_scored_papers: gt_scores.len(),
            user_rated_papers: ratings.len(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coverage {
    pub total_papers: usize,
    pub with_ground_truth: usize,
    pub without_ground_truth: usize,
    /// Too few papers with ground truth to interpret the confusion matrix.
    pub insufficient_ground_truth: bool,
}

impl Coverage {
    pub fn from_papers(papers: &[PaperScore], min_ground_truth: usize) -> Self {
        let with_ground_truth = papers.iter().filter(|p| p.has_ground_truth).count();
        Self {
            total_papers: papers.len(),
            with_ground_truth,
            without_ground_truth: papers.len() - with_ground_truth,
            insufficient_ground_truth: with_ground_truth < min_ground_truth,
        }
    }
}
