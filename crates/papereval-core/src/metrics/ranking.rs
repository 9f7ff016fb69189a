//! Position-ladder scoring for ranked research-field predictions.
//!
//! | rank     | position score |
//! |----------|----------------|
//! | 1        | 1.0            |
//! | 2–3      | 0.8            |
//! | 4–5      | 0.6            |
//! | > 5/none | not computable |

use super::text::values_match;
use crate::hierarchy::{relation, FieldHierarchy, FieldRelation};
use crate::FieldPrediction;
use serde::{Deserialize, Serialize};

/// Deepest rank that still earns a position score.
pub const LADDER_DEPTH: u32 = 5;

const EXACT_WEIGHT: f64 = 0.4;
const TOP3_WEIGHT: f64 = 0.3;
const POSITION_WEIGHT: f64 = 0.3;

/// Scores for one ranked answer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RankingScore {
    /// 1-based rank of the reference, if found within the ladder.
    pub position: Option<u32>,
    pub exact_match: bool,
    pub in_top3: bool,
    pub position_score: Option<f64>,
    /// `0.4*exact + 0.3*top3 + 0.3*position`; `None` outside the ladder.
    pub overall: Option<f64>,
}

pub fn position_score(position: u32) -> Option<f64> {
    match position {
        1 => Some(1.0),
        2..=3 => Some(0.8),
        4..=5 => Some(0.6),
        _ => None,
    }
}

/// Score a found position (`None` when the reference was not found).
pub fn score_position(position: Option<u32>) -> RankingScore {
    let position = position.filter(|p| (1..=LADDER_DEPTH).contains(p));
    let Some(rank) = position else {
        return RankingScore::default();
    };
    let score = position_score(rank);
    let exact_match = rank == 1;
    let in_top3 = rank <= 3;
    RankingScore {
        position,
        exact_match,
        in_top3,
        position_score: score,
        overall: score.map(|s| {
            EXACT_WEIGHT * f64::from(u8::from(exact_match))
                + TOP3_WEIGHT * f64::from(u8::from(in_top3))
                + POSITION_WEIGHT * s
        }),
    }
}

/// 1-based rank of `reference` among `predictions`.
pub fn find_position(reference: &str, predictions: &[FieldPrediction]) -> Option<u32> {
    predictions
        .iter()
        .position(|p| values_match(reference, &p.label))
        .and_then(|i| u32::try_from(i + 1).ok())
}

/// Closest taxonomy neighbour among the predictions when no exact match
/// exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelatedMatch {
    pub position: u32,
    pub label: String,
    pub relation: FieldRelation,
    pub relevance: f64,
}

/// Best related prediction within the ladder, by relevance then rank.
pub fn best_related(
    hierarchy: &dyn FieldHierarchy,
    reference: &str,
    predictions: &[FieldPrediction],
) -> Option<RelatedMatch> {
    predictions
        .iter()
        .take(LADDER_DEPTH as usize)
        .enumerate()
        .filter_map(|(i, p)| {
            let rel = relation(hierarchy, reference, &p.label);
            (rel != FieldRelation::Unrelated).then(|| RelatedMatch {
                position: i as u32 + 1,
                label: p.label.clone(),
                relation: rel,
                relevance: rel.relevance(),
            })
        })
        .fold(None, |best: Option<RelatedMatch>, candidate| match best {
            Some(b) if b.relevance >= candidate.relevance => Some(b),
            _ => Some(candidate),
        })
}
