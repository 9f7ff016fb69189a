//! Score Fusion: automated score ⊕ expertise-weighted human rating
//!
//! ```text
//! automated ──► confidence(·) ──► autoWeightRaw = max(floor, baseAuto * conf)
//! rating/5  ──────────────────► userWeightRaw = baseUser * expertise
//!                                     │
//!                         normalize so weights sum to 1
//!                                     │
//!              combined = auto*autoWeight + rating*userWeight
//!              agreement = 1 - |auto - rating/5|
//!              final = min(1, combined * (1 + agreement * 0.1))
//! ```
//!
//! Every intermediate is kept in the [`FusedScore`] so a final score can
//! always be explained as a breakdown.

use crate::component::ComponentProfile;
use crate::confidence::system_confidence;
use crate::config::FusionConfig;
use serde::{Deserialize, Serialize};

/// Which inputs produced a final score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreMethod {
    /// Automated score and user rating fused.
    Hybrid,
    /// No user rating; the automated score stands alone.
    AutomatedOnly,
    /// Automated score not computable; the user rating stands alone.
    UserRatingOnly,
}

/// Intermediates of a hybrid fusion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FusionBreakdown {
    pub system_confidence: f64,
    pub auto_weight_floor: f64,
    pub auto_weight_raw: f64,
    pub user_weight_raw: f64,
    pub auto_weight: f64,
    pub user_weight: f64,
    /// The rating term entering the combination.
    pub rating_used: f64,
    pub combined: f64,
    pub agreement: f64,
    pub agreement_bonus: f64,
}

/// A fused score with its full audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FusedScore {
    pub method: ScoreMethod,
    pub automated_score: Option<f64>,
    pub rating: Option<u8>,
    pub normalized_rating: Option<f64>,
    pub expertise_multiplier: f64,
    /// `min(1, normalized_rating * expertise_multiplier)`.
    pub adjusted_rating: Option<f64>,
    pub breakdown: Option<FusionBreakdown>,
    pub uncapped_score: f64,
    /// Always within `[0, 1]`.
    pub final_score: f64,
    /// Whether `uncapped_score` exceeded 1 and was capped.
    pub is_capped: bool,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FusionError {
    #[error("rating must be within 1..=5, got {0}")]
    RatingOutOfRange(u8),
    #[error("expertise multiplier must be finite and positive, got {0}")]
    InvalidMultiplier(f64),
    #[error("automated score must be within [0, 1], got {0}")]
    AutomatedOutOfRange(f64),
    #[error("neither an automated score nor a rating is available")]
    NothingToFuse,
}

/// Fuse an automated score and a user rating.
///
/// Degrades to [`ScoreMethod::AutomatedOnly`] or
/// [`ScoreMethod::UserRatingOnly`] when one side is missing.
pub fn fuse(
    automated: Option<f64>,
    rating: Option<u8>,
    expertise_multiplier: f64,
    profile: &ComponentProfile,
    config: &FusionConfig,
) -> Result<FusedScore, FusionError> {
    if let Some(r) = rating {
        if !(1..=5).contains(&r) {
            return Err(FusionError::RatingOutOfRange(r));
        }
    }
    if !expertise_multiplier.is_finite() || expertise_multiplier <= 0.0 {
        return Err(FusionError::InvalidMultiplier(expertise_multiplier));
    }
    if let Some(a) = automated {
        if !(0.0..=1.0).contains(&a) {
            return Err(FusionError::AutomatedOutOfRange(a));
        }
    }

    let normalized_rating = rating.map(|r| f64::from(r) / 5.0);
    let scaled_rating = normalized_rating.map(|nr| nr * expertise_multiplier);
    let adjusted_rating = scaled_rating.map(|s| s.min(1.0));
    let rating_used = if profile.expertise_scales_rating {
        adjusted_rating
    } else {
        normalized_rating
    };

    let base = FusedScore {
        method: ScoreMethod::Hybrid,
        automated_score: automated,
        rating,
        normalized_rating,
        expertise_multiplier,
        adjusted_rating,
        breakdown: None,
        uncapped_score: 0.0,
        final_score: 0.0,
        is_capped: false,
    };

    match (automated, normalized_rating, rating_used) {
        (Some(auto), Some(nr), Some(used)) => {
            let confidence = system_confidence(auto);
            let auto_weight_raw = (config.base_auto_weight * confidence).max(profile.auto_weight_floor);
            let user_weight_raw = config.base_user_weight * expertise_multiplier;
            let auto_weight = auto_weight_raw / (auto_weight_raw + user_weight_raw);
            let user_weight = 1.0 - auto_weight;
            let combined = auto * auto_weight + used * user_weight;
            let agreement = 1.0 - (auto - nr).abs();
            let agreement_bonus = agreement * config.agreement_bonus_factor;
            let uncapped = combined * (1.0 + agreement_bonus);
            Ok(FusedScore {
                breakdown: Some(FusionBreakdown {
                    system_confidence: confidence,
                    auto_weight_floor: profile.auto_weight_floor,
                    auto_weight_raw,
                    user_weight_raw,
                    auto_weight,
                    user_weight,
                    rating_used: used,
                    combined,
                    agreement,
                    agreement_bonus,
                }),
                ..capped(base, uncapped)
            })
        }
        (Some(auto), None, _) => Ok(FusedScore {
            method: ScoreMethod::AutomatedOnly,
            ..capped(base, auto)
        }),
        (None, Some(nr), _) => {
            let uncapped = if profile.expertise_scales_rating {
                scaled_rating.unwrap_or(nr)
            } else {
                nr
            };
            Ok(FusedScore {
                method: ScoreMethod::UserRatingOnly,
                ..capped(base, uncapped)
            })
        }
        _ => Err(FusionError::NothingToFuse),
    }
}

fn capped(mut score: FusedScore, uncapped: f64) -> FusedScore {
    score.uncapped_score = uncapped;
    score.final_score = uncapped.clamp(0.0, 1.0);
    score.is_capped = uncapped > 1.0;
    score
}
