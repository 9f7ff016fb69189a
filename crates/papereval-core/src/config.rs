//! Engine configuration.
//!
//! Every tunable constant of the scoring pipeline lives here so that a
//! report can always be reproduced from `(dataset, config)`.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration for [`crate::EvaluationEngine`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Minimum system confidence for a value to count as "present".
    pub confidence_threshold: f64,
    /// Unique papers with ground truth needed before the confusion matrix
    /// is considered interpretable.
    pub min_ground_truth_coverage: usize,
    /// A research-field prediction counts as a match when the reference is
    /// within this many top predictions.
    pub research_field_match_depth: usize,
    /// Compute per-paper work with rayon.
    pub parallel: bool,
    pub fusion: FusionConfig,
    pub content: ContentConfig,
    pub agreement: AgreementConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.5,
            min_ground_truth_coverage: 3,
            research_field_match_depth: 1,
            parallel: true,
            fusion: FusionConfig::default(),
            content: ContentConfig::default(),
            agreement: AgreementConfig::default(),
        }
    }
}

/// Base weights of the score fusion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    pub base_auto_weight: f64,
    pub base_user_weight: f64,
    /// Maximum relative boost when automated and human scores agree.
    pub agreement_bonus_factor: f64,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            base_auto_weight: 0.6,
            base_user_weight: 0.4,
            agreement_bonus_factor: 0.1,
        }
    }
}

/// Fallback credit for content properties without a template-match signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    pub default_confidence: f64,
    pub evidence_bonus: f64,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            default_confidence: 0.7,
            evidence_bonus: 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgreementConfig {
    /// Number of rating categories for Fleiss' Kappa.
    pub categories: usize,
    /// Shared papers required before Fleiss' Kappa is reported.
    pub min_shared_papers: usize,
    pub histogram_bins: usize,
    /// Report kurtosis minus 3.
    pub excess_kurtosis: bool,
}

impl Default for AgreementConfig {
    fn default() -> Self {
        Self {
            categories: 5,
            min_shared_papers: 2,
            histogram_bins: 5,
            excess_kurtosis: false,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{field} must be within [0, 1], got {value}")]
    OutOfUnitRange { field: &'static str, value: f64 },

    #[error("{field} must be positive, got {value}")]
    NonPositive { field: &'static str, value: f64 },

    #[error("{field} must be at least {min}, got {value}")]
    TooSmall {
        field: &'static str,
        min: usize,
        value: usize,
    },
}

impl EngineConfig {
    /// Load a JSON config file; missing keys take their defaults.
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: EngineConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        unit("confidence_threshold", self.confidence_threshold)?;
        unit("fusion.agreement_bonus_factor", self.fusion.agreement_bonus_factor)?;
        unit("content.default_confidence", self.content.default_confidence)?;
        unit("content.evidence_bonus", self.content.evidence_bonus)?;
        positive("fusion.base_auto_weight", self.fusion.base_auto_weight)?;
        positive("fusion.base_user_weight", self.fusion.base_user_weight)?;
        at_least("research_field_match_depth", 1, self.research_field_match_depth)?;
        at_least("agreement.categories", 2, self.agreement.categories)?;
        at_least("agreement.min_shared_papers", 2, self.agreement.min_shared_papers)?;
        at_least("agreement.histogram_bins", 1, self.agreement.histogram_bins)?;
        Ok(())
    }
}

fn unit(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfUnitRange { field, value })
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { field, value })
    }
}

fn at_least(field: &'static str, min: usize, value: usize) -> Result<(), ConfigError> {
    if value >= min {
        Ok(())
    } else {
        Err(ConfigError::TooSmall { field, min, value })
    }
}
