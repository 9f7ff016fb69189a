//! Versioned per-component export artifact.
//!
//! Field names are a stable contract with downstream tooling: everything
//! serializes camelCase, optional sections are omitted when absent, and
//! `schemaVersion` changes whenever a field is renamed or removed.

use crate::aggregation::{Coverage, PaperScore, PositionStats, ProvenanceStats, ScoringStats};
use crate::classification::{ClassificationLabel, ClassificationMetrics, ConfusionMatrix};
use crate::component::Component;
use crate::fusion::ScoreMethod;
use crate::{Paper, Provenance};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const SCHEMA_VERSION: &str = "1.0";

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One row per unique paper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaperBreakdown {
    pub doi: String,
    pub title: Option<String>,
    pub ground_truth: Option<String>,
    pub system_prediction: Option<String>,
    pub classification: ClassificationLabel,
    pub score: Option<f64>,
    pub score_method: Option<ScoreMethod>,
    /// Mean raw 1-5 rating across the paper's evaluations.
    pub user_rating: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<Provenance>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<u32>,
}

impl PaperBreakdown {
    pub fn new(paper: &Paper, component: Component, score: &PaperScore) -> Self {
        let profile = component.profile();
        Self {
            doi: paper.id.to_string(),
            title: paper.title.clone(),
            ground_truth: paper.reference(component).map(str::to_string),
            system_prediction: paper
                .system_output
                .get(component)
                .filter(|v| !v.is_empty())
                .map(|v| v.value.clone()),
            classification: score.label,
            score: score.score,
            score_method: score.method,
            user_rating: score.mean_rating,
            source: score.provenance.filter(|_| profile.tracks_provenance),
            position: score.position,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportCounts {
    pub total_evaluations: usize,
    pub total_unique_papers: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentReport {
    pub schema_version: String,
    pub component: Component,
    pub confidence_threshold: f64,
    pub matrix: ConfusionMatrix,
    pub metrics: ClassificationMetrics,
    pub paper_breakdown: Vec<PaperBreakdown>,
    pub coverage: Coverage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_stats: Option<ProvenanceStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position_stats: Option<PositionStats>,
    pub scoring_stats: ScoringStats,
    pub counts: ReportCounts,
    pub timestamp: DateTime<Utc>,
}

impl ComponentReport {
    pub fn to_json_pretty(&self) -> Result<String, ExportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_json(&self, path: &Path) -> Result<(), ExportError> {
        std::fs::write(path, self.to_json_pretty()?)?;
        Ok(())
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ExportError> {
        Ok(serde_json::from_str(raw)?)
    }
}
