//! Papereval Core: Hybrid Scoring for Extraction Evaluations
//!
//! This crate scores the output of an academic-paper extraction pipeline
//! against ground truth and against ratings from human evaluators.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────────┐
//! │                        EVALUATION SCORING PIPELINE                       │
//! ├──────────────────────────────────────────────────────────────────────────┤
//! │                                                                          │
//! │  raw JSON ──► normalize ──► Dataset (Paper, Evaluation, Evaluator)       │
//! │                                  │                                       │
//! │                                  ▼                                       │
//! │  ┌──────────────┐   ┌────────────────┐   ┌──────────────────────────┐    │
//! │  │   metrics    │──►│   confidence   │──►│         fusion           │    │
//! │  │ (automated)  │   │  (U-shaped)    │   │ auto ⊕ expertise rating  │    │
//! │  └──────┬───────┘   └────────────────┘   └────────────┬─────────────┘    │
//! │         │                                             │                  │
//! │         ▼                                             ▼                  │
//! │  ┌──────────────┐                      ┌──────────────────────────┐      │
//! │  │classification│                      │ aggregation / agreement  │      │
//! │  │ TP FP FN TN  │                      │ stats, κ, CV, shape      │      │
//! │  └──────┬───────┘                      └────────────┬─────────────┘      │
//! │         └───────────────────┬───────────────────────┘                    │
//! │                             ▼                                            │
//! │                      export::ComponentReport                             │
//! │                                                                          │
//! └──────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything is a pure function of its arguments: the engine never reads
//! ambient state and never mutates its inputs.

pub mod agreement;
pub mod aggregation;
pub mod classification;
pub mod component;
pub mod confidence;
pub mod config;
pub mod engine;
pub mod export;
pub mod fusion;
pub mod hierarchy;
pub mod metrics;
pub mod normalize;
pub mod stats;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ============================================================================
// Core Types
// ============================================================================

/// Identifier of a paper: its DOI, or a fallback token when no DOI exists.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaperId(pub String);

const DOI_PREFIXES: [&str; 5] = [
    "https://doi.org/",
    "http://doi.org/",
    "https://dx.doi.org/",
    "http://dx.doi.org/",
    "doi:",
];

impl PaperId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Key used for deduplication: lowercase, without resolver prefixes.
    pub fn dedup_key(&self) -> String {
        let trimmed = self.0.trim().to_lowercase();
        DOI_PREFIXES
            .iter()
            .find_map(|prefix| trimmed.strip_prefix(prefix))
            .map(|rest| rest.trim().to_string())
            .unwrap_or(trimmed)
    }
}

impl fmt::Display for PaperId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where an answer came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// Retrieved from an external reference source.
    #[serde(alias = "orkg")]
    External,
    /// Generated by the extraction system itself.
    #[serde(alias = "llm")]
    Generated,
}

/// Reference values for a paper, keyed by component.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroundTruth {
    pub values: BTreeMap<component::Component, String>,
}

impl GroundTruth {
    /// Non-empty reference value for a component.
    pub fn get(&self, component: component::Component) -> Option<&str> {
        self.values
            .get(&component)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn with(mut self, component: component::Component, value: impl Into<String>) -> Self {
        self.values.insert(component, value.into());
        self
    }
}

/// A single extracted value with the system's declared confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemValue {
    pub value: String,
    pub confidence: f64,
    pub source: Option<Provenance>,
    pub evidence: Option<String>,
}

impl SystemValue {
    pub fn new(value: impl Into<String>, confidence: f64) -> Self {
        Self {
            value: value.into(),
            confidence,
            source: None,
            evidence: None,
        }
    }

    pub fn with_source(mut self, source: Provenance) -> Self {
        self.source = Some(source);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.value.trim().is_empty()
    }
}

/// One ranked research-field prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldPrediction {
    pub label: String,
    pub score: f64,
}

/// A property annotated by free-form content extraction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentProperty {
    pub name: String,
    pub value: String,
    pub confidence: Option<f64>,
    pub evidence: Option<String>,
    /// Whether the property matched a template property, when known.
    pub template_match: Option<bool>,
}

/// Content extraction output for one paper.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentExtraction {
    pub properties: Vec<ContentProperty>,
    /// Number of properties the selected template defines.
    pub template_property_count: usize,
}

/// Everything the extraction pipeline produced for a paper.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemOutput {
    pub values: BTreeMap<component::Component, SystemValue>,
    /// Ranked research-field predictions, best first.
    pub field_predictions: Vec<FieldPrediction>,
    pub content: Option<ContentExtraction>,
}

impl SystemOutput {
    pub fn get(&self, component: component::Component) -> Option<&SystemValue> {
        self.values.get(&component)
    }

    pub fn with(mut self, component: component::Component, value: SystemValue) -> Self {
        self.values.insert(component, value);
        self
    }

    /// Sets the ranked predictions; the top one also becomes the
    /// research-field system value.
    pub fn with_field_predictions(mut self, predictions: Vec<FieldPrediction>) -> Self {
        if let Some(top) = predictions.first() {
            self.values.insert(
                component::Component::ResearchField,
                SystemValue::new(top.label.clone(), top.score),
            );
        }
        self.field_predictions = predictions;
        self
    }
}

/// Coarse expertise bucket derived from the expertise multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpertiseTier {
    Basic,
    Intermediate,
    Advanced,
    Expert,
}

impl ExpertiseTier {
    pub fn from_multiplier(multiplier: f64) -> Self {
        if multiplier < 1.0 {
            ExpertiseTier::Basic
        } else if multiplier < 1.3 {
            ExpertiseTier::Intermediate
        } else if multiplier < 1.6 {
            ExpertiseTier::Advanced
        } else {
            ExpertiseTier::Expert
        }
    }
}

pub const MIN_EXPERTISE_MULTIPLIER: f64 = 0.8;
pub const MAX_EXPERTISE_MULTIPLIER: f64 = 2.0;

/// A human evaluator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluator {
    pub id: String,
    pub role: Option<String>,
    /// Weight of this evaluator's ratings, in `[0.8, 2.0]`.
    pub expertise_multiplier: f64,
    /// Whether the evaluator has used the knowledge graph before.
    pub prior_experience: bool,
}

impl Evaluator {
    pub fn new(id: impl Into<String>, expertise_multiplier: f64) -> Self {
        Self {
            id: id.into(),
            role: None,
            expertise_multiplier,
            prior_experience: false,
        }
    }

    pub fn with_prior_experience(mut self, prior_experience: bool) -> Self {
        self.prior_experience = prior_experience;
        self
    }

    pub fn tier(&self) -> ExpertiseTier {
        ExpertiseTier::from_multiplier(self.expertise_multiplier)
    }
}

/// A 1-5 rating for one component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRating {
    pub rating: u8,
    pub comment: Option<String>,
}

impl UserRating {
    pub fn new(rating: u8) -> Self {
        Self {
            rating,
            comment: None,
        }
    }

    pub fn normalized(&self) -> f64 {
        f64::from(self.rating) / 5.0
    }
}

/// One evaluator's assessment of one paper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub evaluator: Evaluator,
    pub ratings: BTreeMap<component::Component, UserRating>,
    /// Rank at which the evaluator found the correct answer.
    pub positions: BTreeMap<component::Component, u32>,
}

impl Evaluation {
    pub fn new(evaluator: Evaluator) -> Self {
        Self {
            evaluator,
            ratings: BTreeMap::new(),
            positions: BTreeMap::new(),
        }
    }

    pub fn rate(mut self, component: component::Component, rating: u8) -> Self {
        self.ratings.insert(component, UserRating::new(rating));
        self
    }

    pub fn at_position(mut self, component: component::Component, position: u32) -> Self {
        self.positions.insert(component, position);
        self
    }

    pub fn rating(&self, component: component::Component) -> Option<&UserRating> {
        self.ratings.get(&component)
    }
}

/// A paper with its reference data, system output and evaluations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paper {
    pub id: PaperId,
    pub title: Option<String>,
    pub ground_truth: Option<GroundTruth>,
    pub system_output: SystemOutput,
    pub evaluations: Vec<Evaluation>,
}

impl Paper {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: PaperId::new(id),
            title: None,
            ground_truth: None,
            system_output: SystemOutput::default(),
            evaluations: Vec::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_ground_truth(mut self, ground_truth: GroundTruth) -> Self {
        self.ground_truth = Some(ground_truth);
        self
    }

    pub fn with_system_output(mut self, system_output: SystemOutput) -> Self {
        self.system_output = system_output;
        self
    }

    pub fn with_evaluation(mut self, evaluation: Evaluation) -> Self {
        self.evaluations.push(evaluation);
        self
    }

    /// Non-empty ground truth for a component.
    pub fn reference(&self, component: component::Component) -> Option<&str> {
        self.ground_truth.as_ref().and_then(|gt| gt.get(component))
    }
}

/// The validated, in-memory dataset the engine operates on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub papers: Vec<Paper>,
}

impl Dataset {
    pub fn new(papers: Vec<Paper>) -> Self {
        Self { papers }
    }

    pub fn total_evaluations(&self) -> usize {
        self.papers.iter().map(|p| p.evaluations.len()).sum()
    }
}

// ============================================================================
// Re-exports
// ============================================================================

pub use agreement::{
    AgreementLevel, AgreementStatistic, ConsistencyLevel, CrossPaperConsistency,
    DistributionShape, FleissKappaResult, VarianceAgreement,
};
pub use aggregation::{Coverage, PositionStats, ProvenanceStats, ScoringStats};
pub use classification::{ClassificationLabel, ClassificationMetrics, ConfusionMatrix};
pub use component::{Component, ComponentFamily, ComponentProfile, FieldKind, MetricKind};
pub use confidence::system_confidence;
pub use config::EngineConfig;
pub use engine::EvaluationEngine;
pub use export::ComponentReport;
pub use fusion::{FusedScore, FusionError, ScoreMethod};
pub use hierarchy::{FieldHierarchy, InMemoryHierarchy};
pub use metrics::{ComponentMetric, DimensionScore};
pub use stats::ScoreStats;
