//! Input normalization: loose upstream JSON into a validated [`Dataset`].
//!
//! Upstream producers disagree on key spellings and value shapes. This is
//! the single place those differences are absorbed; the rest of the crate
//! only ever sees the strict model.
//!
//! Recoverable deviations are fixed up, recorded as a
//! [`NormalizationWarning`] and logged. Shapes that cannot be interpreted
//! are a [`NormalizeError`].

use crate::component::Component;
use crate::{
    ContentExtraction, ContentProperty, Dataset, Evaluation, Evaluator, FieldPrediction,
    GroundTruth, Paper, PaperId, Provenance, SystemOutput, SystemValue, UserRating,
    MAX_EXPERTISE_MULTIPLIER, MIN_EXPERTISE_MULTIPLIER,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::warn;

#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected an array of papers or an object with a `papers` array")]
    NotAPaperList,

    #[error("paper {index}: {source}")]
    InvalidPaper {
        index: usize,
        source: serde_json::Error,
    },

    #[error("paper {paper}: unknown component key `{key}`")]
    UnknownComponent { paper: usize, key: String },
}

/// A deviation that was repaired during normalization.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NormalizationWarning {
    MissingIdentifier { paper: usize, token: String },
    MissingEvaluatorId { paper: usize, token: String },
    UnknownComponent { paper: usize, key: String },
    UnknownSource { paper: usize, component: Component, source: String },
    DefaultedMultiplier { paper: usize, evaluator: String },
    ClampedMultiplier { paper: usize, evaluator: String, from: f64, to: f64 },
    DroppedRating { paper: usize, evaluator: String, component: Component, rating: f64 },
    DroppedPosition { paper: usize, evaluator: String, component: Component, position: i64 },
}

#[derive(Debug, Clone, Default)]
pub struct NormalizeOptions {
    /// Reject unknown component keys instead of skipping them.
    pub strict: bool,
}

/// The normalized dataset plus everything that had to be repaired.
#[derive(Debug, Clone)]
pub struct Normalized {
    pub dataset: Dataset,
    pub warnings: Vec<NormalizationWarning>,
}

/// Normalize leniently, logging and discarding the warnings.
pub fn normalize_dataset(input: &Value) -> Result<Dataset, NormalizeError> {
    normalize_with_options(input, &NormalizeOptions::default()).map(|n| n.dataset)
}

pub fn normalize_with_options(
    input: &Value,
    options: &NormalizeOptions,
) -> Result<Normalized, NormalizeError> {
    let papers = match input {
        Value::Array(papers) => papers,
        Value::Object(map) => match map.get("papers") {
            Some(Value::Array(papers)) => papers,
            _ => return Err(NormalizeError::NotAPaperList),
        },
        _ => return Err(NormalizeError::NotAPaperList),
    };

    let mut normalizer = Normalizer {
        options,
        warnings: Vec::new(),
    };
    let papers = papers
        .iter()
        .enumerate()
        .map(|(index, raw)| normalizer.paper(index, raw))
        .collect::<Result<Vec<_>, _>>()?;

    for warning in &normalizer.warnings {
        warn!(?warning, "normalized input deviation");
    }

    Ok(Normalized {
        dataset: Dataset::new(papers),
        warnings: normalizer.warnings,
    })
}

impl Dataset {
    pub fn from_json_str(raw: &str) -> Result<Self, NormalizeError> {
        let value: Value = serde_json::from_str(raw)?;
        normalize_dataset(&value)
    }
}

// ============================================================================
// Raw shapes
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPaper {
    doi: Option<String>,
    token: Option<String>,
    id: Option<String>,
    title: Option<String>,
    #[serde(alias = "ground_truth")]
    ground_truth: Option<BTreeMap<String, Option<RawText>>>,
    #[serde(alias = "system_output")]
    system_output: Option<Map<String, Value>>,
    #[serde(default)]
    evaluations: Vec<RawEvaluation>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawText {
    Text(String),
    Number(serde_json::Number),
    List(Vec<String>),
}

impl RawText {
    fn into_string(self) -> String {
        match self {
            RawText::Text(s) => s,
            RawText::Number(n) => n.to_string(),
            RawText::List(items) => items.join("; "),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawSystemValue {
    Bare(RawText),
    Detailed(RawDetailedValue),
}

#[derive(Debug, Deserialize)]
struct RawDetailedValue {
    value: Option<RawText>,
    confidence: Option<f64>,
    source: Option<String>,
    evidence: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawPrediction {
    #[serde(alias = "field", alias = "name")]
    label: String,
    /// Unscored predictions are taken at face value, like bare values.
    #[serde(alias = "confidence", default)]
    score: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawContent {
    #[serde(default)]
    properties: Vec<RawProperty>,
    #[serde(alias = "template_property_count", alias = "templateProperties", default)]
    template_property_count: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawProperty {
    #[serde(alias = "property", alias = "label")]
    name: String,
    #[serde(default)]
    value: Option<RawText>,
    confidence: Option<f64>,
    evidence: Option<String>,
    #[serde(alias = "template_match")]
    template_match: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEvaluation {
    #[serde(alias = "evaluator_id", alias = "evaluator", alias = "userId")]
    evaluator_id: Option<String>,
    role: Option<String>,
    expertise_multiplier: Option<f64>,
    expertise_weight: Option<f64>,
    orkg_experience: Option<bool>,
    prior_experience: Option<bool>,
    #[serde(default)]
    ratings: BTreeMap<String, Option<RawRating>>,
    #[serde(default)]
    positions: BTreeMap<String, Option<i64>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawRating {
    Bare(f64),
    Detailed(RawDetailedRating),
}

#[derive(Debug, Deserialize)]
struct RawDetailedRating {
    rating: Option<f64>,
    #[serde(alias = "comment")]
    comments: Option<String>,
}

const PREDICTION_KEYS: [&str; 4] = [
    "researchFieldPredictions",
    "research_field_predictions",
    "fieldPredictions",
    "field_predictions",
];

// ============================================================================
// Normalizer
// ============================================================================

struct Normalizer<'a> {
    options: &'a NormalizeOptions,
    warnings: Vec<NormalizationWarning>,
}

impl Normalizer<'_> {
    fn paper(&mut self, index: usize, raw: &Value) -> Result<Paper, NormalizeError> {
        let raw: RawPaper = serde_json::from_value(raw.clone())
            .map_err(|source| NormalizeError::InvalidPaper { index, source })?;

        let id = [raw.doi, raw.token, raw.id]
            .into_iter()
            .flatten()
            .find(|s| !s.trim().is_empty())
            .unwrap_or_else(|| {
                let token = format!("paper-{index}");
                self.warnings.push(NormalizationWarning::MissingIdentifier {
                    paper: index,
                    token: token.clone(),
                });
                token
            });

        let ground_truth = match raw.ground_truth {
            Some(fields) => Some(self.ground_truth(index, fields)?),
            None => None,
        };
        let system_output = match raw.system_output {
            Some(fields) => self.system_output(index, fields)?,
            None => SystemOutput::default(),
        };
        let evaluations = raw
            .evaluations
            .into_iter()
            .enumerate()
            .map(|(position, evaluation)| self.evaluation(index, position, evaluation))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Paper {
            id: PaperId::new(id.trim()),
            title: raw.title,
            ground_truth,
            system_output,
            evaluations,
        })
    }

    fn component(&mut self, paper: usize, key: &str) -> Result<Option<Component>, NormalizeError> {
        match key.parse::<Component>() {
            Ok(component) => Ok(Some(component)),
            Err(_) if self.options.strict => Err(NormalizeError::UnknownComponent {
                paper,
                key: key.to_string(),
            }),
            Err(_) => {
                self.warnings.push(NormalizationWarning::UnknownComponent {
                    paper,
                    key: key.to_string(),
                });
                Ok(None)
            }
        }
    }

    fn ground_truth(
        &mut self,
        paper: usize,
        fields: BTreeMap<String, Option<RawText>>,
    ) -> Result<GroundTruth, NormalizeError> {
        let mut gt = GroundTruth::default();
        for (key, value) in fields {
            let Some(component) = self.component(paper, &key)? else {
                continue;
            };
            if let Some(value) = value {
                gt.values.insert(component, value.into_string());
            }
        }
        Ok(gt)
    }

    fn system_output(
        &mut self,
        paper: usize,
        fields: Map<String, Value>,
    ) -> Result<SystemOutput, NormalizeError> {
        let mut output = SystemOutput::default();
        let invalid = |source| NormalizeError::InvalidPaper { index: paper, source };

        for (key, value) in fields {
            if value.is_null() {
                continue;
            }
            if PREDICTION_KEYS.contains(&key.as_str()) {
                let predictions: Vec<RawPrediction> = serde_json::from_value(value).map_err(invalid)?;
                let predictions = predictions
                    .into_iter()
                    .map(|p| FieldPrediction {
                        label: p.label,
                        score: p.score.filter(|s| s.is_finite()).unwrap_or(1.0),
                    })
                    .collect();
                // An explicit research-field value, if any, wins over the top prediction.
                let explicit = output.values.remove(&Component::ResearchField);
                output = output.with_field_predictions(predictions);
                if let Some(explicit) = explicit {
                    output.values.insert(Component::ResearchField, explicit);
                }
                continue;
            }

            let Some(component) = self.component(paper, &key)? else {
                continue;
            };
            if component == Component::Content {
                let content: RawContent = serde_json::from_value(value).map_err(invalid)?;
                output.content = Some(ContentExtraction {
                    properties: content
                        .properties
                        .into_iter()
                        .map(|p| ContentProperty {
                            name: p.name,
                            value: p.value.map(RawText::into_string).unwrap_or_default(),
                            confidence: p.confidence,
                            evidence: p.evidence,
                            template_match: p.template_match,
                        })
                        .collect(),
                    template_property_count: content.template_property_count,
                });
                continue;
            }

            let raw: RawSystemValue = serde_json::from_value(value).map_err(invalid)?;
            let system_value = match raw {
                RawSystemValue::Bare(text) => SystemValue::new(text.into_string(), 1.0),
                RawSystemValue::Detailed(detailed) => SystemValue {
                    value: detailed.value.map(RawText::into_string).unwrap_or_default(),
                    confidence: detailed.confidence.filter(|c| c.is_finite()).unwrap_or(1.0),
                    source: detailed
                        .source
                        .and_then(|s| self.source(paper, component, &s)),
                    evidence: detailed.evidence,
                },
            };
            output.values.insert(component, system_value);
        }
        Ok(output)
    }

    fn source(&mut self, paper: usize, component: Component, raw: &str) -> Option<Provenance> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "orkg" | "external" => Some(Provenance::External),
            "llm" | "generated" => Some(Provenance::Generated),
            _ => {
                self.warnings.push(NormalizationWarning::UnknownSource {
                    paper,
                    component,
                    source: raw.to_string(),
                });
                None
            }
        }
    }

    fn evaluation(
        &mut self,
        paper: usize,
        position: usize,
        raw: RawEvaluation,
    ) -> Result<Evaluation, NormalizeError> {
        let evaluator_id = match raw.evaluator_id.filter(|id| !id.trim().is_empty()) {
            Some(id) => id,
            None => {
                let token = format!("evaluator-{paper}-{position}");
                self.warnings.push(NormalizationWarning::MissingEvaluatorId {
                    paper,
                    token: token.clone(),
                });
                token
            }
        };

        let multiplier = self.multiplier(
            paper,
            &evaluator_id,
            raw.expertise_multiplier.or(raw.expertise_weight),
        );
        let mut evaluator = Evaluator::new(evaluator_id.clone(), multiplier)
            .with_prior_experience(raw.orkg_experience.or(raw.prior_experience).unwrap_or(false));
        evaluator.role = raw.role;
        let mut evaluation = Evaluation::new(evaluator);

        for (key, rating) in raw.ratings {
            let Some(component) = self.component(paper, &key)? else {
                continue;
            };
            let (value, comment) = match rating {
                Some(RawRating::Bare(value)) => (Some(value), None),
                Some(RawRating::Detailed(detailed)) => (detailed.rating, detailed.comments),
                None => (None, None),
            };
            let Some(value) = value else {
                continue;
            };
            if value.fract() == 0.0 && (1.0..=5.0).contains(&value) {
                evaluation.ratings.insert(
                    component,
                    UserRating {
                        rating: value as u8,
                        comment,
                    },
                );
            } else {
                self.warnings.push(NormalizationWarning::DroppedRating {
                    paper,
                    evaluator: evaluator_id.clone(),
                    component,
                    rating: value,
                });
            }
        }

        for (key, found_at) in raw.positions {
            let Some(component) = self.component(paper, &key)? else {
                continue;
            };
            match found_at {
                Some(p) if p >= 1 && p <= i64::from(u32::MAX) => {
                    evaluation.positions.insert(component, p as u32);
                }
                Some(p) => self.warnings.push(NormalizationWarning::DroppedPosition {
                    paper,
                    evaluator: evaluator_id.clone(),
                    component,
                    position: p,
                }),
                None => {}
            }
        }

        Ok(evaluation)
    }

    fn multiplier(&mut self, paper: usize, evaluator: &str, raw: Option<f64>) -> f64 {
        match raw.filter(|m| m.is_finite()) {
            None => {
                self.warnings.push(NormalizationWarning::DefaultedMultiplier {
                    paper,
                    evaluator: evaluator.to_string(),
                });
                1.0
            }
            Some(m) => {
                let clamped = m.clamp(MIN_EXPERTISE_MULTIPLIER, MAX_EXPERTISE_MULTIPLIER);
                if clamped != m {
                    self.warnings.push(NormalizationWarning::ClampedMultiplier {
                        paper,
                        evaluator: evaluator.to_string(),
                        from: m,
                        to: clamped,
                    });
                }
                clamped
            }
        }
    }
}
