//! Automated Metric Calculator
//!
//! Turns `(ground truth, system output)` for one paper and component into
//! named dimension scores and a single automated overall score.
//!
//! ```text
//! Component::profile().kind
//!   ├── FieldComparison ──► field::compare_fields   completeness/consistency/validity
//!   ├── Ranking         ──► ranking::score_position exact/top3/position
//!   └── Content         ──► content::score_content  precision/recall/f1
//! ```
//!
//! A dimension that cannot be computed is `None`, and so is any overall
//! score that depends on it. Missing scores are excluded from means later
//! on; they are never coerced to 0.

pub mod content;
pub mod field;
pub mod ranking;
pub mod text;

use crate::component::{
    Component, ComponentProfile, MetricKind, COMPLETENESS, CONSISTENCY, EXACT_MATCH, F1,
    POSITION_SCORE, PRECISION, RECALL, TOP3_PRESENCE, VALIDITY,
};
use crate::config::EngineConfig;
use crate::hierarchy::FieldHierarchy;
use crate::{Evaluation, Paper, Provenance};
use ranking::{RankingScore, RelatedMatch};
use serde::{Deserialize, Serialize};

/// One named dimension of an automated score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionScore {
    pub name: String,
    pub value: Option<f64>,
    pub weight: f64,
}

/// Automated scores for one `(paper, component)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentMetric {
    pub component: Component,
    pub dimensions: Vec<DimensionScore>,
    pub automated_overall: Option<f64>,
    pub provenance: Option<Provenance>,
    /// Rank of the reference among the system's predictions (ranking only).
    pub position: Option<u32>,
    /// Nearest taxonomy neighbour when the reference was not predicted.
    pub related: Option<RelatedMatch>,
}

impl ComponentMetric {
    pub fn dimension(&self, name: &str) -> Option<f64> {
        self.dimensions
            .iter()
            .find(|d| d.name == name)
            .and_then(|d| d.value)
    }

    fn from_values(
        component: Component,
        profile: &ComponentProfile,
        values: &[(&str, Option<f64>)],
    ) -> Self {
        let dimensions: Vec<DimensionScore> = values
            .iter()
            .map(|(name, value)| DimensionScore {
                name: (*name).to_string(),
                value: *value,
                weight: profile.weight_of(name),
            })
            .collect();
        let automated_overall = weighted_overall(&dimensions);
        Self {
            component,
            dimensions,
            automated_overall,
            provenance: None,
            position: None,
            related: None,
        }
    }

    fn from_ranking(component: Component, profile: &ComponentProfile, score: &RankingScore) -> Self {
        let mut metric = Self::from_values(
            component,
            profile,
            &[
                (EXACT_MATCH, score.position.map(|_| f64::from(u8::from(score.exact_match)))),
                (TOP3_PRESENCE, score.position.map(|_| f64::from(u8::from(score.in_top3)))),
                (POSITION_SCORE, score.position_score),
            ],
        );
        metric.position = score.position;
        metric
    }
}

/// Convex combination of dimensions; `None` if any weighted dimension is
/// missing.
pub fn weighted_overall(dimensions: &[DimensionScore]) -> Option<f64> {
    let mut total = 0.0;
    for d in dimensions.iter().filter(|d| d.weight > 0.0) {
        total += d.value? * d.weight;
    }
    Some(total.clamp(0.0, 1.0))
}

/// Borrowed inputs shared by every metric computation.
#[derive(Clone, Copy)]
pub struct MetricContext<'a> {
    pub config: &'a EngineConfig,
    pub hierarchy: Option<&'a dyn FieldHierarchy>,
}

/// Compute the automated metric of `component` for `paper`.
pub fn component_metric(paper: &Paper, component: Component, ctx: MetricContext<'_>) -> ComponentMetric {
    let profile = component.profile();
    let system = paper.system_output.get(component);
    let reference = paper.reference(component);

    let mut metric = match profile.kind {
        MetricKind::FieldComparison => {
            let cmp = field::compare_fields(
                reference,
                system.map(|s| s.value.as_str()),
                profile.field_kind,
            );
            ComponentMetric::from_values(
                component,
                &profile,
                &[
                    (COMPLETENESS, cmp.completeness),
                    (CONSISTENCY, cmp.consistency),
                    (VALIDITY, cmp.validity),
                ],
            )
        }
        MetricKind::Ranking => {
            let predictions = &paper.system_output.field_predictions;
            let position = reference.and_then(|r| ranking::find_position(r, predictions));
            let mut metric =
                ComponentMetric::from_ranking(component, &profile, &ranking::score_position(position));
            if metric.position.is_none() {
                metric.related = match (ctx.hierarchy, reference) {
                    (Some(h), Some(r)) => ranking::best_related(h, r, predictions),
                    _ => None,
                };
            }
            metric
        }
        MetricKind::Content => {
            let score = paper
                .system_output
                .content
                .as_ref()
                .and_then(|c| content::score_content(c, &ctx.config.content));
            ComponentMetric::from_values(
                component,
                &profile,
                &[
                    (PRECISION, score.map(|s| s.precision)),
                    (RECALL, score.map(|s| s.recall)),
                    (F1, score.map(|s| s.f1)),
                ],
            )
        }
    };

    if profile.tracks_provenance {
        metric.provenance = system.and_then(|s| s.source);
    }
    metric
}

/// The metric as seen by one evaluation.
///
/// For ranking components an evaluator-recorded position replaces the one
/// derived from the system's predictions; every other metric is shared by
/// all evaluations of the paper.
pub fn metric_for_evaluation(base: &ComponentMetric, evaluation: &Evaluation) -> ComponentMetric {
    let profile = base.component.profile();
    match (profile.kind, evaluation.positions.get(&base.component)) {
        (MetricKind::Ranking, Some(&position)) => {
            let mut metric = ComponentMetric::from_ranking(
                base.component,
                &profile,
                &ranking::score_position(Some(position)),
            );
            metric.related = base.related.clone();
            metric.provenance = base.provenance;
            metric
        }
        _ => base.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FieldPrediction, GroundTruth, SystemOutput, SystemValue};
    use approx::assert_abs_diff_eq;

    fn ctx(config: &EngineConfig) -> MetricContext<'_> {
        MetricContext {
            config,
            hierarchy: None,
        }
    }

    #[test]
    fn test_exact_match_dimensions_all_one() {
        let config = EngineConfig::default();
        let paper = Paper::new("10.1/x")
            .with_ground_truth(GroundTruth::default().with(Component::Title, "A Study of Things"))
            .with_system_output(
                SystemOutput::default().with(Component::Title, SystemValue::new("a study of things", 0.9)),
            );
        let metric = component_metric(&paper, Component::Title, ctx(&config));
        assert!(metric.dimensions.iter().all(|d| d.value == Some(1.0)));
        assert_eq!(metric.automated_overall, Some(1.0));
    }

    #[test]
    fn test_missing_ground_truth_is_not_computable() {
        let config = EngineConfig::default();
        let paper = Paper::new("10.1/x").with_system_output(
            SystemOutput::default().with(Component::Venue, SystemValue::new("NeurIPS", 0.9)),
        );
        let metric = component_metric(&paper, Component::Venue, ctx(&config));
        assert!(metric.dimensions.iter().all(|d| d.value.is_none()));
        assert_eq!(metric.automated_overall, None);
    }

    #[test]
    fn test_weighted_overall_fixture() {
        let dims = vec![
            DimensionScore { name: COMPLETENESS.into(), value: Some(0.1), weight: 0.4 },
            DimensionScore { name: CONSISTENCY.into(), value: Some(0.5), weight: 0.3 },
            DimensionScore { name: VALIDITY.into(), value: Some(0.3), weight: 0.3 },
        ];
        assert_abs_diff_eq!(weighted_overall(&dims).unwrap(), 0.28, epsilon = 1e-12);
    }

    #[test]
    fn test_ranking_uses_evaluator_position() {
        let config = EngineConfig::default();
        let paper = Paper::new("10.1/x")
            .with_ground_truth(GroundTruth::default().with(Component::ResearchField, "Robotics"))
            .with_system_output(SystemOutput::default().with_field_predictions(vec![
                FieldPrediction { label: "Robotics".into(), score: 0.9 },
            ]));
        let base = component_metric(&paper, Component::ResearchField, ctx(&config));
        assert_eq!(base.position, Some(1));
        assert_eq!(base.automated_overall, Some(1.0));

        let evaluation = Evaluation::new(crate::Evaluator::new("e1", 1.0))
            .at_position(Component::ResearchField, 4);
        let seen = metric_for_evaluation(&base, &evaluation);
        assert_eq!(seen.position, Some(4));
        assert_abs_diff_eq!(seen.automated_overall.unwrap(), 0.18, epsilon = 1e-12);
    }

    #[test]
    fn test_provenance_only_for_tracked_components() {
        let config = EngineConfig::default();
        let value = SystemValue::new("Question answering", 0.8).with_source(Provenance::Generated);
        let paper = Paper::new("10.1/x").with_system_output(
            SystemOutput::default()
                .with(Component::ResearchProblem, value.clone())
                .with(Component::Title, value),
        );
        let problem = component_metric(&paper, Component::ResearchProblem, ctx(&config));
        let title = component_metric(&paper, Component::Title, ctx(&config));
        assert_eq!(problem.provenance, Some(Provenance::Generated));
        assert_eq!(title.provenance, None);
    }
}
