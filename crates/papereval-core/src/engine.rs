//! Evaluation Engine
//!
//! Orchestrates the pipeline for one component at a time:
//!
//! ```text
//! papers ──► metrics (per paper) ──► fuse (per evaluation) ──► ScoredEvaluation
//!   │                                                              │
//!   └──► classification (unique papers) ──► PaperScore ◄───────────┘
//!                                               │
//!                         aggregation + agreement + export
//! ```
//!
//! Per-paper work goes through rayon when `EngineConfig::parallel` is set.
//! Results are always collected in input order, so the parallel and
//! sequential paths produce identical output.

use crate::agreement::{agreement_report, AgreementReport};
use crate::aggregation::{
    evaluation_stats, Coverage, PaperScore, PositionStats, ProvenanceStats, ScoredEvaluation,
    ScoringStats,
};
use crate::classification::{classify_component, unique_papers, ClassificationResult};
use crate::component::{Component, MetricKind};
use crate::config::EngineConfig;
use crate::export::{ComponentReport, PaperBreakdown, ReportCounts, SCHEMA_VERSION};
use crate::fusion::{fuse, FusionError};
use crate::hierarchy::FieldHierarchy;
use crate::metrics::{component_metric, metric_for_evaluation, ComponentMetric, MetricContext};
use crate::stats::ScoreStats;
use crate::{Dataset, Paper};
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

/// Reports and agreement analysis for every component of a dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetAnalysis {
    pub reports: Vec<ComponentReport>,
    pub agreement: BTreeMap<Component, AgreementReport>,
    pub evaluation_stats: BTreeMap<Component, ScoreStats>,
}

pub struct EvaluationEngine<'h> {
    config: EngineConfig,
    hierarchy: Option<&'h dyn FieldHierarchy>,
}

impl Default for EvaluationEngine<'_> {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl<'h> EvaluationEngine<'h> {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            hierarchy: None,
        }
    }

    /// Use a field taxonomy to find related research-field predictions.
    pub fn with_hierarchy(mut self, hierarchy: &'h dyn FieldHierarchy) -> Self {
        self.hierarchy = Some(hierarchy);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn ctx(&self) -> MetricContext<'_> {
        MetricContext {
            config: &self.config,
            hierarchy: self.hierarchy,
        }
    }

    fn map_papers<T, F>(&self, papers: &[&Paper], f: F) -> Vec<T>
    where
        T: Send,
        F: Fn(&Paper) -> T + Sync + Send,
    {
        if self.config.parallel {
            papers.par_iter().map(|p| f(p)).collect()
        } else {
            papers.iter().map(|p| f(p)).collect()
        }
    }

    /// Automated metric for every paper, duplicates included.
    pub fn component_metrics(&self, papers: &[Paper], component: Component) -> Vec<ComponentMetric> {
        let ctx = self.ctx();
        let refs: Vec<&Paper> = papers.iter().collect();
        self.map_papers(&refs, |paper| component_metric(paper, component, ctx))
    }

    /// One fused score per evaluation that has anything to fuse.
    ///
    /// Evaluations attached to a duplicate entry are scored against the
    /// first occurrence of that paper.
    pub fn scored_evaluations(&self, papers: &[Paper], component: Component) -> Vec<ScoredEvaluation> {
        self.run(papers, component).evaluations
    }

    fn run<'p>(&self, papers: &'p [Paper], component: Component) -> ComponentRun<'p> {
        let ctx = self.ctx();
        let unique = unique_papers(papers);
        let metrics = self.map_papers(&unique, |paper| component_metric(paper, component, ctx));
        let first: HashMap<String, usize> = unique
            .iter()
            .enumerate()
            .map(|(i, paper)| (paper.id.dedup_key(), i))
            .collect();

        let evaluations: Vec<ScoredEvaluation> = papers
            .iter()
            .filter_map(|record| first.get(&record.id.dedup_key()).map(|&i| (i, record)))
            .flat_map(|(i, record)| self.score_record(unique[i], record, &metrics[i]))
            .collect();

        ComponentRun {
            unique,
            metrics,
            evaluations,
        }
    }

    fn score_record(&self, paper: &Paper, record: &Paper, base: &ComponentMetric) -> Vec<ScoredEvaluation> {
        let profile = base.component.profile();
        record
            .evaluations
            .iter()
            .filter_map(|evaluation| {
                let metric = metric_for_evaluation(base, evaluation);
                let rating = evaluation.rating(base.component).map(|r| r.rating);
                let fused = match fuse(
                    metric.automated_overall,
                    rating,
                    evaluation.evaluator.expertise_multiplier,
                    &profile,
                    &self.config.fusion,
                ) {
                    Ok(fused) => fused,
                    Err(FusionError::NothingToFuse) => return None,
                    Err(error) => {
                        warn!(
                            paper = %record.id,
                            evaluator = %evaluation.evaluator.id,
                            component = %base.component,
                            %error,
                            "skipping evaluation"
                        );
                        return None;
                    }
                };
                Some(ScoredEvaluation {
                    paper: paper.id.clone(),
                    evaluator_id: evaluation.evaluator.id.clone(),
                    tier: evaluation.evaluator.tier(),
                    prior_experience: evaluation.evaluator.prior_experience,
                    position: metric.position,
                    provenance: metric.provenance,
                    fused,
                })
            })
            .collect()
    }

    pub fn classify(&self, papers: &[Paper], component: Component) -> ClassificationResult {
        classify_component(papers, component, &self.config)
    }

    /// Per unique paper summaries, in first-occurrence order.
    ///
    /// Evaluations of duplicate entries are folded into the first one.
    pub fn paper_scores(
        &self,
        papers: &[Paper],
        component: Component,
        classification: &ClassificationResult,
        evaluations: &[ScoredEvaluation],
    ) -> Vec<PaperScore> {
        let ctx = self.ctx();
        let unique = unique_papers(papers);
        let metrics = self.map_papers(&unique, |paper| component_metric(paper, component, ctx));
        summarize_papers(&unique, &metrics, component, classification, evaluations)
    }

    /// The export artifact for one component.
    pub fn component_report(
        &self,
        dataset: &Dataset,
        component: Component,
        timestamp: DateTime<Utc>,
    ) -> ComponentReport {
        let run = self.run(&dataset.papers, component);
        self.report_from_run(dataset, component, timestamp, &run)
    }

    fn report_from_run(
        &self,
        dataset: &Dataset,
        component: Component,
        timestamp: DateTime<Utc>,
        run: &ComponentRun<'_>,
    ) -> ComponentReport {
        let profile = component.profile();
        let evaluations = &run.evaluations;

        let classification = self.classify(&dataset.papers, component);
        let paper_scores = summarize_papers(&run.unique, &run.metrics, component, &classification, evaluations);
        let coverage = Coverage::from_papers(&paper_scores, self.config.min_ground_truth_coverage);

        if coverage.insufficient_ground_truth && profile.classifiable {
            warn!(
                component = %component,
                with_ground_truth = coverage.with_ground_truth,
                required = self.config.min_ground_truth_coverage,
                "insufficient ground truth coverage"
            );
        }

        let breakdown = run
            .unique
            .iter()
            .zip(&paper_scores)
            .map(|(&paper, score)| PaperBreakdown::new(paper, component, score))
            .collect();

        let report = ComponentReport {
            schema_version: SCHEMA_VERSION.to_string(),
            component,
            confidence_threshold: self.config.confidence_threshold,
            matrix: classification.matrix,
            metrics: classification.metrics,
            paper_breakdown: breakdown,
            coverage,
            source_stats: profile
                .tracks_provenance
                .then(|| ProvenanceStats::from_papers(&paper_scores)),
            position_stats: (profile.kind == MetricKind::Ranking)
                .then(|| PositionStats::from_positions(evaluations.iter().map(|e| e.position))),
            scoring_stats: ScoringStats::compute(&paper_scores, evaluations),
            counts: ReportCounts {
                total_evaluations: dataset.total_evaluations(),
                total_unique_papers: paper_scores.len(),
            },
            timestamp,
        };

        debug!(
            component = %component,
            unique_papers = report.counts.total_unique_papers,
            scored_evaluations = evaluations.len(),
            true_positives = report.matrix.true_positives,
            false_positives = report.matrix.false_positives,
            false_negatives = report.matrix.false_negatives,
            true_negatives = report.matrix.true_negatives,
            overall = report.scoring_stats.overall_score,
            "component report"
        );
        report
    }

    /// Agreement among the evaluators who rated `component`.
    pub fn agreement(&self, dataset: &Dataset, component: Component) -> AgreementReport {
        let evaluations = self.scored_evaluations(&dataset.papers, component);
        self.agreement_from(component, &evaluations)
    }

    fn agreement_from(&self, component: Component, evaluations: &[ScoredEvaluation]) -> AgreementReport {
        // Automated-only scores carry no judgement of the evaluator.
        let rated: Vec<ScoredEvaluation> = evaluations
            .iter()
            .filter(|e| e.fused.rating.is_some())
            .cloned()
            .collect();
        let report = agreement_report(&rated, &self.config.agreement);
        debug!(
            component = %component,
            evaluations = rated.len(),
            fallback = report.statistic.is_fallback(),
            "agreement"
        );
        report
    }

    /// Reports and agreement for every component.
    pub fn analyze(&self, dataset: &Dataset, timestamp: DateTime<Utc>) -> DatasetAnalysis {
        let mut analysis = DatasetAnalysis {
            reports: Vec::with_capacity(Component::ALL.len()),
            agreement: BTreeMap::new(),
            evaluation_stats: BTreeMap::new(),
        };
        for component in Component::ALL {
            let run = self.run(&dataset.papers, component);
            analysis
                .reports
                .push(self.report_from_run(dataset, component, timestamp, &run));
            analysis
                .evaluation_stats
                .insert(component, evaluation_stats(&run.evaluations));
            analysis
                .agreement
                .insert(component, self.agreement_from(component, &run.evaluations));
        }
        analysis
    }
}

/// Metrics and fused scores for one component, computed once.
struct ComponentRun<'p> {
    unique: Vec<&'p Paper>,
    /// Parallel to `unique`.
    metrics: Vec<ComponentMetric>,
    evaluations: Vec<ScoredEvaluation>,
}

fn summarize_papers(
    unique: &[&Paper],
    metrics: &[ComponentMetric],
    component: Component,
    classification: &ClassificationResult,
    evaluations: &[ScoredEvaluation],
) -> Vec<PaperScore> {
    let mut by_paper: HashMap<String, Vec<&ScoredEvaluation>> = HashMap::new();
    for evaluation in evaluations {
        by_paper
            .entry(evaluation.paper.dedup_key())
            .or_default()
            .push(evaluation);
    }

    unique
        .iter()
        .zip(metrics)
        .zip(&classification.papers)
        .map(|((paper, metric), classified)| {
            let scored = by_paper
                .get(&paper.id.dedup_key())
                .map(Vec::as_slice)
                .unwrap_or_default();
            let position = scored
                .iter()
                .find_map(|e| e.position)
                .or(metric.position);
            PaperScore::summarize(
                paper.id.clone(),
                paper.reference(component).is_some(),
                metric.automated_overall,
                metric.provenance,
                classified.label,
                position,
                scored,
            )
        })
        .collect()
}
