//! Precision / recall / F1 for free-form content extraction.
//!
//! Content has no reference value. Each annotated property earns match
//! credit: 1 or 0 from an explicit template-match signal, otherwise the
//! declared extraction confidence plus a bonus when evidence text backs it.

use crate::config::ContentConfig;
use crate::stats::ratio;
use crate::{ContentExtraction, ContentProperty};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContentScore {
    /// Sum of per-property match credit.
    pub matched: f64,
    pub annotated: usize,
    pub template_properties: usize,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

/// Match credit of one property, in `[0, 1]`.
pub fn property_credit(property: &ContentProperty, config: &ContentConfig) -> f64 {
    if let Some(matched) = property.template_match {
        return f64::from(u8::from(matched));
    }
    let base = property
        .confidence
        .filter(|c| c.is_finite())
        .unwrap_or(config.default_confidence);
    let has_evidence = property
        .evidence
        .as_deref()
        .is_some_and(|e| !e.trim().is_empty());
    let bonus = if has_evidence { config.evidence_bonus } else { 0.0 };
    (base + bonus).clamp(0.0, 1.0)
}

/// Score an extraction; `None` when nothing was annotated and no template
/// properties exist to compare against.
pub fn score_content(extraction: &ContentExtraction, config: &ContentConfig) -> Option<ContentScore> {
    let annotated = extraction.properties.len();
    let template_properties = extraction.template_property_count;
    if annotated == 0 && template_properties == 0 {
        return None;
    }

    let matched: f64 = extraction
        .properties
        .iter()
        .map(|p| property_credit(p, config))
        .sum();
    let precision = ratio(matched, annotated as f64).min(1.0);
    let recall = ratio(matched, template_properties as f64).min(1.0);
    let f1 = ratio(2.0 * precision * recall, precision + recall);

    Some(ContentScore {
        matched,
        annotated,
        template_properties,
        precision,
        recall,
        f1,
    })
}
