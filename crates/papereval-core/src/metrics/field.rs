//! Reference vs extracted value comparison.
//!
//! Produces the completeness / consistency / validity triple for metadata,
//! research-problem and template components.

use super::text::{
    alphanumeric_share, is_doi, is_year, normalize_text, split_people, token_overlap, values_match,
};
use crate::component::FieldKind;
use serde::{Deserialize, Serialize};

/// Dimension scores of one field comparison. `None` means "not computable".
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldComparison {
    pub completeness: Option<f64>,
    pub consistency: Option<f64>,
    pub validity: Option<f64>,
    pub exact_match: bool,
}

impl FieldComparison {
    fn exact() -> Self {
        Self {
            completeness: Some(1.0),
            consistency: Some(1.0),
            validity: Some(1.0),
            exact_match: true,
        }
    }
}

/// Compare an extracted value with its reference.
///
/// Any missing or blank input yields all-`None`, never zeros.
pub fn compare_fields(
    reference: Option<&str>,
    extracted: Option<&str>,
    kind: FieldKind,
) -> FieldComparison {
    let (reference, extracted) = match (non_blank(reference), non_blank(extracted)) {
        (Some(r), Some(e)) => (r, e),
        _ => return FieldComparison::default(),
    };

    if values_match(reference, extracted) {
        return FieldComparison::exact();
    }

    FieldComparison {
        completeness: Some(completeness(reference, extracted)),
        consistency: Some(consistency(reference, extracted, kind)),
        validity: Some(validity(extracted, kind)),
        exact_match: false,
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Extracted length relative to reference length, capped at 1.
fn completeness(reference: &str, extracted: &str) -> f64 {
    let reference_len = normalize_text(reference).chars().count();
    let extracted_len = normalize_text(extracted).chars().count();
    if reference_len == 0 {
        return 0.0;
    }
    (extracted_len as f64 / reference_len as f64).min(1.0)
}

fn consistency(reference: &str, extracted: &str, kind: FieldKind) -> f64 {
    let structure = if structure_consistent(reference, extracted, kind) {
        1.0
    } else {
        0.0
    };
    0.5 * structure + 0.5 * token_overlap(reference, extracted)
}

fn structure_consistent(reference: &str, extracted: &str, kind: FieldKind) -> bool {
    match kind {
        FieldKind::Doi => is_doi(reference) && is_doi(extracted),
        FieldKind::Year => is_year(reference) && is_year(extracted),
        FieldKind::PersonList => {
            let expected = split_people(reference).len();
            expected > 0 && expected == split_people(extracted).len()
        }
        FieldKind::Text => {
            let reference_words = normalize_text(reference).split(' ').count() as f64;
            let extracted_words = normalize_text(extracted).split(' ').count() as f64;
            extracted_words >= reference_words * 0.5 && extracted_words <= reference_words * 2.0
        }
    }
}

fn validity(extracted: &str, kind: FieldKind) -> f64 {
    match kind {
        FieldKind::Doi => f64::from(u8::from(is_doi(extracted))),
        FieldKind::Year => f64::from(u8::from(is_year(extracted))),
        FieldKind::PersonList => {
            let people = split_people(extracted);
            if people.is_empty() {
                return 0.0;
            }
            let named = people
                .iter()
                .filter(|p| p.chars().any(char::is_alphabetic))
                .count();
            named as f64 / people.len() as f64
        }
        FieldKind::Text => alphanumeric_share(extracted),
    }
}
