//! Extraction components and their scoring profiles.
//!
//! Each component the pipeline extracts is scored by a small, fixed strategy:
//!
//! ```text
//! Component ──► ComponentProfile
//!                 ├── metric kind      (field comparison / ranking / content)
//!                 ├── dimensions       (name + convex weight)
//!                 ├── auto weight floor
//!                 ├── expertise-scaled rating?
//!                 └── classifiable?    (has a ground-truth concept)
//! ```
//!
//! The table lives in [`Component::profile`]; nothing else in the crate
//! branches on component names.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Component
// ============================================================================

/// An extraction component evaluated per paper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Component {
    Title,
    Authors,
    Doi,
    PublicationYear,
    Venue,
    ResearchField,
    ResearchProblem,
    Template,
    Content,
}

impl Component {
    /// Every component, in report order.
    pub const ALL: [Component; 9] = [
        Component::Title,
        Component::Authors,
        Component::Doi,
        Component::PublicationYear,
        Component::Venue,
        Component::ResearchField,
        Component::ResearchProblem,
        Component::Template,
        Component::Content,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Component::Title => "title",
            Component::Authors => "authors",
            Component::Doi => "doi",
            Component::PublicationYear => "publication_year",
            Component::Venue => "venue",
            Component::ResearchField => "research_field",
            Component::ResearchProblem => "research_problem",
            Component::Template => "template",
            Component::Content => "content",
        }
    }

    pub fn family(&self) -> ComponentFamily {
        match self {
            Component::Title
            | Component::Authors
            | Component::Doi
            | Component::PublicationYear
            | Component::Venue => ComponentFamily::Metadata,
            Component::ResearchField => ComponentFamily::ResearchField,
            Component::ResearchProblem => ComponentFamily::ResearchProblem,
            Component::Template => ComponentFamily::Template,
            Component::Content => ComponentFamily::Content,
        }
    }

    /// Scoring strategy for this component.
    pub fn profile(&self) -> ComponentProfile {
        match self.family() {
            ComponentFamily::Metadata => ComponentProfile {
                kind: MetricKind::FieldComparison,
                dimensions: FIELD_DIMENSIONS_METADATA,
                auto_weight_floor: 0.1,
                expertise_scales_rating: false,
                classifiable: true,
                tracks_provenance: false,
                field_kind: match self {
                    Component::Doi => FieldKind::Doi,
                    Component::PublicationYear => FieldKind::Year,
                    Component::Authors => FieldKind::PersonList,
                    _ => FieldKind::Text,
                },
            },
            ComponentFamily::ResearchField => ComponentProfile {
                kind: MetricKind::Ranking,
                dimensions: RANKING_DIMENSIONS,
                auto_weight_floor: 0.3,
                expertise_scales_rating: true,
                classifiable: true,
                tracks_provenance: false,
                field_kind: FieldKind::Text,
            },
            ComponentFamily::ResearchProblem => ComponentProfile {
                kind: MetricKind::FieldComparison,
                dimensions: FIELD_DIMENSIONS_PROBLEM,
                auto_weight_floor: 0.3,
                expertise_scales_rating: true,
                classifiable: true,
                tracks_provenance: true,
                field_kind: FieldKind::Text,
            },
            ComponentFamily::Template => ComponentProfile {
                kind: MetricKind::FieldComparison,
                dimensions: FIELD_DIMENSIONS_TEMPLATE,
                auto_weight_floor: 0.3,
                expertise_scales_rating: true,
                classifiable: true,
                tracks_provenance: true,
                field_kind: FieldKind::Text,
            },
            ComponentFamily::Content => ComponentProfile {
                kind: MetricKind::Content,
                dimensions: CONTENT_DIMENSIONS,
                auto_weight_floor: 0.1,
                expertise_scales_rating: true,
                classifiable: false,
                tracks_provenance: false,
                field_kind: FieldKind::Text,
            },
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a component key is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown component: {0}")]
pub struct UnknownComponent(pub String);

impl FromStr for Component {
    type Err = UnknownComponent;

    /// Accepts snake_case, camelCase and a few upstream spellings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match key.as_str() {
            "title" => Ok(Component::Title),
            "authors" | "author" => Ok(Component::Authors),
            "doi" => Ok(Component::Doi),
            "publicationyear" | "year" | "publicationdate" => Ok(Component::PublicationYear),
            "venue" | "journal" => Ok(Component::Venue),
            "researchfield" | "field" => Ok(Component::ResearchField),
            "researchproblem" | "problem" => Ok(Component::ResearchProblem),
            "template" => Ok(Component::Template),
            "content" => Ok(Component::Content),
            _ => Err(UnknownComponent(s.to_string())),
        }
    }
}

/// Coarse grouping of components that share a scoring strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentFamily {
    Metadata,
    ResearchField,
    ResearchProblem,
    Template,
    Content,
}

// ============================================================================
// Profiles
// ============================================================================

/// How the automated score of a component is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    /// Reference vs extracted string comparison.
    FieldComparison,
    /// Position of the reference among ranked predictions.
    Ranking,
    /// Precision/recall over annotated properties; no reference value.
    Content,
}

/// Validity rules applied to an extracted value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Doi,
    Year,
    PersonList,
    Text,
}

/// A named dimension and its weight in the automated overall score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DimensionSpec {
    pub name: &'static str,
    pub weight: f64,
}

const fn dim(name: &'static str, weight: f64) -> DimensionSpec {
    DimensionSpec { name, weight }
}

pub const COMPLETENESS: &str = "completeness";
pub const CONSISTENCY: &str = "consistency";
pub const VALIDITY: &str = "validity";
pub const EXACT_MATCH: &str = "exact_match";
pub const TOP3_PRESENCE: &str = "top3_presence";
pub const POSITION_SCORE: &str = "position_score";
pub const PRECISION: &str = "precision";
pub const RECALL: &str = "recall";
pub const F1: &str = "f1";

const FIELD_DIMENSIONS_METADATA: &[DimensionSpec] = &[
    dim(COMPLETENESS, 0.4),
    dim(CONSISTENCY, 0.3),
    dim(VALIDITY, 0.3),
];

const FIELD_DIMENSIONS_PROBLEM: &[DimensionSpec] = &[
    dim(COMPLETENESS, 0.3),
    dim(CONSISTENCY, 0.4),
    dim(VALIDITY, 0.3),
];

const FIELD_DIMENSIONS_TEMPLATE: &[DimensionSpec] = &[
    dim(COMPLETENESS, 0.35),
    dim(CONSISTENCY, 0.35),
    dim(VALIDITY, 0.3),
];

const RANKING_DIMENSIONS: &[DimensionSpec] = &[
    dim(EXACT_MATCH, 0.4),
    dim(TOP3_PRESENCE, 0.3),
    dim(POSITION_SCORE, 0.3),
];

const CONTENT_DIMENSIONS: &[DimensionSpec] = &[dim(PRECISION, 0.0), dim(RECALL, 0.0), dim(F1, 1.0)];

/// Scoring strategy for one component.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ComponentProfile {
    pub kind: MetricKind,
    pub dimensions: &'static [DimensionSpec],
    /// Lower bound for the raw automated weight before normalization.
    pub auto_weight_floor: f64,
    /// Whether fusion combines the expertise-adjusted rating rather than
    /// the plain normalized rating.
    pub expertise_scales_rating: bool,
    /// Whether the component has a ground-truth concept (TP/FP/FN/TN).
    pub classifiable: bool,
    /// Whether answers carry an external/generated provenance tag.
    pub tracks_provenance: bool,
    pub field_kind: FieldKind,
}

impl ComponentProfile {
    pub fn weight_of(&self, dimension: &str) -> f64 {
        self.dimensions
            .iter()
            .find(|d| d.name == dimension)
            .map(|d| d.weight)
            .unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_weights_are_convex() {
        for component in Component::ALL {
            let total: f64 = component.profile().dimensions.iter().map(|d| d.weight).sum();
            assert!((total - 1.0).abs() < 1e-9, "{component} weights sum to {total}");
        }
    }

    #[test]
    fn test_only_content_is_unclassifiable() {
        for component in Component::ALL {
            assert_eq!(
                component.profile().classifiable,
                component != Component::Content
            );
        }
    }

    #[test]
    fn test_parse_component_keys() {
        assert_eq!("researchField".parse::<Component>(), Ok(Component::ResearchField));
        assert_eq!("publication_year".parse::<Component>(), Ok(Component::PublicationYear));
        assert_eq!("Research Problem".parse::<Component>(), Ok(Component::ResearchProblem));
        assert!("abstract".parse::<Component>().is_err());
    }

    #[test]
    fn test_round_trip_display() {
        for component in Component::ALL {
            assert_eq!(component.as_str().parse::<Component>(), Ok(component));
        }
    }
}
