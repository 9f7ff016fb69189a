//! Read-only research-field hierarchy lookups.
//!
//! The hierarchy itself is owned and cached by the caller; the engine only
//! asks for parents through [`FieldHierarchy`].

use crate::metrics::text::normalize_text;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A read-only view of the research-field taxonomy.
pub trait FieldHierarchy: Send + Sync {
    /// Parent label of `label`, if known.
    fn parent(&self, label: &str) -> Option<String>;
}

/// How two field labels are related in the taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldRelation {
    Same,
    /// The candidate is the parent of the reference.
    Parent,
    /// The candidate is a child of the reference.
    Child,
    /// Both share the same parent.
    Sibling,
    Unrelated,
}

impl FieldRelation {
    /// Informational relevance of a prediction with this relation.
    pub fn relevance(&self) -> f64 {
        match self {
            FieldRelation::Same => 1.0,
            FieldRelation::Parent | FieldRelation::Child => 0.6,
            FieldRelation::Sibling => 0.3,
            FieldRelation::Unrelated => 0.0,
        }
    }
}

/// Relation of `candidate` to `reference`.
pub fn relation(hierarchy: &dyn FieldHierarchy, reference: &str, candidate: &str) -> FieldRelation {
    let reference_key = normalize_text(reference);
    let candidate_key = normalize_text(candidate);
    if reference_key.is_empty() || candidate_key.is_empty() {
        return FieldRelation::Unrelated;
    }
    if reference_key == candidate_key {
        return FieldRelation::Same;
    }

    let reference_parent = hierarchy.parent(reference).map(|p| normalize_text(&p));
    let candidate_parent = hierarchy.parent(candidate).map(|p| normalize_text(&p));

    if reference_parent.as_deref() == Some(candidate_key.as_str()) {
        FieldRelation::Parent
    } else if candidate_parent.as_deref() == Some(reference_key.as_str()) {
        FieldRelation::Child
    } else if reference_parent.is_some() && reference_parent == candidate_parent {
        FieldRelation::Sibling
    } else {
        FieldRelation::Unrelated
    }
}

/// Child → parent map for callers that already hold the whole tree.
#[derive(Debug, Clone, Default)]
pub struct InMemoryHierarchy {
    parents: HashMap<String, String>,
}

impl InMemoryHierarchy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, child: &str, parent: &str) {
        self.parents
            .insert(normalize_text(child), parent.trim().to_string());
    }

    pub fn with(mut self, child: &str, parent: &str) -> Self {
        self.insert(child, parent);
        self
    }
}

impl FieldHierarchy for InMemoryHierarchy {
    fn parent(&self, label: &str) -> Option<String> {
        self.parents.get(&normalize_text(label)).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn taxonomy() -> InMemoryHierarchy {
        InMemoryHierarchy::new()
            .with("Machine Learning", "Computer Sciences")
            .with("Databases", "Computer Sciences")
            .with("Deep Learning", "Machine Learning")
    }

    #[test]
    fn test_relations() {
        let h = taxonomy();
        assert_eq!(relation(&h, "machine learning", "Machine Learning"), FieldRelation::Same);
        assert_eq!(relation(&h, "Machine Learning", "Computer Sciences"), FieldRelation::Parent);
        assert_eq!(relation(&h, "Machine Learning", "Deep Learning"), FieldRelation::Child);
        assert_eq!(relation(&h, "Machine Learning", "Databases"), FieldRelation::Sibling);
        assert_eq!(relation(&h, "Machine Learning", "Botany"), FieldRelation::Unrelated);
    }

    #[test]
    fn test_unknown_labels_are_unrelated() {
        let h = InMemoryHierarchy::new();
        assert_eq!(relation(&h, "A", "B"), FieldRelation::Unrelated);
    }
}
