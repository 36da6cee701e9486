//! Compatibility resolution.
//!
//! When a link is dragged from a port and released on empty canvas, only
//! kinds that can legally accept it are offered, grouped by category.

mod autowire;

pub use autowire::{AutoWireError, AutoWired, WireOrigin, auto_wire};
use serde::Serialize;
use strum::IntoEnumIterator;

use crate::registry::{Category, NodeKind, NodeKindId, PortDirection, Registry, SemanticType};

/// Kinds of one category offered for a dangling link.
#[derive(Debug, Clone, Serialize)]
pub struct CandidateGroup {
    /// Category of every kind in the group.
    pub category: Category,
    /// Display label of the category.
    pub label: &'static str,
    /// Kinds in registry order.
    pub kinds: Vec<&'static NodeKind>,
}

/// Kinds that can be connected to a port, grouped by category.
///
/// An empty set is a normal outcome the host presents as an empty state.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidates {
    /// Type of the origin port.
    pub semantic_type: SemanticType,
    /// Direction of the origin port.
    pub origin_direction: PortDirection,
    groups: Vec<CandidateGroup>,
}

impl Candidates {
    /// Returns the non-empty groups in category order.
    pub fn groups(&self) -> &[CandidateGroup] {
        &self.groups
    }

    /// Returns every candidate kind, group by group.
    pub fn kinds(&self) -> impl Iterator<Item = &'static NodeKind> + '_ {
        self.groups.iter().flat_map(|group| group.kinds.iter().copied())
    }

    /// Returns whether `id` is a candidate.
    pub fn contains(&self, id: NodeKindId) -> bool {
        self.kinds().any(|kind| kind.id == id)
    }

    /// Returns the total number of candidates.
    pub fn len(&self) -> usize {
        self.groups.iter().map(|group| group.kinds.len()).sum()
    }

    /// Returns whether no kind can accept the link.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Narrows the candidates to kinds whose label, description or tags
    /// contain `query`, ignoring case. Groups left empty are dropped.
    #[must_use]
    pub fn filter(&self, query: &str) -> Self {
        let groups = self
            .groups
            .iter()
            .filter_map(|group| {
                let kinds: Vec<_> = group
                    .kinds
                    .iter()
                    .copied()
                    .filter(|kind| kind.matches(query))
                    .collect();
                (!kinds.is_empty()).then(|| CandidateGroup { kinds, ..*group })
            })
            .collect();

        Self { groups, ..*self }
    }
}

/// Finds every kind with at least one port that can connect to an origin
/// port of type `semantic_type` and direction `origin_direction`.
pub fn candidates(
    registry: &Registry,
    semantic_type: SemanticType,
    origin_direction: PortDirection,
) -> Candidates {
    let wanted = origin_direction.opposite();
    let groups = Category::iter()
        .filter_map(|category| {
            let kinds: Vec<_> = registry
                .list_kinds()
                .iter()
                .copied()
                .filter(|kind| kind.category == category)
                .filter(|kind| kind.has_port(wanted, semantic_type))
                .collect();
            (!kinds.is_empty()).then(|| CandidateGroup {
                category,
                label: category.label(),
                kinds,
            })
        })
        .collect();

    Candidates {
        semantic_type,
        origin_direction,
        groups,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_output_offers_only_image_inputs() {
        let registry = Registry::builtin();
        let found = candidates(&registry, SemanticType::ImageAsset, PortDirection::Output);

        assert!(!found.is_empty());
        for kind in found.kinds() {
            assert!(kind.has_port(PortDirection::Input, SemanticType::ImageAsset));
        }
        assert!(found.contains(NodeKindId::ImageToVideo));
        assert!(found.contains(NodeKindId::ImageUpscaler));
        assert!(!found.contains(NodeKindId::ImageGenerator));
    }

    #[test]
    fn test_input_origin_offers_producers() {
        let registry = Registry::builtin();
        let found = candidates(&registry, SemanticType::VideoAsset, PortDirection::Input);

        for kind in found.kinds() {
            assert!(kind.has_port(PortDirection::Output, SemanticType::VideoAsset));
        }
        assert!(found.contains(NodeKindId::TextToVideo));
    }

    #[test]
    fn test_groups_follow_category_order() {
        let registry = Registry::builtin();
        let found = candidates(&registry, SemanticType::PromptText, PortDirection::Output);
        let categories: Vec<_> = found.groups().iter().map(|group| group.category).collect();

        let mut sorted = categories.clone();
        sorted.sort();
        assert_eq!(categories, sorted);
        assert!(found.groups().iter().all(|group| !group.kinds.is_empty()));
    }

    #[test]
    fn test_filter_by_label_and_tag() {
        let registry = Registry::builtin();
        let found = candidates(&registry, SemanticType::PromptText, PortDirection::Output);

        let by_label = found.filter("video");
        assert!(by_label.contains(NodeKindId::TextToVideo));
        assert!(!by_label.contains(NodeKindId::ImageGenerator));

        let by_tag = found.filter("LLM");
        assert_eq!(by_tag.len(), 1);
        assert!(by_tag.contains(NodeKindId::PromptEnhancer));

        assert_eq!(found.filter("").len(), found.len());
    }

    #[test]
    fn test_empty_candidate_set() {
        let registry = Registry::from_kinds([NodeKindId::Prompt, NodeKindId::Note]);
        let found = candidates(&registry, SemanticType::ImageAsset, PortDirection::Output);

        assert!(found.is_empty());
        assert_eq!(found.len(), 0);
        assert!(found.filter("anything").is_empty());
    }
}
