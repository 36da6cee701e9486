//! Node type registry.
//!
//! A read-only catalog of node kinds. Lookups never fail loudly: an unknown
//! id is a plain `None`.

mod catalog;
mod kind;
mod port;

use std::collections::HashSet;

use strum::IntoEnumIterator;

pub use catalog::{ASSET_URL_KEY, TEXT_KEY};
pub use kind::{BeatRole, Category, NodeKind, NodeKindId};
pub use port::{Port, PortDirection, SemanticType};

/// A catalog of node kinds available to a host.
#[derive(Debug, Clone)]
pub struct Registry {
    kinds: Vec<&'static NodeKind>,
}

impl Registry {
    /// Creates a registry with every built-in kind, in declaration order.
    pub fn builtin() -> Self {
        Self::from_kinds(NodeKindId::iter())
    }

    /// Creates a registry restricted to the given kinds.
    ///
    /// Order is preserved; repeated ids are ignored.
    pub fn from_kinds(ids: impl IntoIterator<Item = NodeKindId>) -> Self {
        let mut seen = HashSet::new();
        let kinds = ids
            .into_iter()
            .filter(|id| seen.insert(*id))
            .map(NodeKindId::kind)
            .collect();
        Self { kinds }
    }

    /// Returns every kind in the registry.
    pub fn list_kinds(&self) -> &[&'static NodeKind] {
        &self.kinds
    }

    /// Looks up a kind by its wire id (e.g. `"image_generator"`).
    pub fn get_kind(&self, id: &str) -> Option<&'static NodeKind> {
        let id = id.parse::<NodeKindId>().ok()?;
        self.get(id)
    }

    /// Looks up a kind by id, if it belongs to this registry.
    pub fn get(&self, id: NodeKindId) -> Option<&'static NodeKind> {
        self.kinds.iter().copied().find(|kind| kind.id == id)
    }

    /// Returns whether the kind belongs to this registry.
    pub fn contains(&self, id: NodeKindId) -> bool {
        self.get(id).is_some()
    }

    /// Returns the number of kinds.
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    /// Returns whether the registry holds no kinds.
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_contains_every_kind() {
        let registry = Registry::builtin();
        assert_eq!(registry.len(), NodeKindId::iter().count());
        for id in NodeKindId::iter() {
            assert!(registry.contains(id), "{id} missing from builtin registry");
        }
    }

    #[test]
    fn test_get_kind_by_wire_id() {
        let registry = Registry::builtin();
        let kind = registry.get_kind("image_generator").unwrap();
        assert_eq!(kind.id, NodeKindId::ImageGenerator);
    }

    #[test]
    fn test_unknown_kind_is_not_found() {
        let registry = Registry::builtin();
        assert!(registry.get_kind("hologram_generator").is_none());
        assert!(registry.get_kind("").is_none());
    }

    #[test]
    fn test_restricted_registry() {
        let registry = Registry::from_kinds([
            NodeKindId::Prompt,
            NodeKindId::ImageGenerator,
            NodeKindId::Prompt,
        ]);
        assert_eq!(registry.len(), 2);
        assert!(registry.get(NodeKindId::TextToVideo).is_none());
        assert!(registry.get_kind("text_to_video").is_none());
        assert_eq!(registry.list_kinds()[0].id, NodeKindId::Prompt);
    }
}
