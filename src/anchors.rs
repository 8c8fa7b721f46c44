//! Per-document anchor table.
//!
//! Maps anchor names to the node that carried them. The table stores handles,
//! not copies, so every alias resolves to the very same node. Containers are
//! registered as soon as they are created, before any child is parsed, which
//! is what lets a child alias its own unfinished ancestor.

use ahash::AHashMap;

use crate::node::NodeId;

#[derive(Debug, Default)]
pub(crate) struct AnchorTable {
    entries: AHashMap<String, NodeId>,
}

impl AnchorTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Register `node` under `name`. Absent or empty names are ignored.
    ///
    /// A name that is already present is overwritten: later aliases resolve
    /// to the latest definition.
    pub(crate) fn register(&mut self, name: Option<&str>, node: NodeId) {
        let Some(name) = name.filter(|n| !n.is_empty()) else {
            return;
        };
        if let Some(previous) = self.entries.insert(name.to_owned(), node) {
            log::debug!("anchor `{name}` redefined: {previous} replaced by {node}");
        }
    }

    /// Shared handle of the node registered under `name`.
    pub(crate) fn resolve(&self, name: &str) -> Option<NodeId> {
        self.entries.get(name).copied()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_and_resolve() {
        let mut table = AnchorTable::new();
        table.register(Some("a"), NodeId(3));
        assert_eq!(table.resolve("a"), Some(NodeId(3)));
        assert_eq!(table.resolve("b"), None);
    }

    #[test]
    fn empty_or_missing_names_are_ignored() {
        let mut table = AnchorTable::new();
        table.register(None, NodeId(1));
        table.register(Some(""), NodeId(2));
        assert_eq!(table.len(), 0);
        assert_eq!(table.resolve(""), None);
    }

    #[test]
    fn last_definition_wins() {
        let mut table = AnchorTable::new();
        table.register(Some("x"), NodeId(1));
        table.register(Some("x"), NodeId(7));
        assert_eq!(table.resolve("x"), Some(NodeId(7)));
        assert_eq!(table.len(), 1);
    }
}
