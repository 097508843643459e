use indexmap::IndexMap;

use crate::core::data::{Entity, EntityId};

use super::analysis::BodyAnalysis;

/// One reachable entity.
#[derive(Debug)]
pub struct Node<'a> {
    pub id: EntityId,
    pub entity: &'a Entity,
    /// Slot name through which the entity was first reached; `None` for the root.
    pub discovered_as: Option<String>,
    /// Present for entities that carry JavaScript text.
    pub analysis: Option<BodyAnalysis>,
}

/// Every entity reachable from a root routine, keyed by identity in discovery order.
#[derive(Debug)]
pub struct Graph<'a> {
    root: EntityId,
    nodes: IndexMap<EntityId, Node<'a>>,
}

impl<'a> Graph<'a> {
    pub(super) fn new(root: EntityId) -> Self {
        Self {
            root,
            nodes: IndexMap::new(),
        }
    }

    pub(super) fn insert(&mut self, node: Node<'a>) {
        self.nodes.insert(node.id, node);
    }

    pub fn root(&self) -> EntityId {
        self.root
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn node(&self, id: EntityId) -> Option<&Node<'a>> {
        self.nodes.get(&id)
    }

    /// Nodes in discovery order, root first.
    pub fn nodes(&self) -> impl Iterator<Item = &Node<'a>> {
        self.nodes.values()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
