use generational_arena::{Arena, Index};
use std::fmt;
use tracing::{debug, instrument};

use crate::domain::error::{TreeError, TreeResult};
use crate::domain::value::Properties;

/// Handle to a node stored in a [`GameTree`].
///
/// Identity is the arena slot plus its generation: two nodes with equal
/// properties are still different nodes, and the id of a removed node never
/// resolves to a later node reusing the slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(Index);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (slot, generation) = self.0.into_raw_parts();
        write!(f, "#{}.{}", slot, generation)
    }
}

/// Game tree node: one move or setup position in a game record.
#[derive(Debug)]
pub struct Node {
    /// Property mapping, opaque to the tree
    properties: Properties,
    /// Parent node, None for root nodes
    parent: Option<NodeId>,
    /// Child nodes in variation order, main line first
    children: Vec<NodeId>,
}

impl Node {
    fn new(properties: Properties) -> Self {
        Self {
            properties,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    pub fn properties_mut(&mut self) -> &mut Properties {
        &mut self.properties
    }

    /// Replaces the property mapping, returning the node for chaining.
    pub fn set_properties(&mut self, properties: Properties) -> &mut Self {
        self.properties = properties;
        self
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub(crate) fn set_parent(&mut self, parent: Option<NodeId>) {
        self.parent = parent;
    }

    pub(crate) fn children_mut(&mut self) -> &mut Vec<NodeId> {
        &mut self.children
    }
}

/// Arena owning every node of one or more game trees.
///
/// Detached nodes stay in the arena as roots of their own trees until they
/// are re-attached or explicitly removed.
#[derive(Debug)]
pub struct GameTree {
    arena: Arena<Node>,
}

impl Default for GameTree {
    fn default() -> Self {
        Self::new()
    }
}

impl GameTree {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
        }
    }

    /// Creates a node with fresh storage, appended as last child of `parent` if given.
    #[instrument(level = "trace", skip(self, properties))]
    pub fn create(&mut self, properties: Properties, parent: Option<NodeId>) -> TreeResult<NodeId> {
        if let Some(parent_id) = parent {
            self.node(parent_id)?;
        }
        let id = NodeId(self.arena.insert(Node::new(properties)));

        if let Some(parent_id) = parent {
            let parent_node = self.node_mut(parent_id)?;
            parent_node.children_mut().push(id);
            self.node_mut(id)?.set_parent(Some(parent_id));
        }

        Ok(id)
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.arena.get(id.0)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.arena.get_mut(id.0)
    }

    pub fn node(&self, id: NodeId) -> TreeResult<&Node> {
        self.get(id).ok_or(TreeError::NodeNotFound(id))
    }

    pub fn node_mut(&mut self, id: NodeId) -> TreeResult<&mut Node> {
        self.get_mut(id).ok_or(TreeError::NodeNotFound(id))
    }

    pub fn properties(&self, id: NodeId) -> TreeResult<&Properties> {
        Ok(self.node(id)?.properties())
    }

    /// Replaces the properties of `id`, returning the tree for chaining.
    pub fn set_properties(&mut self, id: NodeId, properties: Properties) -> TreeResult<&mut Self> {
        self.node_mut(id)?.set_properties(properties);
        Ok(self)
    }

    pub fn parent(&self, id: NodeId) -> TreeResult<Option<NodeId>> {
        Ok(self.node(id)?.parent())
    }

    pub fn children(&self, id: NodeId) -> TreeResult<&[NodeId]> {
        Ok(self.node(id)?.children())
    }

    pub fn is_root(&self, id: NodeId) -> TreeResult<bool> {
        Ok(self.node(id)?.is_root())
    }

    pub fn is_leaf(&self, id: NodeId) -> TreeResult<bool> {
        Ok(self.node(id)?.is_leaf())
    }

    /// Number of nodes in the arena, attached or not.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Topmost ancestor of `id` (itself for a root).
    #[instrument(level = "trace", skip(self))]
    pub fn root(&self, id: NodeId) -> TreeResult<NodeId> {
        let mut current = id;
        while let Some(parent) = self.node(current)?.parent() {
            current = parent;
        }
        Ok(current)
    }

    /// Children of the parent of `id`, including `id` itself; None for a root.
    pub fn siblings(&self, id: NodeId) -> TreeResult<Option<&[NodeId]>> {
        match self.node(id)?.parent() {
            Some(parent) => Ok(Some(self.node(parent)?.children())),
            None => Ok(None),
        }
    }

    /// Number of edges between `id` and its root.
    #[instrument(level = "trace", skip(self))]
    pub fn depth(&self, id: NodeId) -> TreeResult<usize> {
        let mut depth = 0;
        let mut current = self.node(id)?;
        while let Some(parent) = current.parent() {
            current = self.node(parent)?;
            depth += 1;
        }
        Ok(depth)
    }

    /// Number of edges on the longest downward path from `id` to a leaf.
    #[instrument(level = "trace", skip(self))]
    pub fn height(&self, id: NodeId) -> TreeResult<usize> {
        let mut max_height = 0;
        let mut stack = vec![(id, 0)];

        while let Some((current, height)) = stack.pop() {
            max_height = max_height.max(height);
            for &child in self.node(current)?.children() {
                stack.push((child, height + 1));
            }
        }

        Ok(max_height)
    }

    /// Position of `child` among the children of `parent`.
    pub fn index_of(&self, parent: NodeId, child: NodeId) -> TreeResult<Option<usize>> {
        Ok(self
            .node(parent)?
            .children()
            .iter()
            .position(|&c| c == child))
    }

    /// True iff `other` is `id` or one of its descendants.
    #[instrument(level = "trace", skip(self))]
    pub fn contains(&self, id: NodeId, other: NodeId) -> TreeResult<bool> {
        self.node(id)?;
        let mut current = Some(other);
        while let Some(node) = current {
            if node == id {
                return Ok(true);
            }
            current = self.node(node)?.parent();
        }
        Ok(false)
    }

    /// Collects the leaves below `id`, one per variation, in document order.
    #[instrument(level = "debug", skip(self))]
    pub fn leaves(&self, id: NodeId) -> TreeResult<Vec<NodeId>> {
        self.node(id)?;
        Ok(self
            .iter(id)
            .filter(|(_, node)| node.is_leaf())
            .map(|(leaf, _)| leaf)
            .collect())
    }

    /// Detaches `id` and frees its whole subtree, returning the number of nodes freed.
    ///
    /// Ids inside the removed subtree become stale.
    #[instrument(level = "debug", skip(self))]
    pub fn remove(&mut self, id: NodeId) -> TreeResult<usize> {
        self.detach(id)?;

        let mut removed = 0;
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.arena.remove(current.0) {
                stack.extend(node.children);
                removed += 1;
            }
        }

        debug!(removed, "freed subtree");
        Ok(removed)
    }
}
