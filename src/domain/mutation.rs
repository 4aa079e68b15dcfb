//! Attach/detach/insert algebra.
//!
//! Every operation validates before it mutates: cycle checks and root checks
//! run first, so a failing call leaves the tree exactly as it was.

use tracing::{debug, instrument};

use crate::domain::arena::{GameTree, NodeId};
use crate::domain::error::{TreeError, TreeResult};

impl GameTree {
    /// Fails with [`TreeError::Cycle`] if `node` is `parent` or one of its ancestors.
    fn ensure_attachable(&self, parent: NodeId, node: NodeId) -> TreeResult<()> {
        self.node(parent)?;
        if self.contains(node, parent)? {
            return Err(TreeError::Cycle { node, parent });
        }
        Ok(())
    }

    /// Moves `node` under `parent` at `index`, detaching it from its current parent first.
    ///
    /// `index` is clamped to the number of children left once `node` is detached.
    fn insert_at(&mut self, parent: NodeId, index: usize, node: NodeId) -> TreeResult<()> {
        self.ensure_attachable(parent, node)?;
        self.detach(node)?;

        let children = self.node_mut(parent)?.children_mut();
        let index = index.min(children.len());
        children.insert(index, node);
        self.node_mut(node)?.set_parent(Some(parent));

        debug!(%parent, %node, index, "attached");
        Ok(())
    }

    fn position_in_parent(&self, node: NodeId) -> TreeResult<Option<(NodeId, usize)>> {
        let Some(parent) = self.node(node)?.parent() else {
            return Ok(None);
        };
        let index = self
            .index_of(parent, node)?
            .ok_or(TreeError::NodeNotFound(node))?;
        Ok(Some((parent, index)))
    }

    /// Inserts `node` as the first child of `parent`.
    #[instrument(level = "debug", skip(self))]
    pub fn prepend(&mut self, parent: NodeId, node: NodeId) -> TreeResult<()> {
        self.insert_at(parent, 0, node)
    }

    /// Inserts `node` as the last child of `parent`.
    #[instrument(level = "debug", skip(self))]
    pub fn append(&mut self, parent: NodeId, node: NodeId) -> TreeResult<()> {
        let len = self.children(parent)?.len();
        self.insert_at(parent, len, node)
    }

    /// Removes `node` from its parent, returning the former parent (None if already a root).
    #[instrument(level = "debug", skip(self))]
    pub fn detach(&mut self, node: NodeId) -> TreeResult<Option<NodeId>> {
        let Some((parent, index)) = self.position_in_parent(node)? else {
            return Ok(None);
        };

        self.node_mut(parent)?.children_mut().remove(index);
        self.node_mut(node)?.set_parent(None);

        debug!(%parent, %node, index, "detached");
        Ok(Some(parent))
    }

    /// Detaches all children of `node`, returning them in their former order.
    #[instrument(level = "debug", skip(self))]
    pub fn empty(&mut self, node: NodeId) -> TreeResult<Vec<NodeId>> {
        let children = self.children(node)?.to_vec();
        for &child in &children {
            self.detach(child)?;
        }
        Ok(children)
    }

    /// Inserts `other` as the sibling immediately preceding `node`.
    #[instrument(level = "debug", skip(self))]
    pub fn before(&mut self, node: NodeId, other: NodeId) -> TreeResult<NodeId> {
        let parent = self.parent(node)?.ok_or(TreeError::NoSibling(node))?;
        self.ensure_attachable(parent, other)?;
        if other == node {
            return Ok(node);
        }

        self.detach(other)?;
        let index = self
            .index_of(parent, node)?
            .ok_or(TreeError::NodeNotFound(node))?;
        self.insert_at(parent, index, other)?;
        Ok(node)
    }

    /// Inserts `other` as the sibling immediately following `node`.
    #[instrument(level = "debug", skip(self))]
    pub fn after(&mut self, node: NodeId, other: NodeId) -> TreeResult<NodeId> {
        let parent = self.parent(node)?.ok_or(TreeError::NoParent(node))?;
        self.ensure_attachable(parent, other)?;
        if other == node {
            return Ok(node);
        }

        self.detach(other)?;
        let index = self
            .index_of(parent, node)?
            .ok_or(TreeError::NodeNotFound(node))?;
        self.insert_at(parent, index + 1, other)?;
        Ok(node)
    }

    /// Puts `other` in the slot of `node`, returning `node` detached.
    #[instrument(level = "debug", skip(self))]
    pub fn replace_with(&mut self, node: NodeId, other: NodeId) -> TreeResult<NodeId> {
        let (parent, index) = self
            .position_in_parent(node)?
            .ok_or(TreeError::NoParent(node))?;
        self.ensure_attachable(parent, other)?;

        self.detach(node)?;
        self.insert_at(parent, index, other)?;
        Ok(node)
    }
}
