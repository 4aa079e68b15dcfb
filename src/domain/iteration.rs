//! Depth-first traversal and document-order navigation.
//!
//! Document order is pre-order depth-first: a node, then each variation
//! below it from main line to last alternative.

use std::collections::VecDeque;

use tracing::instrument;

use crate::domain::arena::{GameTree, Node, NodeId};
use crate::domain::error::TreeResult;

/// Traversal hook receiving each visited node.
pub type VisitFn<'f> = &'f mut dyn FnMut(NodeId, &Node);

impl GameTree {
    /// Walks the subtree of `id`, calling `pre` before and `post` after each node's children.
    ///
    /// Hooks get shared access only; the tree cannot change under the walk.
    #[instrument(level = "trace", skip(self, pre, post))]
    pub fn for_each(
        &self,
        id: NodeId,
        mut pre: Option<VisitFn<'_>>,
        mut post: Option<VisitFn<'_>>,
    ) -> TreeResult<NodeId> {
        let mut stack = vec![(id, false)];

        while let Some((current, visited)) = stack.pop() {
            let node = self.node(current)?;
            if visited {
                if let Some(post) = post.as_mut() {
                    post(current, node);
                }
                continue;
            }

            if let Some(pre) = pre.as_mut() {
                pre(current, node);
            }
            stack.push((current, true));
            for &child in node.children().iter().rev() {
                stack.push((child, false));
            }
        }

        Ok(id)
    }

    /// First node in document order below `id` (inclusive) satisfying `predicate`.
    #[instrument(level = "trace", skip(self, predicate))]
    pub fn find<P>(&self, id: NodeId, mut predicate: P) -> TreeResult<Option<NodeId>>
    where
        P: FnMut(NodeId, &Node) -> bool,
    {
        let mut queue = VecDeque::from([id]);

        while let Some(current) = queue.pop_front() {
            let node = self.node(current)?;
            if predicate(current, node) {
                return Ok(Some(current));
            }
            for &child in node.children().iter().rev() {
                queue.push_front(child);
            }
        }

        Ok(None)
    }

    /// Successor of `id` in document order.
    #[instrument(level = "trace", skip(self))]
    pub fn next(&self, id: NodeId) -> TreeResult<Option<NodeId>> {
        if let Some(&first) = self.node(id)?.children().first() {
            return Ok(Some(first));
        }

        let mut current = Some(id);
        while let Some(node) = current {
            if let Some(sibling) = self.next_sibling(node)? {
                return Ok(Some(sibling));
            }
            current = self.parent(node)?;
        }

        Ok(None)
    }

    /// Predecessor of `id` in document order.
    #[instrument(level = "trace", skip(self))]
    pub fn previous(&self, id: NodeId) -> TreeResult<Option<NodeId>> {
        let Some(mut current) = self.previous_sibling(id)? else {
            return self.parent(id);
        };

        while let Some(&last) = self.node(current)?.children().last() {
            current = last;
        }

        Ok(Some(current))
    }

    pub fn next_sibling(&self, id: NodeId) -> TreeResult<Option<NodeId>> {
        self.sibling_at_offset(id, 1)
    }

    pub fn previous_sibling(&self, id: NodeId) -> TreeResult<Option<NodeId>> {
        self.sibling_at_offset(id, -1)
    }

    fn sibling_at_offset(&self, id: NodeId, offset: isize) -> TreeResult<Option<NodeId>> {
        let Some(siblings) = self.siblings(id)? else {
            return Ok(None);
        };
        let sibling = siblings
            .iter()
            .position(|&s| s == id)
            .and_then(|index| index.checked_add_signed(offset))
            .and_then(|index| siblings.get(index))
            .copied();
        Ok(sibling)
    }

    /// Pre-order (document order) iterator over the subtree of `id`.
    ///
    /// A stale `id` yields nothing rather than `NodeNotFound`; check it with
    /// [`GameTree::node`] first when the difference matters.
    pub fn iter(&self, id: NodeId) -> TreeIterator<'_> {
        TreeIterator::new(self, id)
    }

    /// Post-order iterator over the subtree of `id`: children before their parent.
    ///
    /// Like [`GameTree::iter`], a stale `id` yields an empty iterator.
    pub fn iter_postorder(&self, id: NodeId) -> PostOrderIterator<'_> {
        PostOrderIterator::new(self, id)
    }
}

pub struct TreeIterator<'a> {
    tree: &'a GameTree,
    stack: Vec<NodeId>,
}

impl<'a> TreeIterator<'a> {
    fn new(tree: &'a GameTree, start: NodeId) -> Self {
        let mut stack = Vec::new();
        if tree.get(start).is_some() {
            stack.push(start);
        }
        Self { tree, stack }
    }
}

impl<'a> Iterator for TreeIterator<'a> {
    type Item = (NodeId, &'a Node);

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.stack.pop()?;
        let node = self.tree.get(current)?;
        // Push children in reverse order for left-to-right traversal
        self.stack.extend(node.children().iter().rev());
        Some((current, node))
    }
}

pub struct PostOrderIterator<'a> {
    tree: &'a GameTree,
    stack: Vec<(NodeId, bool)>,
}

impl<'a> PostOrderIterator<'a> {
    fn new(tree: &'a GameTree, start: NodeId) -> Self {
        let mut stack = Vec::new();
        if tree.get(start).is_some() {
            stack.push((start, false));
        }
        Self { tree, stack }
    }
}

impl<'a> Iterator for PostOrderIterator<'a> {
    type Item = (NodeId, &'a Node);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((current, visited)) = self.stack.pop() {
            let node = self.tree.get(current)?;
            if visited {
                return Some((current, node));
            }
            self.stack.push((current, true));
            for &child in node.children().iter().rev() {
                self.stack.push((child, false));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::TreeError;
    use crate::domain::value::Properties;

    //   r
    //   ├── a
    //   │   ├── b
    //   │   └── c
    //   └── d
    fn sample() -> (GameTree, [NodeId; 5]) {
        let mut tree = GameTree::new();
        let r = tree.create(Properties::new(), None).unwrap();
        let a = tree.create(Properties::new(), Some(r)).unwrap();
        let b = tree.create(Properties::new(), Some(a)).unwrap();
        let c = tree.create(Properties::new(), Some(a)).unwrap();
        let d = tree.create(Properties::new(), Some(r)).unwrap();
        (tree, [r, a, b, c, d])
    }

    #[test]
    fn given_hooks_when_walking_then_pre_and_post_order_are_reported() {
        let (tree, [r, a, b, c, d]) = sample();
        let mut pre = Vec::new();
        let mut post = Vec::new();

        let start = tree
            .for_each(
                r,
                Some(&mut |id: NodeId, _: &Node| pre.push(id)),
                Some(&mut |id: NodeId, _: &Node| post.push(id)),
            )
            .unwrap();

        assert_eq!(start, r);
        assert_eq!(pre, vec![r, a, b, c, d]);
        assert_eq!(post, vec![b, c, a, d, r]);
    }

    #[test]
    fn given_iterators_when_collected_then_match_walk_orders() {
        let (tree, [r, a, b, c, d]) = sample();

        let pre: Vec<_> = tree.iter(r).map(|(id, _)| id).collect();
        let post: Vec<_> = tree.iter_postorder(r).map(|(id, _)| id).collect();

        assert_eq!(pre, vec![r, a, b, c, d]);
        assert_eq!(post, vec![b, c, a, d, r]);
    }

    #[test]
    fn given_last_leaf_of_subtree_when_next_then_climbs_to_uncle() {
        let (tree, [_, _, _, c, d]) = sample();

        assert_eq!(tree.next(c).unwrap(), Some(d));
        assert_eq!(tree.next(d).unwrap(), None);
        assert_eq!(tree.previous(d).unwrap(), Some(c));
    }

    #[test]
    fn given_stale_id_when_iterating_then_yields_nothing() {
        let (mut tree, [_, a, ..]) = sample();
        tree.remove(a).unwrap();

        assert_eq!(tree.iter(a).count(), 0);
        assert_eq!(tree.iter_postorder(a).count(), 0);
        assert_eq!(tree.node(a).err(), Some(TreeError::NodeNotFound(a)));
    }
}
