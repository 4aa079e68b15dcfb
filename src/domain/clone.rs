use tracing::{debug, instrument};

use crate::domain::arena::{GameTree, NodeId};
use crate::domain::error::TreeResult;
use crate::domain::value::{self, Properties};

impl GameTree {
    /// Deep copy of the properties of `id`.
    pub fn clone_properties(&self, id: NodeId) -> TreeResult<Properties> {
        Ok(value::clone_properties(self.properties(id)?))
    }

    /// Copies the subtree of `id` into a new detached tree, returning its root.
    #[instrument(level = "debug", skip(self))]
    pub fn clone_subtree(&mut self, id: NodeId) -> TreeResult<NodeId> {
        let properties = self.clone_properties(id)?;
        let copy = self.create(properties, None)?;
        let mut stack = vec![(id, copy)];
        let mut copied = 1;

        while let Some((source, target)) = stack.pop() {
            let children = self.children(source)?.to_vec();
            for child in children {
                let properties = self.clone_properties(child)?;
                let child_copy = self.create(properties, Some(target))?;
                stack.push((child, child_copy));
                copied += 1;
            }
        }

        debug!(%id, %copy, copied, "cloned subtree");
        Ok(copy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value::Value;

    #[test]
    fn given_subtree_when_cloned_then_shape_and_order_are_preserved() {
        let mut tree = GameTree::new();
        let root = tree.create(Properties::new(), None).unwrap();
        let a = tree.create(Properties::new(), Some(root)).unwrap();
        tree.create(Properties::new(), Some(a)).unwrap();
        tree.create(Properties::new(), Some(root)).unwrap();

        let copy = tree.clone_subtree(root).unwrap();

        assert!(tree.is_root(copy).unwrap());
        assert_eq!(tree.len(), 8);
        assert_eq!(tree.children(copy).unwrap().len(), 2);
        let first = tree.children(copy).unwrap()[0];
        assert_ne!(first, a);
        assert_eq!(tree.children(first).unwrap().len(), 1);
    }

    #[test]
    fn given_clone_when_mutating_copy_then_source_is_untouched() {
        let mut tree = GameTree::new();
        let props = Properties::from([("AB".to_string(), Value::from(vec!["dd", "pp"]))]);
        let source = tree.create(props, None).unwrap();

        let copy = tree.clone_subtree(source).unwrap();
        tree.node_mut(copy)
            .unwrap()
            .properties_mut()
            .get_mut("AB")
            .and_then(Value::as_list_mut)
            .unwrap()
            .push(Value::from("dp"));

        assert_eq!(
            tree.properties(source).unwrap()["AB"],
            Value::from(vec!["dd", "pp"])
        );
        assert_eq!(
            tree.properties(copy).unwrap()["AB"],
            Value::from(vec!["dd", "pp", "dp"])
        );
    }
}
