/*
Debug rendering of game trees with termtree.

Each node becomes one line listing its properties as `KEY=value`, children
indented below it in variation order.
 */
use itertools::Itertools;
use termtree::Tree;
use tracing::instrument;

use crate::domain::{GameTree, NodeId, Properties, TreeError, TreeResult};

pub trait TreeDisplay {
    fn to_display_tree(&self, id: NodeId) -> TreeResult<Tree<String>>;
}

fn label(properties: &Properties) -> String {
    if properties.is_empty() {
        return "(empty)".to_string();
    }
    properties
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .join(" ")
}

impl TreeDisplay for GameTree {
    #[instrument(level = "debug", skip(self))]
    fn to_display_tree(&self, id: NodeId) -> TreeResult<Tree<String>> {
        self.node(id)?;

        // Children finish before their parent; each parent takes its last n
        let mut built: Vec<Tree<String>> = Vec::new();
        for (_, node) in self.iter_postorder(id) {
            let leaves = built.split_off(built.len().saturating_sub(node.children().len()));
            built.push(Tree::new(label(node.properties())).with_leaves(leaves));
        }

        built.pop().ok_or(TreeError::NodeNotFound(id))
    }
}
