//! Conversion from the node graph to the nested sequence form.
//!
//! The nested form is `[sequence, variations]`: `sequence` lists the
//! property maps of a run of nodes, `variations` holds one nested form per
//! branch at the end of that run.

use serde::ser::{Serialize, Serializer};
use serde::Deserialize;
use tracing::instrument;

use crate::domain::arena::{GameTree, NodeId};
use crate::domain::error::{TreeError, TreeResult};
use crate::domain::value::{self, Properties};
use crate::stringify::{Stringifier, StringifyOptions};

type RawSgfTree = (Vec<Properties>, Vec<SgfTree>);

/// Nested sequence form of a game tree, serialized as a two element array.
///
/// Dropping a form releases its variations iteratively, so forms of long
/// uncollapsed games can be held and freed safely.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawSgfTree")]
pub struct SgfTree {
    pub sequence: Vec<Properties>,
    pub variations: Vec<SgfTree>,
}

impl SgfTree {
    pub fn new(sequence: Vec<Properties>, variations: Vec<SgfTree>) -> Self {
        Self {
            sequence,
            variations,
        }
    }

    /// Number of nodes the form describes.
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        let mut pending = vec![self];
        while let Some(form) = pending.pop() {
            count += form.sequence.len().max(1);
            pending.extend(&form.variations);
        }
        count
    }
}

/// A single node with empty properties and no variations.
impl Default for SgfTree {
    fn default() -> Self {
        Self::new(vec![Properties::new()], Vec::new())
    }
}

impl Drop for SgfTree {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.variations);
        while let Some(mut form) = pending.pop() {
            pending.append(&mut form.variations);
        }
    }
}

impl From<RawSgfTree> for SgfTree {
    fn from((sequence, variations): RawSgfTree) -> Self {
        Self::new(sequence, variations)
    }
}

impl Serialize for SgfTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (&self.sequence, &self.variations).serialize(serializer)
    }
}

enum Step {
    Visit(NodeId),
    Assemble(Vec<Properties>, usize),
}

impl GameTree {
    /// Shallow form: one property map per sequence, every child as its own variation.
    #[instrument(level = "debug", skip(self))]
    pub fn to_sgf(&self, id: NodeId) -> TreeResult<SgfTree> {
        self.build_form(id, false)
    }

    /// Collapsed form: single-child chains merge into one sequence.
    #[instrument(level = "debug", skip(self))]
    pub fn to_json(&self, id: NodeId) -> TreeResult<SgfTree> {
        self.build_form(id, true)
    }

    /// Builds the nested form bottom-up with an explicit stack.
    ///
    /// Finished forms wait on `built` until their parent is assembled; a
    /// parent with `n` branches takes the last `n` of them, in order.
    fn build_form(&self, id: NodeId, collapse: bool) -> TreeResult<SgfTree> {
        let mut stack = vec![Step::Visit(id)];
        let mut built: Vec<SgfTree> = Vec::new();

        while let Some(step) = stack.pop() {
            match step {
                Step::Visit(head) => {
                    let mut node = self.node(head)?;
                    let mut sequence = vec![value::clone_properties(node.properties())];
                    if collapse {
                        while let [only] = node.children() {
                            node = self.node(*only)?;
                            sequence.push(value::clone_properties(node.properties()));
                        }
                    }
                    let branches = node.children();
                    stack.push(Step::Assemble(sequence, branches.len()));
                    stack.extend(branches.iter().rev().map(|&child| Step::Visit(child)));
                }
                Step::Assemble(sequence, branches) => {
                    let variations = built.split_off(built.len().saturating_sub(branches));
                    built.push(SgfTree::new(sequence, variations));
                }
            }
        }

        built.pop().ok_or(TreeError::NodeNotFound(id))
    }

    /// Renders the tree rooted at `id` through `stringifier`.
    #[instrument(level = "debug", skip(self, stringifier, options))]
    pub fn to_string(
        &self,
        id: NodeId,
        stringifier: &dyn Stringifier,
        options: &StringifyOptions,
    ) -> TreeResult<String> {
        if !self.is_root(id)? {
            return Err(TreeError::NotRoot(id));
        }
        stringifier.stringify(self, &[id], options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value::Value;

    fn props(key: &str, value: &str) -> Properties {
        Properties::from([(key.to_string(), Value::from(value))])
    }

    #[test]
    fn given_chain_with_branch_when_to_json_then_collapses_up_to_branch_point() {
        let mut tree = GameTree::new();
        let root = tree.create(props("FF", "4"), None).unwrap();
        let b = tree.create(props("B", "pd"), Some(root)).unwrap();
        tree.create(props("W", "dp"), Some(b)).unwrap();
        tree.create(props("W", "dd"), Some(b)).unwrap();

        let form = tree.to_json(root).unwrap();

        assert_eq!(form.sequence, vec![props("FF", "4"), props("B", "pd")]);
        assert_eq!(
            form.variations,
            vec![
                SgfTree::new(vec![props("W", "dp")], vec![]),
                SgfTree::new(vec![props("W", "dd")], vec![]),
            ]
        );
    }

    #[test]
    fn given_form_when_serialized_then_is_two_element_array() {
        let form = SgfTree::new(vec![props("FF", "4")], vec![SgfTree::default()]);

        let json = serde_json::to_string(&form).unwrap();

        assert_eq!(json, r#"[[{"FF":"4"}],[[[{}],[]]]]"#);
        assert_eq!(serde_json::from_str::<SgfTree>(&json).unwrap(), form);
    }

    #[test]
    fn given_long_chain_when_to_sgf_then_nests_one_level_per_node() {
        let mut tree = GameTree::new();
        let root = tree.create(Properties::new(), None).unwrap();
        let mut last = root;
        for _ in 1..10_000 {
            last = tree.create(Properties::new(), Some(last)).unwrap();
        }

        let form = tree.to_sgf(root).unwrap();

        assert_eq!(form.node_count(), 10_000);
        let mut depth = 0;
        let mut current = &form;
        while let [only] = current.variations.as_slice() {
            assert_eq!(current.sequence.len(), 1);
            current = only;
            depth += 1;
        }
        assert_eq!(depth, 9_999);
        assert_eq!(tree.to_json(root).unwrap().sequence.len(), 10_000);
    }

    #[test]
    fn given_stale_id_when_to_sgf_then_node_not_found() {
        let mut tree = GameTree::new();
        let stale = tree.create(Properties::new(), None).unwrap();
        tree.remove(stale).unwrap();

        assert_eq!(tree.to_sgf(stale), Err(TreeError::NodeNotFound(stale)));
    }
}
