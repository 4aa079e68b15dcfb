//! Builds node graphs from the nested sequence form.

use std::fmt;

use tracing::{debug, instrument, trace};

use crate::domain::arena::{GameTree, NodeId};
use crate::domain::error::TreeResult;
use crate::domain::serialize::SgfTree;
use crate::domain::value::{self, Properties};

/// Hook turning raw property maps into the values stored on nodes.
///
/// Coordinate decoding or number coercion plugs in here; the tree itself
/// never interprets properties.
pub trait PropertyDecoder {
    fn decode(&self, raw: &Properties) -> Properties;
}

/// Stores raw properties unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl PropertyDecoder for Identity {
    fn decode(&self, raw: &Properties) -> Properties {
        value::clone_properties(raw)
    }
}

impl<F> PropertyDecoder for F
where
    F: Fn(&Properties) -> Properties,
{
    fn decode(&self, raw: &Properties) -> Properties {
        self(raw)
    }
}

/// Parser from [`SgfTree`] forms into a [`GameTree`].
pub struct Parser<D = Identity> {
    decoder: D,
}

impl Default for Parser<Identity> {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser<Identity> {
    pub fn new() -> Self {
        Self { decoder: Identity }
    }
}

impl<D: PropertyDecoder> Parser<D> {
    pub fn with_decoder(decoder: D) -> Self {
        Self { decoder }
    }

    /// Applies the decoding hook to one raw property map.
    pub fn parse_properties(&self, raw: &Properties) -> Properties {
        self.decoder.decode(raw)
    }

    /// Parses `form` (a single empty node if absent) under `parent`, returning the entry node.
    ///
    /// The entry node is the first node of the form's sequence, attached as
    /// last child of `parent` if given and a fresh root otherwise. Later
    /// sequence entries chain below it and each variation hangs off the last
    /// node of the chain.
    #[instrument(level = "debug", skip(self, tree, form))]
    pub fn parse(
        &self,
        tree: &mut GameTree,
        form: Option<&SgfTree>,
        parent: Option<NodeId>,
    ) -> TreeResult<NodeId> {
        let default_form;
        let form = match form {
            Some(form) => form,
            None => {
                default_form = SgfTree::default();
                &default_form
            }
        };

        if let Some(parent) = parent {
            tree.node(parent)?;
        }
        let (entry, last) = self.parse_sequence(tree, form, parent)?;
        let mut pending: Vec<_> = form.variations.iter().rev().map(|v| (v, last)).collect();
        while let Some((variation, branch_point)) = pending.pop() {
            let (_, last) = self.parse_sequence(tree, variation, Some(branch_point))?;
            pending.extend(variation.variations.iter().rev().map(|v| (v, last)));
        }

        debug!(%entry, nodes = form.node_count(), "parsed");
        Ok(entry)
    }

    /// Creates the chain for one sequence, returning its first and last node.
    fn parse_sequence(
        &self,
        tree: &mut GameTree,
        form: &SgfTree,
        parent: Option<NodeId>,
    ) -> TreeResult<(NodeId, NodeId)> {
        let mut sequence = form.sequence.iter();
        let entry_properties = match sequence.next() {
            Some(raw) => self.parse_properties(raw),
            None => Properties::new(),
        };
        let entry = tree.create(entry_properties, parent)?;

        let mut last = entry;
        for raw in sequence {
            last = tree.create(self.parse_properties(raw), Some(last))?;
        }
        trace!(%entry, %last, variations = form.variations.len(), "sequence built");

        Ok((entry, last))
    }
}

impl<D> fmt::Debug for Parser<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parser").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value::Value;

    #[test]
    fn given_no_form_when_parsing_then_creates_single_empty_node() {
        let mut tree = GameTree::new();

        let entry = Parser::new().parse(&mut tree, None, None).unwrap();

        assert!(tree.properties(entry).unwrap().is_empty());
        assert!(tree.is_leaf(entry).unwrap());
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn given_empty_sequence_when_parsing_then_still_creates_entry_node() {
        let mut tree = GameTree::new();
        let form = SgfTree::new(vec![], vec![SgfTree::default()]);

        let entry = Parser::new().parse(&mut tree, Some(&form), None).unwrap();

        assert!(tree.properties(entry).unwrap().is_empty());
        assert_eq!(tree.children(entry).unwrap().len(), 1);
    }

    #[test]
    fn given_decoder_when_parsing_then_every_node_is_decoded() {
        let mut tree = GameTree::new();
        let raw = Properties::from([("KM".to_string(), Value::from("6.5"))]);
        let form = SgfTree::new(vec![raw.clone(), raw], vec![]);
        let parser = Parser::with_decoder(|raw: &Properties| -> Properties {
            raw.iter()
                .map(|(k, v)| {
                    let decoded = v
                        .as_str()
                        .and_then(|s| s.parse::<f64>().ok())
                        .map(Value::Float)
                        .unwrap_or_else(|| v.clone());
                    (k.clone(), decoded)
                })
                .collect()
        });

        let entry = parser.parse(&mut tree, Some(&form), None).unwrap();
        let child = tree.children(entry).unwrap()[0];

        assert_eq!(tree.properties(entry).unwrap()["KM"], Value::Float(6.5));
        assert_eq!(tree.properties(child).unwrap()["KM"], Value::Float(6.5));
    }
}
