//! Game record trees.
//!
//! A game record (a Go kifu, for instance) is an ordered tree: the main line
//! of moves with variations branching off at any node. [`GameTree`] stores
//! the nodes in an arena and provides the mutation algebra, traversal,
//! cloning and conversion to and from the nested sequence form
//! `[sequence, variations]` consumed by SGF tokenizers and stringifiers.
//!
//! ```
//! use sgf_gametree::{GameTree, Parser, SgfTree};
//!
//! let form: SgfTree = serde_json::from_str(r#"[[{"FF":4},{"B":"pd"}],[]]"#).unwrap();
//! let mut tree = GameTree::new();
//! let root = Parser::new().parse(&mut tree, Some(&form), None).unwrap();
//! assert_eq!(tree.to_json(root).unwrap(), form);
//! ```

pub mod config;
pub mod display;
pub mod domain;
pub mod stringify;
pub mod util;

pub use display::TreeDisplay;
pub use domain::{
    CustomValue, GameTree, Identity, Node, NodeId, Parser, Properties, PropertyDecoder, SgfTree,
    TreeError, TreeResult, Value,
};
pub use stringify::{Indent, JsonStringifier, Stringifier, StringifyOptions};
