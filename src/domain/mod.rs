//! Domain layer: game tree nodes and their algebra
//!
//! This layer is independent of external concerns (no I/O, no config loading).

pub mod arena;
pub mod clone;
pub mod error;
pub mod iteration;
pub mod mutation;
pub mod parser;
pub mod serialize;
pub mod value;

pub use arena::{GameTree, Node, NodeId};
pub use error::{TreeError, TreeResult};
pub use iteration::{PostOrderIterator, TreeIterator, VisitFn};
pub use parser::{Identity, Parser, PropertyDecoder};
pub use serialize::SgfTree;
pub use value::{CustomValue, Properties, Value};
