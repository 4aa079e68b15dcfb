//! Tree-level errors (no external dependencies)

use thiserror::Error;

use crate::domain::arena::NodeId;

/// Tree errors represent contract violations by the caller.
///
/// Every operation checks its preconditions before touching the tree, so an
/// error never leaves a partially applied mutation behind.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    #[error("node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("ancestor node given: inserting {node} under {parent} would create a cycle")]
    Cycle { node: NodeId, parent: NodeId },

    #[error("has no siblings: {0} is a root")]
    NoSibling(NodeId),

    #[error("has no parent: {0} is a root")]
    NoParent(NodeId),

    #[error("not a root node: {0}")]
    NotRoot(NodeId),

    #[error("stringify failed: {message}")]
    Stringify { message: String },

    #[error("config error: {message}")]
    Config { message: String },
}

/// Result type for tree operations.
pub type TreeResult<T> = Result<T, TreeError>;
