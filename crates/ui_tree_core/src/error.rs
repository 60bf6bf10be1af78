use thiserror::Error;

use crate::node::NodeId;

pub type Result<T> = std::result::Result<T, TreeError>;

/// Structural failures. A call that returns one of these left the tree untouched.
#[derive(Debug, Error)]
pub enum TreeError {
    #[error("unknown node {0}")]
    UnknownNode(NodeId),

    #[error("node ids start at 1, got {0}")]
    InvalidNodeId(u32),

    #[error("moving {node} next to {anchor} would place it inside its own subtree")]
    WouldCreateCycle { node: NodeId, anchor: NodeId },

    #[error("the tree cannot be replaced while a drag is in progress")]
    DragInProgress,

    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}
