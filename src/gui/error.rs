use thiserror::Error;

use super::node::NodeId;

/// Misuse of the tree contract, reported by the checked `try_*` operations.
/// The unchecked operations panic with the same message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GuiError {
    #[error("node {0} does not exist")]
    UnknownNode(NodeId),

    #[error("node {0} was never attached to the tree")]
    NotCreated(NodeId),

    #[error("node {0} is set to destroy and cannot take new children")]
    ParentDestroying(NodeId),

    #[error("node {0} already has a parent")]
    AlreadyAttached(NodeId),

    #[error("node {0} cannot be attached to itself")]
    SelfAttach(NodeId),

    #[error("node {0} is an ancestor of {1} and cannot become its child")]
    WouldCycle(NodeId, NodeId),

    #[error("node {0} is the root and lives as long as the manager")]
    RootNode(NodeId),
}
