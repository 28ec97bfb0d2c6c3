//! Error types for DOM and mounting operations.

use thiserror::Error;

use crate::dom::NodeId;

pub type Result<T> = std::result::Result<T, DomError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomError {
    #[error("cannot insert {child} into {parent}: the new child is an ancestor of the parent")]
    HierarchyRequest { parent: NodeId, child: NodeId },

    #[error("{child} is not a child of {parent}")]
    NotAChild { parent: NodeId, child: NodeId },

    #[error("{0} cannot have children")]
    LeafNode(NodeId),
}
