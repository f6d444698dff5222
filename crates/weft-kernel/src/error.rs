//! Error taxonomy for topology mutation, signaling, and recovery.

use crate::node::NodeId;

/// Errors arising from structural mutation, signaling, or recovery.
///
/// Structural rejections (`DuplicateNode`, `UnknownNode`, `CycleDetected`,
/// `SelfDependency`, `NotVirtual`, `HasDependencies`) leave the topology
/// exactly as it was; callers may retry with corrected input.
/// `ConduitClosed` is a signaling-contract violation and is not recoverable
/// within the session. `RollbackFailed` is fatal: the host structure may be
/// inconsistent and the error must reach the top-level caller.
#[derive(Debug, thiserror::Error)]
pub enum WeftError {
    /// A node with this identifier is already registered.
    #[error("node {id} already exists in the topology")]
    DuplicateNode { id: NodeId },

    /// The identifier does not name a registered node.
    #[error("node {id} is not part of the topology")]
    UnknownNode { id: NodeId },

    /// Adding the edge would make the dependency relation cyclic.
    #[error("dependency {dependent} -> {dependency} would close a cycle")]
    CycleDetected {
        dependent: NodeId,
        dependency: NodeId,
    },

    /// A node was asked to depend on itself.
    #[error("node {id} cannot be its own dependency")]
    SelfDependency { id: NodeId },

    /// An ordering policy decided an edge the topology had to reject.
    #[error("ordering policy placed node {node} on dependency {dependency}, closing a cycle")]
    OrderingProducedCycle { node: NodeId, dependency: NodeId },

    /// The operation only applies to virtual nodes.
    #[error("node {id} is not virtual")]
    NotVirtual { id: NodeId },

    /// A virtual node cannot retire while it still depends on others.
    #[error("virtual node {id} still has {count} dependencies")]
    HasDependencies { id: NodeId, count: usize },

    /// A signal was written after the reading side was torn down.
    #[error("conduit {from} -> {to} is closed")]
    ConduitClosed { from: NodeId, to: NodeId },

    /// An undo failed; there is no safe automatic recovery.
    #[error("rollback failed for node {node}: {reason}")]
    RollbackFailed { node: NodeId, reason: String },
}
