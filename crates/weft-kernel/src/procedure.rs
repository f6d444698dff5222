//! The access-procedure commit/rollback protocol.
//!
//! An access procedure is the unit of work attached to a coordinating node.
//! Committing applies its effect and broadcasts the terminal lifecycle
//! signal — tagged with the procedure class — to the owning node's
//! dependents. Rollback is explicit: a supervising caller that observed an
//! abort replays the pre-image through the procedure's rollback action. The
//! signaling layer never triggers a rollback on its own.

use crate::error::WeftError;
use crate::graph::Topology;
use crate::node::{CoordNode, NodeId, SectionClaim};
use crate::signal::{Signal, procedure_signal};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use weft_cds::{ElementId, HostEdge};

/// Result of a commit attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitOutcome {
    /// The effect applied fully.
    Completed,
    /// The effect did not apply; nothing to undo.
    Aborted,
    /// The effect applied partially; a rollback is required.
    PartialAbort,
}

impl CommitOutcome {
    /// The lifecycle signal broadcast for this outcome.
    pub fn signal(self) -> Signal {
        match self {
            CommitOutcome::Completed => Signal::Completed,
            CommitOutcome::Aborted => Signal::Aborted,
            CommitOutcome::PartialAbort => Signal::PartialAbort,
        }
    }

    pub fn is_abort(self) -> bool {
        matches!(self, CommitOutcome::Aborted | CommitOutcome::PartialAbort)
    }
}

/// Pre-image of the host elements a procedure is about to mutate.
///
/// Captured before commit begins; ownership moves into the commit driver
/// and the snapshot is consumed exactly once by a rollback.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestoreSnapshot {
    pub nodes: Vec<ElementId>,
    pub edges: Vec<HostEdge>,
}

impl RestoreSnapshot {
    /// Snapshot everything a claim covers.
    pub fn capture(claim: &SectionClaim) -> Self {
        Self {
            nodes: claim.nodes.iter().copied().collect(),
            edges: claim.edges.iter().copied().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }
}

/// A unit of work attached to a coordinating node.
pub trait AccessProcedure: Send + Sync {
    /// Class tag identifying this procedure in signal sets.
    fn class(&self) -> &str;

    /// Weight relative to other procedures on the same node.
    fn priority(&self) -> i64;

    /// Apply the procedure's effect against the target node's claim.
    fn commit(&self, target: NodeId) -> CommitOutcome;

    /// Undo a partially applied commit using the captured pre-image.
    ///
    /// Must be idempotent against the host structure; the driver guarantees
    /// it is invoked at most once per snapshot. An `Err` means the undo
    /// itself failed and the session cannot continue safely.
    fn rollback(&self, snapshot: &RestoreSnapshot) -> Result<(), String>;
}

/// Receipt of one commit attempt.
///
/// Retains the pre-image exactly when the outcome requires recovery; the
/// snapshot leaves the receipt on the first rollback.
#[derive(Debug)]
pub struct CommitReceipt {
    node: NodeId,
    class: String,
    outcome: CommitOutcome,
    committed_at: DateTime<Utc>,
    snapshot: Option<RestoreSnapshot>,
}

impl CommitReceipt {
    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn class(&self) -> &str {
        &self.class
    }

    pub fn outcome(&self) -> CommitOutcome {
        self.outcome
    }

    pub fn committed_at(&self) -> DateTime<Utc> {
        self.committed_at
    }

    /// Whether this receipt still holds a pre-image awaiting rollback.
    pub fn needs_rollback(&self) -> bool {
        self.snapshot.is_some()
    }
}

/// What a rollback invocation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollbackOutcome {
    RolledBack,
    /// The receipt's snapshot was already consumed; nothing to undo.
    AlreadyRolledBack,
}

/// Run one commit and broadcast its terminal signal.
///
/// The caller captures the pre-image before any effect is applied and hands
/// it in; the receipt keeps it only when the outcome is an abort. The
/// broadcast reaches every direct dependent of `node`.
pub fn run_commit<N: CoordNode>(
    topology: &Topology<N>,
    node: NodeId,
    procedure: &dyn AccessProcedure,
    snapshot: RestoreSnapshot,
) -> Result<CommitReceipt, WeftError> {
    if !topology.contains(node) {
        return Err(WeftError::UnknownNode { id: node });
    }

    let outcome = procedure.commit(node);
    debug!(%node, class = procedure.class(), ?outcome, "commit finished");
    topology.signal(node, procedure_signal(procedure.class(), outcome.signal()))?;

    Ok(CommitReceipt {
        node,
        class: procedure.class().to_string(),
        outcome,
        committed_at: Utc::now(),
        snapshot: outcome.is_abort().then_some(snapshot),
    })
}

/// Commit every procedure attached to a node, highest priority first.
///
/// One pre-image is captured per procedure from the node's claim, so each
/// receipt can recover independently.
pub fn run_node<N: CoordNode>(
    topology: &Topology<N>,
    node: NodeId,
) -> Result<Vec<CommitReceipt>, WeftError> {
    let holder = topology
        .node(node)
        .ok_or(WeftError::UnknownNode { id: node })?;

    let mut procedures: Vec<_> = holder.procedures().to_vec();
    procedures.sort_by_key(|procedure| std::cmp::Reverse(procedure.priority()));

    let mut receipts = Vec::with_capacity(procedures.len());
    for procedure in procedures {
        let snapshot = RestoreSnapshot::capture(holder.claim());
        receipts.push(run_commit(topology, node, procedure.as_ref(), snapshot)?);
    }
    Ok(receipts)
}

/// Replay a receipt's pre-image through the procedure's rollback action.
///
/// Idempotent: the snapshot is taken out of the receipt on the first call,
/// so a second invocation is a no-op. A rollback error is fatal — the host
/// structure may be inconsistent — and is surfaced, never retried.
pub fn run_rollback(
    receipt: &mut CommitReceipt,
    procedure: &dyn AccessProcedure,
) -> Result<RollbackOutcome, WeftError> {
    let Some(snapshot) = receipt.snapshot.take() else {
        return Ok(RollbackOutcome::AlreadyRolledBack);
    };

    match procedure.rollback(&snapshot) {
        Ok(()) => {
            debug!(node = %receipt.node, class = %receipt.class, "rolled back");
            Ok(RollbackOutcome::RolledBack)
        }
        Err(reason) => {
            warn!(node = %receipt.node, class = %receipt.class, %reason, "rollback failed");
            Err(WeftError::RollbackFailed {
                node: receipt.node,
                reason,
            })
        }
    }
}

/// Broadcast a non-terminal lifecycle update for one procedure class.
pub fn announce<N: CoordNode>(
    topology: &Topology<N>,
    node: NodeId,
    class: &str,
    signal: Signal,
) -> Result<(), WeftError> {
    topology.signal(node, procedure_signal(class, signal))
}
