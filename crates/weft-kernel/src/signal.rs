//! Per-edge lifecycle signaling.
//!
//! Every dependency edge carries exactly one conduit: a FIFO channel written
//! by the dependency and read by its dependent. A node holds the write
//! halves toward its dependents (outbound map) and the read halves from its
//! dependencies (inbound map); broadcasting writes one signal set to every
//! outbound conduit.
//!
//! Delivery contract:
//! - FIFO per conduit — two signals from one node to one dependent arrive in
//!   send order.
//! - No ordering across dependents — a broadcast reaches each dependent
//!   independently.
//! - A broadcast never blocks: conduits buffer every outstanding
//!   notification, so one slow reader cannot stall the writer.
//! - Writing after the read half is torn down fails with `ConduitClosed`.

use crate::error::WeftError;
use crate::node::NodeId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tokio::sync::mpsc;
use tracing::trace;

/// Lifecycle states one node reports to its dependents.
///
/// Every dependent should have a reaction — possibly a deliberate
/// non-reaction — to each state for each procedure class it observes. A
/// typical reaction to `Aborted` is to abort the whole dependent chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    /// In line behind its dependencies, not yet begun.
    Waiting,
    /// No longer waiting; execution has begun.
    Started,
    /// Finished successfully.
    Completed,
    /// Failed to finish; no partial effect remains.
    Aborted,
    /// Aborted, and the sender intends to retry.
    AbortRetry,
    /// Partially applied before aborting; a rollback is required.
    PartialAbort,
}

/// Signals keyed by the procedure class that produced them.
///
/// One node can run several procedure kinds; the key lets a dependent
/// attribute a state transition to the right one. Keys match
/// [`AccessProcedure::class`](crate::procedure::AccessProcedure::class).
pub type ProcedureSignals = BTreeMap<String, Signal>;

/// Build a single-class signal set.
pub fn procedure_signal(class: impl Into<String>, signal: Signal) -> ProcedureSignals {
    let mut signals = ProcedureSignals::new();
    signals.insert(class.into(), signal);
    signals
}

/// Write half of a conduit, held in the dependency's outbound map.
#[derive(Debug)]
pub struct SignalSender {
    from: NodeId,
    to: NodeId,
    tx: mpsc::UnboundedSender<ProcedureSignals>,
}

impl SignalSender {
    /// Queue a signal set for the dependent.
    pub fn send(&self, signals: ProcedureSignals) -> Result<(), WeftError> {
        trace!(from = %self.from, to = %self.to, "signal");
        self.tx.send(signals).map_err(|_| WeftError::ConduitClosed {
            from: self.from,
            to: self.to,
        })
    }

    /// The dependent this conduit notifies.
    pub fn dependent(&self) -> NodeId {
        self.to
    }
}

/// Read half of a conduit, held in the dependent's inbound map.
///
/// Single-consumer: the receiver sits behind a mutex so the contract is
/// enforced at runtime without threading `&mut` access through the topology.
/// Reads on distinct conduits never contend.
#[derive(Debug)]
pub struct SignalReceiver {
    from: NodeId,
    to: NodeId,
    rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<ProcedureSignals>>,
}

impl SignalReceiver {
    /// Await the next signal set. `None` once the conduit is torn down and
    /// drained.
    pub async fn recv(&self) -> Option<ProcedureSignals> {
        self.rx.lock().await.recv().await
    }

    /// Non-blocking probe: the next queued signal set, if any.
    pub fn try_recv(&self) -> Option<ProcedureSignals> {
        let mut rx = self.rx.try_lock().ok()?;
        rx.try_recv().ok()
    }

    /// The dependency this conduit observes.
    pub fn dependency(&self) -> NodeId {
        self.from
    }

    /// The dependent that owns this read half.
    pub fn dependent(&self) -> NodeId {
        self.to
    }
}

/// Allocate the conduit for edge (dependent, dependency).
///
/// The two halves must be installed atomically with the edge itself: the
/// sender into the dependency's outbound map under the dependent's id, the
/// receiver into the dependent's inbound map under the dependency's id. No
/// edge may exist without its conduit, and no conduit without its edge.
pub fn conduit(dependency: NodeId, dependent: NodeId) -> (SignalSender, SignalReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        SignalSender {
            from: dependency,
            to: dependent,
            tx,
        },
        SignalReceiver {
            from: dependency,
            to: dependent,
            rx: tokio::sync::Mutex::new(rx),
        },
    )
}

/// A node's paired signaling maps.
#[derive(Debug, Default)]
pub struct Wiring {
    /// Write conduits, keyed by dependent id.
    pub(crate) outbound: BTreeMap<NodeId, SignalSender>,
    /// Read conduits, keyed by dependency id.
    pub(crate) inbound: BTreeMap<NodeId, SignalReceiver>,
}

impl Wiring {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a wiring from explicit maps, for wholesale replacement.
    pub fn from_maps(
        outbound: BTreeMap<NodeId, SignalSender>,
        inbound: BTreeMap<NodeId, SignalReceiver>,
    ) -> Self {
        Self { outbound, inbound }
    }

    /// Write the same signal set to every outbound conduit.
    ///
    /// Each dependent observes the update independently; there is no
    /// ordering guarantee across dependents.
    pub(crate) fn broadcast(&self, signals: &ProcedureSignals) -> Result<(), WeftError> {
        for sender in self.outbound.values() {
            sender.send(signals.clone())?;
        }
        Ok(())
    }

    /// Ids of the dependents this node can notify.
    pub fn outbound_ids(&self) -> Vec<NodeId> {
        self.outbound.keys().copied().collect()
    }

    /// Ids of the dependencies this node observes.
    pub fn inbound_ids(&self) -> Vec<NodeId> {
        self.inbound.keys().copied().collect()
    }

    /// The read half observing `dependency`, if wired.
    pub fn inbound(&self, dependency: NodeId) -> Option<&SignalReceiver> {
        self.inbound.get(&dependency)
    }
}
