//! # Weft Kernel
//!
//! A coordination fabric for concurrent access to a shared data structure:
//! independent units of work are composed into a directed acyclic topology,
//! and lifecycle signals propagate along its edges so dependents can react
//! to the state of what they depend on — proceed, retry, or roll back
//! partially applied changes.
//!
//! The kernel establishes *ordering and notification* guarantees only.
//! Scheduling procedures onto execution resources, persisting state, and
//! cross-machine consensus are all the caller's business.
//!
//! ## Architecture
//!
//! ```text
//! Cds                   ← host-structure listings (weft-cds)
//!     │
//! CoordNode             ← node contract: identity, kind, priority, claim
//!     │
//! Topology              ← acyclic dependency store, one conduit per edge
//!     │
//! Poset                 ← policy-driven assembly of a validated topology
//!     │
//! AccessProcedure       ← commit/rollback protocol over lifecycle signals
//! ```
//!
//! Structural mutation is exclusive (`&mut Topology`); signaling is not —
//! broadcasts and reads run concurrently across distinct node pairs.

pub mod error;
pub mod graph;
pub mod node;
pub mod poset;
pub mod procedure;
pub mod signal;
pub mod toy;
pub mod verify;

pub use error::WeftError;
pub use graph::Topology;
pub use node::{ClaimFingerprint, CoordNode, Life, NodeId, NodeKind, SectionClaim};
pub use poset::{FnPolicy, OrderPolicy, Poset, PriorityOrder};
pub use procedure::{
    AccessProcedure, CommitOutcome, CommitReceipt, RestoreSnapshot, RollbackOutcome, announce,
    run_commit, run_node, run_rollback,
};
pub use signal::{ProcedureSignals, Signal, SignalReceiver, SignalSender, Wiring, procedure_signal};
pub use verify::{covered, totality_unique};
