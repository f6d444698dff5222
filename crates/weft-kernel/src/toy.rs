//! Toy coordinating nodes and scripted procedures.
//!
//! Minimal implementations of the [`CoordNode`] and [`AccessProcedure`]
//! contracts, used by the kernel's own tests and handy as a starting point
//! when wiring a real host structure into the fabric.

use crate::node::{CoordNode, NodeId, NodeKind, SectionClaim};
use crate::procedure::{AccessProcedure, CommitOutcome, RestoreSnapshot};
use std::sync::{Arc, Mutex};

/// A coordinating node with everything supplied up front.
#[derive(Clone)]
pub struct ToyNode {
    id: NodeId,
    kind: NodeKind,
    priority: i64,
    procedures: Vec<Arc<dyn AccessProcedure>>,
    claim: SectionClaim,
}

impl ToyNode {
    pub fn new(id: u64, kind: NodeKind, priority: i64) -> Self {
        Self {
            id: NodeId(id),
            kind,
            priority,
            procedures: Vec::new(),
            claim: SectionClaim::default(),
        }
    }

    pub fn with_claim(mut self, claim: SectionClaim) -> Self {
        self.claim = claim;
        self
    }

    pub fn with_procedure(mut self, procedure: Arc<dyn AccessProcedure>) -> Self {
        self.procedures.push(procedure);
        self
    }
}

impl std::fmt::Debug for ToyNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToyNode")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("priority", &self.priority)
            .field("procedures", &self.procedures.len())
            .field("claim", &self.claim)
            .finish()
    }
}

impl CoordNode for ToyNode {
    fn id(&self) -> NodeId {
        self.id
    }

    fn kind(&self) -> NodeKind {
        self.kind
    }

    fn priority(&self) -> i64 {
        self.priority
    }

    fn procedures(&self) -> &[Arc<dyn AccessProcedure>] {
        &self.procedures
    }

    fn claim(&self) -> &SectionClaim {
        &self.claim
    }
}

/// A procedure whose commit outcome is scripted and whose rollback
/// invocations are recorded.
pub struct ScriptedProcedure {
    class: String,
    priority: i64,
    outcome: CommitOutcome,
    fail_rollback: bool,
    rollbacks: Mutex<Vec<RestoreSnapshot>>,
}

impl ScriptedProcedure {
    pub fn new(class: impl Into<String>, outcome: CommitOutcome) -> Self {
        Self::with_priority(class, 0, outcome)
    }

    pub fn with_priority(class: impl Into<String>, priority: i64, outcome: CommitOutcome) -> Self {
        Self {
            class: class.into(),
            priority,
            outcome,
            fail_rollback: false,
            rollbacks: Mutex::new(Vec::new()),
        }
    }

    /// Script the rollback action itself to fail.
    pub fn failing_rollback(mut self) -> Self {
        self.fail_rollback = true;
        self
    }

    /// Every pre-image this procedure has been asked to restore.
    pub fn rollbacks(&self) -> Vec<RestoreSnapshot> {
        self.rollbacks.lock().expect("rollback log").clone()
    }
}

impl AccessProcedure for ScriptedProcedure {
    fn class(&self) -> &str {
        &self.class
    }

    fn priority(&self) -> i64 {
        self.priority
    }

    fn commit(&self, _target: NodeId) -> CommitOutcome {
        self.outcome
    }

    fn rollback(&self, snapshot: &RestoreSnapshot) -> Result<(), String> {
        if self.fail_rollback {
            return Err("scripted rollback failure".to_string());
        }
        self.rollbacks
            .lock()
            .expect("rollback log")
            .push(snapshot.clone());
        Ok(())
    }
}
