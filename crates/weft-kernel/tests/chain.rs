//! Integration: a poset-assembled chain driven end to end.
//!
//! Three coordinating nodes are ordered into a chain by priority, the chain
//! head commits and its signal is observed link by link, then a partially
//! applied commit is rolled back to the captured pre-image.

use std::sync::{Arc, Mutex};
use weft_cds::ElementId;
use weft_kernel::{
    AccessProcedure, CommitOutcome, NodeId, NodeKind, Poset, PriorityOrder, RestoreSnapshot,
    Signal, Topology, announce, run_commit, run_rollback,
};
use weft_kernel::toy::ToyNode;

/// A procedure that appends to a shared element list and restores it from
/// the pre-image on rollback.
struct AppendProcedure {
    class: String,
    outcome: CommitOutcome,
    state: Arc<Mutex<Vec<ElementId>>>,
}

impl AppendProcedure {
    fn new(class: &str, outcome: CommitOutcome, state: Arc<Mutex<Vec<ElementId>>>) -> Self {
        Self {
            class: class.to_string(),
            outcome,
            state,
        }
    }
}

impl AccessProcedure for AppendProcedure {
    fn class(&self) -> &str {
        &self.class
    }

    fn priority(&self) -> i64 {
        0
    }

    fn commit(&self, target: NodeId) -> CommitOutcome {
        self.state
            .lock()
            .expect("host state")
            .push(ElementId(1000 + target.0));
        self.outcome
    }

    fn rollback(&self, snapshot: &RestoreSnapshot) -> Result<(), String> {
        *self.state.lock().expect("host state") = snapshot.nodes.clone();
        Ok(())
    }
}

fn chain() -> Topology<ToyNode> {
    // C (3) ranks highest, so A -> B -> C.
    let nodes = vec![
        ToyNode::new(1, NodeKind::Primary, 10),
        ToyNode::new(2, NodeKind::Primary, 20),
        ToyNode::new(3, NodeKind::Primary, 30),
    ];
    Poset::assemble(nodes, &mut PriorityOrder)
        .expect("chain assembles")
        .into_graph()
}

#[tokio::test]
async fn chain_orders_and_relays_completion() {
    let topology = chain();
    let (a, b, c) = (NodeId(1), NodeId(2), NodeId(3));

    assert_eq!(topology.dependencies(a), vec![b]);
    assert_eq!(topology.dependencies(b), vec![c]);
    assert_eq!(topology.dependencies(c), Vec::<NodeId>::new());
    assert!(topology.is_root_boundary(c));
    assert!(topology.is_leaf_boundary(a));

    // C completes; B observes it on its inbound conduit from C before
    // relaying its own completion to A.
    announce(&topology, c, "write", Signal::Completed).expect("c signals");

    let from_c = topology
        .inbound(b, c)
        .expect("b observes c")
        .recv()
        .await
        .expect("completion arrives");
    assert_eq!(from_c["write"], Signal::Completed);

    announce(&topology, b, "write", Signal::Completed).expect("b signals");
    let from_b = topology
        .inbound(a, b)
        .expect("a observes b")
        .recv()
        .await
        .expect("relay arrives");
    assert_eq!(from_b["write"], Signal::Completed);

    // A is the leaf boundary: nobody is wired to hear it.
    assert!(
        topology
            .wiring(a)
            .expect("wiring")
            .outbound_ids()
            .is_empty()
    );
}

#[tokio::test]
async fn partial_abort_rolls_back_to_the_captured_pre_image() {
    let topology = chain();
    let (b, c) = (NodeId(2), NodeId(3));

    let host_state = Arc::new(Mutex::new(vec![ElementId(1), ElementId(2)]));
    let procedure = AppendProcedure::new(
        "write",
        CommitOutcome::PartialAbort,
        host_state.clone(),
    );

    // Pre-image taken before the commit touches anything.
    let pre_image = RestoreSnapshot {
        nodes: host_state.lock().expect("host state").clone(),
        edges: Vec::new(),
    };

    let mut receipt =
        run_commit(&topology, c, &procedure, pre_image.clone()).expect("commit runs");

    // The partial effect landed, and the abort reached the dependent.
    assert_eq!(host_state.lock().expect("host state").len(), 3);
    let observed = topology
        .inbound(b, c)
        .expect("b observes c")
        .recv()
        .await
        .expect("abort arrives");
    assert_eq!(observed["write"], Signal::PartialAbort);
    assert!(receipt.needs_rollback());

    // Rollback restores the pre-image exactly.
    run_rollback(&mut receipt, &procedure).expect("rollback");
    assert_eq!(*host_state.lock().expect("host state"), pre_image.nodes);

    // A second invocation is a no-op.
    host_state.lock().expect("host state").push(ElementId(99));
    run_rollback(&mut receipt, &procedure).expect("idempotent");
    assert_eq!(
        *host_state.lock().expect("host state"),
        vec![ElementId(1), ElementId(2), ElementId(99)]
    );
}
