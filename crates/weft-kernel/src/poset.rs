//! Poset assembly: policy-driven construction of a validated topology.
//!
//! A poset turns an unordered collection of coordinating nodes into a fully
//! wired, acyclic topology. The caller supplies the ordering policy; the
//! poset supplies the guarantees — every node inserted before any edge is
//! decided, every edge wired through the topology's cycle-rejecting
//! mutation, and no policy decision ever silently dropped.

use crate::error::WeftError;
use crate::graph::Topology;
use crate::node::{CoordNode, NodeId};
use tracing::debug;

/// Decides where a node sits in the topology.
///
/// `order` is invoked exactly once per node, in ascending id order, after
/// every node has been inserted; it returns the ids the node depends on.
/// A conforming policy is total over the roster and never places a node on
/// itself.
pub trait OrderPolicy<N: CoordNode> {
    fn order(&mut self, node: &N, topology: &Topology<N>) -> Vec<NodeId>;
}

/// Adapter turning a closure into an [`OrderPolicy`].
pub struct FnPolicy<F>(pub F);

impl<N: CoordNode, F> OrderPolicy<N> for FnPolicy<F>
where
    F: FnMut(&N, &Topology<N>) -> Vec<NodeId>,
{
    fn order(&mut self, node: &N, topology: &Topology<N>) -> Vec<NodeId> {
        (self.0)(node, topology)
    }
}

/// A topology assembled under an ordering policy.
#[derive(Debug)]
pub struct Poset<N> {
    topology: Topology<N>,
}

impl<N: CoordNode> Poset<N> {
    /// Assemble a validated topology from an unordered node collection.
    ///
    /// Inserts every node, consults the policy once per node, and wires each
    /// decided edge. A self edge fails with `SelfDependency`; an edge the
    /// topology rejects fails with `OrderingProducedCycle`, naming the node
    /// whose placement decision caused it.
    pub fn assemble<P: OrderPolicy<N>>(nodes: Vec<N>, policy: &mut P) -> Result<Self, WeftError> {
        let mut topology = Topology::new();
        for node in nodes {
            topology.insert(node)?;
        }

        let roster: Vec<NodeId> = topology.ids().collect();
        for id in roster {
            let node = topology.node(id).expect("roster id is registered");
            let placements = policy.order(node, &topology);
            debug!(%id, count = placements.len(), "placement decided");
            for dependency in placements {
                match topology.add_dependency(id, dependency) {
                    Ok(()) => {}
                    Err(WeftError::CycleDetected { .. }) => {
                        return Err(WeftError::OrderingProducedCycle {
                            node: id,
                            dependency,
                        });
                    }
                    Err(err) => return Err(err),
                }
            }
        }

        Ok(Self { topology })
    }

    /// The wrapped topology.
    pub fn graph(&self) -> &Topology<N> {
        &self.topology
    }

    pub fn graph_mut(&mut self) -> &mut Topology<N> {
        &mut self.topology
    }

    pub fn into_graph(self) -> Topology<N> {
        self.topology
    }
}

/// Priority-tier ordering.
///
/// Each node depends on every node in the next strictly-higher priority
/// tier, producing a layered topology where higher-priority work completes
/// first. Ties share a tier and stay independent of each other.
pub struct PriorityOrder;

impl<N: CoordNode> OrderPolicy<N> for PriorityOrder {
    fn order(&mut self, node: &N, topology: &Topology<N>) -> Vec<NodeId> {
        let mine = node.priority();
        let Some(next_tier) = topology
            .nodes()
            .map(CoordNode::priority)
            .filter(|&priority| priority > mine)
            .min()
        else {
            return Vec::new();
        };
        topology
            .nodes()
            .filter(|peer| peer.priority() == next_tier)
            .map(CoordNode::id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeKind;
    use crate::toy::ToyNode;

    fn primary(id: u64, priority: i64) -> ToyNode {
        ToyNode::new(id, NodeKind::Primary, priority)
    }

    #[test]
    fn priority_policy_builds_a_chain() {
        let nodes = vec![primary(1, 10), primary(2, 20), primary(3, 30)];
        let poset =
            Poset::assemble(nodes, &mut PriorityOrder).expect("chain assembles");
        let graph = poset.graph();

        assert_eq!(graph.dependencies(NodeId(1)), vec![NodeId(2)]);
        assert_eq!(graph.dependencies(NodeId(2)), vec![NodeId(3)]);
        assert_eq!(graph.dependencies(NodeId(3)), Vec::<NodeId>::new());
        assert!(!graph.has_cycle());
    }

    #[test]
    fn equal_priorities_share_a_tier() {
        let nodes = vec![primary(1, 10), primary(2, 20), primary(3, 20)];
        let poset = Poset::assemble(nodes, &mut PriorityOrder).expect("assembles");
        let graph = poset.graph();

        assert_eq!(
            graph.dependencies(NodeId(1)),
            vec![NodeId(2), NodeId(3)]
        );
        // Tier peers stay independent.
        assert_eq!(graph.dependencies(NodeId(2)), Vec::<NodeId>::new());
        assert_eq!(graph.dependencies(NodeId(3)), Vec::<NodeId>::new());
    }

    #[test]
    fn self_placement_is_rejected() {
        let nodes = vec![primary(1, 10)];
        let mut policy = FnPolicy(|node: &ToyNode, _: &Topology<ToyNode>| vec![node.id()]);

        let err = Poset::assemble(nodes, &mut policy).expect_err("self edge");
        assert!(matches!(err, WeftError::SelfDependency { id: NodeId(1) }));
    }

    #[test]
    fn contradictory_policy_surfaces_the_culprit() {
        let nodes = vec![primary(1, 10), primary(2, 20)];
        // Everyone depends on everyone else: the second placement closes a loop.
        let mut policy = FnPolicy(|node: &ToyNode, topology: &Topology<ToyNode>| {
            topology.ids().filter(|&id| id != node.id()).collect()
        });

        let err = Poset::assemble(nodes, &mut policy).expect_err("cycle");
        assert!(matches!(
            err,
            WeftError::OrderingProducedCycle {
                node: NodeId(2),
                dependency: NodeId(1)
            }
        ));
    }

    #[test]
    fn duplicate_nodes_fail_assembly() {
        let nodes = vec![primary(1, 10), primary(1, 20)];
        let err = Poset::assemble(nodes, &mut PriorityOrder).expect_err("duplicate");
        assert!(matches!(err, WeftError::DuplicateNode { id: NodeId(1) }));
    }
}
