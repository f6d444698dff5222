//! The topology store: an acyclic dependency graph over coordinating nodes.
//!
//! Node payloads, the edge relation, and the signaling wiring live in three
//! id-indexed tables; edges exist only as membership of a dependency in a
//! dependent's dependency set, paired with exactly one conduit. Every
//! committed structural mutation re-verifies acyclicity and is rolled back
//! if it would close a cycle, so the topology is acyclic at every observable
//! point.
//!
//! Structural mutation takes `&mut self` — callers get the single-writer
//! discipline from the borrow checker. Broadcasting and reading signals take
//! `&self` and are safe to run concurrently across distinct node pairs.

use crate::error::WeftError;
use crate::node::{CoordNode, NodeId};
use crate::signal::{ProcedureSignals, SignalReceiver, Wiring, conduit};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// An acyclic dependency topology with per-edge signaling.
#[derive(Debug, Default)]
pub struct Topology<N> {
    nodes: BTreeMap<NodeId, N>,
    /// Dependent id -> the ids it depends on.
    deps: BTreeMap<NodeId, BTreeSet<NodeId>>,
    wiring: BTreeMap<NodeId, Wiring>,
    next_id: u64,
}

impl<N: CoordNode> Topology<N> {
    pub fn new() -> Self {
        Self {
            nodes: BTreeMap::new(),
            deps: BTreeMap::new(),
            wiring: BTreeMap::new(),
            next_id: 0,
        }
    }

    /// Register a node with an empty dependency set.
    ///
    /// Assembly-time entry point for primary and temporal nodes; virtual
    /// nodes spawned into a live topology go through [`insert_virtual`].
    ///
    /// [`insert_virtual`]: Topology::insert_virtual
    pub fn insert(&mut self, node: N) -> Result<NodeId, WeftError> {
        let id = node.id();
        if self.nodes.contains_key(&id) {
            return Err(WeftError::DuplicateNode { id });
        }
        self.nodes.insert(id, node);
        self.deps.insert(id, BTreeSet::new());
        self.wiring.insert(id, Wiring::new());
        debug!(%id, "node inserted");
        Ok(id)
    }

    /// Spawn a transient node into a live topology.
    pub fn insert_virtual(&mut self, node: N) -> Result<NodeId, WeftError> {
        if !node.kind().is_virtual() {
            return Err(WeftError::NotVirtual { id: node.id() });
        }
        self.insert(node)
    }

    /// Record that `dependent` depends on `dependency`.
    ///
    /// Allocates the edge's conduit atomically with the edge, then
    /// re-verifies acyclicity; a violating edge is unwound completely and
    /// the call fails with `CycleDetected`. Re-adding an existing edge is a
    /// no-op.
    pub fn add_dependency(
        &mut self,
        dependent: NodeId,
        dependency: NodeId,
    ) -> Result<(), WeftError> {
        if dependent == dependency {
            return Err(WeftError::SelfDependency { id: dependent });
        }
        if !self.nodes.contains_key(&dependent) {
            return Err(WeftError::UnknownNode { id: dependent });
        }
        if !self.nodes.contains_key(&dependency) {
            return Err(WeftError::UnknownNode { id: dependency });
        }

        let set = self.deps.get_mut(&dependent).expect("dependent is registered");
        if !set.insert(dependency) {
            return Ok(());
        }

        let (tx, rx) = conduit(dependency, dependent);
        self.wiring
            .get_mut(&dependency)
            .expect("dependency is registered")
            .outbound
            .insert(dependent, tx);
        self.wiring
            .get_mut(&dependent)
            .expect("dependent is registered")
            .inbound
            .insert(dependency, rx);

        if self.has_cycle() {
            self.deps
                .get_mut(&dependent)
                .expect("dependent is registered")
                .remove(&dependency);
            self.wiring
                .get_mut(&dependency)
                .expect("dependency is registered")
                .outbound
                .remove(&dependent);
            self.wiring
                .get_mut(&dependent)
                .expect("dependent is registered")
                .inbound
                .remove(&dependency);
            return Err(WeftError::CycleDetected {
                dependent,
                dependency,
            });
        }

        debug!(%dependent, %dependency, "dependency added");
        Ok(())
    }

    /// Retire a virtual node.
    ///
    /// The node must be virtual and must no longer depend on anything. Its
    /// former dependents lose their edge to it and the inbound conduit that
    /// came with the edge; the node's own wiring is dropped whole. Removal
    /// is all-or-nothing.
    pub fn remove_virtual(&mut self, id: NodeId) -> Result<(), WeftError> {
        let node = self
            .nodes
            .get(&id)
            .ok_or(WeftError::UnknownNode { id })?;
        if !node.kind().is_virtual() {
            return Err(WeftError::NotVirtual { id });
        }
        let count = self.deps.get(&id).map_or(0, BTreeSet::len);
        if count > 0 {
            return Err(WeftError::HasDependencies { id, count });
        }

        for dependent in self.dependents(id) {
            if let Some(set) = self.deps.get_mut(&dependent) {
                set.remove(&id);
            }
            if let Some(wiring) = self.wiring.get_mut(&dependent) {
                wiring.inbound.remove(&id);
            }
        }

        self.wiring.remove(&id);
        self.deps.remove(&id);
        self.nodes.remove(&id);
        debug!(%id, "virtual node removed");
        Ok(())
    }

    /// Nodes that depend on `id`. Empty for unknown ids.
    pub fn dependents(&self, id: NodeId) -> Vec<NodeId> {
        self.deps
            .iter()
            .filter(|(dependent, set)| **dependent != id && set.contains(&id))
            .map(|(dependent, _)| *dependent)
            .collect()
    }

    /// Nodes that `id` depends on. Empty for unknown ids.
    pub fn dependencies(&self, id: NodeId) -> Vec<NodeId> {
        self.deps
            .get(&id)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Union of dependents and dependencies, without duplicates.
    pub fn adjacents(&self, id: NodeId) -> Vec<NodeId> {
        let mut all: BTreeSet<NodeId> = self.dependents(id).into_iter().collect();
        all.extend(self.dependencies(id));
        all.into_iter().collect()
    }

    /// A root boundary depends on nothing.
    pub fn is_root_boundary(&self, id: NodeId) -> bool {
        self.dependencies(id).is_empty()
    }

    /// A leaf boundary has no dependents.
    pub fn is_leaf_boundary(&self, id: NodeId) -> bool {
        self.dependents(id).is_empty()
    }

    /// Mint an identifier unused by any node currently in the topology.
    ///
    /// The counter is scoped to this topology; each candidate is still
    /// checked against the live node set because callers may insert nodes
    /// carrying their own ids.
    pub fn generate_id(&mut self) -> NodeId {
        loop {
            let id = NodeId(self.next_id);
            self.next_id += 1;
            if !self.nodes.contains_key(&id) {
                return id;
            }
        }
    }

    /// Depth-first cycle scan over the whole topology.
    ///
    /// Iterative DFS with on-path and done marks; every node is visited once
    /// per scan, including nodes unreachable from any particular start.
    pub fn has_cycle(&self) -> bool {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            OnPath,
            Done,
        }

        let mut marks: BTreeMap<NodeId, Mark> = BTreeMap::new();

        for &start in self.deps.keys() {
            if marks.contains_key(&start) {
                continue;
            }
            marks.insert(start, Mark::OnPath);
            let mut stack: Vec<(NodeId, Vec<NodeId>, usize)> =
                vec![(start, self.dependencies(start), 0)];

            while let Some(frame) = stack.last_mut() {
                if frame.2 >= frame.1.len() {
                    let node = frame.0;
                    stack.pop();
                    marks.insert(node, Mark::Done);
                    continue;
                }
                let next = frame.1[frame.2];
                frame.2 += 1;

                match marks.get(&next) {
                    Some(Mark::Done) => {}
                    Some(Mark::OnPath) => return true,
                    None => {
                        marks.insert(next, Mark::OnPath);
                        let neighbors = self.dependencies(next);
                        stack.push((next, neighbors, 0));
                    }
                }
            }
        }
        false
    }

    /// Broadcast one lifecycle update to all of a node's direct dependents.
    pub fn signal(&self, id: NodeId, signals: ProcedureSignals) -> Result<(), WeftError> {
        let wiring = self
            .wiring
            .get(&id)
            .ok_or(WeftError::UnknownNode { id })?;
        wiring.broadcast(&signals)
    }

    /// The read half through which `node` observes `dependency`.
    pub fn inbound(&self, node: NodeId, dependency: NodeId) -> Option<&SignalReceiver> {
        self.wiring.get(&node)?.inbound(dependency)
    }

    /// A node's full signaling wiring.
    pub fn wiring(&self, id: NodeId) -> Option<&Wiring> {
        self.wiring.get(&id)
    }

    /// Replace a node's signaling maps wholesale.
    ///
    /// Structural operation used when the topology is restructured; it is
    /// observationally idempotent. Conduits displaced by the new maps are
    /// dropped and any signals still queued in them are discarded with the
    /// conduit; a writer still holding the paired sender observes
    /// `ConduitClosed` on its next send.
    pub fn update_signaling(&mut self, id: NodeId, wiring: Wiring) -> Result<(), WeftError> {
        if !self.nodes.contains_key(&id) {
            return Err(WeftError::UnknownNode { id });
        }
        self.wiring.insert(id, wiring);
        debug!(%id, "signaling rewired");
        Ok(())
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn node(&self, id: NodeId) -> Option<&N> {
        self.nodes.get(&id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &N> {
        self.nodes.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Cloned snapshot of the edge relation, keyed by dependent.
    pub fn dependency_map(&self) -> BTreeMap<NodeId, BTreeSet<NodeId>> {
        self.deps.clone()
    }
}
