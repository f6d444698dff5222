//! # weft-cds
//!
//! The host-structure boundary of the weft coordination fabric.
//!
//! A coordinating topology never owns the data it coordinates. The host — any
//! concurrently accessed data structure — is exposed to the fabric through the
//! [`Cds`] listing trait, and coordinating nodes claim read-only views over
//! it. The fabric inspects host elements by identity only; payloads stay on
//! the host's side of the boundary.
//!
//! This crate provides:
//! - [`ElementId`] and [`HostEdge`] — identity of host nodes and edges
//! - [`Cds`] — the listing interface a host structure implements
//! - [`AdjacencyStore`] — the simplest concrete adapter
//! - [`section`] — read-only view combinators over a host structure

pub mod section;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub use section::{Branch, Disjoint, Partition, Subgraph, Subset, compose};

/// Identity of one element (node) of the host structure.
///
/// The fabric never looks past this identity: two host nodes are the same
/// exactly when their `ElementId`s are equal.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct ElementId(pub u64);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A directed edge of the host structure, identified by its endpoints.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct HostEdge {
    pub source: ElementId,
    pub destination: ElementId,
}

impl HostEdge {
    pub fn new(source: ElementId, destination: ElementId) -> Self {
        Self {
            source,
            destination,
        }
    }

    /// Whether `id` is one of this edge's endpoints.
    pub fn touches(&self, id: ElementId) -> bool {
        self.source == id || self.destination == id
    }
}

impl fmt::Display for HostEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.source, self.destination)
    }
}

/// Listing interface a host data structure exposes to the fabric.
///
/// Implementations enumerate their nodes and directed edges by identity.
/// Every read-only section view satisfies the same trait, so a `Cds` is
/// trivially a section over itself.
pub trait Cds {
    fn list_nodes(&self) -> Vec<ElementId>;
    fn list_edges(&self) -> Vec<HostEdge>;

    fn node_count(&self) -> usize {
        self.list_nodes().len()
    }

    fn edge_count(&self) -> usize {
        self.list_edges().len()
    }
}

/// The simplest host adapter: an explicit node list plus an adjacency map.
///
/// Used when one coordinating node is handed the entire host structure, and
/// as the fixture store in tests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjacencyStore {
    nodes: Vec<ElementId>,
    edges: BTreeMap<ElementId, Vec<ElementId>>,
}

impl AdjacencyStore {
    pub fn new(nodes: Vec<ElementId>, edges: BTreeMap<ElementId, Vec<ElementId>>) -> Self {
        Self { nodes, edges }
    }

    /// Convenience constructor over raw ids.
    pub fn from_raw(nodes: &[u64], edges: &[(u64, u64)]) -> Self {
        let mut adjacency: BTreeMap<ElementId, Vec<ElementId>> = BTreeMap::new();
        for &(source, destination) in edges {
            adjacency
                .entry(ElementId(source))
                .or_default()
                .push(ElementId(destination));
        }
        Self {
            nodes: nodes.iter().map(|&id| ElementId(id)).collect(),
            edges: adjacency,
        }
    }
}

impl Cds for AdjacencyStore {
    fn list_nodes(&self) -> Vec<ElementId> {
        self.nodes.clone()
    }

    fn list_edges(&self) -> Vec<HostEdge> {
        self.edges
            .iter()
            .flat_map(|(&source, destinations)| {
                destinations
                    .iter()
                    .map(move |&destination| HostEdge::new(source, destination))
            })
            .collect()
    }
}
