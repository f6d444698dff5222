//! Read-only section views over a host structure.
//!
//! A section is the slice of the host a coordinating node is responsible
//! for. Sections are non-disjoint: two nodes may see overlapping elements.
//! Every combinator here captures its selection eagerly and implements
//! [`Cds`], so sections compose with anything that consumes a host listing.

use crate::{Cds, ElementId, HostEdge};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Nodes plus exactly the host edges with both endpoints in the selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subgraph {
    nodes: Vec<ElementId>,
    edges: Vec<HostEdge>,
}

impl Subgraph {
    pub fn new(nodes: Vec<ElementId>, host: &impl Cds) -> Self {
        let selected: BTreeSet<ElementId> = nodes.iter().copied().collect();
        let edges = host
            .list_edges()
            .into_iter()
            .filter(|edge| selected.contains(&edge.source) && selected.contains(&edge.destination))
            .collect();
        Self { nodes, edges }
    }
}

impl Cds for Subgraph {
    fn list_nodes(&self) -> Vec<ElementId> {
        self.nodes.clone()
    }

    fn list_edges(&self) -> Vec<HostEdge> {
        self.edges.clone()
    }
}

/// Generic node selection: keeps every host edge touching any selected node.
///
/// Selects nodes generically but not edges — an edge rides along as soon as
/// one endpoint is selected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subset {
    nodes: Vec<ElementId>,
    edges: Vec<HostEdge>,
}

impl Subset {
    pub fn new(nodes: Vec<ElementId>, host: &impl Cds) -> Self {
        let selected: BTreeSet<ElementId> = nodes.iter().copied().collect();
        let mut seen = BTreeSet::new();
        let edges = host
            .list_edges()
            .into_iter()
            .filter(|edge| {
                (selected.contains(&edge.source) || selected.contains(&edge.destination))
                    && seen.insert(*edge)
            })
            .collect();
        Self { nodes, edges }
    }
}

impl Cds for Subset {
    fn list_nodes(&self) -> Vec<ElementId> {
        self.nodes.clone()
    }

    fn list_edges(&self) -> Vec<HostEdge> {
        self.edges.clone()
    }
}

/// A contiguous run of a linear host structure.
///
/// Walks successor edges from `start`, collecting nodes and edges until
/// `end` (inclusive) or the chain runs out. Only meaningful for hosts where
/// each node has at most one outgoing edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partition {
    nodes: Vec<ElementId>,
    edges: Vec<HostEdge>,
}

impl Partition {
    pub fn new(start: ElementId, end: ElementId, host: &impl Cds) -> Self {
        let all_edges = host.list_edges();
        let mut nodes = vec![start];
        let mut edges = Vec::new();
        let mut visited: BTreeSet<ElementId> = BTreeSet::new();
        visited.insert(start);

        let mut current = start;
        while current != end {
            let Some(next) = all_edges.iter().find(|edge| edge.source == current) else {
                break;
            };
            if !visited.insert(next.destination) {
                // Linear walk re-entered a node: the host is not a chain.
                break;
            }
            edges.push(*next);
            nodes.push(next.destination);
            current = next.destination;
        }

        Self { nodes, edges }
    }
}

impl Cds for Partition {
    fn list_nodes(&self) -> Vec<ElementId> {
        self.nodes.clone()
    }

    fn list_edges(&self) -> Vec<HostEdge> {
        self.edges.clone()
    }
}

/// All nodes and edges reachable from `root`, following edge direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    nodes: Vec<ElementId>,
    edges: Vec<HostEdge>,
}

impl Branch {
    pub fn new(root: ElementId, host: &impl Cds) -> Self {
        let all_edges = host.list_edges();
        let mut nodes = Vec::new();
        let mut edges = Vec::new();
        let mut visited: BTreeSet<ElementId> = BTreeSet::new();
        let mut stack = vec![root];

        while let Some(node) = stack.pop() {
            if !visited.insert(node) {
                continue;
            }
            nodes.push(node);
            for edge in all_edges.iter().filter(|edge| edge.source == node) {
                edges.push(*edge);
                stack.push(edge.destination);
            }
        }

        Self { nodes, edges }
    }
}

impl Cds for Branch {
    fn list_nodes(&self) -> Vec<ElementId> {
        self.nodes.clone()
    }

    fn list_edges(&self) -> Vec<HostEdge> {
        self.edges.clone()
    }
}

/// An arbitrary collection of nodes and edges.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Disjoint {
    nodes: Vec<ElementId>,
    edges: Vec<HostEdge>,
}

impl Disjoint {
    pub fn new(nodes: Vec<ElementId>, edges: Vec<HostEdge>) -> Self {
        Self { nodes, edges }
    }
}

impl Cds for Disjoint {
    fn list_nodes(&self) -> Vec<ElementId> {
        self.nodes.clone()
    }

    fn list_edges(&self) -> Vec<HostEdge> {
        self.edges.clone()
    }
}

/// Deduplicating union of sections into a single [`Disjoint`].
pub fn compose(sections: &[&dyn Cds]) -> Disjoint {
    let mut nodes = BTreeSet::new();
    let mut edges = BTreeSet::new();

    for section in sections {
        nodes.extend(section.list_nodes());
        edges.extend(section.list_edges());
    }

    Disjoint {
        nodes: nodes.into_iter().collect(),
        edges: edges.into_iter().collect(),
    }
}
