//! Topology integrity passes: totality-uniqueness and host coverage.
//!
//! Both passes run over a completed topology, once after assembly or on
//! demand. They are deliberately not hot paths: uniqueness is a pairwise
//! O(n²) comparison over primary nodes, coverage a scan of the host listing
//! against every primary claim.

use crate::graph::Topology;
use crate::node::{ClaimFingerprint, CoordNode, SectionClaim};
use weft_cds::Cds;

/// No two primary nodes may claim the identical coordinating role.
///
/// Compares claim fingerprints pairwise across all primary nodes and
/// returns `false` on the first identical pair. Temporal and virtual nodes
/// are outside the check: a temporal node shares its anchor's claim, and
/// virtual nodes are transient.
pub fn totality_unique<N: CoordNode>(topology: &Topology<N>) -> bool {
    let fingerprints: Vec<ClaimFingerprint> = topology
        .nodes()
        .filter(|node| node.kind().is_primary())
        .map(|node| node.claim().fingerprint())
        .collect();

    for (i, fingerprint) in fingerprints.iter().enumerate() {
        for other in &fingerprints[i + 1..] {
            if fingerprint == other {
                return false;
            }
        }
    }
    true
}

/// Every host node and edge must be claimed by at least one primary node.
///
/// Short-circuits on the first uncovered element and does not enumerate
/// gaps; callers needing full diagnostics re-run after each fix.
pub fn covered<N: CoordNode>(topology: &Topology<N>, host: &impl Cds) -> bool {
    let claims: Vec<&SectionClaim> = topology
        .nodes()
        .filter(|node| node.kind().is_primary())
        .map(CoordNode::claim)
        .collect();

    for node in host.list_nodes() {
        if !claims.iter().any(|claim| claim.contains_node(node)) {
            return false;
        }
    }
    for edge in host.list_edges() {
        if !claims.iter().any(|claim| claim.contains_edge(&edge)) {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{Life, NodeKind, SectionClaim};
    use crate::toy::ToyNode;
    use weft_cds::{AdjacencyStore, Subgraph, Subset, ElementId};

    fn claimant(id: u64, claim: SectionClaim) -> ToyNode {
        ToyNode::new(id, NodeKind::Primary, 0).with_claim(claim)
    }

    #[test]
    fn empty_topology_is_unique() {
        let topology: Topology<ToyNode> = Topology::new();
        assert!(totality_unique(&topology));
    }

    #[test]
    fn distinct_claims_are_unique() {
        let host = AdjacencyStore::from_raw(&[1, 2, 3], &[(1, 2), (2, 3)]);
        let mut topology = Topology::new();
        for (id, element) in [(1u64, 1u64), (2, 2), (3, 3)] {
            let view = Subset::new(vec![ElementId(element)], &host);
            topology
                .insert(claimant(id, SectionClaim::from_cds(&view)))
                .expect("insert");
        }
        assert!(totality_unique(&topology));
    }

    #[test]
    fn identical_primary_claims_fail_uniqueness() {
        let host = AdjacencyStore::from_raw(&[1, 2], &[(1, 2)]);
        let claim = SectionClaim::from_cds(&host);
        let mut topology = Topology::new();
        topology.insert(claimant(1, claim.clone())).expect("insert");
        topology.insert(claimant(2, claim)).expect("insert");

        assert!(!totality_unique(&topology));
    }

    #[test]
    fn identical_claims_on_virtuals_are_tolerated() {
        let host = AdjacencyStore::from_raw(&[1, 2], &[(1, 2)]);
        let claim = SectionClaim::from_cds(&host);
        let mut topology = Topology::new();
        topology.insert(claimant(1, claim.clone())).expect("insert");
        let ghost = ToyNode::new(2, NodeKind::Virtual { life: Life::Running }, 0)
            .with_claim(claim);
        topology.insert_virtual(ghost).expect("insert virtual");

        assert!(totality_unique(&topology));
    }

    #[test]
    fn uncovered_host_node_fails_coverage() {
        let host = AdjacencyStore::from_raw(&[1, 2, 3], &[]);
        let view = Subgraph::new(vec![ElementId(1), ElementId(2)], &host);
        let mut topology = Topology::new();
        topology
            .insert(claimant(1, SectionClaim::from_cds(&view)))
            .expect("insert");

        // Host node 3 is claimed by nobody.
        assert!(!covered(&topology, &host));
    }

    #[test]
    fn uncovered_host_edge_fails_coverage() {
        let host = AdjacencyStore::from_raw(&[1, 2], &[(1, 2)]);
        let nodes_only = Subgraph::new(vec![ElementId(1), ElementId(2)], &AdjacencyStore::from_raw(&[1, 2], &[]));
        let mut topology = Topology::new();
        topology
            .insert(claimant(1, SectionClaim::from_cds(&nodes_only)))
            .expect("insert");

        assert!(!covered(&topology, &host));
    }

    #[test]
    fn overlapping_claims_cover_the_host() {
        let host = AdjacencyStore::from_raw(&[1, 2, 3], &[(1, 2), (2, 3)]);
        let left = Subset::new(vec![ElementId(1), ElementId(2)], &host);
        let right = Subset::new(vec![ElementId(2), ElementId(3)], &host);
        let mut topology = Topology::new();
        topology
            .insert(claimant(1, SectionClaim::from_cds(&left)))
            .expect("insert");
        topology
            .insert(claimant(2, SectionClaim::from_cds(&right)))
            .expect("insert");

        assert!(covered(&topology, &host));
        assert!(totality_unique(&topology));
    }
}
