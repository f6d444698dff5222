//! Coordinating-node identity and classification.
//!
//! A coordinating node is the unit the fabric orders and signals between.
//! It carries an identifier, a structural kind, a scheduling priority, its
//! access procedures, and a claim: the section of the host structure it
//! coordinates. The claim — not the node's address or payload — is its
//! coordinating role, so role identity is content-addressed over the claim.

use crate::procedure::AccessProcedure;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use weft_cds::{Cds, ElementId, HostEdge};

/// Identifier of a coordinating node, unique within one topology.
///
/// Identity is immutable once assigned. Callers either mint their own ids or
/// draw them from `Topology::generate_id`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle of a virtual node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Life {
    Idle,
    Running,
    Complete,
}

/// Structural kind of a coordinating node.
///
/// Classification is a match on this tag; there is no runtime type
/// inspection anywhere in the fabric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Stable coordinating node, created at assembly and alive for the
    /// topology's lifetime.
    Primary,
    /// Co-located with a primary node and sharing its concerns.
    Temporal { anchor: NodeId },
    /// Transient node spawned into and retired from a live topology.
    Virtual { life: Life },
}

impl NodeKind {
    pub fn is_primary(&self) -> bool {
        matches!(self, NodeKind::Primary)
    }

    pub fn is_temporal(&self) -> bool {
        matches!(self, NodeKind::Temporal { .. })
    }

    pub fn is_virtual(&self) -> bool {
        matches!(self, NodeKind::Virtual { .. })
    }
}

/// The section of the host structure a node coordinates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionClaim {
    pub nodes: BTreeSet<ElementId>,
    pub edges: BTreeSet<HostEdge>,
}

impl SectionClaim {
    /// Claim everything a section view lists.
    pub fn from_cds(section: &impl Cds) -> Self {
        Self {
            nodes: section.list_nodes().into_iter().collect(),
            edges: section.list_edges().into_iter().collect(),
        }
    }

    pub fn contains_node(&self, id: ElementId) -> bool {
        self.nodes.contains(&id)
    }

    pub fn contains_edge(&self, edge: &HostEdge) -> bool {
        self.edges.contains(edge)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    /// Content-addressed fingerprint of this claim.
    ///
    /// Two nodes with equal fingerprints claim the identical coordinating
    /// role. Sets iterate in sorted order, so the digest is deterministic.
    pub fn fingerprint(&self) -> ClaimFingerprint {
        let mut hasher = Sha256::new();
        for node in &self.nodes {
            hasher.update(b"n:");
            hasher.update(node.0.to_be_bytes());
        }
        for edge in &self.edges {
            hasher.update(b"e:");
            hasher.update(edge.source.0.to_be_bytes());
            hasher.update(edge.destination.0.to_be_bytes());
        }
        let digest = hasher.finalize();
        ClaimFingerprint(format!("{digest:x}"))
    }
}

/// Digest identifying a coordinating role.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClaimFingerprint(pub String);

impl fmt::Display for ClaimFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Contract a coordinating node implements to participate in a topology.
///
/// Deliberately minimal: the fabric needs identity, classification, a
/// priority for ordering policies, the attached access procedures, and the
/// claimed section. Everything else — execution, payloads, reactions to
/// inbound signals — belongs to the implementation.
pub trait CoordNode: Send + Sync {
    /// Unique within any topology this node is inserted into.
    fn id(&self) -> NodeId;

    fn kind(&self) -> NodeKind;

    /// Scheduling weight consumed by ordering policies.
    fn priority(&self) -> i64;

    /// Access procedures attached to this node.
    fn procedures(&self) -> &[Arc<dyn AccessProcedure>];

    /// The section of the host structure this node coordinates.
    fn claim(&self) -> &SectionClaim;
}
