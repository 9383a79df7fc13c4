//! Graph Nodes
//!
//! This module defines the node type that lives in the dependency graph.
//! A node carries one value plus the two adjacency sets that describe which
//! nodes gate it and which nodes it gates. Nodes never own each other: the
//! adjacency sets hold [`NodeId`]s into the graph's registry.

use indexmap::IndexSet;

/// Identifier for a node in the dependency graph.
///
/// This is the node's slot in the owning graph's registry, so it is only
/// meaningful for the graph that handed it out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Get the raw registry index.
    pub fn index(&self) -> usize {
        self.0
    }
}

/// A node in the dependency graph.
#[derive(Debug, Clone)]
pub struct GraphNode<T> {
    /// The payload this node stands for.
    value: T,

    /// Nodes that must be evaluated before this one.
    incoming: IndexSet<NodeId>,

    /// Nodes that must wait for this one.
    outgoing: IndexSet<NodeId>,
}

impl<T> GraphNode<T> {
    /// Create a node with empty adjacency.
    pub(crate) fn new(value: T) -> Self {
        Self {
            value,
            incoming: IndexSet::new(),
            outgoing: IndexSet::new(),
        }
    }

    /// Get the node's value.
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Record a successor. Inserting the same node twice is a no-op.
    ///
    /// Only the graph calls this, always paired with [`add_incoming`] on the
    /// other end, so the two sets stay mutual.
    ///
    /// [`add_incoming`]: GraphNode::add_incoming
    pub(crate) fn add_outgoing(&mut self, node_id: NodeId) -> bool {
        self.outgoing.insert(node_id)
    }

    /// Record a predecessor. Inserting the same node twice is a no-op.
    pub(crate) fn add_incoming(&mut self, node_id: NodeId) -> bool {
        self.incoming.insert(node_id)
    }

    /// Predecessors, in the order their edges were first declared.
    pub fn incoming(&self) -> &IndexSet<NodeId> {
        &self.incoming
    }

    /// Successors, in the order their edges were first declared.
    pub fn outgoing(&self) -> &IndexSet<NodeId> {
        &self.outgoing
    }

    /// A source has no prerequisites.
    pub fn is_source(&self) -> bool {
        self.incoming.is_empty()
    }

    /// A sink gates nothing.
    pub fn is_sink(&self) -> bool {
        self.outgoing.is_empty()
    }
}
