//! Evaluation Scheduler
//!
//! The scheduler owns every node of the dependency graph and drives the
//! evaluation order. It guarantees that a value is only handed to the
//! observer once everything it depends on has been handed over first.
//!
//! # Algorithm
//!
//! Traversal is Kahn's algorithm run as a sequence of waves:
//!
//! 1. The first frontier holds every node whose prerequisites are already
//!    evaluated. On a fresh graph these are exactly the sources.
//! 2. Each candidate in the frontier is checked:
//!    - Ready (all incoming nodes evaluated): notify the observer, mark the
//!      node evaluated, and push its successors into the next frontier.
//!    - Not ready: push the node itself into the next frontier so it is
//!      retried once the slower paths catch up.
//! 3. Repeat until a frontier comes up empty.
//!
//! A node reached along several paths of different lengths (a diamond) can
//! show up before its last prerequisite fires, which is why it is carried
//! forward instead of dropped. Frontiers are sets, so a node is carried at
//! most once per wave.
//!
//! A wave that evaluates nothing can never be followed by one that does,
//! since only evaluations change readiness. The loop stops there, and any
//! node still unevaluated is reported as part of, or stuck behind, a cycle.

use std::fmt::Debug;
use std::hash::Hash;

use indexmap::{IndexMap, IndexSet};
use tracing::{debug, trace, warn};

use super::error::{GraphError, GraphResult};
use super::node::{GraphNode, NodeId};
use super::observer::Observer;

/// A dependency graph keyed by value, plus the observer it reports to.
///
/// Values must keep a stable `Eq`/`Hash` for as long as they live in the
/// graph; the registry looks nodes up by value.
#[derive(Debug)]
pub struct Graph<T, O> {
    /// Value to registry slot.
    index: IndexMap<T, NodeId>,

    /// All nodes, indexed by `NodeId`.
    nodes: Vec<GraphNode<T>>,

    /// Nodes already handed to the observer, in notification order.
    evaluated: IndexSet<NodeId>,

    /// Number of distinct edges.
    edge_count: usize,

    observer: O,
}

impl<T, O> Graph<T, O>
where
    T: Eq + Hash + Clone,
    O: Observer<T>,
{
    /// Create an empty graph reporting to `observer`.
    pub fn new(observer: O) -> Self {
        Self::with_capacity(observer, 0)
    }

    /// Create an empty graph with room for `capacity` values.
    pub fn with_capacity(observer: O, capacity: usize) -> Self {
        Self {
            index: IndexMap::with_capacity(capacity),
            nodes: Vec::with_capacity(capacity),
            evaluated: IndexSet::with_capacity(capacity),
            edge_count: 0,
            observer,
        }
    }

    /// Declare that `before` must be evaluated before `after`.
    ///
    /// Both values are registered on first reference. Declaring the same
    /// edge twice has no further effect, and a value may be declared to
    /// depend on itself (it will then never be evaluated).
    pub fn add_dependency(&mut self, before: T, after: T) {
        let before = self.intern(before);
        let after = self.intern(after);
        self.link(before, after);
    }

    /// Register a value without any edges.
    ///
    /// An isolated value is a source and is evaluated in the first wave.
    pub fn add_value(&mut self, value: T) -> NodeId {
        self.intern(value)
    }

    /// Look up the slot for `value`, creating an empty node if it is new.
    fn intern(&mut self, value: T) -> NodeId {
        if let Some(&id) = self.index.get(&value) {
            return id;
        }

        let id = NodeId::new(self.nodes.len());
        debug!(node = id.index(), "registering node");
        self.index.insert(value.clone(), id);
        self.nodes.push(GraphNode::new(value));
        id
    }

    /// Record the edge `before -> after` on both ends.
    fn link(&mut self, before: NodeId, after: NodeId) {
        let added = match self.nodes.get_mut(before.index()) {
            Some(node) => node.add_outgoing(after),
            None => return,
        };
        if let Some(node) = self.nodes.get_mut(after.index()) {
            node.add_incoming(before);
        }

        if added {
            self.edge_count += 1;
            trace!(before = before.index(), after = after.index(), "edge added");
        }
    }

    /// Evaluated nodes that gained an unevaluated prerequisite after they were
    /// reported. Only edges declared after a `run` can produce these.
    fn late_dependents(&self) -> Vec<NodeId> {
        self.evaluated
            .iter()
            .copied()
            .filter(|id| {
                self.node_by_id(*id).is_some_and(|node| {
                    node.incoming().iter().any(|p| !self.evaluated.contains(p))
                })
            })
            .collect()
    }

    /// Every not-yet-evaluated node whose prerequisites are all evaluated.
    fn ready_nodes(&self) -> IndexSet<NodeId> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (NodeId::new(index), node))
            .filter(|(id, node)| {
                !self.evaluated.contains(id)
                    && node.incoming().iter().all(|p| self.evaluated.contains(p))
            })
            .map(|(id, _)| id)
            .collect()
    }

    /// Get the node holding `value`.
    pub fn node(&self, value: &T) -> Option<&GraphNode<T>> {
        self.id_of(value).and_then(|id| self.node_by_id(id))
    }

    /// Get a node by its registry slot.
    pub fn node_by_id(&self, id: NodeId) -> Option<&GraphNode<T>> {
        self.nodes.get(id.index())
    }

    /// Get the registry slot for `value`.
    pub fn id_of(&self, value: &T) -> Option<NodeId> {
        self.index.get(value).copied()
    }

    /// Whether `value` has been registered.
    pub fn contains(&self, value: &T) -> bool {
        self.index.contains_key(value)
    }

    /// Get the total number of nodes in the graph.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Get the number of distinct edges in the graph.
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Whether no value has been registered yet.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All values, in registration order.
    pub fn values(&self) -> impl Iterator<Item = &T> + '_ {
        self.nodes.iter().map(GraphNode::value)
    }

    /// Values with no prerequisites.
    pub fn sources(&self) -> impl Iterator<Item = &T> + '_ {
        self.nodes
            .iter()
            .filter(|node| node.is_source())
            .map(GraphNode::value)
    }

    /// Values nothing depends on.
    pub fn sinks(&self) -> impl Iterator<Item = &T> + '_ {
        self.nodes
            .iter()
            .filter(|node| node.is_sink())
            .map(GraphNode::value)
    }

    /// Values that must be evaluated before `value`.
    ///
    /// Empty if `value` is unknown.
    pub fn predecessors<'a>(&'a self, value: &T) -> impl Iterator<Item = &'a T> + 'a {
        let ids = self.node(value).map(GraphNode::incoming);
        self.resolve(ids)
    }

    /// Values that wait on `value`.
    ///
    /// Empty if `value` is unknown.
    pub fn successors<'a>(&'a self, value: &T) -> impl Iterator<Item = &'a T> + 'a {
        let ids = self.node(value).map(GraphNode::outgoing);
        self.resolve(ids)
    }

    fn resolve<'a>(
        &'a self,
        ids: Option<&'a IndexSet<NodeId>>,
    ) -> impl Iterator<Item = &'a T> + 'a {
        ids.into_iter()
            .flatten()
            .filter_map(move |&id| self.node_by_id(id))
            .map(GraphNode::value)
    }

    /// Values already handed to the observer, in notification order.
    pub fn evaluated(&self) -> impl Iterator<Item = &T> + '_ {
        self.evaluated
            .iter()
            .filter_map(move |&id| self.node_by_id(id))
            .map(GraphNode::value)
    }

    /// Whether `value` has been handed to the observer.
    pub fn is_evaluated(&self, value: &T) -> bool {
        self.id_of(value)
            .is_some_and(|id| self.evaluated.contains(&id))
    }

    /// Get the observer.
    pub fn observer(&self) -> &O {
        &self.observer
    }

    /// Get the observer mutably.
    pub fn observer_mut(&mut self) -> &mut O {
        &mut self.observer
    }

    /// Consume the graph, returning its observer.
    pub fn into_observer(self) -> O {
        self.observer
    }
}

impl<T, O> Graph<T, O>
where
    T: Eq + Hash + Clone + Debug,
    O: Observer<T>,
{
    /// Notify the observer of every value in dependency order.
    ///
    /// Values evaluated by an earlier call are not reported again, so calling
    /// `run` after adding more dependencies only reports the new values. New
    /// dependencies may only point at values not yet evaluated.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::CycleDetected`] listing every value that could
    /// not be evaluated. Everything that could be ordered has already been
    /// reported by then.
    ///
    /// Returns [`GraphError::LateDependency`], before reporting anything, if
    /// an already evaluated value was given a prerequisite that is not
    /// evaluated.
    pub fn run(&mut self) -> GraphResult<(), T> {
        let late = self.late_dependents();
        if !late.is_empty() {
            let dependents: Vec<T> = late
                .into_iter()
                .filter_map(|id| self.node_by_id(id))
                .map(|node| node.value().clone())
                .collect();
            warn!(dependents = dependents.len(), "prerequisite added to evaluated value");
            return Err(GraphError::late_dependency(dependents));
        }

        let mut frontier = self.ready_nodes();
        let mut wave = 0usize;

        while !frontier.is_empty() {
            let progress_before = self.evaluated.len();
            let mut next = IndexSet::with_capacity(frontier.len());

            debug!(wave, candidates = frontier.len(), "processing frontier");

            for id in frontier {
                if self.evaluated.contains(&id) {
                    continue;
                }
                let Some(node) = self.nodes.get(id.index()) else {
                    continue;
                };

                if node.incoming().iter().all(|p| self.evaluated.contains(p)) {
                    trace!(node = id.index(), wave, "evaluating");
                    self.observer.evaluating(node.value());
                    self.evaluated.insert(id);
                    next.extend(node.outgoing().iter().copied());
                } else {
                    trace!(node = id.index(), wave, "prerequisites pending, deferring");
                    next.insert(id);
                }
            }

            if self.evaluated.len() == progress_before {
                debug!(wave, stuck = next.len(), "no progress, stopping traversal");
                break;
            }

            frontier = next;
            wave += 1;
        }

        let unresolved: Vec<T> = self
            .nodes
            .iter()
            .enumerate()
            .filter(|(index, _)| !self.evaluated.contains(&NodeId::new(*index)))
            .map(|(_, node)| node.value().clone())
            .collect();

        if unresolved.is_empty() {
            debug!(waves = wave, evaluated = self.evaluated.len(), "traversal complete");
            return Ok(());
        }

        warn!(
            unresolved = unresolved.len(),
            evaluated = self.evaluated.len(),
            "traversal stopped with unresolved dependencies"
        );
        Err(GraphError::cycle_detected(unresolved))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::observer::Recorder;

    fn graph_of(edges: &[(u32, u32)]) -> Graph<u32, Recorder<u32>> {
        let mut graph = Graph::new(Recorder::new());
        for &(before, after) in edges {
            graph.add_dependency(before, after);
        }
        graph
    }

    #[test]
    fn add_dependency_registers_both_ends() {
        let graph = graph_of(&[(1, 2)]);

        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
        assert!(graph.contains(&1));
        assert!(graph.contains(&2));
        assert!(!graph.contains(&3));
    }

    #[test]
    fn edges_are_mutual() {
        let graph = graph_of(&[(1, 2), (1, 3)]);
        let one = graph.id_of(&1).unwrap();
        let two = graph.id_of(&2).unwrap();
        let three = graph.id_of(&3).unwrap();

        let first = graph.node(&1).unwrap();
        assert!(first.outgoing().contains(&two));
        assert!(first.outgoing().contains(&three));
        assert!(first.is_source());

        assert!(graph.node(&2).unwrap().incoming().contains(&one));
        assert!(graph.node(&3).unwrap().incoming().contains(&one));
        assert!(graph.node(&3).unwrap().is_sink());
    }

    #[test]
    fn duplicate_edges_are_ignored() {
        let graph = graph_of(&[(1, 2), (1, 2), (1, 2)]);

        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.node(&2).unwrap().incoming().len(), 1);
    }

    #[test]
    fn chain_is_evaluated_in_order() {
        let mut graph = graph_of(&[(1, 2), (2, 3)]);

        graph.run().unwrap();
        assert_eq!(graph.observer().order(), &[1, 2, 3]);
        assert_eq!(graph.evaluated().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn late_prerequisite_defers_dependent() {
        // 4 is reached after one hop from 1, but 3 needs two more.
        let mut graph = graph_of(&[(1, 4), (1, 2), (2, 3), (3, 4)]);

        graph.run().unwrap();
        assert_eq!(graph.observer().order(), &[1, 2, 3, 4]);
    }

    #[test]
    fn isolated_value_is_evaluated() {
        let mut graph = graph_of(&[(1, 2)]);
        graph.add_value(9);

        graph.run().unwrap();
        let order = graph.observer().order();
        assert_eq!(order.len(), 3);
        assert!(order.contains(&9));
    }

    #[test]
    fn self_loop_is_a_cycle() {
        let mut graph = graph_of(&[(1, 1)]);

        let err = graph.run().unwrap_err();
        assert_eq!(err, GraphError::cycle_detected(vec![1]));
        assert!(graph.observer().order().is_empty());
        assert!(!graph.is_evaluated(&1));
    }

    #[test]
    fn dependents_of_a_cycle_are_unresolved() {
        let mut graph = graph_of(&[(0, 1), (1, 2), (2, 1), (2, 3)]);

        let err = graph.run().unwrap_err();
        assert_eq!(graph.observer().order(), &[0]);
        assert_eq!(err.unresolved(), &[1, 2, 3]);
    }

    #[test]
    fn rerun_only_reports_new_values() {
        let mut graph = graph_of(&[(1, 2)]);
        graph.run().unwrap();

        graph.add_dependency(2, 3);
        graph.add_dependency(5, 3);
        graph.run().unwrap();

        assert_eq!(graph.observer().order(), &[1, 2, 5, 3]);
    }

    #[test]
    fn rerun_rejects_prerequisite_of_evaluated_value() {
        let mut graph = graph_of(&[(1, 2)]);
        graph.run().unwrap();

        graph.add_dependency(3, 2);
        let err = graph.run().unwrap_err();

        assert_eq!(err, GraphError::late_dependency(vec![2]));
        assert_eq!(graph.observer().order(), &[1, 2]);
        assert!(!graph.is_evaluated(&3));
    }

    #[test]
    fn rerun_accepts_edges_out_of_evaluated_values() {
        let mut graph = graph_of(&[(1, 2)]);
        graph.run().unwrap();

        graph.add_dependency(1, 4);
        graph.add_dependency(4, 5);
        graph.run().unwrap();

        assert_eq!(graph.observer().order(), &[1, 2, 4, 5]);
    }

    #[test]
    fn rerun_of_finished_graph_is_silent() {
        let mut graph = graph_of(&[(1, 2)]);
        graph.run().unwrap();
        graph.run().unwrap();

        assert_eq!(graph.observer().order(), &[1, 2]);
    }

    #[test]
    fn value_level_adjacency() {
        let graph = graph_of(&[(1, 3), (2, 3), (3, 4)]);

        assert_eq!(graph.predecessors(&3).copied().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(graph.successors(&3).copied().collect::<Vec<_>>(), vec![4]);
        assert_eq!(graph.successors(&42).count(), 0);
        assert_eq!(graph.sources().copied().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(graph.sinks().copied().collect::<Vec<_>>(), vec![4]);
        assert_eq!(graph.values().copied().collect::<Vec<_>>(), vec![1, 3, 2, 4]);
    }
}
