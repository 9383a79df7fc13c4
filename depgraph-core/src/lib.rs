//! Depgraph Core
//!
//! This crate computes an evaluation order over values connected by
//! "must happen before" dependencies. It implements:
//!
//! - An equality-keyed dependency graph
//! - Layered topological traversal with observer notification
//! - Cycle reporting that never loops
//!
//! It suits build ordering, task pipelines, or any other DAG ordering
//! problem. Evaluation is a sequencing signal only: the observer is called
//! synchronously, one value at a time.
//!
//! # Architecture
//!
//! - `graph`: nodes, the graph registry, the traversal and its errors
//!
//! # Example
//!
//! ```rust
//! use depgraph_core::graph::{Graph, Recorder};
//!
//! let mut graph = Graph::new(Recorder::new());
//! graph.add_dependency("fetch", "build");
//! graph.add_dependency("build", "test");
//!
//! graph.run().expect("acyclic");
//! assert_eq!(graph.observer().order(), &["fetch", "build", "test"]);
//! ```

pub mod graph;

pub use graph::{Graph, GraphError, GraphNode, GraphResult, NodeId, Observer, Recorder};
