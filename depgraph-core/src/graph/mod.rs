//! Dependency Graph
//!
//! This module implements the dependency graph that orders values for
//! evaluation.
//!
//! # Overview
//!
//! The dependency graph is a directed graph where:
//!
//! - Nodes hold caller values, looked up by equality
//! - Edges mean "must happen before": an edge from A to B means A is
//!   evaluated before B
//!
//! Once built, the graph is traversed wave by wave. Each value is reported
//! to an [`Observer`] as soon as all of its prerequisites have been reported.
//! Values that can never become ready (cycles and anything behind them) are
//! returned as a [`GraphError::CycleDetected`].
//!
//! # Design Decisions
//!
//! 1. Nodes live in a single registry and refer to each other by [`NodeId`],
//!    so adjacency never implies ownership.
//!
//! 2. Both directions of every edge are stored, and only
//!    [`Graph::add_dependency`] writes them, so they cannot drift apart.
//!
//! 3. Registry, adjacency and frontiers are insertion-ordered, which makes
//!    the reported order reproducible for a given sequence of declarations.
//!    Callers should still not read any meaning into the order of values
//!    that became ready together.

mod error;
mod node;
mod observer;
mod scheduler;

pub use error::{GraphError, GraphResult};
pub use node::{GraphNode, NodeId};
pub use observer::{Observer, Recorder};
pub use scheduler::Graph;
