//! Traversal error types

use std::fmt::Debug;

use thiserror::Error;

/// Errors surfaced by [`Graph::run`](super::Graph::run).
///
/// Building a graph never fails; only traversal can.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError<T: Debug> {
    /// Some values can never be evaluated because they sit on a cycle or
    /// depend, directly or transitively, on one. A value that depends on
    /// itself lands here too.
    #[error("Cycle detected, {} value(s) can never be evaluated: {unresolved:?}", .unresolved.len())]
    CycleDetected { unresolved: Vec<T> },

    /// Values that were already handed to the observer gained a prerequisite
    /// that has not been. Reporting the new prerequisite now would put it
    /// after its dependent, so nothing is reported.
    #[error("Dependency declared on already evaluated value(s): {dependents:?}")]
    LateDependency { dependents: Vec<T> },
}

impl<T: Debug> GraphError<T> {
    /// Build a [`GraphError::CycleDetected`] from the values left unevaluated.
    pub fn cycle_detected(unresolved: Vec<T>) -> Self {
        Self::CycleDetected { unresolved }
    }

    /// Build a [`GraphError::LateDependency`] from the affected dependents.
    pub fn late_dependency(dependents: Vec<T>) -> Self {
        Self::LateDependency { dependents }
    }

    /// The values traversal could not report.
    ///
    /// For a cycle these are the unevaluated values; for a late dependency,
    /// the already evaluated values whose new prerequisites are pending.
    pub fn unresolved(&self) -> &[T] {
        match self {
            Self::CycleDetected { unresolved } => unresolved,
            Self::LateDependency { dependents } => dependents,
        }
    }
}

/// Result type for graph traversal.
pub type GraphResult<R, T> = std::result::Result<R, GraphError<T>>;
