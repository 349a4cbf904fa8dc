//! Plan validation and target resolution.
//!
//! A plan is checked once, on the coordinator, before anything is
//! dispatched. A rejected plan changes no node's state.

use check_types::{NodeId, StartOptions, TestSpec};
use std::collections::BTreeSet;
use thiserror::Error;

/// Largest `request_size` a test may ask for.
///
/// Every worker holds one request in memory, and network requests must fit
/// in a peer's request body limit.
pub const MAX_REQUEST_SIZE: u64 = 16 * 1024 * 1024;

/// Reasons a plan is refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    /// The plan has no tests.
    #[error("plan contains no tests")]
    NoTests,

    /// `nodes` was given but empty.
    #[error("node subset is empty")]
    EmptyNodeSubset,

    /// `nodes` names a node outside the cluster.
    #[error("unknown node: {0}")]
    UnknownNode(NodeId),

    /// A test's parameters are unusable.
    #[error("test #{index} ({name}): {reason}")]
    InvalidTest {
        /// Position in the plan.
        index: usize,
        /// Operator label.
        name: String,
        /// What is wrong.
        reason: &'static str,
    },
}

/// Validate `options` against the cluster membership.
///
/// Returns the sorted, de-duplicated set of target nodes: the `nodes`
/// subset when given, otherwise every member.
pub fn validate(options: &StartOptions, members: &[NodeId]) -> Result<Vec<NodeId>, PlanError> {
    if options.tests.is_empty() {
        return Err(PlanError::NoTests);
    }

    for (index, spec) in options.tests.iter().enumerate() {
        if let Some(reason) = check_test(spec) {
            return Err(PlanError::InvalidTest {
                index,
                name: spec.name().to_string(),
                reason,
            });
        }
    }

    let known: BTreeSet<NodeId> = members.iter().copied().collect();
    match &options.nodes {
        None => Ok(known.into_iter().collect()),
        Some(subset) if subset.is_empty() => Err(PlanError::EmptyNodeSubset),
        Some(subset) => {
            let mut targets = BTreeSet::new();
            for node in subset {
                if !known.contains(node) {
                    return Err(PlanError::UnknownNode(*node));
                }
                targets.insert(*node);
            }
            Ok(targets.into_iter().collect())
        }
    }
}

fn check_test(spec: &TestSpec) -> Option<&'static str> {
    match spec {
        TestSpec::Disk(d) => {
            if d.request_size == 0 {
                Some("request_size must be greater than zero")
            } else if d.request_size > MAX_REQUEST_SIZE {
                Some("request_size must be at most 16 MiB")
            } else if d.parallelism == 0 {
                Some("parallelism must be greater than zero")
            } else if d.skip_read && d.skip_write {
                Some("skip_read and skip_write leave nothing to measure")
            } else if d.data_size < d.request_size {
                Some("data_size must be at least request_size")
            } else {
                None
            }
        }
        TestSpec::Network(n) => {
            if n.request_size == 0 {
                Some("request_size must be greater than zero")
            } else if n.request_size > MAX_REQUEST_SIZE {
                Some("request_size must be at most 16 MiB")
            } else if n.parallelism == 0 {
                Some("parallelism must be greater than zero")
            } else {
                None
            }
        }
    }
}
