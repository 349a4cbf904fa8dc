//! Assertion helpers for cluster scenarios.
//!
//! These are pure functions over the operator's cluster view. They take
//! state as input and return pass/fail with details.

use check_types::{NodeId, NodeReport, NodeStatus};

/// Result of an assertion check.
#[derive(Debug, Clone)]
pub struct AssertionResult {
    /// Whether the assertion passed
    pub passed: bool,
    /// Description of what was checked
    pub description: String,
    /// Details on failure
    pub failure_details: Option<String>,
}

impl AssertionResult {
    /// Create a passing result.
    pub fn pass(description: &str) -> Self {
        Self {
            passed: true,
            description: description.into(),
            failure_details: None,
        }
    }

    /// Create a failing result.
    pub fn fail(description: &str, details: &str) -> Self {
        Self {
            passed: false,
            description: description.into(),
            failure_details: Some(details.into()),
        }
    }

    /// Panic with the failure details unless the check passed.
    #[track_caller]
    pub fn assert_passed(self) {
        assert!(
            self.passed,
            "{}: {}",
            self.description,
            self.failure_details.unwrap_or_default()
        );
    }
}

/// Assert that every reachable node finished `tests` tests cleanly.
///
/// Each idle node must hold exactly `tests` reports, each with a positive
/// duration and neither error nor warning.
pub fn assert_clean_run(view: &[NodeReport], tests: usize) -> AssertionResult {
    for node in view.iter().filter(|n| n.status != NodeStatus::Unreachable) {
        let Some(results) = &node.results else {
            return AssertionResult::fail(
                "Clean run",
                &format!("node {} has no results ({:?})", node.node_id, node.status),
            );
        };
        if results.len() != tests {
            return AssertionResult::fail(
                "Clean run",
                &format!(
                    "node {} has {} reports, expected {}",
                    node.node_id,
                    results.len(),
                    tests
                ),
            );
        }
        if let Some((i, report)) = results
            .iter()
            .enumerate()
            .find(|(_, r)| !r.is_success() || r.duration() == 0)
        {
            return AssertionResult::fail(
                "Clean run",
                &format!("node {} test #{i} did not succeed: {report:?}", node.node_id),
            );
        }
    }

    AssertionResult::pass(&format!("All reachable nodes ran {tests} tests cleanly"))
}

/// Assert that every error reported anywhere names exactly `peer`.
pub fn assert_errors_name_peer(view: &[NodeReport], peer: NodeId) -> AssertionResult {
    let expected = format!("Failed to reach peer with node_id: {peer}");

    for node in view {
        for report in node.results.iter().flatten() {
            if let Some(error) = report.error() {
                if error != expected {
                    return AssertionResult::fail(
                        "Errors name the crashed peer",
                        &format!("node {} reported {error:?}", node.node_id),
                    );
                }
            }
        }
    }

    AssertionResult::pass(&format!("Every error names node {peer}"))
}

/// Assert that every report carries a warning and none carries an error.
pub fn assert_all_cancelled(view: &[NodeReport]) -> AssertionResult {
    for node in view.iter().filter(|n| n.status != NodeStatus::Unreachable) {
        for (i, report) in node.results.iter().flatten().enumerate() {
            if report.warning().is_none() || report.error().is_some() {
                return AssertionResult::fail(
                    "All tests cancelled",
                    &format!("node {} test #{i}: {report:?}", node.node_id),
                );
            }
        }
    }

    AssertionResult::pass("Every report carries a warning and no error")
}

/// Assert that `node` is unreachable and carries no results.
pub fn assert_unreachable(view: &[NodeReport], node: NodeId) -> AssertionResult {
    match view.iter().find(|n| n.node_id == node) {
        Some(entry) if entry.status == NodeStatus::Unreachable && entry.results.is_none() => {
            AssertionResult::pass(&format!("Node {node} is unreachable without results"))
        }
        Some(entry) => AssertionResult::fail(
            "Unreachable node",
            &format!("node {node} is {:?} with results {:?}", entry.status, entry.results),
        ),
        None => AssertionResult::fail("Unreachable node", &format!("node {node} missing from view")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use check_types::Report;

    fn idle(id: u32, results: Vec<Report>) -> NodeReport {
        NodeReport {
            node_id: NodeId::new(id),
            status: NodeStatus::Idle,
            results: Some(results),
        }
    }

    fn unreachable(id: u32) -> NodeReport {
        NodeReport {
            node_id: NodeId::new(id),
            status: NodeStatus::Unreachable,
            results: None,
        }
    }

    #[test]
    fn clean_run_checks_count_and_outcome() {
        let view = vec![
            idle(0, vec![Report::success(10), Report::success(12)]),
            unreachable(1),
        ];
        assert!(assert_clean_run(&view, 2).passed);
        assert!(!assert_clean_run(&view, 3).passed);

        let view = vec![idle(0, vec![Report::success(10), Report::failed(3, "io")])];
        assert!(!assert_clean_run(&view, 2).passed);

        let view = vec![idle(0, vec![Report::success(0)])];
        assert!(!assert_clean_run(&view, 1).passed);
    }

    #[test]
    fn errors_must_name_the_peer() {
        let view = vec![idle(
            0,
            vec![Report::failed(5, "Failed to reach peer with node_id: 2")],
        )];
        assert!(assert_errors_name_peer(&view, NodeId::new(2)).passed);
        assert!(!assert_errors_name_peer(&view, NodeId::new(1)).passed);
    }

    #[test]
    fn cancelled_requires_warning_everywhere() {
        let view = vec![idle(0, vec![Report::cancelled(900, "stop"), Report::not_started()])];
        assert!(assert_all_cancelled(&view).passed);

        let view = vec![idle(0, vec![Report::success(900)])];
        assert!(!assert_all_cancelled(&view).passed);
    }

    #[test]
    fn unreachable_node_has_no_results() {
        let view = vec![idle(0, vec![]), unreachable(1)];
        assert!(assert_unreachable(&view, NodeId::new(1)).passed);
        assert!(!assert_unreachable(&view, NodeId::new(0)).passed);
        assert!(!assert_unreachable(&view, NodeId::new(9)).passed);
    }
}
