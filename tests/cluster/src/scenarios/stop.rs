//! Stop and busy scenarios.

#[cfg(test)]
mod tests {
    use crate::assertions::{assert_all_cancelled, assert_clean_run};
    use crate::harness::LocalCluster;
    use crate::scenarios::{disk, network, plan};
    use check_node::CoordinatorError;
    use check_types::{NodeStatus, Report, WARNING_CANCELLED_RUNNING};
    use std::time::{Duration, Instant};

    /// A stop one second in returns long before the budgets elapse and
    /// leaves a warning on every report.
    #[tokio::test]
    async fn stop_one_second_in() {
        let cluster = LocalCluster::new(3).unwrap();
        let started = Instant::now();

        cluster
            .coordinator()
            .start(plan(vec![disk(3_000), network(3_000), disk(3_000)], None))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;

        let summary = cluster.coordinator().stop().await.unwrap();
        assert_eq!(summary.stopped.len(), 3);
        assert!(summary.unreachable.is_empty());
        assert!(started.elapsed() < Duration::from_millis(9_000));

        // stop() is synchronous: nothing is running any more.
        let view = cluster.coordinator().status().await;
        assert!(view.iter().all(|n| n.status == NodeStatus::Idle));
        assert_all_cancelled(&view).assert_passed();

        for node in &view {
            let results = node.results.as_ref().unwrap();
            assert_eq!(results.len(), 3);
            assert_eq!(results[0].warning(), Some(WARNING_CANCELLED_RUNNING));
            assert!(results[0].duration() >= 900);
            assert_eq!(results[1], Report::not_started());
            assert_eq!(results[2], Report::not_started());
        }
    }

    /// Stopping an idle cluster is a no-op that succeeds.
    #[tokio::test]
    async fn stop_is_idempotent() {
        let cluster = LocalCluster::new(2).unwrap();

        let first = cluster.coordinator().stop().await.unwrap();
        let second = cluster.coordinator().stop().await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.stopped.len(), 2);

        let view = cluster.coordinator().status().await;
        assert!(view.iter().all(|n| n.results.is_none()));
    }

    /// A start during a run is refused and does not disturb the run.
    #[tokio::test]
    async fn start_while_running_is_rejected() {
        let cluster = LocalCluster::new(2).unwrap();
        cluster
            .coordinator()
            .start(plan(vec![disk(300), disk(300)], None))
            .await
            .unwrap();

        let err = cluster
            .coordinator()
            .start(plan(vec![disk(50); 5], None))
            .await
            .unwrap_err();
        assert!(matches!(err, CoordinatorError::Busy { ref nodes } if nodes.len() == 2));

        // Any node can coordinate; node 1 sees the same run.
        let err = cluster
            .node(1)
            .coordinator()
            .start(plan(vec![disk(50)], None))
            .await
            .unwrap_err();
        assert!(matches!(err, CoordinatorError::Busy { .. }));

        let view = cluster.wait_for_settled(Duration::from_secs(10)).await.unwrap();
        assert_clean_run(&view, 2).assert_passed();
    }
}
