//! Failure scenarios: crashed and slow nodes.

#[cfg(test)]
mod tests {
    use crate::assertions::{assert_errors_name_peer, assert_unreachable};
    use crate::harness::LocalCluster;
    use crate::scenarios::{disk, network, plan};
    use check_types::{NodeId, NodeStatus};
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    /// A node crashing mid-run fails its peers' network tests with an
    /// error naming it, and shows up unreachable without results.
    #[tokio::test]
    async fn crash_mid_run() {
        let cluster = LocalCluster::new(3).unwrap();
        cluster
            .coordinator()
            .start(plan(vec![disk(200), network(3_000), disk(200)], None))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(500)).await;
        cluster.crash(2);

        let view = cluster.wait_for_settled(Duration::from_secs(15)).await.unwrap();
        assert_unreachable(&view, NodeId::new(2)).assert_passed();
        assert_errors_name_peer(&view, NodeId::new(2)).assert_passed();

        for id in [0, 1] {
            let node = &view[id];
            assert_eq!(node.status, NodeStatus::Idle);
            let results = node.results.as_ref().unwrap();
            assert_eq!(results.len(), 3);
            assert!(results[0].is_success());
            assert_eq!(
                results[1].error(),
                Some("Failed to reach peer with node_id: 2")
            );
            assert!(results[1].warning().is_none());
            // One failed probe does not abort the rest of the plan.
            assert!(results[2].is_success());
        }
    }

    /// A crashed node goes quiet: its own network test fails and its peers
    /// stop receiving traffic from it.
    #[tokio::test]
    async fn crashed_node_stops_sending() {
        let cluster = LocalCluster::new(2).unwrap();
        cluster
            .coordinator()
            .start(plan(vec![network(5_000)], None))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(200)).await;
        cluster.crash(1);
        cluster.wait_for_settled(Duration::from_secs(10)).await.unwrap();

        let received = &cluster.node(0).runner().metrics().netcheck_requests;
        let before = received.load(Ordering::Relaxed);
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(received.load(Ordering::Relaxed), before);

        cluster.restore(1);
        let view = cluster.wait_for_settled(Duration::from_secs(10)).await.unwrap();
        let results = view[1].results.as_ref().unwrap();
        assert_eq!(
            results[0].error(),
            Some("Failed to reach peer with node_id: 0")
        );
    }

    /// A crashed node is skipped at dispatch; the rest of the cluster runs.
    #[tokio::test]
    async fn dispatch_skips_crashed_node() {
        let cluster = LocalCluster::new(3).unwrap();
        cluster.crash(1);

        let summary = cluster
            .coordinator()
            .start(plan(vec![disk(100)], None))
            .await
            .unwrap();
        assert_eq!(summary.dispatched, vec![NodeId::new(0), NodeId::new(2)]);
        assert_eq!(summary.unreachable, vec![NodeId::new(1)]);

        let view = cluster.wait_for_settled(Duration::from_secs(10)).await.unwrap();
        assert_unreachable(&view, NodeId::new(1)).assert_passed();
        assert!(view[0].results.is_some());
        assert!(view[2].results.is_some());

        // Back from the dead, the node never ran anything.
        cluster.restore(1);
        let view = cluster.coordinator().status().await;
        assert_eq!(view[1].status, NodeStatus::Idle);
        assert!(view[1].results.is_none());
    }

    /// A slow node is unreachable for the call that timed out only.
    #[tokio::test]
    async fn slow_node_is_unreachable_for_one_call() {
        let cluster = LocalCluster::new(3).unwrap();
        cluster
            .transport()
            .set_latency(NodeId::new(2), Duration::from_secs(1));

        let view = cluster.coordinator().status().await;
        assert_unreachable(&view, NodeId::new(2)).assert_passed();
        assert_eq!(view[0].status, NodeStatus::Idle);
        assert_eq!(view[1].status, NodeStatus::Idle);

        cluster.transport().clear_latency(NodeId::new(2));
        let view = cluster.coordinator().status().await;
        assert_eq!(view[2].status, NodeStatus::Idle);
    }

    /// Stop skips unreachable nodes instead of waiting on them.
    #[tokio::test]
    async fn stop_skips_crashed_node() {
        let cluster = LocalCluster::new(3).unwrap();
        cluster
            .coordinator()
            .start(plan(vec![disk(30_000)], None))
            .await
            .unwrap();
        cluster.crash(2);

        let summary = cluster.coordinator().stop().await.unwrap();
        assert_eq!(summary.stopped, vec![NodeId::new(0), NodeId::new(1)]);
        assert_eq!(summary.unreachable, vec![NodeId::new(2)]);

        // The crashed node's runner never saw the stop.
        cluster.restore(2);
        let view = cluster.coordinator().status().await;
        assert_eq!(view[2].status, NodeStatus::Running);
        cluster.coordinator().stop().await.unwrap();
    }
}
