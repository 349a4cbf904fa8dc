//! Clean-run scenarios.

#[cfg(test)]
mod tests {
    use crate::assertions::assert_clean_run;
    use crate::harness::LocalCluster;
    use crate::scenarios::{disk, network, plan};
    use check_types::{NodeId, NodeStatus};
    use std::time::Duration;

    /// Every node runs the whole plan and reports it in order.
    #[tokio::test]
    async fn full_plan_settles_on_every_node() {
        let cluster = LocalCluster::new(3).unwrap();

        let summary = cluster
            .coordinator()
            .start(plan(vec![disk(200), network(200), disk(100)], None))
            .await
            .unwrap();
        assert_eq!(summary.dispatched.len(), 3);

        let view = cluster.wait_for_settled(Duration::from_secs(10)).await.unwrap();
        assert_clean_run(&view, 3).assert_passed();

        for node in &view {
            let results = node.results.as_ref().unwrap();
            assert!(results[0].duration() >= 200);
            assert!(results[1].duration() >= 200);
            assert!(results[2].duration() >= 100);
        }
    }

    /// Status while idle returns the same reports until the next start.
    #[tokio::test]
    async fn idle_status_is_stable() {
        let cluster = LocalCluster::new(2).unwrap();
        cluster
            .coordinator()
            .start(plan(vec![disk(100)], None))
            .await
            .unwrap();

        let first = cluster.wait_for_settled(Duration::from_secs(10)).await.unwrap();
        let second = cluster.coordinator().status().await;
        let third = cluster.coordinator().status().await;

        assert_eq!(first, second);
        assert_eq!(second, third);
    }

    /// Only the targeted subset runs; other nodes keep their prior state.
    #[tokio::test]
    async fn subset_run_leaves_other_nodes_alone() {
        let cluster = LocalCluster::new(3).unwrap();

        // Give node 2 some prior results.
        cluster
            .coordinator()
            .start(plan(vec![disk(50)], Some(&[2])))
            .await
            .unwrap();
        let before = cluster.wait_for_settled(Duration::from_secs(10)).await.unwrap();
        let node2_before = before[2].results.clone();
        assert!(node2_before.is_some());

        let summary = cluster
            .coordinator()
            .start(plan(vec![disk(100), network(100)], Some(&[1])))
            .await
            .unwrap();
        assert_eq!(summary.dispatched, vec![NodeId::new(1)]);

        let view = cluster.coordinator().status().await;
        assert_eq!(view[0].status, NodeStatus::Idle);
        assert_eq!(view[1].status, NodeStatus::Running);
        assert_eq!(view[2].status, NodeStatus::Idle);

        let view = cluster.wait_for_settled(Duration::from_secs(10)).await.unwrap();
        assert!(view[0].results.is_none());
        assert_eq!(view[2].results, node2_before);

        // A lone node has no peers for the network test.
        let node1 = view[1].results.as_ref().unwrap();
        assert_eq!(node1.len(), 2);
        assert!(node1[0].is_success());
        assert_eq!(
            node1[1].warning(),
            Some("Network test skipped: no peers available")
        );
    }

    /// The operator API serializes the view in the documented shape.
    #[tokio::test]
    async fn status_wire_shape() {
        let cluster = LocalCluster::new(2).unwrap();
        cluster
            .coordinator()
            .start(plan(vec![disk(50)], Some(&[0])))
            .await
            .unwrap();
        let view = cluster.wait_for_settled(Duration::from_secs(10)).await.unwrap();

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json[0]["node_id"], 0);
        assert_eq!(json[0]["status"], "idle");
        assert!(json[0]["results"][0]["duration"].as_u64().unwrap() >= 50);
        assert!(json[0]["results"][0].get("error").is_none());
        assert!(json[0]["results"][0].get("warning").is_none());
        assert_eq!(json[1], serde_json::json!({ "node_id": 1, "status": "idle" }));
    }
}
