//! Unit tests for the TwinInterface reconciler

#[cfg(test)]
mod tests {
    use crate::bindings::event_store_bindings;
    use crate::error::ControllerError;
    use crate::test_utils::*;
    use crate::trigger::interface_trigger;
    use crds::labels::TWIN_INTERFACE_LABEL;
    use crds::{Binding, TwinPhase};
    use kube::ResourceExt;
    use topology_client::{LabelSelector, MockResourceClient, ResourceClient};

    const SENSOR: &str = "temperature-sensor";

    fn routing_keys(mock: &MockResourceClient) -> Vec<String> {
        let mut keys: Vec<String> = mock
            .bindings(NAMESPACE)
            .into_iter()
            .map(|b| b.spec.routing_key)
            .collect();
        keys.sort();
        keys
    }

    /// Bindings labelled with the interface, read through the client trait
    async fn owned_bindings(mock: &MockResourceClient) -> Vec<Binding> {
        let selector = LabelSelector::new().with(TWIN_INTERFACE_LABEL, SENSOR);
        mock.list_bindings(NAMESPACE, &selector).await.unwrap()
    }

    #[tokio::test]
    async fn test_all_infrastructure_present() {
        let mock = MockResourceClient::new();
        mock.add_twin_interface(twin_interface(SENSOR, Some(compute_service())));
        provision_infrastructure(&mock, SENSOR);
        let reconciler = reconciler(&mock);

        reconciler.reconcile_twin_interface(NAMESPACE, SENSOR).await.unwrap();

        assert_eq!(mock.triggers(NAMESPACE).len(), 1);
        assert_eq!(mock.knative_services(NAMESPACE).len(), 1);
        assert_eq!(
            routing_keys(&mock),
            vec![
                "ktwin.command.temperature-sensor",
                "ktwin.store.temperature-sensor",
                "ktwin.virtual.temperature-sensor",
            ]
        );

        let stored = mock.twin_interface(NAMESPACE, SENSOR).unwrap();
        assert_eq!(stored.phase(), TwinPhase::Running);
        assert_eq!(
            stored.labels().get(TWIN_INTERFACE_LABEL).map(String::as_str),
            Some(SENSOR)
        );
    }

    #[tokio::test]
    async fn test_reconcile_is_idempotent() {
        let mock = MockResourceClient::new();
        mock.add_twin_interface(twin_interface(SENSOR, Some(compute_service())));
        provision_infrastructure(&mock, SENSOR);
        let reconciler = reconciler(&mock);

        reconciler.reconcile_twin_interface(NAMESPACE, SENSOR).await.unwrap();
        let first_status = mock.twin_interface(NAMESPACE, SENSOR).unwrap().status;
        let first_bindings = owned_bindings(&mock).await.len();
        assert_eq!(first_bindings, 3);

        reconciler.reconcile_twin_interface(NAMESPACE, SENSOR).await.unwrap();
        let second_status = mock.twin_interface(NAMESPACE, SENSOR).unwrap().status;

        assert_eq!(first_status, second_status);
        assert_eq!(owned_bindings(&mock).await.len(), first_bindings);
        assert_eq!(mock.triggers(NAMESPACE).len(), 1);
        // Unchanged status and labels are not rewritten
        assert_eq!(mock.call_count("patch_status TwinInterface"), 1);
        assert_eq!(mock.call_count("patch TwinInterface"), 1);
    }

    #[tokio::test]
    async fn test_interface_without_service() {
        let mock = MockResourceClient::new();
        mock.add_twin_interface(twin_interface(SENSOR, None));
        let reconciler = reconciler(&mock);

        reconciler.reconcile_twin_interface(NAMESPACE, SENSOR).await.unwrap();

        assert!(mock.triggers(NAMESPACE).is_empty());
        assert!(mock.knative_services(NAMESPACE).is_empty());
        assert!(mock.bindings(NAMESPACE).is_empty());
        assert_eq!(mock.call_count("list"), 0, "no dependency resolution expected");
        assert_eq!(
            mock.twin_interface(NAMESPACE, SENSOR).unwrap().phase(),
            TwinPhase::Running
        );
    }

    #[tokio::test]
    async fn test_missing_exchange_fails_without_relationship_bindings() {
        let mock = MockResourceClient::new();
        mock.add_twin_interface(twin_interface(SENSOR, Some(compute_service())));
        mock.add_queue(interface_queue(SENSOR));
        mock.add_queue(event_store_queue());
        let reconciler = reconciler(&mock);

        let err = reconciler
            .reconcile_twin_interface(NAMESPACE, SENSOR)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ControllerError::DependencyUnresolved { ref kind, .. } if kind == "Exchange"
        ));

        assert!(mock.bindings(NAMESPACE).is_empty());
        assert_eq!(mock.triggers(NAMESPACE).len(), 1);
        assert_eq!(mock.knative_services(NAMESPACE).len(), 1);

        let stored = mock.twin_interface(NAMESPACE, SENSOR).unwrap();
        assert_eq!(stored.phase(), TwinPhase::Failed);
        assert!(stored.labels().get(TWIN_INTERFACE_LABEL).is_none());
    }

    #[tokio::test]
    async fn test_missing_event_store_queue_keeps_relationship_bindings() {
        let mock = MockResourceClient::new();
        mock.add_twin_interface(twin_interface(SENSOR, Some(compute_service())));
        mock.add_exchange(broker_exchange("ktwin-broker-exchange"));
        mock.add_queue(interface_queue(SENSOR));
        let reconciler = reconciler(&mock);

        let err = reconciler
            .reconcile_twin_interface(NAMESPACE, SENSOR)
            .await
            .unwrap_err();
        assert!(matches!(err, ControllerError::DependencyUnresolved { .. }));

        assert_eq!(
            routing_keys(&mock),
            vec![
                "ktwin.command.temperature-sensor",
                "ktwin.virtual.temperature-sensor",
            ]
        );
        assert_eq!(
            mock.twin_interface(NAMESPACE, SENSOR).unwrap().phase(),
            TwinPhase::Failed
        );
    }

    #[tokio::test]
    async fn test_recovers_once_infrastructure_appears() {
        let mock = MockResourceClient::new();
        mock.add_twin_interface(twin_interface(SENSOR, Some(compute_service())));
        let reconciler = reconciler(&mock);

        assert!(reconciler.reconcile_twin_interface(NAMESPACE, SENSOR).await.is_err());
        assert_eq!(
            mock.twin_interface(NAMESPACE, SENSOR).unwrap().phase(),
            TwinPhase::Failed
        );

        provision_infrastructure(&mock, SENSOR);
        reconciler.reconcile_twin_interface(NAMESPACE, SENSOR).await.unwrap();

        assert_eq!(mock.bindings(NAMESPACE).len(), 3);
        assert_eq!(
            mock.twin_interface(NAMESPACE, SENSOR).unwrap().phase(),
            TwinPhase::Running
        );
    }

    #[tokio::test]
    async fn test_existing_artifacts_are_success() {
        let mock = MockResourceClient::new();
        mock.add_twin_interface(twin_interface(SENSOR, Some(compute_service())));
        provision_infrastructure(&mock, SENSOR);
        let reconciler = reconciler(&mock);
        reconciler.reconcile_twin_interface(NAMESPACE, SENSOR).await.unwrap();

        // A restarted controller sees everything already present
        let fresh = crate::test_utils::reconciler(&mock);
        fresh.reconcile_twin_interface(NAMESPACE, SENSOR).await.unwrap();
        assert_eq!(mock.bindings(NAMESPACE).len(), 3);
    }

    #[tokio::test]
    async fn test_preexisting_trigger_and_binding_are_kept() {
        let mock = MockResourceClient::new();
        let interface = twin_interface(SENSOR, Some(compute_service()));
        mock.add_twin_interface(interface.clone());
        provision_infrastructure(&mock, SENSOR);

        // Left behind by an earlier controller run
        let existing_trigger = interface_trigger(&interface, "ktwin");
        let existing_binding = event_store_bindings(
            &interface,
            &broker_exchange("ktwin-broker-exchange"),
            &event_store_queue(),
            "event-store-trigger",
        )
        .remove(0);
        mock.add_trigger(existing_trigger);
        mock.add_binding(existing_binding.clone());
        let reconciler = reconciler(&mock);

        reconciler.reconcile_twin_interface(NAMESPACE, SENSOR).await.unwrap();

        assert_eq!(mock.triggers(NAMESPACE).len(), 1);
        let bindings = owned_bindings(&mock).await;
        assert_eq!(bindings.len(), 3);
        assert_eq!(
            bindings
                .iter()
                .filter(|b| b.name_any() == existing_binding.name_any())
                .count(),
            1
        );
        assert_eq!(
            mock.twin_interface(NAMESPACE, SENSOR).unwrap().phase(),
            TwinPhase::Running
        );
    }

    #[tokio::test]
    async fn test_independent_failures_accumulate() {
        let mock = MockResourceClient::new();
        mock.add_twin_interface(twin_interface(SENSOR, Some(compute_service())));
        provision_infrastructure(&mock, SENSOR);
        mock.inject_failure("create", "Service", "admission webhook denied");
        let reconciler = reconciler(&mock);

        let err = reconciler
            .reconcile_twin_interface(NAMESPACE, SENSOR)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("admission webhook denied"));

        // Later steps still ran
        assert_eq!(mock.triggers(NAMESPACE).len(), 1);
        assert_eq!(mock.bindings(NAMESPACE).len(), 3);
        assert_eq!(
            mock.twin_interface(NAMESPACE, SENSOR).unwrap().phase(),
            TwinPhase::Failed
        );
    }

    #[tokio::test]
    async fn test_trigger_lookup_failure_skips_relationship_bindings() {
        let mock = MockResourceClient::new();
        mock.add_twin_interface(twin_interface(SENSOR, Some(compute_service())));
        provision_infrastructure(&mock, SENSOR);
        mock.inject_failure("get", "Trigger", "etcd timeout");
        let reconciler = reconciler(&mock);

        assert!(reconciler.reconcile_twin_interface(NAMESPACE, SENSOR).await.is_err());
        assert_eq!(routing_keys(&mock), vec!["ktwin.store.temperature-sensor"]);
    }

    #[tokio::test]
    async fn test_deleted_interface_is_noop() {
        let mock = MockResourceClient::new();
        let reconciler = reconciler(&mock);

        reconciler.reconcile_twin_interface(NAMESPACE, SENSOR).await.unwrap();
        assert_eq!(mock.calls(), vec![format!("get TwinInterface {}/{}", NAMESPACE, SENSOR)]);
    }

    #[tokio::test]
    async fn test_status_write_failure_is_returned() {
        let mock = MockResourceClient::new();
        mock.add_twin_interface(twin_interface(SENSOR, None));
        mock.inject_failure("patch_status", "TwinInterface", "conflict");
        let reconciler = reconciler(&mock);

        let err = reconciler
            .reconcile_twin_interface(NAMESPACE, SENSOR)
            .await
            .unwrap_err();
        assert!(matches!(err, ControllerError::Resource(_)));
    }
}
