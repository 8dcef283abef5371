//! Test utilities for unit testing reconcilers
//!
//! This module provides helpers for creating test data and setting up test scenarios.

use crate::config::TopologyConfig;
use crate::reconciler::Reconciler;
use crds::labels::{BROKER_LABEL, TRIGGER_LABEL};
use crds::*;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use topology_client::MockResourceClient;

/// Namespace every fixture lives in
pub const NAMESPACE: &str = "ktwin";

fn meta(name: &str, labels: &[(&str, &str)]) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.to_string()),
        namespace: Some(NAMESPACE.to_string()),
        uid: Some(format!("uid-{}", name)),
        labels: (!labels.is_empty()).then(|| {
            labels
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect()
        }),
        ..Default::default()
    }
}

fn cluster() -> RabbitmqClusterReference {
    RabbitmqClusterReference {
        name: "rabbitmq".to_string(),
        ..Default::default()
    }
}

/// Helper to create a compute service declaration
pub fn compute_service() -> TwinServiceSpec {
    TwinServiceSpec {
        image: "ghcr.io/ktwin/temperature-sensor:0.1".to_string(),
        ..Default::default()
    }
}

/// Helper to create a TwinInterface as the API server would return it
pub fn twin_interface(name: &str, service: Option<TwinServiceSpec>) -> TwinInterface {
    TwinInterface {
        metadata: meta(name, &[]),
        spec: TwinInterfaceSpec { service },
        status: None,
    }
}

/// Helper to create a TwinInstance of `interface`
pub fn twin_instance(name: &str, interface: &str) -> TwinInstance {
    TwinInstance {
        metadata: meta(name, &[]),
        spec: TwinInstanceSpec {
            interface: interface.to_string(),
        },
        status: None,
    }
}

/// Helper to create an EventStore with every field left to its default
pub fn event_store(name: &str) -> EventStore {
    EventStore {
        metadata: meta(name, &[]),
        spec: EventStoreSpec::default(),
        status: None,
    }
}

/// Helper to create the broker's headers exchange
pub fn broker_exchange(name: &str) -> Exchange {
    Exchange {
        metadata: meta(name, &[(BROKER_LABEL, "ktwin")]),
        spec: ExchangeSpec {
            name: name.to_string(),
            vhost: "/".to_string(),
            exchange_type: Some("headers".to_string()),
            durable: true,
            auto_delete: false,
            rabbitmq_cluster_reference: cluster(),
        },
    }
}

fn trigger_queue(name: &str, labels: &[(&str, &str)]) -> Queue {
    Queue {
        metadata: meta(name, labels),
        spec: QueueSpec {
            name: name.to_string(),
            vhost: "/".to_string(),
            queue_type: Some("quorum".to_string()),
            durable: true,
            auto_delete: false,
            rabbitmq_cluster_reference: cluster(),
        },
    }
}

/// Helper to create the queue Knative provisions for an interface's trigger
pub fn interface_queue(interface: &str) -> Queue {
    trigger_queue(
        &format!("t.ktwin.{}", interface),
        &[(BROKER_LABEL, "ktwin"), (TRIGGER_LABEL, interface)],
    )
}

/// Helper to create the event store's queue
pub fn event_store_queue() -> Queue {
    trigger_queue(
        "t.ktwin.event-store-trigger",
        &[(BROKER_LABEL, "ktwin"), (TRIGGER_LABEL, "event-store-trigger")],
    )
}

/// Add the broker exchange, the interface queue and the event store queue
pub fn provision_infrastructure(mock: &MockResourceClient, interface: &str) {
    mock.add_exchange(broker_exchange("ktwin-broker-exchange"));
    mock.add_queue(interface_queue(interface));
    mock.add_queue(event_store_queue());
}

/// Helper to create a reconciler backed by `mock`
pub fn reconciler(mock: &MockResourceClient) -> Reconciler {
    Reconciler::new(mock.clone(), TopologyConfig::default(), 5, 300)
}
