//! Binding generator
//!
//! Pure functions mapping a twin and its resolved broker infrastructure to the
//! RabbitMQ bindings that route its events. No I/O happens here; identical
//! inputs always produce identical bindings, including their names, so a
//! create that races another reconcile collides on the name instead of
//! duplicating the edge.

use crate::config::TopologyConfig;
use crate::ownership::{labels, owner_references};
use crds::labels::{TWIN_INSTANCE_LABEL, TWIN_INTERFACE_LABEL};
use crds::{
    Binding, BindingSpec, Exchange, Queue, RabbitmqClusterReference, Trigger, TwinInstance,
    TwinInterface,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};
use kube::ResourceExt;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Events emitted by a twin's virtual (computed) side
pub const VIRTUAL_EVENT_PREFIX: &str = "ktwin.virtual";
/// Commands addressed to a twin
pub const COMMAND_EVENT_PREFIX: &str = "ktwin.command";
/// Events persisted by the event store
pub const STORE_EVENT_PREFIX: &str = "ktwin.store";
/// Events published by real devices
pub const REAL_EVENT_PREFIX: &str = "ktwin.real";

/// Namespace for content-addressed binding names
const BINDING_NAME_NAMESPACE: Uuid = Uuid::from_u128(0x6b74_7769_6e2d_4269_6e64_696e_6700_0001);

/// Longest object name Kubernetes accepts
const MAX_NAME_LEN: usize = 253;

/// `<prefix>.<interface>`
pub fn routing_key(prefix: &str, interface: &str) -> String {
    format!("{}.{}", prefix, interface)
}

/// `<twin>-<uuid v5 over exchange/queue/routing key>`
pub fn binding_name(twin: &str, exchange: &str, queue: &str, routing_key: &str) -> String {
    let id = Uuid::new_v5(
        &BINDING_NAME_NAMESPACE,
        format!("{}/{}/{}", exchange, queue, routing_key).as_bytes(),
    );
    let id = id.simple().to_string();
    let budget = MAX_NAME_LEN - id.len() - 1;
    let prefix: String = twin.chars().take(budget).collect();
    format!("{}-{}", prefix.trim_end_matches(['-', '.']), id)
}

/// Bindings routing an interface's virtual events and commands from the
/// broker exchange into the interface's trigger queue
pub fn relationship_bindings(
    interface: &TwinInterface,
    trigger: &Trigger,
    exchange: &Exchange,
    queue: &Queue,
) -> Vec<Binding> {
    let name = interface.name_any();
    let trigger_name = trigger.name_any();
    [VIRTUAL_EVENT_PREFIX, COMMAND_EVENT_PREFIX]
        .iter()
        .map(|prefix| {
            let key = routing_key(prefix, &name);
            broker_binding(interface, exchange, queue, &trigger_name, key)
        })
        .collect()
}

/// Binding routing an interface's store events from the broker exchange into
/// the event store's queue
pub fn event_store_bindings(
    interface: &TwinInterface,
    exchange: &Exchange,
    queue: &Queue,
    event_store_trigger: &str,
) -> Vec<Binding> {
    let key = routing_key(STORE_EVENT_PREFIX, &interface.name_any());
    vec![broker_binding(interface, exchange, queue, event_store_trigger, key)]
}

/// Binding routing a real device's MQTT messages into the dispatcher queue
pub fn dispatcher_bindings(instance: &TwinInstance, topology: &TopologyConfig) -> Vec<Binding> {
    let name = instance.name_any();
    let interface = &instance.spec.interface;
    let key = format!("{}.{}", routing_key(REAL_EVENT_PREFIX, interface), name);

    let spec = BindingSpec {
        vhost: topology.rabbitmq_vhost.clone(),
        source: topology.dispatcher_exchange.clone(),
        destination: topology.dispatcher_queue.clone(),
        destination_type: "queue".to_string(),
        routing_key: key,
        arguments: None,
        rabbitmq_cluster_reference: RabbitmqClusterReference {
            name: topology.rabbitmq_cluster.clone(),
            ..Default::default()
        },
    };
    let labels = labels(&[(TWIN_INTERFACE_LABEL, interface.as_str()), (TWIN_INSTANCE_LABEL, name.as_str())]);

    vec![binding(&name, instance.namespace(), labels, owner_references(instance), spec)]
}

/// Exchange-to-queue binding on the broker's headers exchange
///
/// The Knative RabbitMQ broker routes on message headers, so the binding
/// matches the trigger it feeds and the CloudEvent type.
fn broker_binding(
    interface: &TwinInterface,
    exchange: &Exchange,
    queue: &Queue,
    trigger: &str,
    key: String,
) -> Binding {
    let name = interface.name_any();
    let arguments = serde_json::json!({
        "x-match": "all",
        "x-knative-trigger": trigger,
        "type": key,
    });

    let spec = BindingSpec {
        vhost: exchange.spec.vhost.clone(),
        source: exchange.spec.name.clone(),
        destination: queue.spec.name.clone(),
        destination_type: "queue".to_string(),
        routing_key: key,
        arguments: Some(arguments),
        rabbitmq_cluster_reference: exchange.spec.rabbitmq_cluster_reference.clone(),
    };
    let labels = labels(&[(TWIN_INTERFACE_LABEL, name.as_str())]);

    binding(&name, interface.namespace(), labels, owner_references(interface), spec)
}

fn binding(
    twin: &str,
    namespace: Option<String>,
    labels: BTreeMap<String, String>,
    owner_references: Option<Vec<OwnerReference>>,
    spec: BindingSpec,
) -> Binding {
    let name = binding_name(twin, &spec.source, &spec.destination, &spec.routing_key);
    Binding {
        metadata: ObjectMeta {
            name: Some(name),
            namespace,
            labels: Some(labels),
            owner_references,
            ..Default::default()
        },
        spec,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{
        broker_exchange, compute_service, event_store_queue, interface_queue, twin_instance,
        twin_interface, NAMESPACE,
    };
    use crate::trigger::interface_trigger;

    fn fixtures() -> (TwinInterface, Trigger, Exchange, Queue) {
        let interface = twin_interface("temperature-sensor", Some(compute_service()));
        let trigger = interface_trigger(&interface, "ktwin");
        (
            interface,
            trigger,
            broker_exchange("ktwin-broker-exchange"),
            interface_queue("temperature-sensor"),
        )
    }

    #[test]
    fn test_relationship_bindings() {
        let (interface, trigger, exchange, queue) = fixtures();
        let bindings = relationship_bindings(&interface, &trigger, &exchange, &queue);

        let keys: Vec<&str> = bindings.iter().map(|b| b.spec.routing_key.as_str()).collect();
        assert_eq!(
            keys,
            vec![
                "ktwin.virtual.temperature-sensor",
                "ktwin.command.temperature-sensor"
            ]
        );

        for binding in &bindings {
            assert_eq!(binding.namespace().as_deref(), Some(NAMESPACE));
            assert_eq!(binding.spec.source, "ktwin-broker-exchange");
            assert_eq!(binding.spec.destination, "t.ktwin.temperature-sensor");
            assert_eq!(binding.spec.destination_type, "queue");
            assert_eq!(binding.spec.rabbitmq_cluster_reference.name, "rabbitmq");
            assert_eq!(
                binding.labels().get(TWIN_INTERFACE_LABEL).map(String::as_str),
                Some("temperature-sensor")
            );
            let owners = binding.owner_references();
            assert_eq!(owners.len(), 1);
            assert_eq!(owners[0].kind, "TwinInterface");

            let args = binding.spec.arguments.as_ref().unwrap();
            assert_eq!(args["x-match"], "all");
            assert_eq!(args["x-knative-trigger"], "temperature-sensor");
            assert_eq!(args["type"], binding.spec.routing_key.as_str());
        }
        assert_ne!(bindings[0].name_any(), bindings[1].name_any());
    }

    #[test]
    fn test_event_store_binding() {
        let (interface, _, exchange, _) = fixtures();
        let bindings = event_store_bindings(&interface, &exchange, &event_store_queue(), "event-store-trigger");

        assert_eq!(bindings.len(), 1);
        let binding = &bindings[0];
        assert_eq!(binding.spec.routing_key, "ktwin.store.temperature-sensor");
        assert_eq!(binding.spec.destination, "t.ktwin.event-store-trigger");
        assert_eq!(
            binding.spec.arguments.as_ref().unwrap()["x-knative-trigger"],
            "event-store-trigger"
        );
    }

    #[test]
    fn test_dispatcher_binding() {
        let instance = twin_instance("sensor-001", "temperature-sensor");
        let bindings = dispatcher_bindings(&instance, &TopologyConfig::default());

        assert_eq!(bindings.len(), 1);
        let binding = &bindings[0];
        assert_eq!(binding.spec.source, "amq.topic");
        assert_eq!(binding.spec.destination, "ktwin-mqtt-dispatcher");
        assert_eq!(binding.spec.routing_key, "ktwin.real.temperature-sensor.sensor-001");
        assert_eq!(binding.spec.vhost, "/");
        assert!(binding.spec.arguments.is_none());
        assert_eq!(
            binding.labels().get(TWIN_INSTANCE_LABEL).map(String::as_str),
            Some("sensor-001")
        );
        assert_eq!(binding.owner_references()[0].kind, "TwinInstance");
        assert!(binding.name_any().starts_with("sensor-001-"));
    }

    #[test]
    fn test_generation_is_deterministic() {
        let (interface, trigger, exchange, queue) = fixtures();

        let first = serde_json::to_vec(&relationship_bindings(&interface, &trigger, &exchange, &queue)).unwrap();
        let second = serde_json::to_vec(&relationship_bindings(&interface, &trigger, &exchange, &queue)).unwrap();
        assert_eq!(first, second);

        let instance = twin_instance("sensor-001", "temperature-sensor");
        let topology = TopologyConfig::default();
        assert_eq!(
            serde_json::to_vec(&dispatcher_bindings(&instance, &topology)).unwrap(),
            serde_json::to_vec(&dispatcher_bindings(&instance, &topology)).unwrap()
        );
    }

    #[test]
    fn test_binding_name_is_content_addressed() {
        let a = binding_name("sensor", "exchange", "queue", "ktwin.virtual.sensor");
        let b = binding_name("sensor", "exchange", "queue", "ktwin.virtual.sensor");
        let c = binding_name("sensor", "exchange", "queue", "ktwin.command.sensor");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.starts_with("sensor-"));
        assert_eq!(a.len(), "sensor-".len() + 32);
    }

    #[test]
    fn test_binding_name_fits_object_name_limit() {
        let long = "s".repeat(400);
        let name = binding_name(&long, "exchange", "queue", "key");
        assert_eq!(name.len(), MAX_NAME_LEN);
    }
}
