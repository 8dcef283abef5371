//! Knative Trigger feeding an interface's compute service

use crate::bindings::{routing_key, REAL_EVENT_PREFIX};
use crate::ownership::{labels, owner_references};
use crds::labels::TWIN_INTERFACE_LABEL;
use crds::{Destination, KReference, Trigger, TriggerFilter, TriggerSpec, TwinInterface};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::ResourceExt;
use std::collections::BTreeMap;

/// Trigger named after the interface, delivering its real events to the
/// interface's Knative Service
pub fn interface_trigger(interface: &TwinInterface, broker: &str) -> Trigger {
    let name = interface.name_any();
    let namespace = interface.namespace();

    let mut attributes = BTreeMap::new();
    attributes.insert("type".to_string(), routing_key(REAL_EVENT_PREFIX, &name));

    Trigger {
        metadata: ObjectMeta {
            name: Some(name.clone()),
            namespace: namespace.clone(),
            labels: Some(labels(&[(TWIN_INTERFACE_LABEL, name.as_str())])),
            owner_references: owner_references(interface),
            ..Default::default()
        },
        spec: TriggerSpec {
            broker: broker.to_string(),
            filter: Some(TriggerFilter { attributes }),
            subscriber: Destination {
                reference: Some(KReference {
                    api_version: "serving.knative.dev/v1".to_string(),
                    kind: "Service".to_string(),
                    name,
                    namespace,
                }),
                uri: None,
            },
        },
        status: None,
    }
}
