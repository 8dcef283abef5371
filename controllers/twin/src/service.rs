//! Knative Services generated from an interface's compute service
//! declaration and from an EventStore

use crate::ownership::{labels, owner_references};
use crds::labels::{EVENT_STORE_LABEL, TWIN_INTERFACE_LABEL};
use crds::{
    EventStore, KnativeService, KnativeServiceSpec, RevisionSpec, RevisionTemplateSpec,
    TwinAutoscaling, TwinInterface, TwinServiceSpec,
};
use k8s_openapi::api::core::v1::{Container, EnvVar};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::ResourceExt;
use std::collections::BTreeMap;

const AUTOSCALING_TARGET: &str = "autoscaling.knative.dev/target";
const AUTOSCALING_MIN_SCALE: &str = "autoscaling.knative.dev/min-scale";
const AUTOSCALING_MAX_SCALE: &str = "autoscaling.knative.dev/max-scale";

const EVENT_STORE_CONTAINER: &str = "ktwin-event-store";
const EVENT_STORE_IMAGE: &str = "dev.local/ktwin/event-store:0.1";
const EVENT_STORE_DB_HOST: &str = "scylla-client.scylla.svc.cluster.local";
const EVENT_STORE_DB_KEYSPACE: &str = "ktwin";

/// Knative Service named after the interface
pub fn knative_service(interface: &TwinInterface, service: &TwinServiceSpec) -> KnativeService {
    let name = interface.name_any();
    let labels = labels(&[(TWIN_INTERFACE_LABEL, name.as_str())]);

    let container = Container {
        name: name.clone(),
        image: Some(service.image.clone()),
        image_pull_policy: service.image_pull_policy.clone(),
        env: (!service.env.is_empty()).then(|| {
            service
                .env
                .iter()
                .map(|var| EnvVar {
                    name: var.name.clone(),
                    value: Some(var.value.clone()),
                    ..Default::default()
                })
                .collect()
        }),
        ..Default::default()
    };

    let annotations = service
        .autoscaling
        .as_ref()
        .map(autoscaling_annotations)
        .unwrap_or_default();

    KnativeService {
        metadata: ObjectMeta {
            name: Some(name),
            namespace: interface.namespace(),
            labels: Some(labels.clone()),
            owner_references: owner_references(interface),
            ..Default::default()
        },
        spec: KnativeServiceSpec {
            template: RevisionTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(labels),
                    annotations: (!annotations.is_empty()).then_some(annotations),
                    ..Default::default()
                }),
                spec: RevisionSpec {
                    containers: vec![container],
                },
            },
        },
        status: None,
    }
}

/// Knative Service running the event store, named after the EventStore
///
/// Unset image, database and autoscaling fields fall back to the event store
/// defaults. The revision is pinned to `<name>-v1`.
pub fn event_store_service(event_store: &EventStore) -> KnativeService {
    let name = event_store.name_any();
    let spec = &event_store.spec;
    let labels = labels(&[(EVENT_STORE_LABEL, name.as_str())]);

    let database = &spec.database;
    let env = [
        ("DB_HOST", database.host.as_deref().unwrap_or(EVENT_STORE_DB_HOST)),
        ("DB_PASSWORD", database.password.as_deref().unwrap_or_default()),
        ("DB_KEYSPACE", database.keyspace.as_deref().unwrap_or(EVENT_STORE_DB_KEYSPACE)),
    ]
    .into_iter()
    .map(|(key, value)| EnvVar {
        name: key.to_string(),
        value: Some(value.to_string()),
        ..Default::default()
    })
    .collect();

    let container = Container {
        name: EVENT_STORE_CONTAINER.to_string(),
        image: Some(spec.image.clone().unwrap_or_else(|| EVENT_STORE_IMAGE.to_string())),
        image_pull_policy: Some(
            spec.image_pull_policy
                .clone()
                .unwrap_or_else(|| "IfNotPresent".to_string()),
        ),
        env: Some(env),
        ..Default::default()
    };

    let requested = spec.autoscaling.clone().unwrap_or_default();
    let autoscaling = TwinAutoscaling {
        target: requested.target.or(Some(2)),
        min_scale: requested.min_scale.or(Some(1)),
        max_scale: requested.max_scale.or(Some(10)),
    };

    KnativeService {
        metadata: ObjectMeta {
            name: Some(name.clone()),
            namespace: event_store.namespace(),
            labels: Some(labels),
            owner_references: owner_references(event_store),
            ..Default::default()
        },
        spec: KnativeServiceSpec {
            template: RevisionTemplateSpec {
                metadata: Some(ObjectMeta {
                    name: Some(format!("{}-v1", name)),
                    annotations: Some(autoscaling_annotations(&autoscaling)),
                    ..Default::default()
                }),
                spec: RevisionSpec {
                    containers: vec![container],
                },
            },
        },
        status: None,
    }
}

fn autoscaling_annotations(autoscaling: &TwinAutoscaling) -> BTreeMap<String, String> {
    let bounds = [
        (AUTOSCALING_TARGET, autoscaling.target),
        (AUTOSCALING_MIN_SCALE, autoscaling.min_scale),
        (AUTOSCALING_MAX_SCALE, autoscaling.max_scale),
    ];
    bounds
        .into_iter()
        .filter_map(|(key, value)| value.map(|v| (key.to_string(), v.to_string())))
        .collect()
}
