//! EventStore CRD
//!
//! The event store persists every `ktwin.store.*` event routed to it by the
//! broker. The operator runs it as a Knative Service; the queue and trigger
//! feeding it are provisioned by the Knative RabbitMQ broker.

use crate::phase::TwinPhase;
use crate::twin_interface::TwinAutoscaling;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// EventStoreSpec defines the desired state of an event store deployment
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
#[kube(
    group = "core.ktwin",
    version = "v0",
    kind = "EventStore",
    namespaced,
    status = "EventStoreStatus",
    shortname = "es",
    printcolumn = r#"{"name":"Status","type":"string","jsonPath":".status.status"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct EventStoreSpec {
    /// Container image, defaults to the published event store image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// Image pull policy, defaults to IfNotPresent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_pull_policy: Option<String>,

    /// Backing database connection
    #[serde(default)]
    pub database: EventStoreDatabase,

    /// Knative autoscaling bounds; unset fields take the event store defaults
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autoscaling: Option<TwinAutoscaling>,
}

/// Database the event store writes to
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EventStoreDatabase {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyspace: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EventStoreStatus {
    /// Lifecycle phase
    #[serde(default)]
    pub status: TwinPhase,
}

impl EventStore {
    /// Current phase, `Pending` when no status has been written yet
    pub fn phase(&self) -> TwinPhase {
        self.status.as_ref().map(|s| s.status).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_spec_deserializes() {
        let spec: EventStoreSpec = serde_json::from_str("{}").unwrap();
        assert!(spec.image.is_none());
        assert_eq!(spec.database, EventStoreDatabase::default());
    }

    #[test]
    fn test_database_wire_format() {
        let spec: EventStoreSpec = serde_json::from_value(serde_json::json!({
            "database": { "host": "scylla.example", "keyspace": "plant" }
        }))
        .unwrap();
        assert_eq!(spec.database.host.as_deref(), Some("scylla.example"));
        assert_eq!(spec.database.keyspace.as_deref(), Some("plant"));
        assert!(spec.database.password.is_none());
    }
}
