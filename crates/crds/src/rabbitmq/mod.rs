//! RabbitMQ messaging-topology-operator resources (rabbitmq.com/v1beta1)
//!
//! Exchanges and queues are provisioned by the Knative RabbitMQ broker and
//! trigger reconcilers and are only discovered here. Bindings are created by
//! the operator.

pub mod binding;
pub mod exchange;
pub mod queue;

pub use binding::*;
pub use exchange::*;
pub use queue::*;

use serde::{Deserialize, Serialize};

/// Reference to the `RabbitmqCluster` a topology object lives in
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct RabbitmqClusterReference {
    /// Cluster name
    #[serde(default)]
    pub name: String,

    /// Cluster namespace (defaults to the object's namespace)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    /// Connection secret, used instead of `name` for external clusters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_secret: Option<ConnectionSecret>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionSecret {
    pub name: String,
}

pub(crate) fn default_vhost() -> String {
    "/".to_string()
}
