//! RabbitMQ `Binding`

use super::{default_vhost, RabbitmqClusterReference};
use kube::CustomResource;
use serde::{Deserialize, Serialize};

/// Directed edge from an exchange to a queue
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[kube(
    group = "rabbitmq.com",
    version = "v1beta1",
    kind = "Binding",
    namespaced,
    schema = "disabled"
)]
#[serde(rename_all = "camelCase")]
pub struct BindingSpec {
    #[serde(default = "default_vhost")]
    pub vhost: String,

    /// Source exchange name
    pub source: String,

    /// Destination queue or exchange name
    pub destination: String,

    /// "queue" or "exchange"
    pub destination_type: String,

    #[serde(default)]
    pub routing_key: String,

    /// Binding arguments (header matches for headers exchanges)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<serde_json::Value>,

    pub rabbitmq_cluster_reference: RabbitmqClusterReference,
}
