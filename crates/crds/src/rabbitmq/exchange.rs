//! RabbitMQ `Exchange`

use super::{default_vhost, RabbitmqClusterReference};
use kube::CustomResource;
use serde::{Deserialize, Serialize};

#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[kube(
    group = "rabbitmq.com",
    version = "v1beta1",
    kind = "Exchange",
    namespaced,
    schema = "disabled"
)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeSpec {
    /// Exchange name inside RabbitMQ
    pub name: String,

    #[serde(default = "default_vhost")]
    pub vhost: String,

    /// direct, fanout, headers or topic
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub exchange_type: Option<String>,

    #[serde(default)]
    pub durable: bool,

    #[serde(default)]
    pub auto_delete: bool,

    pub rabbitmq_cluster_reference: RabbitmqClusterReference,
}
