//! Topology resolver
//!
//! Looks up the shared broker infrastructure an interface binds into. Exchanges
//! and queues are provisioned by the Knative RabbitMQ broker, its trigger
//! reconciler and the event store; they are only ever discovered by label.

use crate::config::TopologyConfig;
use crate::error::ControllerError;
use crds::labels::{BROKER_LABEL, TRIGGER_LABEL};
use crds::{Exchange, Queue};
use kube::{Resource, ResourceExt};
use topology_client::{LabelSelector, ResourceClient};
use tracing::debug;

/// Label-keyed lookups of broker infrastructure in one namespace
pub struct TopologyResolver<'a> {
    client: &'a dyn ResourceClient,
    namespace: &'a str,
    topology: &'a TopologyConfig,
}

impl<'a> TopologyResolver<'a> {
    pub fn new(client: &'a dyn ResourceClient, namespace: &'a str, topology: &'a TopologyConfig) -> Self {
        Self {
            client,
            namespace,
            topology,
        }
    }

    /// The broker's default exchange
    pub async fn broker_exchange(&self) -> Result<Exchange, ControllerError> {
        let selector = LabelSelector::new().with(BROKER_LABEL, &self.topology.broker);
        let exchanges = self.client.list_exchanges(self.namespace, &selector).await?;
        first_match(exchanges, self.namespace, &selector)
    }

    /// The queue Knative provisioned for the trigger named after `interface`
    pub async fn interface_queue(&self, interface: &str) -> Result<Queue, ControllerError> {
        let selector = LabelSelector::new()
            .with(BROKER_LABEL, &self.topology.broker)
            .with(TRIGGER_LABEL, interface);
        let queues = self.client.list_queues(self.namespace, &selector).await?;
        first_match(queues, self.namespace, &selector)
    }

    /// The event store's queue
    pub async fn event_store_queue(&self) -> Result<Queue, ControllerError> {
        let selector = LabelSelector::new().with(TRIGGER_LABEL, &self.topology.event_store_trigger);
        let queues = self.client.list_queues(self.namespace, &selector).await?;
        first_match(queues, self.namespace, &selector)
    }
}

/// Lowest-named match, so repeated lookups agree when several objects match
fn first_match<K>(items: Vec<K>, namespace: &str, selector: &LabelSelector) -> Result<K, ControllerError>
where
    K: Resource<DynamicType = ()>,
{
    let kind = K::kind(&()).into_owned();
    match items.into_iter().min_by_key(|item| item.name_any()) {
        Some(found) => {
            debug!("Resolved {} {}/{} for {}", kind, namespace, found.name_any(), selector);
            Ok(found)
        }
        None => Err(ControllerError::DependencyUnresolved {
            kind,
            namespace: namespace.to_string(),
            selector: selector.to_string(),
        }),
    }
}
