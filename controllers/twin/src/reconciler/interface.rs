//! TwinInterface reconciler
//!
//! An interface without a compute service is a pure type declaration and is
//! `Running` as soon as it is observed. An interface with one is materialized
//! into a Knative Service, a Trigger named after it and the broker bindings
//! routing its events. Independent steps never short-circuit each other:
//! every failure is recorded, dependent bindings are skipped, and the phase
//! is decided once at the end of the pass.

use super::Reconciler;
use crate::bindings::{event_store_bindings, relationship_bindings};
use crate::error::ControllerError;
use crate::outcome::{ReconcileOutcome, Step};
use crate::ownership::{has_labels, labels};
use crate::service::knative_service;
use crate::topology::TopologyResolver;
use crate::trigger::interface_trigger;
use crds::labels::TWIN_INTERFACE_LABEL;
use crds::{TwinInterface, TwinInterfaceStatus, TwinPhase, TwinServiceSpec};
use kube::ResourceExt;
use tracing::{debug, error, info};

impl Reconciler {
    /// Reconcile the TwinInterface `namespace/name`
    ///
    /// A deleted interface is a no-op; its artifacts are garbage collected
    /// through their owner references. On failure the first step error is
    /// returned after the `Failed` status has been written.
    pub async fn reconcile_twin_interface(&self, namespace: &str, name: &str) -> Result<(), ControllerError> {
        info!("Reconciling TwinInterface {}/{}", namespace, name);

        let interface = match self.client.get_twin_interface(namespace, name).await {
            Ok(interface) => interface,
            Err(e) if e.is_not_found() => {
                debug!("TwinInterface {}/{} no longer exists, nothing to do", namespace, name);
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        let mut outcome = ReconcileOutcome::new();
        match &interface.spec.service {
            Some(service) => self.materialize_interface(&interface, service, &mut outcome).await,
            None => debug!(
                "TwinInterface {}/{} declares no compute service, nothing to create",
                namespace, name
            ),
        }

        self.finish_twin_interface(&interface, outcome).await
    }

    async fn materialize_interface(
        &self,
        interface: &TwinInterface,
        service: &TwinServiceSpec,
        outcome: &mut ReconcileOutcome,
    ) {
        let namespace = interface.namespace().unwrap_or_default();
        let name = interface.name_any();
        let target = format!("{}/{}", namespace, name);

        let ksvc = knative_service(interface, service);
        let result = self.client.create_knative_service(&ksvc).await;
        outcome.record_create(Step::ComputeService, &target, result);

        let trigger = interface_trigger(interface, &self.topology.broker);
        let result = self.client.create_trigger(&trigger).await;
        outcome.record_create(Step::Trigger, &target, result);

        // Read back what the API server holds, not what was submitted
        let trigger = outcome.record(
            Step::TriggerLookup,
            self.client.get_trigger(&namespace, &trigger.name_any()).await,
        );

        let resolver = TopologyResolver::new(&*self.client, &namespace, &self.topology);
        let exchange = outcome.record(Step::BrokerExchange, resolver.broker_exchange().await);
        let queue = outcome.record(Step::InterfaceQueue, resolver.interface_queue(&name).await);
        let store_queue = outcome.record(Step::EventStoreQueue, resolver.event_store_queue().await);

        match (&trigger, &exchange, &queue) {
            (Some(trigger), Some(exchange), Some(queue)) => {
                let bindings = relationship_bindings(interface, trigger, exchange, queue);
                self.create_bindings(Step::RelationshipBinding, bindings, outcome).await;
            }
            _ => debug!("Skipping relationship bindings for {}: dependencies unresolved", target),
        }

        match (&exchange, &store_queue) {
            (Some(exchange), Some(store_queue)) => {
                let bindings = event_store_bindings(
                    interface,
                    exchange,
                    store_queue,
                    &self.topology.event_store_trigger,
                );
                self.create_bindings(Step::EventStoreBinding, bindings, outcome).await;
            }
            _ => debug!("Skipping event store bindings for {}: dependencies unresolved", target),
        }
    }

    async fn finish_twin_interface(
        &self,
        interface: &TwinInterface,
        outcome: ReconcileOutcome,
    ) -> Result<(), ControllerError> {
        let phase = outcome.phase();
        if !outcome.is_success() {
            let steps: Vec<String> = outcome.failures().iter().map(|f| f.step.to_string()).collect();
            error!(
                "TwinInterface {}/{} failed steps: {}",
                interface.namespace().unwrap_or_default(),
                interface.name_any(),
                steps.join(", ")
            );
        }

        let labelled = if outcome.is_success() {
            self.ensure_interface_labels(interface).await
        } else {
            Ok(())
        };
        let written = self.write_interface_status(interface, phase).await;

        outcome.into_result().and(labelled).and(written)
    }

    async fn ensure_interface_labels(&self, interface: &TwinInterface) -> Result<(), ControllerError> {
        let namespace = interface.namespace().unwrap_or_default();
        let name = interface.name_any();
        let wanted = labels(&[(TWIN_INTERFACE_LABEL, name.as_str())]);

        if has_labels(interface.labels(), &wanted) {
            debug!("TwinInterface {}/{} already labelled", namespace, name);
            return Ok(());
        }

        self.client
            .patch_twin_interface_labels(&namespace, &name, &wanted)
            .await
            .map_err(|e| {
                error!("Failed to label TwinInterface {}/{}: {}", namespace, name, e);
                ControllerError::from(e)
            })?;
        info!("Labelled TwinInterface {}/{}", namespace, name);
        Ok(())
    }

    async fn write_interface_status(&self, interface: &TwinInterface, phase: TwinPhase) -> Result<(), ControllerError> {
        let namespace = interface.namespace().unwrap_or_default();
        let name = interface.name_any();

        if interface.status.as_ref().map(|s| s.status) == Some(phase) {
            debug!("TwinInterface {}/{} status unchanged ({})", namespace, name, phase);
            return Ok(());
        }

        let status = TwinInterfaceStatus { status: phase };
        self.client
            .patch_twin_interface_status(&namespace, &name, &status)
            .await
            .map_err(|e| {
                error!("Failed to update TwinInterface {}/{} status: {}", namespace, name, e);
                ControllerError::from(e)
            })?;
        info!("TwinInterface {}/{} is {}", namespace, name, phase);
        Ok(())
    }
}
