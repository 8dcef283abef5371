//! EventStore reconciler
//!
//! Runs the event store as a Knative Service owned by the EventStore. The
//! trigger and queue feeding it belong to the broker, so the only artifact
//! created here is the service.

use super::Reconciler;
use crate::error::ControllerError;
use crate::outcome::{ReconcileOutcome, Step};
use crate::service::event_store_service;
use crds::{EventStore, EventStoreStatus, TwinPhase};
use kube::ResourceExt;
use tracing::{debug, error, info};

impl Reconciler {
    /// Reconcile the EventStore `namespace/name`
    pub async fn reconcile_event_store(&self, namespace: &str, name: &str) -> Result<(), ControllerError> {
        info!("Reconciling EventStore {}/{}", namespace, name);

        let event_store = match self.client.get_event_store(namespace, name).await {
            Ok(event_store) => event_store,
            Err(e) if e.is_not_found() => {
                debug!("EventStore {}/{} no longer exists, nothing to do", namespace, name);
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        let mut outcome = ReconcileOutcome::new();
        let ksvc = event_store_service(&event_store);
        let result = self.client.create_knative_service(&ksvc).await;
        outcome.record_create(Step::EventStoreService, &format!("{}/{}", namespace, name), result);

        let written = self.write_event_store_status(&event_store, outcome.phase()).await;
        outcome.into_result().and(written)
    }

    async fn write_event_store_status(&self, event_store: &EventStore, phase: TwinPhase) -> Result<(), ControllerError> {
        let namespace = event_store.namespace().unwrap_or_default();
        let name = event_store.name_any();

        if event_store.status.as_ref().map(|s| s.status) == Some(phase) {
            debug!("EventStore {}/{} status unchanged ({})", namespace, name, phase);
            return Ok(());
        }

        let status = EventStoreStatus { status: phase };
        self.client
            .patch_event_store_status(&namespace, &name, &status)
            .await
            .map_err(|e| {
                error!("Failed to update EventStore {}/{} status: {}", namespace, name, e);
                ControllerError::from(e)
            })?;
        info!("EventStore {}/{} is {}", namespace, name, phase);
        Ok(())
    }
}
