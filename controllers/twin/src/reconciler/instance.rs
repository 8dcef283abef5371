//! TwinInstance reconciler
//!
//! Wires an instance into the MQTT dispatcher. The parent interface must exist:
//! without it the pass stops before any work and leaves the status alone.
//! Its phase is not consulted.

use super::Reconciler;
use crate::bindings::dispatcher_bindings;
use crate::error::ControllerError;
use crate::outcome::{ReconcileOutcome, Step};
use crate::ownership::{has_labels, labels};
use crds::labels::{TWIN_INSTANCE_LABEL, TWIN_INTERFACE_LABEL};
use crds::{TwinInstance, TwinInstanceStatus, TwinPhase};
use kube::ResourceExt;
use tracing::{debug, error, info};

impl Reconciler {
    /// Reconcile the TwinInstance `namespace/name`
    pub async fn reconcile_twin_instance(&self, namespace: &str, name: &str) -> Result<(), ControllerError> {
        info!("Reconciling TwinInstance {}/{}", namespace, name);

        let instance = match self.client.get_twin_instance(namespace, name).await {
            Ok(instance) => instance,
            Err(e) if e.is_not_found() => {
                debug!("TwinInstance {}/{} no longer exists, nothing to do", namespace, name);
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        let parent = &instance.spec.interface;
        let interface = match self.client.get_twin_interface(namespace, parent).await {
            Ok(interface) => interface,
            Err(e) if e.is_not_found() => {
                error!("TwinInstance {}/{} references missing TwinInterface {}", namespace, name, parent);
                return Err(ControllerError::ParentInterfaceNotFound {
                    namespace: namespace.to_string(),
                    name: parent.clone(),
                });
            }
            Err(e) => {
                error!("Failed to get TwinInterface {}/{}: {}", namespace, parent, e);
                return Err(e.into());
            }
        };

        let mut outcome = ReconcileOutcome::new();
        let bindings = dispatcher_bindings(&instance, &self.topology);
        self.create_bindings(Step::DispatcherBinding, bindings, &mut outcome).await;

        let phase = outcome.phase();
        let labelled = if outcome.is_success() {
            self.ensure_instance_labels(&instance, &interface.name_any()).await
        } else {
            Ok(())
        };
        let written = self.write_instance_status(&instance, phase).await;

        outcome.into_result().and(labelled).and(written)
    }

    async fn ensure_instance_labels(&self, instance: &TwinInstance, interface: &str) -> Result<(), ControllerError> {
        let namespace = instance.namespace().unwrap_or_default();
        let name = instance.name_any();
        let wanted = labels(&[
            (TWIN_INTERFACE_LABEL, interface),
            (TWIN_INSTANCE_LABEL, name.as_str()),
        ]);

        if has_labels(instance.labels(), &wanted) {
            debug!("TwinInstance {}/{} already labelled", namespace, name);
            return Ok(());
        }

        self.client
            .patch_twin_instance_labels(&namespace, &name, &wanted)
            .await
            .map_err(|e| {
                error!("Failed to label TwinInstance {}/{}: {}", namespace, name, e);
                ControllerError::from(e)
            })?;
        info!("Labelled TwinInstance {}/{}", namespace, name);
        Ok(())
    }

    async fn write_instance_status(&self, instance: &TwinInstance, phase: TwinPhase) -> Result<(), ControllerError> {
        let namespace = instance.namespace().unwrap_or_default();
        let name = instance.name_any();

        if instance.status.as_ref().map(|s| s.status) == Some(phase) {
            debug!("TwinInstance {}/{} status unchanged ({})", namespace, name, phase);
            return Ok(());
        }

        let status = TwinInstanceStatus { status: phase };
        self.client
            .patch_twin_instance_status(&namespace, &name, &status)
            .await
            .map_err(|e| {
                error!("Failed to update TwinInstance {}/{} status: {}", namespace, name, e);
                ControllerError::from(e)
            })?;
        info!("TwinInstance {}/{} is {}", namespace, name, phase);
        Ok(())
    }
}
