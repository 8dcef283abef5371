//! Reconciliation logic for the twin CRDs.
//!
//! - `interface`: TwinInterface, materialized into a Knative Service, a
//!   Trigger and the broker bindings routing its events
//! - `instance`: TwinInstance, wired into the MQTT dispatcher
//! - `event_store`: EventStore, run as a Knative Service

pub mod event_store;
pub mod instance;
pub mod interface;

#[cfg(test)]
mod interface_test;

use crate::backoff::FibonacciBackoff;
use crate::config::TopologyConfig;
use crate::outcome::{ReconcileOutcome, Step};
use crds::Binding;
use kube::ResourceExt;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use topology_client::ResourceClient;
use tracing::debug;

/// Backoff state for a resource
#[derive(Debug, Clone)]
struct BackoffState {
    backoff: FibonacciBackoff,
    error_count: u32,
}

impl BackoffState {
    fn new(min_seconds: u64, max_seconds: u64) -> Self {
        Self {
            backoff: FibonacciBackoff::new(min_seconds, max_seconds),
            error_count: 0,
        }
    }

    fn increment_error(&mut self) {
        self.error_count += 1;
    }

    fn reset(&mut self) {
        self.error_count = 0;
        self.backoff.reset();
    }
}

/// Reconciles twin resources.
pub struct Reconciler {
    pub(crate) client: Box<dyn ResourceClient>,
    pub(crate) topology: TopologyConfig,
    backoff_min_seconds: u64,
    backoff_max_seconds: u64,
    /// Error count tracking per resource (kind/namespace/name -> BackoffState)
    backoff_states: Arc<Mutex<HashMap<String, BackoffState>>>,
}

impl Reconciler {
    /// Creates a new reconciler instance.
    pub fn new(
        client: impl ResourceClient + 'static,
        topology: TopologyConfig,
        backoff_min_seconds: u64,
        backoff_max_seconds: u64,
    ) -> Self {
        Self {
            client: Box::new(client),
            topology,
            backoff_min_seconds,
            backoff_max_seconds,
            backoff_states: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Next retry delay for a failing resource
    pub fn next_backoff(&self, key: &str) -> Duration {
        let mut states = self
            .backoff_states
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let state = states
            .entry(key.to_string())
            .or_insert_with(|| BackoffState::new(self.backoff_min_seconds, self.backoff_max_seconds));
        state.increment_error();
        let delay = state.backoff.next_backoff();
        debug!("{} failed {} time(s) in a row, retrying in {:?}", key, state.error_count, delay);
        delay
    }

    /// Forget the failure history of a resource after a successful reconcile
    pub fn reset_backoff(&self, key: &str) {
        let mut states = self
            .backoff_states
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(state) = states.get_mut(key) {
            if state.error_count > 0 {
                debug!("{} recovered after {} error(s), backoff reset", key, state.error_count);
                state.reset();
            }
        }
    }

    /// Create each binding, treating an existing one as success
    pub(crate) async fn create_bindings(&self, step: Step, bindings: Vec<Binding>, outcome: &mut ReconcileOutcome) {
        for binding in bindings {
            let target = format!(
                "{}/{} ({})",
                binding.namespace().unwrap_or_default(),
                binding.name_any(),
                binding.spec.routing_key
            );
            let result = self.client.create_binding(&binding).await;
            outcome.record_create(step, &target, result);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::reconciler;
    use topology_client::MockResourceClient;

    #[test]
    fn test_backoff_per_key_and_reset() {
        let reconciler = reconciler(&MockResourceClient::new());

        assert_eq!(reconciler.next_backoff("TwinInterface/ktwin/a"), Duration::from_secs(5));
        assert_eq!(reconciler.next_backoff("TwinInterface/ktwin/a"), Duration::from_secs(5));
        assert_eq!(reconciler.next_backoff("TwinInterface/ktwin/a"), Duration::from_secs(10));
        // Other keys are independent
        assert_eq!(reconciler.next_backoff("TwinInterface/ktwin/b"), Duration::from_secs(5));

        reconciler.reset_backoff("TwinInterface/ktwin/a");
        assert_eq!(reconciler.next_backoff("TwinInterface/ktwin/a"), Duration::from_secs(5));
    }
}
