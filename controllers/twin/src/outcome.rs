//! Per-pass accumulation of step failures.
//!
//! Independent creation steps of a reconcile pass never short-circuit each
//! other. Each step reports into a `ReconcileOutcome`; at the end of the pass
//! the outcome decides the phase and which error goes back to the controller.

use crate::error::ControllerError;
use crds::TwinPhase;
use std::fmt;
use topology_client::ResourceError;
use tracing::{debug, error, info};

/// A unit of work inside a reconcile pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    ComputeService,
    EventStoreService,
    Trigger,
    TriggerLookup,
    BrokerExchange,
    InterfaceQueue,
    EventStoreQueue,
    RelationshipBinding,
    EventStoreBinding,
    DispatcherBinding,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Step::ComputeService => "knative service",
            Step::EventStoreService => "event store service",
            Step::Trigger => "trigger",
            Step::TriggerLookup => "trigger lookup",
            Step::BrokerExchange => "broker exchange",
            Step::InterfaceQueue => "interface queue",
            Step::EventStoreQueue => "event store queue",
            Step::RelationshipBinding => "relationship binding",
            Step::EventStoreBinding => "event store binding",
            Step::DispatcherBinding => "dispatcher binding",
        };
        f.write_str(s)
    }
}

/// A failed step and its cause
#[derive(Debug)]
pub struct StepFailure {
    pub step: Step,
    pub error: ControllerError,
}

/// Ordered list of step failures for one reconcile pass
#[derive(Debug, Default)]
pub struct ReconcileOutcome {
    failures: Vec<StepFailure>,
}

impl ReconcileOutcome {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep the value of a successful step, or record its failure
    pub fn record<T, E>(&mut self, step: Step, result: Result<T, E>) -> Option<T>
    where
        E: Into<ControllerError>,
    {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                self.fail(step, e.into());
                None
            }
        }
    }

    /// Record a create call; an object that already exists counts as success
    ///
    /// Returns true when the object exists afterwards.
    pub fn record_create<T>(&mut self, step: Step, target: &str, result: Result<T, ResourceError>) -> bool {
        match result {
            Ok(_) => {
                info!("Created {} {}", step, target);
                true
            }
            Err(e) if e.is_already_exists() => {
                debug!("{} {} already exists", step, target);
                true
            }
            Err(e) => {
                self.fail(step, e.into());
                false
            }
        }
    }

    /// Record a failure
    pub fn fail(&mut self, step: Step, error: ControllerError) {
        error!("{} failed: {}", step, error);
        self.failures.push(StepFailure { step, error });
    }

    pub fn failures(&self) -> &[StepFailure] {
        &self.failures
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// `Failed` if any step failed, `Running` otherwise
    pub fn phase(&self) -> TwinPhase {
        if self.is_success() {
            TwinPhase::Running
        } else {
            TwinPhase::Failed
        }
    }

    /// The first recorded error, if any
    pub fn into_result(self) -> Result<(), ControllerError> {
        match self.failures.into_iter().next() {
            Some(failure) => Err(failure.error),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn not_found() -> ResourceError {
        ResourceError::NotFound {
            kind: "Trigger".to_string(),
            namespace: "ktwin".to_string(),
            name: "sensor".to_string(),
        }
    }

    fn already_exists() -> ResourceError {
        ResourceError::AlreadyExists {
            kind: "Binding".to_string(),
            namespace: "ktwin".to_string(),
            name: "sensor-1".to_string(),
        }
    }

    #[test]
    fn test_empty_outcome_is_running() {
        let outcome = ReconcileOutcome::new();
        assert!(outcome.is_success());
        assert_eq!(outcome.phase(), TwinPhase::Running);
        assert!(outcome.into_result().is_ok());
    }

    #[test]
    fn test_already_exists_is_not_accumulated() {
        let mut outcome = ReconcileOutcome::new();
        let created: Result<(), _> = Err(already_exists());
        assert!(outcome.record_create(Step::RelationshipBinding, "ktwin/sensor-1", created));
        assert!(outcome.is_success());
    }

    #[test]
    fn test_failures_keep_order_and_first_is_returned() {
        let mut outcome = ReconcileOutcome::new();

        let exchange: Option<()> = outcome.record(
            Step::BrokerExchange,
            Err(ControllerError::DependencyUnresolved {
                kind: "Exchange".to_string(),
                namespace: "ktwin".to_string(),
                selector: "eventing.knative.dev/broker=ktwin".to_string(),
            }),
        );
        assert!(exchange.is_none());

        let lookup: Option<()> = outcome.record(Step::TriggerLookup, Err(not_found()));
        assert!(lookup.is_none());

        let queue = outcome.record::<_, ControllerError>(Step::InterfaceQueue, Ok(7));
        assert_eq!(queue, Some(7));

        assert_eq!(outcome.phase(), TwinPhase::Failed);
        let steps: Vec<Step> = outcome.failures().iter().map(|f| f.step).collect();
        assert_eq!(steps, vec![Step::BrokerExchange, Step::TriggerLookup]);

        let err = outcome.into_result().unwrap_err();
        assert!(matches!(err, ControllerError::DependencyUnresolved { .. }));
    }
}
