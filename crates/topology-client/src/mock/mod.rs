//! Mock ResourceClient for unit testing
//!
//! This module provides an in-memory implementation of `ResourceClient` that
//! can be used in unit tests without a running API server. It behaves like
//! the API server where the reconcilers can observe it:
//! - creates of an existing name fail with `AlreadyExists`
//! - gets of a missing name fail with `NotFound`
//! - created objects receive a `uid`, and created triggers get a
//!   `status.subscriberUri` the way the Knative trigger reconciler fills it in
//!
//! Failures can be injected per (operation, kind) pair, and every call is
//! recorded so tests can assert which requests were (not) issued.

mod store;

use crate::client_trait::ResourceClient;
use crate::error::ResourceError;
use crate::selector::LabelSelector;
use crds::{
    Binding, EventStore, EventStoreStatus, Exchange, KnativeService, Queue, Trigger, TriggerStatus,
    TwinInstance, TwinInstanceStatus, TwinInterface, TwinInterfaceStatus,
};
use kube::ResourceExt;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use store::NamespacedStore;

/// Mock ResourceClient for testing
///
/// Clones share the same underlying storage, so a test can keep a handle
/// while the reconciler owns another.
#[derive(Clone)]
pub struct MockResourceClient {
    pub(crate) twin_interfaces: Arc<Mutex<NamespacedStore<TwinInterface>>>,
    pub(crate) twin_instances: Arc<Mutex<NamespacedStore<TwinInstance>>>,
    pub(crate) event_stores: Arc<Mutex<NamespacedStore<EventStore>>>,
    pub(crate) knative_services: Arc<Mutex<NamespacedStore<KnativeService>>>,
    pub(crate) triggers: Arc<Mutex<NamespacedStore<Trigger>>>,
    pub(crate) exchanges: Arc<Mutex<NamespacedStore<Exchange>>>,
    pub(crate) queues: Arc<Mutex<NamespacedStore<Queue>>>,
    pub(crate) bindings: Arc<Mutex<NamespacedStore<Binding>>>,
    // (operation, kind) -> error message
    pub(crate) failures: Arc<Mutex<HashMap<(String, String), String>>>,
    pub(crate) calls: Arc<Mutex<Vec<String>>>,
    // Counter for generating UIDs
    pub(crate) uid_counter: Arc<Mutex<u64>>,
}

impl Default for MockResourceClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockResourceClient {
    /// Create a new, empty mock client
    pub fn new() -> Self {
        Self {
            twin_interfaces: Arc::new(Mutex::new(NamespacedStore::new("TwinInterface"))),
            twin_instances: Arc::new(Mutex::new(NamespacedStore::new("TwinInstance"))),
            event_stores: Arc::new(Mutex::new(NamespacedStore::new("EventStore"))),
            knative_services: Arc::new(Mutex::new(NamespacedStore::new("Service"))),
            triggers: Arc::new(Mutex::new(NamespacedStore::new("Trigger"))),
            exchanges: Arc::new(Mutex::new(NamespacedStore::new("Exchange"))),
            queues: Arc::new(Mutex::new(NamespacedStore::new("Queue"))),
            bindings: Arc::new(Mutex::new(NamespacedStore::new("Binding"))),
            failures: Arc::new(Mutex::new(HashMap::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
            uid_counter: Arc::new(Mutex::new(1)),
        }
    }

    /// Add a TwinInterface to the mock store (for test setup)
    pub fn add_twin_interface(&self, interface: TwinInterface) {
        self.twin_interfaces.lock().unwrap().insert(interface);
    }

    /// Add a TwinInstance to the mock store (for test setup)
    pub fn add_twin_instance(&self, instance: TwinInstance) {
        self.twin_instances.lock().unwrap().insert(instance);
    }

    /// Add an EventStore to the mock store (for test setup)
    pub fn add_event_store(&self, event_store: EventStore) {
        self.event_stores.lock().unwrap().insert(event_store);
    }

    /// Add a pre-provisioned Exchange (for test setup)
    pub fn add_exchange(&self, exchange: Exchange) {
        self.exchanges.lock().unwrap().insert(exchange);
    }

    /// Add a pre-provisioned Queue (for test setup)
    pub fn add_queue(&self, queue: Queue) {
        self.queues.lock().unwrap().insert(queue);
    }

    /// Add an existing Trigger (for test setup)
    pub fn add_trigger(&self, trigger: Trigger) {
        self.triggers.lock().unwrap().insert(trigger);
    }

    /// Add an existing Binding (for test setup)
    pub fn add_binding(&self, binding: Binding) {
        self.bindings.lock().unwrap().insert(binding);
    }

    /// Make every `operation` on `kind` fail with `message` until cleared
    ///
    /// Operations: `get`, `list`, `create`, `patch`, `patch_status`.
    /// Kinds: `TwinInterface`, `TwinInstance`, `EventStore`, `Service`, `Trigger`,
    /// `Exchange`, `Queue`, `Binding`.
    pub fn inject_failure(&self, operation: &str, kind: &str, message: &str) {
        self.failures
            .lock()
            .unwrap()
            .insert((operation.to_string(), kind.to_string()), message.to_string());
    }

    /// Remove all injected failures
    pub fn clear_failures(&self) {
        self.failures.lock().unwrap().clear();
    }

    /// Stored TwinInterface, if any
    pub fn twin_interface(&self, namespace: &str, name: &str) -> Option<TwinInterface> {
        self.twin_interfaces.lock().unwrap().get(namespace, name).ok()
    }

    /// Stored TwinInstance, if any
    pub fn twin_instance(&self, namespace: &str, name: &str) -> Option<TwinInstance> {
        self.twin_instances.lock().unwrap().get(namespace, name).ok()
    }

    /// Stored EventStore, if any
    pub fn event_store(&self, namespace: &str, name: &str) -> Option<EventStore> {
        self.event_stores.lock().unwrap().get(namespace, name).ok()
    }

    /// All Knative Services in a namespace
    pub fn knative_services(&self, namespace: &str) -> Vec<KnativeService> {
        self.knative_services.lock().unwrap().all(namespace)
    }

    /// All Triggers in a namespace
    pub fn triggers(&self, namespace: &str) -> Vec<Trigger> {
        self.triggers.lock().unwrap().all(namespace)
    }

    /// All Bindings in a namespace
    pub fn bindings(&self, namespace: &str) -> Vec<Binding> {
        self.bindings.lock().unwrap().all(namespace)
    }

    /// Calls issued so far, formatted as `"<operation> <kind> <namespace>/<name-or-selector>"`
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of recorded calls starting with `prefix` (e.g. `"list Queue"`)
    pub fn call_count(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.starts_with(prefix))
            .count()
    }

    /// Record a call and return the injected failure for it, if any
    pub(crate) fn begin(&self, operation: &str, kind: &str, target: String) -> Result<(), ResourceError> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("{} {} {}", operation, kind, target));

        match self
            .failures
            .lock()
            .unwrap()
            .get(&(operation.to_string(), kind.to_string()))
        {
            Some(message) => Err(ResourceError::Request {
                operation: operation.to_string(),
                kind: kind.to_string(),
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Generate next UID
    pub(crate) fn next_uid(&self) -> String {
        let mut uid = self.uid_counter.lock().unwrap();
        let current = *uid;
        *uid += 1;
        format!("00000000-0000-0000-0000-{:012}", current)
    }
}

fn target(namespace: &str, name: &str) -> String {
    format!("{}/{}", namespace, name)
}

fn merge_labels(existing: &mut Option<BTreeMap<String, String>>, labels: &BTreeMap<String, String>) {
    let merged = existing.get_or_insert_with(BTreeMap::new);
    for (key, value) in labels {
        merged.insert(key.clone(), value.clone());
    }
}

#[async_trait::async_trait]
impl ResourceClient for MockResourceClient {
    async fn get_twin_interface(&self, namespace: &str, name: &str) -> Result<TwinInterface, ResourceError> {
        self.begin("get", "TwinInterface", target(namespace, name))?;
        self.twin_interfaces.lock().unwrap().get(namespace, name)
    }

    async fn get_twin_instance(&self, namespace: &str, name: &str) -> Result<TwinInstance, ResourceError> {
        self.begin("get", "TwinInstance", target(namespace, name))?;
        self.twin_instances.lock().unwrap().get(namespace, name)
    }

    async fn patch_twin_interface_labels(&self, namespace: &str, name: &str, labels: &BTreeMap<String, String>) -> Result<(), ResourceError> {
        self.begin("patch", "TwinInterface", target(namespace, name))?;
        let mut store = self.twin_interfaces.lock().unwrap();
        let interface = store.get_mut(namespace, name)?;
        merge_labels(&mut interface.metadata.labels, labels);
        Ok(())
    }

    async fn patch_twin_interface_status(&self, namespace: &str, name: &str, status: &TwinInterfaceStatus) -> Result<(), ResourceError> {
        self.begin("patch_status", "TwinInterface", target(namespace, name))?;
        let mut store = self.twin_interfaces.lock().unwrap();
        let interface = store.get_mut(namespace, name)?;
        interface.status = Some(status.clone());
        Ok(())
    }

    async fn patch_twin_instance_labels(&self, namespace: &str, name: &str, labels: &BTreeMap<String, String>) -> Result<(), ResourceError> {
        self.begin("patch", "TwinInstance", target(namespace, name))?;
        let mut store = self.twin_instances.lock().unwrap();
        let instance = store.get_mut(namespace, name)?;
        merge_labels(&mut instance.metadata.labels, labels);
        Ok(())
    }

    async fn patch_twin_instance_status(&self, namespace: &str, name: &str, status: &TwinInstanceStatus) -> Result<(), ResourceError> {
        self.begin("patch_status", "TwinInstance", target(namespace, name))?;
        let mut store = self.twin_instances.lock().unwrap();
        let instance = store.get_mut(namespace, name)?;
        instance.status = Some(status.clone());
        Ok(())
    }

    async fn get_event_store(&self, namespace: &str, name: &str) -> Result<EventStore, ResourceError> {
        self.begin("get", "EventStore", target(namespace, name))?;
        self.event_stores.lock().unwrap().get(namespace, name)
    }

    async fn patch_event_store_status(&self, namespace: &str, name: &str, status: &EventStoreStatus) -> Result<(), ResourceError> {
        self.begin("patch_status", "EventStore", target(namespace, name))?;
        let mut store = self.event_stores.lock().unwrap();
        let event_store = store.get_mut(namespace, name)?;
        event_store.status = Some(status.clone());
        Ok(())
    }

    async fn create_knative_service(&self, service: &KnativeService) -> Result<KnativeService, ResourceError> {
        let namespace = service.namespace().unwrap_or_default();
        self.begin("create", "Service", target(&namespace, &service.name_any()))?;
        let uid = self.next_uid();
        self.knative_services.lock().unwrap().create(service.clone(), uid)
    }

    async fn create_trigger(&self, trigger: &Trigger) -> Result<Trigger, ResourceError> {
        let namespace = trigger.namespace().unwrap_or_default();
        let name = trigger.name_any();
        self.begin("create", "Trigger", target(&namespace, &name))?;
        let uid = self.next_uid();
        let mut created = trigger.clone();
        created.status = Some(TriggerStatus {
            subscriber_uri: Some(format!("http://{}.{}.svc.cluster.local", name, namespace)),
            observed_generation: Some(1),
        });
        self.triggers.lock().unwrap().create(created, uid)
    }

    async fn get_trigger(&self, namespace: &str, name: &str) -> Result<Trigger, ResourceError> {
        self.begin("get", "Trigger", target(namespace, name))?;
        self.triggers.lock().unwrap().get(namespace, name)
    }

    async fn list_exchanges(&self, namespace: &str, selector: &LabelSelector) -> Result<Vec<Exchange>, ResourceError> {
        self.begin("list", "Exchange", target(namespace, &selector.to_string()))?;
        Ok(self.exchanges.lock().unwrap().list(namespace, selector))
    }

    async fn list_queues(&self, namespace: &str, selector: &LabelSelector) -> Result<Vec<Queue>, ResourceError> {
        self.begin("list", "Queue", target(namespace, &selector.to_string()))?;
        Ok(self.queues.lock().unwrap().list(namespace, selector))
    }

    async fn create_binding(&self, binding: &Binding) -> Result<Binding, ResourceError> {
        let namespace = binding.namespace().unwrap_or_default();
        self.begin("create", "Binding", target(&namespace, &binding.name_any()))?;
        let uid = self.next_uid();
        self.bindings.lock().unwrap().create(binding.clone(), uid)
    }

    async fn list_bindings(&self, namespace: &str, selector: &LabelSelector) -> Result<Vec<Binding>, ResourceError> {
        self.begin("list", "Binding", target(namespace, &selector.to_string()))?;
        Ok(self.bindings.lock().unwrap().list(namespace, selector))
    }
}
