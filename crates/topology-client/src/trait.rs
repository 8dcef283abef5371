//! ResourceClient trait for mocking
//!
//! This trait abstracts the cluster resource store so the reconcilers can be
//! unit tested against an in-memory fake. `KubeResourceClient` implements it
//! on top of kube `Api`s.

use crate::error::ResourceError;
use crate::selector::LabelSelector;
use crds::{
    Binding, EventStore, EventStoreStatus, Exchange, KnativeService, Queue, Trigger, TwinInstance,
    TwinInstanceStatus, TwinInterface, TwinInterfaceStatus,
};
use std::collections::BTreeMap;

/// Trait for cluster resource store operations
///
/// Creates report an existing object as `ResourceError::AlreadyExists` and
/// gets report a missing one as `ResourceError::NotFound`; callers decide
/// whether either is benign. All methods must be `Send` to work with Tokio's
/// work-stealing runtime.
#[async_trait::async_trait]
pub trait ResourceClient: Send + Sync {
    // Twin entities
    async fn get_twin_interface(&self, namespace: &str, name: &str) -> Result<TwinInterface, ResourceError>;
    async fn get_twin_instance(&self, namespace: &str, name: &str) -> Result<TwinInstance, ResourceError>;

    /// Merge the given labels into the interface's metadata
    async fn patch_twin_interface_labels(&self, namespace: &str, name: &str, labels: &BTreeMap<String, String>) -> Result<(), ResourceError>;

    /// Replace the interface's status subresource
    async fn patch_twin_interface_status(&self, namespace: &str, name: &str, status: &TwinInterfaceStatus) -> Result<(), ResourceError>;

    /// Merge the given labels into the instance's metadata
    async fn patch_twin_instance_labels(&self, namespace: &str, name: &str, labels: &BTreeMap<String, String>) -> Result<(), ResourceError>;

    /// Replace the instance's status subresource
    async fn patch_twin_instance_status(&self, namespace: &str, name: &str, status: &TwinInstanceStatus) -> Result<(), ResourceError>;

    // Event store
    async fn get_event_store(&self, namespace: &str, name: &str) -> Result<EventStore, ResourceError>;
    async fn patch_event_store_status(&self, namespace: &str, name: &str, status: &EventStoreStatus) -> Result<(), ResourceError>;

    // Compute services
    async fn create_knative_service(&self, service: &KnativeService) -> Result<KnativeService, ResourceError>;

    // Eventing
    async fn create_trigger(&self, trigger: &Trigger) -> Result<Trigger, ResourceError>;
    async fn get_trigger(&self, namespace: &str, name: &str) -> Result<Trigger, ResourceError>;

    // Broker topology
    async fn list_exchanges(&self, namespace: &str, selector: &LabelSelector) -> Result<Vec<Exchange>, ResourceError>;
    async fn list_queues(&self, namespace: &str, selector: &LabelSelector) -> Result<Vec<Queue>, ResourceError>;
    async fn create_binding(&self, binding: &Binding) -> Result<Binding, ResourceError>;
    async fn list_bindings(&self, namespace: &str, selector: &LabelSelector) -> Result<Vec<Binding>, ResourceError>;
}
