//! Kubernetes resource client
//!
//! Implements `ResourceClient` on top of kube `Api`s. Every call is a single
//! API request; retries are left to the controller's requeue policy.

use crate::client_trait::ResourceClient;
use crate::error::ResourceError;
use crate::selector::LabelSelector;
use crds::{
    Binding, EventStore, EventStoreStatus, Exchange, KnativeService, Queue, Trigger, TwinInstance,
    TwinInstanceStatus, TwinInterface, TwinInterfaceStatus,
};
use k8s_openapi::NamespaceResourceScope;
use kube::api::{Api, ListParams, Patch, PatchParams, PostParams};
use kube::{Client, Resource, ResourceExt};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::fmt::Debug;
use tracing::debug;

/// Field manager recorded on objects created by the operator
const FIELD_MANAGER: &str = "ktwin-operator";

/// Resource client backed by a Kubernetes API server
#[derive(Clone)]
pub struct KubeResourceClient {
    client: Client,
}

impl KubeResourceClient {
    /// Create a new client from an existing kube `Client`
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn api<K>(&self, namespace: &str) -> Api<K>
    where
        K: Resource<Scope = NamespaceResourceScope>,
        K::DynamicType: Default,
    {
        Api::namespaced(self.client.clone(), namespace)
    }

    async fn get<K>(&self, namespace: &str, name: &str) -> Result<K, ResourceError>
    where
        K: Resource<Scope = NamespaceResourceScope> + Clone + DeserializeOwned + Debug,
        K::DynamicType: Default,
    {
        debug!("GET {} {}/{}", kind_of::<K>(), namespace, name);
        self.api::<K>(namespace)
            .get(name)
            .await
            .map_err(|e| ResourceError::from_kube(e, &kind_of::<K>(), namespace, name))
    }

    async fn create<K>(&self, obj: &K) -> Result<K, ResourceError>
    where
        K: Resource<Scope = NamespaceResourceScope> + Clone + DeserializeOwned + Serialize + Debug,
        K::DynamicType: Default,
    {
        let kind = kind_of::<K>();
        let name = obj.meta().name.clone().ok_or_else(|| ResourceError::Request {
            operation: "create".to_string(),
            kind: kind.clone(),
            message: "object has no metadata.name".to_string(),
        })?;
        let namespace = obj.namespace().ok_or_else(|| ResourceError::Request {
            operation: "create".to_string(),
            kind: kind.clone(),
            message: format!("{} has no metadata.namespace", name),
        })?;

        debug!("CREATE {} {}/{}", kind, namespace, name);
        let pp = PostParams {
            field_manager: Some(FIELD_MANAGER.to_string()),
            ..Default::default()
        };
        self.api::<K>(&namespace)
            .create(&pp, obj)
            .await
            .map_err(|e| ResourceError::from_kube(e, &kind, &namespace, &name))
    }

    async fn list<K>(&self, namespace: &str, selector: &LabelSelector) -> Result<Vec<K>, ResourceError>
    where
        K: Resource<Scope = NamespaceResourceScope> + Clone + DeserializeOwned + Debug,
        K::DynamicType: Default,
    {
        debug!("LIST {} in {} matching '{}'", kind_of::<K>(), namespace, selector);
        let lp = if selector.is_empty() {
            ListParams::default()
        } else {
            ListParams::default().labels(&selector.to_string())
        };
        let list = self.api::<K>(namespace).list(&lp).await?;
        Ok(list.items)
    }

    async fn patch_labels<K>(
        &self,
        namespace: &str,
        name: &str,
        labels: &BTreeMap<String, String>,
    ) -> Result<(), ResourceError>
    where
        K: Resource<Scope = NamespaceResourceScope> + Clone + DeserializeOwned + Debug,
        K::DynamicType: Default,
    {
        let patch = serde_json::json!({
            "metadata": {
                "labels": labels
            }
        });
        self.api::<K>(namespace)
            .patch(name, &PatchParams::default(), &Patch::Merge(&patch))
            .await
            .map_err(|e| ResourceError::from_kube(e, &kind_of::<K>(), namespace, name))?;
        Ok(())
    }

    async fn patch_status<K, S>(&self, namespace: &str, name: &str, status: &S) -> Result<(), ResourceError>
    where
        K: Resource<Scope = NamespaceResourceScope> + Clone + DeserializeOwned + Debug,
        K::DynamicType: Default,
        S: Serialize,
    {
        let patch = serde_json::json!({
            "status": serde_json::to_value(status)?
        });
        self.api::<K>(namespace)
            .patch_status(name, &PatchParams::default(), &Patch::Merge(&patch))
            .await
            .map_err(|e| ResourceError::from_kube(e, &kind_of::<K>(), namespace, name))?;
        Ok(())
    }
}

fn kind_of<K>() -> String
where
    K: Resource,
    K::DynamicType: Default,
{
    K::kind(&K::DynamicType::default()).into_owned()
}

#[async_trait::async_trait]
impl ResourceClient for KubeResourceClient {
    async fn get_twin_interface(&self, namespace: &str, name: &str) -> Result<TwinInterface, ResourceError> {
        self.get(namespace, name).await
    }

    async fn get_twin_instance(&self, namespace: &str, name: &str) -> Result<TwinInstance, ResourceError> {
        self.get(namespace, name).await
    }

    async fn patch_twin_interface_labels(&self, namespace: &str, name: &str, labels: &BTreeMap<String, String>) -> Result<(), ResourceError> {
        self.patch_labels::<TwinInterface>(namespace, name, labels).await
    }

    async fn patch_twin_interface_status(&self, namespace: &str, name: &str, status: &TwinInterfaceStatus) -> Result<(), ResourceError> {
        self.patch_status::<TwinInterface, _>(namespace, name, status).await
    }

    async fn patch_twin_instance_labels(&self, namespace: &str, name: &str, labels: &BTreeMap<String, String>) -> Result<(), ResourceError> {
        self.patch_labels::<TwinInstance>(namespace, name, labels).await
    }

    async fn patch_twin_instance_status(&self, namespace: &str, name: &str, status: &TwinInstanceStatus) -> Result<(), ResourceError> {
        self.patch_status::<TwinInstance, _>(namespace, name, status).await
    }

    async fn get_event_store(&self, namespace: &str, name: &str) -> Result<EventStore, ResourceError> {
        self.get(namespace, name).await
    }

    async fn patch_event_store_status(&self, namespace: &str, name: &str, status: &EventStoreStatus) -> Result<(), ResourceError> {
        self.patch_status::<EventStore, _>(namespace, name, status).await
    }

    async fn create_knative_service(&self, service: &KnativeService) -> Result<KnativeService, ResourceError> {
        self.create(service).await
    }

    async fn create_trigger(&self, trigger: &Trigger) -> Result<Trigger, ResourceError> {
        self.create(trigger).await
    }

    async fn get_trigger(&self, namespace: &str, name: &str) -> Result<Trigger, ResourceError> {
        self.get(namespace, name).await
    }

    async fn list_exchanges(&self, namespace: &str, selector: &LabelSelector) -> Result<Vec<Exchange>, ResourceError> {
        self.list(namespace, selector).await
    }

    async fn list_queues(&self, namespace: &str, selector: &LabelSelector) -> Result<Vec<Queue>, ResourceError> {
        self.list(namespace, selector).await
    }

    async fn create_binding(&self, binding: &Binding) -> Result<Binding, ResourceError> {
        self.create(binding).await
    }

    async fn list_bindings(&self, namespace: &str, selector: &LabelSelector) -> Result<Vec<Binding>, ResourceError> {
        self.list(namespace, selector).await
    }
}
