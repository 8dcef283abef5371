//! Knative Serving `Service` (serving.knative.dev/v1)

use k8s_openapi::api::core::v1::Container;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::CustomResource;
use serde::{Deserialize, Serialize};

/// Desired state of a Knative Service
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[kube(
    group = "serving.knative.dev",
    version = "v1",
    kind = "Service",
    root = "KnativeService",
    namespaced,
    status = "KnativeServiceStatus",
    schema = "disabled"
)]
#[serde(rename_all = "camelCase")]
pub struct KnativeServiceSpec {
    /// Revision template
    pub template: RevisionTemplateSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct RevisionTemplateSpec {
    /// Revision metadata (name, autoscaling annotations)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ObjectMeta>,

    /// Revision pod spec
    pub spec: RevisionSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct RevisionSpec {
    /// Containers (Knative allows exactly one serving container)
    pub containers: Vec<Container>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct KnativeServiceStatus {
    /// Public URL assigned by Knative
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Latest ready revision
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_ready_revision_name: Option<String>,
}
