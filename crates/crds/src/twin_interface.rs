//! TwinInterface CRD
//!
//! Declares a twin type: its shape and, optionally, the compute service that
//! processes its events.

use crate::phase::TwinPhase;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// TwinInterfaceSpec defines the desired state of a twin type
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
#[kube(
    group = "dtd.ktwin",
    version = "v0",
    kind = "TwinInterface",
    namespaced,
    status = "TwinInterfaceStatus",
    shortname = "twi",
    printcolumn = r#"{"name":"Status","type":"string","jsonPath":".status.status"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct TwinInterfaceSpec {
    /// Compute service backing this interface. Interfaces without one are
    /// pure type declarations and get no trigger or bindings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<TwinServiceSpec>,
}

/// Container and autoscaling settings for the interface's Knative Service
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TwinServiceSpec {
    /// Container image
    pub image: String,

    /// Image pull policy (Always, IfNotPresent, Never)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_pull_policy: Option<String>,

    /// Environment variables passed to the container
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<TwinEnvVar>,

    /// Knative autoscaling bounds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autoscaling: Option<TwinAutoscaling>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TwinEnvVar {
    /// Variable name
    pub name: String,

    /// Variable value
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TwinAutoscaling {
    /// Target concurrent requests per replica
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<u32>,

    /// Minimum number of replicas
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_scale: Option<u32>,

    /// Maximum number of replicas
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_scale: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TwinInterfaceStatus {
    /// Lifecycle phase
    #[serde(default)]
    pub status: TwinPhase,
}

impl TwinInterface {
    /// Current phase, `Pending` when no status has been written yet
    pub fn phase(&self) -> TwinPhase {
        self.status.as_ref().map(|s| s.status).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interface_without_service_deserializes() {
        let spec: TwinInterfaceSpec = serde_json::from_str("{}").unwrap();
        assert!(spec.service.is_none());
    }

    #[test]
    fn test_status_wire_format() {
        let status = TwinInterfaceStatus { status: TwinPhase::Failed };
        assert_eq!(
            serde_json::to_value(&status).unwrap(),
            serde_json::json!({ "status": "Failed" })
        );
    }

    #[test]
    fn test_phase_unset_is_pending() {
        let interface = TwinInterface::new("temperature-sensor", TwinInterfaceSpec::default());
        assert_eq!(interface.phase(), TwinPhase::Pending);
    }
}
