//! TwinInstance CRD
//!
//! A concrete twin belonging to exactly one TwinInterface.

use crate::phase::TwinPhase;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// TwinInstanceSpec defines the desired state of a twin instance
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "dtd.ktwin",
    version = "v0",
    kind = "TwinInstance",
    namespaced,
    status = "TwinInstanceStatus",
    shortname = "twins",
    printcolumn = r#"{"name":"Interface","type":"string","jsonPath":".spec.interface"}"#,
    printcolumn = r#"{"name":"Status","type":"string","jsonPath":".status.status"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct TwinInstanceSpec {
    /// Name of the parent TwinInterface (same namespace)
    pub interface: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TwinInstanceStatus {
    /// Lifecycle phase
    #[serde(default)]
    pub status: TwinPhase,
}

impl TwinInstance {
    /// Current phase, `Pending` when no status has been written yet
    pub fn phase(&self) -> TwinPhase {
        self.status.as_ref().map(|s| s.status).unwrap_or_default()
    }
}
