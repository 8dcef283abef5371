//! Twin lifecycle phase shared by `TwinInterface` and `TwinInstance`.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Observed phase of a twin entity
///
/// Serializes as PascalCase ("Pending", "Running", "Failed") but also accepts
/// lowercase values written by older tooling.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "PascalCase")]
pub enum TwinPhase {
    /// Not reconciled yet
    #[default]
    #[serde(alias = "pending")]
    Pending,

    /// All routing artifacts exist
    #[serde(alias = "running")]
    Running,

    /// At least one reconcile step failed
    #[serde(alias = "failed")]
    Failed,
}

impl TwinPhase {
    /// PascalCase name as written to the status subresource
    pub fn as_str(&self) -> &'static str {
        match self {
            TwinPhase::Pending => "Pending",
            TwinPhase::Running => "Running",
            TwinPhase::Failed => "Failed",
        }
    }
}

impl fmt::Display for TwinPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
