//! Controller-specific error types.
//!
//! This module defines error types specific to the KTwin controller that are
//! not covered by upstream library errors.

use kube::Error as KubeError;
use thiserror::Error;
use topology_client::ResourceError;

/// Errors that can occur in the KTwin controller.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Resource store error (classified get/list/create/patch failure)
    #[error("Resource error: {0}")]
    Resource(#[from] ResourceError),

    /// The TwinInterface named by a TwinInstance does not exist
    #[error("TwinInterface {namespace}/{name} not found")]
    ParentInterfaceNotFound { namespace: String, name: String },

    /// Shared broker infrastructure matching the selector is absent
    #[error("No {kind} in namespace {namespace} matches {selector}")]
    DependencyUnresolved {
        kind: String,
        namespace: String,
        selector: String,
    },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Kubernetes API error
    #[error("Kubernetes error: {0}")]
    Kube(#[from] KubeError),

    /// Resource watch failed
    #[error("Resource watch failed: {0}")]
    Watch(String),

    /// Metrics registry error
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    /// Probe server I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
