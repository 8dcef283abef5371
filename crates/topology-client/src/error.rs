//! Resource client errors

use thiserror::Error;

/// Errors that can occur when talking to the cluster resource store
#[derive(Debug, Error)]
pub enum ResourceError {
    /// Object does not exist (HTTP 404)
    #[error("{kind} {namespace}/{name} not found")]
    NotFound {
        kind: String,
        namespace: String,
        name: String,
    },

    /// Object with the same name already exists (HTTP 409 on create)
    #[error("{kind} {namespace}/{name} already exists")]
    AlreadyExists {
        kind: String,
        namespace: String,
        name: String,
    },

    /// Any other Kubernetes API or transport error
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    /// JSON serialization of a patch body failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Request rejected before reaching the API (missing name, injected failure)
    #[error("{operation} {kind} failed: {message}")]
    Request {
        operation: String,
        kind: String,
        message: String,
    },
}

impl ResourceError {
    /// True for `NotFound`
    pub fn is_not_found(&self) -> bool {
        matches!(self, ResourceError::NotFound { .. })
    }

    /// True for `AlreadyExists`
    pub fn is_already_exists(&self) -> bool {
        matches!(self, ResourceError::AlreadyExists { .. })
    }

    /// Classify a kube error for the object `kind namespace/name`
    ///
    /// 404 becomes `NotFound`; 409 with reason `AlreadyExists` becomes
    /// `AlreadyExists`. A 409 `Conflict` (stale resourceVersion) stays a plain
    /// Kube error so it is retried.
    pub fn from_kube(err: kube::Error, kind: &str, namespace: &str, name: &str) -> Self {
        match err {
            kube::Error::Api(ref ae) if ae.code == 404 => ResourceError::NotFound {
                kind: kind.to_string(),
                namespace: namespace.to_string(),
                name: name.to_string(),
            },
            kube::Error::Api(ref ae) if ae.code == 409 && ae.reason == "AlreadyExists" => {
                ResourceError::AlreadyExists {
                    kind: kind.to_string(),
                    namespace: namespace.to_string(),
                    name: name.to_string(),
                }
            }
            other => ResourceError::Kube(other),
        }
    }
}
