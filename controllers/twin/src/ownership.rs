//! Owner references and identity labels shared by every generated artifact

use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::Resource;
use std::collections::BTreeMap;

/// Controller owner reference to `owner`, so deleting it cascades to the artifact
///
/// Objects read from the API server always carry a name and uid; a local object
/// without them yields no reference.
pub fn owner_references<K>(owner: &K) -> Option<Vec<OwnerReference>>
where
    K: Resource<DynamicType = ()>,
{
    owner.controller_owner_ref(&()).map(|reference| vec![reference])
}

/// Build a label map from `(key, value)` pairs
pub fn labels(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

/// True when every label in `wanted` is already set to the same value
pub fn has_labels(current: &BTreeMap<String, String>, wanted: &BTreeMap<String, String>) -> bool {
    wanted
        .iter()
        .all(|(key, value)| current.get(key) == Some(value))
}
