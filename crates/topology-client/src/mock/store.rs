//! Namespaced in-memory object store used by the mock client

use crate::error::ResourceError;
use crate::selector::LabelSelector;
use kube::{Resource, ResourceExt};
use std::collections::BTreeMap;

/// Objects of one kind keyed by (namespace, name)
///
/// A `BTreeMap` keeps listing order stable, matching the name-ordered lists
/// the API server returns.
#[derive(Debug)]
pub(crate) struct NamespacedStore<K> {
    kind: &'static str,
    objects: BTreeMap<(String, String), K>,
}

impl<K> NamespacedStore<K>
where
    K: Resource + Clone,
{
    pub(crate) fn new(kind: &'static str) -> Self {
        Self {
            kind,
            objects: BTreeMap::new(),
        }
    }

    pub(crate) fn insert(&mut self, obj: K) {
        let key = (obj.namespace().unwrap_or_default(), obj.name_any());
        self.objects.insert(key, obj);
    }

    pub(crate) fn get(&self, namespace: &str, name: &str) -> Result<K, ResourceError> {
        self.objects
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| self.not_found(namespace, name))
    }

    pub(crate) fn get_mut(&mut self, namespace: &str, name: &str) -> Result<&mut K, ResourceError> {
        let not_found = self.not_found(namespace, name);
        self.objects
            .get_mut(&(namespace.to_string(), name.to_string()))
            .ok_or(not_found)
    }

    /// Insert `obj` unless an object with the same name exists
    pub(crate) fn create(&mut self, obj: K, uid: String) -> Result<K, ResourceError> {
        let namespace = obj.namespace().unwrap_or_default();
        let name = obj.name_any();
        let key = (namespace.clone(), name.clone());
        if self.objects.contains_key(&key) {
            return Err(ResourceError::AlreadyExists {
                kind: self.kind.to_string(),
                namespace,
                name,
            });
        }
        let mut stored = obj;
        stored.meta_mut().uid = Some(uid);
        stored.meta_mut().resource_version = Some("1".to_string());
        self.objects.insert(key, stored.clone());
        Ok(stored)
    }

    pub(crate) fn list(&self, namespace: &str, selector: &LabelSelector) -> Vec<K> {
        self.objects
            .iter()
            .filter(|((ns, _), obj)| ns == namespace && selector.matches(obj.meta().labels.as_ref()))
            .map(|(_, obj)| obj.clone())
            .collect()
    }

    pub(crate) fn all(&self, namespace: &str) -> Vec<K> {
        self.list(namespace, &LabelSelector::new())
    }

    fn not_found(&self, namespace: &str, name: &str) -> ResourceError {
        ResourceError::NotFound {
            kind: self.kind.to_string(),
            namespace: namespace.to_string(),
            name: name.to_string(),
        }
    }
}
