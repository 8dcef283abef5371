//! Kubernetes resource watchers.
//!
//! One kube_runtime::Controller per twin kind. The controller handles
//! reconnection, deduplicates bursts of events per object and serializes
//! reconciles of the same object; different objects run concurrently up to
//! the configured limit.
//!
//! - TwinInterface: also woken by changes to its owned Knative Service,
//!   Trigger and Bindings
//! - TwinInstance: also woken by changes to its owned Bindings and to the
//!   TwinInterface it references
//! - EventStore: also woken by changes to its owned Knative Service

use crate::error::ControllerError;
use crate::metrics::Metrics;
use crate::reconciler::Reconciler;
use crds::{Binding, EventStore, KnativeService, Trigger, TwinInstance, TwinInterface};
use futures::StreamExt;
use k8s_openapi::NamespaceResourceScope;
use kube::{Api, Client, Resource, ResourceExt};
use kube_runtime::controller::{Action, Config as RuntimeConfig};
use kube_runtime::reflector::{ObjectRef, Store};
use kube_runtime::{watcher, Controller};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Shared state handed to every reconcile
pub struct Context {
    pub reconciler: Arc<Reconciler>,
    pub metrics: Arc<Metrics>,
    /// Requeue interval after success, so newly provisioned infrastructure is picked up
    pub resync: Duration,
}

impl Context {
    /// Record the pass and turn its result into a requeue decision
    fn complete<K>(&self, obj: &K, started: Instant, result: Result<(), ControllerError>) -> Result<Action, ControllerError>
    where
        K: Resource<DynamicType = ()>,
    {
        let kind = K::kind(&());
        self.metrics
            .record_reconcile(&kind, result.is_ok(), started.elapsed().as_secs_f64());
        result?;
        self.reconciler.reset_backoff(&backoff_key(obj));
        Ok(Action::requeue(self.resync))
    }
}

fn backoff_key<K>(obj: &K) -> String
where
    K: Resource<DynamicType = ()>,
{
    format!("{}/{}/{}", K::kind(&()), obj.namespace().unwrap_or_default(), obj.name_any())
}

/// Error policy: requeue with per-object Fibonacci backoff
fn error_policy<K>(obj: Arc<K>, error: &ControllerError, ctx: Arc<Context>) -> Action
where
    K: Resource<DynamicType = ()>,
{
    let key = backoff_key(obj.as_ref());
    let delay = ctx.reconciler.next_backoff(&key);
    warn!("Reconciliation error for {}: {} (retrying in {:?})", key, error, delay);
    Action::requeue(delay)
}

async fn reconcile_interface(obj: Arc<TwinInterface>, ctx: Arc<Context>) -> Result<Action, ControllerError> {
    let namespace = obj.namespace().unwrap_or_default();
    let name = obj.name_any();
    let started = Instant::now();
    let result = ctx.reconciler.reconcile_twin_interface(&namespace, &name).await;
    ctx.complete(obj.as_ref(), started, result)
}

async fn reconcile_instance(obj: Arc<TwinInstance>, ctx: Arc<Context>) -> Result<Action, ControllerError> {
    let namespace = obj.namespace().unwrap_or_default();
    let name = obj.name_any();
    let started = Instant::now();
    let result = ctx.reconciler.reconcile_twin_instance(&namespace, &name).await;
    ctx.complete(obj.as_ref(), started, result)
}

async fn reconcile_event_store(obj: Arc<EventStore>, ctx: Arc<Context>) -> Result<Action, ControllerError> {
    let namespace = obj.namespace().unwrap_or_default();
    let name = obj.name_any();
    let started = Instant::now();
    let result = ctx.reconciler.reconcile_event_store(&namespace, &name).await;
    ctx.complete(obj.as_ref(), started, result)
}

fn api<K>(client: &Client, namespace: Option<&str>) -> Api<K>
where
    K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>,
{
    match namespace {
        Some(ns) => Api::namespaced(client.clone(), ns),
        None => Api::all(client.clone()),
    }
}

/// Instances in the interface's namespace that reference it
fn instances_of(store: &Store<TwinInstance>, interface: &TwinInterface) -> Vec<ObjectRef<TwinInstance>> {
    let namespace = interface.namespace();
    let name = interface.name_any();
    store
        .state()
        .into_iter()
        .filter(|instance| instance.namespace() == namespace && instance.spec.interface == name)
        .map(|instance| ObjectRef::from_obj(instance.as_ref()))
        .collect()
}

/// Watch TwinInterfaces until shutdown
pub async fn watch_twin_interfaces(
    client: Client,
    namespace: Option<String>,
    ctx: Arc<Context>,
    config: RuntimeConfig,
) -> Result<(), ControllerError> {
    info!("Starting TwinInterface watcher");
    let ns = namespace.as_deref();

    Controller::new(api::<TwinInterface>(&client, ns), watcher::Config::default())
        .owns(api::<KnativeService>(&client, ns), watcher::Config::default())
        .owns(api::<Trigger>(&client, ns), watcher::Config::default())
        .owns(api::<Binding>(&client, ns), watcher::Config::default())
        .with_config(config)
        .shutdown_on_signal()
        .run(reconcile_interface, error_policy::<TwinInterface>, ctx)
        .for_each(|res| async move {
            match res {
                Ok((obj, action)) => debug!("Reconciled TwinInterface {}: {:?}", obj, action),
                Err(e) => warn!("TwinInterface controller error: {}", e),
            }
        })
        .await;

    info!("TwinInterface watcher stopped");
    Ok(())
}

/// Watch TwinInstances until shutdown
pub async fn watch_twin_instances(
    client: Client,
    namespace: Option<String>,
    ctx: Arc<Context>,
    config: RuntimeConfig,
) -> Result<(), ControllerError> {
    info!("Starting TwinInstance watcher");
    let ns = namespace.as_deref();

    let controller = Controller::new(api::<TwinInstance>(&client, ns), watcher::Config::default());
    let store = controller.store();

    controller
        .owns(api::<Binding>(&client, ns), watcher::Config::default())
        .watches(
            api::<TwinInterface>(&client, ns),
            watcher::Config::default(),
            move |interface| instances_of(&store, &interface),
        )
        .with_config(config)
        .shutdown_on_signal()
        .run(reconcile_instance, error_policy::<TwinInstance>, ctx)
        .for_each(|res| async move {
            match res {
                Ok((obj, action)) => debug!("Reconciled TwinInstance {}: {:?}", obj, action),
                Err(e) => warn!("TwinInstance controller error: {}", e),
            }
        })
        .await;

    info!("TwinInstance watcher stopped");
    Ok(())
}

/// Watch EventStores until shutdown
pub async fn watch_event_stores(
    client: Client,
    namespace: Option<String>,
    ctx: Arc<Context>,
    config: RuntimeConfig,
) -> Result<(), ControllerError> {
    info!("Starting EventStore watcher");
    let ns = namespace.as_deref();

    Controller::new(api::<EventStore>(&client, ns), watcher::Config::default())
        .owns(api::<KnativeService>(&client, ns), watcher::Config::default())
        .with_config(config)
        .shutdown_on_signal()
        .run(reconcile_event_store, error_policy::<EventStore>, ctx)
        .for_each(|res| async move {
            match res {
                Ok((obj, action)) => debug!("Reconciled EventStore {}: {:?}", obj, action),
                Err(e) => warn!("EventStore controller error: {}", e),
            }
        })
        .await;

    info!("EventStore watcher stopped");
    Ok(())
}
