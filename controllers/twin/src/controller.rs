//! Main controller implementation.
//!
//! This module contains the `Controller` struct that wires the resource
//! client, reconciler, watchers and metrics server together:
//! - TwinInterface watcher
//! - TwinInstance watcher
//! - EventStore watcher
//! - metrics/probes HTTP server

use crate::config::ControllerConfig;
use crate::error::ControllerError;
use crate::metrics::{self, Metrics};
use crate::reconciler::Reconciler;
use crate::watcher::{self, Context};
use kube::Client;
use kube_runtime::controller::Config as RuntimeConfig;
use std::sync::Arc;
use tokio::task::JoinHandle;
use topology_client::KubeResourceClient;
use tracing::info;

/// Main controller for twin resource management.
pub struct Controller {
    interface_watcher: JoinHandle<Result<(), ControllerError>>,
    instance_watcher: JoinHandle<Result<(), ControllerError>>,
    event_store_watcher: JoinHandle<Result<(), ControllerError>>,
    metrics_server: JoinHandle<Result<(), ControllerError>>,
}

impl Controller {
    /// Creates a new controller instance and starts its background tasks.
    pub async fn new(config: ControllerConfig) -> Result<Self, ControllerError> {
        info!("Initializing KTwin Controller");

        let kube_client = Client::try_default().await?;
        let metrics = Arc::new(Metrics::new()?);

        let reconciler = Reconciler::new(
            KubeResourceClient::new(kube_client.clone()),
            config.topology.clone(),
            config.backoff_min_seconds,
            config.backoff_max_seconds,
        );
        let ctx = Arc::new(Context {
            reconciler: Arc::new(reconciler),
            metrics: metrics.clone(),
            resync: config.resync,
        });

        // Debounce batches bursts of events (including our own status writes)
        // into a single reconcile per object
        let runtime_config = RuntimeConfig::default()
            .debounce(config.debounce)
            .concurrency(config.concurrency);

        let metrics_server = {
            let metrics = metrics.clone();
            let addr = config.metrics_addr;
            tokio::spawn(async move { metrics::serve(addr, metrics).await })
        };

        let interface_watcher = {
            let client = kube_client.clone();
            let namespace = config.namespace.clone();
            let ctx = ctx.clone();
            let runtime_config = runtime_config.clone();
            tokio::spawn(async move {
                watcher::watch_twin_interfaces(client, namespace, ctx, runtime_config).await
            })
        };

        let instance_watcher = {
            let client = kube_client.clone();
            let namespace = config.namespace.clone();
            let ctx = ctx.clone();
            let runtime_config = runtime_config.clone();
            tokio::spawn(async move {
                watcher::watch_twin_instances(client, namespace, ctx, runtime_config).await
            })
        };

        let event_store_watcher = {
            let namespace = config.namespace.clone();
            tokio::spawn(async move {
                watcher::watch_event_stores(kube_client, namespace, ctx, runtime_config).await
            })
        };

        metrics.mark_ready();

        Ok(Self {
            interface_watcher,
            instance_watcher,
            event_store_watcher,
            metrics_server,
        })
    }

    /// Runs the controller until shutdown.
    pub async fn run(mut self) -> Result<(), ControllerError> {
        info!("KTwin Controller running");

        // Watchers return once a shutdown signal is received; any task exiting ends the process
        tokio::select! {
            result = &mut self.interface_watcher => {
                result.map_err(|e| ControllerError::Watch(format!("TwinInterface watcher panicked: {}", e)))?
                    .map_err(|e| ControllerError::Watch(format!("TwinInterface watcher error: {}", e)))?;
            }
            result = &mut self.instance_watcher => {
                result.map_err(|e| ControllerError::Watch(format!("TwinInstance watcher panicked: {}", e)))?
                    .map_err(|e| ControllerError::Watch(format!("TwinInstance watcher error: {}", e)))?;
            }
            result = &mut self.event_store_watcher => {
                result.map_err(|e| ControllerError::Watch(format!("EventStore watcher panicked: {}", e)))?
                    .map_err(|e| ControllerError::Watch(format!("EventStore watcher error: {}", e)))?;
            }
            result = &mut self.metrics_server => {
                result.map_err(|e| ControllerError::Watch(format!("Metrics server panicked: {}", e)))??;
            }
        }

        info!("KTwin Controller stopped");
        Ok(())
    }
}
