//! KTwin Controller
//!
//! Manages the lifecycle of digital twins:
//! - TwinInterface: materialized into a Knative Service, a Trigger and the
//!   RabbitMQ bindings routing its events into the broker and the event store
//! - TwinInstance: wired into the MQTT dispatcher
//!
//! Shared broker infrastructure (exchange, trigger queues) is discovered, never created.

mod backoff;
mod bindings;
mod config;
mod controller;
mod error;
mod metrics;
mod outcome;
mod ownership;
mod reconciler;
mod service;
#[cfg(test)]
mod test_utils;
mod topology;
mod trigger;
mod watcher;

use crate::config::ControllerConfig;
use crate::error::ControllerError;
use controller::Controller;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), ControllerError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // kube's rustls client needs a process-wide crypto provider
    if rustls::crypto::ring::default_provider().install_default().is_err() {
        warn!("rustls crypto provider already installed");
    }

    info!("Starting KTwin Controller");

    let config = ControllerConfig::from_env()?;
    config.log();

    let controller = Controller::new(config).await?;
    controller.run().await?;

    Ok(())
}
