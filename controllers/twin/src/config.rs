//! Controller configuration.
//!
//! Everything is read from environment variables once at startup. Parsing goes
//! through a lookup function so it can be exercised without touching the
//! process environment.

use crate::error::ControllerError;
use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// Names of the shared broker infrastructure the reconcilers bind into
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopologyConfig {
    /// Knative broker whose exchange and trigger queues are discovered
    pub broker: String,
    /// Trigger name the event store's queue is labelled with
    pub event_store_trigger: String,
    /// Exchange MQTT messages from real devices land in
    pub dispatcher_exchange: String,
    /// Queue consumed by the MQTT dispatcher
    pub dispatcher_queue: String,
    /// RabbitmqCluster referenced by dispatcher bindings
    pub rabbitmq_cluster: String,
    /// Vhost of dispatcher bindings
    pub rabbitmq_vhost: String,
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self {
            broker: "ktwin".to_string(),
            event_store_trigger: "event-store-trigger".to_string(),
            dispatcher_exchange: "amq.topic".to_string(),
            dispatcher_queue: "ktwin-mqtt-dispatcher".to_string(),
            rabbitmq_cluster: "rabbitmq".to_string(),
            rabbitmq_vhost: "/".to_string(),
        }
    }
}

/// Full controller configuration
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Namespace to watch; `None` watches all namespaces
    pub namespace: Option<String>,
    pub topology: TopologyConfig,
    /// Concurrent reconciles per controller
    pub concurrency: u16,
    /// Quiet period before a burst of changes is reconciled
    pub debounce: Duration,
    /// Requeue interval after a successful reconcile
    pub resync: Duration,
    pub backoff_min_seconds: u64,
    pub backoff_max_seconds: u64,
    /// Listen address of the metrics/probes server
    pub metrics_addr: SocketAddr,
}

impl ControllerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ControllerError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ControllerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = TopologyConfig::default();
        let string = |key: &str, default: String| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(default)
        };

        let topology = TopologyConfig {
            broker: string("KTWIN_BROKER", defaults.broker),
            event_store_trigger: string("EVENT_STORE_TRIGGER", defaults.event_store_trigger),
            dispatcher_exchange: string("MQTT_DISPATCHER_EXCHANGE", defaults.dispatcher_exchange),
            dispatcher_queue: string("MQTT_DISPATCHER_QUEUE", defaults.dispatcher_queue),
            rabbitmq_cluster: string("RABBITMQ_CLUSTER", defaults.rabbitmq_cluster),
            rabbitmq_vhost: string("RABBITMQ_VHOST", defaults.rabbitmq_vhost),
        };

        let concurrency: u16 = parse(&lookup, "RECONCILE_CONCURRENCY", 3)?;
        if concurrency == 0 {
            return Err(ControllerError::InvalidConfig(
                "RECONCILE_CONCURRENCY must be at least 1".to_string(),
            ));
        }

        let backoff_min_seconds = parse(&lookup, "BACKOFF_MIN_SECONDS", 5)?;
        let backoff_max_seconds = parse(&lookup, "BACKOFF_MAX_SECONDS", 300)?;
        if backoff_min_seconds == 0 || backoff_min_seconds > backoff_max_seconds {
            return Err(ControllerError::InvalidConfig(format!(
                "backoff bounds must satisfy 0 < BACKOFF_MIN_SECONDS ({}) <= BACKOFF_MAX_SECONDS ({})",
                backoff_min_seconds, backoff_max_seconds
            )));
        }

        Ok(Self {
            namespace: lookup("WATCH_NAMESPACE").filter(|ns| !ns.trim().is_empty()),
            topology,
            concurrency,
            debounce: Duration::from_secs(parse(&lookup, "RECONCILE_DEBOUNCE_SECONDS", 5)?),
            resync: Duration::from_secs(parse(&lookup, "RESYNC_SECONDS", 300)?),
            backoff_min_seconds,
            backoff_max_seconds,
            metrics_addr: parse(&lookup, "METRICS_ADDR", SocketAddr::from(([0, 0, 0, 0], 8080)))?,
        })
    }

    /// Log the effective configuration
    pub fn log(&self) {
        info!("Configuration:");
        info!("  Namespace: {}", self.namespace.as_deref().unwrap_or("all namespaces"));
        info!("  Broker: {}", self.topology.broker);
        info!("  Event store trigger: {}", self.topology.event_store_trigger);
        info!(
            "  MQTT dispatcher: {} -> {}",
            self.topology.dispatcher_exchange, self.topology.dispatcher_queue
        );
        info!(
            "  RabbitMQ cluster: {} (vhost {})",
            self.topology.rabbitmq_cluster, self.topology.rabbitmq_vhost
        );
        info!(
            "  Reconcile: concurrency {}, debounce {:?}, resync {:?}",
            self.concurrency, self.debounce, self.resync
        );
        info!(
            "  Backoff: {}s..{}s",
            self.backoff_min_seconds, self.backoff_max_seconds
        );
        info!("  Metrics address: {}", self.metrics_addr);
    }
}

fn parse<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ControllerError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw.trim().parse().map_err(|e| {
            ControllerError::InvalidConfig(format!("{}={:?}: {}", key, raw, e))
        }),
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Result<ControllerConfig, ControllerError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ControllerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config.namespace, None);
        assert_eq!(config.topology, TopologyConfig::default());
        assert_eq!(config.topology.broker, "ktwin");
        assert_eq!(config.topology.event_store_trigger, "event-store-trigger");
        assert_eq!(config.concurrency, 3);
        assert_eq!(config.debounce, Duration::from_secs(5));
        assert_eq!(config.resync, Duration::from_secs(300));
        assert_eq!(config.backoff_min_seconds, 5);
        assert_eq!(config.backoff_max_seconds, 300);
        assert_eq!(config.metrics_addr.to_string(), "0.0.0.0:8080");
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("WATCH_NAMESPACE", "ktwin"),
            ("KTWIN_BROKER", "city"),
            ("MQTT_DISPATCHER_QUEUE", "dispatcher"),
            ("RECONCILE_CONCURRENCY", "8"),
            ("METRICS_ADDR", "127.0.0.1:9090"),
        ])
        .unwrap();
        assert_eq!(config.namespace.as_deref(), Some("ktwin"));
        assert_eq!(config.topology.broker, "city");
        assert_eq!(config.topology.dispatcher_queue, "dispatcher");
        assert_eq!(config.concurrency, 8);
        assert_eq!(config.metrics_addr.port(), 9090);
    }

    #[test]
    fn test_blank_values_fall_back_to_defaults() {
        let config = config(&[("WATCH_NAMESPACE", ""), ("KTWIN_BROKER", "  ")]).unwrap();
        assert_eq!(config.namespace, None);
        assert_eq!(config.topology.broker, "ktwin");
    }

    #[test]
    fn test_invalid_number_rejected() {
        let err = config(&[("RESYNC_SECONDS", "soon")]).unwrap_err();
        assert!(matches!(err, ControllerError::InvalidConfig(msg) if msg.contains("RESYNC_SECONDS")));
    }

    #[test]
    fn test_invalid_backoff_bounds_rejected() {
        assert!(config(&[("BACKOFF_MIN_SECONDS", "600")]).is_err());
        assert!(config(&[("BACKOFF_MIN_SECONDS", "0")]).is_err());
        assert!(config(&[("RECONCILE_CONCURRENCY", "0")]).is_err());
    }
}
