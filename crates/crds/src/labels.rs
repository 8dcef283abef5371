//! Well-known label keys
//!
//! The `eventing.knative.dev/*` keys are set by the Knative RabbitMQ broker and
//! trigger reconcilers on the exchanges and queues they provision; the operator
//! only ever reads them.

/// Identity label applied to interfaces, instances and every generated artifact
pub const TWIN_INTERFACE_LABEL: &str = "ktwin/twin-interface";

/// Identity label applied to instances and their dispatch bindings
pub const TWIN_INSTANCE_LABEL: &str = "ktwin/twin-instance";

/// Identity label applied to the event store's Knative Service
pub const EVENT_STORE_LABEL: &str = "ktwin/event-store";

/// Broker identity label on RabbitMQ exchanges and trigger queues
pub const BROKER_LABEL: &str = "eventing.knative.dev/broker";

/// Trigger identity label on RabbitMQ trigger queues
pub const TRIGGER_LABEL: &str = "eventing.knative.dev/trigger";
