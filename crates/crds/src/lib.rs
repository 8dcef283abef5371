//! KTwin CRD Definitions
//!
//! Kubernetes Custom Resource Definitions for the KTwin operator, plus typed
//! views of the external resources it creates or discovers:
//! - `TwinInterface` / `TwinInstance` (owned by this operator)
//! - `EventStore` (owned by this operator)
//! - Knative `Service` and `Trigger` (created per interface)
//! - RabbitMQ topology `Exchange`, `Queue` (discovered) and `Binding` (created)

pub mod event_store;
pub mod labels;
pub mod phase;
pub mod twin_interface;
pub mod twin_instance;
pub mod knative;
pub mod rabbitmq;

pub use event_store::*;
pub use phase::*;
pub use twin_interface::*;
pub use twin_instance::*;
pub use knative::*;
pub use rabbitmq::*;
