//! KTwin Topology Client
//!
//! Resource client used by the KTwin reconcilers to read twin entities, discover
//! shared broker infrastructure and create routing artifacts.
//!
//! # Example
//!
//! ```no_run
//! use topology_client::{KubeResourceClient, LabelSelector, ResourceClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = KubeResourceClient::new(kube::Client::try_default().await?);
//!
//! // Discover the default broker exchange
//! let selector = LabelSelector::new().with("eventing.knative.dev/broker", "ktwin");
//! let exchanges = client.list_exchanges("ktwin", &selector).await?;
//!
//! // Fetch a twin interface
//! let interface = client.get_twin_interface("ktwin", "temperature-sensor").await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - **Typed operations** per resource kind, behind the `ResourceClient` trait
//! - **Error classification**: 404 and 409 responses surface as `NotFound` and
//!   `AlreadyExists` so callers can treat them as benign
//! - **In-memory fake** (`MockResourceClient`, `test-util` feature) for unit tests

pub mod client;
pub mod error;
pub mod selector;
#[path = "trait.rs"]
pub mod client_trait;
#[cfg(feature = "test-util")]
pub mod mock;

pub use client::KubeResourceClient;
pub use client_trait::ResourceClient;
pub use error::ResourceError;
pub use selector::LabelSelector;
#[cfg(feature = "test-util")]
pub use mock::MockResourceClient;
