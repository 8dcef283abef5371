//! Knative resources created per TwinInterface
//!
//! Only the fields the operator writes or reads are modelled. These types
//! never generate CRDs (the schemas belong to Knative), so schema derivation
//! is disabled.

pub mod service;
pub mod trigger;

pub use service::*;
pub use trigger::*;
