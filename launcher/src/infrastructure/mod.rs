//! Infrastructure layer
//!
//! Service wiring and lifecycle

pub mod service_container;

pub use service_container::ServiceContainer;
