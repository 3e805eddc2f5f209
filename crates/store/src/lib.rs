//! Record store for providers, models and health checks.
//!
//! The engine talks to the store only through the repository traits in
//! [`repository`]; [`JsonRecordStore`] is the file-backed implementation
//! used by the gateway and the tests.

pub mod json;
pub mod manager;
pub mod repository;

pub use json::JsonRecordStore;
pub use manager::ModelManager;
pub use repository::{HealthRepository, ModelFilter, ModelRepository, ProviderRepository};
