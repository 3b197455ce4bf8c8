// Patient Registry Domain
// This crate contains the business logic for the patient registry

// Domain entities and schemas
pub mod entities;

// Services that implement business logic
pub mod services;

// Re-export the storage layer for convenience
pub use patient_registry_data::{models, repository};
