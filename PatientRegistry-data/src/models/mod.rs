// Storage models for the registry document
pub mod registry;

// Re-export common types for easier imports
pub use registry::{numeric_attribute, PatientAttributes, Registry};
