pub mod metrics;
pub mod patient;

// Domain services
// This module contains business logic implementations.

// Re-export service traits and factory functions
pub use patient::{
    create_patient_service, PatientService, PatientServiceError, PatientServiceTrait, SortField,
    SortOrder,
};
