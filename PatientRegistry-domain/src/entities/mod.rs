// Domain entities and value objects
pub mod patient;
pub mod profile;
pub mod validation;

// Re-export common types for easier imports
pub use patient::{Gender, Patient, PatientUpdate, UpdateGender, Verdict};
pub use profile::PatientProfile;
pub use validation::{Schema, ValidationReport};
