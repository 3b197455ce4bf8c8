pub mod health;
pub mod patients;

// Re-export handlers for easier imports
pub use health::health_check;
pub use patients::{
    about, create_patient, delete_patient, get_patient, list_patients, root, sort_patients,
    update_patient, PatientServiceHandle,
};
