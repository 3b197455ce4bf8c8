use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Public representation of a stored patient record.
///
/// The patient id is the key the record is stored under and is not part
/// of the record itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PatientRecord {
    /// Name of the patient
    pub name: String,

    /// City where the patient is living
    pub city: String,

    /// Age of the patient
    pub age: i64,

    /// Gender of the patient (male, female or others)
    pub gender: String,

    /// Height in meters
    pub height: f64,

    /// Weight in kilograms
    pub weight: f64,

    /// Body-mass index derived from height and weight
    pub bmi: f64,

    /// Underweight, Normal or Obese
    pub verdict: String,
}
