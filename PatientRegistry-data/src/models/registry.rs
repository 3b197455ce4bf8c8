use indexmap::IndexMap;
use serde_json::{Map, Value};

/// Attributes stored for a single patient.
///
/// The patient id is the registry key and is never duplicated inside the
/// attribute object. Field order is preserved as read from the document.
pub type PatientAttributes = Map<String, Value>;

/// The whole registry document: patient id to stored attributes, in
/// insertion order.
pub type Registry = IndexMap<String, PatientAttributes>;

/// Read a numeric attribute, treating missing or non-numeric values as absent
pub fn numeric_attribute(attributes: &PatientAttributes, key: &str) -> Option<f64> {
    attributes.get(key).and_then(Value::as_f64)
}
