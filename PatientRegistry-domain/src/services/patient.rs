use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use patient_registry_data::models::{numeric_attribute, PatientAttributes, Registry};
use patient_registry_data::repository::{JsonFileStore, PatientStore, RepositoryError};

use crate::entities::patient::{Patient, PatientUpdate};
use crate::entities::validation::ValidationReport;
use crate::services::metrics::calculate_bmi;

/// Patient service errors
#[derive(Debug, Error)]
pub enum PatientServiceError {
    /// Payload or merged record failed validation
    #[error("Validation error: {0}")]
    Validation(ValidationReport),

    /// No patient with the given id
    #[error("Patient not found: {0}")]
    NotFound(String),

    /// A patient with the given id is already registered
    #[error("Patient already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid sort field: {0}")]
    InvalidSortField(String),

    #[error("Invalid sort order: {0}")]
    InvalidSortOrder(String),

    /// Registry could not be loaded or saved
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Field a patient listing can be sorted on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Height,
    Weight,
    Bmi,
}

impl SortField {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::Height => "height",
            SortField::Weight => "weight",
            SortField::Bmi => "bmi",
        }
    }

    /// Effective sort key of a stored record.
    ///
    /// BMI is derived from the stored height and weight when both are usable,
    /// falling back to a stored `bmi`. Anything missing counts as 0.
    pub fn key(&self, attributes: &PatientAttributes) -> f64 {
        match self {
            SortField::Height | SortField::Weight => {
                numeric_attribute(attributes, self.as_str()).unwrap_or(0.0)
            }
            SortField::Bmi => {
                let height = numeric_attribute(attributes, "height");
                let weight = numeric_attribute(attributes, "weight");
                match (height, weight) {
                    (Some(height), Some(weight)) if height > 0.0 => calculate_bmi(height, weight),
                    _ => numeric_attribute(attributes, "bmi").unwrap_or(0.0),
                }
            }
        }
    }
}

impl FromStr for SortField {
    type Err = PatientServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "height" => Ok(SortField::Height),
            "weight" => Ok(SortField::Weight),
            "bmi" => Ok(SortField::Bmi),
            other => Err(PatientServiceError::InvalidSortField(other.to_string())),
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction of a sorted listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl FromStr for SortOrder {
    type Err = PatientServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(PatientServiceError::InvalidSortOrder(other.to_string())),
        }
    }
}

/// Trait for patient registry operations
#[async_trait]
pub trait PatientServiceTrait {
    /// The whole registry as stored
    async fn list_patients(&self) -> Result<Registry, PatientServiceError>;

    /// Stored attributes of one patient
    async fn get_patient(&self, id: &str) -> Result<PatientAttributes, PatientServiceError>;

    /// All records ordered by a measurement; ties keep registry order
    async fn sort_patients(
        &self,
        sort_by: SortField,
        order: SortOrder,
    ) -> Result<Vec<PatientAttributes>, PatientServiceError>;

    /// Register a new patient
    async fn create_patient(&self, patient: Patient) -> Result<PatientAttributes, PatientServiceError>;

    /// Apply a partial update and re-validate the merged record
    async fn update_patient(
        &self,
        id: &str,
        update: PatientUpdate,
    ) -> Result<PatientAttributes, PatientServiceError>;

    /// Remove a patient
    async fn delete_patient(&self, id: &str) -> Result<(), PatientServiceError>;
}

/// Patient service over an injected registry store.
///
/// Each operation loads the full registry and, when it changes anything,
/// saves it back. Nothing guards the window between the two: concurrent
/// writers race and the last save wins.
pub struct PatientService<S: PatientStore> {
    store: S,
}

impl<S: PatientStore> PatientService<S> {
    /// Create a new patient service
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

#[async_trait]
impl<S: PatientStore> PatientServiceTrait for PatientService<S> {
    #[instrument(skip(self))]
    async fn list_patients(&self) -> Result<Registry, PatientServiceError> {
        let registry = self.store.load().await?;
        debug!("Loaded {} patients", registry.len());
        Ok(registry)
    }

    #[instrument(skip(self))]
    async fn get_patient(&self, id: &str) -> Result<PatientAttributes, PatientServiceError> {
        let mut registry = self.store.load().await?;
        registry
            .swap_remove(id)
            .ok_or_else(|| PatientServiceError::NotFound(id.to_string()))
    }

    #[instrument(skip(self))]
    async fn sort_patients(
        &self,
        sort_by: SortField,
        order: SortOrder,
    ) -> Result<Vec<PatientAttributes>, PatientServiceError> {
        let registry = self.store.load().await?;
        let mut records: Vec<PatientAttributes> = registry.into_values().collect();

        // `sort_by` is stable; reversing the comparison keeps ties in registry order
        records.sort_by(|a, b| {
            let cmp = sort_by.key(a).total_cmp(&sort_by.key(b));
            match order {
                SortOrder::Asc => cmp,
                SortOrder::Desc => cmp.reverse(),
            }
        });

        Ok(records)
    }

    #[instrument(skip(self, patient), fields(id = %patient.id()))]
    async fn create_patient(&self, patient: Patient) -> Result<PatientAttributes, PatientServiceError> {
        let mut registry = self.store.load().await?;

        if registry.contains_key(patient.id()) {
            warn!("Refusing to overwrite existing patient");
            return Err(PatientServiceError::AlreadyExists(patient.id().to_string()));
        }

        let attributes = patient.to_attributes();
        registry.insert(patient.id().to_string(), attributes.clone());
        self.store.save(&registry).await?;

        info!("Patient created");
        Ok(attributes)
    }

    #[instrument(skip(self, update), fields(provided = ?update.provided_fields()))]
    async fn update_patient(
        &self,
        id: &str,
        update: PatientUpdate,
    ) -> Result<PatientAttributes, PatientServiceError> {
        let mut registry = self.store.load().await?;

        let existing = registry
            .get(id)
            .ok_or_else(|| PatientServiceError::NotFound(id.to_string()))?;

        let mut merged = existing.clone();
        update.apply_to(&mut merged);

        // Rebuild through the full schema so constraints and derived metrics
        // are checked against the new values
        let patient = Patient::from_attributes(id, merged).map_err(PatientServiceError::Validation)?;
        let attributes = patient.to_attributes();

        // Existing key: keeps its position in the registry
        registry.insert(id.to_string(), attributes.clone());
        self.store.save(&registry).await?;

        info!("Patient updated");
        Ok(attributes)
    }

    #[instrument(skip(self))]
    async fn delete_patient(&self, id: &str) -> Result<(), PatientServiceError> {
        let mut registry = self.store.load().await?;

        if registry.shift_remove(id).is_none() {
            return Err(PatientServiceError::NotFound(id.to_string()));
        }
        self.store.save(&registry).await?;

        info!("Patient deleted");
        Ok(())
    }
}

/// Create a patient service backed by the JSON registry file at `path`
pub fn create_patient_service(path: impl Into<PathBuf>) -> PatientService<JsonFileStore> {
    PatientService::new(JsonFileStore::new(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::validation::Schema;
    use mockall::mock;
    use patient_registry_data::repository::InMemoryStore;
    use serde_json::{json, Value};

    mock! {
        pub Store {}

        #[async_trait]
        impl PatientStore for Store {
            async fn load(&self) -> Result<Registry, RepositoryError>;
            async fn save(&self, registry: &Registry) -> Result<(), RepositoryError>;
        }
    }

    fn attributes(value: Value) -> PatientAttributes {
        value.as_object().cloned().expect("object")
    }

    fn record(name: &str, height: f64, weight: f64) -> PatientAttributes {
        attributes(json!({
            "name": name,
            "city": "Mumbai",
            "age": 40,
            "gender": "male",
            "height": height,
            "weight": weight,
            "bmi": calculate_bmi(height, weight),
            "verdict": "Normal"
        }))
    }

    fn registry() -> Registry {
        let mut registry = Registry::new();
        registry.insert("P001".to_string(), record("Ravi", 1.8, 90.0));
        registry.insert("P002".to_string(), record("Neha", 1.6, 45.0));
        registry.insert("P003".to_string(), record("Arjun", 1.75, 70.0));
        registry
    }

    fn patient(id: &str) -> Patient {
        Patient::from_value(json!({
            "id": id,
            "name": "Priya",
            "city": "Chennai",
            "age": 33,
            "gender": "female",
            "height": 1.6,
            "weight": 80.0
        }))
        .unwrap()
    }

    fn names(records: &[PatientAttributes]) -> Vec<&str> {
        records
            .iter()
            .map(|r| r["name"].as_str().unwrap_or_default())
            .collect()
    }

    #[test]
    fn test_parse_sort_params() {
        assert_eq!("bmi".parse::<SortField>().unwrap(), SortField::Bmi);
        assert_eq!("desc".parse::<SortOrder>().unwrap(), SortOrder::Desc);
        assert!(matches!(
            "age".parse::<SortField>(),
            Err(PatientServiceError::InvalidSortField(_))
        ));
        assert!(matches!(
            "up".parse::<SortOrder>(),
            Err(PatientServiceError::InvalidSortOrder(_))
        ));
    }

    #[test]
    fn test_sort_key_defaults_to_zero() {
        let empty = PatientAttributes::new();
        assert_eq!(SortField::Height.key(&empty), 0.0);
        assert_eq!(SortField::Bmi.key(&empty), 0.0);

        let only_bmi = attributes(json!({ "bmi": 21.5 }));
        assert_eq!(SortField::Bmi.key(&only_bmi), 21.5);

        let stale = attributes(json!({ "height": 1.8, "weight": 90, "bmi": 1.0 }));
        assert_eq!(SortField::Bmi.key(&stale), 27.78);
    }

    #[tokio::test]
    async fn test_get_patient() {
        let service = PatientService::new(InMemoryStore::with_registry(registry()));

        let found = service.get_patient("P002").await.unwrap();
        assert_eq!(found["name"], json!("Neha"));

        let missing = service.get_patient("P404").await;
        assert!(matches!(missing, Err(PatientServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_sort_by_bmi() {
        let service = PatientService::new(InMemoryStore::with_registry(registry()));

        let asc = service.sort_patients(SortField::Bmi, SortOrder::Asc).await.unwrap();
        assert_eq!(names(&asc), vec!["Neha", "Arjun", "Ravi"]);

        let desc = service.sort_patients(SortField::Bmi, SortOrder::Desc).await.unwrap();
        assert_eq!(names(&desc), vec!["Ravi", "Arjun", "Neha"]);
    }

    #[tokio::test]
    async fn test_sort_is_stable_in_both_directions() {
        let mut registry = Registry::new();
        registry.insert("A".to_string(), record("first", 1.7, 60.0));
        registry.insert("B".to_string(), record("tall", 1.9, 60.0));
        registry.insert("C".to_string(), record("second", 1.7, 70.0));
        registry.insert("D".to_string(), attributes(json!({ "name": "no height" })));
        registry.insert("E".to_string(), record("third", 1.7, 80.0));
        let service = PatientService::new(InMemoryStore::with_registry(registry));

        let asc = service.sort_patients(SortField::Height, SortOrder::Asc).await.unwrap();
        assert_eq!(names(&asc), vec!["no height", "first", "second", "third", "tall"]);

        let desc = service.sort_patients(SortField::Height, SortOrder::Desc).await.unwrap();
        assert_eq!(names(&desc), vec!["tall", "first", "second", "third", "no height"]);
    }

    #[tokio::test]
    async fn test_create_patient_persists_attributes() {
        let store = InMemoryStore::with_registry(registry());
        let service = PatientService::new(store.clone());

        let created = service.create_patient(patient("P004")).await.unwrap();
        assert_eq!(created["bmi"], json!(31.25));
        assert_eq!(created["verdict"], json!("Obese"));

        let stored = store.snapshot().unwrap();
        assert_eq!(stored.len(), 4);
        assert_eq!(stored.get_index(3).map(|(id, _)| id.as_str()), Some("P004"));
        assert!(stored["P004"].get("id").is_none());
    }

    #[tokio::test]
    async fn test_create_duplicate_does_not_save() {
        let existing = registry();
        let mut store = MockStore::new();
        store
            .expect_load()
            .times(1)
            .returning(move || Ok(existing.clone()));
        store.expect_save().never();

        let service = PatientService::new(store);
        let result = service.create_patient(patient("P001")).await;
        assert!(matches!(result, Err(PatientServiceError::AlreadyExists(id)) if id == "P001"));
    }

    #[tokio::test]
    async fn test_update_missing_patient_does_not_save() {
        let existing = registry();
        let mut store = MockStore::new();
        store
            .expect_load()
            .times(1)
            .returning(move || Ok(existing.clone()));
        store.expect_save().never();

        let service = PatientService::new(store);
        let update = PatientUpdate::from_value(json!({ "weight": 80 })).unwrap();
        let result = service.update_patient("P404", update).await;
        assert!(matches!(result, Err(PatientServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_partial_update_recomputes_metrics() {
        let store = InMemoryStore::with_registry(registry());
        let service = PatientService::new(store.clone());

        let update = PatientUpdate::from_value(json!({ "weight": 100 })).unwrap();
        let updated = service.update_patient("P001", update).await.unwrap();

        assert_eq!(updated["weight"], json!(100.0));
        assert_eq!(updated["bmi"], json!(30.86));
        assert_eq!(updated["verdict"], json!("Obese"));
        for field in ["name", "city", "age", "gender", "height"] {
            assert_eq!(updated[field], registry()["P001"][field], "{} changed", field);
        }

        let stored = store.snapshot().unwrap();
        assert_eq!(stored["P001"], updated);
        // Position in the registry is unchanged
        assert_eq!(stored.get_index(0).map(|(id, _)| id.as_str()), Some("P001"));
    }

    #[tokio::test]
    async fn test_update_that_breaks_record_is_rejected() {
        let store = InMemoryStore::with_registry(registry());
        let service = PatientService::new(store.clone());

        // The update schema has no upper bound, the full record does
        let update = PatientUpdate::from_value(json!({ "age": 150 })).unwrap();
        let result = service.update_patient("P001", update).await;
        match result {
            Err(PatientServiceError::Validation(report)) => {
                assert_eq!(report.fields().collect::<Vec<_>>(), vec!["age"]);
            }
            other => panic!("expected validation error, got {:?}", other),
        }

        // Explicit null is applied and then rejected
        let update = PatientUpdate::from_value(json!({ "name": null })).unwrap();
        let result = service.update_patient("P001", update).await;
        assert!(matches!(result, Err(PatientServiceError::Validation(_))));

        assert_eq!(store.snapshot().unwrap(), registry());
    }

    #[tokio::test]
    async fn test_delete_patient() {
        let store = InMemoryStore::with_registry(registry());
        let service = PatientService::new(store.clone());

        service.delete_patient("P001").await.unwrap();
        let ids: Vec<String> = store.snapshot().unwrap().keys().cloned().collect();
        assert_eq!(ids, vec!["P002", "P003"]);

        let missing = service.get_patient("P001").await;
        assert!(matches!(missing, Err(PatientServiceError::NotFound(_))));

        let again = service.delete_patient("P001").await;
        assert!(matches!(again, Err(PatientServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_storage_failure_is_reported() {
        let mut store = MockStore::new();
        store.expect_load().returning(|| {
            Err(RepositoryError::Io {
                path: PathBuf::from("patients.json"),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            })
        });

        let service = PatientService::new(store);
        let result = service.list_patients().await;
        assert!(matches!(result, Err(PatientServiceError::Repository(_))));
    }
}
