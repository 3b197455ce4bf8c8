use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use validator::Validate;

#[cfg(feature = "with-api")]
use utoipa::ToSchema;

use patient_registry_data::models::PatientAttributes;

use crate::entities::validation::{
    decode_as, expect_object, provided, require_positive, required, FieldValue, Schema,
    ValidationReport,
};
use crate::services::metrics::{calculate_bmi, categorize_bmi};

/// Gender accepted for a patient record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Others,
}

/// Gender accepted by a partial update. `others` cannot be set this way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum UpdateGender {
    Male,
    Female,
}

impl FieldValue for Gender {
    fn from_json(value: &Value) -> Result<Self, &'static str> {
        decode_as(value, "Input should be 'male', 'female' or 'others'")
    }
}

impl FieldValue for UpdateGender {
    fn from_json(value: &Value) -> Result<Self, &'static str> {
        decode_as(value, "Input should be 'male' or 'female'")
    }
}

impl From<UpdateGender> for Gender {
    fn from(gender: UpdateGender) -> Self {
        match gender {
            UpdateGender::Male => Gender::Male,
            UpdateGender::Female => Gender::Female,
        }
    }
}

/// Qualitative verdict derived from the body-mass index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub enum Verdict {
    Underweight,
    Normal,
    Obese,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Underweight => "Underweight",
            Verdict::Normal => "Normal",
            Verdict::Obese => "Obese",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated patient record.
///
/// Only obtainable through [`Schema::from_value`], so every instance satisfies
/// the field constraints. `bmi` and `verdict` are computed from the current
/// height and weight and cannot be supplied or changed on their own.
#[derive(Debug, Clone, PartialEq, Validate)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct Patient {
    /// ID of the patient
    #[cfg_attr(feature = "with-api", schema(example = "P001"))]
    id: String,

    /// Name of the patient
    name: String,

    /// City where the patient is living
    city: String,

    /// Age of the patient
    #[validate(range(min = 1, max = 119, message = "Age must be between 1 and 119"))]
    age: i64,

    /// Gender of the patient
    gender: Gender,

    /// Height of the patient in meters
    height: f64,

    /// Weight of the patient in kilograms
    weight: f64,
}

impl Patient {
    /// Rebuild a patient from stored attributes under the given id
    pub fn from_attributes(
        id: &str,
        mut attributes: PatientAttributes,
    ) -> Result<Self, ValidationReport> {
        attributes.insert("id".to_string(), Value::String(id.to_string()));
        Self::from_value(Value::Object(attributes))
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn age(&self) -> i64 {
        self.age
    }

    pub fn gender(&self) -> Gender {
        self.gender
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// Body-mass index rounded to 2 decimals
    pub fn bmi(&self) -> f64 {
        calculate_bmi(self.height, self.weight)
    }

    pub fn verdict(&self) -> Verdict {
        categorize_bmi(self.bmi())
    }

    /// Attributes as stored in the registry: every field except the id, plus
    /// the derived `bmi` and `verdict`
    pub fn to_attributes(&self) -> PatientAttributes {
        let mut attributes = PatientAttributes::new();
        attributes.insert("name".to_string(), json!(self.name));
        attributes.insert("city".to_string(), json!(self.city));
        attributes.insert("age".to_string(), json!(self.age));
        attributes.insert("gender".to_string(), json!(self.gender));
        attributes.insert("height".to_string(), json!(self.height));
        attributes.insert("weight".to_string(), json!(self.weight));
        attributes.insert("bmi".to_string(), json!(self.bmi()));
        attributes.insert("verdict".to_string(), json!(self.verdict()));
        attributes
    }
}

impl Schema for Patient {
    fn from_value(value: Value) -> Result<Self, ValidationReport> {
        let object = expect_object(value)?;
        let mut report = ValidationReport::new();

        let id = required::<String>(&object, "id", &mut report);
        let name = required::<String>(&object, "name", &mut report);
        let city = required::<String>(&object, "city", &mut report);
        let age = required::<i64>(&object, "age", &mut report);
        let gender = required::<Gender>(&object, "gender", &mut report);
        let height = required::<f64>(&object, "height", &mut report);
        let weight = required::<f64>(&object, "weight", &mut report);

        // Fields that failed to decode get placeholders; their constraint
        // checks are skipped by the report.
        let patient = Patient {
            id: id.unwrap_or_default(),
            name: name.unwrap_or_default(),
            city: city.unwrap_or_default(),
            age: age.unwrap_or_default(),
            gender: gender.unwrap_or(Gender::Others),
            height: height.unwrap_or_default(),
            weight: weight.unwrap_or_default(),
        };

        if let Err(errors) = patient.validate() {
            report.extend_from(&errors);
        }
        require_positive(&mut report, "height", patient.height);
        require_positive(&mut report, "weight", patient.weight);

        // A vanishing height overflows the index to infinity
        if report.messages("height").is_empty()
            && report.messages("weight").is_empty()
            && !patient.bmi().is_finite()
        {
            report.add("height", "Height and weight do not give a finite body-mass index");
        }

        report.into_result().map(|()| patient)
    }
}

/// Partial update of a patient record.
///
/// The outer `Option` of each field records whether the key was present in
/// the payload; only present fields are applied. An explicit `null` is
/// present and is applied as `null`, which the merged record then rejects.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct PatientUpdate {
    #[cfg_attr(feature = "with-api", schema(value_type = Option<String>))]
    pub name: Option<Option<String>>,

    #[cfg_attr(feature = "with-api", schema(value_type = Option<String>))]
    pub city: Option<Option<String>>,

    #[cfg_attr(feature = "with-api", schema(value_type = Option<i64>, minimum = 1))]
    pub age: Option<Option<i64>>,

    #[cfg_attr(feature = "with-api", schema(value_type = Option<UpdateGender>))]
    pub gender: Option<Option<UpdateGender>>,

    #[cfg_attr(feature = "with-api", schema(value_type = Option<f64>))]
    pub height: Option<Option<f64>>,

    #[cfg_attr(feature = "with-api", schema(value_type = Option<f64>))]
    pub weight: Option<Option<f64>>,
}

impl PatientUpdate {
    /// Names of the fields present in the payload
    pub fn provided_fields(&self) -> Vec<&'static str> {
        [
            ("name", self.name.is_some()),
            ("city", self.city.is_some()),
            ("age", self.age.is_some()),
            ("gender", self.gender.is_some()),
            ("height", self.height.is_some()),
            ("weight", self.weight.is_some()),
        ]
        .into_iter()
        .filter_map(|(field, present)| present.then_some(field))
        .collect()
    }

    /// Overwrite the provided fields in `attributes`, leaving everything else untouched
    pub fn apply_to(&self, attributes: &mut PatientAttributes) {
        fn set<T: Serialize>(attributes: &mut PatientAttributes, key: &str, value: &Option<Option<T>>) {
            if let Some(value) = value {
                attributes.insert(key.to_string(), json!(value));
            }
        }

        set(attributes, "name", &self.name);
        set(attributes, "city", &self.city);
        set(attributes, "age", &self.age);
        set(attributes, "gender", &self.gender);
        set(attributes, "height", &self.height);
        set(attributes, "weight", &self.weight);
    }
}

impl Schema for PatientUpdate {
    fn from_value(value: Value) -> Result<Self, ValidationReport> {
        let object = expect_object(value)?;
        let mut report = ValidationReport::new();

        let update = PatientUpdate {
            name: provided(&object, "name", &mut report),
            city: provided(&object, "city", &mut report),
            age: provided(&object, "age", &mut report),
            gender: provided(&object, "gender", &mut report),
            height: provided(&object, "height", &mut report),
            weight: provided(&object, "weight", &mut report),
        };

        if let Some(Some(age)) = update.age {
            if age <= 0 {
                report.add("age", "Input should be greater than 0");
            }
        }
        if let Some(Some(height)) = update.height {
            require_positive(&mut report, "height", height);
        }
        if let Some(Some(weight)) = update.weight {
            require_positive(&mut report, "weight", weight);
        }

        report.into_result().map(|()| update)
    }
}
