use std::collections::HashMap;
use std::io::{self, Write};

use serde::Serialize;
use serde_json::{json, Value};
use validator::{Validate, ValidationError};

use crate::entities::validation::{
    expect_object, required, validation_error, Schema, ValidationReport,
};

/// Email domains a profile may use
pub const ALLOWED_EMAIL_DOMAINS: [&str; 3] = ["hdfc.com", "gmail.com", "yahoo.com"];

/// Contact profile of a patient, validated declaratively on construction
#[derive(Debug, Clone, PartialEq, Serialize, Validate)]
pub struct PatientProfile {
    /// The name of the patient
    #[validate(length(max = 100, message = "Name cannot exceed 100 characters"))]
    pub name: String,

    #[validate(range(min = 0, max = 120, message = "Age must be between 0 and 120"))]
    pub age: i64,

    #[validate(range(min = 0.0, message = "Weight cannot be negative"))]
    pub weight: f64,

    /// Professional profile page
    #[validate(url(message = "Input should be a valid URL"), custom = "validate_http_url")]
    pub linked_in: String,

    #[validate(email(message = "Value is not a valid email address"), custom = "validate_email_domain")]
    pub email: String,

    pub married: bool,

    pub allergies: Vec<String>,

    /// Contact method name to value, e.g. `phone`
    pub contact: HashMap<String, String>,
}

/// Only addresses on an allowed domain pass. The domain is whatever follows the last `@`.
fn validate_email_domain(email: &str) -> Result<(), ValidationError> {
    let Some((_, domain)) = email.rsplit_once('@') else {
        // Malformed addresses are reported by the email check
        return Ok(());
    };

    if ALLOWED_EMAIL_DOMAINS.contains(&domain) {
        Ok(())
    } else {
        Err(validation_error(
            "email_domain",
            format!(
                "Email domain '{}' is not allowed. Allowed domains: {}",
                domain,
                ALLOWED_EMAIL_DOMAINS.join(", ")
            ),
        ))
    }
}

fn validate_http_url(value: &str) -> Result<(), ValidationError> {
    match url::Url::parse(value) {
        Ok(url) if !matches!(url.scheme(), "http" | "https") => Err(validation_error(
            "url_scheme",
            "URL scheme should be 'http' or 'https'".to_string(),
        )),
        _ => Ok(()),
    }
}

impl Schema for PatientProfile {
    fn from_value(value: Value) -> Result<Self, ValidationReport> {
        let object = expect_object(value)?;
        let mut report = ValidationReport::new();

        let name = required::<String>(&object, "name", &mut report);
        let age = required::<i64>(&object, "age", &mut report);
        let weight = required::<f64>(&object, "weight", &mut report);
        let linked_in = required::<String>(&object, "linked_in", &mut report);
        let email = required::<String>(&object, "email", &mut report);
        let married = required::<bool>(&object, "married", &mut report);
        let allergies = required::<Vec<String>>(&object, "allergies", &mut report);
        let contact = required::<HashMap<String, String>>(&object, "contact", &mut report);

        let profile = PatientProfile {
            name: name.unwrap_or_default(),
            age: age.unwrap_or_default(),
            weight: weight.unwrap_or_default(),
            linked_in: linked_in.unwrap_or_default(),
            email: email.unwrap_or_default(),
            married: married.unwrap_or_default(),
            allergies: allergies.unwrap_or_default(),
            contact: contact.unwrap_or_default(),
        };

        if let Err(errors) = profile.validate() {
            report.extend_from(&errors);
        }

        report.into_result().map(|()| profile)
    }
}

/// Raw values for the sample profile used by the demo
pub fn sample_profile() -> Value {
    json!({
        "name": "Tony",
        "age": 26,
        "weight": 70.5,
        "linked_in": "https://www.linkedin.com/in/tony",
        "email": "tony@yahoo.com",
        "married": false,
        "allergies": ["penicillin"],
        "contact": { "phone": "123-456-7890" }
    })
}

/// Pretend to insert a profile: prints its name and age
pub fn insert_patient<W: Write>(out: &mut W, profile: &PatientProfile) -> io::Result<()> {
    writeln!(out, "{}", profile.name)?;
    writeln!(out, "{}", profile.age)?;
    writeln!(out, "inserted")
}

/// Pretend to update a profile: prints its name and age
pub fn update_patient<W: Write>(out: &mut W, profile: &PatientProfile) -> io::Result<()> {
    writeln!(out, "{}", profile.name)?;
    writeln!(out, "{}", profile.age)?;
    writeln!(out, "updated")
}
