use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use validator::{ValidationError, ValidationErrors};

/// Key used for problems that concern the payload as a whole
pub const BODY_FIELD: &str = "body";

/// Field-level validation failures, keyed by field name.
///
/// A report lists every failing field with all of its messages, so callers
/// can show the complete picture in one response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationReport(BTreeMap<String, Vec<String>>);

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report with a single message
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut report = Self::new();
        report.add(field, message);
        report
    }

    /// Record a failure for a field
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Names of the failing fields, sorted
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Messages recorded for a field
    pub fn messages(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    /// Fold constraint failures reported by `validator` into this report.
    ///
    /// Fields that already failed keep only their earlier messages, so a value
    /// that could not be decoded is not also reported as out of range.
    pub fn extend_from(&mut self, errors: &ValidationErrors) {
        for (field, errors) in errors.field_errors() {
            if self.0.contains_key(field) {
                continue;
            }
            for err in errors {
                let message = err
                    .message
                    .as_ref()
                    .map(|msg| msg.to_string())
                    .unwrap_or_else(|| format!("Invalid {}", field));
                self.add(field, message);
            }
        }
    }

    /// `Ok` when nothing was recorded
    pub fn into_result(self) -> Result<(), ValidationReport> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|(field, messages)| format!("{}: {}", field, messages.join(", ")))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

impl std::error::Error for ValidationReport {}

/// Types that can only be built from raw JSON by passing validation.
///
/// Construction is all-or-nothing: either a fully valid value or a report
/// naming every failing field.
pub trait Schema: Sized {
    fn from_value(value: Value) -> Result<Self, ValidationReport>;
}

/// Unwrap the payload as a JSON object
pub(crate) fn expect_object(value: Value) -> Result<Map<String, Value>, ValidationReport> {
    match value {
        Value::Object(object) => Ok(object),
        _ => Err(ValidationReport::single(
            BODY_FIELD,
            "Input should be a valid object",
        )),
    }
}

/// A type a schema field decodes into.
///
/// Conversion is lax the way form and query input usually is: numbers may
/// arrive as numeric strings, integers as integral floats. The error is the
/// message shown to the client.
pub(crate) trait FieldValue: Sized {
    fn from_json(value: &Value) -> Result<Self, &'static str>;
}

/// Strict serde decoding with a fixed message on failure
pub(crate) fn decode_as<T: DeserializeOwned>(
    value: &Value,
    message: &'static str,
) -> Result<T, &'static str> {
    T::deserialize(value).map_err(|_| message)
}

impl FieldValue for String {
    fn from_json(value: &Value) -> Result<Self, &'static str> {
        match value {
            Value::String(text) => Ok(text.clone()),
            _ => Err("Input should be a valid string"),
        }
    }
}

impl FieldValue for bool {
    fn from_json(value: &Value) -> Result<Self, &'static str> {
        const INVALID: &str = "Input should be a valid boolean";
        match value {
            Value::Bool(flag) => Ok(*flag),
            Value::Number(number) => match number.as_i64() {
                Some(0) => Ok(false),
                Some(1) => Ok(true),
                _ => Err(INVALID),
            },
            Value::String(text) => match text.trim().to_ascii_lowercase().as_str() {
                "true" | "t" | "yes" | "y" | "on" | "1" => Ok(true),
                "false" | "f" | "no" | "n" | "off" | "0" => Ok(false),
                _ => Err(INVALID),
            },
            _ => Err(INVALID),
        }
    }
}

impl FieldValue for i64 {
    fn from_json(value: &Value) -> Result<Self, &'static str> {
        const INVALID: &str = "Input should be a valid integer";
        match value {
            Value::Number(number) => match number.as_i64() {
                Some(int) => Ok(int),
                None => number.as_f64().ok_or(INVALID).and_then(integral),
            },
            Value::String(text) => text
                .trim()
                .parse()
                .map_err(|_| "Input should be a valid integer, unable to parse string as an integer"),
            _ => Err(INVALID),
        }
    }
}

/// Integer value of a float with no fractional part
fn integral(value: f64) -> Result<i64, &'static str> {
    if value.fract() != 0.0 {
        Err("Input should be a valid integer, got a number with a fractional part")
    } else if !(value >= i64::MIN as f64 && value < i64::MAX as f64) {
        Err("Input should be a valid integer")
    } else {
        Ok(value as i64)
    }
}

impl FieldValue for f64 {
    fn from_json(value: &Value) -> Result<Self, &'static str> {
        match value {
            Value::Number(number) => number.as_f64().ok_or("Input should be a valid number"),
            Value::String(text) => text
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|number| number.is_finite())
                .ok_or("Input should be a valid number, unable to parse string as a number"),
            _ => Err("Input should be a valid number"),
        }
    }
}

impl FieldValue for Vec<String> {
    fn from_json(value: &Value) -> Result<Self, &'static str> {
        decode_as(value, "Input should be a valid list of strings")
    }
}

impl FieldValue for HashMap<String, String> {
    fn from_json(value: &Value) -> Result<Self, &'static str> {
        decode_as(value, "Input should be a valid dictionary of strings")
    }
}

/// Decode a required field, recording a failure when it is missing or has the wrong type
pub(crate) fn required<T: FieldValue>(
    object: &Map<String, Value>,
    field: &str,
    report: &mut ValidationReport,
) -> Option<T> {
    match object.get(field) {
        Some(value) => decode(value, field, report),
        None => {
            report.add(field, "Field required");
            None
        }
    }
}

/// Decode a field that may be left out.
///
/// The outer `Option` tells whether the key was present at all; an explicit
/// `null` comes back as `Some(None)`.
pub(crate) fn provided<T: FieldValue>(
    object: &Map<String, Value>,
    field: &str,
    report: &mut ValidationReport,
) -> Option<Option<T>> {
    match object.get(field)? {
        Value::Null => Some(None),
        value => decode(value, field, report).map(Some),
    }
}

fn decode<T: FieldValue>(
    value: &Value,
    field: &str,
    report: &mut ValidationReport,
) -> Option<T> {
    match T::from_json(value) {
        Ok(decoded) => Some(decoded),
        Err(message) => {
            report.add(field, message);
            None
        }
    }
}

/// Check that a measurement is strictly positive, unless the field already failed
pub(crate) fn require_positive(
    report: &mut ValidationReport,
    field: &str,
    value: f64,
) {
    if report.messages(field).is_empty() && !(value > 0.0) {
        report.add(field, "Input should be greater than 0");
    }
}

/// Build a `ValidationError` carrying a human readable message
pub(crate) fn validation_error(code: &'static str, message: String) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Owned(message));
    err
}
