use std::sync::Arc;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use tracing::{info, instrument};
use utoipa::{IntoParams, ToSchema};

use patient_registry_domain::entities::{Patient, PatientUpdate, ValidationReport};
use patient_registry_domain::services::{PatientServiceError, PatientServiceTrait, SortField, SortOrder};

use crate::api::extract::ValidatedJson;
use crate::entities::common::{ErrorResponse, MessageResponse};
use crate::entities::patient::PatientRecord;

/// Service type for dependency injection
pub type PatientServiceHandle = Arc<dyn PatientServiceTrait + Send + Sync>;

/// Query parameters for the sorted listing
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct SortQueryParams {
    /// Sort on the basis of height, weight or bmi
    pub sort_by: Option<String>,

    /// Sort order: asc or desc (default: asc)
    pub order: Option<String>,
}

/// Service banner
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "API banner", body = MessageResponse),
    ),
    tag = "system"
)]
pub async fn root() -> Json<MessageResponse> {
    Json(MessageResponse::new("Patient management system API"))
}

/// Short description of the API
#[utoipa::path(
    get,
    path = "/about",
    responses(
        (status = 200, description = "About the API", body = MessageResponse),
    ),
    tag = "system"
)]
pub async fn about() -> Json<MessageResponse> {
    Json(MessageResponse::new("A simple API to manage patient records"))
}

/// List every patient in the registry, keyed by patient id
#[utoipa::path(
    get,
    path = "/patients",
    responses(
        (status = 200, description = "Full registry", body = std::collections::HashMap<String, PatientRecord>),
        (status = 500, description = "Registry could not be read", body = ErrorResponse),
    ),
    tag = "patients"
)]
#[instrument(skip(service))]
pub async fn list_patients(
    State(service): State<PatientServiceHandle>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let registry = service.list_patients().await?;
    Ok(Json(registry))
}

/// Get a single patient by id
#[utoipa::path(
    get,
    path = "/patients/{patient_id}",
    params(
        ("patient_id" = String, Path, description = "The ID of the patient to retrieve", example = "P001")
    ),
    responses(
        (status = 200, description = "Patient found", body = PatientRecord),
        (status = 404, description = "Patient not found", body = ErrorResponse),
    ),
    tag = "patients"
)]
#[instrument(skip(service))]
pub async fn get_patient(
    State(service): State<PatientServiceHandle>,
    Path(patient_id): Path<String>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let attributes = service.get_patient(&patient_id).await?;
    Ok(Json(attributes))
}

/// List patients ordered by height, weight or bmi
#[utoipa::path(
    get,
    path = "/sort",
    params(SortQueryParams),
    responses(
        (status = 200, description = "Sorted patients", body = [PatientRecord]),
        (status = 400, description = "Invalid sort field or order", body = ErrorResponse),
        (status = 422, description = "Missing sort field", body = ErrorResponse),
    ),
    tag = "patients"
)]
#[instrument(skip(service))]
pub async fn sort_patients(
    State(service): State<PatientServiceHandle>,
    Query(params): Query<SortQueryParams>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let sort_by: SortField = params
        .sort_by
        .ok_or_else(|| {
            PatientServiceError::Validation(ValidationReport::single("sort_by", "Field required"))
        })?
        .parse()?;
    let order = params
        .order
        .as_deref()
        .map(str::parse::<SortOrder>)
        .transpose()?
        .unwrap_or_default();

    let records = service.sort_patients(sort_by, order).await?;
    Ok(Json(records))
}

/// Register a new patient
#[utoipa::path(
    post,
    path = "/create_patient",
    request_body = Patient,
    responses(
        (status = 201, description = "Patient created", body = MessageResponse),
        (status = 400, description = "Patient already exists", body = ErrorResponse),
        (status = 422, description = "Invalid patient", body = ErrorResponse),
    ),
    tag = "patients"
)]
#[instrument(skip(service, patient), fields(id = %patient.id()))]
pub async fn create_patient(
    State(service): State<PatientServiceHandle>,
    ValidatedJson(patient): ValidatedJson<Patient>,
) -> Result<impl IntoResponse, ErrorResponse> {
    service.create_patient(patient).await?;
    info!("Created patient");
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("Patient created successfully")),
    ))
}

/// Update some fields of an existing patient
#[utoipa::path(
    put,
    path = "/edit/{patient_id}",
    params(
        ("patient_id" = String, Path, description = "The ID of the patient to update", example = "P001")
    ),
    request_body = PatientUpdate,
    responses(
        (status = 200, description = "Patient updated", body = MessageResponse),
        (status = 404, description = "Patient not found", body = ErrorResponse),
        (status = 422, description = "Invalid update or resulting record", body = ErrorResponse),
    ),
    tag = "patients"
)]
#[instrument(skip(service, update))]
pub async fn update_patient(
    State(service): State<PatientServiceHandle>,
    Path(patient_id): Path<String>,
    ValidatedJson(update): ValidatedJson<PatientUpdate>,
) -> Result<impl IntoResponse, ErrorResponse> {
    service.update_patient(&patient_id, update).await?;
    Ok((StatusCode::OK, Json(MessageResponse::new("patient updated"))))
}

/// Remove a patient
#[utoipa::path(
    delete,
    path = "/delete/{patient_id}",
    params(
        ("patient_id" = String, Path, description = "The ID of the patient to delete", example = "P001")
    ),
    responses(
        (status = 200, description = "Patient deleted", body = MessageResponse),
        (status = 404, description = "Patient not found", body = ErrorResponse),
    ),
    tag = "patients"
)]
#[instrument(skip(service))]
pub async fn delete_patient(
    State(service): State<PatientServiceHandle>,
    Path(patient_id): Path<String>,
) -> Result<impl IntoResponse, ErrorResponse> {
    service.delete_patient(&patient_id).await?;
    Ok((
        StatusCode::OK,
        Json(MessageResponse::new("Patient deleted successfully")),
    ))
}
