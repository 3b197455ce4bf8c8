use axum::{
    async_trait,
    extract::{FromRequest, Request},
    Json,
};
use serde_json::Value;
use tracing::warn;

use patient_registry_domain::entities::Schema;
use patient_registry_domain::services::PatientServiceError;

use crate::entities::common::ErrorResponse;

/// JSON body that has passed schema validation.
///
/// Malformed JSON and schema failures are both rejected with 422 and an
/// `ErrorResponse` body, before the handler runs.
#[derive(Debug)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: Schema + Send,
    S: Send + Sync,
{
    type Rejection = ErrorResponse;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<Value>::from_request(req, state)
            .await
            .map_err(|rejection| {
                warn!("Rejected request body: {}", rejection.body_text());
                ErrorResponse::validation_error(&rejection.body_text(), None)
            })?;

        T::from_value(value).map(ValidatedJson).map_err(|report| {
            warn!("Request body failed validation: {}", report);
            ErrorResponse::from(PatientServiceError::Validation(report))
        })
    }
}
