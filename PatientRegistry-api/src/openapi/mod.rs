use axum::Json;
use utoipa::OpenApi;

// API Documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::api::handlers::health::health_check,

        crate::api::handlers::patients::root,
        crate::api::handlers::patients::about,
        crate::api::handlers::patients::list_patients,
        crate::api::handlers::patients::get_patient,
        crate::api::handlers::patients::sort_patients,
        crate::api::handlers::patients::create_patient,
        crate::api::handlers::patients::update_patient,
        crate::api::handlers::patients::delete_patient,
    ),
    components(
        schemas(
            crate::entities::common::ErrorResponse,
            crate::entities::common::MessageResponse,
            crate::entities::patient::PatientRecord,

            crate::api::handlers::health::HealthResponse,
            crate::api::handlers::health::ComponentStatus,
            crate::api::handlers::health::ComponentHealthStatus,

            patient_registry_domain::entities::Patient,
            patient_registry_domain::entities::PatientUpdate,
            patient_registry_domain::entities::Gender,
            patient_registry_domain::entities::UpdateGender,
            patient_registry_domain::entities::Verdict,
        )
    ),
    tags(
        (name = "system", description = "Service information"),
        (name = "patients", description = "Patient registry endpoints"),
        (name = "health", description = "Health check endpoint")
    ),
    info(
        title = "Patient Registry API",
        version = "0.1.0",
        description = "API to manage patient records stored in a JSON registry",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        ),
    ),
    servers(
        (url = "/", description = "Local development server")
    )
)]
pub struct ApiDoc;

/// Serve the generated OpenAPI document
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_doc_generation() {
        let openapi = ApiDoc::openapi();

        assert_eq!(openapi.info.title, "Patient Registry API");
        assert_eq!(openapi.info.version, "0.1.0");

        let tags = openapi.tags.as_ref().unwrap();
        assert!(tags.iter().any(|tag| tag.name == "patients"));

        for path in [
            "/",
            "/about",
            "/patients",
            "/patients/{patient_id}",
            "/sort",
            "/create_patient",
            "/edit/{patient_id}",
            "/delete/{patient_id}",
            "/health",
        ] {
            assert!(openapi.paths.paths.contains_key(path), "missing path {}", path);
        }
    }

    #[test]
    fn test_schemas_registered() {
        let openapi = ApiDoc::openapi();
        let schemas = &openapi.components.as_ref().unwrap().schemas;

        assert!(schemas.contains_key("Patient"));
        assert!(schemas.contains_key("PatientUpdate"));
        assert!(schemas.contains_key("ErrorResponse"));
    }
}
