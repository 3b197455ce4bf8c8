use axum::{
    http::{header, HeaderValue, Method},
    routing::{delete, get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};
use tracing::debug;

use crate::api::handlers::{health, patients, PatientServiceHandle};
use crate::openapi::openapi_json;

/// Create the application router around a patient service
pub fn create_app(service: PatientServiceHandle) -> Router {
    debug!("Creating application router");

    let app = Router::new()
        .route("/", get(patients::root))
        .route("/about", get(patients::about))
        .route("/patients", get(patients::list_patients))
        .route("/patients/:patient_id", get(patients::get_patient))
        .route("/sort", get(patients::sort_patients))
        .route("/create_patient", post(patients::create_patient))
        .route("/edit/:patient_id", put(patients::update_patient))
        .route("/delete/:patient_id", delete(patients::delete_patient))
        .route("/health", get(health::health_check))
        .route("/api-docs/openapi.json", get(openapi_json))
        .with_state(service);

    debug!("Patient routes configured");

    configure_security(app).layer(TraceLayer::new_for_http())
}

/// Apply CORS and response security headers
fn configure_security(app: Router) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .max_age(std::time::Duration::from_secs(3600));

    let security_headers = ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ));

    app.layer(cors).layer(security_headers)
}
