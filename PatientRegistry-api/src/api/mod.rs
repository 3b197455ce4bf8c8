pub mod extract;
pub mod handlers;
pub mod routes;

use std::sync::Arc;
use axum::Router;
use patient_registry_domain::services::create_patient_service;

use crate::config::AppConfig;

/// Create the application router over the registry file named in `config`
pub fn create_application(config: &AppConfig) -> Router {
    let service = Arc::new(create_patient_service(config.patients_file.clone()));
    routes::create_app(service)
}
