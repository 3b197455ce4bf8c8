// patient_registry_api lib.rs
//
// HTTP layer of the patient registry: router, handlers, configuration
// and the OpenAPI document.

// Public modules
pub mod api;
pub mod config;
pub mod entities;
pub mod openapi;
