// Patient Registry Data
// This crate handles persistence of the patient registry

// Registry storage models
pub mod models;

// Store implementations for registry access
pub mod repository;
