// Repository module structure
pub mod errors;
mod in_memory;
mod json_file;
mod patient;

// Re-export commonly used types
pub use errors::RepositoryError;
pub use in_memory::InMemoryStore;
pub use json_file::JsonFileStore;
pub use patient::PatientStore;
