// Public entities for the patient registry API
// This module contains data structures that are shared across the application boundary

// Common entities for messages and error handling
pub mod common;

// Patient record representation
pub mod patient;
