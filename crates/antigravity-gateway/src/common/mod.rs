//! Shared helpers: model tables, error-text classification, ID generation,
//! JSON-Schema sanitization.

pub mod classify;
pub mod ids;
pub mod json_schema;
pub mod models;
