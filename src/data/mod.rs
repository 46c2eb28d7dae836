//! Tabular interchange with the ingestion and reporting collaborators.

pub mod relations;
pub mod reports;
pub mod tables;
