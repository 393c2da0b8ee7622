//! Business logic services.
//!
//! Services orchestrate the storage seams in [`crate::db`] and are shared by
//! the HTTP routes and the CLI.

pub mod ingest;

pub use ingest::{
    FieldError, FirstInstallReport, IngestError, IngestOutcome, ReportIngestor, ValidReport,
    ValidationErrors,
};
