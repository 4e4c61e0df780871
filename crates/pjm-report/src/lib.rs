//! Migration reports for pjmigrate
//!
//! Collects per-project conversion outcomes into one run-level report,
//! exposes the failure gate and renders the report for the console and for
//! report files.

pub mod error;
pub mod render;
pub mod report;

pub use error::{ReportError, ReportResult};
pub use render::{
    console_supports_color, render, render_json, render_text, write_console, write_report_file,
    ReportFormat, NEXT_STEPS,
};
pub use report::{MigrationReport, ProjectMigrationReport, CONVERTED_PROJECT_EXTENSION};
