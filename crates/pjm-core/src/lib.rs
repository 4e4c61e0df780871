//! pjmigrate core - project.json migration runs
//!
//! Drives a migration run end to end:
//! - Resolves the input into `project.json` descriptors
//! - Converts each one through a [`ProjectConverter`]
//! - Folds the per-project results into a [`MigrationReport`]
//! - On full success, reconciles solutions and backs up legacy artifacts
//!
//! # Example
//!
//! ```rust,no_run
//! use pjm_core::{MigrateConfig, MigrationRun};
//!
//! let config = MigrateConfig::new().with_input("src").with_skip_backup(true);
//! let outcome = MigrationRun::new(config).execute()?;
//!
//! println!("{} projects failed", outcome.report.failed_count());
//! # Ok::<(), pjm_core::MigrateError>(())
//! ```

#![warn(unreachable_pub)]

pub mod backup;
pub mod config;
pub mod converter;
pub mod discovery;
pub mod error;
pub mod manipulator;
pub mod orchestrator;
pub mod reconcile;
pub mod template;

// Re-exports for convenience
pub use backup::digest::FileDigest;
pub use backup::{BackupMove, BackupOutcome, BackupPlan, BACKUP_DIRECTORY_NAME};
pub use config::{MigrateConfig, SolutionEditing, DEFAULT_CONVERTER, DEFAULT_DOTNET};
pub use converter::{CommandConverter, ConversionRequest, ProjectConverter};
pub use discovery::{candidate_solutions, discover, Discovery, DESCRIPTOR_FILE_NAME};
pub use error::{
    BackupError, ConversionError, ManipulationError, MigrateError, MigrateResult, TemplateError,
};
pub use manipulator::{DirectManipulator, DotnetSlnManipulator, SolutionManipulator};
pub use orchestrator::{MigrationRun, Phase, RunOutcome};
pub use reconcile::{
    needs_header_upgrade, remove_stale_folder_items, upgrade_header, ReconcileOutcome,
    ReconcilePlan, Reconciler, UPGRADE_THRESHOLD_MAJOR,
};
pub use template::{DotnetNewTemplate, ExistingTemplate, TemplateProject, TemplateProvisioner};

pub use pjm_report::{MigrationReport, ProjectMigrationReport, ReportFormat};
pub use pjm_solution::{EditOutcome, SolutionFile};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for driving a migration run
    pub use crate::{
        ConversionRequest, EditOutcome, MigrateConfig, MigrateError, MigrationReport,
        MigrationRun, ProjectConverter, ProjectMigrationReport, RunOutcome, SolutionFile,
        SolutionManipulator, TemplateProvisioner,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
