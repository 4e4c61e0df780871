//! Migration run orchestrator
//!
//! Linear phase sequence:
//! `Discover → ConvertEach → Aggregate → Gate → [ReconcileSolution, Backup] → Report`
//!
//! Every project is attempted exactly once. Reconciliation and backup only run
//! when no project failed.

use crate::backup::{BackupOutcome, BackupPlan};
use crate::config::{MigrateConfig, SolutionEditing};
use crate::converter::{CommandConverter, ConversionRequest, ProjectConverter};
use crate::discovery::{candidate_solutions, discover, Discovery};
use crate::error::{MigrateError, MigrateResult};
use crate::manipulator::{DirectManipulator, DotnetSlnManipulator, SolutionManipulator};
use crate::reconcile::{ReconcileOutcome, Reconciler};
use crate::template::{DotnetNewTemplate, ExistingTemplate, TemplateProvisioner};
use pjm_report::{write_console, write_report_file, MigrationReport};
use std::fmt::{self, Display, Formatter};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Run phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Resolve the input into descriptors
    Discover,
    /// Convert every descriptor
    ConvertEach,
    /// Fold per-project reports and print them
    Aggregate,
    /// Check the failure count
    Gate,
    /// Bring solutions in line with the report
    ReconcileSolution,
    /// Move legacy artifacts out of the tree
    Backup,
    /// Final status
    Report,
}

impl Display for Phase {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Discover => "discover",
            Self::ConvertEach => "convert",
            Self::Aggregate => "aggregate",
            Self::Gate => "gate",
            Self::ReconcileSolution => "reconcile",
            Self::Backup => "backup",
            Self::Report => "report",
        };
        f.write_str(name)
    }
}

/// Result of a completed run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOutcome {
    /// Aggregated report
    pub report: MigrationReport,
    /// Solutions reconciled (empty when the gate failed)
    pub reconciled: Vec<ReconcileOutcome>,
    /// Backup performed, if any
    pub backup: Option<BackupOutcome>,
}

impl RunOutcome {
    /// Process exit code: the failed project count
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        i32::try_from(self.report.failed_count()).unwrap_or(i32::MAX)
    }
}

/// One migration run with its collaborators
pub struct MigrationRun {
    config: MigrateConfig,
    converter: Box<dyn ProjectConverter>,
    templates: Box<dyn TemplateProvisioner>,
    manipulator: Box<dyn SolutionManipulator>,
    console: Box<dyn Write>,
}

impl MigrationRun {
    /// Create a run with the process-backed collaborators the config names
    #[must_use]
    pub fn new(config: MigrateConfig) -> Self {
        let converter = CommandConverter::new(config.converter_program.clone());
        let templates: Box<dyn TemplateProvisioner> = match &config.template_file {
            Some(path) => Box::new(ExistingTemplate(path.clone())),
            None => Box::new(DotnetNewTemplate::new(config.dotnet_program.clone())),
        };
        let manipulator: Box<dyn SolutionManipulator> = match config.solution_editing {
            SolutionEditing::Direct => Box::new(DirectManipulator),
            SolutionEditing::External => Box::new(DotnetSlnManipulator::new(config.dotnet_program.clone())),
        };
        Self {
            config,
            converter: Box::new(converter),
            templates,
            manipulator,
            console: Box::new(std::io::stdout()),
        }
    }

    /// Replace the conversion capability
    #[must_use]
    pub fn with_converter(mut self, converter: impl ProjectConverter + 'static) -> Self {
        self.converter = Box::new(converter);
        self
    }

    /// Replace the template provisioning capability
    #[must_use]
    pub fn with_template_provisioner(mut self, templates: impl TemplateProvisioner + 'static) -> Self {
        self.templates = Box::new(templates);
        self
    }

    /// Replace the solution manipulation capability
    #[must_use]
    pub fn with_manipulator(mut self, manipulator: impl SolutionManipulator + 'static) -> Self {
        self.manipulator = Box::new(manipulator);
        self
    }

    /// Replace the console sink
    #[must_use]
    pub fn with_console(mut self, console: impl Write + 'static) -> Self {
        self.console = Box::new(console);
        self
    }

    /// Run configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &MigrateConfig {
        &self.config
    }

    /// Execute every phase
    ///
    /// # Errors
    /// Returns error on invalid input, environment failures of a collaborator,
    /// solution edit failures, backup conflicts or report output failures.
    /// Per-project conversion problems are not errors; they land in the report.
    pub fn execute(&mut self) -> MigrateResult<RunOutcome> {
        enter(Phase::Discover);
        let Discovery {
            working_root,
            descriptors,
            solution,
        } = discover(&self.config.input)?;

        enter(Phase::ConvertEach);
        let report = self.convert_each(&descriptors, solution.as_ref().map(|s| s.path()))?;

        enter(Phase::Aggregate);
        self.write_reports(&report)?;

        enter(Phase::Gate);
        let mut outcome = RunOutcome {
            report,
            ..RunOutcome::default()
        };
        if !outcome.report.is_success() {
            tracing::warn!(
                "{} of {} projects failed; solution and legacy files left untouched",
                outcome.report.failed_count(),
                outcome.report.total_count()
            );
            enter(Phase::Report);
            return Ok(outcome);
        }

        enter(Phase::ReconcileSolution);
        let mut solutions = match solution {
            Some(named) => vec![named],
            None => candidate_solutions(&working_root),
        };
        let reconciler = Reconciler::new(&*self.manipulator);
        for solution in &mut solutions {
            if let Some(reconciled) = reconciler.reconcile(&outcome.report, solution)? {
                outcome.reconciled.push(reconciled);
            }
        }

        enter(Phase::Backup);
        if self.config.skip_backup {
            tracing::info!("Backup skipped");
        } else {
            let directories = outcome.report.project_directories();
            let backup = BackupPlan::new(&directories, &working_root)?.perform()?;
            writeln!(self.console, "Files backed up to {}", backup.root.display())
                .map_err(|e| MigrateError::io_error(&backup.root, e))?;
            outcome.backup = Some(backup);
        }

        enter(Phase::Report);
        Ok(outcome)
    }

    fn convert_each(&self, descriptors: &[PathBuf], solution: Option<&Path>) -> MigrateResult<MigrationReport> {
        let template = self.templates.provision()?;
        tracing::debug!("Using template project {}", template.path().display());

        let mut report = MigrationReport::new();
        for descriptor in descriptors {
            let Some(project_directory) = descriptor.parent() else {
                continue;
            };
            let request = ConversionRequest {
                project_directory: project_directory.to_path_buf(),
                output_directory: project_directory.to_path_buf(),
                template_project: template.path().to_path_buf(),
                xproj_file: self.config.xproj_file.clone(),
                sdk_package_version: self.config.sdk_package_version.clone(),
                skip_project_references: self.config.skip_project_references,
                solution_file: solution.map(Path::to_path_buf),
            };
            let converted = self.converter.convert(&request)?;
            if converted.succeeded() {
                tracing::info!("Converted {}", project_directory.display());
            } else {
                tracing::warn!("Conversion failed for {}", project_directory.display());
            }
            report = report.merge(converted.into());
        }
        Ok(report)
    }

    fn write_reports(&mut self, report: &MigrationReport) -> MigrateResult<()> {
        if let Some(path) = &self.config.report_file {
            write_report_file(report, path, self.config.report_format)?;
            tracing::info!("Report written to {}", path.display());
        }
        write_console(report, self.console.as_mut(), self.config.colored)?;
        Ok(())
    }
}

fn enter(phase: Phase) {
    tracing::info!("Entering phase {}", phase);
}
