//! End-to-end migration runs against on-disk workspaces

use pjm_core::{
    MigrateConfig, MigrateError, MigrationRun, ManipulationError, ReportFormat, RunOutcome,
};
use pjm_test_utils::{
    legacy_solution, solution_with_converted_a, ManipulatorCall, RecordingManipulator, Script,
    ScriptedConverter, SharedBuffer, StaticTemplate, WorkspaceBuilder, CURRENT_HEADER, CSHARP, DNX,
};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

struct Harness {
    converter: ScriptedConverter,
    manipulator: RecordingManipulator,
    console: SharedBuffer,
    template: StaticTemplate,
    _template_dir: TempDir,
}

impl Harness {
    fn new(converter: ScriptedConverter) -> Self {
        let template_dir = tempfile::tempdir().unwrap();
        Self {
            converter,
            manipulator: RecordingManipulator::new(),
            console: SharedBuffer::new(),
            template: StaticTemplate::in_dir(template_dir.path()),
            _template_dir: template_dir,
        }
    }

    fn run(&self, config: MigrateConfig) -> Result<RunOutcome, MigrateError> {
        MigrationRun::new(config)
            .with_converter(self.converter.clone())
            .with_template_provisioner(self.template.clone())
            .with_manipulator(self.manipulator.clone())
            .with_console(self.console.clone())
            .execute()
    }
}

fn occurrences(text: &str, needle: &str) -> usize {
    text.matches(needle).count()
}

#[test]
fn test_legacy_solution_full_migration() {
    let ws = WorkspaceBuilder::new()
        .solution("App.sln", legacy_solution())
        .xproj_project("src/App")
        .xproj_project("src/Lib")
        .global_json("{ \"projects\": [\"src\"] }")
        .build();
    let harness = Harness::new(ScriptedConverter::new());

    let outcome = harness
        .run(MigrateConfig::new().with_input(ws.join("App.sln")))
        .unwrap();
    assert_eq!(outcome.exit_code(), 0);
    assert_eq!(outcome.report.total_count(), 2);
    assert_eq!(harness.template.provision_count(), 1);

    let reconciled = &outcome.reconciled[0];
    assert!(reconciled.header_upgraded);
    assert_eq!(reconciled.folder_items_removed, 1);
    assert_eq!(reconciled.folders_removed, 1);
    assert_eq!(reconciled.added.len(), 2);
    assert_eq!(reconciled.removed.len(), 2);

    let text = ws.read("App.sln");
    assert!(text.contains("# Visual Studio 15\r\n"));
    assert!(text.contains("VisualStudioVersion = 15.0.26114.2\r\n"));
    assert!(text.contains("\"App\", \"src\\App\\App.csproj\""));
    assert!(text.contains("\"Lib\", \"src\\Lib\\Lib.csproj\""));
    assert!(!text.contains(".xproj"));
    assert!(!text.contains("Solution Items"));
    assert!(!text.contains("{00000000-0000-0000-0000-00000000000A}"));
    assert!(text.contains("\tGlobalSection(SolutionProperties) = preSolution\r\n\t\tHideSolutionNode = FALSE\r\n\tEndGlobalSection\r\n"));
    assert_eq!(occurrences(&text, ".Release|Any CPU.Build.0 = Release|Any CPU"), 2);

    let backup = outcome.backup.unwrap();
    assert_eq!(backup.root, ws.join("backup"));
    assert_eq!(backup.moved.len(), 5);
    assert!(ws.exists("backup/src/App/project.json"));
    assert!(ws.exists("backup/src/Lib/Lib.xproj"));
    assert!(ws.exists("backup/global.json"));
    assert!(!ws.exists("src/App/project.json"));
    assert!(ws.exists("src/App/App.csproj"));

    let console = harness.console.contents();
    assert!(console.contains("Project App migration succeeded"));
    assert!(console.contains("Total Projects: 2"));
    assert!(console.contains(&format!("Files backed up to {}", ws.join("backup").display())));
}

#[test]
fn test_existing_entry_is_not_duplicated() {
    let ws = WorkspaceBuilder::new()
        .solution("App.sln", solution_with_converted_a())
        .project("src/A")
        .project("src/B")
        .build();
    let before = ws.read("App.sln");
    let harness = Harness::new(ScriptedConverter::new());

    let outcome = harness.run(MigrateConfig::new().with_input(ws.path())).unwrap();
    assert_eq!(outcome.reconciled.len(), 1);
    assert_eq!(outcome.reconciled[0].added, vec![ws.join("src/B/B.csproj")]);
    assert_eq!(
        harness.manipulator.calls(),
        vec![ManipulatorCall::Add(ws.join("src/B/B.csproj"))]
    );

    let text = ws.read("App.sln");
    let a_line = before.lines().find(|l| l.contains("A.csproj")).unwrap();
    assert!(text.contains(a_line));
    assert_eq!(occurrences(&text, "A.csproj"), 1);
    assert_eq!(occurrences(&text, "\"src\\B\\B.csproj\""), 1);
    assert_eq!(ws.solution("App.sln").projects().len(), 2);
}

#[test]
fn test_failed_project_blocks_reconciliation_and_backup() {
    let ws = WorkspaceBuilder::new()
        .solution("App.sln", legacy_solution())
        .xproj_project("src/App")
        .xproj_project("src/Lib")
        .build();
    let before = std::fs::read(ws.join("App.sln")).unwrap();
    let harness = Harness::new(ScriptedConverter::new().failing("Lib", "unsupported framework"));
    let report_file = ws.join("report.txt");

    let outcome = harness
        .run(
            MigrateConfig::new()
                .with_input(ws.join("App.sln"))
                .with_report_file(&report_file, ReportFormat::Text),
        )
        .unwrap();

    assert_eq!(outcome.exit_code(), 1);
    assert_eq!(outcome.report.succeeded_count(), 1);
    assert!(outcome.reconciled.is_empty());
    assert!(outcome.backup.is_none());
    assert_eq!(harness.converter.requests().len(), 2);
    assert!(harness.manipulator.calls().is_empty());

    assert_eq!(std::fs::read(ws.join("App.sln")).unwrap(), before);
    assert!(!ws.exists("backup"));
    assert!(ws.exists("src/App/project.json"));

    let report = ws.read("report.txt");
    assert!(report.contains("Project migration failed (Lib"));
    assert!(report.contains("unsupported framework"));
    assert!(report.contains("Failed Projects: 1"));
    assert!(!harness.console.contents().contains("Files backed up"));
}

#[test]
fn test_repeated_runs_leave_solution_unchanged() {
    let ws = WorkspaceBuilder::new()
        .solution("App.sln", legacy_solution())
        .xproj_project("src/App")
        .xproj_project("src/Lib")
        .build();
    let harness = Harness::new(ScriptedConverter::new());
    let config = MigrateConfig::new()
        .with_input(ws.join("App.sln"))
        .with_skip_backup(true);

    harness.run(config.clone()).unwrap();
    let first = ws.read("App.sln");
    let second_outcome = harness.run(config).unwrap();
    assert!(!second_outcome.reconciled[0].changed());
    assert_eq!(ws.read("App.sln"), first);
    assert_eq!(ws.solution("App.sln").projects().len(), 2);
    assert!(!ws.exists("backup"));
}

#[test]
fn test_only_matching_legacy_entries_are_removed() {
    let sln = format!(
        "{CURRENT_HEADER}\
Project(\"{DNX}\") = \"A\", \"src\\A\\A.xproj\", \"{{00000000-0000-0000-0000-0000000000A1}}\"\r\n\
EndProject\r\n\
Project(\"{DNX}\") = \"Other\", \"src\\Other\\Other.xproj\", \"{{00000000-0000-0000-0000-0000000000B1}}\"\r\n\
EndProject\r\n"
    );
    let ws = WorkspaceBuilder::new()
        .solution("App.sln", sln)
        .xproj_project("src/A")
        .file("src/Other/Other.xproj", "<Project />\n")
        .build();
    let harness = Harness::new(ScriptedConverter::new());

    let outcome = harness
        .run(MigrateConfig::new().with_input(ws.path()).with_skip_backup(true))
        .unwrap();
    assert_eq!(outcome.reconciled[0].removed, vec![ws.join("src/A/A.xproj")]);

    let text = ws.read("App.sln");
    assert!(!text.contains("A.xproj"));
    assert!(text.contains("\"Other\", \"src\\Other\\Other.xproj\""));
    assert!(text.contains("\"A\", \"src\\A\\A.csproj\""));
}

#[test]
fn test_shared_dependency_is_added_once() {
    let sln = format!(
        "{CURRENT_HEADER}Global\r\n\tGlobalSection(SolutionConfigurationPlatforms) = preSolution\r\n\t\tDebug|Any CPU = Debug|Any CPU\r\n\tEndGlobalSection\r\nEndGlobal\r\n"
    );
    let ws = WorkspaceBuilder::new()
        .solution("App.sln", sln)
        .project("src/A")
        .project("src/B")
        .file("src/Lib/Lib.csproj", "<Project />\n")
        .build();
    let converter = ScriptedConverter::new()
        .script("A", Script::default().with_dependency("../Lib/Lib.csproj"))
        .script(
            "B",
            Script::default()
                .with_dependency("../Lib/Lib.csproj")
                .with_warning("runtime options dropped"),
        );
    let harness = Harness::new(converter);

    let outcome = harness
        .run(MigrateConfig::new().with_input(ws.path()).with_skip_backup(true))
        .unwrap();
    assert_eq!(outcome.reconciled[0].added.len(), 3);

    let sln = ws.solution("App.sln");
    let members: Vec<_> = sln.projects().iter().map(|p| p.relative_file_path().to_string()).collect();
    assert_eq!(
        members,
        vec!["src\\A\\A.csproj", "src\\B\\B.csproj", "src\\Lib\\Lib.csproj"]
    );
    assert!(sln.projects().iter().all(|p| p.type_id().as_str() == CSHARP));
    assert!(harness.console.contents().contains("runtime options dropped"));
}

#[test]
fn test_unparsable_discovered_solution_is_skipped() {
    let ws = WorkspaceBuilder::new()
        .solution("Broken.sln", "this is not a solution\n")
        .solution("App.sln", solution_with_converted_a())
        .project("src/A")
        .build();
    let harness = Harness::new(ScriptedConverter::new());

    let outcome = harness
        .run(MigrateConfig::new().with_input(ws.path()).with_skip_backup(true))
        .unwrap();
    assert_eq!(outcome.exit_code(), 0);
    assert_eq!(outcome.reconciled.len(), 1);
    assert_eq!(outcome.reconciled[0].solution, ws.join("App.sln"));
    assert_eq!(ws.read("Broken.sln"), "this is not a solution\n");
}

#[test]
fn test_unparsable_named_solution_aborts_before_conversion() {
    let ws = WorkspaceBuilder::new()
        .solution("Broken.sln", "this is not a solution\n")
        .project("src/A")
        .build();
    let harness = Harness::new(ScriptedConverter::new());

    let err = harness
        .run(MigrateConfig::new().with_input(ws.join("Broken.sln")))
        .unwrap_err();
    assert!(err.is_user_input_error());
    assert!(harness.converter.requests().is_empty());
}

#[test]
fn test_missing_template_aborts_run() {
    let ws = WorkspaceBuilder::new().project("src/A").build();
    let err = MigrationRun::new(MigrateConfig::new().with_input(ws.path()))
        .with_converter(ScriptedConverter::new())
        .with_template_provisioner(StaticTemplate::at(ws.join("missing.csproj")))
        .with_console(SharedBuffer::new())
        .execute()
        .unwrap_err();
    assert!(matches!(err, MigrateError::Template(_)));
    assert!(ws.exists("src/A/project.json"));
}

#[test]
fn test_json_report_file() {
    let ws = WorkspaceBuilder::new().project("src/A").project("src/B").build();
    let harness = Harness::new(ScriptedConverter::new().failing("B", "boom"));
    let report_file = ws.join("report.json");

    harness
        .run(
            MigrateConfig::new()
                .with_input(ws.path())
                .with_report_file(&report_file, ReportFormat::Json),
        )
        .unwrap();

    let json: serde_json::Value = serde_json::from_str(&ws.read("report.json")).unwrap();
    assert_eq!(json["total_count"], 2);
    assert_eq!(json["failed_count"], 1);
    assert_eq!(json["projects"][1]["project_name"], "B");
    assert_eq!(json["projects"][1]["succeeded"], false);
}

#[test]
fn test_existing_backup_directory_is_not_reused() {
    let ws = WorkspaceBuilder::new()
        .solution("App.sln", solution_with_converted_a())
        .project("src/A")
        .file("backup/notes.txt", "kept")
        .build();
    let harness = Harness::new(ScriptedConverter::new());
    let outcome = harness.run(MigrateConfig::new().with_input(ws.path())).unwrap();
    assert_eq!(outcome.backup.unwrap().root, ws.join("backup_1"));
    assert!(ws.exists("backup_1/src/A/project.json"));
    assert_eq!(ws.read("backup/notes.txt"), "kept");
}

#[test]
fn test_repeated_run_with_backup_ignores_backed_up_descriptors() {
    let ws = WorkspaceBuilder::new()
        .solution("App.sln", solution_with_converted_a())
        .project("src/A")
        .build();
    let harness = Harness::new(ScriptedConverter::new());
    harness.run(MigrateConfig::new().with_input(ws.path())).unwrap();
    assert!(ws.exists("backup/src/A/project.json"));

    std::fs::create_dir_all(ws.join("src/C")).unwrap();
    std::fs::write(ws.join("src/C/project.json"), "{}").unwrap();
    let outcome = harness.run(MigrateConfig::new().with_input(ws.path())).unwrap();

    assert_eq!(outcome.report.total_count(), 1);
    let converted: Vec<_> = harness
        .converter
        .requests()
        .into_iter()
        .map(|r| r.project_directory)
        .collect();
    assert_eq!(converted, vec![ws.join("src/A"), ws.join("src/C")]);
    assert_eq!(outcome.backup.unwrap().root, ws.join("backup_1"));

    let text = ws.read("App.sln");
    assert!(!text.contains("backup"));
    assert_eq!(ws.solution("App.sln").projects().len(), 2);
}

#[cfg(unix)]
mod process {
    use super::*;
    use pretty_assertions::assert_eq;
    use pjm_core::{CommandConverter, DotnetSlnManipulator};

    const CONVERTER_SCRIPT: &str = r#"
while [ $# -gt 0 ]; do
  case "$1" in
    --project-directory) dir="$2"; shift 2 ;;
    *) shift ;;
  esac
done
name=$(basename "$dir")
printf '<Project />\n' > "$dir/$name.csproj"
printf '{"project_name":"%s","project_directory":"%s","warnings":["converted by script"]}' "$name" "$dir"
"#;

    fn scripts() -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("convert.sh"), CONVERTER_SCRIPT).unwrap();
        std::fs::write(dir.path().join("fail.sh"), "echo 'no such solution' >&2\nexit 3\n").unwrap();
        dir
    }

    fn script(dir: &TempDir, name: &str) -> std::path::PathBuf {
        dir.path().join(name)
    }

    #[test]
    fn test_process_converter_reports_through_stdout() {
        let scripts = scripts();
        let ws = WorkspaceBuilder::new()
            .solution("App.sln", solution_with_converted_a())
            .project("src/A")
            .project("src/B")
            .build();
        let harness = Harness::new(ScriptedConverter::new());

        let outcome = MigrationRun::new(MigrateConfig::new().with_input(ws.path()).with_skip_backup(true))
            .with_converter(CommandConverter::new("sh").with_arg(script(&scripts, "convert.sh")))
            .with_template_provisioner(harness.template.clone())
            .with_console(harness.console.clone())
            .execute()
            .unwrap();

        assert_eq!(outcome.exit_code(), 0);
        assert!(ws.exists("src/B/B.csproj"));
        assert_eq!(outcome.reconciled[0].added, vec![ws.join("src/B/B.csproj")]);
        assert!(harness.console.contents().contains("converted by script"));
    }

    #[test]
    fn test_failing_external_solution_tool_aborts_run() {
        let scripts = scripts();
        let ws = WorkspaceBuilder::new()
            .solution("App.sln", legacy_solution())
            .xproj_project("src/App")
            .xproj_project("src/Lib")
            .build();
        let harness = Harness::new(ScriptedConverter::new());

        let err = MigrationRun::new(MigrateConfig::new().with_input(ws.join("App.sln")))
            .with_converter(harness.converter.clone())
            .with_template_provisioner(harness.template.clone())
            .with_manipulator(DotnetSlnManipulator::new("sh").with_arg(script(&scripts, "fail.sh")))
            .with_console(harness.console.clone())
            .execute()
            .unwrap_err();

        assert!(matches!(
            err,
            MigrateError::Manipulation(ManipulationError::OperationFailed { operation: "add", .. })
        ));
        // header and folder edits were persisted before delegating
        let text = ws.read("App.sln");
        assert!(text.contains("VisualStudioVersion = 15.0.26114.2"));
        assert!(!text.contains("Solution Items"));
        assert!(ws.exists("src/App/project.json"));
        assert!(!ws.exists("backup"));
    }
}
