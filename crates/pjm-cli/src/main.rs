//! `pjmigrate` command line entry point

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use owo_colors::OwoColorize;
use pjm_core::{MigrateConfig, MigrationRun, SolutionEditing, DEFAULT_CONVERTER, DEFAULT_DOTNET};
use pjm_report::{console_supports_color, ReportFormat};
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    Command::new("pjmigrate")
        .version(pjm_core::VERSION)
        .about("Migrate project.json projects to csproj and update solutions to match")
        .arg(
            Arg::new("input")
                .value_name("INPUT")
                .default_value(".")
                .value_parser(value_parser!(PathBuf))
                .help("project.json, global.json, solution file or directory to migrate"),
        )
        .arg(
            Arg::new("template-file")
                .short('t')
                .long("template-file")
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .help("Template project to start every conversion from"),
        )
        .arg(
            Arg::new("sdk-package-version")
                .short('v')
                .long("sdk-package-version")
                .value_name("VERSION")
                .help("SDK package version referenced by converted projects"),
        )
        .arg(
            Arg::new("xproj-file")
                .short('x')
                .long("xproj-file")
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .help("xproj file to read build settings from"),
        )
        .arg(
            Arg::new("skip-project-references")
                .short('s')
                .long("skip-project-references")
                .action(ArgAction::SetTrue)
                .help("Do not migrate projects referenced by the input"),
        )
        .arg(
            Arg::new("report-file")
                .short('r')
                .long("report-file")
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .help("Also write the migration report to this file"),
        )
        .arg(
            Arg::new("format-report-file-json")
                .long("format-report-file-json")
                .action(ArgAction::SetTrue)
                .help("Write the report file as JSON"),
        )
        .arg(
            Arg::new("skip-backup")
                .long("skip-backup")
                .action(ArgAction::SetTrue)
                .help("Leave project.json, xproj and lock files in place"),
        )
        .arg(
            Arg::new("converter")
                .long("converter")
                .value_name("PROGRAM")
                .env("PJMIGRATE_CONVERTER")
                .default_value(DEFAULT_CONVERTER)
                .help("Per-project converter program"),
        )
        .arg(
            Arg::new("dotnet")
                .long("dotnet")
                .value_name("PROGRAM")
                .env("PJMIGRATE_DOTNET")
                .default_value(DEFAULT_DOTNET)
                .help("dotnet host used for templates and external solution edits"),
        )
        .arg(
            Arg::new("external-sln-tool")
                .long("external-sln-tool")
                .action(ArgAction::SetTrue)
                .help("Edit solutions through `dotnet sln` instead of in process"),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .action(ArgAction::SetTrue)
                .help("Log debug output to stderr"),
        )
}

fn config_from(matches: &ArgMatches) -> MigrateConfig {
    let mut config = MigrateConfig::new()
        .with_skip_project_references(matches.get_flag("skip-project-references"))
        .with_skip_backup(matches.get_flag("skip-backup"))
        .with_colored(console_supports_color());

    if let Some(input) = matches.get_one::<PathBuf>("input") {
        config = config.with_input(input.clone());
    }
    if let Some(template) = matches.get_one::<PathBuf>("template-file") {
        config = config.with_template_file(template.clone());
    }
    if let Some(version) = matches.get_one::<String>("sdk-package-version") {
        config = config.with_sdk_package_version(version.clone());
    }
    if let Some(xproj) = matches.get_one::<PathBuf>("xproj-file") {
        config = config.with_xproj_file(xproj.clone());
    }
    if let Some(report) = matches.get_one::<PathBuf>("report-file") {
        let format = if matches.get_flag("format-report-file-json") {
            ReportFormat::Json
        } else {
            ReportFormat::Text
        };
        config = config.with_report_file(report.clone(), format);
    }
    if let Some(converter) = matches.get_one::<String>("converter") {
        config = config.with_converter_program(converter.clone());
    }
    if let Some(dotnet) = matches.get_one::<String>("dotnet") {
        config = config.with_dotnet_program(dotnet.clone());
    }
    if matches.get_flag("external-sln-tool") {
        config = config.with_solution_editing(SolutionEditing::External);
    }
    config
}

fn init_tracing(verbose: bool) -> anyhow::Result<()> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("cannot initialise logging: {e}"))
}

fn run(matches: &ArgMatches) -> anyhow::Result<i32> {
    init_tracing(matches.get_flag("verbose"))?;
    let config = config_from(matches);
    tracing::debug!("Configuration: {:?}", config);

    let outcome = MigrationRun::new(config).execute()?;
    Ok(outcome.exit_code())
}

fn main() {
    let matches = cli().get_matches();
    match run(&matches) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            let message = format!("{err:#}");
            if std::io::stderr().is_terminal() && std::env::var_os("NO_COLOR").is_none() {
                eprintln!("{}", message.red());
            } else {
                eprintln!("{message}");
            }
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(args: &[&str]) -> MigrateConfig {
        let matches = cli()
            .try_get_matches_from(std::iter::once("pjmigrate").chain(args.iter().copied()))
            .unwrap();
        config_from(&matches)
    }

    #[test]
    fn defaults() {
        let config = parse(&[]);
        assert_eq!(config.input, PathBuf::from("."));
        assert_eq!(config.template_file, None);
        assert_eq!(config.report_file, None);
        assert_eq!(config.solution_editing, SolutionEditing::Direct);
        assert!(!config.skip_backup);
    }

    #[test]
    fn all_options() {
        let config = parse(&[
            "src/App.sln",
            "-t",
            "/t/p.csproj",
            "-v",
            "1.0.0-preview",
            "-x",
            "App.xproj",
            "-s",
            "-r",
            "report.json",
            "--format-report-file-json",
            "--skip-backup",
            "--converter",
            "/opt/pjconvert",
            "--external-sln-tool",
        ]);
        assert_eq!(config.input, PathBuf::from("src/App.sln"));
        assert_eq!(config.template_file, Some(PathBuf::from("/t/p.csproj")));
        assert_eq!(config.sdk_package_version.as_deref(), Some("1.0.0-preview"));
        assert_eq!(config.xproj_file, Some(PathBuf::from("App.xproj")));
        assert!(config.skip_project_references);
        assert_eq!(config.report_file, Some(PathBuf::from("report.json")));
        assert_eq!(config.report_format, ReportFormat::Json);
        assert!(config.skip_backup);
        assert_eq!(config.converter_program, "/opt/pjconvert");
        assert_eq!(config.solution_editing, SolutionEditing::External);
    }

    #[test]
    fn text_report_by_default() {
        let config = parse(&["-r", "report.txt"]);
        assert_eq!(config.report_format, ReportFormat::Text);
    }

    #[test]
    fn command_is_well_formed() {
        cli().debug_assert();
    }
}
