use arbor::{ApplyOptions, Report};
use clap::{
    crate_authors, crate_description, crate_name, crate_version, Arg, ArgAction, ArgMatches,
    Command,
};
use colored::Colorize;
use std::path::PathBuf;

const DEFAULT_PARAMS: &str = "params.yaml";

// The CLI layer should only parse inputs and forward them to library code.
fn main() -> miette::Result<()> {
    let matches = Command::new(crate_name!())
        .about(crate_description!())
        .author(crate_authors!())
        .version(crate_version!())
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose output")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("json-path")
                .long("json-path")
                .visible_alias("params")
                .help("Params file naming the document (yaml_file/json_file) and output_folder")
                .value_parser(clap::value_parser!(PathBuf))
                .default_value(DEFAULT_PARAMS)
                .conflicts_with("document"),
        )
        .arg(
            Arg::new("document")
                .long("document")
                .help("Document to materialize, skipping the params file")
                .value_parser(clap::value_parser!(PathBuf))
                .requires("output"),
        )
        .arg(
            Arg::new("output")
                .long("output")
                .short('o')
                .help("Output folder for --document")
                .value_parser(clap::value_parser!(PathBuf))
                .requires("document"),
        )
        .arg(
            Arg::new("dry-run")
                .long("dry-run")
                .help("Print the planned tree without writing anything")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("no-rollback")
                .long("no-rollback")
                .help("Leave already written files in place when a step fails")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    init_logging(matches.get_flag("verbose"));

    let report = run(&matches)?;

    print_summary(&report);

    Ok(())
}

fn init_logging(is_verbose: bool) {
    let default_filter = if is_verbose { "debug" } else { "warn" };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

fn run(args: &ArgMatches) -> Result<Report, arbor::ArborError> {
    let options = ApplyOptions {
        dry_run: args.get_flag("dry-run"),
        rollback: !args.get_flag("no-rollback"),
    };

    match (
        args.get_one::<PathBuf>("document"),
        args.get_one::<PathBuf>("output"),
    ) {
        (Some(document), Some(output)) => arbor::process_document(document, output, options),
        _ => {
            let params = args
                .get_one::<PathBuf>("json-path")
                .cloned()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_PARAMS));

            arbor::process_params(&params, options)
        }
    }
}

fn print_summary(report: &Report) {
    if report.dry_run {
        return;
    }

    let (kind, folder) = match &report.project_folder {
        Some(project) => ("project", project),
        None => ("output", &report.output_root),
    };

    println!(
        "{} {} files created in {} folder: {}",
        "done".green(),
        report.files.len(),
        kind,
        folder.display()
    );
}
