//! Household appliance simulator entry point: CLI wiring and config-driven runs.

use std::path::Path;
use std::process;

use tracing_subscriber::EnvFilter;

use appliance_sim::config::ScenarioConfig;
use appliance_sim::io::export::export_csv;
use appliance_sim::runner::run_scenario;

/// Parsed CLI arguments.
struct CliArgs {
    scenario_path: Option<String>,
    preset: Option<String>,
    report_out: Option<String>,
    verbose: bool,
}

fn print_help() {
    eprintln!("appliance-sim: household appliance hybrid simulator");
    eprintln!();
    eprintln!("Usage: appliance-sim [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --scenario <path>        Load scenario from TOML config file");
    eprintln!(
        "  --preset <name>          Use a built-in preset ({})",
        ScenarioConfig::PRESETS.join(", ")
    );
    eprintln!("  --report-out <path>      Export the run report to CSV");
    eprintln!("  --verbose                Trace every transition");
    eprintln!("  --help                   Show this help message");
    eprintln!();
    eprintln!("If no --scenario or --preset is given, the household preset is used.");
}

/// Value following the flag at `args[*i]`, or exit with an error.
fn flag_value(args: &[String], i: &mut usize, what: &str) -> String {
    let flag = &args[*i];
    *i += 1;
    match args.get(*i) {
        Some(v) => v.clone(),
        None => {
            eprintln!("error: {flag} requires a {what} argument");
            process::exit(1);
        }
    }
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        scenario_path: None,
        preset: None,
        report_out: None,
        verbose: false,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                process::exit(0);
            }
            "--scenario" => cli.scenario_path = Some(flag_value(&args, &mut i, "path")),
            "--preset" => cli.preset = Some(flag_value(&args, &mut i, "name")),
            "--report-out" => cli.report_out = Some(flag_value(&args, &mut i, "path")),
            "--verbose" | "-v" => cli.verbose = true,
            other => {
                eprintln!("error: unknown argument \"{other}\"");
                print_help();
                process::exit(1);
            }
        }
        i += 1;
    }

    cli
}

fn main() {
    let cli = parse_args();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let loaded = match (&cli.scenario_path, &cli.preset) {
        (Some(path), _) => ScenarioConfig::from_toml_file(Path::new(path)),
        (None, Some(name)) => ScenarioConfig::from_preset(name),
        (None, None) => Ok(ScenarioConfig::household()),
    };
    let mut scenario = match loaded {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{e}");
            process::exit(1);
        }
    };
    scenario.run.verbose |= cli.verbose;

    let errors = scenario.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }

    let report = match run_scenario(&scenario) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    };
    println!("{report}");

    if let Some(path) = &cli.report_out {
        if let Err(e) = export_csv(&report, Path::new(path)) {
            eprintln!("error: failed to write CSV: {e}");
            process::exit(1);
        }
        eprintln!("Report written to {path}");
    }
}
