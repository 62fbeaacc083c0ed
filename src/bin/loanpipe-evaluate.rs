//! Evaluation step entry point: score the test partition and write the
//! metrics report.

use std::path::PathBuf;

use loanpipe::config::PipelineConfig;
use loanpipe::{evaluate, logging};

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

struct CliOptions {
    config_path: Option<PathBuf>,
}

fn run() -> Result<(), String> {
    if let Err(err) = logging::init() {
        eprintln!("Logging disabled: {err}");
    }
    let Some(options) = parse_args(std::env::args().skip(1).collect())? else {
        return Ok(());
    };
    let config =
        PipelineConfig::load_or_default(options.config_path.as_deref()).map_err(|err| err.to_string())?;
    let report = evaluate::run(&config).map_err(|err| err.to_string())?;
    tracing::info!(
        "Classification report: auc={} f1={}",
        report.classification_metrics.auc.value,
        report.classification_metrics.f1.value
    );
    Ok(())
}

fn parse_args(args: Vec<String>) -> Result<Option<CliOptions>, String> {
    if args.iter().any(|arg| arg == "--help" || arg == "-h") {
        print_help();
        return Ok(None);
    }
    let mut config_path = None;
    let mut idx = 0usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "--config" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--config requires a value".to_string())?;
                config_path = Some(PathBuf::from(value));
            }
            unknown => return Err(format!("Unknown argument: {unknown}")),
        }
        idx += 1;
    }
    Ok(Some(CliOptions { config_path }))
}

fn print_help() {
    println!("Usage: loanpipe-evaluate [--config <path>]");
    println!();
    println!("Options:");
    println!("  --config <path>  Pipeline config TOML (default: platform paths)");
}
