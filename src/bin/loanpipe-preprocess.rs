//! Preprocessing step entry point: clean, encode, and split the raw dataset.

use std::path::PathBuf;

use loanpipe::config::PipelineConfig;
use loanpipe::logging;
use loanpipe::preprocess::{self, PreprocessOptions};

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

struct CliOptions {
    config_path: Option<PathBuf>,
    step: PreprocessOptions,
}

fn run() -> Result<(), String> {
    if let Err(err) = logging::init() {
        eprintln!("Logging disabled: {err}");
    }
    let Some(options) = parse_args(std::env::args().skip(1).collect())? else {
        return Ok(());
    };
    tracing::info!(
        "Received arguments: filename={} seed={:?}",
        options.step.filename,
        options.step.seed
    );
    let config =
        PipelineConfig::load_or_default(options.config_path.as_deref()).map_err(|err| err.to_string())?;
    let summary = preprocess::run(&config, &options.step).map_err(|err| err.to_string())?;
    tracing::info!(
        "Wrote {} train / {} validation / {} test rows ({} columns each)",
        summary.train_rows,
        summary.validation_rows,
        summary.test_rows,
        summary.output_width
    );
    Ok(())
}

fn parse_args(args: Vec<String>) -> Result<Option<CliOptions>, String> {
    if args.iter().any(|arg| arg == "--help" || arg == "-h") {
        print_help();
        return Ok(None);
    }
    let mut options = CliOptions {
        config_path: None,
        step: PreprocessOptions::default(),
    };
    let mut idx = 0usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "--filename" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--filename requires a value".to_string())?;
                options.step.filename = value.clone();
            }
            "--config" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--config requires a value".to_string())?;
                options.config_path = Some(PathBuf::from(value));
            }
            "--seed" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--seed requires a value".to_string())?;
                let seed = value
                    .parse::<u64>()
                    .map_err(|_| format!("Invalid --seed value: {value}"))?;
                options.step.seed = Some(seed);
            }
            // The orchestrator may append arguments this step does not know;
            // they are ignored rather than rejected.
            unknown => {
                tracing::debug!("Ignoring unrecognized argument: {unknown}");
            }
        }
        idx += 1;
    }
    Ok(Some(options))
}

fn print_help() {
    println!("Usage: loanpipe-preprocess [--filename <name>] [--config <path>] [--seed <u64>]");
    println!();
    println!("Options:");
    println!("  --filename <name>  Input CSV under the input directory (default: sample.csv)");
    println!("  --config <path>    Pipeline config TOML (default: platform paths)");
    println!("  --seed <u64>       Shuffle seed (default: non-reproducible)");
    println!();
    println!("Unrecognized arguments are ignored.");
}
