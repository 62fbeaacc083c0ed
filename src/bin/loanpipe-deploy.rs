//! Deployment step entry point: read a model-package-approved event and
//! provision the hosting resources.

use std::io::Read;
use std::path::PathBuf;

use loanpipe::config::{ConfigError, PipelineConfig};
use loanpipe::deploy::control_plane::HttpControlPlane;
use loanpipe::deploy::event::ModelPackageEvent;
use loanpipe::{deploy, logging};

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

struct CliOptions {
    config_path: Option<PathBuf>,
    event_path: Option<PathBuf>,
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
    if config.control_plane_endpoint.is_empty() {
        return Err(ConfigError::MissingValue("control_plane_endpoint").to_string());
    }

    let body = read_event_body(options.event_path.as_deref())?;
    let event = ModelPackageEvent::from_json(&body).map_err(|err| err.to_string())?;

    let control_plane = HttpControlPlane::new(config.control_plane_endpoint.clone());
    let names = deploy::run(&event, &config, &control_plane).map_err(|err| err.to_string())?;
    tracing::info!(
        "Requested endpoint {} (creation acknowledged, not awaited)",
        names.endpoint_name
    );
    Ok(())
}

fn read_event_body(path: Option<&std::path::Path>) -> Result<String, String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|err| format!("Failed to read event file {}: {err}", path.display())),
        None => {
            let mut body = String::new();
            std::io::stdin()
                .read_to_string(&mut body)
                .map_err(|err| format!("Failed to read event from stdin: {err}"))?;
            Ok(body)
        }
    }
}

fn parse_args(args: Vec<String>) -> Result<Option<CliOptions>, String> {
    if args.iter().any(|arg| arg == "--help" || arg == "-h") {
        print_help();
        return Ok(None);
    }
    let mut options = CliOptions {
        config_path: None,
        event_path: None,
    };
    let mut idx = 0usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "--config" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--config requires a value".to_string())?;
                options.config_path = Some(PathBuf::from(value));
            }
            "--event" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--event requires a value".to_string())?;
                options.event_path = Some(PathBuf::from(value));
            }
            unknown => return Err(format!("Unknown argument: {unknown}")),
        }
        idx += 1;
    }
    Ok(Some(options))
}

fn print_help() {
    println!("Usage: loanpipe-deploy [--event <path>] [--config <path>]");
    println!();
    println!("Options:");
    println!("  --event <path>   Event JSON file (default: read from stdin)");
    println!("  --config <path>  Pipeline config TOML with control-plane settings");
}
