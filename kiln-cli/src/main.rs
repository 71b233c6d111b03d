//! Kiln CLI - Command line interface
//!
//! Project-based bundling - all build configuration from kiln.json

use clap::Parser;
use kiln_config::BundlerConfig;
use kiln_core::graph::normalize;
use kiln_core::BuildOutput;
use kiln_vfs::{NativeFileSystem, VirtualFileSystem};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use tracing::{debug, info};

mod config;
mod logging;
mod platform;

use crate::config::{parse_level, LogConfig};
use crate::logging::LogFormat;
use crate::platform::print_build_error;

#[derive(Parser)]
#[command(name = "kiln", about = "Kiln - a small JavaScript module bundler", version)]
struct Cli {
    /// Configuration file path (default: ./kiln.json)
    #[arg(value_name = "CONFIG", default_value = "kiln.json")]
    config: PathBuf,

    /// Print build stats as JSON instead of the asset list
    #[arg(long)]
    json: bool,

    /// Global log level: silent, error, warn, info, debug, trace
    #[arg(long, value_name = "LEVEL", default_value = "warn")]
    log_level: String,

    /// Per-phase log level, e.g. `graph=debug` (repeatable)
    #[arg(long = "log-phase", value_name = "PHASE=LEVEL")]
    log_phases: Vec<String>,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Compact)]
    log_format: LogFormat,

    /// Also append logs to this file
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();

    let log_config = match build_log_config(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(2);
        }
    };
    if let Err(e) = logging::init_with_file(&log_config, cli.log_format, cli.log_file.as_deref()) {
        eprintln!("Error: cannot open log file: {}", e);
        process::exit(1);
    }

    let config = match read_config(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let root = project_root(&cli.config);
    info!(target: "kiln::cli", config = %cli.config.display(), root = %root.display(), "loaded configuration");

    let vfs: Arc<dyn VirtualFileSystem> = Arc::new(NativeFileSystem::new());
    let mut compiler = match kiln_core::compiler_from_config(&config, root, vfs.clone()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: invalid configuration '{}': {}", cli.config.display(), e);
            process::exit(1);
        }
    };

    match compiler.run() {
        Ok(output) => report(&output, cli.json),
        Err(e) => {
            print_build_error(&e, &compiler, vfs.as_ref());
            process::exit(1);
        }
    }
}

fn build_log_config(cli: &Cli) -> Result<LogConfig, String> {
    let mut config = LogConfig {
        global: parse_level(&cli.log_level)?,
        ..LogConfig::default()
    };
    for spec in &cli.log_phases {
        config.apply_override(spec)?;
    }
    Ok(config)
}

/// Read and parse kiln.json
fn read_config(path: &Path) -> Result<BundlerConfig, String> {
    if !path.exists() {
        return Err(format!(
            "'{}' not found\n\nThe current directory is not a kiln project.\nHint: create '{}' with an 'entry' field",
            path.display(),
            path.display()
        ));
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read '{}': {}", path.display(), e))?;

    BundlerConfig::from_json_str(&content).map_err(|e| format!("cannot parse '{}': {}", path.display(), e))
}

/// The directory holding the configuration file, made absolute
fn project_root(config_path: &Path) -> PathBuf {
    let dir = config_path.parent().unwrap_or(Path::new("."));
    match std::env::current_dir() {
        Ok(cwd) => normalize(&cwd.join(dir)),
        Err(e) => {
            debug!(target: "kiln::cli", error = %e, "no current directory, using relative root");
            dir.to_path_buf()
        }
    }
}

fn report(output: &BuildOutput, json: bool) {
    if json {
        match serde_json::to_string_pretty(&output.stats.summary()) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("Error: cannot serialize stats: {}", e);
                process::exit(1);
            }
        }
        return;
    }

    for (filename, code) in &output.stats.assets {
        println!("{}  {} bytes", filename, code.len());
    }
}
