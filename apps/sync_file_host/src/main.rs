use clap::Parser;
use std::path::PathBuf;
use tracing::{Level, debug, error, info};

use sync_file::adapters::JsRuntimeAdapter;
use sync_log::{LogConfig, init_logging, parse_level};

mod config;

use config::Config;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Run a JavaScript file with the SyncFile native module available
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Script to evaluate
    script: PathBuf,

    /// Path to configuration file (JSON)
    #[arg(short, long, env = "SYNC_FILE_CONFIG")]
    config: Option<PathBuf>,

    /// Log level, overrides the configuration file
    #[arg(long, env = "SYNC_FILE_LOG_LEVEL")]
    log_level: Option<String>,

    /// Enable logging to file (sync_file_host.log in current directory)
    #[arg(long, env = "SYNC_FILE_LOG_FILE")]
    log_file: bool,

    /// Install the file bindings before the script runs
    #[arg(long)]
    auto_install: bool,

    /// Resolve relative file paths against this directory
    #[arg(long)]
    base_dir: Option<PathBuf>,
}

fn main() {
    let args = Args::parse();

    // Logging is not up yet, early failures go to stderr
    let mut config = match &args.config {
        Some(path) => match Config::from_json_file(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("Failed to load config: {}", e);
                std::process::exit(1);
            }
        },
        None => Config::default(),
    };

    let level_name = args.log_level.clone().unwrap_or_else(|| config.log_level.clone());
    let log_level = parse_level(&level_name).unwrap_or_else(|| {
        eprintln!("Warning: Invalid log level '{}', using INFO", level_name);
        Level::INFO
    });

    let log_config = if args.log_file {
        match std::fs::File::create("sync_file_host.log") {
            Ok(file) => LogConfig::new("sync_file_host::")
                .with_level(log_level)
                .with_log_file(file),
            Err(e) => {
                eprintln!("Unable to create sync_file_host.log: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        LogConfig::<std::fs::File>::new("sync_file_host::").with_level(log_level)
    };

    if let Err(e) = init_logging(log_config) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    info!("SyncFile host v{}", VERSION);

    if args.auto_install {
        config.runtime = config.runtime.with_auto_install(true);
    }
    if let Some(base_dir) = args.base_dir {
        config.runtime = config.runtime.with_base_dir(base_dir);
    }
    if args.config.is_none() {
        if let Some(stem) = args.script.file_stem().and_then(|s| s.to_str()) {
            config.runtime = config.runtime.with_script_id(stem);
        }
    }

    debug!("Settings:");
    debug!("  Script: {}", args.script.display());
    debug!("  Script ID: {}", config.runtime.script_id());
    debug!("  Base dir: {:?}", config.runtime.base_dir());
    debug!("  Auto install: {}", config.runtime.auto_install());

    let runtime = match JsRuntimeAdapter::new(config.runtime) {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to initialize JavaScript runtime: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = runtime.eval_file(&args.script) {
        error!("{}", e);
        std::process::exit(1);
    }

    info!("Script '{}' finished", args.script.display());
}
