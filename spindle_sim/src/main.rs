//! # Spindle Simulator
//!
//! Drives the spindle control core on a host machine: output hardware, tool
//! changers and the macro engine are replaced by logging stand-ins.
//!
//! # Usage
//!
//! ```bash
//! # Run a script against the example machine
//! spindle_sim --config config/spindles.toml --script job.txt
//!
//! # Commands from stdin, settling delays logged instead of slept
//! spindle_sim --config config/spindles.toml --no-wait
//!
//! # Verbose JSON logs
//! spindle_sim --config config/spindles.toml -v --json
//! ```
//!
//! State is saved after every command and restored on the next start.

mod devices;
mod script;

use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use spindle_common::consts::DEFAULT_STATE_FILE;
use spindle_common::prelude::*;
use spindle_core::atc::AtcRegistry;
use spindle_core::persist::SpindleStatePersistence;
use spindle_core::{ActiveSpindleRegistry, SpindleSetBuilder, load_config};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::devices::{LogChanger, LogDwell, LogMacros, LogOutput};
use crate::script::Session;

/// Spindle Simulator - run the spindle control core from a command script
#[derive(Parser, Debug)]
#[command(name = "spindle_sim")]
#[command(author = "RTS007")]
#[command(version)]
#[command(about = "Run the spindle control core against logging stand-ins")]
#[command(long_about = None)]
struct Args {
    /// Path to spindle configuration file
    #[arg(short, long, default_value = "config/spindles.toml")]
    config: PathBuf,

    /// Path to restart-state file
    #[arg(short, long, default_value = DEFAULT_STATE_FILE)]
    state: PathBuf,

    /// Command script (stdin when omitted)
    #[arg(long, value_name = "FILE")]
    script: Option<PathBuf>,

    /// Log settling delays instead of sleeping
    #[arg(long)]
    no_wait: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long)]
    json: bool,
}

fn main() {
    if let Err(e) = run() {
        error!("Spindle simulator failed: {}", e);
        eprintln!("spindle_sim: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Validated config comes first so its log level can be the default.
    let config = load_config(&args.config)?;
    setup_tracing(&args, config.shared.log_level);

    info!("Spindle simulator v{} starting...", env!("CARGO_PKG_VERSION"));
    let registry = build_registry(&config, args.no_wait)?;

    let mut session = Session::new(registry, Some(SpindleStatePersistence::new(&args.state)));
    if session.restore()? {
        info!("Resumed: {}", session.status_line());
    }

    let count = match &args.script {
        Some(path) => session.run(BufReader::new(File::open(path)?))?,
        None => session.run(io::stdin().lock())?,
    };

    info!(
        "Executed {} commands ({} rejected). {}",
        count,
        session.rejected(),
        session.status_line()
    );
    Ok(())
}

/// Build the spindle set with logging collaborators.
pub(crate) fn build_registry(
    config: &SpindleMachineConfig,
    no_wait: bool,
) -> Result<ActiveSpindleRegistry, SpindleError> {
    let mut changers = AtcRegistry::new();
    for atc in &config.atc {
        changers.register(Arc::new(LogChanger::new(&atc.name)));
    }

    let mut builder = SpindleSetBuilder::new()
        .with_changers(changers)
        .with_macros(Arc::new(LogMacros));
    if no_wait {
        builder = builder.with_dwell(Arc::new(LogDwell));
    }

    builder.build_registry(config, |spindle| {
        Arc::new(LogOutput::new(&spindle.name)) as Arc<dyn OutputDriver>
    })
}

/// Setup tracing subscriber based on CLI arguments and configured level.
/// Filter used when `RUST_LOG` is unset.
fn default_directive(args: &Args, configured: LogLevel) -> &'static str {
    if args.verbose {
        LogLevel::Debug.as_str()
    } else {
        configured.as_str()
    }
}

fn setup_tracing(args: &Args, configured: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(args, configured)));

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
