//! CAN Safety Gatekeeper CLI Application
//!
//! Bench tool for the safety hooks. It replays recorded CAN traffic
//! (candump log format) through a selected safety mode and reports, for
//! every frame:
//! - Whether received frames were accepted and where they were relayed
//! - Whether outbound frames were allowed or blocked
//! - The steering-control forwarding automaton after each frame

use anyhow::{Context, Result};
use can_safety_core::{ForwardPolicy, SafetyMode};
use clap::Parser;
use rayon::prelude::*;
use std::io::{self, Write};
use std::path::PathBuf;

mod config;
mod replay;
mod report;
mod trace;

use config::{AppConfig, OutputFormat};

/// CAN Safety Gatekeeper - Replay CAN traces through the safety hooks
#[derive(Parser, Debug)]
#[command(name = "can-safety-cli")]
#[command(about = "Replay candump traces through the CAN safety hooks", long_about = None)]
#[command(version)]
struct Args {
    /// Path to candump log file(s) to replay (can be repeated)
    #[arg(short, long, value_name = "FILE")]
    trace: Vec<PathBuf>,

    /// Path to configuration file (config.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Safety mode: no-output or all-output
    #[arg(short, long, value_name = "MODE")]
    mode: Option<SafetyMode>,

    /// Forward policy: hysteresis or static
    #[arg(short, long, value_name = "POLICY")]
    policy: Option<ForwardPolicy>,

    /// Parameter passed to the mode's init hook
    #[arg(long, value_name = "PARAM")]
    param: Option<i16>,

    /// Simulate a board with an on-board diagnostics line
    #[arg(long)]
    has_obd: bool,

    /// Output format
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Only report blocked or unforwarded frames
    #[arg(long)]
    only_blocked: bool,

    /// Verbosity level (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    init_logging(args.verbose, args.quiet);

    log::info!("CAN Safety CLI v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using safety core library v{}", can_safety_core::VERSION);

    let config = resolve_config(&args)?;

    if config.input.files.is_empty() {
        println!("CAN Safety Gatekeeper - No trace specified");
        println!("\nQuick Start:");
        println!("  can-safety-cli --trace drive.log");
        println!("  can-safety-cli --trace drive.log --mode all-output --policy static");
        println!("\nWith a configuration file:");
        println!("  can-safety-cli --config config.toml");
        println!("\nUse --help for more options");
        return Ok(());
    }

    replay_mode(&config)
}

/// Load the config file (if any) and apply command-line overrides
fn resolve_config(args: &Args) -> Result<AppConfig> {
    let mut config = match &args.config {
        Some(path) => {
            log::info!("Loading configuration from: {:?}", path);
            config::load_config(path)?
        }
        None => AppConfig::default(),
    };

    if !args.trace.is_empty() {
        config.input.files = args.trace.clone();
    }
    if let Some(mode) = args.mode {
        config.safety.mode = mode;
    }
    if let Some(policy) = args.policy {
        config.safety.forward_policy = policy;
    }
    if let Some(param) = args.param {
        config.safety.param = param;
    }
    if let Some(format) = args.format {
        config.output.format = format;
    }
    config.board.has_obd |= args.has_obd;
    config.output.only_blocked |= args.only_blocked;

    log::debug!("Effective configuration: {:?}", config);
    Ok(config)
}

/// Replay every trace file to stdout
fn replay_mode(config: &AppConfig) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    replay_files(config, &mut out)?;
    out.flush()?;
    Ok(())
}

/// Replay every trace file independently and write the reports in input order
fn replay_files<W: Write>(config: &AppConfig, out: &mut W) -> Result<()> {
    let results = config
        .input
        .files
        .par_iter()
        .map(|path| -> Result<replay::ReplayResult> {
            let records = trace::load_trace(path)
                .with_context(|| format!("Failed to load trace: {:?}", path))?;
            Ok(replay::replay(
                path.clone(),
                &records,
                config.safety,
                config.board.has_obd,
            ))
        })
        .collect::<Vec<_>>();

    for result in results {
        let result = result?;
        report::write_report(
            out,
            &result,
            config.output.format,
            config.output.only_blocked,
        )?;
    }
    Ok(())
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
