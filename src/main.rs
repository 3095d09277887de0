//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `waf_probe` library that handles:
//! - Environment variable loading (.env file)
//! - Command-line argument parsing and validation
//! - Logger initialization
//! - Exit codes
//!
//! Exit code 0 means the run completed (blocked or not); 1 means invalid
//! options or a failure to set up the run.

use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use log::debug;

use waf_probe::app::{ConsoleSink, EventSink};
use waf_probe::initialization::init_logger_with;
use waf_probe::{run_probe, Opt, RunConfig};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Optional .env (e.g. RUST_LOG); a missing file is not an error
    let _ = dotenvy::dotenv();

    let opt = Opt::parse();

    init_logger_with(opt.log_level.clone().into(), opt.log_format.clone())
        .context("Failed to initialize logger")?;

    let config = match RunConfig::try_from(opt) {
        Ok(config) => config,
        Err(e) => {
            ConsoleSink::stdout().emit(&format!("ERROR: {e}"));
            process::exit(1);
        }
    };

    match run_probe(config).await {
        Ok(report) => {
            debug!(
                "Run complete: {} requests, blocked: {}",
                report.requests_sent,
                report.halt_reason.is_block()
            );
            Ok(())
        }
        Err(e) => {
            eprintln!("waf_probe error: {:#}", e);
            process::exit(1);
        }
    }
}
