//! waf_probe library: find the request rate at which a WAF or rate limiter
//! starts blocking an authorized endpoint.
//!
//! A run sends sequential GET requests to one URL, shrinking the pause between
//! them geometrically down to a floor, and stops at the first blocking signal:
//! HTTP 429, HTTP 401/403, or an HTTP 200 body containing a known block page
//! signature. A request failure, the request budget, or Ctrl-C also end the run.
//!
//! # Example
//!
//! ```no_run
//! use clap::Parser;
//! use waf_probe::{run_probe, Opt, RunConfig};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let opt = Opt::parse_from(["waf_probe", "--url", "https://staging.example.com/", "--max-requests", "50"]);
//! let config = RunConfig::try_from(opt)?;
//!
//! let report = run_probe(config).await?;
//! println!("{} requests, stopped because: {}", report.requests_sent, report.halt_reason);
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime with the time and signal drivers
//! enabled. One request is in flight at a time; a current-thread runtime is
//! enough.

#![warn(missing_docs)]

pub mod app;
pub mod config;
mod error_handling;
pub mod initialization;
pub mod probe;

// Re-export public API
pub use config::{LogFormat, LogLevel, Opt, RunConfig};
pub use error_handling::{ConfigError, InitializationError};
pub use probe::{HaltReason, ProbeReport};
pub use run::{run_probe, run_probe_with};

// Internal run module (wires the probe loop to real resources)
mod run {
    use anyhow::{Context, Result};
    use log::info;

    use crate::app::{
        emit_parameters, emit_plan, emit_summary, spawn_interrupt_listener, ConsoleSink,
        EventSink,
    };
    use crate::config::RunConfig;
    use crate::error_handling::InitializationError;
    use crate::initialization::{init_client, init_jitter};
    use crate::probe::{BlockSignatures, HaltReason, HttpRequester, ProbeLoop, ProbeReport};

    /// Runs a probe, printing the event stream to stdout.
    ///
    /// # Errors
    ///
    /// Returns an error only if a resource cannot be initialized (signature
    /// matcher or HTTP client). Blocking, request failures and interruptions
    /// are normal outcomes reported in the `ProbeReport`.
    pub async fn run_probe(config: RunConfig) -> Result<ProbeReport> {
        let mut sink = ConsoleSink::stdout();
        run_probe_with(config, &mut sink).await
    }

    /// Runs a probe, sending the event stream to `sink`.
    ///
    /// In dry-run mode the parameters and projected schedule are emitted and no
    /// request is sent.
    ///
    /// # Errors
    ///
    /// Same as [`run_probe`].
    pub async fn run_probe_with<S: EventSink>(
        config: RunConfig,
        sink: &mut S,
    ) -> Result<ProbeReport> {
        let signatures = BlockSignatures::new(config.extra_signatures.as_slice())
            .map_err(InitializationError::from)
            .context("Failed to compile block signatures")?;

        emit_parameters(sink, &config);

        if config.dry_run {
            emit_plan(sink, &config);
            sink.emit("DRY RUN. Exiting.");
            return Ok(ProbeReport {
                requests_sent: 0,
                halt_reason: HaltReason::DryRun,
                last_body: None,
                body_saved: false,
                elapsed_seconds: 0.0,
            });
        }

        let client = init_client(&config).context("Failed to initialize HTTP client")?;
        let requester = HttpRequester::new(client, config.url.clone());
        let jitter = init_jitter(config.seed);
        let shutdown = spawn_interrupt_listener();

        info!("Probing {} with up to {} requests", config.url, config.max_requests);
        let report = ProbeLoop::new(
            &config,
            &signatures,
            requester,
            sink,
            jitter,
            shutdown.clone(),
        )
        .run()
        .await;

        // Stops the interrupt listener task
        shutdown.cancel();

        emit_summary(sink, &report, config.save_body.as_deref(), &signatures);
        Ok(report)
    }
}
