//! Configuration types and CLI options.
//!
//! `Opt` is what clap parses; `RunConfig` is the validated, immutable
//! configuration the probe loop runs with. Conversion between the two is the
//! only place validation happens.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use url::Url;

use crate::app::normalize_target_url;
use crate::config::constants::{
    DEFAULT_FACTOR, DEFAULT_JITTER_SECS, DEFAULT_MAX_REQUESTS, DEFAULT_MIN_SECS,
    DEFAULT_START_SECS, DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT, MAX_JITTER_SECS,
};
use crate::error_handling::ConfigError;

/// Logging level for diagnostic output.
///
/// Controls the verbosity of the `log` records written to stderr. The operator
/// event stream on stdout is not affected.
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Diagnostic log output format.
///
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: One JSON object per line
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Command-line options.
///
/// # Examples
///
/// ```bash
/// # Default schedule: 10s down to 0.5s, 20% faster each request
/// waf_probe --url https://staging.example.com/
///
/// # Faster ramp, keep the block page if one shows up
/// waf_probe --url https://staging.example.com/login --start 2 --factor 0.6 \
///     --save-body block.html
///
/// # Print the plan without sending anything
/// waf_probe --url https://staging.example.com/ --dry-run
/// ```
#[derive(Debug, Clone, Parser)]
#[command(
    name = "waf_probe",
    version,
    about = "Controlled test to find where a WAF or rate limiter starts blocking (authorized targets only)."
)]
pub struct Opt {
    /// Target URL
    #[arg(long)]
    pub url: String,

    /// Initial interval between requests (seconds)
    #[arg(long, default_value_t = DEFAULT_START_SECS)]
    pub start: f64,

    /// Minimum interval between requests (seconds)
    #[arg(long, default_value_t = DEFAULT_MIN_SECS)]
    pub min: f64,

    /// Multiplier applied to the interval after each request (0.8 = 20% shorter)
    #[arg(long, default_value_t = DEFAULT_FACTOR)]
    pub factor: f64,

    /// Per-request timeout (seconds)
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout: f64,

    /// Maximum number of requests for the whole test
    #[arg(long, default_value_t = DEFAULT_MAX_REQUESTS)]
    pub max_requests: u32,

    /// Maximum jitter (seconds, at most 3600) added to or subtracted from each sleep
    #[arg(long, default_value_t = DEFAULT_JITTER_SECS)]
    pub jitter: f64,

    /// Validate and print the plan without sending any request
    #[arg(long)]
    pub dry_run: bool,

    /// Save the body of a detected block page to this file
    #[arg(long, value_parser)]
    pub save_body: Option<PathBuf>,

    /// HTTP User-Agent header value
    #[arg(long, default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,

    /// Extra block page signature (case-insensitive substring, repeatable)
    #[arg(long = "block-pattern", value_name = "TEXT")]
    pub block_patterns: Vec<String>,

    /// Seed for the jitter RNG, for reproducible schedules
    #[arg(long)]
    pub seed: Option<u64>,

    /// Log level: error|warn|info|debug|trace
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Log format: plain|json
    #[arg(long, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,
}

/// Validated configuration for a single probe run.
///
/// Build it with `RunConfig::try_from(opt)`; constructing it by hand skips
/// validation and is only meant for tests.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Target endpoint
    pub url: Url,
    /// Initial interval in seconds
    pub start: f64,
    /// Floor interval in seconds
    pub min: f64,
    /// Decay multiplier, strictly between 0 and 1
    pub factor: f64,
    /// Per-request timeout
    pub timeout: Duration,
    /// Request budget
    pub max_requests: u32,
    /// Symmetric jitter bound in seconds
    pub jitter: f64,
    /// Print the plan and exit without sending requests
    pub dry_run: bool,
    /// Where to write the body of a detected block page
    pub save_body: Option<PathBuf>,
    /// User-Agent header value
    pub user_agent: String,
    /// Signatures appended to the built-in list
    pub extra_signatures: Vec<String>,
    /// Jitter RNG seed
    pub seed: Option<u64>,
}

impl TryFrom<Opt> for RunConfig {
    type Error = ConfigError;

    fn try_from(opt: Opt) -> Result<Self, Self::Error> {
        for (name, value) in [
            ("start", opt.start),
            ("min", opt.min),
            ("factor", opt.factor),
            ("timeout", opt.timeout),
            ("jitter", opt.jitter),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::NotFinite { name, value });
            }
        }
        if opt.factor <= 0.0 || opt.factor >= 1.0 {
            return Err(ConfigError::FactorOutOfRange(opt.factor));
        }
        if opt.start <= opt.min {
            return Err(ConfigError::StartNotAboveMin {
                start: opt.start,
                min: opt.min,
            });
        }
        if opt.min < 0.0 {
            return Err(ConfigError::NegativeMin(opt.min));
        }
        if opt.timeout <= 0.0 {
            return Err(ConfigError::InvalidTimeout(opt.timeout));
        }
        let timeout = Duration::try_from_secs_f64(opt.timeout)
            .map_err(|_| ConfigError::InvalidTimeout(opt.timeout))?;
        if opt.jitter < 0.0 {
            return Err(ConfigError::NegativeJitter(opt.jitter));
        }
        if opt.jitter > MAX_JITTER_SECS {
            return Err(ConfigError::JitterTooLarge {
                value: opt.jitter,
                max: MAX_JITTER_SECS,
            });
        }
        if let Some(empty) = opt.block_patterns.iter().find(|p| p.trim().is_empty()) {
            return Err(ConfigError::EmptyBlockPattern(empty.clone()));
        }

        let url = normalize_target_url(&opt.url)?;

        Ok(RunConfig {
            url,
            start: opt.start,
            min: opt.min,
            factor: opt.factor,
            timeout,
            max_requests: opt.max_requests,
            jitter: opt.jitter,
            dry_run: opt.dry_run,
            save_body: opt.save_body,
            user_agent: opt.user_agent,
            extra_signatures: opt.block_patterns,
            seed: opt.seed,
        })
    }
}
