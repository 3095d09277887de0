//! Error type definitions.

use log::SetLoggerError;
use reqwest::Error as ReqwestError;
use thiserror::Error;

/// Configuration errors detected before any request is sent.
///
/// Every variant maps to exit code 1.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// The decay factor must lie strictly between 0 and 1.
    #[error("factor must be between 0 and 1 (e.g. 0.8), got {0}")]
    FactorOutOfRange(f64),

    /// The initial interval must be larger than the floor.
    #[error("start must be greater than min (start={start}, min={min})")]
    StartNotAboveMin {
        /// Configured initial interval
        start: f64,
        /// Configured floor
        min: f64,
    },

    /// A numeric option is NaN or infinite.
    #[error("{name} must be a finite number, got {value}")]
    NotFinite {
        /// Option name as written on the command line
        name: &'static str,
        /// Rejected value
        value: f64,
    },

    /// The floor interval is negative.
    #[error("min must not be negative, got {0}")]
    NegativeMin(f64),

    /// The per-request timeout is zero, negative or too large to represent.
    #[error("timeout must be a positive number of seconds, got {0}")]
    InvalidTimeout(f64),

    /// The jitter bound is negative.
    #[error("jitter must not be negative, got {0}")]
    NegativeJitter(f64),

    /// The jitter bound exceeds `MAX_JITTER_SECS`.
    #[error("jitter must be at most {max}s, got {value}")]
    JitterTooLarge {
        /// Rejected value
        value: f64,
        /// Largest accepted value
        max: f64,
    },

    /// A `--block-pattern` value is blank and would match every body.
    #[error("block pattern must not be blank, got {0:?}")]
    EmptyBlockPattern(String),

    /// The target URL is unparseable, too long, or not http/https.
    #[error("invalid target URL: {0}")]
    InvalidUrl(String),
}

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),

    /// Error initializing the HTTP client.
    #[error("HTTP client initialization error: {0}")]
    HttpClientError(#[from] ReqwestError),

    /// A block signature could not be compiled into a matcher.
    #[error("Signature matcher initialization error: {0}")]
    SignatureError(#[from] regex::Error),
}

/// Broad category of a failed probe request.
///
/// Used as the prefix of `ProbeOutcome::Failure` messages so the operator can
/// tell a slow target from an unreachable one at a glance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestErrorKind {
    Timeout,
    Connect,
    Redirect,
    Body,
    Decode,
    Request,
    Other,
}

impl std::fmt::Display for RequestErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl RequestErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestErrorKind::Timeout => "timeout",
            RequestErrorKind::Connect => "connect error",
            RequestErrorKind::Redirect => "redirect error",
            RequestErrorKind::Body => "body error",
            RequestErrorKind::Decode => "decode error",
            RequestErrorKind::Request => "request error",
            RequestErrorKind::Other => "error",
        }
    }
}
