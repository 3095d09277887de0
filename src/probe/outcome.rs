//! Request outcomes, halt reasons and the final run report.

use std::time::Duration;

use reqwest::header::HeaderMap;

/// A response that was fully received.
#[derive(Debug, Clone)]
pub struct ProbeResponse {
    /// HTTP status code
    pub status: u16,
    /// Full response header set
    pub headers: HeaderMap,
    /// Response body decoded as text
    pub body: String,
    /// Time from sending the request until the response headers arrived
    pub elapsed: Duration,
}

/// Result of one request attempt.
#[derive(Debug, Clone)]
pub enum ProbeOutcome {
    /// The server answered, whatever the status code.
    Success(ProbeResponse),
    /// Network, timeout or body error, as `<category>: <message>`.
    Failure(String),
}

/// Why a run stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HaltReason {
    /// HTTP 429.
    RateLimited,
    /// HTTP 401 or 403, with the status received.
    BlockedOrAuth(u16),
    /// HTTP 200 whose body contained a block signature.
    WafBlock {
        /// The signature that matched
        signature: String,
    },
    /// The request failed before a response was received.
    RequestFailed(String),
    /// `max_requests` requests were sent.
    BudgetExhausted,
    /// The current interval dropped below the floor.
    IntervalBelowMinimum,
    /// The operator interrupted the run during a sleep.
    Interrupted,
    /// Dry run: nothing was sent.
    DryRun,
}

impl HaltReason {
    /// Whether the target showed a blocking or rate limiting signal.
    pub fn is_block(&self) -> bool {
        matches!(
            self,
            HaltReason::RateLimited | HaltReason::BlockedOrAuth(_) | HaltReason::WafBlock { .. }
        )
    }
}

impl std::fmt::Display for HaltReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HaltReason::RateLimited => f.write_str("rate limit reached."),
            HaltReason::BlockedOrAuth(_) => f.write_str("blocked or auth required."),
            HaltReason::WafBlock { .. } => f.write_str("WAF block detected"),
            HaltReason::RequestFailed(message) => write!(f, "request failed ({message})"),
            HaltReason::BudgetExhausted => f.write_str("request budget exhausted"),
            HaltReason::IntervalBelowMinimum => f.write_str("interval below minimum"),
            HaltReason::Interrupted => f.write_str("interrupted by user"),
            HaltReason::DryRun => f.write_str("dry run"),
        }
    }
}

/// Summary of a completed run.
#[derive(Debug, Clone)]
pub struct ProbeReport {
    /// Number of requests actually sent
    pub requests_sent: u32,
    /// Why the run stopped
    pub halt_reason: HaltReason,
    /// Body of the most recent response, if any response was received
    pub last_body: Option<String>,
    /// Whether a detected block page was written to the save-body path
    pub body_saved: bool,
    /// Wall-clock duration of the run in seconds
    pub elapsed_seconds: f64,
}
