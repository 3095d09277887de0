//! Configuration constants.
//!
//! Defaults for every CLI option live here so the clap attributes, the dry-run
//! plan and the tests all agree on the same values.

/// Initial interval between requests in seconds
pub const DEFAULT_START_SECS: f64 = 10.0;
/// Floor for the interval in seconds
pub const DEFAULT_MIN_SECS: f64 = 0.5;
/// Multiplier applied to the interval after each request
pub const DEFAULT_FACTOR: f64 = 0.8;
/// Per-request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: f64 = 10.0;
/// Total request budget for one run
pub const DEFAULT_MAX_REQUESTS: u32 = 200;
/// Symmetric jitter bound in seconds added to each sleep
pub const DEFAULT_JITTER_SECS: f64 = 0.1;
/// Largest accepted jitter bound in seconds
pub const MAX_JITTER_SECS: f64 = 3600.0;

/// Default User-Agent string for probe requests.
///
/// Identifies the tool instead of impersonating a browser. Probing is only
/// meant for endpoints the operator is authorized to test, so the traffic
/// should be attributable in the target's logs.
pub const DEFAULT_USER_AGENT: &str =
    concat!("waf_probe/", env!("CARGO_PKG_VERSION"), " (+authorized-testing)");

/// Accept header sent with every probe request.
pub const DEFAULT_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

// HTTP status codes (for clarity and consistency)
/// 200 OK, checked for block page bodies
pub const HTTP_STATUS_OK: u16 = 200;
/// 401 Unauthorized
pub const HTTP_STATUS_UNAUTHORIZED: u16 = 401;
/// 403 Forbidden
pub const HTTP_STATUS_FORBIDDEN: u16 = 403;
/// 429 Too Many Requests
pub const HTTP_STATUS_TOO_MANY_REQUESTS: u16 = 429;

/// Substrings known to appear in block pages served with HTTP 200.
///
/// Matched case-insensitively against the full response body. Extra patterns
/// can be appended at runtime with `--block-pattern`.
pub const BLOCK_SIGNATURES: &[&str] = &[
    "The requested URL was rejected",
    "Your support ID",
    "Request blocked",
    "Access Denied",
];
