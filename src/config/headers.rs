//! HTTP header names inspected on probe responses.

/// Retry-After header (seconds or HTTP date until the client may retry)
pub const HEADER_RETRY_AFTER: &str = "retry-after";

/// Prefix shared by the de-facto rate limit headers
/// (`X-RateLimit-Limit`, `X-RateLimit-Remaining`, `X-RateLimit-Reset`, ...).
///
/// Header names from `reqwest` are always lowercase, so the prefix is too.
pub const RATE_LIMIT_HEADER_PREFIX: &str = "x-ratelimit";
