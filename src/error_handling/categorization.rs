//! Request error categorization.

use super::types::RequestErrorKind;

/// Categorizes a `reqwest::Error` into a `RequestErrorKind`.
///
/// Timeouts are checked first: a connect that times out reports both
/// `is_timeout()` and `is_connect()`, and the timeout is the more useful signal
/// when probing for throttling.
pub fn categorize_reqwest_error(error: &reqwest::Error) -> RequestErrorKind {
    if error.is_timeout() {
        RequestErrorKind::Timeout
    } else if error.is_connect() {
        RequestErrorKind::Connect
    } else if error.is_redirect() {
        RequestErrorKind::Redirect
    } else if error.is_body() {
        RequestErrorKind::Body
    } else if error.is_decode() {
        RequestErrorKind::Decode
    } else if error.is_request() {
        RequestErrorKind::Request
    } else {
        RequestErrorKind::Other
    }
}

/// Formats a request error as `<category>: <error>`.
///
/// The error chain is flattened so the root cause (e.g. "connection refused")
/// is visible in the single log line the operator sees.
pub fn describe_reqwest_error(error: &reqwest::Error) -> String {
    let mut message = error.to_string();
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    format!("{}: {}", categorize_reqwest_error(error), message)
}
