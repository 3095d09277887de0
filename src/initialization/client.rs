//! HTTP client initialization.

use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::ClientBuilder;

use crate::config::{RunConfig, DEFAULT_ACCEPT};
use crate::error_handling::InitializationError;

/// Initializes the HTTP client used for every probe request.
///
/// Creates a `reqwest::Client` configured with:
/// - Per-request timeout from the run configuration
/// - User-Agent from the run configuration
/// - A permissive `Accept` header
/// - A cookie store, so the run behaves like one browsing session
///
/// Redirects are followed with reqwest's default policy (up to 10 hops).
///
/// # Errors
///
/// Returns `InitializationError::HttpClientError` if the client cannot be
/// built, e.g. when the User-Agent contains characters not allowed in a header.
pub fn init_client(config: &RunConfig) -> Result<reqwest::Client, InitializationError> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(DEFAULT_ACCEPT));

    let client = ClientBuilder::new()
        .timeout(config.timeout)
        .user_agent(config.user_agent.clone())
        .default_headers(headers)
        .cookie_store(true)
        .build()?;

    debug!(
        "HTTP client ready (timeout {:?}, user agent {:?})",
        config.timeout, config.user_agent
    );
    Ok(client)
}
