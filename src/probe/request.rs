//! Sending probe requests.

use std::future::Future;
use std::time::Instant;

use log::trace;
use reqwest::header::HeaderMap;
use url::Url;

use super::outcome::{ProbeOutcome, ProbeResponse};
use crate::config::{HEADER_RETRY_AFTER, RATE_LIMIT_HEADER_PREFIX};
use crate::error_handling::describe_reqwest_error;

/// Performs one probe request per call.
///
/// Implementations never return errors: every failure is folded into
/// `ProbeOutcome::Failure` so the loop can decide what to do with it.
pub trait Requester {
    /// Sends one request to the target and waits for the complete response.
    fn send(&self) -> impl Future<Output = ProbeOutcome>;
}

/// GET requests to a fixed URL through a shared `reqwest::Client`.
///
/// The client carries the timeout, User-Agent and Accept header; reusing it
/// keeps connections and cookies across the run.
pub struct HttpRequester {
    client: reqwest::Client,
    url: Url,
}

impl HttpRequester {
    /// Creates a requester for `url`.
    pub fn new(client: reqwest::Client, url: Url) -> Self {
        HttpRequester { client, url }
    }
}

impl Requester for HttpRequester {
    async fn send(&self) -> ProbeOutcome {
        let started = Instant::now();
        let response = match self.client.get(self.url.clone()).send().await {
            Ok(response) => response,
            Err(e) => return ProbeOutcome::Failure(describe_reqwest_error(&e)),
        };
        let elapsed = started.elapsed();
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        trace!("Response from {}: {} after {:?}", response.url(), status, elapsed);

        match response.text().await {
            Ok(body) => ProbeOutcome::Success(ProbeResponse {
                status,
                headers,
                body,
                elapsed,
            }),
            Err(e) => ProbeOutcome::Failure(describe_reqwest_error(&e)),
        }
    }
}

/// Extracts rate limit related headers from a response.
///
/// Returns `Retry-After` first (if present), followed by every header whose
/// name starts with `x-ratelimit`, in response order. Values that are not
/// visible ASCII are shown lossily.
pub fn rate_limit_headers(headers: &HeaderMap) -> Vec<(String, String)> {
    let retry_after = headers
        .get_all(HEADER_RETRY_AFTER)
        .iter()
        .map(|value| (HEADER_RETRY_AFTER.to_string(), header_value_text(value)));

    let rate_limit = headers
        .iter()
        .filter(|(name, _)| name.as_str().starts_with(RATE_LIMIT_HEADER_PREFIX))
        .map(|(name, value)| (name.as_str().to_string(), header_value_text(value)));

    retry_after.chain(rate_limit).collect()
}

fn header_value_text(value: &reqwest::header::HeaderValue) -> String {
    match value.to_str() {
        Ok(text) => text.to_string(),
        Err(_) => String::from_utf8_lossy(value.as_bytes()).into_owned(),
    }
}
