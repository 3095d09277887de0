//! The probe loop.

use std::path::Path;
use std::time::Instant;

use log::{debug, warn};
use tokio_util::sync::CancellationToken;

use super::classify::{classify, BlockSignatures, Verdict};
use super::outcome::{HaltReason, ProbeOutcome, ProbeReport, ProbeResponse};
use super::request::{rate_limit_headers, Requester};
use super::schedule::{sleep_duration, JitterSource, Schedule};
use crate::app::EventSink;
use crate::config::{RunConfig, HEADER_RETRY_AFTER};

/// Mutable loop state, discarded when the run ends.
#[derive(Debug)]
struct RunState {
    interval: f64,
    requests_sent: u32,
    last_body: Option<String>,
    body_saved: bool,
}

/// One probe run over injected capabilities.
///
/// The requester, event sink, jitter source and interrupt token are all
/// supplied by the caller, so the loop itself has no ambient state and can be
/// driven deterministically in tests.
pub struct ProbeLoop<'a, R, S, J> {
    config: &'a RunConfig,
    signatures: &'a BlockSignatures,
    requester: R,
    sink: &'a mut S,
    jitter: J,
    shutdown: CancellationToken,
}

impl<'a, R, S, J> ProbeLoop<'a, R, S, J>
where
    R: Requester,
    S: EventSink,
    J: JitterSource,
{
    /// Creates a loop for a validated configuration.
    pub fn new(
        config: &'a RunConfig,
        signatures: &'a BlockSignatures,
        requester: R,
        sink: &'a mut S,
        jitter: J,
        shutdown: CancellationToken,
    ) -> Self {
        ProbeLoop {
            config,
            signatures,
            requester,
            sink,
            jitter,
            shutdown,
        }
    }

    /// Runs until blocking is detected, a request fails, the budget is spent,
    /// or the operator interrupts.
    ///
    /// An interrupt abandons an in-flight request as well as a sleep; a
    /// response that arrived first is still classified.
    pub async fn run(mut self) -> ProbeReport {
        let started = Instant::now();
        let config = self.config;
        let shutdown = self.shutdown.clone();
        let schedule = Schedule::from_config(config);
        let mut state = RunState {
            interval: schedule.start(),
            requests_sent: 0,
            last_body: None,
            body_saved: false,
        };

        self.sink
            .emit("Starting test. Stop immediately if you notice service degradation.");

        let halt_reason = loop {
            if shutdown.is_cancelled() {
                self.sink.emit("Interrupted by user.");
                break HaltReason::Interrupted;
            }
            if state.requests_sent >= config.max_requests {
                break HaltReason::BudgetExhausted;
            }
            if state.interval < schedule.min() {
                break HaltReason::IntervalBelowMinimum;
            }

            state.requests_sent += 1;
            let n = state.requests_sent;
            self.sink.emit(&format!(
                "[#{n}] Sending request. current interval = {:.3}s",
                state.interval
            ));
            debug!("GET {} (request #{n})", config.url);

            let outcome = tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    self.sink.emit(&format!("[#{n}] Request abandoned."));
                    self.sink.emit("Interrupted by user.");
                    break HaltReason::Interrupted;
                }
                outcome = self.requester.send() => outcome,
            };
            let response = match outcome {
                ProbeOutcome::Success(response) => response,
                ProbeOutcome::Failure(message) => {
                    self.sink.emit(&format!("[#{n}] Request error: {message}"));
                    break HaltReason::RequestFailed(message);
                }
            };

            let verdict = self.inspect(n, &response);
            let body = response.body;
            if let Verdict::Halt(reason) = verdict {
                if let (HaltReason::WafBlock { .. }, Some(path)) = (&reason, &config.save_body) {
                    state.body_saved = self.save_body(n, path, &body).await;
                }
                state.last_body = Some(body);
                break reason;
            }
            state.last_body = Some(body);

            let next = schedule.next_interval(state.interval);
            let sleep_for = sleep_duration(next, self.jitter.sample(config.jitter));
            self.sink.emit(&format!(
                "[#{n}] Sleeping {:.3}s before next request.",
                sleep_for.as_secs_f64()
            ));

            tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    self.sink.emit("Interrupted by user.");
                    break HaltReason::Interrupted;
                }
                _ = tokio::time::sleep(sleep_for) => {}
            }
            state.interval = next;
        };

        ProbeReport {
            requests_sent: state.requests_sent,
            halt_reason,
            last_body: state.last_body,
            body_saved: state.body_saved,
            elapsed_seconds: started.elapsed().as_secs_f64(),
        }
    }

    /// Logs status, timing and rate limit headers, then classifies.
    fn inspect(&mut self, n: u32, response: &ProbeResponse) -> Verdict {
        self.sink.emit(&format!(
            "[#{n}] Status: {} | time: {:.3}s",
            response.status,
            response.elapsed.as_secs_f64()
        ));

        for (name, value) in rate_limit_headers(&response.headers) {
            if name == HEADER_RETRY_AFTER {
                self.sink.emit(&format!("[#{n}] Found Retry-After: {value}"));
            } else {
                self.sink.emit(&format!("[#{n}] Header {name}: {value}"));
            }
        }

        let verdict = classify(response.status, &response.body, self.signatures);
        if let Verdict::Halt(reason) = &verdict {
            let line = match reason {
                HaltReason::RateLimited => {
                    format!("[#{n}] Received 429 - rate limit reached. Stopping test.")
                }
                HaltReason::BlockedOrAuth(status) => format!(
                    "[#{n}] Status {status} - possible block or authentication required. Stopping test."
                ),
                HaltReason::WafBlock { signature } => format!(
                    "[#{n}] BLOCK DETECTED: body contains WAF pattern {signature:?}. Stopping test."
                ),
                other => format!("[#{n}] Stopping test: {other}"),
            };
            self.sink.emit(&line);
        }
        verdict
    }

    /// Writes the block page body. Failure is reported but never fatal.
    async fn save_body(&mut self, n: u32, path: &Path, body: &str) -> bool {
        match tokio::fs::write(path, body).await {
            Ok(()) => {
                self.sink
                    .emit(&format!("[#{n}] Body saved to: {}", path.display()));
                true
            }
            Err(e) => {
                warn!("Failed to write block page body to {}: {e}", path.display());
                self.sink.emit(&format!("[#{n}] Failed to save body: {e}"));
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::schedule::NoJitter;
    use crate::probe::ProbeResponse;
    use reqwest::header::{HeaderMap, HeaderValue};
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;
    use std::time::Duration;
    use url::Url;

    /// Replays scripted outcomes, then answers 200 with a clean body forever.
    struct ScriptedRequester {
        outcomes: RefCell<VecDeque<ProbeOutcome>>,
        calls: Cell<u32>,
    }

    impl ScriptedRequester {
        fn new(outcomes: Vec<ProbeOutcome>) -> Self {
            ScriptedRequester {
                outcomes: RefCell::new(outcomes.into()),
                calls: Cell::new(0),
            }
        }
    }

    impl Requester for &ScriptedRequester {
        async fn send(&self) -> ProbeOutcome {
            self.calls.set(self.calls.get() + 1);
            self.outcomes
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| ok(200, "<html>fine</html>"))
        }
    }

    fn ok(status: u16, body: &str) -> ProbeOutcome {
        ProbeOutcome::Success(ProbeResponse {
            status,
            headers: HeaderMap::new(),
            body: body.to_string(),
            elapsed: Duration::from_millis(12),
        })
    }

    fn config(max_requests: u32) -> RunConfig {
        RunConfig {
            url: Url::parse("https://target.test/").expect("valid url"),
            start: 10.0,
            min: 0.5,
            factor: 0.8,
            timeout: Duration::from_secs(10),
            max_requests,
            jitter: 0.0,
            dry_run: false,
            save_body: None,
            user_agent: "test".to_string(),
            extra_signatures: Vec::new(),
            seed: None,
        }
    }

    fn signatures() -> BlockSignatures {
        BlockSignatures::new::<&str>(&[]).expect("compiles")
    }

    async fn run(
        config: &RunConfig,
        requester: &ScriptedRequester,
        shutdown: CancellationToken,
    ) -> (ProbeReport, Vec<String>) {
        let signatures = signatures();
        let mut events: Vec<String> = Vec::new();
        let report = ProbeLoop::new(
            config,
            &signatures,
            requester,
            &mut events,
            NoJitter,
            shutdown,
        )
        .run()
        .await;
        (report, events)
    }

    #[tokio::test(start_paused = true)]
    async fn test_budget_is_never_exceeded() {
        let config = config(30);
        let requester = ScriptedRequester::new(Vec::new());
        let (report, _) = run(&config, &requester, CancellationToken::new()).await;

        assert_eq!(requester.calls.get(), 30);
        assert_eq!(report.requests_sent, 30);
        assert_eq!(report.halt_reason, HaltReason::BudgetExhausted);
        assert!(!report.halt_reason.is_block());
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_decays_then_sticks_at_floor() {
        let config = config(20);
        let requester = ScriptedRequester::new(Vec::new());
        let (_, events) = run(&config, &requester, CancellationToken::new()).await;

        let intervals: Vec<&str> = events
            .iter()
            .filter_map(|e| e.split("current interval = ").nth(1))
            .collect();
        assert_eq!(intervals.len(), 20);
        assert_eq!(intervals[0], "10.000s");
        assert_eq!(intervals[1], "8.000s");
        assert_eq!(intervals[2], "6.400s");
        assert_eq!(intervals[13], "0.550s");
        assert!(intervals[14..].iter().all(|i| *i == "0.500s"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_429_halts_after_one_response() {
        let config = config(200);
        let requester = ScriptedRequester::new(vec![ok(200, "ok"), ok(429, "slow down")]);
        let (report, events) = run(&config, &requester, CancellationToken::new()).await;

        assert_eq!(requester.calls.get(), 2);
        assert_eq!(report.requests_sent, 2);
        assert_eq!(report.halt_reason, HaltReason::RateLimited);
        assert_eq!(report.last_body.as_deref(), Some("slow down"));
        assert!(events
            .iter()
            .any(|e| e == "[#2] Received 429 - rate limit reached. Stopping test."));
    }

    #[tokio::test(start_paused = true)]
    async fn test_403_halts() {
        let config = config(200);
        let requester = ScriptedRequester::new(vec![ok(403, "")]);
        let (report, _) = run(&config, &requester, CancellationToken::new()).await;

        assert_eq!(requester.calls.get(), 1);
        assert_eq!(report.halt_reason, HaltReason::BlockedOrAuth(403));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_halts_without_further_requests() {
        let config = config(200);
        let requester = ScriptedRequester::new(vec![
            ok(200, "ok"),
            ProbeOutcome::Failure("timeout: operation timed out".to_string()),
        ]);
        let (report, events) = run(&config, &requester, CancellationToken::new()).await;

        assert_eq!(requester.calls.get(), 2);
        assert_eq!(
            report.halt_reason,
            HaltReason::RequestFailed("timeout: operation timed out".to_string())
        );
        // The body from the last successful response is kept
        assert_eq!(report.last_body.as_deref(), Some("ok"));
        assert!(events
            .iter()
            .any(|e| e == "[#2] Request error: timeout: operation timed out"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_waf_body_is_saved_exactly() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("block.html");
        let body = "<html>Request Rejected. YOUR SUPPORT ID is: 9876543210</html>\n";

        let mut config = config(200);
        config.save_body = Some(path.clone());
        let requester = ScriptedRequester::new(vec![ok(200, "fine"), ok(200, body)]);
        let (report, events) = run(&config, &requester, CancellationToken::new()).await;

        assert_eq!(report.requests_sent, 2);
        assert_eq!(
            report.halt_reason,
            HaltReason::WafBlock {
                signature: "Your support ID".to_string()
            }
        );
        assert!(report.body_saved);
        assert_eq!(std::fs::read_to_string(&path).expect("saved body"), body);
        assert!(events
            .iter()
            .any(|e| e.starts_with("[#2] Body saved to: ")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_save_failure_does_not_change_halt() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut config = config(200);
        config.save_body = Some(dir.path().join("missing").join("block.html"));
        let requester = ScriptedRequester::new(vec![ok(200, "Access Denied")]);
        let (report, events) = run(&config, &requester, CancellationToken::new()).await;

        assert_eq!(requester.calls.get(), 1);
        assert!(matches!(report.halt_reason, HaltReason::WafBlock { .. }));
        assert!(!report.body_saved);
        assert!(events
            .iter()
            .any(|e| e.starts_with("[#1] Failed to save body: ")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_waf_block_without_save_path_writes_nothing() {
        let config = config(200);
        let requester = ScriptedRequester::new(vec![ok(200, "request blocked")]);
        let (report, events) = run(&config, &requester, CancellationToken::new()).await;

        assert!(matches!(report.halt_reason, HaltReason::WafBlock { .. }));
        assert!(!report.body_saved);
        assert!(!events.iter().any(|e| e.contains("save")));
    }

    /// Answers 200 after `delay`, like a target that is slow to respond.
    struct SlowRequester {
        delay: Duration,
    }

    impl Requester for SlowRequester {
        async fn send(&self) -> ProbeOutcome {
            tokio::time::sleep(self.delay).await;
            ok(200, "late")
        }
    }

    fn cancel_after(shutdown: &CancellationToken, after: Duration) {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            tokio::time::sleep(after).await;
            shutdown.cancel();
        });
    }

    #[tokio::test(start_paused = true)]
    async fn test_interrupt_before_start_sends_nothing() {
        let config = config(200);
        let requester = ScriptedRequester::new(Vec::new());
        let shutdown = CancellationToken::new();
        shutdown.cancel();
        let (report, events) = run(&config, &requester, shutdown).await;

        assert_eq!(requester.calls.get(), 0);
        assert_eq!(report.requests_sent, 0);
        assert_eq!(report.halt_reason, HaltReason::Interrupted);
        assert_eq!(events.last().map(String::as_str), Some("Interrupted by user."));
    }

    #[tokio::test(start_paused = true)]
    async fn test_interrupt_during_slow_request_does_not_wait_for_it() {
        let config = config(200);
        let signatures = signatures();
        let shutdown = CancellationToken::new();
        cancel_after(&shutdown, Duration::from_secs(1));

        let started = tokio::time::Instant::now();
        let mut events: Vec<String> = Vec::new();
        let report = ProbeLoop::new(
            &config,
            &signatures,
            SlowRequester {
                delay: Duration::from_secs(60),
            },
            &mut events,
            NoJitter,
            shutdown,
        )
        .run()
        .await;

        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(report.requests_sent, 1);
        assert_eq!(report.halt_reason, HaltReason::Interrupted);
        assert!(report.last_body.is_none());
        assert!(events.contains(&"[#1] Request abandoned.".to_string()));
        assert_eq!(events.last().map(String::as_str), Some("Interrupted by user."));
    }

    #[tokio::test(start_paused = true)]
    async fn test_interrupt_during_sleep_halts_gracefully() {
        let config = config(200);
        let requester = ScriptedRequester::new(Vec::new());
        let shutdown = CancellationToken::new();
        // The first sleep lasts 8s
        cancel_after(&shutdown, Duration::from_secs(1));
        let (report, events) = run(&config, &requester, shutdown).await;

        assert_eq!(requester.calls.get(), 1);
        assert_eq!(report.requests_sent, 1);
        assert_eq!(report.halt_reason, HaltReason::Interrupted);
        assert_eq!(events.last().map(String::as_str), Some("Interrupted by user."));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_headers_are_reported() {
        let mut headers = HeaderMap::new();
        headers.insert("retry-after", HeaderValue::from_static("120"));
        headers.insert("x-ratelimit-remaining", HeaderValue::from_static("0"));
        let config = config(200);
        let requester = ScriptedRequester::new(vec![ProbeOutcome::Success(ProbeResponse {
            status: 429,
            headers,
            body: String::new(),
            elapsed: Duration::from_millis(3),
        })]);
        let (_, events) = run(&config, &requester, CancellationToken::new()).await;

        assert!(events.contains(&"[#1] Status: 429 | time: 0.003s".to_string()));
        assert!(events.contains(&"[#1] Found Retry-After: 120".to_string()));
        assert!(events.contains(&"[#1] Header x-ratelimit-remaining: 0".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_budget_sends_nothing() {
        let config = config(0);
        let requester = ScriptedRequester::new(Vec::new());
        let (report, _) = run(&config, &requester, CancellationToken::new()).await;

        assert_eq!(requester.calls.get(), 0);
        assert_eq!(report.halt_reason, HaltReason::BudgetExhausted);
        assert!(report.last_body.is_none());
    }
}
