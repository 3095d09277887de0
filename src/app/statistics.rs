//! Run plan and final summary output.

use std::path::Path;

use log::info;

use crate::app::EventSink;
use crate::config::RunConfig;
use crate::probe::{BlockSignatures, ProbeReport, Schedule};

/// Emits the target and parameter lines shown at the start of every run.
pub fn emit_parameters<S: EventSink>(sink: &mut S, config: &RunConfig) {
    sink.emit(&format!("Target: {}", config.url));
    sink.emit(&format!(
        "start={}s min={}s factor={} timeout={}s max_requests={} jitter=±{}s",
        config.start,
        config.min,
        config.factor,
        config.timeout.as_secs_f64(),
        config.max_requests,
        config.jitter
    ));
}

/// Number of leading intervals listed in the dry-run plan.
pub const PLAN_PREVIEW_LEN: usize = 20;

/// Steps walked one by one before the rest of the plan is computed in closed
/// form.
const PLAN_EXACT_STEPS: u32 = 100_000;

/// Projected, jitter-free shape of a run that never gets blocked.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanProjection {
    /// First intervals of the ramp, at most `PLAN_PREVIEW_LEN` of them
    pub ramp: Vec<f64>,
    /// Number of requests from the start down to the first one at the floor,
    /// capped at `max_requests`
    pub ramp_len: u32,
    /// Request number that first runs at the floor, if within budget
    pub floor_request: Option<u32>,
    /// Total time spent sleeping if all `max_requests` requests are sent
    pub total_sleep_seconds: f64,
}

/// Projects the schedule for a run that exhausts its budget.
///
/// The loop sleeps after every request, including the last one, before it
/// notices the budget is spent; the projected sleep total includes that final
/// sleep. Once the floor is reached the remaining sleeps are all `min`, and a
/// ramp longer than `PLAN_EXACT_STEPS` is finished with the geometric series,
/// so the cost does not grow with the budget.
pub fn project_plan(config: &RunConfig) -> PlanProjection {
    let schedule = Schedule::from_config(config);
    let budget = config.max_requests;
    let min = schedule.min();

    let mut plan = PlanProjection {
        ramp: Vec::new(),
        ramp_len: 0,
        floor_request: None,
        total_sleep_seconds: 0.0,
    };

    // Interval of the next request to send
    let mut interval = schedule.start();
    let mut sent: u32 = 0;
    while sent < budget {
        sent += 1;
        plan.ramp_len += 1;
        if plan.ramp.len() < PLAN_PREVIEW_LEN {
            plan.ramp.push(interval);
        }
        let at_floor = interval <= min;
        interval = schedule.next_interval(interval);
        plan.total_sleep_seconds += interval;

        if at_floor {
            plan.floor_request = Some(sent);
            plan.total_sleep_seconds += f64::from(budget - sent) * min;
            break;
        }
        if sent >= PLAN_EXACT_STEPS {
            finish_ramp(&mut plan, config.factor, min, interval, sent, budget - sent);
            break;
        }
    }

    plan
}

/// Adds the `remaining` requests starting at `interval` to the plan without
/// walking them.
fn finish_ramp(
    plan: &mut PlanProjection,
    factor: f64,
    min: f64,
    interval: f64,
    sent: u32,
    remaining: u32,
) {
    let remaining_f = f64::from(remaining);
    // Smallest j with interval * factor^j <= min
    let steps_to_floor = if min > 0.0 {
        ((min / interval).ln() / factor.ln()).ceil().max(0.0)
    } else {
        f64::INFINITY
    };

    if steps_to_floor < remaining_f {
        let steps = steps_to_floor as u32;
        plan.floor_request = Some(sent + steps + 1);
        plan.ramp_len += steps + 1;
    } else {
        plan.ramp_len += remaining;
    }

    // Sleep j (1-based) is interval * factor^j while j < steps_to_floor, then min
    let above_floor = (steps_to_floor - 1.0).max(0.0).min(remaining_f);
    let geometric = interval * factor * (1.0 - factor.powf(above_floor)) / (1.0 - factor);
    plan.total_sleep_seconds += geometric + (remaining_f - above_floor) * min;
}

/// Emits the dry-run plan.
pub fn emit_plan<S: EventSink>(sink: &mut S, config: &RunConfig) {
    let plan = project_plan(config);
    let ramp: Vec<String> = plan.ramp.iter().map(|i| format!("{i:.3}")).collect();
    let hidden = plan.ramp_len as usize - plan.ramp.len();
    if hidden > 0 {
        sink.emit(&format!(
            "Planned intervals (without jitter): {}, ... ({hidden} more)",
            ramp.join(", ")
        ));
    } else {
        sink.emit(&format!(
            "Planned intervals (without jitter): {}",
            ramp.join(", ")
        ));
    }
    match plan.floor_request {
        Some(n) => sink.emit(&format!(
            "Floor of {}s reached at request #{n}; the remaining {} requests stay at the floor.",
            config.min,
            config.max_requests - n
        )),
        None => sink.emit(&format!(
            "Floor of {}s is not reached within {} requests.",
            config.min, config.max_requests
        )),
    }
    sink.emit(&format!(
        "Minimum duration if nothing blocks: {:.1}s",
        plan.total_sleep_seconds
    ));
}

/// Emits the summary shown after the loop ends.
///
/// When a save path was configured and the last observed body does not look
/// like a block page, a note warns that any saved file may be unrelated.
pub fn emit_summary<S: EventSink>(
    sink: &mut S,
    report: &ProbeReport,
    save_body: Option<&Path>,
    signatures: &BlockSignatures,
) {
    sink.emit("Test finished.");
    sink.emit(&format!("Halt reason: {}", report.halt_reason));
    sink.emit(&format!("Total requests sent: {}", report.requests_sent));
    sink.emit(&format!("Elapsed: {:.1}s", report.elapsed_seconds));

    if let (Some(body), Some(_)) = (report.last_body.as_deref(), save_body) {
        if !body.is_empty() && !signatures.is_match(body) {
            sink.emit("Note: last saved body may not contain the block page.");
        }
    }

    info!(
        "Probe finished: {} request{} sent, halt reason: {}",
        report.requests_sent,
        if report.requests_sent == 1 { "" } else { "s" },
        report.halt_reason
    );
}
